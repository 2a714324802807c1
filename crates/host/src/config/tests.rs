use std::fs;

use super::*;

#[test]
fn test_affects_exact_key() {
	let event = ConfigChangeEvent::new([TARGET_PROFILE_KEY]);
	assert!(event.affects_configuration(TARGET_PROFILE_KEY));
	assert!(!event.affects_configuration(FORMATTING_KEY));
}

#[test]
fn test_affects_parent_section() {
	let event = ConfigChangeEvent::new([SECTION]);
	assert!(event.affects_configuration(TARGET_PROFILE_KEY));
	assert!(event.affects_configuration(FORMATTING_KEY));
}

#[test]
fn test_affects_does_not_match_prefix_lookalikes() {
	let sibling = ConfigChangeEvent::new(["qside.targetProfileOverride"]);
	assert!(!sibling.affects_configuration(TARGET_PROFILE_KEY));
	assert!(!sibling.affects_configuration(FORMATTING_KEY));
	assert!(sibling.affects_configuration(SECTION));

	let lookalike = ConfigChangeEvent::new(["qsidebar"]);
	assert!(!lookalike.affects_configuration(SECTION));
	assert!(!lookalike.affects_configuration(TARGET_PROFILE_KEY));
}

#[test]
fn test_memory_config_reads_latest() {
	let config = MemoryConfig::default();
	assert_eq!(config.snapshot(), ConfigSnapshot::default());

	config.set_target_profile(TargetProfile::Base);
	config.set_formatting_enabled(false);
	assert_eq!(config.target_profile(), TargetProfile::Base);
	assert!(!config.formatting_enabled());
}

#[test]
fn test_toml_missing_file_is_default() {
	let dir = tempfile::tempdir().unwrap();
	let config = TomlConfig::new(dir.path().join("settings.toml"));
	assert_eq!(config.load().unwrap(), ConfigSnapshot::default());
}

#[test]
fn test_toml_reads_section() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("settings.toml");
	fs::write(&path, "[qside]\ntargetProfile = \"base\"\nenableFormatting = false\n").unwrap();

	let config = TomlConfig::new(&path);
	assert_eq!(
		config.snapshot(),
		ConfigSnapshot {
			target_profile: TargetProfile::Base,
			formatting_enabled: false,
		}
	);
}

#[test]
fn test_toml_is_reread_on_every_access() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("settings.toml");
	fs::write(&path, "[qside]\nenableFormatting = false\n").unwrap();
	let config = TomlConfig::new(&path);
	assert!(!config.formatting_enabled());

	fs::write(&path, "[qside]\nenableFormatting = true\n").unwrap();
	assert!(config.formatting_enabled());
}

#[test]
fn test_toml_keeps_unrecognized_profile() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("settings.toml");
	fs::write(&path, "[qside]\ntargetProfile = \"adaptive\"\n").unwrap();

	let config = TomlConfig::new(&path);
	assert_eq!(config.target_profile(), TargetProfile::Unrecognized("adaptive".into()));
	assert!(config.formatting_enabled());
}

#[test]
fn test_toml_parse_error_surfaces_from_load_only() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("settings.toml");
	fs::write(&path, "[qside]\nenableFormatting = \"yes\"\n").unwrap();

	let config = TomlConfig::new(&path);
	assert!(matches!(config.load(), Err(ConfigError::Parse { .. })));
	assert_eq!(config.snapshot(), ConfigSnapshot::default());
}

#[test]
fn test_open_surfaces_broken_file_as_crate_error() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("settings.toml");
	fs::write(&path, "[qside\n").unwrap();

	let err = TomlConfig::open(&path).unwrap_err();
	assert!(matches!(err, crate::Error::Config(ConfigError::Parse { .. })));

	fs::write(&path, "[qside]\ntargetProfile = \"base\"\n").unwrap();
	let config = TomlConfig::open(&path).unwrap();
	assert_eq!(config.target_profile(), TargetProfile::Base);
}
