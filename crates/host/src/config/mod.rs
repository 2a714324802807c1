//! Configuration snapshot, sources and change events.
//!
//! Only two options are recognized: [`TARGET_PROFILE_KEY`] and [`FORMATTING_KEY`]. Sources are
//! read on demand and never cached, so a reaction to a change always observes the latest value.
//!
//! # TOML settings file
//!
//! ```toml
//! [qside]
//! targetProfile = "base"
//! enableFormatting = false
//! ```
//!
//! Missing keys fall back to [`ConfigSnapshot::default`]. Profile strings outside the
//! recognized set are kept as [`TargetProfile::Unrecognized`] and forwarded anyway.

mod router;

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use qside_engine::TargetProfile;
use serde::Deserialize;

pub use router::{ConfigChangeRouter, ConfigReaction};

/// Configuration section owning every recognized key.
pub const SECTION: &str = "qside";

/// Target profile key. Routed before [`FORMATTING_KEY`].
pub const TARGET_PROFILE_KEY: &str = "qside.targetProfile";

/// Formatting toggle key.
pub const FORMATTING_KEY: &str = "qside.enableFormatting";

/// Errors reading a settings file.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
	/// The file exists but could not be read.
	#[error("failed to read {}: {source}", path.display())]
	Read {
		/// Settings file path.
		path: PathBuf,
		/// Underlying I/O failure.
		source: std::io::Error,
	},
	/// The file is not valid TOML or has wrongly typed values.
	#[error("failed to parse {}: {source}", path.display())]
	Parse {
		/// Settings file path.
		path: PathBuf,
		/// Decoder failure.
		source: toml::de::Error,
	},
}

/// The recognized options at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
	/// Compilation target profile.
	pub target_profile: TargetProfile,
	/// Whether formatting providers are registered.
	pub formatting_enabled: bool,
}

impl Default for ConfigSnapshot {
	fn default() -> Self {
		Self {
			target_profile: TargetProfile::default(),
			formatting_enabled: true,
		}
	}
}

/// On-demand reader of the recognized options.
pub trait ConfigurationSource: Send + Sync {
	/// Current target profile.
	fn target_profile(&self) -> TargetProfile;

	/// Current formatting toggle.
	fn formatting_enabled(&self) -> bool;

	/// Reads both options.
	fn snapshot(&self) -> ConfigSnapshot {
		ConfigSnapshot {
			target_profile: self.target_profile(),
			formatting_enabled: self.formatting_enabled(),
		}
	}
}

/// In-process configuration source.
#[derive(Debug, Default)]
pub struct MemoryConfig {
	snapshot: RwLock<ConfigSnapshot>,
}

impl MemoryConfig {
	/// Creates a source holding `snapshot`.
	pub fn new(snapshot: ConfigSnapshot) -> Self {
		Self {
			snapshot: RwLock::new(snapshot),
		}
	}

	/// Replaces the target profile.
	pub fn set_target_profile(&self, profile: TargetProfile) {
		self.snapshot.write().target_profile = profile;
	}

	/// Replaces the formatting toggle.
	pub fn set_formatting_enabled(&self, enabled: bool) {
		self.snapshot.write().formatting_enabled = enabled;
	}
}

impl ConfigurationSource for MemoryConfig {
	fn target_profile(&self) -> TargetProfile {
		self.snapshot.read().target_profile.clone()
	}

	fn formatting_enabled(&self) -> bool {
		self.snapshot.read().formatting_enabled
	}

	fn snapshot(&self) -> ConfigSnapshot {
		self.snapshot.read().clone()
	}
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
	#[serde(default)]
	qside: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsSection {
	target_profile: Option<TargetProfile>,
	enable_formatting: Option<bool>,
}

/// Configuration source re-reading a TOML settings file on every access.
#[derive(Debug, Clone)]
pub struct TomlConfig {
	path: PathBuf,
}

impl TomlConfig {
	/// Creates a source for the settings file at `path`.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Creates a source after checking the file loads once.
	///
	/// Later reads still fall back to defaults if the file breaks afterwards.
	pub fn open(path: impl Into<PathBuf>) -> crate::Result<Self> {
		let config = Self::new(path);
		let snapshot = config.load()?;
		tracing::debug!(path = %config.path.display(), profile = %snapshot.target_profile, "config.opened");
		Ok(config)
	}

	/// Settings file path.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Reads the file. A missing file yields the defaults.
	pub fn load(&self) -> Result<ConfigSnapshot, ConfigError> {
		let text = match std::fs::read_to_string(&self.path) {
			Ok(text) => text,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(ConfigSnapshot::default()),
			Err(source) => {
				return Err(ConfigError::Read {
					path: self.path.clone(),
					source,
				});
			}
		};
		let file: SettingsFile = toml::from_str(&text).map_err(|source| ConfigError::Parse {
			path: self.path.clone(),
			source,
		})?;
		let defaults = ConfigSnapshot::default();
		Ok(ConfigSnapshot {
			target_profile: file.qside.target_profile.unwrap_or(defaults.target_profile),
			formatting_enabled: file.qside.enable_formatting.unwrap_or(defaults.formatting_enabled),
		})
	}

	fn load_or_default(&self) -> ConfigSnapshot {
		self.load().unwrap_or_else(|err| {
			tracing::warn!(error = %err, "config.load_failed");
			ConfigSnapshot::default()
		})
	}
}

impl ConfigurationSource for TomlConfig {
	fn target_profile(&self) -> TargetProfile {
		self.load_or_default().target_profile
	}

	fn formatting_enabled(&self) -> bool {
		self.load_or_default().formatting_enabled
	}

	fn snapshot(&self) -> ConfigSnapshot {
		self.load_or_default()
	}
}

/// A configuration-changed notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigChangeEvent {
	changed: Vec<String>,
}

impl ConfigChangeEvent {
	/// Event for the given changed keys.
	pub fn new(changed: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self {
			changed: changed.into_iter().map(Into::into).collect(),
		}
	}

	/// Changed keys as reported by the host.
	pub fn changed(&self) -> &[String] {
		&self.changed
	}

	/// Whether the change touches `key`, one of its children, or one of its parent sections.
	pub fn affects_configuration(&self, key: &str) -> bool {
		self.changed.iter().any(|changed| is_same_or_nested(changed, key) || is_same_or_nested(key, changed))
	}
}

/// `child == parent` or `child` starts with `parent.`.
fn is_same_or_nested(child: &str, parent: &str) -> bool {
	child
		.strip_prefix(parent)
		.is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

#[cfg(test)]
mod tests;
