use std::sync::Arc;

use qside_engine::{SessionHandle, TargetProfile};

use super::{ConfigChangeEvent, ConfigurationSource, FORMATTING_KEY, TARGET_PROFILE_KEY};
use crate::Result;
use crate::bootstrap::apply_profile;
use crate::feature::{self, GateTransition, SharedFeatureGate};

/// Reaction taken for one configuration change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigReaction {
	/// The profile was re-read and forwarded to the session.
	Profile(TargetProfile),
	/// The formatting toggle was re-read and applied to the gate.
	Formatting(GateTransition),
}

/// Dispatches a configuration change to exactly one reaction.
///
/// Keys are tested in a fixed order, profile first. The first affected key wins and later keys
/// are not evaluated, so an event touching both the profile and the formatting toggle only
/// updates the profile. The formatting change is picked up by the next event affecting it.
pub struct ConfigChangeRouter {
	session: SessionHandle,
	config: Arc<dyn ConfigurationSource>,
	formatting: SharedFeatureGate<2>,
}

impl ConfigChangeRouter {
	/// Creates a router reacting on `session` and `formatting`.
	pub fn new(session: SessionHandle, config: Arc<dyn ConfigurationSource>, formatting: SharedFeatureGate<2>) -> Self {
		Self {
			session,
			config,
			formatting,
		}
	}

	/// Routes one change event. Returns `None` if no recognized key was affected.
	pub async fn route(&self, event: &ConfigChangeEvent) -> Result<Option<ConfigReaction>> {
		if event.affects_configuration(TARGET_PROFILE_KEY) {
			let profile = self.config.target_profile();
			tracing::debug!(key = TARGET_PROFILE_KEY, profile = %profile, "config.route");
			apply_profile(&self.session, &profile).await?;
			return Ok(Some(ConfigReaction::Profile(profile)));
		}

		if event.affects_configuration(FORMATTING_KEY) {
			let enabled = self.config.formatting_enabled();
			tracing::debug!(key = FORMATTING_KEY, enabled, "config.route");
			let transition = feature::set_enabled(&self.formatting, enabled);
			return Ok(Some(ConfigReaction::Formatting(transition)));
		}

		tracing::trace!(changed = ?event.changed(), "config.route.ignored");
		Ok(None)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::config::{ConfigSnapshot, MemoryConfig, SECTION};
	use crate::disposable::DisposableHandle;
	use crate::feature::{FeatureGate, shared};
	use crate::test_helpers::{EngineCall, RecordingRuntime};

	struct Fixture {
		runtime: Arc<RecordingRuntime>,
		config: Arc<MemoryConfig>,
		gate: SharedFeatureGate<2>,
		router: ConfigChangeRouter,
	}

	fn fixture(formatting_enabled: bool) -> Fixture {
		let runtime = Arc::new(RecordingRuntime::new());
		let session = runtime.open_session();
		let config = Arc::new(MemoryConfig::new(ConfigSnapshot {
			target_profile: TargetProfile::Unrestricted,
			formatting_enabled,
		}));
		let gate = shared(FeatureGate::new("formatting", || {
			[DisposableHandle::noop("format"), DisposableHandle::noop("format_range")]
		}));
		gate.lock().set_enabled(formatting_enabled);
		let router = ConfigChangeRouter::new(session, config.clone(), gate.clone());
		Fixture {
			runtime,
			config,
			gate,
			router,
		}
	}

	fn configure_calls(runtime: &RecordingRuntime) -> usize {
		runtime.calls().iter().filter(|c| matches!(c, EngineCall::Configure(_))).count()
	}

	#[tokio::test]
	async fn test_profile_change_only_updates_profile() {
		let f = fixture(true);
		f.config.set_target_profile(TargetProfile::Base);

		let reaction = f.router.route(&ConfigChangeEvent::new([TARGET_PROFILE_KEY])).await.unwrap();
		assert_eq!(reaction, Some(ConfigReaction::Profile(TargetProfile::Base)));
		assert_eq!(configure_calls(&f.runtime), 1);
		assert!(f.gate.lock().is_enabled());
	}

	#[tokio::test]
	async fn test_formatting_change_only_toggles_gate() {
		let f = fixture(false);
		f.config.set_formatting_enabled(true);

		let reaction = f.router.route(&ConfigChangeEvent::new([FORMATTING_KEY])).await.unwrap();
		assert_eq!(reaction, Some(ConfigReaction::Formatting(GateTransition::Registered)));
		assert_eq!(configure_calls(&f.runtime), 0);
		assert_eq!(f.gate.lock().held_count(), 2);
	}

	#[tokio::test]
	async fn test_both_keys_in_one_event_only_route_profile() {
		let f = fixture(true);
		f.config.set_formatting_enabled(false);

		let reaction = f
			.router
			.route(&ConfigChangeEvent::new([FORMATTING_KEY, TARGET_PROFILE_KEY]))
			.await
			.unwrap();
		assert!(matches!(reaction, Some(ConfigReaction::Profile(_))));
		assert!(f.gate.lock().is_enabled());
	}

	#[tokio::test]
	async fn test_section_change_routes_profile() {
		let f = fixture(true);
		let reaction = f.router.route(&ConfigChangeEvent::new([SECTION])).await.unwrap();
		assert!(matches!(reaction, Some(ConfigReaction::Profile(_))));
	}

	#[tokio::test]
	async fn test_unrelated_change_is_ignored() {
		let f = fixture(true);
		let reaction = f.router.route(&ConfigChangeEvent::new(["editor.tabSize"])).await.unwrap();
		assert_eq!(reaction, None);
		assert_eq!(configure_calls(&f.runtime), 0);
	}
}
