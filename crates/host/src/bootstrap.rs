//! Engine loading and session creation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use qside_engine::{EngineConfiguration, EngineRuntime, SessionHandle, SessionHost, TargetProfile};

use crate::config::ConfigSnapshot;

/// Fatal activation failures. Nothing is retried.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum InitializationError {
	/// The engine module bytes could not be read.
	#[error("failed to read engine module {}: {source}", path.display())]
	Read {
		/// Module location.
		path: PathBuf,
		/// Underlying I/O failure.
		source: std::io::Error,
	},
	/// The runtime rejected the module bytes.
	#[error("failed to instantiate engine: {0}")]
	Instantiate(#[source] qside_engine::Error),
	/// The runtime could not open a session.
	#[error("failed to create engine session: {0}")]
	Session(#[source] qside_engine::Error),
	/// The initial configuration was refused.
	#[error("failed to apply initial configuration: {0}")]
	Configure(#[source] qside_engine::Error),
}

/// Loads the engine binary and opens one session.
///
/// Every call to [`SessionBootstrapper::load`] opens a new, independent session; callers
/// activate at most once per context.
pub struct SessionBootstrapper {
	runtime: Arc<dyn EngineRuntime>,
}

impl SessionBootstrapper {
	/// Creates a bootstrapper over `runtime`.
	pub fn new(runtime: Arc<dyn EngineRuntime>) -> Self {
		Self { runtime }
	}

	/// Reads the module at `location`, instantiates it and opens a session.
	pub async fn load(&self, location: &Path, host: SessionHost) -> Result<SessionHandle, InitializationError> {
		let bytes = tokio::fs::read(location).await.map_err(|source| InitializationError::Read {
			path: location.to_path_buf(),
			source,
		})?;
		let size = bytes.len();
		self.runtime.load_module(bytes).await.map_err(InitializationError::Instantiate)?;
		let session = self.runtime.create_session(host).map_err(InitializationError::Session)?;
		tracing::info!(path = %location.display(), size, "session.bootstrap.loaded");
		Ok(SessionHandle::new(session))
	}

	/// [`Self::load`] followed by applying the snapshot's profile.
	///
	/// A refused initial configuration disposes the session before returning.
	pub async fn bootstrap(&self, location: &Path, host: SessionHost, snapshot: &ConfigSnapshot) -> Result<SessionHandle, InitializationError> {
		let session = self.load(location, host).await?;
		if let Err(err) = apply_profile(&session, &snapshot.target_profile).await {
			session.dispose();
			return Err(InitializationError::Configure(err));
		}
		Ok(session)
	}
}

/// Forwards `profile` to the session's configuration call.
///
/// Unrecognized profiles are logged and forwarded unchanged; the engine falls back to its own
/// default.
pub async fn apply_profile(session: &SessionHandle, profile: &TargetProfile) -> qside_engine::Result<()> {
	if !profile.is_recognized() {
		tracing::warn!(profile = %profile, "session.profile.unrecognized");
	}
	session.update_configuration(&EngineConfiguration::with_profile(profile.clone())).await?;
	tracing::debug!(profile = %profile, "session.profile.applied");
	Ok(())
}
