use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::events::SessionEvents;
use crate::project::ProjectHost;
use crate::session::Session;
use crate::Result;

/// Collaborators handed to the engine when a session is created.
#[derive(Clone)]
pub struct SessionHost {
	/// File reader, directory lister and manifest loader.
	pub project: Arc<dyn ProjectHost>,
	/// Push channel for engine-produced results.
	pub events: Arc<dyn SessionEvents>,
}

impl fmt::Debug for SessionHost {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionHost").finish_non_exhaustive()
	}
}

/// Runtime that hosts the engine binary module.
///
/// A runtime is instantiated once with [`EngineRuntime::load_module`]; each call to
/// [`EngineRuntime::create_session`] afterwards opens an independent session. Nothing
/// deduplicates sessions: calling it twice yields two engines.
#[async_trait]
pub trait EngineRuntime: Send + Sync {
	/// Instantiates the engine from its module bytes.
	///
	/// Fails with [`crate::Error::Instantiate`] on malformed bytes.
	async fn load_module(&self, bytes: Vec<u8>) -> Result<()>;

	/// Opens a session bound to the given host collaborators.
	fn create_session(&self, host: SessionHost) -> Result<Arc<dyn Session>>;
}
