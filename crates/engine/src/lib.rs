//! Boundary of the external language-analysis engine.
//!
//! The engine is an opaque binary module loaded once per activation. This crate only describes
//! how the host talks to it:
//! - [`EngineRuntime`]: instantiates the module and opens sessions.
//! - [`Session`]: one running engine instance, addressed through a [`SessionHandle`].
//! - [`ProjectHost`]: file reading, directory listing and manifest loading callbacks the engine
//!   calls back into. [`FsProjectHost`] backs them with the local filesystem.
//! - [`SessionEvents`]: push channel for engine-produced diagnostics.
//!
//! Nothing here parses, type-checks or formats source code; those algorithms live inside the
//! engine.
use std::io;
use std::path::PathBuf;

/// Re-export of the [`lsp_types`] dependency used for diagnostics and URIs.
pub use lsp_types;

mod config;
mod events;
mod runtime;
mod session;

pub mod project;

pub use config::{EngineConfiguration, TargetProfile};
pub use events::{NoOpSessionEvents, SessionEvents};
pub use project::{DirEntry, EntryKind, FsProjectHost, MANIFEST_FILE_NAME, Manifest, ProjectHost};
pub use runtime::{EngineRuntime, SessionHost};
pub use session::{Session, SessionHandle};

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised at the engine boundary.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The module bytes could not be instantiated.
	#[error("engine module failed to instantiate: {0}")]
	Instantiate(String),
	/// The engine rejected a session call.
	#[error("engine rejected {operation}: {message}")]
	Rejected {
		/// Session operation that failed (`updateDocument`, `closeDocument`, ...).
		operation: &'static str,
		/// Engine-provided failure description.
		message: String,
	},
	/// The session was already disposed.
	#[error("session disposed")]
	Disposed,
	/// Input/output errors from project callbacks.
	#[error("{0}")]
	Io(#[from] io::Error),
	/// A project manifest exists but is not valid JSON.
	#[error("invalid manifest {}: {source}", path.display())]
	Manifest {
		/// Path of the offending manifest.
		path: PathBuf,
		/// Decoder failure.
		source: serde_json::Error,
	},
}
