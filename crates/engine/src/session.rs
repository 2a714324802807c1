//! Engine sessions and the shared handle the host threads through its components.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use lsp_types::Uri;

use crate::config::EngineConfiguration;
use crate::{Error, Result};

/// One running engine instance.
///
/// The engine keeps its own per-document state keyed by URI. Every update carries the full
/// document text, so implementations never reconcile patches.
#[async_trait]
pub trait Session: Send + Sync {
	/// Replaces the engine's view of a document.
	async fn update_document(&self, uri: &Uri, version: i32, text: &str) -> Result<()>;

	/// Drops the engine's view of a document.
	async fn close_document(&self, uri: &Uri) -> Result<()>;

	/// Applies a configuration payload.
	async fn update_configuration(&self, config: &EngineConfiguration) -> Result<()>;

	/// Releases the session and all engine-side per-document state.
	fn dispose(&self);
}

struct HandleInner {
	session: Arc<dyn Session>,
	disposed: AtomicBool,
}

/// Shared reference to a [`Session`].
///
/// Clones point at the same session. [`SessionHandle::dispose`] reaches the engine at most once
/// and any call made afterwards fails with [`Error::Disposed`] without touching the engine.
#[derive(Clone)]
pub struct SessionHandle {
	inner: Arc<HandleInner>,
}

impl fmt::Debug for SessionHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionHandle")
			.field("disposed", &self.is_disposed())
			.finish_non_exhaustive()
	}
}

impl SessionHandle {
	/// Wraps a freshly created session.
	pub fn new(session: Arc<dyn Session>) -> Self {
		Self {
			inner: Arc::new(HandleInner {
				session,
				disposed: AtomicBool::new(false),
			}),
		}
	}

	/// Whether [`Self::dispose`] already ran.
	pub fn is_disposed(&self) -> bool {
		self.inner.disposed.load(Ordering::Acquire)
	}

	fn live(&self) -> Result<&dyn Session> {
		if self.is_disposed() {
			return Err(Error::Disposed);
		}
		Ok(self.inner.session.as_ref())
	}

	/// Forwards a full-text document update.
	pub async fn update_document(&self, uri: &Uri, version: i32, text: &str) -> Result<()> {
		tracing::trace!(uri = uri.as_str(), version, len = text.len(), "session.update_document");
		self.live()?.update_document(uri, version, text).await
	}

	/// Forwards a document close.
	pub async fn close_document(&self, uri: &Uri) -> Result<()> {
		tracing::trace!(uri = uri.as_str(), "session.close_document");
		self.live()?.close_document(uri).await
	}

	/// Forwards a configuration payload.
	pub async fn update_configuration(&self, config: &EngineConfiguration) -> Result<()> {
		tracing::trace!(profile = %config.target_profile, "session.update_configuration");
		self.live()?.update_configuration(config).await
	}

	/// Disposes the session. Returns `true` if this call performed the disposal.
	pub fn dispose(&self) -> bool {
		if self.inner.disposed.swap(true, Ordering::AcqRel) {
			return false;
		}
		tracing::debug!("session.dispose");
		self.inner.session.dispose();
		true
	}

	/// Returns true if both handles refer to the same session.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::AtomicUsize;

	use super::*;

	#[derive(Default)]
	struct CountingSession {
		updates: AtomicUsize,
		disposals: AtomicUsize,
	}

	#[async_trait]
	impl Session for CountingSession {
		async fn update_document(&self, _uri: &Uri, _version: i32, _text: &str) -> Result<()> {
			self.updates.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}

		async fn close_document(&self, _uri: &Uri) -> Result<()> {
			Ok(())
		}

		async fn update_configuration(&self, _config: &EngineConfiguration) -> Result<()> {
			Ok(())
		}

		fn dispose(&self) {
			self.disposals.fetch_add(1, Ordering::SeqCst);
		}
	}

	#[test]
	fn test_dispose_reaches_engine_once() {
		let session = Arc::new(CountingSession::default());
		let handle = SessionHandle::new(session.clone());
		let clone = handle.clone();

		assert!(handle.dispose());
		assert!(!clone.dispose());
		assert!(!handle.dispose());
		assert!(clone.is_disposed());
		assert_eq!(session.disposals.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_calls_after_dispose_are_refused() {
		let session = Arc::new(CountingSession::default());
		let handle = SessionHandle::new(session.clone());
		let uri: Uri = "file:///a.qs".parse().unwrap();

		handle.update_document(&uri, 1, "T1").await.unwrap();
		handle.dispose();

		let err = handle.update_document(&uri, 2, "T2").await.unwrap_err();
		assert!(matches!(err, Error::Disposed));
		assert_eq!(session.updates.load(Ordering::SeqCst), 1);
	}
}
