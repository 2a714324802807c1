//! Document synchronization between the editor and the engine session.
//!
//! [`DocumentSync`] forwards editor document events as engine calls:
//! - open/change: `update_document(uri, version, full_text)`. Always the whole text, never a diff.
//! - close: `close_document(uri)`.
//! - startup: [`DocumentSync::replay`] forwards documents that were already open before any
//!   subscription existed.
//!
//! Documents failing [`DocumentFilter::is_trackable`] never produce an engine call. No copy of
//! document text or version is kept here: the engine holds the only per-document state.
//!
//! # Ordering
//!
//! Every engine call holds the document's lane, a FIFO-fair async mutex keyed by URI, until the
//! engine returns. Calls issued for one document therefore complete in issuance order even when
//! the host does not wait for a handler before delivering the next event. Different documents use
//! different lanes and never wait on each other. A lane is dropped after a close once nothing else
//! is queued on it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use qside_engine::SessionHandle;
use qside_engine::lsp_types::Uri;
use tokio::sync::Mutex as AsyncMutex;

use crate::Result;
use crate::document::{DocumentFilter, TextDocument};

type Lane = Arc<AsyncMutex<()>>;

/// Per-document sequencing points.
#[derive(Default)]
struct Lanes {
	lanes: Mutex<HashMap<String, Lane>>,
}

impl Lanes {
	fn lane(&self, uri: &Uri) -> Lane {
		self.lanes.lock().entry(uri.as_str().to_string()).or_default().clone()
	}

	/// Drops the lane if the caller holds the last outside reference.
	fn retire(&self, uri: &Uri, lane: &Lane) {
		let mut lanes = self.lanes.lock();
		if let Some(current) = lanes.get(uri.as_str())
			&& Arc::ptr_eq(current, lane)
			&& Arc::strong_count(lane) == 2
		{
			lanes.remove(uri.as_str());
		}
	}

	fn len(&self) -> usize {
		self.lanes.lock().len()
	}
}

/// Forwards editor document events to the engine session.
#[derive(Clone)]
pub struct DocumentSync {
	session: SessionHandle,
	filter: DocumentFilter,
	lanes: Arc<Lanes>,
}

impl std::fmt::Debug for DocumentSync {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DocumentSync")
			.field("language_id", &self.filter.language_id())
			.field("lanes", &self.lanes.len())
			.finish_non_exhaustive()
	}
}

impl DocumentSync {
	/// Creates a coordinator forwarding documents accepted by `filter` to `session`.
	pub fn new(session: SessionHandle, filter: DocumentFilter) -> Self {
		Self {
			session,
			filter,
			lanes: Arc::new(Lanes::default()),
		}
	}

	/// The trackability predicate in use.
	pub fn filter(&self) -> &DocumentFilter {
		&self.filter
	}

	/// Whether `doc` reaches the engine at all.
	pub fn is_trackable(&self, doc: &TextDocument) -> bool {
		self.filter.is_trackable(doc)
	}

	/// Forwards every trackable document of a startup snapshot, in enumeration order.
	///
	/// Returns how many documents were forwarded. Stops at the first engine failure.
	pub async fn replay<'a>(&self, docs: impl IntoIterator<Item = &'a TextDocument>) -> Result<usize> {
		let mut forwarded = 0;
		for doc in docs {
			if self.forward_update(doc).await? {
				forwarded += 1;
			}
		}
		tracing::info!(forwarded, "sync.replay");
		Ok(forwarded)
	}

	/// Handles a document-opened event.
	pub async fn did_open(&self, doc: &TextDocument) -> Result<bool> {
		self.forward_update(doc).await
	}

	/// Handles a document-changed event. `doc` carries the new version and full text.
	pub async fn did_change(&self, doc: &TextDocument) -> Result<bool> {
		self.forward_update(doc).await
	}

	/// Handles a document-closed event. Non-trackable documents are ignored.
	pub async fn did_close(&self, doc: &TextDocument) -> Result<bool> {
		if !self.is_trackable(doc) {
			return Ok(false);
		}
		let lane = self.lanes.lane(&doc.uri);
		let result = {
			let _turn = lane.lock().await;
			tracing::debug!(uri = doc.uri.as_str(), "sync.close");
			self.session.close_document(&doc.uri).await
		};
		self.lanes.retire(&doc.uri, &lane);
		result?;
		Ok(true)
	}

	/// Returns `Ok(true)` when an update reached the engine.
	async fn forward_update(&self, doc: &TextDocument) -> Result<bool> {
		if !self.is_trackable(doc) {
			tracing::trace!(uri = doc.uri.as_str(), language = %doc.language_id, "sync.skip");
			return Ok(false);
		}
		let lane = self.lanes.lane(&doc.uri);
		let _turn = lane.lock().await;
		tracing::debug!(uri = doc.uri.as_str(), version = doc.version, "sync.update");
		self.session.update_document(&doc.uri, doc.version, &doc.text).await?;
		Ok(true)
	}
}

#[cfg(test)]
mod tests;
