//! Diagnostics pushed by the engine.
//!
//! [`DiagnosticsCollection`] is the [`SessionEvents`] sink handed to the engine at session
//! creation. It keeps the latest diagnostics per document and, when built with
//! [`DiagnosticsCollection::with_events`], emits a [`DiagnosticsEvent`] summary per update.

use std::collections::HashMap;

use parking_lot::RwLock;
use qside_engine::SessionEvents;
use qside_engine::lsp_types::{Diagnostic, DiagnosticSeverity, Uri};
use tokio::sync::mpsc;

/// Summary emitted when a document's diagnostics change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticsEvent {
	/// Document the diagnostics belong to.
	pub uri: Uri,
	/// Number of error diagnostics.
	pub error_count: usize,
	/// Number of warning diagnostics.
	pub warning_count: usize,
}

/// Sender for diagnostic events.
pub type DiagnosticsEventSender = mpsc::UnboundedSender<DiagnosticsEvent>;

/// Receiver for diagnostic events.
pub type DiagnosticsEventReceiver = mpsc::UnboundedReceiver<DiagnosticsEvent>;

/// Latest publication for one document. Kept after an empty publication or a clear so the
/// version still rejects older pushes.
struct Entry {
	uri: Uri,
	version: Option<i32>,
	diagnostics: Vec<Diagnostic>,
}

/// Latest engine diagnostics per document.
#[derive(Default)]
pub struct DiagnosticsCollection {
	entries: RwLock<HashMap<String, Entry>>,
	events: Option<DiagnosticsEventSender>,
}

impl std::fmt::Debug for DiagnosticsCollection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DiagnosticsCollection")
			.field("documents", &self.len())
			.field("has_events", &self.events.is_some())
			.finish()
	}
}

fn count(diagnostics: &[Diagnostic], severity: DiagnosticSeverity) -> usize {
	diagnostics.iter().filter(|d| d.severity == Some(severity)).count()
}

impl DiagnosticsCollection {
	/// Creates a collection without an event channel.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a collection and the receiver for its update events.
	pub fn with_events() -> (Self, DiagnosticsEventReceiver) {
		let (tx, rx) = mpsc::unbounded_channel();
		let collection = Self {
			entries: RwLock::new(HashMap::new()),
			events: Some(tx),
		};
		(collection, rx)
	}

	/// Diagnostics currently published for `uri`.
	pub fn get(&self, uri: &Uri) -> Vec<Diagnostic> {
		self.entries
			.read()
			.get(uri.as_str())
			.map(|entry| entry.diagnostics.clone())
			.unwrap_or_default()
	}

	/// Number of documents with diagnostics.
	pub fn len(&self) -> usize {
		self.entries.read().values().filter(|entry| !entry.diagnostics.is_empty()).count()
	}

	/// Whether no document has diagnostics.
	pub fn is_empty(&self) -> bool {
		self.entries.read().values().all(|entry| entry.diagnostics.is_empty())
	}

	/// Total error count across all documents.
	pub fn total_error_count(&self) -> usize {
		self.entries
			.read()
			.values()
			.map(|entry| count(&entry.diagnostics, DiagnosticSeverity::ERROR))
			.sum()
	}

	/// Drops diagnostics for `uri`. The last seen version is kept.
	pub fn clear(&self, uri: &Uri) {
		let cleared = self
			.entries
			.write()
			.get_mut(uri.as_str())
			.is_some_and(|entry| !std::mem::take(&mut entry.diagnostics).is_empty());
		if cleared {
			self.emit(uri.clone(), &[]);
		}
	}

	/// Drops every document, emitting an empty update for each one that had diagnostics.
	pub fn clear_all(&self) {
		let cleared = std::mem::take(&mut *self.entries.write());
		let mut emitted = 0;
		for entry in cleared.into_values().filter(|entry| !entry.diagnostics.is_empty()) {
			self.emit(entry.uri, &[]);
			emitted += 1;
		}
		tracing::debug!(documents = emitted, "diagnostics.cleared");
	}

	fn emit(&self, uri: Uri, diagnostics: &[Diagnostic]) {
		if let Some(tx) = &self.events {
			let _ = tx.send(DiagnosticsEvent {
				uri,
				error_count: count(diagnostics, DiagnosticSeverity::ERROR),
				warning_count: count(diagnostics, DiagnosticSeverity::WARNING),
			});
		}
	}
}

impl SessionEvents for DiagnosticsCollection {
	fn on_diagnostics(&self, uri: Uri, version: Option<i32>, diagnostics: Vec<Diagnostic>) {
		{
			let mut entries = self.entries.write();
			let current = entries.get(uri.as_str()).and_then(|e| e.version);
			if let (Some(new), Some(current)) = (version, current)
				&& new < current
			{
				tracing::debug!(uri = uri.as_str(), version = new, current, "diagnostics.stale");
				return;
			}
			entries.insert(
				uri.as_str().to_string(),
				Entry {
					uri: uri.clone(),
					version: version.or(current),
					diagnostics: diagnostics.clone(),
				},
			);
		}
		tracing::trace!(uri = uri.as_str(), version = ?version, count = diagnostics.len(), "diagnostics.published");
		self.emit(uri, &diagnostics);
	}
}
