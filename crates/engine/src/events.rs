use lsp_types::{Diagnostic, Uri};

/// Callbacks the engine invokes to push results back to the host.
///
/// Implementations must be cheap: the engine calls them inline from its own processing.
pub trait SessionEvents: Send + Sync {
	/// Diagnostics for a document were (re)computed.
	///
	/// `version` is the document version the diagnostics were computed against, if the engine
	/// knows it. An empty list clears previously published diagnostics.
	fn on_diagnostics(&self, uri: Uri, version: Option<i32>, diagnostics: Vec<Diagnostic>);
}

/// Event sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSessionEvents;

impl SessionEvents for NoOpSessionEvents {
	fn on_diagnostics(&self, _uri: Uri, _version: Option<i32>, _diagnostics: Vec<Diagnostic>) {}
}
