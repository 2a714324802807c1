//! Editor document snapshots and the trackability predicate.

use qside_engine::lsp_types::Uri;

/// Default language identifier for tracked documents.
pub const DEFAULT_LANGUAGE_ID: &str = "qsharp";

/// A document as the editor reports it at event time.
///
/// Carries the full current text; the host never keeps a mirror of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
	/// Document identity.
	pub uri: Uri,
	/// Editor language identifier.
	pub language_id: String,
	/// Editor version, increasing with every edit.
	pub version: i32,
	/// Full text at `version`.
	pub text: String,
	/// Whether the document is a cell of a notebook.
	pub notebook_cell: bool,
}

impl TextDocument {
	/// Creates a plain (non-notebook) document.
	pub fn new(uri: Uri, language_id: impl Into<String>, version: i32, text: impl Into<String>) -> Self {
		Self {
			uri,
			language_id: language_id.into(),
			version,
			text: text.into(),
			notebook_cell: false,
		}
	}

	/// Marks the document as a notebook cell.
	pub fn in_notebook(mut self) -> Self {
		self.notebook_cell = true;
		self
	}
}

/// Decides which documents reach the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFilter {
	language_id: String,
}

impl Default for DocumentFilter {
	fn default() -> Self {
		Self::new(DEFAULT_LANGUAGE_ID)
	}
}

impl DocumentFilter {
	/// Filter accepting documents of `language_id`.
	pub fn new(language_id: impl Into<String>) -> Self {
		Self {
			language_id: language_id.into(),
		}
	}

	/// Target language identifier.
	pub fn language_id(&self) -> &str {
		&self.language_id
	}

	/// Whether the document is written in the target language.
	pub fn matches_language(&self, doc: &TextDocument) -> bool {
		doc.language_id == self.language_id
	}

	/// Whether the document is a notebook cell. Cells are translated elsewhere.
	pub fn is_notebook_cell(&self, doc: &TextDocument) -> bool {
		doc.notebook_cell
	}

	/// `matches_language && !is_notebook_cell`.
	pub fn is_trackable(&self, doc: &TextDocument) -> bool {
		self.matches_language(doc) && !self.is_notebook_cell(doc)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn doc(language: &str) -> TextDocument {
		TextDocument::new("file:///a.qs".parse().unwrap(), language, 1, "")
	}

	#[test]
	fn test_trackable_requires_language_and_not_cell() {
		let filter = DocumentFilter::default();
		assert!(filter.is_trackable(&doc("qsharp")));
		assert!(!filter.is_trackable(&doc("rust")));
		assert!(!filter.is_trackable(&doc("qsharp").in_notebook()));
	}
}
