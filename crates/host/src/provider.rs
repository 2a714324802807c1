//! IDE capability providers registered with the editor.
//!
//! Every capability is backed by the same session. [`ProviderKind::ALWAYS_ON`] registers once at
//! activation; [`ProviderKind::FORMATTING`] is toggled as a unit by the formatting gate.

use std::sync::Arc;

use qside_engine::SessionHandle;

use crate::disposable::DisposableHandle;
use crate::feature::FeatureGate;
use crate::host::EditorHost;

/// IDE capability kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
	/// Completion items.
	Completion,
	/// Hover information.
	Hover,
	/// Go to definition.
	Definition,
	/// Find references.
	References,
	/// Signature help.
	SignatureHelp,
	/// Rename.
	Rename,
	/// Code lenses.
	CodeLens,
	/// Whole-document formatting.
	DocumentFormatting,
	/// Range formatting.
	RangeFormatting,
}

impl ProviderKind {
	/// Providers registered for the whole activation.
	pub const ALWAYS_ON: [ProviderKind; 7] = [
		Self::Completion,
		Self::Hover,
		Self::Definition,
		Self::References,
		Self::SignatureHelp,
		Self::Rename,
		Self::CodeLens,
	];

	/// Providers owned by the formatting gate.
	pub const FORMATTING: [ProviderKind; 2] = [Self::DocumentFormatting, Self::RangeFormatting];

	/// Stable name for logging.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Completion => "completion",
			Self::Hover => "hover",
			Self::Definition => "definition",
			Self::References => "references",
			Self::SignatureHelp => "signature_help",
			Self::Rename => "rename",
			Self::CodeLens => "code_lens",
			Self::DocumentFormatting => "document_formatting",
			Self::RangeFormatting => "range_formatting",
		}
	}

	/// Characters that trigger the provider automatically.
	pub const fn trigger_characters(self) -> &'static [&'static str] {
		match self {
			Self::Completion => &["@"],
			Self::SignatureHelp => &["(", ","],
			_ => &[],
		}
	}
}

/// What the editor binds a provider registration to.
#[derive(Debug, Clone)]
pub struct ProviderBinding {
	/// Capability kind.
	pub kind: ProviderKind,
	/// Automatic trigger characters, empty when the provider is only invoked explicitly.
	pub trigger_characters: &'static [&'static str],
	/// Session answering the provider's requests.
	pub session: SessionHandle,
}

impl ProviderBinding {
	/// Binding for `kind` served by `session`.
	pub fn new(kind: ProviderKind, session: SessionHandle) -> Self {
		Self {
			kind,
			trigger_characters: kind.trigger_characters(),
			session,
		}
	}
}

/// Registers [`ProviderKind::ALWAYS_ON`] in order.
pub fn register_always_on(host: &dyn EditorHost, language_id: &str, session: &SessionHandle) -> Vec<DisposableHandle> {
	let handles: Vec<_> = ProviderKind::ALWAYS_ON
		.iter()
		.map(|&kind| host.register_provider(language_id, ProviderBinding::new(kind, session.clone())))
		.collect();
	tracing::debug!(language = language_id, count = handles.len(), "provider.registered");
	handles
}

/// Builds the disabled formatting gate for `language_id`.
pub fn formatting_gate(host: Arc<dyn EditorHost>, language_id: String, session: SessionHandle) -> FeatureGate<2> {
	FeatureGate::new("formatting", move || {
		ProviderKind::FORMATTING.map(|kind| host.register_provider(&language_id, ProviderBinding::new(kind, session.clone())))
	})
}
