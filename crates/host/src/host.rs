use crate::disposable::DisposableHandle;
use crate::document::TextDocument;
use crate::event::{EventKind, Listener};
use crate::provider::ProviderBinding;

/// The editor process hosting an activation.
///
/// The host owns the event loop. It must deliver a document's events in arrival order and only
/// after the listener call for the previous event of that document returned.
pub trait EditorHost: Send + Sync {
	/// Documents open right now, in the editor's enumeration order.
	fn open_documents(&self) -> Vec<TextDocument>;

	/// Subscribes `listener` to events of `kind`. Disposing the handle unsubscribes.
	fn subscribe(&self, kind: EventKind, listener: Listener) -> DisposableHandle;

	/// Registers a capability provider. Disposing the handle unregisters it.
	fn register_provider(&self, language_id: &str, binding: ProviderBinding) -> DisposableHandle;
}
