//! Editor event kinds and an in-process subscription hub.
//!
//! Subscriptions are explicit: [`EventBus::subscribe`] returns a [`DisposableHandle`] that removes
//! the listener when disposed. There is no global listener registry.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;

use crate::Result;
use crate::config::ConfigChangeEvent;
use crate::disposable::DisposableHandle;
use crate::document::TextDocument;

/// Kinds of editor events a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
	/// A document was opened.
	DocumentOpened,
	/// A document's content changed.
	DocumentChanged,
	/// A document was closed.
	DocumentClosed,
	/// Configuration changed.
	ConfigurationChanged,
}

impl EventKind {
	/// Stable name for logging.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::DocumentOpened => "document_opened",
			Self::DocumentChanged => "document_changed",
			Self::DocumentClosed => "document_closed",
			Self::ConfigurationChanged => "configuration_changed",
		}
	}
}

/// An editor event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
	/// Document opened, with its initial version and text.
	Opened(TextDocument),
	/// Document changed, with the new version and full text.
	Changed(TextDocument),
	/// Document closed.
	Closed(TextDocument),
	/// Configuration changed.
	ConfigurationChanged(ConfigChangeEvent),
}

impl HostEvent {
	/// Kind of this event.
	pub fn kind(&self) -> EventKind {
		match self {
			Self::Opened(_) => EventKind::DocumentOpened,
			Self::Changed(_) => EventKind::DocumentChanged,
			Self::Closed(_) => EventKind::DocumentClosed,
			Self::ConfigurationChanged(_) => EventKind::ConfigurationChanged,
		}
	}
}

/// Event callback. The returned future is the handler's asynchronous portion.
pub type Listener = Arc<dyn Fn(HostEvent) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Builds a [`Listener`] from an async closure.
pub fn listener<F, Fut>(f: F) -> Listener
where
	F: Fn(HostEvent) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<()>> + Send + 'static,
{
	Arc::new(move |event| Box::pin(f(event)))
}

#[derive(Default)]
struct BusState {
	next_id: u64,
	listeners: Vec<(u64, EventKind, Listener)>,
}

/// Subscription hub delivering events to listeners in subscription order.
///
/// [`EventBus::publish`] awaits each listener before calling the next one and before returning,
/// so a host publishing events one at a time gets per-document ordering for free.
#[derive(Clone, Default)]
pub struct EventBus {
	state: Arc<Mutex<BusState>>,
}

impl std::fmt::Debug for EventBus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventBus")
			.field("listeners", &self.state.lock().listeners.len())
			.finish()
	}
}

impl EventBus {
	/// Creates an empty bus.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `listener` for `kind`.
	pub fn subscribe(&self, kind: EventKind, listener: Listener) -> DisposableHandle {
		let id = {
			let mut state = self.state.lock();
			let id = state.next_id;
			state.next_id += 1;
			state.listeners.push((id, kind, listener));
			id
		};
		let state = Arc::downgrade(&self.state);
		DisposableHandle::new(format!("subscription:{}", kind.as_str()), move || {
			if let Some(state) = state.upgrade() {
				state.lock().listeners.retain(|(existing, _, _)| *existing != id);
			}
		})
	}

	/// Number of live listeners for `kind`.
	pub fn listener_count(&self, kind: EventKind) -> usize {
		self.state.lock().listeners.iter().filter(|(_, k, _)| *k == kind).count()
	}

	/// Delivers `event` to every listener of its kind. Stops at the first listener error.
	pub async fn publish(&self, event: HostEvent) -> Result<()> {
		let kind = event.kind();
		let listeners: Vec<Listener> = self
			.state
			.lock()
			.listeners
			.iter()
			.filter(|(_, k, _)| *k == kind)
			.map(|(_, _, listener)| listener.clone())
			.collect();
		tracing::trace!(kind = kind.as_str(), listeners = listeners.len(), "event.publish");
		for listener in listeners {
			listener(event.clone()).await?;
		}
		Ok(())
	}
}
