//! One activation: the session plus everything registered against it.

use std::path::PathBuf;
use std::sync::Arc;

use qside_engine::{EngineRuntime, ProjectHost, SessionHandle, SessionHost};
use tokio::sync::watch;

use crate::Result;
use crate::bootstrap::SessionBootstrapper;
use crate::config::{ConfigChangeRouter, ConfigurationSource};
use crate::diagnostics::{DiagnosticsCollection, DiagnosticsEventReceiver};
use crate::disposable::{DisposableHandle, Disposables};
use crate::document::{DEFAULT_LANGUAGE_ID, DocumentFilter};
use crate::event::{EventKind, HostEvent, Listener, listener};
use crate::feature::{self, SharedFeatureGate};
use crate::host::EditorHost;
use crate::provider;
use crate::sync::DocumentSync;

/// Where the engine lives and which documents it serves.
#[derive(Debug, Clone)]
pub struct ActivationOptions {
	/// Location of the engine binary module.
	pub engine_path: PathBuf,
	/// Language identifier of tracked documents.
	pub language_id: String,
}

impl ActivationOptions {
	/// Options for the engine at `engine_path` serving [`DEFAULT_LANGUAGE_ID`].
	pub fn new(engine_path: impl Into<PathBuf>) -> Self {
		Self {
			engine_path: engine_path.into(),
			language_id: DEFAULT_LANGUAGE_ID.to_string(),
		}
	}

	/// Serves `language_id` instead of the default.
	pub fn language_id(mut self, language_id: impl Into<String>) -> Self {
		self.language_id = language_id.into();
		self
	}
}

/// External collaborators of an activation.
#[derive(Clone)]
pub struct Collaborators {
	/// The editor.
	pub host: Arc<dyn EditorHost>,
	/// Runtime hosting the engine module.
	pub runtime: Arc<dyn EngineRuntime>,
	/// Configuration reader.
	pub config: Arc<dyn ConfigurationSource>,
	/// Project callbacks handed to the engine.
	pub project: Arc<dyn ProjectHost>,
}

/// A live activation.
///
/// Owns every handle it produced. [`Activation::deactivate`] (or dropping the activation)
/// releases them in reverse registration order: event subscriptions, the formatting gate,
/// always-on providers, diagnostics, and finally the session.
pub struct Activation {
	session: SessionHandle,
	sync: DocumentSync,
	router: Arc<ConfigChangeRouter>,
	formatting: SharedFeatureGate<2>,
	diagnostics: Arc<DiagnosticsCollection>,
	diagnostics_rx: Option<DiagnosticsEventReceiver>,
	replayed: watch::Sender<bool>,
	disposables: Disposables,
}

impl std::fmt::Debug for Activation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Activation")
			.field("session", &self.session)
			.field("formatting_enabled", &self.formatting_enabled())
			.field("disposables", &self.disposables.len())
			.finish_non_exhaustive()
	}
}

/// Bootstraps the engine and wires every component to the editor.
///
/// Fails only with [`crate::Error::Initialization`] or, if replaying already-open documents
/// fails, with the engine error. Either way nothing stays registered.
pub async fn activate(options: ActivationOptions, collaborators: Collaborators) -> Result<Activation> {
	let Collaborators {
		host,
		runtime,
		config,
		project,
	} = collaborators;
	let ActivationOptions {
		engine_path,
		language_id,
	} = options;

	let (diagnostics, diagnostics_rx) = DiagnosticsCollection::with_events();
	let diagnostics = Arc::new(diagnostics);
	let snapshot = config.snapshot();

	let session_host = SessionHost {
		project,
		events: diagnostics.clone(),
	};
	let session = SessionBootstrapper::new(runtime)
		.bootstrap(&engine_path, session_host, &snapshot)
		.await?;

	let mut disposables = Disposables::new();
	disposables.push(session_disposable(&session));
	disposables.push(diagnostics_disposable(&diagnostics));
	disposables.extend(provider::register_always_on(host.as_ref(), &language_id, &session));

	let formatting = feature::shared(provider::formatting_gate(host.clone(), language_id.clone(), session.clone()));
	feature::set_enabled(&formatting, snapshot.formatting_enabled);
	disposables.push(feature::teardown_handle(&formatting));

	let sync = DocumentSync::new(session.clone(), DocumentFilter::new(language_id));
	let router = Arc::new(ConfigChangeRouter::new(session.clone(), config, formatting.clone()));

	// Snapshot and subscribe without yielding in between: every document is either in the
	// snapshot or arrives as a live event, and live events wait until the replay is done.
	let (replayed, replayed_rx) = watch::channel(false);
	let open_documents = host.open_documents();
	let listeners = Listeners {
		sync: sync.clone(),
		router: router.clone(),
		diagnostics: diagnostics.clone(),
		replayed: replayed_rx,
	};
	disposables.extend(listeners.subscribe(host.as_ref()));

	sync.replay(&open_documents).await?;
	let _ = replayed.send(true);

	tracing::info!(
		replayed = open_documents.len(),
		formatting = snapshot.formatting_enabled,
		handles = disposables.len(),
		"activation.ready"
	);

	Ok(Activation {
		session,
		sync,
		router,
		formatting,
		diagnostics,
		diagnostics_rx: Some(diagnostics_rx),
		replayed,
		disposables,
	})
}

fn session_disposable(session: &SessionHandle) -> DisposableHandle {
	let session = session.clone();
	DisposableHandle::new("session", move || {
		session.dispose();
	})
}

fn diagnostics_disposable(diagnostics: &Arc<DiagnosticsCollection>) -> DisposableHandle {
	let diagnostics = diagnostics.clone();
	DisposableHandle::new("diagnostics", move || diagnostics.clear_all())
}

/// Event listeners shared by every subscription of one activation.
#[derive(Clone)]
struct Listeners {
	sync: DocumentSync,
	router: Arc<ConfigChangeRouter>,
	diagnostics: Arc<DiagnosticsCollection>,
	replayed: watch::Receiver<bool>,
}

impl Listeners {
	fn subscribe(self, host: &dyn EditorHost) -> Vec<DisposableHandle> {
		let documents = self.clone().into_listener();
		vec![
			host.subscribe(EventKind::DocumentOpened, documents.clone()),
			host.subscribe(EventKind::DocumentChanged, documents.clone()),
			host.subscribe(EventKind::DocumentClosed, documents),
			host.subscribe(EventKind::ConfigurationChanged, self.into_listener()),
		]
	}

	fn into_listener(self) -> Listener {
		listener(move |event| self.clone().handle(event))
	}

	async fn handle(mut self, event: HostEvent) -> Result<()> {
		let replayed = self.replayed.wait_for(|done| *done).await.is_ok();
		if !replayed {
			// Activation failed before the replay finished.
			return Ok(());
		}
		match event {
			HostEvent::Opened(doc) => {
				self.sync.did_open(&doc).await?;
			}
			HostEvent::Changed(doc) => {
				self.sync.did_change(&doc).await?;
			}
			HostEvent::Closed(doc) => {
				if self.sync.did_close(&doc).await? {
					self.diagnostics.clear(&doc.uri);
				}
			}
			HostEvent::ConfigurationChanged(change) => {
				self.router.route(&change).await?;
			}
		}
		Ok(())
	}
}

impl Activation {
	/// The session shared by every component.
	pub fn session(&self) -> &SessionHandle {
		&self.session
	}

	/// Document synchronization coordinator.
	pub fn sync(&self) -> &DocumentSync {
		&self.sync
	}

	/// Configuration change router.
	pub fn router(&self) -> &ConfigChangeRouter {
		&self.router
	}

	/// Whether formatting providers are currently registered.
	pub fn formatting_enabled(&self) -> bool {
		self.formatting.lock().is_enabled()
	}

	/// Diagnostics pushed by the engine.
	pub fn diagnostics(&self) -> &DiagnosticsCollection {
		&self.diagnostics
	}

	/// Takes the diagnostics event receiver. Returns `None` after the first call.
	pub fn take_diagnostics_events(&mut self) -> Option<DiagnosticsEventReceiver> {
		self.diagnostics_rx.take()
	}

	/// Number of handles owned by this activation.
	pub fn handle_count(&self) -> usize {
		self.disposables.len()
	}

	/// Whether the startup replay completed.
	pub fn is_replayed(&self) -> bool {
		*self.replayed.borrow()
	}

	/// Releases everything in reverse registration order.
	pub fn deactivate(mut self) {
		let released = self.disposables.dispose_all();
		tracing::info!(released, "activation.deactivated");
	}
}
