//! Recording doubles for the engine and the editor.
//!
//! [`RecordingRuntime`] logs every engine call as an [`EngineCall`] in issue order;
//! [`TestHost`] is an [`EditorHost`] over an [`EventBus`] that tracks provider registrations.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use qside_engine::lsp_types::{Diagnostic, Uri};
use qside_engine::{
	DirEntry, EngineConfiguration, EngineRuntime, Manifest, NoOpSessionEvents, ProjectHost, Session, SessionHandle, SessionHost,
	TargetProfile,
};

use crate::disposable::DisposableHandle;
use crate::document::{DEFAULT_LANGUAGE_ID, TextDocument};
use crate::event::{EventBus, EventKind, HostEvent, Listener};
use crate::host::EditorHost;
use crate::provider::{ProviderBinding, ProviderKind};

/// One call observed at the engine boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
	/// `load_module` with the byte count.
	LoadModule {
		/// Module size in bytes.
		size: usize,
	},
	/// `create_session`.
	CreateSession,
	/// `update_document`.
	Update {
		/// Document URI.
		uri: String,
		/// Forwarded version.
		version: i32,
		/// Forwarded full text.
		text: String,
	},
	/// `close_document`.
	Close {
		/// Document URI.
		uri: String,
	},
	/// `update_configuration` with the forwarded profile.
	Configure(TargetProfile),
	/// `dispose`.
	Dispose,
}

impl EngineCall {
	/// Shorthand for an [`EngineCall::Update`].
	pub fn update(uri: &str, version: i32, text: &str) -> Self {
		Self::Update {
			uri: uri.to_string(),
			version,
			text: text.to_string(),
		}
	}

	/// Shorthand for an [`EngineCall::Close`].
	pub fn close(uri: &str) -> Self {
		Self::Close { uri: uri.to_string() }
	}

	/// Whether this is a document update or close.
	pub fn is_document_call(&self) -> bool {
		matches!(self, Self::Update { .. } | Self::Close { .. })
	}
}

type CallLog = Arc<Mutex<Vec<EngineCall>>>;

#[derive(Debug, Default, Clone, Copy)]
struct Failures {
	load: bool,
	configuration: bool,
	updates: bool,
}

/// Engine runtime recording every call into a shared log.
#[derive(Default)]
pub struct RecordingRuntime {
	log: CallLog,
	failures: Failures,
	sessions: AtomicUsize,
	hosts: Mutex<Vec<SessionHost>>,
}

impl RecordingRuntime {
	/// A runtime accepting every call.
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes `load_module` fail.
	pub fn failing_load(mut self) -> Self {
		self.failures.load = true;
		self
	}

	/// Makes `update_configuration` fail after recording it.
	pub fn failing_configuration(mut self) -> Self {
		self.failures.configuration = true;
		self
	}

	/// Makes `update_document` fail after recording it.
	pub fn failing_updates(mut self) -> Self {
		self.failures.updates = true;
		self
	}

	/// Collaborators for `create_session` with no-op project callbacks and events.
	pub fn session_host(&self) -> SessionHost {
		SessionHost {
			project: Arc::new(NullProject),
			events: Arc::new(NoOpSessionEvents),
		}
	}

	/// Opens a session directly, bypassing module loading.
	pub fn open_session(&self) -> SessionHandle {
		let session = self
			.create_session(self.session_host())
			.unwrap_or_else(|err| panic!("recording runtime refused a session: {err}"));
		SessionHandle::new(session)
	}

	/// Every call so far, in issue order.
	pub fn calls(&self) -> Vec<EngineCall> {
		self.log.lock().clone()
	}

	/// Only the document update/close calls.
	pub fn document_calls(&self) -> Vec<EngineCall> {
		self.log.lock().iter().filter(|c| c.is_document_call()).cloned().collect()
	}

	/// Number of sessions created.
	pub fn session_count(&self) -> usize {
		self.sessions.load(Ordering::SeqCst)
	}

	/// Pushes diagnostics through the most recent session's event sink, as the engine would.
	pub fn publish_diagnostics(&self, uri: Uri, version: Option<i32>, diagnostics: Vec<Diagnostic>) {
		let events = self.hosts.lock().last().map(|host| host.events.clone());
		if let Some(events) = events {
			events.on_diagnostics(uri, version, diagnostics);
		}
	}
}

#[async_trait]
impl EngineRuntime for RecordingRuntime {
	async fn load_module(&self, bytes: Vec<u8>) -> qside_engine::Result<()> {
		if self.failures.load {
			return Err(qside_engine::Error::Instantiate("malformed module".into()));
		}
		self.log.lock().push(EngineCall::LoadModule { size: bytes.len() });
		Ok(())
	}

	fn create_session(&self, host: SessionHost) -> qside_engine::Result<Arc<dyn Session>> {
		self.sessions.fetch_add(1, Ordering::SeqCst);
		self.hosts.lock().push(host);
		self.log.lock().push(EngineCall::CreateSession);
		Ok(Arc::new(RecordingSession {
			log: self.log.clone(),
			failures: self.failures,
		}))
	}
}

/// Session appending to its runtime's log.
pub struct RecordingSession {
	log: CallLog,
	failures: Failures,
}

impl RecordingSession {
	fn rejected(operation: &'static str) -> qside_engine::Error {
		qside_engine::Error::Rejected {
			operation,
			message: "rejected by recording session".into(),
		}
	}
}

#[async_trait]
impl Session for RecordingSession {
	async fn update_document(&self, uri: &Uri, version: i32, text: &str) -> qside_engine::Result<()> {
		self.log.lock().push(EngineCall::update(uri.as_str(), version, text));
		if self.failures.updates {
			return Err(Self::rejected("updateDocument"));
		}
		Ok(())
	}

	async fn close_document(&self, uri: &Uri) -> qside_engine::Result<()> {
		self.log.lock().push(EngineCall::close(uri.as_str()));
		Ok(())
	}

	async fn update_configuration(&self, config: &EngineConfiguration) -> qside_engine::Result<()> {
		self.log.lock().push(EngineCall::Configure(config.target_profile.clone()));
		if self.failures.configuration {
			return Err(Self::rejected("updateConfiguration"));
		}
		Ok(())
	}

	fn dispose(&self) {
		self.log.lock().push(EngineCall::Dispose);
	}
}

/// Project host with no files.
struct NullProject;

#[async_trait]
impl ProjectHost for NullProject {
	async fn read_file(&self, path: &Path) -> qside_engine::Result<String> {
		Err(std::io::Error::new(std::io::ErrorKind::NotFound, path.display().to_string()).into())
	}

	async fn list_directory(&self, _path: &Path) -> qside_engine::Result<Vec<DirEntry>> {
		Ok(Vec::new())
	}

	async fn load_manifest(&self, _dir: &Path) -> qside_engine::Result<Option<Manifest>> {
		Ok(None)
	}
}

/// Provider registration change observed by [`TestHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderChange {
	/// A provider was registered.
	Registered(ProviderKind),
	/// A provider was unregistered.
	Unregistered(ProviderKind),
}

/// Editor double: a fixed set of open documents, an [`EventBus`], and a provider ledger.
#[derive(Default)]
pub struct TestHost {
	open: Mutex<Vec<TextDocument>>,
	bus: EventBus,
	providers: Arc<Mutex<Vec<ProviderChange>>>,
}

impl TestHost {
	/// A host with no open documents.
	pub fn new() -> Self {
		Self::default()
	}

	/// A host whose snapshot enumerates `docs` in order.
	pub fn with_open_documents(docs: impl IntoIterator<Item = TextDocument>) -> Self {
		let host = Self::default();
		host.open.lock().extend(docs);
		host
	}

	/// Delivers one event and waits for every listener.
	pub async fn publish(&self, event: HostEvent) -> crate::Result<()> {
		self.bus.publish(event).await
	}

	/// Live listeners for `kind`.
	pub fn listener_count(&self, kind: EventKind) -> usize {
		self.bus.listener_count(kind)
	}

	/// Every registration change, in order.
	pub fn provider_changes(&self) -> Vec<ProviderChange> {
		self.providers.lock().clone()
	}

	/// Providers currently registered.
	pub fn live_providers(&self) -> Vec<ProviderKind> {
		let mut live = Vec::new();
		for change in self.providers.lock().iter() {
			match *change {
				ProviderChange::Registered(kind) => live.push(kind),
				ProviderChange::Unregistered(kind) => {
					if let Some(pos) = live.iter().position(|k| *k == kind) {
						live.remove(pos);
					}
				}
			}
		}
		live
	}
}

impl EditorHost for TestHost {
	fn open_documents(&self) -> Vec<TextDocument> {
		self.open.lock().clone()
	}

	fn subscribe(&self, kind: EventKind, listener: Listener) -> DisposableHandle {
		self.bus.subscribe(kind, listener)
	}

	fn register_provider(&self, _language_id: &str, binding: ProviderBinding) -> DisposableHandle {
		let kind = binding.kind;
		self.providers.lock().push(ProviderChange::Registered(kind));
		let providers = self.providers.clone();
		DisposableHandle::new(format!("provider:{}", kind.as_str()), move || {
			providers.lock().push(ProviderChange::Unregistered(kind));
		})
	}
}

/// `file:///<name>`.
pub fn file_uri(name: &str) -> Uri {
	let text = format!("file:///{name}");
	text.parse().unwrap_or_else(|_| panic!("invalid test uri {text}"))
}

/// A trackable document named `name`.
pub fn qs_document(name: &str, version: i32, text: &str) -> TextDocument {
	TextDocument::new(file_uri(name), DEFAULT_LANGUAGE_ID, version, text)
}
