use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use qside_engine::lsp_types::Uri;
use qside_engine::{EngineConfiguration, Session, SessionHandle};
use tokio::sync::Notify;

use super::*;
use crate::test_helpers::{EngineCall, RecordingRuntime, qs_document};

fn sync_for(runtime: &RecordingRuntime) -> DocumentSync {
	DocumentSync::new(runtime.open_session(), DocumentFilter::default())
}

#[tokio::test]
async fn test_open_change_close_forward_full_text_in_order() {
	let runtime = RecordingRuntime::new();
	let sync = sync_for(&runtime);

	assert!(sync.did_open(&qs_document("a.qs", 1, "namespace A {}")).await.unwrap());
	assert!(sync.did_change(&qs_document("a.qs", 2, "namespace A { op }")).await.unwrap());
	assert!(sync.did_close(&qs_document("a.qs", 2, "namespace A { op }")).await.unwrap());

	assert_eq!(
		runtime.document_calls(),
		vec![
			EngineCall::update("file:///a.qs", 1, "namespace A {}"),
			EngineCall::update("file:///a.qs", 2, "namespace A { op }"),
			EngineCall::close("file:///a.qs"),
		]
	);
}

#[tokio::test]
async fn test_untrackable_documents_never_reach_engine() {
	let runtime = RecordingRuntime::new();
	let sync = sync_for(&runtime);
	let other = TextDocument::new("file:///notes.md".parse().unwrap(), "markdown", 1, "# notes");
	let cell = qs_document("nb.ipynb#cell1", 1, "H(q);").in_notebook();

	for doc in [&other, &cell] {
		assert!(!sync.did_open(doc).await.unwrap());
		assert!(!sync.did_change(doc).await.unwrap());
		assert!(!sync.did_close(doc).await.unwrap());
	}
	assert_eq!(sync.replay([&other, &cell]).await.unwrap(), 0);

	assert!(runtime.document_calls().is_empty());
	assert_eq!(sync.lanes.len(), 0);
}

#[tokio::test]
async fn test_replay_forwards_trackable_documents_in_enumeration_order() {
	let runtime = RecordingRuntime::new();
	let sync = sync_for(&runtime);
	let docs = vec![
		qs_document("a.qs", 3, "A"),
		TextDocument::new("file:///b.txt".parse().unwrap(), "plaintext", 1, "B"),
		qs_document("c.qs", 1, "C"),
	];

	assert_eq!(sync.replay(&docs).await.unwrap(), 2);
	assert_eq!(
		runtime.document_calls(),
		vec![EngineCall::update("file:///a.qs", 3, "A"), EngineCall::update("file:///c.qs", 1, "C")]
	);
}

#[tokio::test]
async fn test_replay_stops_at_first_engine_failure() {
	let runtime = RecordingRuntime::new().failing_updates();
	let sync = sync_for(&runtime);
	let docs = [qs_document("a.qs", 1, "A"), qs_document("b.qs", 1, "B")];

	let err = sync.replay(&docs).await.unwrap_err();
	assert!(matches!(err, crate::Error::Engine(qside_engine::Error::Rejected { .. })));
	assert_eq!(runtime.document_calls(), vec![EngineCall::update("file:///a.qs", 1, "A")]);
}

#[tokio::test]
async fn test_close_retires_lane() {
	let runtime = RecordingRuntime::new();
	let sync = sync_for(&runtime);

	sync.did_open(&qs_document("a.qs", 1, "A")).await.unwrap();
	sync.did_open(&qs_document("b.qs", 1, "B")).await.unwrap();
	assert_eq!(sync.lanes.len(), 2);

	sync.did_close(&qs_document("a.qs", 1, "A")).await.unwrap();
	assert_eq!(sync.lanes.len(), 1);
}

#[tokio::test]
async fn test_calls_after_dispose_fail_without_reaching_engine() {
	let runtime = RecordingRuntime::new();
	let session = runtime.open_session();
	let sync = DocumentSync::new(session.clone(), DocumentFilter::default());
	session.dispose();

	let err = sync.did_open(&qs_document("a.qs", 1, "A")).await.unwrap_err();
	assert!(matches!(err, crate::Error::Engine(qside_engine::Error::Disposed)));
	assert!(runtime.document_calls().is_empty());
}

/// Session whose updates for `gated` block until released.
struct GatedSession {
	gated: String,
	gate: Arc<Notify>,
	log: Arc<SyncMutex<Vec<String>>>,
}

#[async_trait]
impl Session for GatedSession {
	async fn update_document(&self, uri: &Uri, version: i32, _text: &str) -> qside_engine::Result<()> {
		self.log.lock().push(format!("start {} v{version}", uri.as_str()));
		if uri.as_str() == self.gated && version == 1 {
			self.gate.notified().await;
		}
		self.log.lock().push(format!("end {} v{version}", uri.as_str()));
		Ok(())
	}

	async fn close_document(&self, uri: &Uri) -> qside_engine::Result<()> {
		self.log.lock().push(format!("close {}", uri.as_str()));
		Ok(())
	}

	async fn update_configuration(&self, _config: &EngineConfiguration) -> qside_engine::Result<()> {
		Ok(())
	}

	fn dispose(&self) {}
}

fn gated_sync(gated: &str) -> (DocumentSync, Arc<Notify>, Arc<SyncMutex<Vec<String>>>) {
	let gate = Arc::new(Notify::new());
	let log = Arc::new(SyncMutex::new(Vec::new()));
	let session = GatedSession {
		gated: gated.to_string(),
		gate: gate.clone(),
		log: log.clone(),
	};
	let sync = DocumentSync::new(SessionHandle::new(Arc::new(session)), DocumentFilter::default());
	(sync, gate, log)
}

#[tokio::test]
async fn test_same_document_calls_complete_in_issue_order() {
	let (sync, gate, log) = gated_sync("file:///a.qs");
	let v1 = qs_document("a.qs", 1, "one");
	let v2 = qs_document("a.qs", 2, "two");
	let closed = qs_document("a.qs", 2, "two");

	let release = async {
		tokio::task::yield_now().await;
		assert_eq!(*log.lock(), vec!["start file:///a.qs v1".to_string()]);
		gate.notify_one();
	};
	let (first, second, close, ()) = tokio::join!(sync.did_open(&v1), sync.did_change(&v2), sync.did_close(&closed), release);
	first.unwrap();
	second.unwrap();
	close.unwrap();

	assert_eq!(
		*log.lock(),
		vec![
			"start file:///a.qs v1",
			"end file:///a.qs v1",
			"start file:///a.qs v2",
			"end file:///a.qs v2",
			"close file:///a.qs",
		]
	);
	assert_eq!(sync.lanes.len(), 0);
}

#[tokio::test]
async fn test_different_documents_do_not_wait_on_each_other() {
	let (sync, gate, log) = gated_sync("file:///slow.qs");
	let slow = qs_document("slow.qs", 1, "slow");
	let fast = qs_document("fast.qs", 1, "fast");

	let release = async {
		tokio::task::yield_now().await;
		assert!(log.lock().contains(&"end file:///fast.qs v1".to_string()));
		gate.notify_one();
	};
	let (slow_result, fast_result, ()) = tokio::join!(sync.did_open(&slow), sync.did_open(&fast), release);
	slow_result.unwrap();
	fast_result.unwrap();

	assert_eq!(log.lock().last().map(String::as_str), Some("end file:///slow.qs v1"));
}
