//! Disposable handles and their aggregator.
//!
//! Every registration the host hands back (provider, event subscription, session) is a
//! [`DisposableHandle`]. Handles are cloneable and idempotent: the release action runs at most
//! once no matter how many clones call [`DisposableHandle::dispose`], so a component may release
//! a handle early while [`Disposables`] still holds it.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

type ReleaseFn = Box<dyn FnOnce() + Send>;

struct HandleInner {
	label: Cow<'static, str>,
	release: Mutex<Option<ReleaseFn>>,
}

/// A releasable resource.
#[derive(Clone)]
pub struct DisposableHandle {
	inner: Arc<HandleInner>,
}

impl fmt::Debug for DisposableHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DisposableHandle")
			.field("label", &self.inner.label)
			.field("disposed", &self.is_disposed())
			.finish()
	}
}

impl DisposableHandle {
	/// Creates a handle running `release` on first disposal.
	pub fn new(label: impl Into<Cow<'static, str>>, release: impl FnOnce() + Send + 'static) -> Self {
		Self {
			inner: Arc::new(HandleInner {
				label: label.into(),
				release: Mutex::new(Some(Box::new(release))),
			}),
		}
	}

	/// Creates a handle with nothing to release.
	pub fn noop(label: impl Into<Cow<'static, str>>) -> Self {
		Self::new(label, || {})
	}

	/// Diagnostic label.
	pub fn label(&self) -> &str {
		&self.inner.label
	}

	/// Whether the release action already ran (or is running).
	pub fn is_disposed(&self) -> bool {
		self.inner.release.lock().is_none()
	}

	/// Releases the resource. Returns `true` if this call ran the release action.
	pub fn dispose(&self) -> bool {
		// Take under the lock, run outside it: release actions may dispose other handles.
		let release = self.inner.release.lock().take();
		match release {
			Some(release) => {
				tracing::trace!(label = %self.inner.label, "disposable.dispose");
				release();
				true
			}
			None => false,
		}
	}
}

/// Ordered owner of every handle produced during an activation.
///
/// Teardown runs in reverse registration order and visits each handle exactly once. Handles
/// released individually beforehand are skipped as no-ops. Dropping the aggregator tears down
/// whatever it still holds.
#[derive(Debug, Default)]
pub struct Disposables {
	handles: Vec<DisposableHandle>,
}

impl Disposables {
	/// Creates an empty aggregator.
	pub fn new() -> Self {
		Self::default()
	}

	/// Takes ownership of a handle.
	pub fn push(&mut self, handle: DisposableHandle) {
		self.handles.push(handle);
	}

	/// Number of handles held.
	pub fn len(&self) -> usize {
		self.handles.len()
	}

	/// Whether no handles are held.
	pub fn is_empty(&self) -> bool {
		self.handles.is_empty()
	}

	/// Disposes all held handles in reverse order and empties the aggregator.
	///
	/// Returns how many handles were actually released by this call.
	pub fn dispose_all(&mut self) -> usize {
		let total = self.handles.len();
		let mut released = 0;
		while let Some(handle) = self.handles.pop() {
			if handle.dispose() {
				released += 1;
			}
		}
		if total > 0 {
			tracing::debug!(total, released, "disposables.teardown");
		}
		released
	}
}

impl Extend<DisposableHandle> for Disposables {
	fn extend<I: IntoIterator<Item = DisposableHandle>>(&mut self, iter: I) {
		self.handles.extend(iter);
	}
}

impl Drop for Disposables {
	fn drop(&mut self) {
		self.dispose_all();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn recording(log: &Arc<Mutex<Vec<String>>>, label: &'static str) -> DisposableHandle {
		let log = log.clone();
		DisposableHandle::new(label, move || log.lock().push(label.to_string()))
	}

	#[test]
	fn test_dispose_runs_once_across_clones() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let handle = recording(&log, "a");
		let clone = handle.clone();

		assert!(!handle.is_disposed());
		assert!(clone.dispose());
		assert!(!handle.dispose());
		assert!(handle.is_disposed());
		assert_eq!(*log.lock(), vec!["a"]);
	}

	#[test]
	fn test_teardown_is_reverse_order() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let mut disposables = Disposables::new();
		disposables.push(recording(&log, "session"));
		disposables.push(recording(&log, "hover"));
		disposables.push(recording(&log, "on_open"));

		assert_eq!(disposables.dispose_all(), 3);
		assert!(disposables.is_empty());
		assert_eq!(*log.lock(), vec!["on_open", "hover", "session"]);
	}

	#[test]
	fn test_teardown_skips_already_disposed() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let early = recording(&log, "formatting");
		let mut disposables = Disposables::new();
		disposables.push(recording(&log, "session"));
		disposables.push(early.clone());

		early.dispose();
		assert_eq!(disposables.dispose_all(), 1);
		assert_eq!(*log.lock(), vec!["formatting", "session"]);
		assert_eq!(disposables.dispose_all(), 0);
	}

	#[test]
	fn test_drop_tears_down() {
		let log = Arc::new(Mutex::new(Vec::new()));
		{
			let mut disposables = Disposables::new();
			disposables.extend([recording(&log, "a"), recording(&log, "b")]);
		}
		assert_eq!(*log.lock(), vec!["b", "a"]);
	}

	#[test]
	fn test_release_may_dispose_other_handles() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let child = recording(&log, "child");
		let child_clone = child.clone();
		let parent = DisposableHandle::new("parent", move || {
			child_clone.dispose();
		});

		assert!(parent.dispose());
		assert!(child.is_disposed());
		assert_eq!(*log.lock(), vec!["child"]);
	}
}
