//! Optional capabilities whose provider registrations toggle as a unit.
//!
//! A [`FeatureGate`] holds either no handles (disabled) or exactly `N` (enabled). The handle set
//! is a fixed-size array behind an `Option`, so a partially registered feature cannot be
//! represented.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::disposable::DisposableHandle;

type RegisterFn<const N: usize> = Arc<dyn Fn() -> [DisposableHandle; N] + Send + Sync>;

/// Outcome of [`FeatureGate::set_enabled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTransition {
	/// The feature went from disabled to enabled; `N` handles were registered.
	Registered,
	/// The feature went from enabled to disabled; all held handles were disposed.
	Disposed,
	/// The requested state was already in effect.
	Unchanged,
}

/// On/off switch for one optional capability.
pub struct FeatureGate<const N: usize> {
	name: &'static str,
	register: RegisterFn<N>,
	active: Option<[DisposableHandle; N]>,
}

impl<const N: usize> fmt::Debug for FeatureGate<N> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FeatureGate")
			.field("name", &self.name)
			.field("held", &self.held_count())
			.finish_non_exhaustive()
	}
}

impl<const N: usize> FeatureGate<N> {
	/// Creates a disabled gate. `register` produces the feature's `N` registrations.
	pub fn new(name: &'static str, register: impl Fn() -> [DisposableHandle; N] + Send + Sync + 'static) -> Self {
		Self {
			name,
			register: Arc::new(register),
			active: None,
		}
	}

	/// Feature name.
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Whether the feature's registrations are currently held.
	pub fn is_enabled(&self) -> bool {
		self.active.is_some()
	}

	/// Number of handles held: `0` or `N`.
	pub fn held_count(&self) -> usize {
		if self.active.is_some() { N } else { 0 }
	}

	/// Moves the gate to the requested state.
	pub fn set_enabled(&mut self, enabled: bool) -> GateTransition {
		match (self.active.is_some(), enabled) {
			(false, true) => {
				self.active = Some((self.register)());
				tracing::debug!(feature = self.name, handles = N, "feature.gate.enabled");
				GateTransition::Registered
			}
			(true, false) => {
				if let Some(handles) = self.active.take() {
					for handle in handles.iter().rev() {
						handle.dispose();
					}
				}
				tracing::debug!(feature = self.name, "feature.gate.disabled");
				GateTransition::Disposed
			}
			_ => GateTransition::Unchanged,
		}
	}
}

/// A gate shared between the config router and the activation teardown.
pub type SharedFeatureGate<const N: usize> = Arc<Mutex<FeatureGate<N>>>;

/// [`FeatureGate::set_enabled`] for a shared gate, registering and releasing outside its lock.
///
/// Registrars and release actions may therefore read the gate. The gate only ever stores a
/// complete handle set: if another caller enabled it meanwhile, the surplus set is released.
pub fn set_enabled<const N: usize>(gate: &SharedFeatureGate<N>, enabled: bool) -> GateTransition {
	if !enabled {
		let (name, released) = {
			let mut gate = gate.lock();
			(gate.name, gate.active.take())
		};
		let Some(handles) = released else {
			return GateTransition::Unchanged;
		};
		for handle in handles.iter().rev() {
			handle.dispose();
		}
		tracing::debug!(feature = name, "feature.gate.disabled");
		return GateTransition::Disposed;
	}

	let (name, register) = {
		let gate = gate.lock();
		if gate.active.is_some() {
			return GateTransition::Unchanged;
		}
		(gate.name, gate.register.clone())
	};
	let handles = register();
	let surplus = {
		let mut gate = gate.lock();
		if gate.active.is_some() {
			Some(handles)
		} else {
			gate.active = Some(handles);
			None
		}
	};
	match surplus {
		Some(handles) => {
			for handle in handles.iter().rev() {
				handle.dispose();
			}
			GateTransition::Unchanged
		}
		None => {
			tracing::debug!(feature = name, handles = N, "feature.gate.enabled");
			GateTransition::Registered
		}
	}
}

/// Wraps a gate for sharing.
pub fn shared<const N: usize>(gate: FeatureGate<N>) -> SharedFeatureGate<N> {
	Arc::new(Mutex::new(gate))
}

/// Handle that disables the gate when disposed, releasing whatever it holds at that moment.
pub fn teardown_handle<const N: usize>(gate: &SharedFeatureGate<N>) -> DisposableHandle {
	let gate = gate.clone();
	let name = gate.lock().name();
	DisposableHandle::new(format!("feature:{name}"), move || {
		set_enabled(&gate, false);
	})
}
