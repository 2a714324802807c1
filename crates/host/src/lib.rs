//! Session and document-synchronization coordinator for the qside analysis engine.
//!
//! # Purpose
//!
//! - Bootstrap exactly one engine session per activation.
//! - Keep the engine's view of every open document consistent with the editor's.
//! - Register and unregister optional capabilities as configuration changes.
//! - Release every resource deterministically on deactivation.
//!
//! The engine itself is an external collaborator reached only through [`qside_engine`].
//!
//! # Mental model
//!
//! - [`activation::activate`] is the integration root. It builds every component below around a
//!   single [`qside_engine::SessionHandle`] and hands back an [`activation::Activation`].
//! - [`bootstrap::SessionBootstrapper`] reads the engine module, instantiates it and opens the
//!   session, then applies the initial target profile.
//! - [`sync::DocumentSync`] forwards open/change/close as full-text engine calls for trackable
//!   documents and replays documents that were open before activation.
//! - [`feature::FeatureGate`] holds an optional capability's registrations as an all-or-nothing set.
//! - [`config::ConfigChangeRouter`] maps one configuration change to exactly one reaction.
//! - [`disposable::Disposables`] owns every handle and releases them in reverse order.
//!
//! # Key types
//!
//! | Type | Meaning | Constraints |
//! |---|---|---|
//! | [`qside_engine::SessionHandle`] | The running engine instance | Disposed exactly once, last |
//! | [`document::TextDocument`] | Editor document at event time | Never cached locally |
//! | [`feature::FeatureGate`] | Optional capability switch | Holds `0` or `N` handles |
//! | [`config::ConfigSnapshot`] | Recognized options | Re-read on every reaction |
//! | [`disposable::DisposableHandle`] | Releasable registration | Second disposal is a no-op |
//!
//! # Invariants
//!
//! - Non-trackable documents (wrong language, notebook cells) never reach the engine.
//! - Startup replay happens once, before any live event is handled, in enumeration order.
//! - Engine calls for one document complete in the order they were issued.
//! - A configuration change triggers at most one reaction, profile before formatting.
//! - Nothing stays registered after deactivation or after a failed activation.
//!
//! # Failure modes
//!
//! - Unreadable or malformed engine module: [`bootstrap::InitializationError`], fatal, no retry.
//! - Unrecognized target profile: logged as a warning and forwarded unchanged.
//! - Engine call failure while handling an event: returned to the host's dispatcher, no retry.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

pub mod activation;
pub mod bootstrap;
pub mod config;
pub mod diagnostics;
pub mod disposable;
pub mod document;
pub mod event;
pub mod feature;
mod host;
pub mod provider;
pub mod sync;
pub mod test_helpers;

pub use activation::{Activation, ActivationOptions, Collaborators, activate};
pub use bootstrap::{InitializationError, SessionBootstrapper};
pub use config::{ConfigChangeEvent, ConfigError, ConfigSnapshot, ConfigurationSource, MemoryConfig, TomlConfig};
pub use disposable::{DisposableHandle, Disposables};
pub use document::{DocumentFilter, TextDocument};
pub use event::{EventBus, EventKind, HostEvent, Listener};
pub use host::EditorHost;
pub use provider::{ProviderBinding, ProviderKind};
pub use sync::DocumentSync;

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// Activation could not bring the engine up.
	#[error(transparent)]
	Initialization(#[from] InitializationError),
	/// An engine call failed.
	#[error("engine call failed: {0}")]
	Engine(#[from] qside_engine::Error),
	/// The settings file could not be loaded.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
