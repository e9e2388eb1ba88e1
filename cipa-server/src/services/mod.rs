//! Services used by the HTTP handlers
//!
//! - [`approval`]: registration and PENDING_SIGNATURE → APPROVED with exactly-once notification
//! - [`notifier`]: approval confirmation dispatch
//! - [`signature_store`]: content-addressed signature artifacts
//! - [`signature_poller`]: cancellable status polling for remote hand-offs
//! - [`image_proxy`]: remote image fetch for logos and the proxy endpoint

pub mod approval;
pub mod image_proxy;
pub mod notifier;
pub mod signature_poller;
pub mod signature_store;

pub use approval::SignatureInput;
pub use image_proxy::{ImageProxy, ProxyError};
pub use notifier::{LogNotifier, Notifier};
pub use signature_poller::{
    spawn_handoff_watch, CandidateStatusSource, DbStatusSource, PollOutcome, PollerRegistry,
    SignaturePoller,
};
pub use signature_store::{SignatureStore, StoredSignature};
