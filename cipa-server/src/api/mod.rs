//! HTTP API handlers for cipa-server
//!
//! One module per resource; each exposes a `*_routes()` function merged by
//! [`crate::build_router`].

pub mod branches;
pub mod calendar;
pub mod candidates;
pub mod certificates;
pub mod documents;
pub mod health;
pub mod meetings;
pub mod members;
pub mod nr5;
pub mod proxy;
pub mod signatures;
pub mod signing;
pub mod terms;

pub use branches::branch_routes;
pub use calendar::calendar_routes;
pub use candidates::candidate_routes;
pub use certificates::certificate_routes;
pub use documents::document_routes;
pub use health::health_routes;
pub use meetings::meeting_routes;
pub use members::member_routes;
pub use nr5::nr5_routes;
pub use proxy::proxy_routes;
pub use signatures::signature_routes;
pub use signing::signing_routes;
pub use terms::term_routes;
