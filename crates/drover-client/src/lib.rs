//! Blocking HTTP access to the logistics API.
//!
//! Wraps `reqwest::blocking` behind the [`ApiTransport`] trait so workflow
//! code and tests can swap the wire for a stub, and layers the two-step
//! authentication exchange (login, then workspace login) plus per-actor
//! session bookkeeping on top of it.

pub mod auth;
pub mod routes;
pub mod session;
pub mod transport;

pub use auth::{AuthClient, AuthHandshake, Credentials};
pub use routes::RouteTable;
pub use session::{Actor, Session, SessionError, SessionManager};
pub use transport::{ApiCall, ApiTransport, CallOutcome, HttpClient, TransportError};
