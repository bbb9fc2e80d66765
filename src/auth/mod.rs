//! Session consumption. Issuance lives with the external auth service.

pub mod session;

pub use session::{SessionClaims, SessionError, SessionVerifier};
