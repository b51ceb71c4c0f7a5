//! studylog certificate server library
//!
//! - SQLite storage for users, study plans, sessions and certificates
//! - Bearer token validation (JWT)
//! - Certificate issuance, PDF rendering, verification and revocation
//! - HTTP API and the public verification page

pub mod auth;
pub mod certificates;
pub mod http;
pub mod storage;
