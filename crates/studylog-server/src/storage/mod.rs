//! SQLite storage for the studylog server.
//!
//! Provides read access to the platform's users, study plans and study
//! sessions, and the append-only certificate store.

mod db;
mod models;
mod queries;
mod queries_certs;


pub use db::{DatabaseError, StudyDatabase};
pub use models::*;
pub use queries::{NewStudyPlan, NewStudySession, NewUser};
pub use queries_certs::{CertificateInsert, NewCertificate};
