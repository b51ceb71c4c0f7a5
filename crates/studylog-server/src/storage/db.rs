//! SQLite database for the studylog server.

pub use studylog_core::db::DatabaseError;

studylog_core::define_database!(StudyDatabase, "Study database migrations complete");
