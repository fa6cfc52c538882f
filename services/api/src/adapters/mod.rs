pub mod memory_store;
pub mod submission_log;

pub use memory_store::InMemoryFormStore;
pub use submission_log::SubmissionLog;
