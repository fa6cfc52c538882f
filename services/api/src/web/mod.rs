pub mod applications;
pub mod apply;
pub mod campaigns;
pub mod protocol;
pub mod rest;
pub mod router;
pub mod state;

// Re-export the router builder so the binary and tests share one wiring.
pub use router::build_router;
pub use state::AppState;
