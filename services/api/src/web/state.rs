//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use recruitment_forms_core::{ApplicationDirectory, FormPublishingService, SubmissionService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub forms: Arc<dyn FormPublishingService>,
    pub submissions: Arc<dyn SubmissionService>,
    pub applications: Arc<dyn ApplicationDirectory>,
    pub config: Arc<Config>,
}
