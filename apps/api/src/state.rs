use std::sync::Arc;

use crate::brochure::generator::BrochureGenerator;
use crate::brochure::jobs::JobStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<BrochureGenerator>,
    pub jobs: JobStore,
}
