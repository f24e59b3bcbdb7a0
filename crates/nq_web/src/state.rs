use std::sync::Arc;
use nq_pipeline::QueryProcessor;

pub struct AppState {
    pub processor: Arc<QueryProcessor>,
}

impl AppState {
    pub fn new(processor: Arc<QueryProcessor>) -> Self {
        Self { processor }
    }
}
