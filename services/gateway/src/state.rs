use std::sync::Arc;

use reconciler::Repository;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<Repository>,
}

impl AppState {
    pub fn new(repository: Arc<Repository>) -> Self {
        Self { repository }
    }
}
