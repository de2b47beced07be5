mod prompts;

use std::sync::Arc;

pub use prompts::{PromptService, PromptServiceError};

use crate::db::DbPool;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub prompts: PromptService,
}

impl Services {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self {
            prompts: PromptService::new(db),
        }
    }
}
