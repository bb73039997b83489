use std::sync::Arc;

use crate::repo::{ItemRepo, MerchantRepo};

#[derive(Clone)]
pub struct AppState {
    pub merchants: Arc<dyn MerchantRepo>,
    pub items: Arc<dyn ItemRepo>,
}

impl AppState {
    pub fn new<R>(repo: R) -> Self
    where
        R: MerchantRepo + ItemRepo + 'static,
    {
        let repo = Arc::new(repo);
        Self {
            merchants: repo.clone(),
            items: repo,
        }
    }
}
