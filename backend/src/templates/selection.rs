use std::sync::Arc;
use tokio::sync::RwLock;

/// The name of the template new contracts are rendered from.
///
/// Clones share the same value: the pipeline reads it for every submission and
/// the admin API replaces it under the write lock.
#[derive(Clone, Debug)]
pub struct TemplateSelection {
    current: Arc<RwLock<String>>,
}

impl TemplateSelection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            current: Arc::new(RwLock::new(name.into())),
        }
    }

    pub async fn current(&self) -> String {
        self.current.read().await.clone()
    }

    /// Replaces the selection and returns the previous name.
    pub async fn select(&self, name: impl Into<String>) -> String {
        let mut current = self.current.write().await;
        std::mem::replace(&mut *current, name.into())
    }
}
