pub mod command;
pub mod routes;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::CollaboratorError;

pub use command::CommandCorrelationEngine;

pub type Correlations = BTreeMap<String, serde_json::Value>;

#[async_trait]
pub trait CorrelationEngine: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    /// Returns the correlation mapping and a summary of the tracked history
    /// stored at `data_source`.
    async fn analyze(&self, data_source: &Path)
        -> Result<(Correlations, String), CollaboratorError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableCorrelationEngine;

#[async_trait]
impl CorrelationEngine for UnavailableCorrelationEngine {
    fn is_available(&self) -> bool {
        false
    }

    async fn analyze(
        &self,
        _data_source: &Path,
    ) -> Result<(Correlations, String), CollaboratorError> {
        Err(CollaboratorError::Unavailable)
    }
}
