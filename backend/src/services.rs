use std::sync::Arc;

use crate::analysis::{CommandCorrelationEngine, CorrelationEngine, UnavailableCorrelationEngine};
use crate::config::{AppConfig, EngineConfig, ProfileStoreConfig};
use crate::detection::{CommandDetectionEngine, DetectionEngine, UnavailableDetectionEngine};
use crate::profile::{FileProfileStore, ProfileStore, UnavailableProfileStore};

/// The collaborators the gateway delegates to, chosen once at startup.
#[derive(Clone)]
pub struct Services {
    pub profile_store: Arc<dyn ProfileStore>,
    pub correlation: Arc<dyn CorrelationEngine>,
    pub detection: Arc<dyn DetectionEngine>,
}

impl Services {
    pub fn from_config(config: &AppConfig) -> Self {
        let profile_store: Arc<dyn ProfileStore> = match &config.profile_store {
            ProfileStoreConfig::File { path } => Arc::new(FileProfileStore::new(path)),
            ProfileStoreConfig::Unavailable => {
                log::warn!("Profile store not configured, profile endpoints will answer 501");
                Arc::new(UnavailableProfileStore)
            }
        };

        let correlation: Arc<dyn CorrelationEngine> = match &config.correlation {
            EngineConfig::Command { program, args } => {
                Arc::new(CommandCorrelationEngine::new(program, args.clone()))
            }
            EngineConfig::Unavailable => {
                log::warn!("Correlation engine not configured, /analyze/ will answer 501");
                Arc::new(UnavailableCorrelationEngine)
            }
        };

        let detection: Arc<dyn DetectionEngine> = match &config.detection {
            EngineConfig::Command { program, args } => {
                Arc::new(CommandDetectionEngine::new(program, args.clone()))
            }
            EngineConfig::Unavailable => {
                log::warn!("Detection engine not configured, /detect will answer 501");
                Arc::new(UnavailableDetectionEngine)
            }
        };

        Self {
            profile_store,
            correlation,
            detection,
        }
    }
}
