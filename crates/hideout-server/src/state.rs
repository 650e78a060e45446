//! Shared application state.

use std::sync::Arc;

use hideout_core::{EngineError, HideoutEngine};

use crate::config::Config;
use crate::terrain::build_terrain_intel;

pub struct AppState {
    pub config: Config,
    pub engine: Arc<HideoutEngine>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, EngineError> {
        let engine = HideoutEngine::new(config.engine_config())?
            .with_terrain(Arc::new(build_terrain_intel(&config)));
        Ok(Self {
            config,
            engine: Arc::new(engine),
        })
    }

    pub fn with_engine(config: Config, engine: HideoutEngine) -> Self {
        Self {
            config,
            engine: Arc::new(engine),
        }
    }
}
