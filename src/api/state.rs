//! Shared application state.

use std::path::PathBuf;
use std::sync::Arc;

use crate::profiles::{HeuristicParser, ProfileService};
use crate::runtime::ModelRuntime;
use crate::store::{HistoryStore, ProfileStore};

/// CORS configuration carried into router construction.
#[derive(Debug, Clone)]
pub struct CorsState {
    /// Origins allowed to call the API. Empty in dev mode falls back
    /// to common localhost origins.
    pub allowed_origins: Vec<String>,
    pub dev_mode: bool,
}

impl Default for CorsState {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            dev_mode: true,
        }
    }
}

/// Everything handlers need, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<dyn ModelRuntime>,
    pub history: Arc<HistoryStore>,
    pub profiles: Arc<ProfileService>,
    pub cors: CorsState,
}

impl AppState {
    pub fn new(runtime: Arc<dyn ModelRuntime>, data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let history = Arc::new(HistoryStore::new(&data_dir));
        let profile_store = Arc::new(ProfileStore::new(&data_dir));
        let profiles = Arc::new(ProfileService::new(
            profile_store,
            Arc::clone(&history),
            Arc::clone(&runtime),
            Arc::new(HeuristicParser),
        ));

        Self {
            runtime,
            history,
            profiles,
            cors: CorsState::default(),
        }
    }

    pub fn with_cors(mut self, cors: CorsState) -> Self {
        self.cors = cors;
        self
    }
}
