use serde::{Deserialize, Serialize};
use tracing::info;

/// Camera / response collaborator commanded by a correct cut.
pub trait ResponseSubsystem {
    /// Switch every camera feed to static and stop tracking.
    fn disable_to_static(&mut self, reason: &str);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    Live,
    Static,
}

/// In-memory camera feed state. Presentation layers read `mode()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraFeeds {
    mode: FeedMode,
}

impl Default for CameraFeeds {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraFeeds {
    pub fn new() -> Self {
        Self {
            mode: FeedMode::Live,
        }
    }

    pub fn mode(&self) -> FeedMode {
        self.mode
    }

    pub fn is_static(&self) -> bool {
        self.mode == FeedMode::Static
    }

    /// Back to live feeds (debug / scene restart).
    pub fn enable_live(&mut self) {
        if self.mode != FeedMode::Live {
            info!("cameras/live");
        }
        self.mode = FeedMode::Live;
    }
}

impl ResponseSubsystem for CameraFeeds {
    fn disable_to_static(&mut self, reason: &str) {
        if self.mode != FeedMode::Static {
            info!(reason, "cameras/static");
        }
        self.mode = FeedMode::Static;
    }
}
