use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::models::{Show, Track};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("source is not ready")]
    NotReady,
    #[error("source failed: {0}")]
    Failed(String),
}

/// The local audio engine. Owns decoding and output; the coordinator only drives it.
#[async_trait]
pub trait LocalPlayer: Send + Sync {
    /// Start `track` from the beginning, replacing whatever the engine was playing.
    async fn play(&self, show: &Show, track: &Track) -> Result<(), SourceError>;

    async fn pause(&self) -> Result<(), SourceError>;

    async fn resume(&self) -> Result<(), SourceError>;

    /// Stop and release the output device. Must not return before the engine is silent.
    async fn stop(&self) -> Result<(), SourceError>;

    async fn seek(&self, position: Duration) -> Result<(), SourceError>;
}

/// An externally hosted video surface (embedded player).
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn start(&self, reference: &str) -> Result<(), SourceError>;

    /// Stop and tear down the surface. Must not return before playback has ended.
    async fn stop(&self) -> Result<(), SourceError>;

    async fn seek(&self, position: Duration) -> Result<(), SourceError>;

    fn is_ready(&self) -> bool;

    /// Surfaces without a native pause stop instead.
    async fn pause(&self) -> Result<(), SourceError> {
        self.stop().await
    }

    async fn resume(&self, reference: &str) -> Result<(), SourceError> {
        self.start(reference).await
    }
}
