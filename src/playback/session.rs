use std::sync::Arc;

use serde::Serialize;

use crate::catalog::models::Show;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    None,
    Local,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    Paused,
}

/// What the coordinator currently has loaded.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlaybackSession {
    #[default]
    Idle,
    Local {
        show: Arc<Show>,
        index: usize,
        status: PlaybackStatus,
    },
    External {
        show: Arc<Show>,
        status: PlaybackStatus,
    },
}

impl PlaybackSession {
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Idle => SourceKind::None,
            Self::Local { .. } => SourceKind::Local,
            Self::External { .. } => SourceKind::External,
        }
    }

    pub fn show(&self) -> Option<&Arc<Show>> {
        match self {
            Self::Idle => None,
            Self::Local { show, .. } | Self::External { show, .. } => Some(show),
        }
    }

    /// `Stopped` when idle.
    pub fn status(&self) -> PlaybackStatus {
        match self {
            Self::Idle => PlaybackStatus::Stopped,
            Self::Local { status, .. } | Self::External { status, .. } => *status,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            source: self.kind(),
            show_id: self.show().map(|s| s.identifier.clone()),
            index: match self {
                Self::Local { index, .. } => Some(*index),
                _ => None,
            },
            track_count: self.show().map_or(0, |s| s.tracks.len()),
            status: self.status(),
        }
    }
}

/// Owned, comparable view of a session for observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackSnapshot {
    pub source: SourceKind,
    pub show_id: Option<String>,
    /// Track index; only set for local playback.
    pub index: Option<usize>,
    pub track_count: usize,
    pub status: PlaybackStatus,
}

/// The command that produced a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    LoadLocal,
    LoadExternal,
    Play,
    Pause,
    Stop,
    Next,
    Previous,
    SelectTrack,
}

impl Transition {
    pub fn is_load(&self) -> bool {
        matches!(self, Self::LoadLocal | Self::LoadExternal)
    }
}

/// Broadcast after every state-changing transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackEvent {
    pub cause: Transition,
    pub snapshot: PlaybackSnapshot,
}
