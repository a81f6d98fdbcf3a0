pub mod session;
pub mod source;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, Mutex};

use crate::catalog::models::{Show, Track};
use crate::store::ShowStore;

pub use session::{
    PlaybackEvent, PlaybackSession, PlaybackSnapshot, PlaybackStatus, SourceKind, Transition,
};
pub use source::{LocalPlayer, SourceError, VideoSource};

/// Buffered events per subscriber before the slowest one starts lagging.
const EVENT_CAPACITY: usize = 64;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SourceKind,
    },
    #[error("track index {index} out of range (show has {len} tracks)")]
    OutOfRange { index: isize, len: usize },
    #[error("video source is not ready")]
    SourceNotReady,
    #[error(transparent)]
    Source(#[from] SourceError),
}

pub type Result<T> = std::result::Result<T, PlaybackError>;

fn track_at(show: &Show, index: usize) -> Result<&Track> {
    show.tracks.get(index).ok_or(PlaybackError::OutOfRange {
        index: index as isize,
        len: show.tracks.len(),
    })
}

/// Owns "now playing" across the local track sequence and the external video.
///
/// Every command takes the session lock for its whole duration, including the
/// awaited teardown of the previous source, so at most one source is active
/// and overlapping commands run one after another.
pub struct PlaybackCoordinator {
    local: Arc<dyn LocalPlayer>,
    video: Arc<dyn VideoSource>,
    history: Option<Arc<dyn ShowStore>>,
    session: Mutex<PlaybackSession>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl std::fmt::Debug for PlaybackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackCoordinator")
            .field("session", &self.session)
            .field("history", &self.history.is_some())
            .finish()
    }
}

impl PlaybackCoordinator {
    pub fn new(local: Arc<dyn LocalPlayer>, video: Arc<dyn VideoSource>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            local,
            video,
            history: None,
            session: Mutex::new(PlaybackSession::Idle),
            events,
        }
    }

    /// Record every successfully loaded show in `history`.
    pub fn with_history(mut self, history: Arc<dyn ShowStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    // --- Queries ---

    pub async fn session(&self) -> PlaybackSession {
        self.session.lock().await.clone()
    }

    pub async fn current_position(&self) -> PlaybackSnapshot {
        self.session.lock().await.snapshot()
    }

    /// True when local track `index` is the one currently playing.
    pub async fn is_playing(&self, index: usize) -> bool {
        matches!(
            &*self.session.lock().await,
            PlaybackSession::Local { index: i, status: PlaybackStatus::Playing, .. } if *i == index
        )
    }

    // --- Loading ---

    /// Make `show`'s track list the active source, starting at `start_index`.
    pub async fn load_local(&self, show: Arc<Show>, start_index: usize) -> Result<()> {
        let mut session = self.session.lock().await;
        let track = track_at(&show, start_index)?;

        let was_active = !session.is_idle();
        self.teardown(&session).await?;
        *session = PlaybackSession::Idle;

        if let Err(e) = self.local.play(&show, track).await {
            log::warn!("Local playback of {} failed: {e}", show.identifier);
            if was_active {
                self.emit(&session, Transition::LoadLocal);
            }
            return Err(e.into());
        }

        log::info!("Playing {} track {} (local)", show.identifier, start_index + 1);
        self.record_history(&show.identifier);
        let next = PlaybackSession::Local {
            show,
            index: start_index,
            status: PlaybackStatus::Playing,
        };
        self.commit(&mut session, next, Transition::LoadLocal);
        Ok(())
    }

    /// Make `show`'s video the active source.
    pub async fn load_external(&self, show: Arc<Show>) -> Result<()> {
        let mut session = self.session.lock().await;
        if !self.video.is_ready() {
            return Err(PlaybackError::SourceNotReady);
        }

        let was_active = !session.is_idle();
        self.teardown(&session).await?;
        *session = PlaybackSession::Idle;

        if let Err(e) = self.video.start(show.video_reference()).await {
            log::warn!("Video playback of {} failed: {e}", show.identifier);
            if was_active {
                self.emit(&session, Transition::LoadExternal);
            }
            return Err(e.into());
        }

        log::info!("Playing {} (video {})", show.identifier, show.video_reference());
        self.record_history(&show.identifier);
        let next = PlaybackSession::External {
            show,
            status: PlaybackStatus::Playing,
        };
        self.commit(&mut session, next, Transition::LoadExternal);
        Ok(())
    }

    // --- Transport ---

    pub async fn play(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        let next = match &*session {
            PlaybackSession::Idle => {
                return Err(PlaybackError::InvalidState {
                    operation: "play",
                    state: SourceKind::None,
                });
            }
            PlaybackSession::Local { status: PlaybackStatus::Playing, .. }
            | PlaybackSession::External { status: PlaybackStatus::Playing, .. } => return Ok(()),
            PlaybackSession::Local { show, index, status } => {
                match status {
                    PlaybackStatus::Paused => self.local.resume().await?,
                    _ => self.local.play(show, track_at(show, *index)?).await?,
                }
                PlaybackSession::Local {
                    show: Arc::clone(show),
                    index: *index,
                    status: PlaybackStatus::Playing,
                }
            }
            PlaybackSession::External { show, .. } => {
                self.video.resume(show.video_reference()).await?;
                PlaybackSession::External {
                    show: Arc::clone(show),
                    status: PlaybackStatus::Playing,
                }
            }
        };
        self.commit(&mut session, next, Transition::Play);
        Ok(())
    }

    pub async fn pause(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        let next = match &*session {
            PlaybackSession::Idle => {
                return Err(PlaybackError::InvalidState {
                    operation: "pause",
                    state: SourceKind::None,
                });
            }
            PlaybackSession::Local { show, index, status: PlaybackStatus::Playing } => {
                self.local.pause().await?;
                PlaybackSession::Local {
                    show: Arc::clone(show),
                    index: *index,
                    status: PlaybackStatus::Paused,
                }
            }
            PlaybackSession::External { show, status: PlaybackStatus::Playing } => {
                self.video.pause().await?;
                PlaybackSession::External {
                    show: Arc::clone(show),
                    status: PlaybackStatus::Paused,
                }
            }
            // Already paused or stopped
            _ => return Ok(()),
        };
        self.commit(&mut session, next, Transition::Pause);
        Ok(())
    }

    /// Release the active source and return to idle.
    pub async fn stop(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        if session.is_idle() {
            return Ok(());
        }
        self.teardown(&session).await?;
        log::info!("Playback stopped");
        self.commit(&mut session, PlaybackSession::Idle, Transition::Stop);
        Ok(())
    }

    /// Advance one track. Past the last track playback stops and the index stays put.
    pub async fn next(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        let PlaybackSession::Local { show, index, status } = &*session else {
            return Err(self.local_only("skip forward", &session));
        };

        let next = if index + 1 < show.tracks.len() {
            self.local.play(show, track_at(show, index + 1)?).await?;
            PlaybackSession::Local {
                show: Arc::clone(show),
                index: index + 1,
                status: PlaybackStatus::Playing,
            }
        } else if *status == PlaybackStatus::Stopped {
            return Ok(());
        } else {
            self.local.stop().await?;
            log::debug!("End of {}", show.identifier);
            PlaybackSession::Local {
                show: Arc::clone(show),
                index: *index,
                status: PlaybackStatus::Stopped,
            }
        };
        self.commit(&mut session, next, Transition::Next);
        Ok(())
    }

    /// Go back one track; a no-op on the first track.
    pub async fn previous(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        let PlaybackSession::Local { show, index, .. } = &*session else {
            return Err(self.local_only("skip back", &session));
        };
        if *index == 0 {
            return Ok(());
        }

        self.local.play(show, track_at(show, index - 1)?).await?;
        let next = PlaybackSession::Local {
            show: Arc::clone(show),
            index: index - 1,
            status: PlaybackStatus::Playing,
        };
        self.commit(&mut session, next, Transition::Previous);
        Ok(())
    }

    /// Jump to track `index` (0-based) of the loaded show.
    pub async fn select_track(&self, index: isize) -> Result<()> {
        let mut session = self.session.lock().await;
        let PlaybackSession::Local { show, .. } = &*session else {
            return Err(self.local_only("select a track", &session));
        };
        let len = show.tracks.len();
        let target = usize::try_from(index)
            .ok()
            .filter(|i| *i < len)
            .ok_or(PlaybackError::OutOfRange { index, len })?;

        self.local.play(show, track_at(show, target)?).await?;
        let next = PlaybackSession::Local {
            show: Arc::clone(show),
            index: target,
            status: PlaybackStatus::Playing,
        };
        self.commit(&mut session, next, Transition::SelectTrack);
        Ok(())
    }

    /// Seek within the current track or video. Does not change the session.
    pub async fn seek(&self, position: Duration) -> Result<()> {
        let session = self.session.lock().await;
        match &*session {
            PlaybackSession::Idle => Err(PlaybackError::InvalidState {
                operation: "seek",
                state: SourceKind::None,
            }),
            PlaybackSession::Local { .. } => Ok(self.local.seek(position).await?),
            PlaybackSession::External { .. } => Ok(self.video.seek(position).await?),
        }
    }

    // --- Internals ---

    /// Stop whichever source `session` holds. Awaited so the source is released
    /// before anything else starts.
    async fn teardown(&self, session: &PlaybackSession) -> Result<()> {
        match session {
            PlaybackSession::Idle => {}
            PlaybackSession::Local { show, .. } => {
                log::debug!("Stopping local playback of {}", show.identifier);
                self.local.stop().await?;
            }
            PlaybackSession::External { show, .. } => {
                log::debug!("Stopping video playback of {}", show.identifier);
                self.video.stop().await?;
            }
        }
        Ok(())
    }

    fn local_only(&self, operation: &'static str, session: &PlaybackSession) -> PlaybackError {
        PlaybackError::InvalidState {
            operation,
            state: session.kind(),
        }
    }

    /// Install `next`. Loads always notify; other transitions only when the snapshot moved.
    fn commit(&self, session: &mut PlaybackSession, next: PlaybackSession, cause: Transition) {
        let changed = session.snapshot() != next.snapshot();
        *session = next;
        if changed || cause.is_load() {
            self.emit(session, cause);
        }
    }

    fn emit(&self, session: &PlaybackSession, cause: Transition) {
        let event = PlaybackEvent {
            cause,
            snapshot: session.snapshot(),
        };
        log::debug!("{:?} -> {:?}", cause, event.snapshot.status);
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn record_history(&self, identifier: &str) {
        if let Some(history) = &self.history {
            if let Err(e) = history.add(identifier) {
                log::warn!("Failed to record {identifier} in history: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::models::{Location, Recording};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::broadcast::error::TryRecvError;

    /// Shared record of what the fake sources were asked to do.
    #[derive(Default)]
    struct Recorder {
        log: StdMutex<Vec<String>>,
        local_on: AtomicBool,
        video_on: AtomicBool,
        overlap: AtomicBool,
    }

    impl Recorder {
        fn record(&self, entry: String) {
            self.log.lock().unwrap().push(entry);
        }

        fn entries(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }

        fn turn_on(&self, mine: &AtomicBool, other: &AtomicBool) {
            mine.store(true, Ordering::SeqCst);
            if other.load(Ordering::SeqCst) {
                self.overlap.store(true, Ordering::SeqCst);
            }
        }
    }

    struct FakeLocal {
        recorder: Arc<Recorder>,
        fail_play: AtomicBool,
    }

    #[async_trait]
    impl LocalPlayer for FakeLocal {
        async fn play(&self, show: &Show, track: &Track) -> std::result::Result<(), SourceError> {
            tokio::task::yield_now().await;
            if self.fail_play.load(Ordering::SeqCst) {
                return Err(SourceError::Failed("no output device".into()));
            }
            self.recorder.turn_on(&self.recorder.local_on, &self.recorder.video_on);
            self.recorder
                .record(format!("local.play {} {}", show.identifier, track.position));
            Ok(())
        }

        async fn pause(&self) -> std::result::Result<(), SourceError> {
            self.recorder.record("local.pause".into());
            Ok(())
        }

        async fn resume(&self) -> std::result::Result<(), SourceError> {
            self.recorder.record("local.resume".into());
            Ok(())
        }

        async fn stop(&self) -> std::result::Result<(), SourceError> {
            // Slow teardown gives overlapping commands a chance to interleave
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            self.recorder.local_on.store(false, Ordering::SeqCst);
            self.recorder.record("local.stop".into());
            Ok(())
        }

        async fn seek(&self, position: Duration) -> std::result::Result<(), SourceError> {
            self.recorder.record(format!("local.seek {}", position.as_secs()));
            Ok(())
        }
    }

    struct FakeVideo {
        recorder: Arc<Recorder>,
        ready: AtomicBool,
    }

    #[async_trait]
    impl VideoSource for FakeVideo {
        async fn start(&self, reference: &str) -> std::result::Result<(), SourceError> {
            tokio::task::yield_now().await;
            self.recorder.turn_on(&self.recorder.video_on, &self.recorder.local_on);
            self.recorder.record(format!("video.start {reference}"));
            Ok(())
        }

        async fn stop(&self) -> std::result::Result<(), SourceError> {
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            self.recorder.video_on.store(false, Ordering::SeqCst);
            self.recorder.record("video.stop".into());
            Ok(())
        }

        async fn seek(&self, position: Duration) -> std::result::Result<(), SourceError> {
            self.recorder.record(format!("video.seek {}", position.as_secs()));
            Ok(())
        }

        fn is_ready(&self) -> bool {
            self.ready.load(Ordering::SeqCst)
        }
    }

    struct Rig {
        coordinator: PlaybackCoordinator,
        recorder: Arc<Recorder>,
        local: Arc<FakeLocal>,
        video: Arc<FakeVideo>,
        events: broadcast::Receiver<PlaybackEvent>,
    }

    impl Rig {
        fn new() -> Self {
            let recorder = Arc::new(Recorder::default());
            let local = Arc::new(FakeLocal {
                recorder: Arc::clone(&recorder),
                fail_play: AtomicBool::new(false),
            });
            let video = Arc::new(FakeVideo {
                recorder: Arc::clone(&recorder),
                ready: AtomicBool::new(true),
            });
            let coordinator = PlaybackCoordinator::new(local.clone(), video.clone());
            let events = coordinator.subscribe();
            Self {
                coordinator,
                recorder,
                local,
                video,
                events,
            }
        }

        fn drain(&mut self) -> Vec<PlaybackEvent> {
            let mut out = Vec::new();
            loop {
                match self.events.try_recv() {
                    Ok(e) => out.push(e),
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                    Err(TryRecvError::Lagged(_)) => continue,
                }
            }
            out
        }
    }

    fn show(identifier: &str, tracks: usize) -> Arc<Show> {
        Arc::new(Show {
            identifier: identifier.to_string(),
            score: 9.0,
            location: Location::default(),
            recording: Recording::default(),
            title: None,
            description: None,
            lineage: None,
            setlist: None,
            video_id: None,
            tracks: (1..=tracks)
                .map(|i| Track {
                    title: format!("Song {i}"),
                    filename: format!("{identifier}t{i:02}.flac"),
                    duration: "5:00".to_string(),
                    position: i,
                })
                .collect(),
        })
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let rig = Rig::new();
        assert_eq!(rig.coordinator.session().await, PlaybackSession::Idle);
        let pos = rig.coordinator.current_position().await;
        assert_eq!(pos.source, SourceKind::None);
        assert_eq!(pos.status, PlaybackStatus::Stopped);
    }

    #[tokio::test]
    async fn test_transport_invalid_when_idle() {
        let mut rig = Rig::new();
        let c = &rig.coordinator;
        assert!(matches!(c.play().await, Err(PlaybackError::InvalidState { operation: "play", .. })));
        assert!(matches!(c.pause().await, Err(PlaybackError::InvalidState { .. })));
        assert!(matches!(c.next().await, Err(PlaybackError::InvalidState { .. })));
        assert!(matches!(c.previous().await, Err(PlaybackError::InvalidState { .. })));
        assert!(matches!(c.select_track(0).await, Err(PlaybackError::InvalidState { .. })));
        assert!(matches!(c.seek(Duration::from_secs(5)).await, Err(PlaybackError::InvalidState { .. })));
        c.stop().await.unwrap();
        assert!(rig.drain().is_empty());
        assert!(rig.recorder.entries().is_empty());
    }

    #[tokio::test]
    async fn test_load_local_twice_replaces_session() {
        let mut rig = Rig::new();
        let a = show("gd77-05-08", 3);
        let b = show("gd72-08-27", 2);

        rig.coordinator.load_local(a, 0).await.unwrap();
        rig.coordinator.load_local(Arc::clone(&b), 0).await.unwrap();

        match rig.coordinator.session().await {
            PlaybackSession::Local { show, index, status } => {
                assert!(Arc::ptr_eq(&show, &b));
                assert_eq!(index, 0);
                assert_eq!(status, PlaybackStatus::Playing);
            }
            other => panic!("expected local session, got {other:?}"),
        }

        let events = rig.drain();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.cause == Transition::LoadLocal));
        assert_eq!(events[0].snapshot.show_id.as_deref(), Some("gd77-05-08"));
        assert_eq!(events[1].snapshot.show_id.as_deref(), Some("gd72-08-27"));

        assert_eq!(
            rig.recorder.entries(),
            vec!["local.play gd77-05-08 1", "local.stop", "local.play gd72-08-27 1"]
        );
        assert!(!rig.recorder.overlap.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_switching_sources_tears_down_first() {
        let mut rig = Rig::new();
        let mut with_video = (*show("gd90-03-29", 2)).clone();
        with_video.video_id = Some("yt-branford".to_string());

        rig.coordinator.load_local(show("gd77-05-08", 3), 1).await.unwrap();
        rig.coordinator.load_external(Arc::new(with_video)).await.unwrap();
        assert_eq!(rig.coordinator.current_position().await.source, SourceKind::External);

        rig.coordinator.load_local(show("gd72-08-27", 2), 0).await.unwrap();
        assert_eq!(rig.coordinator.current_position().await.source, SourceKind::Local);

        assert_eq!(
            rig.recorder.entries(),
            vec![
                "local.play gd77-05-08 2",
                "local.stop",
                "video.start yt-branford",
                "video.stop",
                "local.play gd72-08-27 1",
            ]
        );
        assert!(!rig.recorder.overlap.load(Ordering::SeqCst));
        assert_eq!(rig.drain().len(), 3);
    }

    #[tokio::test]
    async fn test_external_uses_identifier_without_video_id() {
        let rig = Rig::new();
        rig.coordinator.load_external(show("gd69-02-27", 1)).await.unwrap();
        assert_eq!(rig.recorder.entries(), vec!["video.start gd69-02-27"]);
    }

    #[tokio::test]
    async fn test_external_not_ready_leaves_state() {
        let mut rig = Rig::new();
        rig.coordinator.load_local(show("gd77-05-08", 3), 0).await.unwrap();
        rig.drain();
        rig.video.ready.store(false, Ordering::SeqCst);

        let err = rig.coordinator.load_external(show("gd90-03-29", 1)).await.unwrap_err();
        assert_eq!(err, PlaybackError::SourceNotReady);
        assert_eq!(rig.coordinator.current_position().await.source, SourceKind::Local);
        assert!(rig.drain().is_empty());
        assert_eq!(rig.recorder.entries(), vec!["local.play gd77-05-08 1"]);
    }

    #[tokio::test]
    async fn test_next_through_end_stops_once() {
        let mut rig = Rig::new();
        let c = &rig.coordinator;
        c.load_local(show("gd77-05-08", 3), 0).await.unwrap();

        for _ in 0..3 {
            c.next().await.unwrap();
        }
        let pos = c.current_position().await;
        assert_eq!(pos.index, Some(2));
        assert_eq!(pos.status, PlaybackStatus::Stopped);

        // Further next() calls at the end do nothing
        c.next().await.unwrap();

        let events = rig.drain();
        let stopped: Vec<_> = events
            .iter()
            .filter(|e| e.snapshot.status == PlaybackStatus::Stopped)
            .collect();
        assert_eq!(stopped.len(), 1);
        assert_eq!(events.last().unwrap().cause, Transition::Next);
        assert_eq!(events.len(), 4);
    }

    #[tokio::test]
    async fn test_play_after_end_restarts_last_track() {
        let rig = Rig::new();
        let c = &rig.coordinator;
        c.load_local(show("gd77-05-08", 1), 0).await.unwrap();
        c.next().await.unwrap();
        assert!(!c.is_playing(0).await);
        c.play().await.unwrap();
        assert!(c.is_playing(0).await);
        assert_eq!(
            rig.recorder.entries(),
            vec!["local.play gd77-05-08 1", "local.stop", "local.play gd77-05-08 1"]
        );
    }

    #[tokio::test]
    async fn test_previous() {
        let mut rig = Rig::new();
        rig.coordinator.load_local(show("gd77-05-08", 3), 0).await.unwrap();
        rig.drain();

        rig.coordinator.previous().await.unwrap();
        assert!(rig.drain().is_empty());
        assert_eq!(rig.coordinator.current_position().await.index, Some(0));

        rig.coordinator.next().await.unwrap();
        rig.coordinator.previous().await.unwrap();
        assert!(rig.coordinator.is_playing(0).await);
        assert_eq!(rig.drain().len(), 2);
    }

    #[tokio::test]
    async fn test_select_track_bounds() {
        let mut rig = Rig::new();
        rig.coordinator.load_local(show("gd77-05-08", 3), 1).await.unwrap();
        rig.drain();

        for bad in [-1, 3] {
            let err = rig.coordinator.select_track(bad).await.unwrap_err();
            assert_eq!(err, PlaybackError::OutOfRange { index: bad, len: 3 });
            assert_eq!(rig.coordinator.current_position().await.index, Some(1));
        }
        assert!(rig.drain().is_empty());

        rig.coordinator.select_track(2).await.unwrap();
        assert!(rig.coordinator.is_playing(2).await);
        assert!(!rig.coordinator.is_playing(1).await);
        assert_eq!(rig.drain()[0].cause, Transition::SelectTrack);
    }

    #[tokio::test]
    async fn test_pause_and_resume_local() {
        let mut rig = Rig::new();
        rig.coordinator.load_local(show("gd77-05-08", 3), 0).await.unwrap();
        rig.drain();

        rig.coordinator.pause().await.unwrap();
        rig.coordinator.pause().await.unwrap();
        assert_eq!(rig.coordinator.current_position().await.status, PlaybackStatus::Paused);
        rig.coordinator.play().await.unwrap();
        rig.coordinator.play().await.unwrap();

        let causes: Vec<_> = rig.drain().iter().map(|e| e.cause).collect();
        assert_eq!(causes, vec![Transition::Pause, Transition::Play]);
        assert_eq!(
            rig.recorder.entries(),
            vec!["local.play gd77-05-08 1", "local.pause", "local.resume"]
        );
    }

    #[tokio::test]
    async fn test_pause_and_resume_external_defaults() {
        let rig = Rig::new();
        rig.coordinator.load_external(show("gd90-03-29", 1)).await.unwrap();
        rig.coordinator.pause().await.unwrap();
        rig.coordinator.play().await.unwrap();
        assert_eq!(
            rig.recorder.entries(),
            vec!["video.start gd90-03-29", "video.stop", "video.start gd90-03-29"]
        );
        assert_eq!(rig.coordinator.current_position().await.status, PlaybackStatus::Playing);
    }

    #[tokio::test]
    async fn test_track_navigation_is_local_only() {
        let rig = Rig::new();
        rig.coordinator.load_external(show("gd90-03-29", 2)).await.unwrap();
        let err = rig.coordinator.next().await.unwrap_err();
        assert_eq!(
            err,
            PlaybackError::InvalidState {
                operation: "skip forward",
                state: SourceKind::External
            }
        );
        assert!(rig.coordinator.select_track(0).await.is_err());
    }

    #[tokio::test]
    async fn test_stop_releases_source() {
        let mut rig = Rig::new();
        rig.coordinator.load_external(show("gd90-03-29", 1)).await.unwrap();
        rig.coordinator.stop().await.unwrap();
        assert_eq!(rig.coordinator.session().await, PlaybackSession::Idle);
        assert!(!rig.recorder.video_on.load(Ordering::SeqCst));

        let events = rig.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].cause, Transition::Stop);
        assert_eq!(events[1].snapshot.source, SourceKind::None);
    }

    #[tokio::test]
    async fn test_load_local_bad_start_index() {
        let mut rig = Rig::new();
        rig.coordinator.load_external(show("gd90-03-29", 1)).await.unwrap();
        rig.drain();

        let err = rig.coordinator.load_local(show("gd77-05-08", 2), 2).await.unwrap_err();
        assert_eq!(err, PlaybackError::OutOfRange { index: 2, len: 2 });
        let err = rig.coordinator.load_local(show("gd00-00-00", 0), 0).await.unwrap_err();
        assert!(matches!(err, PlaybackError::OutOfRange { len: 0, .. }));

        // Nothing was torn down
        assert_eq!(rig.coordinator.current_position().await.source, SourceKind::External);
        assert_eq!(rig.recorder.entries(), vec!["video.start gd90-03-29"]);
        assert!(rig.drain().is_empty());
    }

    #[tokio::test]
    async fn test_source_failure_on_navigation_keeps_state() {
        let mut rig = Rig::new();
        rig.coordinator.load_local(show("gd77-05-08", 3), 0).await.unwrap();
        rig.drain();

        rig.local.fail_play.store(true, Ordering::SeqCst);
        let err = rig.coordinator.next().await.unwrap_err();
        assert!(matches!(err, PlaybackError::Source(SourceError::Failed(_))));
        assert!(rig.coordinator.is_playing(0).await);
        assert!(rig.drain().is_empty());
    }

    #[tokio::test]
    async fn test_activation_failure_after_teardown_goes_idle() {
        let mut rig = Rig::new();
        rig.coordinator.load_external(show("gd90-03-29", 1)).await.unwrap();
        rig.drain();

        rig.local.fail_play.store(true, Ordering::SeqCst);
        assert!(rig.coordinator.load_local(show("gd77-05-08", 1), 0).await.is_err());
        assert_eq!(rig.coordinator.session().await, PlaybackSession::Idle);

        let events = rig.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].snapshot.source, SourceKind::None);
    }

    #[tokio::test]
    async fn test_seek_forwarded() {
        let rig = Rig::new();
        rig.coordinator.load_local(show("gd77-05-08", 1), 0).await.unwrap();
        rig.coordinator.seek(Duration::from_secs(90)).await.unwrap();
        rig.coordinator.load_external(show("gd90-03-29", 1)).await.unwrap();
        rig.coordinator.seek(Duration::from_secs(30)).await.unwrap();
        let entries = rig.recorder.entries();
        assert!(entries.contains(&"local.seek 90".to_string()));
        assert!(entries.contains(&"video.seek 30".to_string()));
    }

    #[tokio::test]
    async fn test_history_records_loads() {
        let recorder = Arc::new(Recorder::default());
        let history = Arc::new(MemoryStore::new());
        let coordinator = PlaybackCoordinator::new(
            Arc::new(FakeLocal {
                recorder: Arc::clone(&recorder),
                fail_play: AtomicBool::new(false),
            }),
            Arc::new(FakeVideo {
                recorder,
                ready: AtomicBool::new(true),
            }),
        )
        .with_history(history.clone());

        coordinator.load_local(show("gd77-05-08", 2), 0).await.unwrap();
        coordinator.load_external(show("gd90-03-29", 1)).await.unwrap();
        coordinator.load_local(show("gd77-05-08", 2), 1).await.unwrap();
        assert_eq!(history.list(), vec!["gd77-05-08", "gd90-03-29"]);
    }

    #[tokio::test]
    async fn test_history_persists_to_file() {
        use crate::store::JsonFileStore;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let recorder = Arc::new(Recorder::default());
        let coordinator = PlaybackCoordinator::new(
            Arc::new(FakeLocal {
                recorder: Arc::clone(&recorder),
                fail_play: AtomicBool::new(false),
            }),
            Arc::new(FakeVideo {
                recorder,
                ready: AtomicBool::new(true),
            }),
        )
        .with_history(Arc::new(JsonFileStore::open(&path).unwrap()));

        coordinator.load_local(show("gd72-08-27", 2), 0).await.unwrap();
        coordinator.load_external(show("gd90-03-29", 1)).await.unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.list(), vec!["gd72-08-27", "gd90-03-29"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_loads_never_overlap_sources() {
        let rig = Rig::new();
        let coordinator = Arc::new(rig.coordinator);

        let mut handles = Vec::new();
        for i in 0..20 {
            let c = Arc::clone(&coordinator);
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    c.load_local(show(&format!("gd77-05-{:02}", i % 28 + 1), 2), 0).await
                } else {
                    c.load_external(show(&format!("gd90-03-{:02}", i % 28 + 1), 1)).await
                }
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert!(!rig.recorder.overlap.load(Ordering::SeqCst));
        let final_kind = coordinator.current_position().await.source;
        assert_ne!(final_kind, SourceKind::None);
        // Exactly one source is on at the end
        let on = [&rig.recorder.local_on, &rig.recorder.video_on]
            .iter()
            .filter(|f| f.load(Ordering::SeqCst))
            .count();
        assert_eq!(on, 1);
    }
}
