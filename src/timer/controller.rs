use std::sync::Arc;

use anyhow::Result;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::audio::AudioPlayer;
use crate::pattern::PatternTable;
use crate::render::RenderSnapshot;
use crate::surface::FrameSink;

use super::{FrameSource, PacerSession};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

pub const DEFAULT_VOLUME: f32 = 0.3;

struct AudioState {
    player: Option<Arc<dyn AudioPlayer>>,
    playing: bool,
    volume: f32,
}

struct FrameLoop {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Owns the pacer session and the task that feeds it frames.
///
/// Cheap to clone; every clone drives the same session.
#[derive(Clone)]
pub struct PlaybackController {
    session: Arc<Mutex<PacerSession>>,
    patterns: Arc<PatternTable>,
    sink: Arc<dyn FrameSink>,
    audio: Arc<Mutex<AudioState>>,
    frame_loop: Arc<Mutex<Option<FrameLoop>>>,
}

impl PlaybackController {
    pub fn new(patterns: Arc<PatternTable>, session: PacerSession, sink: Arc<dyn FrameSink>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            patterns,
            sink,
            audio: Arc::new(Mutex::new(AudioState {
                player: None,
                playing: false,
                volume: DEFAULT_VOLUME,
            })),
            frame_loop: Arc::new(Mutex::new(None)),
        }
    }

    pub fn patterns(&self) -> &PatternTable {
        &self.patterns
    }

    pub async fn snapshot(&self) -> RenderSnapshot {
        self.session.lock().await.snapshot()
    }

    pub async fn is_paused(&self) -> bool {
        self.session.lock().await.is_paused()
    }

    pub async fn current_pattern(&self) -> String {
        self.session.lock().await.clock().state().pattern_id.clone()
    }

    /// Starts feeding frames from `frames`. A loop that is already running is
    /// cancelled and joined first, so there is never more than one.
    pub async fn start<F: FrameSource>(&self, frames: F) {
        let mut loop_guard = self.frame_loop.lock().await;
        if let Some(previous) = loop_guard.take() {
            shutdown(previous).await;
        }

        let snapshot = {
            let mut session = self.session.lock().await;
            session.restart();
            session.snapshot()
        };
        self.sink.present(&snapshot);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(frame_loop(
            self.session.clone(),
            self.sink.clone(),
            Box::new(frames),
            cancel.clone(),
        ));
        log_info!("frame loop started on pattern {}", snapshot.pattern_id);

        *loop_guard = Some(FrameLoop { handle, cancel });
    }

    pub async fn stop(&self) {
        if let Some(running) = self.frame_loop.lock().await.take() {
            shutdown(running).await;
        }
    }

    /// Waits for the frame loop to end on its own, once its frame source runs dry.
    pub async fn wait_finished(&self) {
        let running = self.frame_loop.lock().await.take();
        if let Some(running) = running {
            if let Err(err) = running.handle.await {
                log_warn!("frame loop task failed: {err}");
            }
        }
    }

    pub async fn is_running(&self) -> bool {
        self.frame_loop
            .lock()
            .await
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Flips pause and returns the new paused flag.
    pub async fn toggle_pause(&self) -> bool {
        let (paused, snapshot) = {
            let mut session = self.session.lock().await;
            let paused = session.toggle_pause();
            (paused, session.snapshot())
        };
        log_info!("{}", if paused { "paused" } else { "resumed" });
        self.sink.present(&snapshot);
        paused
    }

    /// Switches to `name` and shows its first phase right away.
    ///
    /// An unknown name leaves the current pattern running and returns the error.
    pub async fn select_pattern(&self, name: &str) -> Result<RenderSnapshot> {
        let pattern = match self.patterns.lookup(name) {
            Ok(pattern) => pattern.clone(),
            Err(err) => {
                log_warn!("ignoring pattern switch: {err}");
                return Err(err);
            }
        };

        let snapshot = {
            let mut session = self.session.lock().await;
            session.select_pattern(pattern);
            session.snapshot()
        };
        log_info!("pattern switched to {name}");
        self.sink.present(&snapshot);
        Ok(snapshot)
    }

    pub async fn next_pattern(&self) -> Result<RenderSnapshot> {
        let current = self.current_pattern().await;
        let next = self.patterns.next_after(&current).to_string();
        self.select_pattern(&next).await
    }

    /// Installs the background audio player and applies the stored volume.
    /// Does not start playback, even if music was toggled on earlier.
    pub async fn attach_audio(&self, player: Arc<dyn AudioPlayer>) {
        let mut audio = self.audio.lock().await;
        if let Err(err) = player.set_volume(audio.volume) {
            log_warn!("failed to set audio volume: {err}");
        }
        audio.player = Some(player);
        log_debug!("audio player attached");
    }

    pub async fn set_volume(&self, volume: f32) {
        let mut audio = self.audio.lock().await;
        audio.volume = volume.clamp(0.0, 1.0);
        if let Some(player) = audio.player.as_ref() {
            if let Err(err) = player.set_volume(audio.volume) {
                log_warn!("failed to set audio volume: {err}");
            }
        }
    }

    /// Flips the music flag and returns it. Without a player only the flag changes.
    pub async fn toggle_audio(&self) -> bool {
        let mut audio = self.audio.lock().await;
        audio.playing = !audio.playing;

        match audio.player.as_ref() {
            Some(player) => {
                let result = if audio.playing {
                    player.play()
                } else {
                    player.pause()
                };
                if let Err(err) = result {
                    log_warn!("background audio toggle failed: {err}");
                }
            }
            None => log_debug!("no audio player yet; music flag now {}", audio.playing),
        }
        audio.playing
    }

    pub async fn is_music_playing(&self) -> bool {
        self.audio.lock().await.playing
    }
}

async fn shutdown(running: FrameLoop) {
    running.cancel.cancel();
    if let Err(err) = running.handle.await {
        if !err.is_cancelled() {
            log_warn!("frame loop task failed: {err}");
        }
    }
}

async fn frame_loop(
    session: Arc<Mutex<PacerSession>>,
    sink: Arc<dyn FrameSink>,
    mut frames: Box<dyn FrameSource>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log_debug!("frame loop cancelled");
                break;
            }
            frame = frames.next_frame() => {
                let Some(timestamp) = frame else {
                    log_info!("frame source finished");
                    break;
                };
                let snapshot = session.lock().await.on_frame(timestamp);
                if let Some(snapshot) = snapshot {
                    sink.present(&snapshot);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Canvas, ProgressRing};
    use crate::surface::RecordingSink;
    use crate::timer::ChannelFrames;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn controller(sink: Arc<RecordingSink>) -> PlaybackController {
        let patterns = Arc::new(PatternTable::builtin());
        let session = PacerSession::new(
            patterns.lookup("4-4-4-4").unwrap().clone(),
            Canvas::default(),
            ProgressRing::default(),
        );
        PlaybackController::new(patterns, session, sink)
    }

    #[derive(Default)]
    struct CountingPlayer {
        plays: AtomicUsize,
        pauses: AtomicUsize,
        volume_calls: AtomicUsize,
    }

    impl AudioPlayer for CountingPlayer {
        fn play(&self) -> Result<()> {
            self.plays.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn pause(&self) -> Result<()> {
            self.pauses.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn set_volume(&self, _volume: f32) -> Result<()> {
            self.volume_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn unknown_pattern_keeps_current_one() {
        let sink = Arc::new(RecordingSink::default());
        let controller = controller(sink.clone());

        assert!(controller.select_pattern("9-9-9").await.is_err());
        assert_eq!(controller.current_pattern().await, "4-4-4-4");
        assert!(sink.frames().is_empty());

        let snapshot = controller.select_pattern("4-7-8").await.unwrap();
        assert_eq!(snapshot.pattern_id, "4-7-8");
        assert_eq!(snapshot.countdown_seconds, 4);
        assert_eq!(sink.frames().last(), Some(&snapshot));
    }

    #[tokio::test]
    async fn next_pattern_cycles_table_order() {
        let controller = controller(Arc::new(RecordingSink::default()));
        assert_eq!(controller.next_pattern().await.unwrap().pattern_id, "5-5-5");
        assert_eq!(controller.next_pattern().await.unwrap().pattern_id, "4-7-8");
    }

    #[tokio::test]
    async fn audio_toggle_without_player_only_flips_flag() {
        let controller = controller(Arc::new(RecordingSink::default()));
        assert!(controller.toggle_audio().await);
        assert!(controller.is_music_playing().await);

        let player = Arc::new(CountingPlayer::default());
        controller.attach_audio(player.clone()).await;
        assert_eq!(player.volume_calls.load(Ordering::SeqCst), 1);
        assert_eq!(player.plays.load(Ordering::SeqCst), 0);

        assert!(!controller.toggle_audio().await);
        assert_eq!(player.pauses.load(Ordering::SeqCst), 1);
        assert!(controller.toggle_audio().await);
        assert_eq!(player.plays.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn frames_drive_the_clock() {
        let sink = Arc::new(RecordingSink::default());
        let controller = controller(sink.clone());
        let (feeder, frames) = ChannelFrames::channel();
        controller.start(frames).await;

        for second in [100.0, 104.0, 108.0] {
            feeder.frame_at_secs(second);
        }
        drop(feeder);
        controller.wait_finished().await;

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.phase_index, 2);
        assert_eq!(snapshot.instruction_text, "Exhale");
        // Initial frame from start() plus one per fed frame.
        assert_eq!(sink.frames().len(), 4);
    }

    #[tokio::test]
    async fn pause_blocks_frames_and_resume_skips_gap() {
        let sink = Arc::new(RecordingSink::default());
        let controller = controller(sink.clone());
        let (feeder, frames) = ChannelFrames::channel();
        controller.start(frames).await;

        feeder.frame_at_secs(0.0);
        feeder.frame_at_secs(1.0);
        settle(&controller, Duration::from_secs(1)).await;

        assert!(controller.toggle_pause().await);
        feeder.frame_at_secs(500.0);
        settle(&controller, Duration::from_secs(500)).await;
        assert!(!controller.toggle_pause().await);

        feeder.frame_at_secs(900.0);
        feeder.frame_at_secs(901.0);
        drop(feeder);
        controller.wait_finished().await;

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.phase_index, 0);
        assert_eq!(snapshot.countdown_seconds, 2);
    }

    #[tokio::test]
    async fn restart_replaces_the_running_loop() {
        let sink = Arc::new(RecordingSink::default());
        let controller = controller(sink.clone());

        let (first_feeder, first) = ChannelFrames::channel();
        controller.start(first).await;
        assert!(controller.is_running().await);

        let (second_feeder, second) = ChannelFrames::channel();
        controller.start(second).await;
        assert!(controller.is_running().await);

        // The first loop is gone, so its channel is closed.
        assert!(!first_feeder.frame_at_secs(1.0));
        assert!(second_feeder.frame_at_secs(1.0));

        controller.stop().await;
        assert!(!controller.is_running().await);
    }

    /// Waits until the loop has handled the frame stamped `timestamp`.
    async fn settle(controller: &PlaybackController, timestamp: Duration) {
        for _ in 0..100 {
            if controller.session.lock().await.last_timestamp() == Some(timestamp) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("frame loop did not catch up");
    }
}
