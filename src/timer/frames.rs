use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

pub const DEFAULT_FRAME_RATE: u32 = 60;

pub type FrameFuture<'a> = Pin<Box<dyn Future<Output = Option<Duration>> + Send + 'a>>;

/// Source of frame timestamps for the pacer loop.
///
/// `next_frame` resolves once per frame with the time since the source's
/// origin, or `None` when no more frames will come.
pub trait FrameSource: Send + 'static {
    fn next_frame(&mut self) -> FrameFuture<'_>;
}

/// Real-time frames from a tokio interval.
pub struct IntervalFrames {
    period: Duration,
    ticker: Option<Interval>,
    origin: Instant,
}

impl IntervalFrames {
    pub fn new(frame_rate: u32) -> Self {
        let frame_rate = frame_rate.clamp(1, 240);
        Self {
            period: Duration::from_nanos(1_000_000_000 / u64::from(frame_rate)),
            ticker: None,
            origin: Instant::now(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl FrameSource for IntervalFrames {
    fn next_frame(&mut self) -> FrameFuture<'_> {
        Box::pin(async move {
            // Created lazily so the interval is bound to the runtime that polls it.
            let period = self.period;
            let origin = self.origin;
            let ticker = self.ticker.get_or_insert_with(|| {
                let mut ticker = time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                ticker
            });
            let at = ticker.tick().await;
            Some(at.saturating_duration_since(origin))
        })
    }
}

/// Frames pushed by hand through a [`FrameFeeder`].
pub struct ChannelFrames {
    rx: mpsc::UnboundedReceiver<Duration>,
}

#[derive(Clone)]
pub struct FrameFeeder {
    tx: mpsc::UnboundedSender<Duration>,
}

impl FrameFeeder {
    /// Queues a frame at `timestamp`. Returns false once the loop is gone.
    pub fn frame(&self, timestamp: Duration) -> bool {
        self.tx.send(timestamp).is_ok()
    }

    pub fn frame_at_secs(&self, seconds: f64) -> bool {
        self.frame(Duration::from_secs_f64(seconds))
    }
}

impl ChannelFrames {
    pub fn channel() -> (FrameFeeder, ChannelFrames) {
        let (tx, rx) = mpsc::unbounded_channel();
        (FrameFeeder { tx }, ChannelFrames { rx })
    }
}

impl FrameSource for ChannelFrames {
    fn next_frame(&mut self) -> FrameFuture<'_> {
        Box::pin(self.rx.recv())
    }
}
