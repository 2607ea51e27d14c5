pub mod controller;
pub mod frames;
pub mod session;
pub mod state;

pub use controller::{PlaybackController, DEFAULT_VOLUME};
pub use frames::{ChannelFrames, FrameFeeder, FrameSource, IntervalFrames, DEFAULT_FRAME_RATE};
pub use session::PacerSession;
pub use state::{ClockState, PhaseClock};
