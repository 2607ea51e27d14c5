use std::path::PathBuf;

use clap::Parser;

use crate::audio::BackgroundSound;
use crate::settings::PacerSettings;

#[derive(Parser, Debug)]
#[command(name = "breathe")]
#[command(about = "Paced breathing with a countdown, progress ring and waveform")]
#[command(version)]
pub struct Cli {
    /// Breathing pattern to start with (e.g. "4-7-8")
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Path to a JSON settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Frames per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// Write frames to stdout as JSON lines and read commands from stdin
    #[arg(long)]
    pub json: bool,

    // Audio
    /// Background sound volume between 0 and 1
    #[arg(long)]
    pub volume: Option<f32>,

    /// Background sound to play
    #[arg(long, value_enum)]
    pub sound: Option<BackgroundSound>,

    /// Start with the background sound playing
    #[arg(long)]
    pub music: bool,

    /// Print the available patterns and exit
    #[arg(long)]
    pub list_patterns: bool,
}

impl Cli {
    /// Flags given on the command line win over the settings file.
    pub fn apply(&self, settings: &mut PacerSettings) {
        if let Some(pattern) = &self.pattern {
            settings.pattern = pattern.clone();
        }
        if let Some(fps) = self.fps {
            settings.frame_rate = fps;
        }
        if let Some(volume) = self.volume {
            settings.audio.volume = volume;
        }
        if let Some(sound) = self.sound {
            settings.audio.sound = sound;
        }
        if self.music {
            settings.audio.autoplay = true;
        }
    }
}
