pub mod audio;
pub mod cli;
pub mod input;
pub mod pattern;
pub mod render;
pub mod settings;
pub mod surface;
pub mod timer;
pub mod utils;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use cli::Cli;
use input::Command;
use pattern::{PatternTable, DEFAULT_PATTERN};
use render::ProgressRing;
use settings::PacerSettings;
use surface::{terminal::TerminalGuard, FrameSink, JsonLinesSink, TerminalSink};
use timer::{IntervalFrames, PacerSession, PlaybackController};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

/// Stderr shares the screen with the terminal surface, so it stays silent
/// unless `RUST_LOG` asks otherwise.
fn default_log_level(json: bool) -> LevelFilter {
    if json {
        LevelFilter::Info
    } else {
        LevelFilter::Off
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    utils::logging::init_logging(default_log_level(cli.json));

    let mut settings = match &cli.config {
        Some(path) => PacerSettings::load(path)?,
        None => PacerSettings::default(),
    };
    cli.apply(&mut settings);
    settings.validate()?;
    let patterns = Arc::new(settings.pattern_table()?);

    if cli.list_patterns {
        for pattern in patterns.iter() {
            let phases: Vec<String> = pattern
                .phases()
                .iter()
                .map(|phase| format!("{} {}s", phase.kind, phase.duration))
                .collect();
            println!(
                "{:<10} {:>4.1} breaths/min  {}",
                pattern.id(),
                pattern.breaths_per_minute(),
                phases.join(", ")
            );
        }
        return Ok(());
    }

    log_info!("breathe starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    let result = runtime.block_on(run_pacer(settings, patterns, cli.json));
    // The stdin reader may still be parked on a read that never completes.
    runtime.shutdown_background();
    result
}

async fn run_pacer(settings: PacerSettings, patterns: Arc<PatternTable>, json: bool) -> Result<()> {
    let initial = match patterns.get(&settings.pattern) {
        Some(pattern) => pattern.clone(),
        None => {
            log_warn!(
                "unknown pattern '{}', starting with {}",
                settings.pattern,
                DEFAULT_PATTERN
            );
            patterns.get_or_default(&settings.pattern).clone()
        }
    };
    let session = PacerSession::new(
        initial,
        settings.canvas,
        ProgressRing::new(settings.ring_radius),
    );

    let guard = if json {
        None
    } else {
        Some(TerminalGuard::enter().context("Failed to set up the terminal")?)
    };
    let sink: Arc<dyn FrameSink> = if json {
        Arc::new(JsonLinesSink::new(io::stdout()))
    } else {
        Arc::new(TerminalSink::new(patterns.clone(), settings.canvas))
    };

    let controller = PlaybackController::new(patterns.clone(), session, sink);
    controller.set_volume(settings.audio.volume).await;
    #[cfg(feature = "audio")]
    controller
        .attach_audio(Arc::new(audio::AudioEngineHandle::new(settings.audio.sound)))
        .await;
    if settings.audio.autoplay {
        controller.toggle_audio().await;
    }
    controller
        .start(IntervalFrames::new(settings.frame_rate))
        .await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let reader = if json {
        input::spawn_line_reader(tx, cancel.clone())
    } else {
        input::spawn_key_reader(patterns.clone(), tx, cancel.clone())
    };

    loop {
        let command = tokio::select! {
            command = rx.recv() => command,
            _ = tokio::signal::ctrl_c() => Some(Command::Quit),
        };
        let Some(command) = command else {
            if json {
                log_info!("stdin closed; running until interrupted");
                let _ = tokio::signal::ctrl_c().await;
            } else {
                log_debug!("keyboard reader stopped");
            }
            break;
        };
        match command {
            Command::TogglePause => {
                controller.toggle_pause().await;
            }
            Command::ToggleAudio => {
                controller.toggle_audio().await;
            }
            Command::NextPattern => {
                let _ = controller.next_pattern().await;
            }
            // Unknown names are logged by the controller and the current pattern keeps running.
            Command::SelectPattern(name) => {
                let _ = controller.select_pattern(&name).await;
            }
            Command::Quit => break,
        }
    }

    cancel.cancel();
    controller.stop().await;
    if !json {
        if let Err(err) = reader.await {
            log_warn!("keyboard reader failed: {err}");
        }
    }
    drop(guard);
    log_info!("breathe shutting down");
    Ok(())
}
