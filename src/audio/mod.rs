#[cfg(feature = "audio")]
pub mod brown_noise;
#[cfg(feature = "audio")]
pub mod drone;

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[cfg(feature = "audio")]
pub use engine::AudioEngineHandle;

/// Playback handle the pacer drives for background audio.
pub trait AudioPlayer: Send + Sync {
    fn play(&self) -> Result<()>;
    fn pause(&self) -> Result<()>;
    /// Volume in `[0, 1]`; out-of-range values are clamped by implementations.
    fn set_volume(&self, volume: f32) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundSound {
    #[default]
    BrownNoise,
    Drone,
}

#[cfg(feature = "audio")]
mod engine {
    use super::brown_noise::BrownNoise;
    use super::drone::Drone;
    use super::{AudioPlayer, BackgroundSound};

    use anyhow::{anyhow, Result};
    use rodio::{OutputStream, Sink};
    use std::sync::{
        mpsc::{self, Sender},
        Mutex,
    };
    use std::thread;

    const ENABLE_LOGS: bool = true;

    use crate::{log_debug, log_warn};

    enum AudioCommand {
        Play,
        Pause,
        SetVolume(f32),
        Stop,
    }

    /// Background sound on a dedicated audio thread.
    ///
    /// The rodio stream is not `Send`, so it lives on its own thread and is
    /// only reached through the command channel. The output device is opened
    /// on the first `play()`.
    pub struct AudioEngineHandle {
        sound: BackgroundSound,
        tx: Mutex<Option<Sender<AudioCommand>>>,
    }

    impl AudioEngineHandle {
        pub fn new(sound: BackgroundSound) -> Self {
            Self {
                sound,
                tx: Mutex::new(None),
            }
        }

        fn ensure_thread(&self) -> Result<Sender<AudioCommand>> {
            let mut guard = self
                .tx
                .lock()
                .map_err(|_| anyhow!("audio command channel poisoned"))?;
            if let Some(tx) = guard.as_ref() {
                return Ok(tx.clone());
            }

            let (tx, rx) = mpsc::channel::<AudioCommand>();
            let sound = self.sound;

            thread::Builder::new()
                .name("audio-engine".to_string())
                .spawn(move || {
                    let mut _stream: Option<OutputStream> = None;
                    let mut sink: Option<Sink> = None;
                    let mut volume = 1.0_f32;

                    fn open_sink(
                        stream: &mut Option<OutputStream>,
                        sink: &mut Option<Sink>,
                        sound: BackgroundSound,
                        volume: f32,
                    ) -> Result<()> {
                        if sink.is_some() {
                            return Ok(());
                        }
                        let (s, handle) = OutputStream::try_default()
                            .map_err(|e| anyhow!("failed to open audio output: {e}"))?;
                        let new_sink = Sink::try_new(&handle)
                            .map_err(|e| anyhow!("failed to create audio sink: {e}"))?;
                        new_sink.set_volume(volume);
                        match sound {
                            BackgroundSound::BrownNoise => new_sink.append(BrownNoise::new()),
                            BackgroundSound::Drone => new_sink.append(Drone::new()),
                        }
                        *stream = Some(s);
                        *sink = Some(new_sink);
                        Ok(())
                    }

                    while let Ok(cmd) = rx.recv() {
                        match cmd {
                            AudioCommand::Play => {
                                if let Err(err) = open_sink(&mut _stream, &mut sink, sound, volume) {
                                    log_warn!("background audio unavailable: {err}");
                                    continue;
                                }
                                if let Some(ref s) = sink {
                                    s.play();
                                }
                            }
                            AudioCommand::Pause => {
                                if let Some(ref s) = sink {
                                    s.pause();
                                }
                            }
                            AudioCommand::SetVolume(v) => {
                                volume = v;
                                if let Some(ref s) = sink {
                                    s.set_volume(v);
                                }
                            }
                            AudioCommand::Stop => break,
                        }
                    }

                    if let Some(s) = sink.take() {
                        s.stop();
                    }
                    log_debug!("audio engine thread finished");
                })?;

            *guard = Some(tx.clone());
            Ok(tx)
        }

        fn send(&self, cmd: AudioCommand) -> Result<()> {
            let tx = self.ensure_thread()?;
            tx.send(cmd)
                .map_err(|_| anyhow!("audio engine thread has exited"))
        }

        /// Shuts the audio thread down; a later `play()` starts a fresh one.
        fn stop(&self) {
            if let Ok(mut guard) = self.tx.lock() {
                if let Some(tx) = guard.take() {
                    let _ = tx.send(AudioCommand::Stop);
                }
            }
        }
    }

    impl AudioPlayer for AudioEngineHandle {
        fn play(&self) -> Result<()> {
            self.send(AudioCommand::Play)
        }

        fn pause(&self) -> Result<()> {
            self.send(AudioCommand::Pause)
        }

        fn set_volume(&self, volume: f32) -> Result<()> {
            self.send(AudioCommand::SetVolume(volume.clamp(0.0, 1.0)))
        }
    }

    impl Drop for AudioEngineHandle {
        fn drop(&mut self) {
            self.stop();
        }
    }
}
