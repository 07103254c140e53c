//! Completion sound with a synthesised fallback tone

use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink};
use tracing::{debug, warn};

use super::tone::two_tone_beep;
use crate::error::SoundError;

/// Plays the signal that a timer has completed
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Must never fail; implementations recover internally
    async fn play_completion(&self);
}

/// Blocking audio backend; each call returns once playback has finished
pub trait AudioOutput: Send + Sync + 'static {
    fn play_file(&self, path: &Path) -> Result<(), SoundError>;

    fn play_beep(&self) -> Result<(), SoundError>;

    /// Last resort when no audio device works: the ASCII BEL character
    fn ring_bell(&self) {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }
}

/// Plays through the default audio device with rodio
#[derive(Debug, Clone, Copy)]
pub struct RodioOutput {
    volume: f32,
}

impl RodioOutput {
    /// `volume` is a percentage, clamped to `0..=100`
    pub fn new(volume: u8) -> Self {
        Self {
            volume: volume.min(100) as f32 / 100.0,
        }
    }

    /// The stream must outlive the sink
    fn open_sink(&self) -> Result<(OutputStream, Sink), SoundError> {
        let (stream, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;
        sink.set_volume(self.volume);
        Ok((stream, sink))
    }
}

impl AudioOutput for RodioOutput {
    fn play_file(&self, path: &Path) -> Result<(), SoundError> {
        let source = Decoder::new(BufReader::new(File::open(path)?))?;
        let (_stream, sink) = self.open_sink()?;
        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }

    fn play_beep(&self) -> Result<(), SoundError> {
        let (_stream, sink) = self.open_sink()?;
        sink.append(two_tone_beep());
        sink.sleep_until_end();
        Ok(())
    }
}

/// Plays the configured asset, falling back to the synthesised beep
pub struct SoundAlert<O> {
    output: Arc<O>,
    asset: Option<PathBuf>,
}

impl<O: AudioOutput> SoundAlert<O> {
    pub fn new(output: O, asset: Option<PathBuf>) -> Self {
        Self {
            output: Arc::new(output),
            asset,
        }
    }
}

/// Primary asset, then the beep, then the terminal bell
fn play_with_fallback<O: AudioOutput + ?Sized>(output: &O, asset: Option<&Path>) {
    let primary = match asset {
        Some(path) if path.exists() => output.play_file(path),
        _ => Err(SoundError::MissingAsset),
    };
    let Err(e) = primary else {
        return;
    };
    debug!("Primary completion sound unavailable ({}), using synthesised tone", e);

    if let Err(e) = output.play_beep() {
        warn!("Fallback tone failed: {}, ringing terminal bell", e);
        output.ring_bell();
    }
}

#[async_trait]
impl<O: AudioOutput> AlertSink for SoundAlert<O> {
    async fn play_completion(&self) {
        let output = Arc::clone(&self.output);
        let asset = self.asset.clone();

        // rodio blocks until playback ends
        let played =
            tokio::task::spawn_blocking(move || play_with_fallback(output.as_ref(), asset.as_deref()))
                .await;
        if let Err(e) = played {
            warn!("Completion sound task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        File,
        Beep,
        Bell,
    }

    #[derive(Default)]
    struct RecordingOutput {
        calls: Mutex<Vec<Call>>,
        file_fails: bool,
        beep_fails: bool,
    }

    impl RecordingOutput {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call, fails: bool) -> Result<(), SoundError> {
            self.calls.lock().unwrap().push(call);
            if fails {
                Err(SoundError::Io(std::io::Error::other("device busy")))
            } else {
                Ok(())
            }
        }
    }

    impl AudioOutput for RecordingOutput {
        fn play_file(&self, _path: &Path) -> Result<(), SoundError> {
            self.record(Call::File, self.file_fails)
        }

        fn play_beep(&self) -> Result<(), SoundError> {
            self.record(Call::Beep, self.beep_fails)
        }

        fn ring_bell(&self) {
            self.calls.lock().unwrap().push(Call::Bell);
        }
    }

    fn asset() -> tempfile::NamedTempFile {
        tempfile::NamedTempFile::new().unwrap()
    }

    #[test]
    fn playable_asset_skips_the_fallback() {
        let output = RecordingOutput::default();
        let file = asset();

        play_with_fallback(&output, Some(file.path()));

        assert_eq!(output.calls(), vec![Call::File]);
    }

    #[test]
    fn failing_asset_plays_the_beep_once() {
        let output = RecordingOutput {
            file_fails: true,
            ..Default::default()
        };
        let file = asset();

        play_with_fallback(&output, Some(file.path()));

        assert_eq!(output.calls(), vec![Call::File, Call::Beep]);
    }

    #[test]
    fn missing_asset_goes_straight_to_the_beep() {
        let output = RecordingOutput::default();

        play_with_fallback(&output, None);
        play_with_fallback(&output, Some(Path::new("/nonexistent/ding.wav")));

        assert_eq!(output.calls(), vec![Call::Beep, Call::Beep]);
    }

    #[test]
    fn bell_rings_only_after_the_beep_fails() {
        let output = RecordingOutput {
            file_fails: true,
            beep_fails: true,
            ..Default::default()
        };
        let file = asset();

        play_with_fallback(&output, Some(file.path()));

        assert_eq!(output.calls(), vec![Call::File, Call::Beep, Call::Bell]);
    }

    #[tokio::test]
    async fn play_completion_runs_the_fallback_chain() {
        let file = asset();
        let alert = SoundAlert::new(
            RecordingOutput {
                file_fails: true,
                ..Default::default()
            },
            Some(file.path().to_path_buf()),
        );

        alert.play_completion().await;

        assert_eq!(alert.output.calls(), vec![Call::File, Call::Beep]);
    }

    #[test]
    fn volume_is_clamped() {
        assert_eq!(RodioOutput::new(250).volume, 1.0);
        assert_eq!(RodioOutput::new(50).volume, 0.5);
    }
}
