//! Audio output: owns the cpal stream that pulls samples from the render
//! engine.
//!
//! The engine produces mono signed 16-bit samples; [`callback::AudioCallback`]
//! converts them to whatever sample format the device wants and fans them out
//! to every channel.

pub mod callback;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample};
use thiserror::Error;
use tracing::{info, warn};

use crate::engine::Renderer;

use callback::AudioCallback;

/// Audio output errors.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device found")]
    NoOutputDevice,
    #[error("device config error: {0}")]
    DeviceConfig(String),
    #[error("stream build error: {0}")]
    StreamBuild(String),
    #[error("stream play error: {0}")]
    StreamPlay(String),
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
}

/// Requested stream parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSettings {
    pub sample_rate: u32,
    /// Frames per buffer; 0 leaves it to the device.
    pub buffer_frames: u32,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            buffer_frames: 512,
        }
    }
}

impl OutputSettings {
    fn buffer_size(&self) -> cpal::BufferSize {
        match self.buffer_frames {
            0 => cpal::BufferSize::Default,
            n => cpal::BufferSize::Fixed(n),
        }
    }

    fn frames_hint(&self) -> usize {
        match self.buffer_frames {
            0 => 4096,
            n => n as usize,
        }
    }
}

/// A running output stream. Dropping it stops playback.
pub struct AudioOutput {
    stream: cpal::Stream,
    sample_rate: u32,
    channels: u16,
}

impl AudioOutput {
    /// Open the default output device and start pulling from `renderer`.
    ///
    /// The callback emits silence whenever `running` is false.
    pub fn start(
        renderer: Renderer,
        settings: OutputSettings,
        running: Arc<AtomicBool>,
    ) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;

        let default_config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;

        let channels = default_config.channels();
        let sample_format = default_config.sample_format();
        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(settings.sample_rate),
            buffer_size: settings.buffer_size(),
        };

        info!(
            device = %device.name().unwrap_or_else(|_| String::from("<unknown>")),
            sample_rate = settings.sample_rate,
            channels,
            format = ?sample_format,
            "opening audio output"
        );

        let callback = AudioCallback::new(renderer, channels, running, settings.frames_hint());
        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, callback)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, callback)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, callback)?,
            other => return Err(AudioError::UnsupportedFormat(format!("{other:?}"))),
        };

        stream
            .play()
            .map_err(|e| AudioError::StreamPlay(e.to_string()))?;

        Ok(Self {
            stream,
            sample_rate: settings.sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Stop requesting buffers and release the device.
    pub fn stop(self) {
        if let Err(e) = self.stream.pause() {
            warn!("failed to pause audio stream: {e}");
        }
        drop(self.stream);
        info!("audio output stopped");
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut callback: AudioCallback,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample + FromSample<i16>,
{
    let err_fn = |err: cpal::StreamError| {
        warn!("audio stream error: {err}");
    };

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                callback.process(data);
            },
            err_fn,
            None,
        )
        .map_err(|e| AudioError::StreamBuild(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Synth;
    use crate::presets::PresetBank;

    #[test]
    #[ignore] // Requires audio device; run manually with `cargo test -- --ignored`
    fn test_audio_output_start_and_stop() {
        let mut synth = Synth::new(PresetBank::builtin());
        synth.select_preset(1).unwrap();
        let running = Arc::new(AtomicBool::new(true));
        let output = AudioOutput::start(synth.renderer(), OutputSettings::default(), running)
            .expect("no audio device");
        assert_eq!(output.sample_rate(), 48_000);
        assert!(output.channels() > 0);
        output.stop();
        synth.shutdown();
    }

    #[test]
    fn test_audio_error_display() {
        assert_eq!(
            AudioError::NoOutputDevice.to_string(),
            "no audio output device found"
        );
        assert_eq!(
            AudioError::DeviceConfig("test".to_string()).to_string(),
            "device config error: test"
        );
        assert_eq!(
            AudioError::UnsupportedFormat("I8".to_string()).to_string(),
            "unsupported sample format: I8"
        );
    }

    #[test]
    fn test_buffer_size_from_settings() {
        let fixed = OutputSettings::default();
        assert!(matches!(fixed.buffer_size(), cpal::BufferSize::Fixed(512)));
        assert_eq!(fixed.frames_hint(), 512);

        let auto = OutputSettings {
            buffer_frames: 0,
            ..fixed
        };
        assert!(matches!(auto.buffer_size(), cpal::BufferSize::Default));
        assert_eq!(auto.frames_hint(), 4096);
    }
}
