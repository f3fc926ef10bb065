//! Audio callback, run on the cpal audio thread.
//!
//! Pulls one mono 16-bit sample per frame from the [`Renderer`], converts it
//! to the device format and copies it to every channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpal::{FromSample, Sample};

use crate::engine::Renderer;

/// State that lives on the audio thread. Accessed only from the cpal callback.
pub struct AudioCallback {
    renderer: Renderer,
    running: Arc<AtomicBool>,
    scratch: Vec<i16>,
    channels: usize,
}

impl AudioCallback {
    /// `frames_hint` pre-sizes the mono scratch buffer so the callback does
    /// not allocate when the device keeps to its requested buffer size.
    pub fn new(
        renderer: Renderer,
        channels: u16,
        running: Arc<AtomicBool>,
        frames_hint: usize,
    ) -> Self {
        Self {
            renderer,
            running,
            scratch: vec![0; frames_hint],
            channels: usize::from(channels.max(1)),
        }
    }

    /// Called by cpal for each device buffer. Fills `output` (interleaved).
    pub fn process<T>(&mut self, output: &mut [T])
    where
        T: Sample + FromSample<i16>,
    {
        if !self.running.load(Ordering::Relaxed) {
            output.fill(T::EQUILIBRIUM);
            return;
        }

        let frames = output.len() / self.channels;
        if self.scratch.len() < frames {
            self.scratch.resize(frames, 0);
        }
        let pcm = &mut self.scratch[..frames];
        self.renderer.render(pcm);

        let mut chunks = output.chunks_exact_mut(self.channels);
        for (frame, &sample) in (&mut chunks).zip(pcm.iter()) {
            frame.fill(T::from_sample(sample));
        }
        chunks.into_remainder().fill(T::EQUILIBRIUM);
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{quantize, Synth};
    use crate::presets::PresetBank;

    fn setup(expr: &str, channels: u16) -> (Synth, AudioCallback, Arc<AtomicBool>) {
        let mut synth = Synth::new(PresetBank::builtin());
        synth.compile_and_install(expr).unwrap();
        let running = Arc::new(AtomicBool::new(true));
        let callback = AudioCallback::new(synth.renderer(), channels, Arc::clone(&running), 64);
        (synth, callback, running)
    }

    #[test]
    fn test_callback_copies_mono_to_all_channels() {
        let (_synth, mut callback, _running) = setup("t", 2);
        let mut out = [0i16; 8];
        callback.process(&mut out);
        let expected: Vec<i16> = (1..=4).map(|t| quantize(f64::from(t))).collect();
        for (frame, want) in out.chunks(2).zip(expected) {
            assert_eq!(frame, [want, want]);
        }
    }

    #[test]
    fn test_callback_converts_to_f32() {
        let (_synth, mut callback, _running) = setup("128", 1);
        let mut out = [1.0f32; 4];
        callback.process(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));

        let (_synth, mut callback, _running) = setup("0", 1);
        callback.process(&mut out);
        let want = f32::from_sample(quantize(0.0));
        assert!(out.iter().all(|&s| s == want));
        assert!(want < -0.59 && want > -0.61);
    }

    #[test]
    fn test_callback_converts_to_u16() {
        let (_synth, mut callback, _running) = setup("128", 3);
        let mut out = [0u16; 6];
        callback.process(&mut out);
        assert!(out.iter().all(|&s| s == u16::EQUILIBRIUM));
    }

    #[test]
    fn test_callback_silence_when_stopped() {
        let (_synth, mut callback, running) = setup("t*7", 2);
        running.store(false, Ordering::Relaxed);
        let mut out = [0.5f32; 16];
        callback.process(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(callback.renderer().transport().timeline(), 0.0);
    }

    #[test]
    fn test_callback_grows_scratch_for_large_buffers() {
        let (_synth, mut callback, _running) = setup("t", 1);
        let mut out = vec![0i16; 1000];
        callback.process(&mut out);
        assert_eq!(out[999], quantize(1000.0));
        assert_eq!(callback.renderer().transport().timeline(), 1000.0);
    }

    #[test]
    fn test_callback_partial_frame_is_silent() {
        let (_synth, mut callback, _running) = setup("t", 2);
        let mut out = [7i16; 5];
        callback.process(&mut out);
        assert_eq!(out[4], 0);
        assert_eq!(callback.channels(), 2);
    }

    #[test]
    fn test_callback_continues_timeline_across_calls() {
        let (_synth, mut callback, _running) = setup("t", 1);
        let mut first = [0i16; 4];
        let mut second = [0i16; 4];
        callback.process(&mut first);
        callback.process(&mut second);
        assert_eq!(second[0], quantize(5.0));
    }
}
