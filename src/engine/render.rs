//! Render engine, run on the audio thread.
//!
//! For each frame: read targets and macros, advance the smoothed tempo and
//! pitch, advance the timeline, evaluate the active program and quantize the
//! result to 16-bit PCM.

use std::sync::Arc;

use crate::dsl::{to_i32, EvalContext, Program};

use super::params::{
    round_macro, ParameterStore, Smoother, MIN_SMOOTHED_PITCH, MIN_SMOOTHED_TEMPO,
};
use super::Shared;

/// Fixed gain applied before quantization.
pub const OUTPUT_GAIN: f32 = 0.6;

/// Render-thread clock: smoothed tempo and pitch plus the timeline.
///
/// The timeline only ever grows. It is not reset when the program or a macro
/// changes, so `t` stays continuous across hot-swaps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transport {
    tempo: Smoother,
    pitch: Smoother,
    timeline: f64,
}

impl Transport {
    pub fn new() -> Self {
        Self {
            tempo: Smoother::new(1.0, MIN_SMOOTHED_TEMPO),
            pitch: Smoother::new(1.0, MIN_SMOOTHED_PITCH),
            timeline: 0.0,
        }
    }

    /// Advance one frame and build that frame's evaluation context.
    #[inline]
    pub fn advance(&mut self, params: &ParameterStore) -> EvalContext {
        let macros = params.macros();
        let tempo = self.tempo.step(params.target_tempo());
        let pitch = self.pitch.step(params.target_pitch());

        self.timeline += tempo;

        EvalContext {
            t: (self.timeline * pitch).floor(),
            a: macros.a,
            b: macros.b,
            c: macros.c,
            d: macros.d,
            sh: round_macro(macros.sh),
            mask: round_macro(macros.mask),
        }
    }

    pub fn timeline(&self) -> f64 {
        self.timeline
    }

    pub fn smoothed_tempo(&self) -> f64 {
        self.tempo.value()
    }

    pub fn smoothed_pitch(&self) -> f64 {
        self.pitch.value()
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

/// Map an expression result to a PCM sample: low 8 bits as an unsigned
/// byte, centred to [-1, 1), scaled by [`OUTPUT_GAIN`], clamped to `i16`.
#[inline]
pub fn quantize(y: f64) -> i16 {
    let byte = (to_i32(y) & 0xFF) as u8;
    let sample = (f32::from(byte) - 128.0) / 128.0 * OUTPUT_GAIN;
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}

/// The audio-thread half of a [`Synth`](super::Synth).
pub struct Renderer {
    shared: Arc<Shared>,
    transport: Transport,
}

impl Renderer {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            transport: Transport::new(),
        }
    }

    /// Fill `out` with one sample per frame.
    ///
    /// Holds the program lock for the whole buffer, so the program cannot be
    /// replaced mid-buffer. Outputs silence while no program is installed.
    pub fn render(&mut self, out: &mut [i16]) {
        let Self { shared, transport } = self;
        let params = &shared.params;
        shared.program.with_active(|program| match program {
            Some(program) => render_program(program, transport, params, out),
            None => {
                for sample in out.iter_mut() {
                    transport.advance(params);
                    *sample = 0;
                }
            }
        });
    }

    /// Render `frames` samples into a new buffer.
    pub fn render_frames(&mut self, frames: usize) -> Vec<i16> {
        let mut out = vec![0; frames];
        self.render(&mut out);
        out
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}

fn render_program(
    program: &Program,
    transport: &mut Transport,
    params: &ParameterStore,
    out: &mut [i16],
) {
    for sample in out.iter_mut() {
        let ctx = transport.advance(params);
        *sample = quantize(program.eval(&ctx));
    }
}
