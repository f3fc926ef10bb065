//! Synth context: the parameter store and active-program slot shared with the
//! render thread, plus the preset bank and current-preset tag owned by the
//! control surface.
//!
//! Construction order: build the [`Synth`], install the first program, hand a
//! [`Renderer`] to the audio sink. Teardown runs in reverse: stop the sink
//! (dropping its renderer), then [`Synth::shutdown`].

pub mod error;
pub mod params;
pub mod render;
pub mod slot;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::dsl::{Compiler, Program};
use crate::presets::{Preset, PresetBank};

pub use error::EngineError;
pub use params::{semitones_to_ratio, Macro, MacroValues, ParameterStore};
pub use render::{quantize, Renderer, Transport};
pub use slot::ProgramSlot;

/// State reachable from both the control surface and the render thread.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) params: ParameterStore,
    pub(crate) program: ProgramSlot<Program>,
}

/// Snapshot returned by [`Synth::status`].
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    /// 1-based preset number and name, or `None` for a custom equation.
    pub preset: Option<(usize, String)>,
    pub tempo: f64,
    pub pitch_ratio: f64,
    pub macros: MacroValues,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.preset {
            Some((number, name)) => writeln!(f, "Preset {number}: {name}")?,
            None => writeln!(f, "Preset: custom equation")?,
        }
        writeln!(
            f,
            "Target tempo x{:.3} | target pitch ratio x{:.4}",
            self.tempo, self.pitch_ratio
        )?;
        let m = &self.macros;
        write!(
            f,
            "Macros: a={:.3} b={:.3} c={:.3} d={:.3} sh={} mask={}",
            m.a,
            m.b,
            m.c,
            m.d,
            m.sh.round() as i64,
            m.mask.round() as i64
        )
    }
}

/// The control-surface handle to the engine.
pub struct Synth {
    shared: Arc<Shared>,
    presets: PresetBank,
    /// Zero-based index of the preset the active program came from.
    current: Option<usize>,
}

impl Synth {
    /// A synth with default macros and no program installed.
    pub fn new(presets: PresetBank) -> Self {
        Self::with_macros(presets, MacroValues::default())
    }

    pub fn with_macros(presets: PresetBank, macros: MacroValues) -> Self {
        Self {
            shared: Arc::new(Shared {
                params: ParameterStore::new(macros),
                program: ProgramSlot::default(),
            }),
            presets,
            current: None,
        }
    }

    /// A render-thread handle sharing this synth's parameters and program.
    ///
    /// Each renderer keeps its own timeline; the audio sink should own
    /// exactly one.
    pub fn renderer(&self) -> Renderer {
        Renderer::new(Arc::clone(&self.shared))
    }

    pub fn params(&self) -> &ParameterStore {
        &self.shared.params
    }

    pub fn presets(&self) -> &PresetBank {
        &self.presets
    }

    /// Compile `text` and make it the active program, tagged as custom.
    ///
    /// On failure nothing changes. Returns the canonical form of the
    /// installed program.
    pub fn compile_and_install(&mut self, text: &str) -> Result<String, EngineError> {
        let canonical = self.install(text)?;
        self.current = None;
        Ok(canonical)
    }

    fn install(&self, text: &str) -> Result<String, EngineError> {
        let program = Compiler::compile(text)?;
        let canonical = program.to_string();
        let previous = self.shared.program.install(program);
        debug!(
            program = %canonical,
            generation = self.shared.program.generation(),
            "installed program"
        );
        drop(previous);
        Ok(canonical)
    }

    /// Select a preset by 1-based index.
    pub fn select_preset(&mut self, index: usize) -> Result<&Preset, EngineError> {
        let count = self.presets.len();
        if index == 0 || index > count {
            return Err(EngineError::PresetOutOfRange { index, count });
        }
        self.select_index(index - 1)
    }

    /// Advance to the next preset, wrapping. From a custom program this
    /// lands on preset 2.
    pub fn next_preset(&mut self) -> Result<&Preset, EngineError> {
        let count = self.nonempty_len()?;
        let from = self.current.unwrap_or(0);
        self.select_index((from + 1) % count)
    }

    /// Step back to the previous preset, wrapping. From a custom program this
    /// lands on the last preset.
    pub fn previous_preset(&mut self) -> Result<&Preset, EngineError> {
        let count = self.nonempty_len()?;
        let from = self.current.unwrap_or(0);
        self.select_index((from + count - 1) % count)
    }

    fn nonempty_len(&self) -> Result<usize, EngineError> {
        match self.presets.len() {
            0 => Err(EngineError::NoPresets),
            n => Ok(n),
        }
    }

    fn select_index(&mut self, index: usize) -> Result<&Preset, EngineError> {
        let count = self.presets.len();
        let source = self
            .presets
            .get(index)
            .map(|p| p.source.clone())
            .ok_or(EngineError::PresetOutOfRange {
                index: index + 1,
                count,
            })?;
        self.install(&source)?;
        self.current = Some(index);

        let preset = self
            .presets
            .get(index)
            .ok_or(EngineError::PresetOutOfRange {
                index: index + 1,
                count,
            })?;
        info!(number = index + 1, name = %preset.name, "preset selected");
        Ok(preset)
    }

    /// 1-based number of the current preset, `None` for a custom program.
    pub fn current_preset(&self) -> Option<usize> {
        self.current.map(|i| i + 1)
    }

    pub fn set_macro(&self, m: Macro, value: f64) {
        self.shared.params.set_macro(m, value);
    }

    /// Set the tempo target; returns the clamped value actually stored.
    pub fn set_tempo(&self, multiplier: f64) -> f64 {
        self.shared.params.set_target_tempo(multiplier)
    }

    /// Set the pitch target in semitones; returns the resulting ratio.
    pub fn set_pitch_semitones(&self, semitones: f64) -> f64 {
        let ratio = semitones_to_ratio(semitones);
        self.shared.params.set_target_pitch(ratio);
        ratio
    }

    pub fn status(&self) -> Status {
        let params = &self.shared.params;
        Status {
            preset: self.current.and_then(|i| {
                self.presets.get(i).map(|p| (i + 1, p.name.clone()))
            }),
            tempo: params.target_tempo(),
            pitch_ratio: params.target_pitch(),
            macros: params.macros(),
        }
    }

    /// Canonical text of the active program, if any.
    pub fn active_program(&self) -> Option<String> {
        self.shared.program.with_active(|p| p.map(ToString::to_string))
    }

    /// Number of programs installed or removed so far.
    pub fn generation(&self) -> u64 {
        self.shared.program.generation()
    }

    /// Remove and drop the active program.
    ///
    /// Call after the audio sink has stopped.
    pub fn shutdown(self) {
        let last = self.shared.program.take();
        debug!(had_program = last.is_some(), "synth shut down");
        drop(last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn synth() -> Synth {
        Synth::new(PresetBank::builtin())
    }

    #[test]
    fn compile_and_install_marks_custom() {
        let mut synth = synth();
        synth.select_preset(1).unwrap();
        let canonical = synth.compile_and_install("t&mask").unwrap();
        assert_eq!(canonical, "(t & mask)");
        assert_eq!(synth.current_preset(), None);
        assert_eq!(synth.active_program().as_deref(), Some("(t & mask)"));
    }

    #[test]
    fn failed_compile_keeps_previous_program() {
        let mut synth = synth();
        synth.select_preset(3).unwrap();
        let before = synth.active_program();
        let generation = synth.generation();

        let err = synth.compile_and_install("q").unwrap_err();
        assert!(matches!(err, EngineError::Compile(_)));
        assert_eq!(synth.active_program(), before);
        assert_eq!(synth.current_preset(), Some(3));
        assert_eq!(synth.generation(), generation);
    }

    #[test]
    fn select_preset_validates_range() {
        let mut synth = synth();
        assert!(matches!(
            synth.select_preset(0),
            Err(EngineError::PresetOutOfRange { index: 0, count: 30 })
        ));
        assert!(matches!(
            synth.select_preset(31),
            Err(EngineError::PresetOutOfRange { index: 31, count: 30 })
        ));
        assert_eq!(synth.active_program(), None);

        let name = synth.select_preset(30).unwrap().name.clone();
        assert_eq!(name, "Macro Finale");
        assert_eq!(synth.current_preset(), Some(30));
    }

    #[test]
    fn navigation_wraps() {
        let mut synth = synth();
        synth.select_preset(30).unwrap();
        synth.next_preset().unwrap();
        assert_eq!(synth.current_preset(), Some(1));
        synth.previous_preset().unwrap();
        assert_eq!(synth.current_preset(), Some(30));
    }

    #[test]
    fn navigation_from_custom_starts_at_first() {
        let mut synth = synth();
        synth.compile_and_install("t").unwrap();
        synth.next_preset().unwrap();
        assert_eq!(synth.current_preset(), Some(2));

        synth.compile_and_install("t").unwrap();
        synth.previous_preset().unwrap();
        assert_eq!(synth.current_preset(), Some(30));
    }

    #[test]
    fn empty_bank_reports_no_presets() {
        let mut synth = Synth::new(PresetBank::new(Vec::new()));
        assert!(matches!(synth.next_preset(), Err(EngineError::NoPresets)));
        assert!(matches!(synth.previous_preset(), Err(EngineError::NoPresets)));
    }

    #[test]
    fn broken_user_preset_is_rejected() {
        let bank = PresetBank::new(vec![Preset::new("ok", "t"), Preset::new("bad", "t+")]);
        let mut synth = Synth::new(bank);
        synth.select_preset(1).unwrap();
        assert!(matches!(synth.select_preset(2), Err(EngineError::Compile(_))));
        assert_eq!(synth.current_preset(), Some(1));
        assert_eq!(synth.active_program().as_deref(), Some("t"));
    }

    #[test]
    fn tempo_and_pitch_setters() {
        let synth = synth();
        assert_eq!(synth.set_tempo(20.0), 8.0);
        assert_eq!(synth.set_tempo(0.01), 0.05);
        assert_approx_eq!(synth.set_pitch_semitones(-12.0), 0.5);
        assert_approx_eq!(synth.params().target_pitch(), 0.5);
    }

    #[test]
    fn status_formats_like_console() {
        let mut synth = synth();
        synth.select_preset(1).unwrap();
        synth.set_macro(Macro::Sh, 7.6);
        synth.set_macro(Macro::Mask, 63.2);
        let text = synth.status().to_string();
        assert_eq!(
            text,
            "Preset 1: Viznut Classic 1\n\
             Target tempo x1.000 | target pitch ratio x1.0000\n\
             Macros: a=5.000 b=3.000 c=7.000 d=10.000 sh=8 mask=63"
        );

        synth.compile_and_install("t").unwrap();
        assert!(synth.status().to_string().starts_with("Preset: custom equation\n"));
    }

    #[test]
    fn renderer_is_silent_without_program() {
        let synth = synth();
        let mut renderer = synth.renderer();
        assert!(renderer.render_frames(64).iter().all(|&s| s == 0));
        assert_eq!(renderer.transport().timeline(), 64.0);
    }

    #[test]
    fn renderer_sees_macro_changes() {
        let mut synth = synth();
        synth.compile_and_install("a").unwrap();
        let mut renderer = synth.renderer();
        assert!(renderer.render_frames(4).iter().all(|&s| s == quantize(5.0)));
        synth.set_macro(Macro::A, 200.0);
        assert!(renderer.render_frames(4).iter().all(|&s| s == quantize(200.0)));
    }

    #[test]
    fn shutdown_drops_program() {
        let mut synth = synth();
        synth.select_preset(1).unwrap();
        let mut renderer = synth.renderer();
        synth.shutdown();
        assert!(renderer.render_frames(8).iter().all(|&s| s == 0));
    }
}
