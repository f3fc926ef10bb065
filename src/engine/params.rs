//! Parameter store: macro values and tempo/pitch targets shared between the
//! control surface and the render thread, plus the render-side smoothing.
//!
//! Every field is an independent relaxed atomic. A reader may observe one
//! field updated and another not yet; each value only affects the next
//! sample, so no cross-field consistency is needed.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Per-sample exponential approach rate toward the target.
pub const SMOOTHING_COEFF: f64 = 0.0008;
/// Smoothed tempo never drops below this, so the timeline keeps moving.
pub const MIN_SMOOTHED_TEMPO: f64 = 0.05;
/// Smoothed pitch never drops below this.
pub const MIN_SMOOTHED_PITCH: f64 = 0.125;
/// Range accepted for the tempo target.
pub const TEMPO_RANGE: (f64, f64) = (0.05, 8.0);

/// An `f64` stored as bits in an [`AtomicU64`].
#[derive(Debug)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// A live-editable macro parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Macro {
    A,
    B,
    C,
    D,
    /// Integer-flavored; rounded when the evaluation context is built.
    Sh,
    /// Integer-flavored; rounded when the evaluation context is built.
    Mask,
}

impl Macro {
    pub const ALL: [Macro; 6] = [Macro::A, Macro::B, Macro::C, Macro::D, Macro::Sh, Macro::Mask];

    pub fn name(self) -> &'static str {
        match self {
            Macro::A => "a",
            Macro::B => "b",
            Macro::C => "c",
            Macro::D => "d",
            Macro::Sh => "sh",
            Macro::Mask => "mask",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Macro::Sh | Macro::Mask)
    }
}

impl FromStr for Macro {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Macro::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| format!("unknown macro '{s}'"))
    }
}

impl fmt::Display for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A point-in-time copy of all macro values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroValues {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub sh: f64,
    pub mask: f64,
}

impl MacroValues {
    pub fn get(&self, m: Macro) -> f64 {
        match m {
            Macro::A => self.a,
            Macro::B => self.b,
            Macro::C => self.c,
            Macro::D => self.d,
            Macro::Sh => self.sh,
            Macro::Mask => self.mask,
        }
    }

    pub fn set(&mut self, m: Macro, value: f64) {
        match m {
            Macro::A => self.a = value,
            Macro::B => self.b = value,
            Macro::C => self.c = value,
            Macro::D => self.d = value,
            Macro::Sh => self.sh = value,
            Macro::Mask => self.mask = value,
        }
    }
}

impl Default for MacroValues {
    fn default() -> Self {
        Self {
            a: 5.0,
            b: 3.0,
            c: 7.0,
            d: 10.0,
            sh: 8.0,
            mask: 127.0,
        }
    }
}

/// Shared macro and target values.
#[derive(Debug)]
pub struct ParameterStore {
    a: AtomicF64,
    b: AtomicF64,
    c: AtomicF64,
    d: AtomicF64,
    sh: AtomicF64,
    mask: AtomicF64,
    tempo: AtomicF64,
    pitch: AtomicF64,
}

impl ParameterStore {
    pub fn new(macros: MacroValues) -> Self {
        Self {
            a: AtomicF64::new(macros.a),
            b: AtomicF64::new(macros.b),
            c: AtomicF64::new(macros.c),
            d: AtomicF64::new(macros.d),
            sh: AtomicF64::new(macros.sh),
            mask: AtomicF64::new(macros.mask),
            tempo: AtomicF64::new(1.0),
            pitch: AtomicF64::new(1.0),
        }
    }

    fn slot(&self, m: Macro) -> &AtomicF64 {
        match m {
            Macro::A => &self.a,
            Macro::B => &self.b,
            Macro::C => &self.c,
            Macro::D => &self.d,
            Macro::Sh => &self.sh,
            Macro::Mask => &self.mask,
        }
    }

    pub fn macro_value(&self, m: Macro) -> f64 {
        self.slot(m).load()
    }

    /// Store a macro as-is; integer macros are rounded only at read time.
    pub fn set_macro(&self, m: Macro, value: f64) {
        self.slot(m).store(value);
    }

    pub fn macros(&self) -> MacroValues {
        MacroValues {
            a: self.a.load(),
            b: self.b.load(),
            c: self.c.load(),
            d: self.d.load(),
            sh: self.sh.load(),
            mask: self.mask.load(),
        }
    }

    pub fn target_tempo(&self) -> f64 {
        self.tempo.load()
    }

    /// Set the tempo multiplier target, clamped to [`TEMPO_RANGE`].
    /// Returns the stored value.
    pub fn set_target_tempo(&self, tempo: f64) -> f64 {
        let tempo = if tempo.is_nan() {
            1.0
        } else {
            tempo.clamp(TEMPO_RANGE.0, TEMPO_RANGE.1)
        };
        self.tempo.store(tempo);
        tempo
    }

    /// Pitch target as a frequency ratio.
    pub fn target_pitch(&self) -> f64 {
        self.pitch.load()
    }

    pub fn set_target_pitch(&self, ratio: f64) {
        self.pitch.store(ratio);
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(MacroValues::default())
    }
}

/// Convert a semitone offset to a frequency ratio.
pub fn semitones_to_ratio(semitones: f64) -> f64 {
    2f64.powf(semitones / 12.0)
}

/// Round to nearest with halves going up: `floor(x + 0.5)`.
#[inline]
pub fn round_macro(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Render-side exponential smoother with a lower bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoother {
    value: f64,
    floor: f64,
}

impl Smoother {
    pub fn new(initial: f64, floor: f64) -> Self {
        Self {
            value: initial.max(floor),
            floor,
        }
    }

    /// Move one sample toward `target` and return the new value.
    #[inline]
    pub fn step(&mut self, target: f64) -> f64 {
        self.value += (target - self.value) * SMOOTHING_COEFF;
        if self.value.is_nan() || self.value < self.floor {
            self.value = self.floor;
        }
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}
