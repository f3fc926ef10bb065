//! Built-in bytebeat presets.
//!
//! Presets are plain source text, compiled exactly like user input.

use serde::{Deserialize, Serialize};

/// A named expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub source: String,
}

impl Preset {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

pub const BUILTIN_PRESETS: &[(&str, &str)] = &[
    ("Viznut Classic 1", "(t*(t>>a|t>>b))>>(t>>d)"),
    ("Viznut Classic 2", "t*(((t>>(a+d))|(t>>b))&((a*b)&(t>>c)))"),
    ("Viznut Classic 3", "(t*a&t>>b)|(t*c&t>>d)"),
    ("Crowd Pleaser 1", "(t>>a|t|t>>(t>>d))*b+((t>>c)&a)"),
    ("Crowd Pleaser 2", "t*(t>>a&t>>b&(a*c+d)&t>>c)"),
    ("Crowd Pleaser 3", "(t*(a+d)&t>>c|t*a&t>>b|t*c&t/(128*d))-1"),
    ("Bit Groove 1", "((t>>b)|(t>>c))*a+d*(t&t>>(a+d)|t>>c)"),
    ("Bit Groove 2", "t*(((t>>a)|(t>>(b+d)))&((a*5)&(t>>c)))"),
    ("Bit Groove 3", "t*(((t>>(a+2))&(t>>b))&((a*b*c)&(t>>d)))"),
    ("Drone Shift", "((t>>a)|(t>>b))*(t>>d)"),
    ("Chiptune Pulse", "(t>>c)|(t*a&(t>>d))"),
    ("Xor Bells", "((t>>d)^(t>>(d+1)))*(t&(a*b*c*d))"),
    ("Dual Arp", "((t*a)&(t>>(b+2)))|((t*c)&(t>>d))"),
    ("Modulo Melody", "((t>>(b+d))|(t%(a*c+d)))*(t%(a+b+c+d))"),
    ("Harsh Lead", "((t*(a+b+d))&(t>>b))^((t*c)&(t>>d))"),
    ("Sub Octaves", "((t>>a)*(t>>a)|(t>>c)|(t>>b))"),
    ("Detuned Saw", "((t*(a+b+d))&(t>>b))|((t*(c+d+a))&(t>>d))"),
    ("Clock Crunch", "((t>>b)&(t>>c))*t*a"),
    ("Stacked Bits", "((t*c)&(t>>d))|((t*a)&(t>>b))|((t*(a+b))&(t>>(b+d)))"),
    ("Riser Noise", "(t>>b)*(t>>a|t>>(c+d))"),
    ("Mask Jam", "(t*((t>>a)|(t>>(b+d))))&(a*b*c*d)"),
    ("Metal Ping", "(t*((a*b)&(t>>d)))^(t>>(b+d))"),
    ("Tri-Xor", "((t>>a)^(t>>b)^(t>>d))*t*c"),
    ("Macro Stack", "((t*a)&(t>>c))|((t*b)&(t>>d))"),
    ("Macro Shift Gate", "(t*(a&(t>>c)))|((t>>d)&b)"),
    ("Macro Cross", "((t>>a)|(t>>b))*(c+(t>>d))"),
    ("Macro Ternary", "(t>>a)?((t*b)&(t>>c)):((t*d)&(t>>b))"),
    ("Macro Xor Arp", "((t*a)^(t>>b))|((t*c)&(t>>d))"),
    ("Macro Bitsaw", "((t*(a+b))&(t>>(c+1)))|((t*(d+1))&(t>>a))"),
    ("Macro Finale", "((t*a&t>>b)|(t*c&t>>d))+(sin(t/(20+d))*32)"),
];

/// Ordered list of presets: the built-ins followed by any user presets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetBank {
    presets: Vec<Preset>,
}

impl PresetBank {
    pub fn new(presets: Vec<Preset>) -> Self {
        Self { presets }
    }

    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_PRESETS
                .iter()
                .map(|&(name, source)| Preset::new(name, source))
                .collect(),
        )
    }

    /// Built-ins plus `extra` appended in order.
    pub fn with_user_presets(extra: impl IntoIterator<Item = Preset>) -> Self {
        let mut bank = Self::builtin();
        bank.presets.extend(extra);
        bank
    }

    /// Zero-based lookup.
    pub fn get(&self, index: usize) -> Option<&Preset> {
        self.presets.get(index)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }
}

impl Default for PresetBank {
    fn default() -> Self {
        Self::builtin()
    }
}
