//! Text console: reads commands line by line and drives a [`Synth`].

pub mod command;

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

pub use command::{Command, ConsoleError};

use crate::engine::{EngineError, Synth};

/// Whether the loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive command surface over any line source and writer.
pub struct Console<'a, W: Write> {
    synth: &'a mut Synth,
    out: W,
    prompt: bool,
}

impl<'a, W: Write> Console<'a, W> {
    pub fn new(synth: &'a mut Synth, out: W) -> Self {
        Self {
            synth,
            out,
            prompt: true,
        }
    }

    /// Disable the `> ` prompt (for scripted input).
    pub fn without_prompt(mut self) -> Self {
        self.prompt = false;
        self
    }

    /// Read commands until `q`, the end of `lines`, or `running` goes false.
    pub fn run<I>(&mut self, lines: I, running: &AtomicBool) -> io::Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        let mut lines = lines.into_iter();
        while running.load(Ordering::Relaxed) {
            if self.prompt {
                write!(self.out, "> ")?;
                self.out.flush()?;
            }
            let Some(line) = lines.next() else {
                break;
            };
            if self.handle_line(&line)? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    /// Parse and execute one line, reporting problems to the output.
    pub fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        match Command::parse(line) {
            Ok(Some(command)) => self.execute(command),
            Ok(None) => Ok(Flow::Continue),
            Err(e) => {
                writeln!(self.out, "{e}")?;
                Ok(Flow::Continue)
            }
        }
    }

    pub fn execute(&mut self, command: Command) -> io::Result<Flow> {
        debug!(?command, "console command");
        match command {
            Command::Equation(text) => match self.synth.compile_and_install(&text) {
                Ok(canonical) => writeln!(self.out, "Program: {canonical}")?,
                Err(e) => writeln!(self.out, "{e}")?,
            },
            Command::SetMacro(m, value) => self.synth.set_macro(m, value),
            Command::ListPresets => self.print_presets()?,
            Command::SelectPreset(index) => {
                let result = self.synth.select_preset(index).map(|p| p.name.clone());
                self.report_preset(result)?;
            }
            Command::NextPreset => {
                let result = self.synth.next_preset().map(|p| p.name.clone());
                self.report_preset(result)?;
            }
            Command::PreviousPreset => {
                let result = self.synth.previous_preset().map(|p| p.name.clone());
                self.report_preset(result)?;
            }
            Command::Pitch(semitones) => {
                let ratio = self.synth.set_pitch_semitones(semitones);
                writeln!(
                    self.out,
                    "Pitch target set: {semitones:.2} semitones (x{ratio:.4})"
                )?;
            }
            Command::Tempo(multiplier) => {
                let tempo = self.synth.set_tempo(multiplier);
                writeln!(self.out, "Tempo target set: x{tempo:.3}")?;
            }
            Command::Status => writeln!(self.out, "{}", self.synth.status())?,
            Command::Help => self.print_help()?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn report_preset(
        &mut self,
        result: Result<String, EngineError>,
    ) -> io::Result<()> {
        match (result, self.synth.current_preset()) {
            (Ok(name), Some(number)) => writeln!(self.out, "Preset {number} selected: {name}"),
            (Ok(name), None) => writeln!(self.out, "Preset selected: {name}"),
            (Err(e), _) => writeln!(self.out, "{e}"),
        }
    }

    fn print_presets(&mut self) -> io::Result<()> {
        writeln!(self.out, "Presets:")?;
        let current = self.synth.current_preset();
        for (i, preset) in self.synth.presets().iter().enumerate() {
            let number = i + 1;
            let marker = if current == Some(number) { '*' } else { ' ' };
            writeln!(self.out, " {marker} {number:2}. {}", preset.name)?;
        }
        Ok(())
    }

    pub fn print_help(&mut self) -> io::Result<()> {
        let count = self.synth.presets().len();
        writeln!(
            self.out,
            "Commands:\n\
             \x20 eq <expr or js program>   Set bytebeat equation\n\
             \x20 a|b|c|d <value>           Set macro (float)\n\
             \x20 sh <value>                Set bit-shift macro (rounded)\n\
             \x20 mask <value>              Set bitmask macro (rounded)\n\
             \x20 pl                        List presets\n\
             \x20 ps <index>                Switch to preset (1..{count})\n\
             \x20 pn                        Next preset\n\
             \x20 pp                        Previous preset\n\
             \x20 p <semitones>             Set pitch shift (e.g. -12, +7)\n\
             \x20 tm <multiplier>           Set tempo multiplier (0.05..8.0)\n\
             \x20 s                         Show current controls\n\
             \x20 h                         Help\n\
             \x20 q                         Quit"
        )
    }
}
