//! Console command parsing.

use std::str::FromStr;

use thiserror::Error;

use crate::engine::Macro;

/// One parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `eq <expr>`: compile and install a custom equation.
    Equation(String),
    /// `a|b|c|d|sh|mask <value>`
    SetMacro(Macro, f64),
    /// `pl`
    ListPresets,
    /// `ps <n>`, 1-based.
    SelectPreset(usize),
    /// `pn`
    NextPreset,
    /// `pp`
    PreviousPreset,
    /// `p <semitones>`
    Pitch(f64),
    /// `tm <multiplier>`
    Tempo(f64),
    /// `s`
    Status,
    /// `h`
    Help,
    /// `q`
    Quit,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsoleError {
    #[error("Unknown command '{0}'. Type 'h' for help.")]
    Unknown(String),
    #[error("'{0}' needs an argument. Type 'h' for help.")]
    MissingArgument(&'static str),
    #[error("'{value}' is not a valid number for '{command}'")]
    InvalidNumber { command: &'static str, value: String },
    #[error("'{0}' takes no argument")]
    UnexpectedArgument(&'static str),
}

impl Command {
    /// Parse a line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, ConsoleError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let command = match head {
            "eq" => Command::Equation(required("eq", rest)?.to_string()),
            "pl" => no_argument("pl", rest, Command::ListPresets)?,
            "ps" => Command::SelectPreset(number("ps", rest)?),
            "pn" => no_argument("pn", rest, Command::NextPreset)?,
            "pp" => no_argument("pp", rest, Command::PreviousPreset)?,
            "p" => Command::Pitch(number("p", rest)?),
            "tm" => Command::Tempo(number("tm", rest)?),
            "s" => no_argument("s", rest, Command::Status)?,
            "h" => no_argument("h", rest, Command::Help)?,
            "q" => no_argument("q", rest, Command::Quit)?,
            other => match other.parse::<Macro>() {
                Ok(m) => Command::SetMacro(m, number(m.name(), rest)?),
                Err(_) => return Err(ConsoleError::Unknown(other.to_string())),
            },
        };
        Ok(Some(command))
    }
}

fn required<'a>(command: &'static str, rest: &'a str) -> Result<&'a str, ConsoleError> {
    if rest.is_empty() {
        Err(ConsoleError::MissingArgument(command))
    } else {
        Ok(rest)
    }
}

fn number<T: FromStr>(command: &'static str, rest: &str) -> Result<T, ConsoleError> {
    required(command, rest)?
        .parse()
        .map_err(|_| ConsoleError::InvalidNumber {
            command,
            value: rest.to_string(),
        })
}

fn no_argument(
    command: &'static str,
    rest: &str,
    value: Command,
) -> Result<Command, ConsoleError> {
    if rest.is_empty() {
        Ok(value)
    } else {
        Err(ConsoleError::UnexpectedArgument(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(Command::parse(""), Ok(None));
        assert_eq!(Command::parse("   \t"), Ok(None));
    }

    #[test]
    fn equation_keeps_rest_of_line() {
        assert_eq!(
            parse("eq  return (t>>4) & 255 ;"),
            Command::Equation("return (t>>4) & 255 ;".into())
        );
        assert_eq!(
            Command::parse("eq"),
            Err(ConsoleError::MissingArgument("eq"))
        );
    }

    #[test]
    fn macros() {
        assert_eq!(parse("a 1.5"), Command::SetMacro(Macro::A, 1.5));
        assert_eq!(parse("mask 255"), Command::SetMacro(Macro::Mask, 255.0));
        assert_eq!(parse("sh -2"), Command::SetMacro(Macro::Sh, -2.0));
        assert_eq!(
            Command::parse("d ten"),
            Err(ConsoleError::InvalidNumber {
                command: "d",
                value: "ten".into()
            })
        );
    }

    #[test]
    fn presets_and_transport() {
        assert_eq!(parse("pl"), Command::ListPresets);
        assert_eq!(parse("ps 12"), Command::SelectPreset(12));
        assert_eq!(parse("pn"), Command::NextPreset);
        assert_eq!(parse("pp"), Command::PreviousPreset);
        assert_eq!(parse("p +7"), Command::Pitch(7.0));
        assert_eq!(parse("p -12"), Command::Pitch(-12.0));
        assert_eq!(parse("tm 0.5"), Command::Tempo(0.5));
        assert!(matches!(
            Command::parse("ps x"),
            Err(ConsoleError::InvalidNumber { command: "ps", .. })
        ));
        assert_eq!(Command::parse("tm"), Err(ConsoleError::MissingArgument("tm")));
    }

    #[test]
    fn simple_commands() {
        assert_eq!(parse("s"), Command::Status);
        assert_eq!(parse("h"), Command::Help);
        assert_eq!(parse(" q "), Command::Quit);
        assert_eq!(
            Command::parse("q now"),
            Err(ConsoleError::UnexpectedArgument("q"))
        );
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            Command::parse("play"),
            Err(ConsoleError::Unknown("play".into()))
        );
        assert_eq!(Command::parse("t 5"), Err(ConsoleError::Unknown("t".into())));
    }
}
