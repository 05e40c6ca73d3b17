use channel_data::EpgProgramme;

use crate::errors::CommandError;

pub const HELP: &str = "\
commands:
  next | n                       next channel
  prev | p                       previous channel
  line <n> | line + | line -     switch line (1-based) or step to the next/previous one
  goto <name>                    play a channel by name
  timeshift <start_ms> <end_ms>  replay the current channel between two timestamps
  live                           back to the live edge
  reserve <start_ms> <end_ms> <title>
                                 reserve a programme on the current channel, again to cancel
  status | s                     show what is playing
  quit | q";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRequest {
    /// Zero-based line index
    Absolute(i64),
    Relative(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    Line(LineRequest),
    Goto(String),
    Timeshift(EpgProgramme),
    Live,
    Reserve(EpgProgramme),
    Status,
    Help,
    Quit,
}

fn number(arg: Option<&str>, command: &'static str) -> Result<i64, CommandError> {
    let arg = arg.ok_or(CommandError::MissingArgument(command))?;
    arg.parse()
        .map_err(|_| CommandError::InvalidNumber(arg.to_string()))
}

impl Command {
    /// `None` for a blank line
    pub fn parse(input: &str) -> Result<Option<Self>, CommandError> {
        let mut parts = input.split_whitespace();
        let Some(name) = parts.next() else {
            return Ok(None);
        };

        let command = match name.to_lowercase().as_str() {
            "next" | "n" => Command::Next,
            "prev" | "p" => Command::Prev,
            "line" | "l" => match parts.next() {
                Some("+") => Command::Line(LineRequest::Relative(1)),
                Some("-") => Command::Line(LineRequest::Relative(-1)),
                arg => Command::Line(LineRequest::Absolute(number(arg, "line")? - 1)),
            },
            "goto" | "g" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                if name.is_empty() {
                    return Err(CommandError::MissingArgument("goto"));
                }
                Command::Goto(name)
            }
            "timeshift" | "t" => {
                let start = number(parts.next(), "timeshift")?;
                let end = number(parts.next(), "timeshift")?;
                Command::Timeshift(EpgProgramme::new("", start, end))
            }
            "live" => Command::Live,
            "reserve" | "r" => {
                let start = number(parts.next(), "reserve")?;
                let end = number(parts.next(), "reserve")?;
                let title = parts.collect::<Vec<_>>().join(" ");
                if title.is_empty() {
                    return Err(CommandError::MissingArgument("reserve"));
                }
                Command::Reserve(EpgProgramme::new(title, start, end))
            }
            "status" | "s" => Command::Status,
            "help" | "h" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_navigation() {
        assert_eq!(Command::parse("next"), Ok(Some(Command::Next)));
        assert_eq!(Command::parse("  P "), Ok(Some(Command::Prev)));
        assert_eq!(Command::parse(""), Ok(None));
        assert_eq!(
            Command::parse("goto CCTV 1"),
            Ok(Some(Command::Goto("CCTV 1".to_string())))
        );
        assert_eq!(
            Command::parse("goto"),
            Err(CommandError::MissingArgument("goto"))
        );
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            Command::parse("line 2"),
            Ok(Some(Command::Line(LineRequest::Absolute(1))))
        );
        assert_eq!(
            Command::parse("line -"),
            Ok(Some(Command::Line(LineRequest::Relative(-1))))
        );
        assert_eq!(
            Command::parse("line x"),
            Err(CommandError::InvalidNumber("x".to_string()))
        );
        assert_eq!(
            Command::parse("line"),
            Err(CommandError::MissingArgument("line"))
        );
    }

    #[test]
    fn test_parse_programmes() {
        assert_eq!(
            Command::parse("reserve 100 200 Evening News"),
            Ok(Some(Command::Reserve(EpgProgramme::new("Evening News", 100, 200))))
        );
        assert_eq!(
            Command::parse("timeshift 100 200"),
            Ok(Some(Command::Timeshift(EpgProgramme::new("", 100, 200))))
        );
        assert_eq!(
            Command::parse("reserve 100 200"),
            Err(CommandError::MissingArgument("reserve"))
        );
        assert_eq!(
            Command::parse("dance"),
            Err(CommandError::Unknown("dance".to_string()))
        );
    }
}
