// Primitives for reading session commands.

use std::fs;

use ballot_simulator::{CandidateId, Millis, SectionId};

use crate::sim::*;

/// A user intent, as typed in the terminal or read from a script.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Command {
    Vote(SectionId, CandidateId),
    Reset,
    Wait(Millis),
    Show,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  vote <section> <candidate>   cast the vote of a section
  reset                        clear all the votes
  wait <ms>                    let time pass
  show                         draw the ballot
  status                       print the status of each section
  help                         print this message
  quit                         leave the simulator";

/// Parses one line. Blank lines and comments (starting with `#`) give `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    };
    let words: Vec<&str> = line.split_whitespace().collect();
    let cmd = match words.as_slice() {
        [] => return Ok(None),
        ["vote", s, c] => Command::Vote(SectionId(parse_int(s)?), CandidateId(parse_int(c)?)),
        ["vote", ..] => return Err("usage: vote <section> <candidate>".to_string()),
        ["wait", ms] => Command::Wait(Millis(parse_int(ms)?)),
        ["wait", ..] => return Err("usage: wait <ms>".to_string()),
        ["reset"] => Command::Reset,
        ["show"] => Command::Show,
        ["status"] => Command::Status,
        ["help"] => Command::Help,
        ["quit"] | ["exit"] => Command::Quit,
        [x, ..] => return Err(format!("unknown command {:?}", x)),
    };
    Ok(Some(cmd))
}

fn parse_int<T: std::str::FromStr>(s: &str) -> Result<T, String> {
    s.parse::<T>()
        .map_err(|_| format!("expected a number, got {:?}", s))
}

/// Reads a whole script. Each command comes with its (1-based) line number.
pub fn read_script(path: &str) -> SimResult<Vec<(usize, Command)>> {
    info!("Attempting to read script file {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    parse_script(&contents)
}

pub fn parse_script(contents: &str) -> SimResult<Vec<(usize, Command)>> {
    let mut res: Vec<(usize, Command)> = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let lineno = idx + 1;
        match parse_command(line) {
            Ok(Some(cmd)) => {
                debug!("read_script: line {}: {:?}", lineno, cmd);
                res.push((lineno, cmd));
            }
            Ok(None) => {}
            Err(message) => return ScriptSyntaxSnafu { lineno, message }.fail(),
        }
    }
    Ok(res)
}
