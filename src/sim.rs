use log::{debug, info, warn};

use ballot_simulator::*;
use snafu::{prelude::*, ErrorCompat, Snafu};

use std::fs;
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::sim::config_reader::*;
use crate::sim::io_script::*;
use crate::sim::render::*;

pub mod config_reader;
pub mod io_script;
pub mod render;

#[derive(Debug, Snafu)]
pub enum SimError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the output"))]
    WritingOutput { source: std::io::Error },
    #[snafu(display("Error reading the standard input"))]
    ReadingInput { source: std::io::Error },
    #[snafu(display("Invalid ballot layout: {source}"))]
    InvalidLayout { source: BallotErrors },
    #[snafu(display("line {lineno}: {message}"))]
    ScriptSyntax { lineno: usize, message: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SimResult<T> = Result<T, SimError>;

/// How the simulator clock moves between two commands.
enum SessionClock {
    /// Time only passes with `wait`.
    Virtual,
    /// Time follows the wall clock from the start of the session.
    WallClock(Instant),
}

impl SessionClock {
    /// Catches up with the wall clock. Returns the number of timers that had an effect.
    fn sync(&self, sim: &mut BallotSimulator) -> usize {
        match self {
            SessionClock::Virtual => 0,
            SessionClock::WallClock(start) => {
                let fired = sim.advance_to(Millis(start.elapsed().as_millis() as u64));
                if fired > 0 {
                    debug!("sync: {} timers fired at {}", fired, sim.now());
                }
                fired
            }
        }
    }

    /// How long until the next queued timer is due. Never for the virtual clock.
    fn until_next_timer(&self, sim: &BallotSimulator) -> Option<Duration> {
        match self {
            SessionClock::Virtual => None,
            SessionClock::WallClock(start) => sim.next_deadline().map(|deadline| {
                let elapsed = start.elapsed().as_millis() as u64;
                Duration::from_millis(deadline.0.saturating_sub(elapsed))
            }),
        }
    }

    fn wait(&self, sim: &mut BallotSimulator, span: Millis) {
        match self {
            SessionClock::Virtual => {
                sim.advance_by(span);
            }
            SessionClock::WallClock(_) => {
                thread::sleep(Duration::from_millis(span.0));
                self.sync(sim);
            }
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

type InputLines = Receiver<io::Result<String>>;

/// Reads the standard input line by line on a separate thread.
fn spawn_stdin_reader() -> InputLines {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let failed = line.is_err();
            if tx.send(line).is_err() || failed {
                break;
            }
        }
        debug!("stdin reader: end of input");
    });
    rx
}

/// The simulator and what is needed to draw it.
struct Session<'a> {
    sim: BallotSimulator,
    strings: DisplayStrings,
    clock: SessionClock,
    quiet: bool,
    // The state changed since it was last drawn.
    dirty: bool,
    out: &'a mut dyn Write,
}

impl<'a> Session<'a> {
    fn new(
        layout: &BallotLayout,
        clock: SessionClock,
        quiet: bool,
        out: &'a mut dyn Write,
    ) -> SimResult<Session<'a>> {
        Ok(Session {
            sim: layout.simulator()?,
            strings: layout.display_strings(),
            clock,
            quiet,
            dirty: true,
            out,
        })
    }

    fn draw(&mut self) -> SimResult<()> {
        let txt = render_ballot(&self.sim.snapshot(), &self.strings);
        writeln!(self.out, "{}\n", txt).context(WritingOutputSnafu {})?;
        self.dirty = false;
        Ok(())
    }

    fn prompt(&mut self) -> SimResult<()> {
        write!(self.out, "> ").context(WritingOutputSnafu {})?;
        self.out.flush().context(WritingOutputSnafu {})
    }

    fn sync(&mut self) -> usize {
        let fired = self.clock.sync(&mut self.sim);
        if fired > 0 {
            self.dirty = true;
        }
        fired
    }

    fn execute(&mut self, cmd: &Command) -> SimResult<Flow> {
        self.sync();
        debug!("execute: {:?} at {}", cmd, self.sim.now());
        match cmd {
            Command::Vote(section, candidate) => {
                if let Err(e) = self.sim.cast_vote(*section, *candidate) {
                    // Same as a click on a disabled control: nothing happens.
                    warn!("vote {} {} rejected: {}", section, candidate, e);
                }
            }
            Command::Reset => self.sim.reset(),
            Command::Wait(span) => self.clock.wait(&mut self.sim, *span),
            Command::Show => return self.draw().map(|_| Flow::Continue),
            Command::Status => {
                let line = render_status(&self.sim.snapshot());
                writeln!(self.out, "{}", line).context(WritingOutputSnafu {})?;
                return Ok(Flow::Continue);
            }
            Command::Help => {
                writeln!(self.out, "{}", HELP).context(WritingOutputSnafu {})?;
                return Ok(Flow::Continue);
            }
            Command::Quit => return Ok(Flow::Quit),
        }
        self.dirty = true;
        if !self.quiet {
            self.draw()?;
        }
        Ok(Flow::Continue)
    }

    fn run_script(&mut self, commands: &[(usize, Command)]) -> SimResult<()> {
        for (lineno, cmd) in commands.iter() {
            debug!("run_script: line {}", lineno);
            if let Flow::Quit = self.execute(cmd)? {
                break;
            }
        }
        Ok(())
    }

    /// Executes the lines as they arrive. While waiting for the next line, the
    /// ballot is redrawn each time a timer changes it.
    fn run_interactive(&mut self, input: &InputLines) -> SimResult<()> {
        self.draw()?;
        writeln!(self.out, "{}", HELP).context(WritingOutputSnafu {})?;
        self.prompt()?;
        loop {
            let received = match self.clock.until_next_timer(&self.sim) {
                Some(timeout) => input.recv_timeout(timeout),
                None => input.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(line) => {
                    let line = line.context(ReadingInputSnafu {})?;
                    match parse_command(&line) {
                        Ok(Some(cmd)) => {
                            if let Flow::Quit = self.execute(&cmd)? {
                                return Ok(());
                            }
                        }
                        Ok(None) => {}
                        Err(msg) => {
                            writeln!(self.out, "{} (type `help`)", msg)
                                .context(WritingOutputSnafu {})?;
                        }
                    }
                    self.prompt()?;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.sync() > 0 && !self.quiet {
                        writeln!(self.out).context(WritingOutputSnafu {})?;
                        self.draw()?;
                        self.prompt()?;
                    }
                }
                // End of input.
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }
    }

    /// Draws the final state if it was not drawn already, and summarizes it.
    fn finish(&mut self) -> SimResult<JSValue> {
        self.sync();
        if self.dirty {
            self.draw()?;
        }
        Ok(build_summary_js(&self.strings, &self.sim.snapshot()))
    }
}

fn snapshot_to_json(snapshot: &Snapshot) -> JSValue {
    let mut l: Vec<JSValue> = Vec::new();
    for s in snapshot.sections.iter() {
        let lit: Vec<u32> = s
            .candidates
            .iter()
            .filter(|c| c.lamp == Lamp::Flashing)
            .map(|c| c.id.0)
            .collect();
        l.push(json!({
            "id": s.id.0,
            "status": s.status.to_string(),
            "selected": s.selection.map(|c| c.0),
            "lit": lit
        }));
    }
    json!({
        "time": snapshot.now.0,
        "votesCast": snapshot.votes_cast,
        "completed": snapshot.completed,
        "sections": l
    })
}

pub fn build_summary_js(strings: &DisplayStrings, snapshot: &Snapshot) -> JSValue {
    json!({
        "config": {
            "title": strings.title,
            "sections": snapshot.sections.len()
        },
        "results": snapshot_to_json(snapshot)
    })
}

fn write_summary(out_path: &str, pretty_js: &str) -> SimResult<()> {
    if out_path == "stdout" {
        println!("{}", pretty_js);
    } else {
        info!("Writing summary to {:?}", out_path);
        fs::write(out_path, pretty_js).context(OpeningFileSnafu { path: out_path })?;
    }
    Ok(())
}

fn check_summary(summary_path: &str, pretty_js_stats: &str) -> SimResult<()> {
    let summary_ref = read_summary(summary_path)?;
    info!("summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between the final state and the reference summary")
    }
    Ok(())
}

/// Runs a script against a layout and returns the summary of the final state.
pub fn run_script(
    layout_path: &Option<String>,
    script_path: &str,
    check_summary_path: Option<String>,
    out: &mut dyn Write,
    quiet: bool,
) -> SimResult<JSValue> {
    let layout = read_layout(layout_path)?;
    let commands = read_script(script_path)?;
    info!("Running {} commands from {:?}", commands.len(), script_path);

    let mut session = Session::new(&layout, SessionClock::Virtual, quiet, out)?;
    session.run_script(&commands)?;

    let result_js = session.finish()?;
    if let Some(summary_p) = check_summary_path {
        let pretty_js_stats =
            serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
        check_summary(summary_p.as_str(), pretty_js_stats.as_str())?;
    }
    Ok(result_js)
}

pub fn run_session(args: &Args) -> SimResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let result_js = match &args.script {
        Some(script_path) => run_script(&args.config, script_path, None, &mut out, args.quiet)?,
        None => {
            let layout = read_layout(&args.config)?;
            let mut session = Session::new(
                &layout,
                SessionClock::WallClock(Instant::now()),
                args.quiet,
                &mut out,
            )?;
            let input = spawn_stdin_reader();
            session.run_interactive(&input)?;
            session.finish()?
        }
    };

    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    if let Some(out_path) = &args.out {
        write_summary(out_path, pretty_js_stats.as_str())?;
    }
    if let Some(summary_p) = &args.reference {
        check_summary(summary_p, pretty_js_stats.as_str())?;
    }
    Ok(())
}

fn run_session_test(test_name: &str, script_lpath: &str, summary_lpath: &str) -> SimResult<()> {
    let test_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests");
    info!("Running test {}", test_name);
    run_script(
        &None,
        format!("{}/{}/{}", test_dir, test_name, script_lpath).as_str(),
        Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
        &mut io::sink(),
        false,
    )?;
    Ok(())
}

pub fn test_wrapper(test_name: &str) {
    let res = run_session_test(
        test_name,
        format!("{}_script.txt", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    );
    if let Err(e) = res {
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        panic!("test {} failed: {}", test_name, e);
    }
}
