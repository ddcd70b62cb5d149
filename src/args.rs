use clap::Parser;

/// This is a ballot-casting simulator for the terminal.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the ballot layout in JSON format.
    /// If not provided, the built-in KDMC Ward No.16 ballot is used.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) A file of commands to run instead of reading them from the
    /// standard input. Scripts run on a virtual clock: `wait` does not sleep.
    #[clap(short, long, value_parser)]
    pub script: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the final state of the
    /// ballot will be written in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the expected summary in JSON format. If
    /// provided, ballotsim will check that the final state matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, the ballot is only drawn at the end of the session
    /// and on `show`.
    #[clap(long, takes_value = false)]
    pub quiet: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
