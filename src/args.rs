use clap::{Parser, Subcommand};

/// This is a leaderboard for employee point competitions.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The configuration file, in JSON. Relative paths in this file are
    /// resolved from its directory. See the documentation of point_ranking::manual for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The data file. Setting this option overrides the path that may be specified
    /// with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (excel, csv or json) The type of the input. By default, it is guessed from the extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default aggregate) How the rows are read: 'aggregate' sums the rows of each employee,
    /// 'snapshot' takes each row as a total.
    #[clap(long, value_parser)]
    pub mode: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use. The first worksheet
    /// is used otherwise.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// The admin passcode, for the commands that change the data.
    #[clap(long, value_parser)]
    pub passcode: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// (default) Prints the board.
    Show {
        /// (file path, 'stdout' or empty) If specified, the summary of the board will be written in
        /// JSON format to the given location. Overrides the outputPath of the configuration.
        #[clap(short, long, value_parser)]
        out: Option<String>,
        /// (file path) A reference summary in JSON format. If provided, the results are checked
        /// against it.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
    /// Reloads and prints the board on a fixed interval, until Ctrl-C.
    Watch {
        /// (seconds, default 300) Overrides refreshIntervalSeconds of the configuration.
        #[clap(long, value_parser)]
        interval: Option<u64>,
    },
    /// Grants points to an employee. The employee is created if needed.
    Add {
        #[clap(short, long, value_parser)]
        name: String,
        #[clap(long, takes_value = false)]
        shift: bool,
        #[clap(long, takes_value = false)]
        alcohol: bool,
        #[clap(long, takes_value = false)]
        average: bool,
        /// An arbitrary amount of points, may be negative.
        #[clap(long, value_parser, allow_hyphen_values = true)]
        points: Option<i64>,
        /// The reason recorded with --points (default 'manual').
        #[clap(long, value_parser)]
        reason: Option<String>,
    },
    /// Retracts a score event, given its id (see the history command).
    Delete {
        #[clap(short, long, value_parser)]
        entry: String,
    },
    /// Sets the "last update" text shown on the board. An empty text clears it.
    SetTime {
        #[clap(value_parser)]
        time: String,
    },
    /// Prints the most recent score events.
    History {
        #[clap(short, long, value_parser, default_value_t = 10)]
        limit: usize,
    },
    /// Writes the current standings as a JSON snapshot file.
    Export {
        #[clap(short, long, value_parser)]
        out: String,
    },
}
