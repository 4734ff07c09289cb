use log::{debug, info, warn};

use point_ranking::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use calamine::{open_workbook, DataType, Reader, Xlsx};

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::{Args, Command};
use crate::board::config_reader::*;

pub mod admin;
pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
pub mod io_json;
pub mod poller;
pub mod render;

#[derive(Debug, Snafu)]
pub enum BoardError {
    #[snafu(display("Data file {path} was not found"))]
    SourceUnavailable { path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The worksheet {name:?} does not exist in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("The spreadsheet {path} has no worksheet or no header row"))]
    EmptyExcel { path: String },
    #[snafu(display("Error opening CSV file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    ReadingCsv {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error reading file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON in {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Invalid identifier in {path}: {value}"))]
    ParsingJsonId { path: String, value: String },
    #[snafu(display("Error writing {path}"))]
    WritingSnapshot {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error serializing to JSON"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Unknown provider {provider:?} (expected excel, csv or json)"))]
    UnsupportedSource { provider: String },
    #[snafu(display("Unknown ingestion mode {mode:?} (expected aggregate or snapshot)"))]
    UnsupportedMode { mode: String },
    #[snafu(display("Invalid date {value:?} for {field}, expected YYYY-MM-DDTHH:MM:SS"))]
    ParsingDate {
        source: chrono::ParseError,
        field: String,
        value: String,
    },
    #[snafu(display("No data source: pass --input or --config"))]
    MissingSource {},
    #[snafu(display("The config file {path} has no parent directory"))]
    MissingParentDir { path: String },
    #[snafu(display("Admin commands need a json source, the current source is {provider}"))]
    AdminNeedsSnapshot { provider: String },
    #[snafu(display("Wrong or missing passcode"))]
    AdminLocked {},
    #[snafu(display("Invalid admin input"))]
    AdminInput { source: AdminInputError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

pub type BoardResult<T> = Result<T, BoardError>;

impl BoardError {
    /// The message shown to the user, with the causes and, for a missing
    /// data file, what to do about it.
    pub fn user_message(&self) -> String {
        match self {
            BoardError::SourceUnavailable { path } => format!(
                "Data file {} was not found.\n\
                 To fix this:\n\
                 1. create the spreadsheet (for example ranking.xlsx),\n\
                 2. make sure it has the columns שם (name) and נקודות (points),\n\
                 3. put it at {}",
                io_common::simplify_file_name(path),
                path
            ),
            _ => {
                let mut msg = self.to_string();
                let mut cause = std::error::Error::source(self);
                while let Some(c) = cause {
                    msg.push_str(": ");
                    msg.push_str(&c.to_string());
                    cause = c.source();
                }
                msg
            }
        }
    }
}

/// Where the rows come from.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DataSource {
    Excel {
        path: String,
        worksheet: Option<String>,
    },
    Csv {
        path: String,
    },
    Json {
        path: String,
    },
}

impl DataSource {
    pub fn path(&self) -> &str {
        match self {
            DataSource::Excel { path, .. } => path,
            DataSource::Csv { path } => path,
            DataSource::Json { path } => path,
        }
    }

    pub fn provider(&self) -> &'static str {
        match self {
            DataSource::Excel { .. } => "excel",
            DataSource::Csv { .. } => "csv",
            DataSource::Json { .. } => "json",
        }
    }
}

/// How rows become employees.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Ingestion {
    /// Rows are point events, summed per name.
    Aggregate,
    /// Rows are already totals.
    Snapshot,
}

/// A data source together with the way it is ingested.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DataFeed {
    pub source: DataSource,
    pub ingestion: Ingestion,
    pub rules: AggregationRules,
}

impl DataFeed {
    pub fn load(&self) -> BoardResult<Standings> {
        let path = self.source.path();
        info!(
            "Loading {} from {:?} ({:?})",
            self.source.provider(),
            path,
            self.ingestion
        );
        io_common::ensure_available(path)?;
        let rows = match &self.source {
            DataSource::Excel { path, worksheet } => {
                io_excel::read_excel_rows(path, worksheet.as_deref())?
            }
            DataSource::Csv { path } => io_csv::read_csv_rows(path)?,
            DataSource::Json { path } => {
                let standings = io_json::read_snapshot(path)?;
                info!(
                    "Loaded snapshot: {} employees, {} entries",
                    standings.employees.len(),
                    standings.entries.len()
                );
                return Ok(standings);
            }
        };
        debug!("DataFeed::load: {} rows", rows.len());
        let employees = match self.ingestion {
            Ingestion::Aggregate => aggregate(&rows, &self.rules).into_employees(),
            Ingestion::Snapshot => snapshot(&rows, &self.rules),
        };
        Ok(Standings {
            employees,
            entries: Vec::new(),
            manual_update_time: read_update_time(&rows, &self.rules),
        })
    }
}

/// Everything the board displays, replaced as one unit.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Standings {
    pub employees: Vec<Employee>,
    /// Newest first. Only filled for ledger-backed sources.
    pub entries: Vec<ScoreEvent>,
    pub manual_update_time: Option<String>,
}

impl Standings {
    pub fn to_ledger(&self) -> Ledger {
        Ledger::restore(self.employees.clone(), self.entries.clone())
    }

    pub fn from_ledger(ledger: Ledger, manual_update_time: Option<String>) -> Standings {
        let (employees, entries) = ledger.into_parts();
        Standings {
            employees,
            entries,
            manual_update_time,
        }
    }
}

/// What a reader of the board sees.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct BoardView {
    pub standings: Standings,
    /// The message of the last failed refresh, if the last refresh failed.
    pub error: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// The board state shared between the refresh loop and the commands.
///
/// Writers build a complete new view and swap it in, so readers only ever
/// see whole views.
#[derive(Debug, Clone, Default)]
pub struct SharedBoard {
    inner: Arc<RwLock<Arc<BoardView>>>,
}

impl SharedBoard {
    pub fn new(standings: Standings) -> SharedBoard {
        let board = SharedBoard::default();
        board.publish(BoardView {
            standings,
            error: None,
            refreshed_at: Some(Utc::now()),
        });
        board
    }

    pub fn current(&self) -> Arc<BoardView> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    pub fn publish(&self, view: BoardView) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(view);
    }

    /// Applies the outcome of a refresh. On failure the previous standings
    /// stay and the message is shown next to them.
    pub fn apply_refresh(&self, res: Result<Standings, String>) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let view = match res {
            Ok(standings) => BoardView {
                standings,
                error: None,
                refreshed_at: Some(Utc::now()),
            },
            Err(message) => {
                warn!("Refresh failed: {}", message);
                BoardView {
                    standings: guard.standings.clone(),
                    error: Some(message),
                    refreshed_at: guard.refreshed_at,
                }
            }
        };
        *guard = Arc::new(view);
    }

    /// Runs an edit against the ledger of the current standings and
    /// publishes the result. The write lock is held for the whole edit.
    /// An edit that changes nothing leaves the current view in place.
    pub fn edit<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut Ledger, &mut Option<String>) -> R,
    {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let mut ledger = guard.standings.to_ledger();
        let mut update_time = guard.standings.manual_update_time.clone();
        let res = f(&mut ledger, &mut update_time);
        let standings = Standings::from_ledger(ledger, update_time);
        if standings == guard.standings {
            debug!("SharedBoard::edit: nothing changed");
            return res;
        }
        *guard = Arc::new(BoardView {
            standings,
            error: None,
            refreshed_at: Some(Utc::now()),
        });
        res
    }
}

/// Command line values that take precedence over the configuration file.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Overrides {
    pub input: Option<String>,
    pub input_type: Option<String>,
    pub mode: Option<String>,
    pub excel_worksheet_name: Option<String>,
}

impl Overrides {
    fn from_args(args: &Args) -> Overrides {
        Overrides {
            input: args.input.clone(),
            input_type: args.input_type.clone(),
            mode: args.mode.clone(),
            excel_worksheet_name: args.excel_worksheet_name.clone(),
        }
    }
}

fn read_settings(args: &Args) -> BoardResult<Settings> {
    let overrides = Overrides::from_args(args);
    match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu { path: config_path })?;
            Settings::resolve(Some(config), root, &overrides)
        }
        None => {
            let cwd = PathBuf::from(".");
            Settings::resolve(None, &cwd, &overrides)
        }
    }
}

pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

fn run_show(
    settings: &Settings,
    out: Option<String>,
    reference: Option<String>,
) -> BoardResult<()> {
    let standings = settings.feed.load()?;
    let board = SharedBoard::new(standings);
    let view = board.current();
    let now = now_local();

    println!("{}", render::render_text(&settings.title, &view, &settings.window, now));

    let summary_js = render::build_summary_js(&settings.title, &view, &settings.window, now);
    let pretty_js = serde_json::to_string_pretty(&summary_js).context(SerializingJsonSnafu {})?;

    match out.or_else(|| settings.output_path.clone()) {
        Some(p) if p == "stdout" || p == "-" => {
            println!("{}", pretty_js);
        }
        Some(p) => {
            info!("Writing summary to {:?}", p);
            fs::write(&p, &pretty_js).context(WritingSnapshotSnafu { path: p.clone() })?;
        }
        None => {}
    }

    // The reference summary, if provided for comparison
    if let Some(reference_p) = reference {
        check_reference(&summary_js, &reference_p)?;
    }
    Ok(())
}

// Only the results are compared: the rest of the summary depends on the clock.
fn check_reference(summary_js: &JSValue, reference_path: &str) -> BoardResult<()> {
    let reference = read_summary(reference_path)?;
    let pretty_ref =
        serde_json::to_string_pretty(&reference["results"]).context(SerializingJsonSnafu {})?;
    let pretty_res =
        serde_json::to_string_pretty(&summary_js["results"]).context(SerializingJsonSnafu {})?;
    if pretty_ref != pretty_res {
        warn!("Found differences with the reference file {}", reference_path);
        print_diff(pretty_ref.as_str(), pretty_res.as_str(), "\n");
        whatever!("Difference detected between the leaderboard and the reference summary")
    }
    info!("The leaderboard matches the reference summary");
    Ok(())
}

async fn run_watch(settings: &Settings, interval_secs: Option<u64>) -> BoardResult<()> {
    let interval = interval_secs
        .map(Duration::from_secs)
        .unwrap_or(settings.refresh_interval);
    info!("Watching {:?} every {:?}", settings.feed.source.path(), interval);

    let board = SharedBoard::default();
    let title = settings.title.clone();
    let window = settings.window;
    let poller = poller::Poller::start(
        board.clone(),
        settings.feed.clone(),
        interval,
        move |view: &BoardView| {
            println!("{}", render::render_text(&title, view, &window, now_local()));
        },
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
    }
    info!("Stopping the refresh loop");
    poller.stop().await;
    Ok(())
}

pub async fn run(args: Args) -> BoardResult<()> {
    let settings = read_settings(&args)?;
    debug!("settings: {:?}", settings);
    let passcode = args.passcode.clone();
    let command = args.command.clone().unwrap_or(Command::Show {
        out: None,
        reference: None,
    });

    match command {
        Command::Show { out, reference } => run_show(&settings, out, reference),
        Command::Watch { interval } => run_watch(&settings, interval).await,
        Command::Add {
            name,
            shift,
            alcohol,
            average,
            points,
            reason,
        } => {
            let mut entry = AdminEntry::new(&name).point_values(settings.point_values);
            for (selected, category) in [
                (shift, PointCategory::Shift),
                (alcohol, PointCategory::Alcohol),
                (average, PointCategory::Average),
            ] {
                if selected {
                    entry = entry.select(category);
                }
            }
            if let Some(p) = points {
                entry = entry.custom(p, reason.as_deref().unwrap_or(""));
            }
            let events = admin::add_points(&settings, passcode.as_deref(), &entry)?;
            for e in events.iter() {
                println!("{} {:+} {} ({})", e.id, e.points, name.trim(), e.reason);
            }
            Ok(())
        }
        Command::Delete { entry } => {
            match admin::delete_entry(&settings, passcode.as_deref(), &EntryId(entry.clone()))? {
                Some(e) => println!("Deleted {} ({:+} {})", e.id, e.points, e.reason),
                None => println!("No entry {}", entry),
            }
            Ok(())
        }
        Command::SetTime { time } => {
            admin::set_update_time(&settings, passcode.as_deref(), &time)?;
            println!("Last update set to {:?}", time.trim());
            Ok(())
        }
        Command::History { limit } => {
            let standings = settings.feed.load()?;
            print!("{}", render::render_history(&standings, limit));
            Ok(())
        }
        Command::Export { out } => {
            let standings = settings.feed.load()?;
            io_json::write_snapshot(&out, &standings)?;
            println!("Wrote {}", out);
            Ok(())
        }
    }
}
