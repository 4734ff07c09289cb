// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

use chrono::{DateTime, Utc};

/// A single value read from a data source.
///
/// Spreadsheet readers produce all the variants, CSV readers only produce
/// `Text` and `Empty`.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
    /// A blank cell. Treated the same way as a missing field.
    Empty,
}

impl From<&str> for Cell {
    fn from(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Cell {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(x: i64) -> Cell {
        Cell::Number(x as f64)
    }
}

impl From<f64> for Cell {
    fn from(x: f64) -> Cell {
        Cell::Number(x)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Cell {
        Cell::Bool(b)
    }
}

/// A raw row, as yielded by a data source: a mapping from the name of a
/// field (usually a header cell) to its value.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct RawRow {
    fields: HashMap<String, Cell>,
}

impl RawRow {
    pub fn new() -> RawRow {
        RawRow::default()
    }

    /// Adds a field. Meant for building rows by hand.
    ///
    /// ```
    /// use point_ranking::{Cell, RawRow};
    ///
    /// let row = RawRow::new().with("Name", "Alice").with("Points", 3);
    /// assert_eq!(row.get("Points"), Some(&Cell::Number(3.0)));
    /// ```
    pub fn with(mut self, field: &str, value: impl Into<Cell>) -> RawRow {
        self.insert(field.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, field: String, value: Cell) {
        self.fields.insert(field, value);
    }

    pub fn get(&self, field: &str) -> Option<&Cell> {
        self.fields.get(field)
    }

    /// Resolves a logical field from an ordered list of aliases.
    /// The first alias with a non-empty value wins.
    pub fn lookup(&self, aliases: &[String]) -> Option<&Cell> {
        aliases
            .iter()
            .filter_map(|alias| self.fields.get(alias))
            .find(|cell| !matches!(cell, Cell::Empty))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(|c| matches!(c, Cell::Empty))
    }
}

impl FromIterator<(String, Cell)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (String, Cell)>>(iter: I) -> Self {
        RawRow {
            fields: iter.into_iter().collect(),
        }
    }
}

pub const NAME_FIELDS: [&str; 3] = ["שם", "Name", "name"];
pub const POINTS_FIELDS: [&str; 3] = ["נקודות", "Points", "points"];
pub const UPDATE_TIME_FIELDS: [&str; 3] = ["עדכון", "Update", "Time"];

/// Placeholder used by some exports for rows without a name ("unknown name").
pub const UNKNOWN_NAME: &str = "שם לא ידוע";

/// How rows are read by the aggregator.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AggregationRules {
    /// Aliases of the name column, by priority.
    pub name_fields: Vec<String>,
    /// Aliases of the points column, by priority.
    pub points_fields: Vec<String>,
    /// Aliases of the manual update-time annotation, by priority.
    pub update_time_fields: Vec<String>,
    /// Names equal to this value are dropped.
    pub unknown_name: String,
}

impl Default for AggregationRules {
    fn default() -> Self {
        let owned = |fields: &[&str]| fields.iter().map(|s| s.to_string()).collect();
        AggregationRules {
            name_fields: owned(&NAME_FIELDS),
            points_fields: owned(&POINTS_FIELDS),
            update_time_fields: owned(&UPDATE_TIME_FIELDS),
            unknown_name: UNKNOWN_NAME.to_string(),
        }
    }
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct EmployeeId(pub String);

#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct EntryId(pub String);

impl EmployeeId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl EntryId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for EmployeeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Employee {
    pub id: EmployeeId,
    /// The canonical name, also used for display.
    pub full_name: String,
    pub total_points: i64,
}

/// One grant of points recorded by the ledger.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ScoreEvent {
    pub id: EntryId,
    pub employee_id: EmployeeId,
    pub points: i64,
    /// Free-text tag, for example `shift`.
    pub reason: String,
    pub date: DateTime<Utc>,
}

/// A group of employees sharing the same rank.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankedEntry {
    /// Competition rank, starting at 1.
    pub rank: u32,
    /// Never empty. In input order when there is a tie.
    pub members: Vec<Employee>,
    pub points: i64,
}

impl RankedEntry {
    pub fn is_tie(&self) -> bool {
        self.members.len() > 1
    }
}

// ********* Point categories **********

/// The categories an admin can grant points for.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum PointCategory {
    Shift,
    Alcohol,
    Average,
}

impl PointCategory {
    pub const ALL: [PointCategory; 3] = [
        PointCategory::Shift,
        PointCategory::Alcohol,
        PointCategory::Average,
    ];

    /// The reason tag recorded on the score events.
    pub fn reason(&self) -> &'static str {
        match self {
            PointCategory::Shift => "shift",
            PointCategory::Alcohol => "alcohol",
            PointCategory::Average => "average",
        }
    }

    pub fn from_reason(reason: &str) -> Option<PointCategory> {
        PointCategory::ALL
            .iter()
            .find(|c| c.reason() == reason.trim())
            .copied()
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct PointValues {
    pub shift: i64,
    pub alcohol: i64,
    pub average: i64,
}

impl PointValues {
    pub const DEFAULT_VALUES: PointValues = PointValues {
        shift: 1,
        alcohol: 6,
        average: 6,
    };

    pub fn points(&self, category: PointCategory) -> i64 {
        match category {
            PointCategory::Shift => self.shift,
            PointCategory::Alcohol => self.alcohol,
            PointCategory::Average => self.average,
        }
    }
}

impl Default for PointValues {
    fn default() -> Self {
        PointValues::DEFAULT_VALUES
    }
}

// ********* Errors **********

/// Errors returned by the ledger.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum LedgerError {
    /// The name is empty once trimmed.
    BlankName,
}

impl Error for LedgerError {}

impl Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::BlankName => write!(f, "cannot record points for a blank name"),
        }
    }
}

/// Rejections of the admin form, before anything reaches the ledger.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AdminInputError {
    BlankName,
    NothingSelected,
}

impl Error for AdminInputError {}

impl Display for AdminInputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminInputError::BlankName => write!(f, "the employee name is missing"),
            AdminInputError::NothingSelected => {
                write!(f, "select at least one point category")
            }
        }
    }
}
