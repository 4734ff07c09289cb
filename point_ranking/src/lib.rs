mod config;

pub mod builder;
pub mod ledger;
pub mod manual;
pub mod window;

use log::{debug, info};

use std::{
    collections::HashMap,
    ops::{Add, AddAssign},
};

pub use crate::builder::{AdminEntry, AdminGate};
pub use crate::config::*;
pub use crate::ledger::Ledger;
pub use crate::window::{CompetitionWindow, Countdown};

// **** Private structures ****

// Sums saturate at the bounds of i64.

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct PointCount(i64);

impl std::iter::Sum for PointCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(PointCount(0), |acc, pc| acc + pc)
    }
}

impl AddAssign for PointCount {
    fn add_assign(&mut self, rhs: PointCount) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Add for PointCount {
    type Output = PointCount;
    fn add(self: PointCount, rhs: PointCount) -> PointCount {
        PointCount(self.0.saturating_add(rhs.0))
    }
}

/// The point totals per canonical name.
///
/// Names are kept in the order in which they were first seen, so that
/// iterating over a tally is deterministic.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PointTally {
    totals: Vec<(String, PointCount)>,
    index: HashMap<String, usize>,
}

impl PointTally {
    pub fn new() -> PointTally {
        PointTally::default()
    }

    /// Adds points to a name, inserting it if it is not known yet.
    pub fn add(&mut self, name: &str, points: i64) {
        match self.index.get(name) {
            Some(idx) => {
                self.totals[*idx].1 += PointCount(points);
            }
            None => {
                self.index.insert(name.to_string(), self.totals.len());
                self.totals.push((name.to_string(), PointCount(points)));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.index.get(name).map(|idx| self.totals[*idx].1 .0)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn total(&self) -> i64 {
        self.totals.iter().map(|(_, pc)| *pc).sum::<PointCount>().0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.totals.iter().map(|(name, pc)| (name.as_str(), pc.0))
    }

    pub fn to_vec(&self) -> Vec<(String, i64)> {
        self.iter().map(|(n, p)| (n.to_string(), p)).collect()
    }

    /// Turns the tally into employees. The ids are the positions in
    /// first-seen order.
    pub fn into_employees(self) -> Vec<Employee> {
        self.totals
            .into_iter()
            .enumerate()
            .map(|(idx, (full_name, pc))| Employee {
                id: EmployeeId(idx.to_string()),
                full_name,
                total_points: pc.0,
            })
            .collect()
    }
}

/// Computes the canonical form of a raw name.
///
/// Returns `None` for blank names and for the unknown-name placeholder.
pub fn normalize(raw: &Cell, unknown_name: &str) -> Option<String> {
    let s = cell_to_string(raw)?;
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == unknown_name {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn cell_to_string(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Text(s) => Some(s.clone()),
        Cell::Number(x) => Some(format_number(*x)),
        Cell::Bool(b) => Some(b.to_string()),
        Cell::Empty => None,
    }
}

// Integral values are printed without a fractional part ("12", not "12.0").
fn format_number(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{}", x)
    }
}

/// Converts the content of a points cell to a number of points.
///
/// This never fails: missing, blank and non-numeric values count as 0.
pub fn coerce_points(cell: Option<&Cell>) -> i64 {
    match cell {
        None | Some(Cell::Empty) => 0,
        Some(Cell::Number(x)) => round_points(*x),
        Some(Cell::Bool(b)) => i64::from(*b),
        Some(Cell::Text(s)) => {
            let t = s.trim();
            if t.is_empty() {
                return 0;
            }
            match t.parse::<f64>() {
                Ok(x) => round_points(x),
                Err(_) => {
                    debug!("coerce_points: not a number: {:?}, counting 0", s);
                    0
                }
            }
        }
    }
}

fn round_points(x: f64) -> i64 {
    if x.is_finite() {
        x.round() as i64
    } else {
        0
    }
}

/// Sums the points of each employee over a sequence of rows.
///
/// Arguments:
/// * `rows` the rows to process. Rows with the same canonical name are summed.
/// * `rules` the field aliases and the unknown-name placeholder.
///
/// Every call starts from an empty tally.
///
/// ```
/// use point_ranking::{aggregate, AggregationRules, RawRow};
///
/// let rows = vec![
///     RawRow::new().with("Name", "Alice").with("Points", 3),
///     RawRow::new().with("Name", " Alice ").with("Points", 5),
///     RawRow::new().with("Name", "Bob").with("Points", 2),
/// ];
/// let tally = aggregate(&rows, &AggregationRules::default());
/// assert_eq!(tally.get("Alice"), Some(8));
/// assert_eq!(tally.get("Bob"), Some(2));
/// ```
pub fn aggregate<'a, I>(rows: I, rules: &AggregationRules) -> PointTally
where
    I: IntoIterator<Item = &'a RawRow>,
{
    let mut tally = PointTally::new();
    let mut num_rows: usize = 0;
    let mut num_dropped: usize = 0;
    for row in rows {
        num_rows += 1;
        let name = match canonical_name(row, rules) {
            Some(name) => name,
            None => {
                num_dropped += 1;
                debug!("aggregate: dropping row without a usable name: {:?}", row);
                continue;
            }
        };
        let points = coerce_points(row.lookup(&rules.points_fields));
        tally.add(&name, points);
    }
    info!(
        "aggregate: {} rows, {} dropped, {} employees",
        num_rows,
        num_dropped,
        tally.len()
    );
    tally
}

/// Reads rows that already carry one total per employee.
///
/// There is no summation: every usable row becomes its own employee, with
/// the row position as id.
pub fn snapshot<'a, I>(rows: I, rules: &AggregationRules) -> Vec<Employee>
where
    I: IntoIterator<Item = &'a RawRow>,
{
    let mut res: Vec<Employee> = Vec::new();
    for (idx, row) in rows.into_iter().enumerate() {
        if let Some(full_name) = canonical_name(row, rules) {
            res.push(Employee {
                id: EmployeeId(idx.to_string()),
                full_name,
                total_points: coerce_points(row.lookup(&rules.points_fields)),
            });
        } else {
            debug!("snapshot: dropping row {}: {:?}", idx, row);
        }
    }
    res
}

fn canonical_name(row: &RawRow, rules: &AggregationRules) -> Option<String> {
    row.lookup(&rules.name_fields)
        .and_then(|cell| normalize(cell, &rules.unknown_name))
}

/// The manual "last updated" annotation. Only the first row is looked at.
pub fn read_update_time<'a, I>(rows: I, rules: &AggregationRules) -> Option<String>
where
    I: IntoIterator<Item = &'a RawRow>,
{
    let first = rows.into_iter().next()?;
    let cell = first.lookup(&rules.update_time_fields)?;
    let s = cell_to_string(cell)?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Ranks employees by points, using standard competition ranking ("1224").
///
/// Employees with the same number of points share a rank, and the next group
/// is ranked after all the members of the groups above it. Within a group,
/// employees keep their input order.
///
/// ```
/// use point_ranking::*;
///
/// let employees: Vec<Employee> = [50, 30, 30, 10]
///     .iter()
///     .enumerate()
///     .map(|(idx, p)| Employee {
///         id: EmployeeId(idx.to_string()),
///         full_name: format!("e{}", idx),
///         total_points: *p,
///     })
///     .collect();
/// let ranks: Vec<u32> = rank(&employees).iter().map(|g| g.rank).collect();
/// assert_eq!(ranks, vec![1, 2, 4]);
/// ```
pub fn rank(employees: &[Employee]) -> Vec<RankedEntry> {
    let mut sorted: Vec<&Employee> = employees.iter().collect();
    // Stable: ties keep their input order.
    sorted.sort_by(|a, b| b.total_points.cmp(&a.total_points));

    let mut res: Vec<RankedEntry> = Vec::new();
    let mut num_above: u32 = 0;
    for e in sorted {
        match res.last_mut() {
            Some(group) if group.points == e.total_points => {
                group.members.push(e.clone());
            }
            _ => {
                res.push(RankedEntry {
                    rank: num_above + 1,
                    members: vec![e.clone()],
                    points: e.total_points,
                });
            }
        }
        num_above += 1;
    }
    debug!(
        "rank: {} employees in {} groups",
        employees.len(),
        res.len()
    );
    res
}

/// Flattens ranked groups into one line per employee, in display order.
pub fn positions(ranked: &[RankedEntry]) -> Vec<(u32, &Employee)> {
    ranked
        .iter()
        .flat_map(|group| group.members.iter().map(move |e| (group.rank, e)))
        .collect()
}
