pub use crate::config::*;
use crate::ledger::Ledger;

/// The admin form for granting points.
///
/// Validates the input before anything reaches the ledger, then records one
/// event per selected category.
///
/// ```
/// use point_ranking::{AdminEntry, Ledger, PointCategory};
/// # use point_ranking::AdminInputError;
///
/// let mut ledger = Ledger::new();
/// let events = AdminEntry::new("Noa")
///     .select(PointCategory::Shift)
///     .select(PointCategory::Average)
///     .submit(&mut ledger)?;
///
/// assert_eq!(events.len(), 2);
/// assert_eq!(ledger.find_employee("Noa").unwrap().total_points, 7);
/// # Ok::<(), AdminInputError>(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AdminEntry {
    name: String,
    categories: Vec<PointCategory>,
    custom: Vec<(i64, String)>,
    values: PointValues,
}

impl AdminEntry {
    pub fn new(name: &str) -> AdminEntry {
        AdminEntry {
            name: name.to_string(),
            categories: Vec::new(),
            custom: Vec::new(),
            values: PointValues::DEFAULT_VALUES,
        }
    }

    /// Overrides the points granted for each category.
    pub fn point_values(self, values: PointValues) -> AdminEntry {
        AdminEntry { values, ..self }
    }

    pub fn select(mut self, category: PointCategory) -> AdminEntry {
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
        self
    }

    /// Flips the selection of a category.
    pub fn toggle(&mut self, category: PointCategory) {
        if let Some(idx) = self.categories.iter().position(|c| *c == category) {
            self.categories.remove(idx);
        } else {
            self.categories.push(category);
        }
    }

    /// Adds an arbitrary amount of points, outside of the fixed categories.
    pub fn custom(mut self, points: i64, reason: &str) -> AdminEntry {
        let reason = match reason.trim() {
            "" => "manual",
            r => r,
        };
        self.custom.push((points, reason.to_string()));
        self
    }

    pub fn validate(&self) -> Result<(), AdminInputError> {
        if self.name.trim().is_empty() {
            return Err(AdminInputError::BlankName);
        }
        if self.categories.is_empty() && self.custom.is_empty() {
            return Err(AdminInputError::NothingSelected);
        }
        Ok(())
    }

    /// Records the entry. Categories are recorded in a fixed order (shift,
    /// alcohol, average), then the custom amounts.
    pub fn submit(&self, ledger: &mut Ledger) -> Result<Vec<ScoreEvent>, AdminInputError> {
        self.validate()?;
        let mut events: Vec<ScoreEvent> = Vec::new();
        for category in PointCategory::ALL {
            if self.categories.contains(&category) {
                let (_, event) = ledger
                    .add_score(&self.name, self.values.points(category), category.reason())
                    .map_err(|_| AdminInputError::BlankName)?;
                events.push(event);
            }
        }
        for (points, reason) in self.custom.iter() {
            let (_, event) = ledger
                .add_score(&self.name, *points, reason)
                .map_err(|_| AdminInputError::BlankName)?;
            events.push(event);
        }
        Ok(events)
    }
}

/// The passcode prompt in front of the admin commands.
///
/// This is a speed-bump against accidental edits, not a security boundary:
/// the passcode is stored in clear in the configuration and compared as is.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AdminGate {
    passcode: String,
}

impl AdminGate {
    pub fn new(passcode: &str) -> AdminGate {
        AdminGate {
            passcode: passcode.to_string(),
        }
    }

    pub fn check(&self, attempt: &str) -> bool {
        self.passcode == attempt
    }
}
