use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use std::collections::HashMap;

use crate::config::*;

/// The history of score events, and the employee totals derived from it.
///
/// For every employee, `total_points` is the sum of the points of its events
/// still in the ledger, clamped at zero. The clamp only applies to the
/// published total: the ledger keeps the unclamped sum, so retracting a
/// negative event gives back exactly the total of the remaining events.
/// Each operation updates both the events and the totals within a single
/// `&mut self` call.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ledger {
    employees: Vec<Employee>,
    // Newest first.
    entries: Vec<ScoreEvent>,
    // Unclamped, by employee id.
    sums: HashMap<EmployeeId, i64>,
    next_employee: u64,
    next_entry: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Ledger::new()
    }
}

impl Ledger {
    pub fn new() -> Ledger {
        Ledger {
            employees: Vec::new(),
            entries: Vec::new(),
            sums: HashMap::new(),
            next_employee: 1,
            next_entry: 1,
        }
    }

    /// Rebuilds a ledger from stored employees and events.
    ///
    /// Stored totals are kept as they are: imported data may carry totals
    /// that have no corresponding events. When a stored total is what the
    /// events give, the unclamped sum of the events is used, so a negative
    /// history survives a save and a reload.
    pub fn restore(employees: Vec<Employee>, entries: Vec<ScoreEvent>) -> Ledger {
        let mut event_sums: HashMap<EmployeeId, i64> = HashMap::new();
        for e in entries.iter() {
            if !employees.iter().any(|emp| emp.id == e.employee_id) {
                warn!(
                    "restore: entry {} refers to unknown employee {}",
                    e.id, e.employee_id
                );
            }
            let sum = event_sums.entry(e.employee_id.clone()).or_insert(0);
            *sum = sum.saturating_add(e.points);
        }
        let sums: HashMap<EmployeeId, i64> = employees
            .iter()
            .map(|emp| {
                let from_events = event_sums.get(&emp.id).copied().unwrap_or(0);
                let sum = if from_events.max(0) == emp.total_points {
                    from_events
                } else {
                    debug!(
                        "restore: {} has {} points but its events give {}",
                        emp.full_name, emp.total_points, from_events
                    );
                    emp.total_points
                };
                (emp.id.clone(), sum)
            })
            .collect();
        info!(
            "restore: {} employees, {} entries",
            employees.len(),
            entries.len()
        );
        Ledger {
            next_employee: employees.len() as u64 + 1,
            next_entry: entries.len() as u64 + 1,
            employees,
            entries,
            sums,
        }
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// All the events, newest first.
    pub fn entries(&self) -> &[ScoreEvent] {
        &self.entries
    }

    /// The `n` most recent events.
    pub fn recent(&self, n: usize) -> &[ScoreEvent] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn employee(&self, id: &EmployeeId) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == *id)
    }

    /// Finds an employee by name, after trimming.
    pub fn find_employee(&self, name: &str) -> Option<&Employee> {
        let name = name.trim();
        self.employees.iter().find(|e| e.full_name == name)
    }

    pub fn into_parts(self) -> (Vec<Employee>, Vec<ScoreEvent>) {
        (self.employees, self.entries)
    }

    /// Records points for an employee, creating the employee if needed.
    pub fn add_score(
        &mut self,
        name: &str,
        points: i64,
        reason: &str,
    ) -> Result<(Employee, ScoreEvent), LedgerError> {
        self.add_score_at(name, points, reason, Utc::now())
    }

    pub fn add_score_at(
        &mut self,
        name: &str,
        points: i64,
        reason: &str,
        date: DateTime<Utc>,
    ) -> Result<(Employee, ScoreEvent), LedgerError> {
        let full_name = name.trim();
        if full_name.is_empty() {
            return Err(LedgerError::BlankName);
        }

        let emp_idx = match self.employees.iter().position(|e| e.full_name == full_name) {
            Some(idx) => idx,
            None => {
                let id = self.fresh_employee_id();
                debug!("add_score: new employee {} {:?}", id, full_name);
                self.sums.insert(id.clone(), 0);
                self.employees.push(Employee {
                    id,
                    full_name: full_name.to_string(),
                    total_points: 0,
                });
                self.employees.len() - 1
            }
        };

        let event = ScoreEvent {
            id: self.fresh_entry_id(),
            employee_id: self.employees[emp_idx].id.clone(),
            points,
            reason: reason.to_string(),
            date,
        };
        self.entries.insert(0, event.clone());

        let employee = &mut self.employees[emp_idx];
        let sum = self.sums.entry(employee.id.clone()).or_insert(0);
        *sum = sum.saturating_add(points);
        employee.total_points = (*sum).max(0);
        info!(
            "add_score: {} {:+} ({}) -> {}",
            employee.full_name, points, reason, employee.total_points
        );
        Ok((employee.clone(), event))
    }

    /// Retracts an event and takes its points back from the employee.
    ///
    /// Retracting an unknown event does nothing. The total never goes
    /// below zero.
    pub fn delete_entry(&mut self, entry_id: &EntryId) -> Option<ScoreEvent> {
        let idx = match self.entries.iter().position(|e| e.id == *entry_id) {
            Some(idx) => idx,
            None => {
                debug!("delete_entry: no entry {}", entry_id);
                return None;
            }
        };
        let event = self.entries.remove(idx);
        match self
            .employees
            .iter_mut()
            .find(|e| e.id == event.employee_id)
        {
            Some(employee) => {
                let sum = self.sums.entry(employee.id.clone()).or_insert(0);
                *sum = sum.saturating_sub(event.points);
                employee.total_points = (*sum).max(0);
                info!(
                    "delete_entry: {} {:+} retracted -> {}",
                    employee.full_name, event.points, employee.total_points
                );
            }
            None => {
                warn!(
                    "delete_entry: entry {} belongs to unknown employee {}",
                    event.id, event.employee_id
                );
            }
        }
        Some(event)
    }

    fn fresh_employee_id(&mut self) -> EmployeeId {
        loop {
            let id = EmployeeId(format!("emp-{:06}", self.next_employee));
            self.next_employee += 1;
            if self.employee(&id).is_none() {
                return id;
            }
        }
    }

    fn fresh_entry_id(&mut self) -> EntryId {
        loop {
            let id = EntryId(format!("entry-{:06}", self.next_entry));
            self.next_entry += 1;
            if !self.entries.iter().any(|e| e.id == id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn assert_consistent(ledger: &Ledger) {
        for emp in ledger.employees() {
            let sum: i64 = ledger
                .entries()
                .iter()
                .filter(|e| e.employee_id == emp.id)
                .map(|e| e.points)
                .sum();
            assert_eq!(emp.total_points, sum.max(0), "employee {:?}", emp);
            assert!(emp.total_points >= 0);
        }
    }

    #[test]
    fn add_creates_employee() {
        let mut ledger = Ledger::new();
        let (emp, event) = ledger.add_score("  Alice ", 6, "alcohol").unwrap();
        assert_eq!(emp.full_name, "Alice");
        assert_eq!(emp.total_points, 6);
        assert_eq!(event.employee_id, emp.id);
        assert_eq!(event.reason, "alcohol");

        let (emp2, _) = ledger.add_score("Alice", 1, "shift").unwrap();
        assert_eq!(emp2.id, emp.id);
        assert_eq!(emp2.total_points, 7);
        assert_eq!(ledger.employees().len(), 1);
        assert_consistent(&ledger);
    }

    #[test]
    fn first_ids_start_at_one() {
        let mut ledger = Ledger::new();
        let (emp, event) = ledger.add_score("A", 1, "shift").unwrap();
        assert_eq!(emp.id.as_str(), "emp-000001");
        assert_eq!(event.id.as_str(), "entry-000001");
        assert_eq!(Ledger::default(), Ledger::new());
    }

    #[test]
    fn retracting_a_negative_event_restores_the_sum() {
        let mut ledger = Ledger::new();
        ledger.add_score("A", 3, "shift").unwrap();
        let (emp, negative) = ledger.add_score("A", -5, "correction").unwrap();
        assert_eq!(emp.total_points, 0);
        ledger.delete_entry(&negative.id);
        assert_eq!(ledger.find_employee("A").unwrap().total_points, 3);
        assert_consistent(&ledger);
    }

    #[test]
    fn negative_history_survives_a_reload() {
        let mut ledger = Ledger::new();
        ledger.add_score("A", 3, "shift").unwrap();
        let (_, negative) = ledger.add_score("A", -5, "correction").unwrap();
        let (employees, entries) = ledger.into_parts();
        let mut ledger = Ledger::restore(employees, entries);
        ledger.delete_entry(&negative.id);
        assert_eq!(ledger.find_employee("A").unwrap().total_points, 3);
        assert_consistent(&ledger);
    }

    #[test]
    fn huge_points_saturate() {
        let mut ledger = Ledger::new();
        ledger.add_score("A", i64::MAX, "import").unwrap();
        let (emp, _) = ledger.add_score("A", 1, "shift").unwrap();
        assert_eq!(emp.total_points, i64::MAX);
        let (emp, _) = ledger.add_score("B", i64::MIN, "import").unwrap();
        assert_eq!(emp.total_points, 0);
        let (emp, _) = ledger.add_score("B", -1, "import").unwrap();
        assert_eq!(emp.total_points, 0);
    }

    #[test]
    fn history_is_newest_first() {
        let mut ledger = Ledger::new();
        let (_, first) = ledger.add_score("A", 1, "shift").unwrap();
        let (_, second) = ledger.add_score("B", 6, "average").unwrap();
        assert_eq!(ledger.entries()[0].id, second.id);
        assert_eq!(ledger.entries()[1].id, first.id);
        assert_eq!(ledger.recent(1).len(), 1);
        assert_eq!(ledger.recent(10).len(), 2);
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.add_score("   ", 1, "shift"), Err(LedgerError::BlankName));
        assert!(ledger.employees().is_empty());
        assert!(ledger.entries().is_empty());
    }

    #[test]
    fn delete_unknown_entry_is_noop() {
        let mut ledger = Ledger::new();
        ledger.add_score("A", 3, "x").unwrap();
        let before = ledger.clone();
        assert_eq!(ledger.delete_entry(&EntryId("nope".to_string())), None);
        assert_eq!(ledger, before);
    }

    #[test]
    fn delete_twice_does_not_go_below_zero() {
        let mut ledger = Ledger::new();
        let (_, event) = ledger.add_score("A", 3, "x").unwrap();
        assert!(ledger.delete_entry(&event.id).is_some());
        assert!(ledger.delete_entry(&event.id).is_none());
        let emp = ledger.find_employee("A").unwrap();
        assert_eq!(emp.total_points, 0);
        assert_consistent(&ledger);
    }

    #[test]
    fn retraction_clamps_imported_totals() {
        let emp = Employee {
            id: EmployeeId("7".to_string()),
            full_name: "Gal".to_string(),
            total_points: 2,
        };
        let event = ScoreEvent {
            id: EntryId("e1".to_string()),
            employee_id: emp.id.clone(),
            points: 5,
            reason: "average".to_string(),
            date: Utc::now(),
        };
        let mut ledger = Ledger::restore(vec![emp], vec![event]);
        ledger.delete_entry(&EntryId("e1".to_string()));
        assert_eq!(ledger.find_employee("Gal").unwrap().total_points, 0);
        assert!(ledger.entries().is_empty());
    }

    #[test]
    fn retraction_for_missing_employee_is_silent() {
        let event = ScoreEvent {
            id: EntryId("e1".to_string()),
            employee_id: EmployeeId("ghost".to_string()),
            points: 5,
            reason: "shift".to_string(),
            date: Utc::now(),
        };
        let mut ledger = Ledger::restore(vec![], vec![event]);
        assert!(ledger.delete_entry(&EntryId("e1".to_string())).is_some());
        assert!(ledger.entries().is_empty());
        assert!(ledger.employees().is_empty());
    }

    #[test]
    fn negative_points_clamp_at_zero() {
        let mut ledger = Ledger::new();
        let (emp, _) = ledger.add_score("A", -4, "correction").unwrap();
        assert_eq!(emp.total_points, 0);
    }

    #[test]
    fn restored_ids_are_not_reused() {
        let emp = Employee {
            id: EmployeeId("emp-000002".to_string()),
            full_name: "Old".to_string(),
            total_points: 10,
        };
        let mut ledger = Ledger::restore(vec![emp], vec![]);
        let (a, _) = ledger.add_score("New", 1, "shift").unwrap();
        let (b, _) = ledger.add_score("Newer", 1, "shift").unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.id.as_str() != "emp-000002" && b.id.as_str() != "emp-000002");
        assert_eq!(ledger.find_employee("Old").unwrap().total_points, 10);
    }

    #[test]
    fn employees_are_kept_at_zero() {
        let mut ledger = Ledger::new();
        let (_, event) = ledger.add_score("A", 1, "shift").unwrap();
        ledger.delete_entry(&event.id);
        assert_eq!(ledger.employees().len(), 1);
    }

    #[test]
    fn totals_match_events_over_random_sequences() {
        let mut rng = StdRng::seed_from_u64(42);
        let names = ["Alice", "Bob", "Carol", "Dan"];
        for _ in 0..100 {
            let mut ledger = Ledger::new();
            for _ in 0..rng.gen_range(1..60) {
                if rng.gen_bool(0.6) || ledger.entries().is_empty() {
                    let name = names[rng.gen_range(0..names.len())];
                    let points = [1, 6, 6, 3, 0, -2, -5, -8][rng.gen_range(0..8)];
                    ledger.add_score(name, points, "shift").unwrap();
                } else {
                    // Sometimes retract an id that does not exist, or twice.
                    let id = if rng.gen_bool(0.1) {
                        EntryId("missing".to_string())
                    } else {
                        let idx = rng.gen_range(0..ledger.entries().len());
                        ledger.entries()[idx].id.clone()
                    };
                    ledger.delete_entry(&id);
                    ledger.delete_entry(&id);
                }
                assert_consistent(&ledger);
                if rng.gen_bool(0.1) {
                    let (employees, entries) = ledger.clone().into_parts();
                    ledger = Ledger::restore(employees, entries);
                }
            }
        }
    }
}
