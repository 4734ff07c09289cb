use chrono::{NaiveDate, NaiveDateTime};

/// The time left before the deadline, rounded down to the minute.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

/// The period during which points count.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct CompetitionWindow {
    pub start: NaiveDateTime,
    pub deadline: NaiveDateTime,
}

impl CompetitionWindow {
    pub fn new(start: NaiveDateTime, deadline: NaiveDateTime) -> CompetitionWindow {
        CompetitionWindow { start, deadline }
    }

    pub fn is_over(&self, now: NaiveDateTime) -> bool {
        now >= self.deadline
    }

    /// How much of the window has elapsed, between 0 and 100.
    pub fn progress(&self, now: NaiveDateTime) -> f64 {
        if self.is_over(now) {
            return 100.0;
        }
        let total = (self.deadline - self.start).num_milliseconds();
        if total <= 0 {
            return 0.0;
        }
        let elapsed = (now - self.start).num_milliseconds();
        (elapsed as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// `None` once the deadline is reached.
    pub fn time_left(&self, now: NaiveDateTime) -> Option<Countdown> {
        if self.is_over(now) {
            return None;
        }
        let left = self.deadline - now;
        Some(Countdown {
            days: left.num_days(),
            hours: left.num_hours() % 24,
            minutes: left.num_minutes() % 60,
        })
    }
}

impl Default for CompetitionWindow {
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2026, 1, 11).and_then(|d| d.and_hms_opt(0, 0, 0));
        let deadline = NaiveDate::from_ymd_opt(2026, 2, 5).and_then(|d| d.and_hms_opt(23, 59, 59));
        match (start, deadline) {
            (Some(start), Some(deadline)) => CompetitionWindow { start, deadline },
            _ => unreachable!("constant dates are valid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn window() -> CompetitionWindow {
        CompetitionWindow::new(at("2026-01-01T00:00:00"), at("2026-01-11T00:00:00"))
    }

    #[test]
    fn progress_is_linear_and_clamped() {
        let w = window();
        assert_eq!(w.progress(at("2025-12-01T00:00:00")), 0.0);
        assert_eq!(w.progress(at("2026-01-01T00:00:00")), 0.0);
        assert!((w.progress(at("2026-01-06T00:00:00")) - 50.0).abs() < 1e-9);
        assert_eq!(w.progress(at("2026-01-11T00:00:00")), 100.0);
        assert_eq!(w.progress(at("2027-01-01T00:00:00")), 100.0);
    }

    #[test]
    fn countdown() {
        let w = window();
        let left = w.time_left(at("2026-01-09T21:30:00")).unwrap();
        assert_eq!(
            left,
            Countdown {
                days: 1,
                hours: 2,
                minutes: 30
            }
        );
        assert_eq!(w.time_left(at("2026-01-11T00:00:00")), None);
    }

    #[test]
    fn empty_window() {
        let w = CompetitionWindow::new(at("2026-01-11T00:00:00"), at("2026-01-11T00:00:00"));
        assert_eq!(w.progress(at("2026-01-10T00:00:00")), 0.0);
        assert_eq!(w.progress(at("2026-01-11T00:00:00")), 100.0);
    }

    #[test]
    fn default_window() {
        let w = CompetitionWindow::default();
        assert_eq!(w.start, at("2026-01-11T00:00:00"));
        assert_eq!(w.deadline, at("2026-02-05T23:59:59"));
    }
}
