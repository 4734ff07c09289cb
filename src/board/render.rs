use std::fmt::Write;

use crate::board::*;

pub fn build_summary_js(
    title: &str,
    view: &BoardView,
    window: &CompetitionWindow,
    now: NaiveDateTime,
) -> JSValue {
    let results: Vec<JSValue> = rank(&view.standings.employees)
        .iter()
        .map(|group| {
            let members: Vec<&str> = group.members.iter().map(|e| e.full_name.as_str()).collect();
            json!({
                "rank": group.rank,
                "points": group.points,
                "tied": group.is_tie(),
                "members": members,
            })
        })
        .collect();
    let time_left = window.time_left(now).map(|c| {
        json!({
            "days": c.days,
            "hours": c.hours,
            "minutes": c.minutes,
        })
    });
    json!({
        "config": {
            "title": title,
            "updatedAt": view.standings.manual_update_time,
            "progress": (window.progress(now) * 10.0).round() / 10.0,
            "timeLeft": time_left,
        },
        "results": results,
    })
}

fn countdown_line(window: &CompetitionWindow, now: NaiveDateTime) -> String {
    match window.time_left(now) {
        Some(c) => format!(
            "Time left: {}d {}h {}m ({:.0}% elapsed)",
            c.days,
            c.hours,
            c.minutes,
            window.progress(now)
        ),
        None => "The competition is over".to_string(),
    }
}

/// The board as printed on the terminal. When the last refresh failed, the
/// error replaces the table.
pub fn render_text(
    title: &str,
    view: &BoardView,
    window: &CompetitionWindow,
    now: NaiveDateTime,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", title);
    let _ = writeln!(out, "{}", countdown_line(window, now));
    if let Some(t) = &view.standings.manual_update_time {
        let _ = writeln!(out, "Last update: {}", t);
    }

    if let Some(message) = &view.error {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", message);
        return out;
    }

    let ranked = rank(&view.standings.employees);
    if ranked.is_empty() {
        let _ = writeln!(out, "No employees yet");
        return out;
    }
    let width = view
        .standings
        .employees
        .iter()
        .map(|e| e.full_name.chars().count())
        .max()
        .unwrap_or(0);
    let _ = writeln!(out, "{:>4}  {:<width$}  {:>6}", "#", "name", "points", width = width);
    for group in ranked.iter() {
        // Tied ranks are marked with '='.
        let marker = if group.is_tie() { "=" } else { " " };
        for e in group.members.iter() {
            let _ = writeln!(
                out,
                "{:>3}{}  {:<width$}  {:>6}",
                group.rank,
                marker,
                e.full_name,
                e.total_points,
                width = width
            );
        }
    }
    out
}

/// The most recent score events, newest first.
pub fn render_history(standings: &Standings, limit: usize) -> String {
    let mut out = String::new();
    if standings.entries.is_empty() {
        let _ = writeln!(out, "No score events");
        return out;
    }
    for e in standings.entries.iter().take(limit) {
        let name = standings
            .employees
            .iter()
            .find(|emp| emp.id == e.employee_id)
            .map(|emp| emp.full_name.as_str())
            .unwrap_or("?");
        let _ = writeln!(
            out,
            "{}  {}  {:>+4}  {}  {}",
            e.id,
            e.date.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            e.points,
            name,
            e.reason
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn view(points: &[(&str, i64)]) -> BoardView {
        let employees = points
            .iter()
            .enumerate()
            .map(|(idx, (name, p))| Employee {
                id: EmployeeId(idx.to_string()),
                full_name: name.to_string(),
                total_points: *p,
            })
            .collect();
        BoardView {
            standings: Standings {
                employees,
                entries: vec![],
                manual_update_time: Some("12:00".to_string()),
            },
            error: None,
            refreshed_at: None,
        }
    }

    #[test]
    fn summary_groups_ties() {
        let v = view(&[("A", 50), ("B", 30), ("C", 30), ("D", 10)]);
        let window = CompetitionWindow::default();
        let js = build_summary_js("Board", &v, &window, at("2026-01-20T00:00:00"));
        assert_eq!(
            js["results"],
            json!([
                {"rank": 1, "points": 50, "tied": false, "members": ["A"]},
                {"rank": 2, "points": 30, "tied": true, "members": ["B", "C"]},
                {"rank": 4, "points": 10, "tied": false, "members": ["D"]},
            ])
        );
        assert_eq!(js["config"]["updatedAt"], "12:00");
        assert!(js["config"]["timeLeft"].is_object());
    }

    #[test]
    fn summary_after_deadline() {
        let v = view(&[]);
        let window = CompetitionWindow::default();
        let js = build_summary_js("Board", &v, &window, at("2026-03-01T00:00:00"));
        assert_eq!(js["config"]["progress"], 100.0);
        assert!(js["config"]["timeLeft"].is_null());
        assert_eq!(js["results"], json!([]));
    }

    #[test]
    fn text_marks_ties() {
        let v = view(&[("Alice", 20), ("Bob", 20), ("Carol", 5)]);
        let text = render_text(
            "Board",
            &v,
            &CompetitionWindow::default(),
            at("2026-01-20T00:00:00"),
        );
        assert!(text.contains("  1=  Alice"));
        assert!(text.contains("  1=  Bob"));
        assert!(text.contains("  3   Carol"));
        assert!(text.contains("Last update: 12:00"));
    }

    #[test]
    fn error_replaces_table() {
        let mut v = view(&[("Alice", 20)]);
        v.error = Some("Data file ranking.xlsx was not found.".to_string());
        let text = render_text(
            "Board",
            &v,
            &CompetitionWindow::default(),
            at("2026-01-20T00:00:00"),
        );
        assert!(text.contains("was not found"));
        assert!(!text.contains("Alice"));
    }

    #[test]
    fn history_is_limited() {
        let mut ledger = Ledger::new();
        for _ in 0..5 {
            ledger.add_score("Alice", 1, "shift").unwrap();
        }
        let standings = Standings::from_ledger(ledger, None);
        let text = render_history(&standings, 3);
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().next().unwrap().starts_with("entry-000005"));
        assert!(text.contains("Alice"));
    }
}
