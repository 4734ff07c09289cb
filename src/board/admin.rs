// Admin commands. Each one loads the snapshot file, applies the edit on the
// board and writes the whole file back.

use crate::board::*;

pub fn check_gate(settings: &Settings, attempt: Option<&str>) -> BoardResult<()> {
    match &settings.passcode {
        Some(code) => {
            let gate = AdminGate::new(code);
            ensure!(gate.check(attempt.unwrap_or("")), AdminLockedSnafu {});
            Ok(())
        }
        None => {
            warn!("No admin passcode configured, the admin commands are open");
            Ok(())
        }
    }
}

fn snapshot_path(settings: &Settings) -> BoardResult<&str> {
    match &settings.feed.source {
        DataSource::Json { path } => Ok(path.as_str()),
        other => AdminNeedsSnapshotSnafu {
            provider: other.provider(),
        }
        .fail(),
    }
}

fn open_board(path: &str) -> BoardResult<SharedBoard> {
    let standings = if Path::new(path).is_file() {
        io_json::read_snapshot(path)?
    } else {
        info!("{:?} does not exist yet, starting an empty board", path);
        Standings::default()
    };
    Ok(SharedBoard::new(standings))
}

fn save_board(path: &str, board: &SharedBoard) -> BoardResult<()> {
    io_json::write_snapshot(path, &board.current().standings)
}

pub fn add_points(
    settings: &Settings,
    attempt: Option<&str>,
    entry: &AdminEntry,
) -> BoardResult<Vec<ScoreEvent>> {
    check_gate(settings, attempt)?;
    let path = snapshot_path(settings)?;
    entry.validate().context(AdminInputSnafu {})?;
    let board = open_board(path)?;
    let events = board
        .edit(|ledger, _| entry.submit(ledger))
        .context(AdminInputSnafu {})?;
    save_board(path, &board)?;
    Ok(events)
}

pub fn delete_entry(
    settings: &Settings,
    attempt: Option<&str>,
    entry_id: &EntryId,
) -> BoardResult<Option<ScoreEvent>> {
    check_gate(settings, attempt)?;
    let path = snapshot_path(settings)?;
    let board = open_board(path)?;
    let removed = board.edit(|ledger, _| ledger.delete_entry(entry_id));
    if removed.is_some() {
        save_board(path, &board)?;
    }
    Ok(removed)
}

/// Sets the free-text "last update" shown on the board. An empty text
/// clears it.
pub fn set_update_time(settings: &Settings, attempt: Option<&str>, text: &str) -> BoardResult<()> {
    check_gate(settings, attempt)?;
    let path = snapshot_path(settings)?;
    let board = open_board(path)?;
    let text = text.trim();
    board.edit(|_, update_time| {
        *update_time = if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        };
    });
    save_board(path, &board)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(dir: &tempfile::TempDir, passcode: Option<&str>) -> Settings {
        let overrides = Overrides {
            input: Some(dir.path().join("data.json").display().to_string()),
            ..Overrides::default()
        };
        let mut s = Settings::resolve(None, dir.path(), &overrides).unwrap();
        s.passcode = passcode.map(|p| p.to_string());
        s
    }

    #[test]
    fn add_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(&dir, Some("77654"));
        let entry = AdminEntry::new("Noa")
            .select(PointCategory::Shift)
            .select(PointCategory::Alcohol);
        let events = add_points(&s, Some("77654"), &entry).unwrap();
        assert_eq!(events.len(), 2);

        let standings = s.feed.load().unwrap();
        assert_eq!(standings.employees[0].total_points, 7);
        assert_eq!(standings.entries.len(), 2);

        let removed = delete_entry(&s, Some("77654"), &events[1].id).unwrap();
        assert_eq!(removed.map(|e| e.points), Some(6));
        let standings = s.feed.load().unwrap();
        assert_eq!(standings.employees[0].total_points, 1);
        assert_eq!(standings.entries.len(), 1);

        assert_eq!(
            delete_entry(&s, Some("77654"), &EntryId("nope".to_string())).unwrap(),
            None
        );
    }

    #[test]
    fn wrong_passcode_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(&dir, Some("77654"));
        let entry = AdminEntry::new("Noa").select(PointCategory::Shift);
        let res = add_points(&s, Some("1234"), &entry);
        assert!(matches!(res, Err(BoardError::AdminLocked {})));
        let res = add_points(&s, None, &entry);
        assert!(matches!(res, Err(BoardError::AdminLocked {})));
        assert!(!dir.path().join("data.json").exists());
    }

    #[test]
    fn invalid_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(&dir, None);
        let res = add_points(&s, None, &AdminEntry::new(" ").select(PointCategory::Shift));
        assert!(matches!(res, Err(BoardError::AdminInput { .. })));
        let res = add_points(&s, None, &AdminEntry::new("Noa"));
        assert!(matches!(res, Err(BoardError::AdminInput { .. })));
        assert!(!dir.path().join("data.json").exists());
    }

    #[test]
    fn update_time() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(&dir, None);
        set_update_time(&s, None, " יום ראשון 12:00 ").unwrap();
        assert_eq!(
            s.feed.load().unwrap().manual_update_time,
            Some("יום ראשון 12:00".to_string())
        );
        set_update_time(&s, None, "").unwrap();
        assert_eq!(s.feed.load().unwrap().manual_update_time, None);
    }

    #[test]
    fn needs_a_snapshot_source() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            input: Some(dir.path().join("ranking.xlsx").display().to_string()),
            ..Overrides::default()
        };
        let s = Settings::resolve(None, dir.path(), &overrides).unwrap();
        let res = set_update_time(&s, None, "now");
        assert!(matches!(res, Err(BoardError::AdminNeedsSnapshot { .. })));
    }
}
