// The JSON snapshot file: employees, the history of score events and the
// manual update time.

use atomic_write_file::AtomicWriteFile;

use crate::board::*;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: JSValue,
    #[serde(rename = "fullName")]
    pub full_name: String,
    #[serde(rename = "totalPoints", default)]
    pub total_points: JSValue,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct EntryRecord {
    pub id: JSValue,
    #[serde(rename = "employeeId")]
    pub employee_id: JSValue,
    #[serde(default)]
    pub points: JSValue,
    #[serde(default)]
    pub reason: String,
    pub date: DateTime<Utc>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(rename = "manualUpdateTime", default)]
    pub manual_update_time: Option<String>,
    #[serde(default)]
    pub employees: Vec<EmployeeRecord>,
    #[serde(default)]
    pub entries: Vec<EntryRecord>,
}

pub fn read_snapshot(path: &str) -> BoardResult<Standings> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let file: SnapshotFile =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    snapshot_to_standings(file, path)
}

fn snapshot_to_standings(file: SnapshotFile, path: &str) -> BoardResult<Standings> {
    let mut employees: Vec<Employee> = Vec::new();
    for rec in file.employees.iter() {
        let full_name = rec.full_name.trim().to_string();
        if full_name.is_empty() {
            warn!("read_snapshot: employee {:?} without a name dropped", rec.id);
            continue;
        }
        employees.push(Employee {
            id: EmployeeId(read_id(&rec.id, path)?),
            full_name,
            total_points: read_points(&rec.total_points).max(0),
        });
    }

    let mut entries: Vec<ScoreEvent> = Vec::new();
    for rec in file.entries.iter() {
        entries.push(ScoreEvent {
            id: EntryId(read_id(&rec.id, path)?),
            employee_id: EmployeeId(read_id(&rec.employee_id, path)?),
            points: read_points(&rec.points),
            reason: rec.reason.clone(),
            date: rec.date,
        });
    }

    let manual_update_time = file
        .manual_update_time
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(Standings {
        employees,
        entries,
        manual_update_time,
    })
}

// Identifiers may have been written as numbers.
fn read_id(x: &JSValue, path: &str) -> BoardResult<String> {
    match x {
        JSValue::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        JSValue::Number(n) => Ok(n.to_string()),
        _ => ParsingJsonIdSnafu {
            path,
            value: x.to_string(),
        }
        .fail(),
    }
}

// Same coercion as for the spreadsheet cells.
fn read_points(x: &JSValue) -> i64 {
    let cell = match x {
        JSValue::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
        JSValue::String(s) => Cell::Text(s.clone()),
        JSValue::Bool(b) => Cell::Bool(*b),
        _ => Cell::Empty,
    };
    coerce_points(Some(&cell))
}

pub fn build_snapshot_js(standings: &Standings) -> JSValue {
    let employees: Vec<JSValue> = standings
        .employees
        .iter()
        .map(|e| {
            json!({
                "id": e.id.as_str(),
                "fullName": e.full_name,
                "totalPoints": e.total_points,
            })
        })
        .collect();
    let entries: Vec<JSValue> = standings
        .entries
        .iter()
        .map(|e| {
            json!({
                "id": e.id.as_str(),
                "employeeId": e.employee_id.as_str(),
                "points": e.points,
                "reason": e.reason,
                "date": e.date,
            })
        })
        .collect();
    json!({
        "manualUpdateTime": standings.manual_update_time.clone().unwrap_or_default(),
        "employees": employees,
        "entries": entries,
    })
}

/// Writes the snapshot file. The previous file stays in place until the new
/// one is complete.
pub fn write_snapshot(path: &str, standings: &Standings) -> BoardResult<()> {
    let js = build_snapshot_js(standings);
    let mut file = AtomicWriteFile::open(path).context(WritingSnapshotSnafu { path })?;
    serde_json::to_writer_pretty(&mut file, &js).context(SerializingJsonSnafu {})?;
    file.commit().context(WritingSnapshotSnafu { path })?;
    info!(
        "write_snapshot: {} employees, {} entries to {:?}",
        standings.employees.len(),
        standings.entries.len(),
        path
    );
    Ok(())
}
