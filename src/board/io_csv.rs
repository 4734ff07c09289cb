// Primitives for reading CSV files.

use crate::board::*;

pub fn read_csv_rows(path: &str) -> BoardResult<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(OpeningCsvSnafu { path })?;

    let header: Vec<String> = rdr
        .headers()
        .context(ReadingCsvSnafu { path, lineno: 1usize })?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    debug!("read_csv_rows: header: {:?}", header);

    let mut res: Vec<RawRow> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(ReadingCsvSnafu { path, lineno })?;
        let raw: RawRow = header
            .iter()
            .zip(line.iter())
            .filter(|(h, _)| !h.is_empty())
            .map(|(h, field)| {
                let cell = if field.trim().is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                };
                (h.clone(), cell)
            })
            .collect();
        if raw.is_empty() {
            debug!("read_csv_rows: lineno: {:?} blank line skipped", lineno);
            continue;
        }
        res.push(raw);
    }
    info!("read_csv_rows: {} rows from {:?}", res.len(), path);
    Ok(res)
}
