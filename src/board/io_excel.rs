// Reading spreadsheets with calamine.

use crate::board::*;

pub fn read_excel_rows(path: &str, worksheet: Option<&str>) -> BoardResult<Vec<RawRow>> {
    let wrange = get_range(path, worksheet)?;

    let mut iter = wrange.rows();
    let header: Vec<String> = iter
        .next()
        .context(EmptyExcelSnafu { path })?
        .iter()
        .map(read_header)
        .collect();
    debug!("read_excel_rows: header: {:?}", header);

    let mut res: Vec<RawRow> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let raw: RawRow = header
            .iter()
            .zip(row.iter())
            .filter(|(h, _)| !h.is_empty())
            .map(|(h, cell)| (h.clone(), read_cell(cell)))
            .collect();
        if raw.is_empty() {
            debug!("read_excel_rows: idx: {:?} blank row skipped", idx);
            continue;
        }
        res.push(raw);
    }
    info!("read_excel_rows: {} rows from {:?}", res.len(), path);
    Ok(res)
}

fn get_range(path: &str, worksheet: Option<&str>) -> BoardResult<calamine::Range<DataType>> {
    debug!("get_range: path: {:?} worksheet: {:?}", path, worksheet);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(name) = worksheet {
        let wrange = workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let wrange = workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    }
}

fn read_header(cell: &DataType) -> String {
    match read_cell(cell) {
        Cell::Text(s) => s.trim().to_string(),
        Cell::Number(n) => n.to_string(),
        Cell::Bool(b) => b.to_string(),
        Cell::Empty => "".to_string(),
    }
}

fn read_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::String(s) => Cell::Text(s.clone()),
        DataType::Float(f) => Cell::Number(*f),
        DataType::Int(i) => Cell::Number(*i as f64),
        DataType::Bool(b) => Cell::Bool(*b),
        // Excel serial date, kept as a number.
        DataType::DateTime(f) => Cell::Number(*f),
        DataType::Error(e) => {
            debug!("read_cell: error cell {:?}", e);
            Cell::Empty
        }
        DataType::Empty => Cell::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(read_cell(&DataType::Int(3)), Cell::Number(3.0));
        assert_eq!(
            read_cell(&DataType::String(" דנה ".to_string())),
            Cell::Text(" דנה ".to_string())
        );
        assert_eq!(read_cell(&DataType::Empty), Cell::Empty);
        assert_eq!(read_header(&DataType::String(" Points ".to_string())), "Points");
    }

    #[test]
    fn not_a_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranking.xlsx");
        fs::write(&path, b"name,points\n").unwrap();
        let res = read_excel_rows(&path.display().to_string(), None);
        assert!(matches!(res, Err(BoardError::OpeningExcel { .. })));
    }
}
