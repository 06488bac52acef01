// Reading Excel exports (Google Forms and Microsoft Forms both offer .xlsx).

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::survey::{io_common::RawRow, *};

/// Reads a worksheet. The first row holds the column names.
///
/// Cells that are not strings (numbers, dates, booleans) are converted to their
/// textual representation.
pub fn read_xlsx_rows(path: &str, worksheet_name: Option<&str>) -> SurveyResult<Vec<RawRow>> {
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header: Vec<String> = iter
        .next()
        .context(EmptySurveySnafu {})?
        .iter()
        .map(cell_to_string)
        .collect();
    debug!("read_xlsx_rows: header: {:?}", header);

    let mut res: Vec<RawRow> = Vec::new();
    for (idx, row) in iter.enumerate() {
        debug!("read_xlsx_rows: idx: {:?} row: {:?}", idx, row);
        let cells: Vec<String> = row.iter().map(cell_to_string).collect();
        // Fully empty rows are left by some spreadsheet editors at the end of a sheet.
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        res.push(header.iter().cloned().zip(cells).collect());
    }
    Ok(res)
}

fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Empty => "".to_string(),
        x => x.to_string(),
    }
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> SurveyResult<calamine::Range<DataType>> {
    debug!("get_range: path: {:?} worksheet: {:?}", path, worksheet_name);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(name) = worksheet_name {
        let wrange = workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => EmptySurveySnafu {}.fail(),
            [(name, wrange)] => {
                debug!("get_range: using the only worksheet {:?}", name);
                Ok(wrange.clone())
            }
            _ => {
                whatever!(
                    "{} has {} worksheets, the worksheet name must be provided",
                    path,
                    all_worksheets.len()
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(cell_to_string(&DataType::String("a;b".to_string())), "a;b");
        assert_eq!(cell_to_string(&DataType::Empty), "");
        assert_eq!(cell_to_string(&DataType::Int(16)), "16");
    }

    #[test]
    fn missing_file() {
        assert!(read_xlsx_rows("/this/file/does/not/exist.xlsx", None).is_err());
    }
}
