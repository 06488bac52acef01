// Primitives for reading and writing CSV files.

use std::fs::OpenOptions;
use std::path::PathBuf;

use csv::{QuoteStyle, WriterBuilder};

use crate::survey::{io_common::RawRow, io_common::simplify_file_name, *};

/// Reads a CSV export. The first row holds the column names.
pub fn read_csv_rows(path: &str) -> SurveyResult<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_rows: header: {:?}", header);

    let mut res: Vec<RawRow> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let row: RawRow = header
            .iter()
            .cloned()
            .zip(line.iter().map(|s| s.to_string()))
            .collect();
        res.push(row);
    }
    Ok(res)
}

/// Writes the filtered records next to the input file, as `filtered_<name>`.
///
/// The timestamp column comes first. An existing file is never overwritten.
pub fn write_filtered_csv(input_path: &str, records: &[Record]) -> SurveyResult<PathBuf> {
    let file_name = format!("filtered_{}", simplify_file_name(input_path));
    let out_path: PathBuf = match Path::new(input_path).parent() {
        Some(p) => p.join(file_name),
        None => PathBuf::from(file_name),
    };
    let out_str = out_path.display().to_string();
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&out_path)
        .context(CreatingFileSnafu { path: out_str.clone() })?;
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(file);

    let first = records.first().context(EmptySurveySnafu {})?;
    let mut header: Vec<&str> = vec!["Timestamp"];
    header.extend(first.columns());
    wtr.write_record(&header)
        .context(CsvWriteSnafu { path: out_str.clone() })?;
    for r in records {
        let mut line: Vec<&str> = vec![r.id.as_deref().unwrap_or("")];
        line.extend(r.fields.iter().map(|(_, v)| v.as_str()));
        wtr.write_record(&line)
            .context(CsvWriteSnafu { path: out_str.clone() })?;
    }
    wtr.flush().context(CreatingFileSnafu { path: out_str })?;
    info!("Saved as {}", out_path.display());
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!("surveytab_io_csv_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&p);
        fs::create_dir_all(&p).unwrap();
        p
    }

    #[test]
    fn read_quoted_multi_select() {
        let dir = temp_dir("read");
        let p = dir.join("results.csv");
        fs::write(
            &p,
            "Timestamp,1. Consent,2. Hobbies\n\"2021/01/01 10:00\",ja,\"Lesen;Sport\"\n\"2021/01/01 11:00\",ja,\n",
        )
        .unwrap();
        let rows = read_csv_rows(p.to_str().unwrap()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][2], ("2. Hobbies".to_string(), "Lesen;Sport".to_string()));
        assert_eq!(rows[1][2], ("2. Hobbies".to_string(), "".to_string()));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file() {
        let p = "/this/file/does/not/exist.csv";
        match read_csv_rows(p) {
            Err(e @ SurveyError::CsvOpen { .. }) => {
                assert_eq!(e.to_string(), format!("Error opening CSV file {}", p))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn write_then_refuse_overwrite() {
        let dir = temp_dir("write");
        let input = dir.join("results.csv");
        let records = vec![
            Record::new(
                Some("t1".to_string()),
                vec![("1. Q".to_string(), "a;b".to_string())],
            ),
            Record::new(Some("t2".to_string()), vec![("1. Q".to_string(), "c".to_string())]),
        ];
        let out = write_filtered_csv(input.to_str().unwrap(), &records).unwrap();
        assert_eq!(out, dir.join("filtered_results.csv"));
        let content = fs::read_to_string(&out).unwrap();
        assert_eq!(
            content,
            "\"Timestamp\",\"1. Q\"\n\"t1\",\"a;b\"\n\"t2\",\"c\"\n"
        );
        assert!(write_filtered_csv(input.to_str().unwrap(), &records).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}
