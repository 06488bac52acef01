// The loader: turns raw rows into unique, validated records.

use std::path::Path;

use crate::survey::*;

/// A row as read from a file: the column names with their cell contents.
pub type RawRow = Vec<(String, String)>;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Filters the rows of a survey export.
///
/// - the timestamp column is taken out of the content and becomes the id
/// - the rows whose consent answer contains the reject marker are dropped
/// - the rows with the same content as a previous row are dropped
pub fn filter_rows(rows: Vec<RawRow>, settings: &SurveySettings) -> SurveyResult<Vec<Record>> {
    info!("Total results: {}", rows.len());
    let first = rows.first().context(EmptySurveySnafu {})?;

    let timestamp_col: Option<String> = settings
        .timestamp_columns
        .iter()
        .find(|tc| first.iter().any(|(c, _)| c == *tc))
        .cloned();
    debug!("filter_rows: timestamp column: {:?}", timestamp_col);

    // The consent question is resolved against the full header, like any other question.
    let consent_col: Option<String> = match &settings.consent_question {
        Some(qid) => {
            let header = Record::new(None, first.clone());
            Some(resolve_column(qid, &header).context(PivotSnafu {})?)
        }
        None => None,
    };
    debug!("filter_rows: consent column: {:?}", consent_col);

    let mut res: Vec<Record> = Vec::new();
    for (lineno, row) in rows.into_iter().enumerate() {
        let mut id: Option<String> = None;
        let mut fields: Vec<(String, String)> = Vec::new();
        for (c, v) in row.into_iter() {
            if Some(&c) == timestamp_col.as_ref() {
                id = Some(v);
            } else {
                fields.push((c, v));
            }
        }
        let record = Record::new(id, fields);

        if let Some(cc) = &consent_col {
            let consent = record.get(cc).unwrap_or("");
            if consent.contains(settings.consent_reject_marker.as_str()) {
                debug!("filter_rows: row {}: no consent: {:?}", lineno, consent);
                continue;
            }
        }
        if res.iter().any(|r| r.content_eq(&record)) {
            debug!("filter_rows: row {}: duplicate of a previous row", lineno);
            continue;
        }
        res.push(record);
    }

    info!("Total valid results: {}", res.len());
    ensure!(!res.is_empty(), EmptySurveySnafu {});
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::config_reader::{validate_config, SurveyConfig};

    fn row(fields: &[(&str, &str)]) -> RawRow {
        fields
            .iter()
            .map(|(c, v)| (c.to_string(), v.to_string()))
            .collect()
    }

    fn settings() -> SurveySettings {
        validate_config(&SurveyConfig::default()).unwrap()
    }

    #[test]
    fn dedup_and_consent() {
        let rows = vec![
            row(&[("Zeitstempel", "t1"), ("1. Einverständnis", "ja"), ("2. Q", "A")]),
            row(&[("Zeitstempel", "t2"), ("1. Einverständnis", "ja"), ("2. Q", "A")]),
            row(&[("Zeitstempel", "t3"), ("1. Einverständnis", "keine Zustimmung"), ("2. Q", "B")]),
            row(&[("Zeitstempel", "t4"), ("1. Einverständnis", "ja"), ("2. Q", "C")]),
        ];
        let records = filter_rows(rows, &settings()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, Some("t1".to_string()));
        assert_eq!(records[1].id, Some("t4".to_string()));
        assert_eq!(records[0].get("Zeitstempel"), None);
        assert_eq!(records[1].get("2. Q"), Some("C"));
    }

    #[test]
    fn without_consent_question() {
        let mut s = settings();
        s.consent_question = None;
        let rows = vec![row(&[("Timestamp", "t1"), ("9. Q", "keine")])];
        let records = filter_rows(rows, &s).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, Some("t1".to_string()));
    }

    #[test]
    fn missing_consent_question() {
        let rows = vec![row(&[("Timestamp", "t1"), ("9. Q", "x")])];
        assert!(filter_rows(rows, &settings()).is_err());
    }

    #[test]
    fn empty() {
        assert!(filter_rows(vec![], &settings()).is_err());
        let rows = vec![row(&[("1. C", "keine")])];
        assert!(filter_rows(rows, &settings()).is_err());
    }

    #[test]
    fn file_name() {
        assert_eq!(simplify_file_name("/tmp/a/results.csv"), "results.csv");
        assert_eq!(simplify_file_name("results.csv"), "results.csv");
    }
}
