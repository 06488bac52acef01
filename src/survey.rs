use log::{debug, info, warn};

use crosstab::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::survey::config_reader::*;
use crate::survey::io_common::RawRow;

pub mod archive;
pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_xlsx;
pub mod render;
pub mod words;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    CreatingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the chart data"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing CSV file {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet named {name} in {path}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("The survey contains no valid result"))]
    EmptySurvey {},
    #[snafu(display("{source}"))]
    Pivot { source: PivotErrors },
    #[snafu(display("Error drawing chart {path}: {message}"))]
    RenderingChart { path: String, message: String },
    #[snafu(display("Error writing archive {path}"))]
    Archiving {
        source: zip::result::ZipError,
        path: String,
    },
    #[snafu(display("Cannot archive file {path}"))]
    ArchivingName { path: String },
    #[snafu(display("Difference detected between the chart data and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;

/// The two orderings of the y-axis drawn for each pair of questions.
pub const VARIANTS: [(AxisOrder, &str); 2] = [
    (AxisOrder::Ordinal, "custom_sorted"),
    (AxisOrder::Frequency, "sorted_by_occurrence"),
];

/// Where the chart data of a plot should be written, and what to compare it to.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PlotOutputs {
    pub out: Option<String>,
    pub reference: Option<String>,
}

/// Reads the rows of the input file, with the reader matching its type.
pub fn read_rows(input: &str, settings: &SurveySettings) -> SurveyResult<Vec<RawRow>> {
    let input_type = settings
        .input_type
        .unwrap_or_else(|| InputType::from_path(input));
    info!("Loading results from {:?} ({:?})", input, input_type);
    match input_type {
        InputType::Csv => io_csv::read_csv_rows(input),
        InputType::Xlsx => io_xlsx::read_xlsx_rows(input, settings.excel_worksheet_name.as_deref()),
    }
}

pub fn load_records(input: &str, settings: &SurveySettings) -> SurveyResult<Vec<Record>> {
    let rows = read_rows(input, settings)?;
    io_common::filter_rows(rows, settings)
}

fn chart_file_name(x_id: &str, y_id: &str, variant: &str) -> String {
    format!("{}_{}_{}.svg", x_id, y_id, variant)
}

/// Computes the charts of one pair of questions, one per y-axis ordering.
pub fn pivot_pair(
    records: &[Record],
    x_id: &str,
    y_id: &str,
    settings: &SurveySettings,
) -> SurveyResult<Vec<(&'static str, ChartData)>> {
    let sample = records.first().context(EmptySurveySnafu {})?;
    let x = resolve_question(x_id, sample, settings.transform(x_id)).context(PivotSnafu {})?;
    let y = resolve_question(y_id, sample, settings.transform(y_id)).context(PivotSnafu {})?;
    let mut res = Vec::new();
    for (y_order, variant) in VARIANTS.iter() {
        let rules = PivotRules {
            y_order: *y_order,
            ..settings.rules()
        };
        let chart = run_pivot(&x, &y, records, &rules, &settings.ranking).context(PivotSnafu {})?;
        res.push((*variant, chart));
    }
    Ok(res)
}

fn render_pair(
    charts: &[(&'static str, ChartData)],
    x_id: &str,
    y_id: &str,
    out_dir: &Path,
    settings: &SurveySettings,
) -> SurveyResult<Vec<PathBuf>> {
    let mut res = Vec::new();
    for (variant, chart) in charts {
        let p = out_dir.join(chart_file_name(x_id, y_id, variant));
        render::render_chart(chart, &p, settings.chart_size)?;
        res.push(p);
    }
    Ok(res)
}

fn f64_to_json(f: f64) -> JSValue {
    // Rounded to keep the summaries stable across platforms.
    json!((f * 1e6).round() / 1e6)
}

/// The chart data in JSON form.
pub fn chart_to_json(chart: &ChartData) -> JSValue {
    let xs: Vec<JSValue> = chart
        .xs
        .iter()
        .map(|x| json!({"label": x.label, "position": f64_to_json(x.position), "occurrence": x.occurrence}))
        .collect();
    let ys: Vec<JSValue> = chart
        .ys
        .iter()
        .map(|y| json!({"label": y.label, "bin": y.bin, "occurrence": y.occurrence}))
        .collect();
    let cells: Vec<JSValue> = chart
        .cells
        .iter()
        .map(|c| {
            json!({
                "x": c.x,
                "y": c.y,
                "count": c.count,
                "width": f64_to_json(c.width),
                "label": c.label,
            })
        })
        .collect();
    json!({
        "xQuestion": chart.x_question,
        "yQuestion": chart.y_question,
        "normalization": format!("{:?}", chart.normalization).to_lowercase(),
        "yOrder": format!("{:?}", chart.y_order).to_lowercase(),
        "xs": xs,
        "ys": ys,
        "cells": cells,
    })
}

fn build_summary_js(x_id: &str, y_id: &str, charts: &[(&'static str, ChartData)]) -> JSValue {
    let variants: serde_json::Map<String, JSValue> = charts
        .iter()
        .map(|(variant, chart)| (variant.to_string(), chart_to_json(chart)))
        .collect();
    json!({"x": x_id, "y": y_id, "charts": variants})
}

fn write_output(out: &str, content: &str) -> SurveyResult<()> {
    if out == "stdout" {
        println!("{}", content);
    } else {
        fs::write(out, content).context(CreatingFileSnafu { path: out })?;
        info!("Chart data written to {}", out);
    }
    Ok(())
}

fn check_reference(reference_path: &str, computed: &str) -> SurveyResult<()> {
    let contents =
        fs::read_to_string(reference_path).context(OpeningFileSnafu { path: reference_path })?;
    let js: JSValue =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path: reference_path })?;
    let pretty_ref = serde_json::to_string_pretty(&js).context(SerializingJsonSnafu {})?;
    if pretty_ref != computed {
        warn!("Found differences with the reference {}", reference_path);
        print_diff(pretty_ref.as_str(), computed, "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail();
    }
    info!("Chart data matches the reference {}", reference_path);
    Ok(())
}

/// `plot`: the charts of one pair of questions.
pub fn run_plot(
    input: &str,
    x_id: &str,
    y_id: &str,
    settings: &SurveySettings,
    outputs: &PlotOutputs,
) -> SurveyResult<Vec<PathBuf>> {
    let records = load_records(input, settings)?;
    let charts = pivot_pair(&records, x_id, y_id, settings)?;

    let out_dir = Path::new(&settings.output_directory);
    fs::create_dir_all(out_dir).context(CreatingFileSnafu {
        path: settings.output_directory.clone(),
    })?;
    let files = render_pair(&charts, x_id, y_id, out_dir, settings)?;

    if outputs.out.is_some() || outputs.reference.is_some() {
        let summary = build_summary_js(x_id, y_id, &charts);
        let pretty = serde_json::to_string_pretty(&summary).context(SerializingJsonSnafu {})?;
        if let Some(out) = &outputs.out {
            write_output(out, &pretty)?;
        }
        if let Some(reference) = &outputs.reference {
            check_reference(reference, &pretty)?;
        }
    }
    Ok(files)
}

/// The outcome of a batch run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BatchSummary {
    pub archive: PathBuf,
    pub charts: usize,
    pub failed_pairs: Vec<(String, String)>,
}

/// `plot_all`: the charts of every ordered pair of questions, packed in a zip archive.
///
/// A pair that cannot be charted is skipped with a warning, unless
/// `fail_fast` is set.
pub fn run_plot_all(input: &str, settings: &SurveySettings, fail_fast: bool) -> SurveyResult<BatchSummary> {
    let records = load_records(input, settings)?;
    let sample = records.first().context(EmptySurveySnafu {})?;
    let ids = question_ids(sample);
    info!("Plotting {} pairs of questions", ids.len() * ids.len());

    let target_dir = Path::new(&settings.output_directory).join(archive::batch_directory_name());
    fs::create_dir_all(&target_dir).context(CreatingFileSnafu {
        path: target_dir.display().to_string(),
    })?;

    let mut charts: usize = 0;
    let mut failed_pairs: Vec<(String, String)> = Vec::new();
    for x_id in ids.iter() {
        for y_id in ids.iter() {
            let res = pivot_pair(&records, x_id, y_id, settings)
                .and_then(|c| render_pair(&c, x_id, y_id, &target_dir, settings));
            match res {
                Ok(files) => charts += files.len(),
                Err(e) if fail_fast => return Err(e),
                Err(e) => {
                    warn!("Skipping pair {} x {}: {}", x_id, y_id, e);
                    failed_pairs.push((x_id.clone(), y_id.clone()));
                }
            }
        }
    }

    let archive = archive::archive_directory(&target_dir)?;
    if !failed_pairs.is_empty() {
        warn!("{} pairs could not be plotted", failed_pairs.len());
    }
    Ok(BatchSummary {
        archive,
        charts,
        failed_pairs,
    })
}

/// `word_cloud`: the word frequencies of one question, written to `wc_<id>.json`.
pub fn run_word_cloud(input: &str, question_id: &str, settings: &SurveySettings) -> SurveyResult<PathBuf> {
    let records = load_records(input, settings)?;
    let sample = records.first().context(EmptySurveySnafu {})?;
    let column = resolve_column(question_id, sample).context(PivotSnafu {})?;
    let words = words::word_frequencies(&column, &records, settings.delimiter);
    for (w, c) in words.iter().take(20) {
        info!("{:>6} {}", c, w);
    }

    let out_dir = Path::new(&settings.output_directory);
    fs::create_dir_all(out_dir).context(CreatingFileSnafu {
        path: settings.output_directory.clone(),
    })?;
    let p = out_dir.join(format!("wc_{}.json", question_id));
    let pretty = serde_json::to_string_pretty(&words::words_to_json(&column, &words))
        .context(SerializingJsonSnafu {})?;
    fs::write(&p, pretty).context(CreatingFileSnafu {
        path: p.display().to_string(),
    })?;
    info!("Saved as {}", p.display());
    Ok(p)
}

/// `filter`: writes the valid, unique results to `filtered_<input>`.
pub fn run_filter(input: &str, settings: &SurveySettings) -> SurveyResult<PathBuf> {
    let records = load_records(input, settings)?;
    io_csv::write_filtered_csv(input, &records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURVEY: &str = "Zeitstempel,1. Einverständnis,2. Wie oft liest du?,25. Alter
\"2021/05/01 10:00:00\",ja,immer,16 Jahre
\"2021/05/01 10:05:00\",ja,nie,17 Jahre
\"2021/05/01 10:06:00\",ja,nie,17 Jahre
\"2021/05/01 10:07:00\",keine Zustimmung,manchmal,15 Jahre
\"2021/05/01 10:09:00\",ja,manchmal,16 Jahre
";

    const SURVEY_WITH_EMPTY_QUESTION: &str = "Zeitstempel,1. Einverständnis,2. Wie oft liest du?,3. Leer,25. Alter
\"2021/05/01 10:00:00\",ja,immer,,16 Jahre
\"2021/05/01 10:05:00\",ja,nie,,17 Jahre
\"2021/05/01 10:09:00\",ja,manchmal,,16 Jahre
";

    fn setup(name: &str) -> (PathBuf, SurveySettings) {
        setup_with(name, SURVEY)
    }

    fn setup_with(name: &str, survey: &str) -> (PathBuf, SurveySettings) {
        let dir = std::env::temp_dir().join(format!("surveytab_survey_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let input = dir.join("results.csv");
        fs::write(&input, survey).unwrap();
        let mut settings = validate_config(&SurveyConfig::default()).unwrap();
        settings.output_directory = dir.join("out").display().to_string();
        (input, settings)
    }

    #[test]
    fn pair_charts() {
        let (input, settings) = setup("pair");
        let records = load_records(input.to_str().unwrap(), &settings).unwrap();
        assert_eq!(records.len(), 3);
        let charts = pivot_pair(&records, "25", "2", &settings).unwrap();
        assert_eq!(charts.len(), 2);
        let (variant, custom) = &charts[0];
        assert_eq!(*variant, "custom_sorted");
        let xs: Vec<&str> = custom.xs.iter().map(|x| x.label.as_str()).collect();
        assert_eq!(xs, vec!["16", "17"]);
        let ys: Vec<&str> = custom.ys.iter().map(|y| y.label.as_str()).collect();
        assert_eq!(ys, vec!["nie", "manchmal", "immer"]);
        let (variant, by_occurrence) = &charts[1];
        assert_eq!(*variant, "sorted_by_occurrence");
        let ys: Vec<&str> = by_occurrence.ys.iter().map(|y| y.label.as_str()).collect();
        assert_eq!(ys, vec!["immer", "nie", "manchmal"]);
        fs::remove_dir_all(input.parent().unwrap()).unwrap();
    }

    #[test]
    fn unknown_question() {
        let (input, settings) = setup("unknown");
        let records = load_records(input.to_str().unwrap(), &settings).unwrap();
        let res = pivot_pair(&records, "99", "2", &settings);
        assert!(matches!(
            res,
            Err(SurveyError::Pivot {
                source: PivotErrors::QuestionNotFound(_)
            })
        ));
        fs::remove_dir_all(input.parent().unwrap()).unwrap();
    }

    #[test]
    fn plot_with_reference() {
        let (input, settings) = setup("reference");
        let out = input.parent().unwrap().join("summary.json");
        let outputs = PlotOutputs {
            out: Some(out.display().to_string()),
            reference: None,
        };
        let files = run_plot(input.to_str().unwrap(), "2", "25", &settings, &outputs).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("2_25_custom_sorted.svg"));
        assert!(files.iter().all(|f| f.exists()));

        // The summary that was just written is its own reference.
        let outputs = PlotOutputs {
            out: None,
            reference: Some(out.display().to_string()),
        };
        assert!(run_plot(input.to_str().unwrap(), "2", "25", &settings, &outputs).is_ok());

        let js: JSValue = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(js["charts"]["custom_sorted"]["xs"][0]["label"], json!("nie"));
        fs::write(&out, "{}").unwrap();
        let res = run_plot(input.to_str().unwrap(), "2", "25", &settings, &outputs);
        assert!(matches!(res, Err(SurveyError::ReferenceMismatch { .. })));
        fs::remove_dir_all(input.parent().unwrap()).unwrap();
    }

    #[test]
    fn plot_all_every_pair() {
        let (input, settings) = setup("all");
        let summary = run_plot_all(input.to_str().unwrap(), &settings, false).unwrap();
        assert!(summary.archive.exists());
        // Consent x anything works, 3 questions give 9 pairs and 18 charts.
        assert_eq!(summary.charts, 18);
        assert!(summary.failed_pairs.is_empty());
        fs::remove_dir_all(input.parent().unwrap()).unwrap();
    }

    #[test]
    fn plot_all_skips_failing_pairs() {
        let (input, settings) = setup_with("skip", SURVEY_WITH_EMPTY_QUESTION);
        let summary = run_plot_all(input.to_str().unwrap(), &settings, false).unwrap();
        assert!(summary.archive.exists());
        // Every pair with the unanswered question 3 has no pairs to chart.
        let pair = |x: &str, y: &str| (x.to_string(), y.to_string());
        assert_eq!(
            summary.failed_pairs,
            vec![
                pair("1", "3"),
                pair("2", "3"),
                pair("3", "1"),
                pair("3", "2"),
                pair("3", "3"),
                pair("3", "25"),
                pair("25", "3"),
            ]
        );
        // The 9 other pairs give 2 charts each.
        assert_eq!(summary.charts, 18);
        let archive = zip::ZipArchive::new(fs::File::open(&summary.archive).unwrap()).unwrap();
        assert_eq!(archive.len(), 18);

        let res = run_plot_all(input.to_str().unwrap(), &settings, true);
        assert!(matches!(
            res,
            Err(SurveyError::Pivot {
                source: PivotErrors::EmptyTable
            })
        ));
        fs::remove_dir_all(input.parent().unwrap()).unwrap();
    }

    #[test]
    fn word_cloud_and_filter() {
        let (input, settings) = setup("words");
        let p = run_word_cloud(input.to_str().unwrap(), "2", &settings).unwrap();
        let js: JSValue = serde_json::from_str(&fs::read_to_string(&p).unwrap()).unwrap();
        assert_eq!(js["words"][0], json!({"word": "immer", "count": 1}));
        assert_eq!(js["words"].as_array().unwrap().len(), 3);

        let filtered = run_filter(input.to_str().unwrap(), &settings).unwrap();
        let content = fs::read_to_string(&filtered).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert!(content.starts_with("\"Timestamp\",\"1. Einverständnis\""));
        fs::remove_dir_all(input.parent().unwrap()).unwrap();
    }
}
