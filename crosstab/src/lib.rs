mod config;
pub mod builder;
pub mod manual;

use log::{debug, info};

use std::{cmp::Ordering, collections::HashMap};

use crate::builder::CrossTabBuilder;
pub use crate::config::*;

/// Separator between the question identifier and the text of a column name.
pub const QUESTION_ID_SEPARATOR: char = '.';

/// The identifier of a column: everything before the first `.`.
pub fn question_id(column: &str) -> &str {
    column.split(QUESTION_ID_SEPARATOR).next().unwrap_or(column)
}

/// Finds the full column name starting with the given question identifier.
///
/// The first column in the record order wins. There is no fuzzy matching.
pub fn resolve_column(identifier: &str, sample: &Record) -> Result<String, PivotErrors> {
    sample
        .columns()
        .find(|c| question_id(c) == identifier)
        .map(|c| c.to_string())
        .ok_or_else(|| PivotErrors::QuestionNotFound(identifier.to_string()))
}

pub fn resolve_question(
    identifier: &str,
    sample: &Record,
    transform: TokenTransform,
) -> Result<Question, PivotErrors> {
    let column = resolve_column(identifier, sample)?;
    Ok(Question { column, transform })
}

/// The identifiers of all the questions of a record, in column order.
pub fn question_ids(sample: &Record) -> Vec<String> {
    sample.columns().map(|c| question_id(c).to_string()).collect()
}

/// Builds the cross-tabulation of two questions over all the records.
pub fn build_cross_tab(x: &Question, y: &Question, records: &[Record], delimiter: char) -> CrossTab {
    let mut builder = CrossTabBuilder::new(x.clone(), y.clone()).delimiter(delimiter);
    builder.add_records(records);
    builder.build()
}

/// Orders the values of an axis.
///
/// Arguments:
/// * `values` the values, in first-seen order
/// * `order` the ordering policy
/// * `occurrence` the marginal counts, used by [AxisOrder::Frequency]
/// * `ranking` the ranks, used by [AxisOrder::Ordinal]
pub fn sort_axis(
    values: &[String],
    order: AxisOrder,
    occurrence: &HashMap<String, u64>,
    ranking: &OrdinalRanking,
) -> Vec<String> {
    let mut res: Vec<String> = values.to_vec();
    match order {
        AxisOrder::Frequency => {
            // Stable sort: ties keep the input order.
            res.sort_by_key(|v| occurrence.get(v).cloned().unwrap_or(0));
        }
        AxisOrder::Ordinal => {
            res.sort_by(|a, b| compare_ordinal(a, b, ranking));
        }
    }
    res
}

// Ranked labels first, by increasing rank. The others follow in natural order.
fn compare_ordinal(a: &str, b: &str, ranking: &OrdinalRanking) -> Ordering {
    match (ranking.rank(a), ranking.rank(b)) {
        (Some(ra), Some(rb)) => ra.cmp(&rb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => compare_natural(a, b),
    }
}

// "nan" and "inf" parse as floats but are answers like any other text.
fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

fn compare_natural(a: &str, b: &str) -> Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(fa), Some(fb)) => fa.total_cmp(&fb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Computes the width of every bar of the table.
///
/// The table is not modified. Fails if the table is empty or if one of its
/// x-values has no respondent.
pub fn normalize(table: &CrossTab, normalization: Normalization) -> Result<NormalizedTable, PivotErrors> {
    if table.is_empty() {
        return Err(PivotErrors::EmptyTable);
    }
    let mut cells: HashMap<String, HashMap<String, NormalizedCell>> = HashMap::new();
    match normalization {
        Normalization::Percentage => {
            let mut max_ratio: f64 = 0.0;
            for x in table.x_values() {
                let occ = occurrence_of(table, x)?;
                let row_max = table.row_max(x).unwrap_or(0);
                max_ratio = max_ratio.max(row_max as f64 / occ as f64);
            }
            debug!("normalize: max ratio: {:?}", max_ratio);
            for (x, row) in table.cells() {
                let occ = occurrence_of(table, x)? as f64;
                let scaled: HashMap<String, NormalizedCell> = row
                    .iter()
                    .map(|(y, count)| {
                        let width = 100.0 * (*count as f64 / occ) / max_ratio;
                        (y.clone(), NormalizedCell { count: *count, width })
                    })
                    .collect();
                cells.insert(x.clone(), scaled);
            }
        }
        Normalization::Magnitude => {
            let global_max = table.global_max().unwrap_or(0) as f64;
            debug!("normalize: global max: {:?}", global_max);
            for (x, row) in table.cells() {
                let row_max = row.values().max().cloned().unwrap_or(0);
                if row_max == 0 {
                    return Err(PivotErrors::EmptyTable);
                }
                let scaled: HashMap<String, NormalizedCell> = row
                    .iter()
                    .map(|(y, count)| {
                        let width = *count as f64 * global_max / row_max as f64;
                        (y.clone(), NormalizedCell { count: *count, width })
                    })
                    .collect();
                cells.insert(x.clone(), scaled);
            }
        }
    }
    Ok(NormalizedTable {
        normalization,
        cells,
    })
}

fn occurrence_of(table: &CrossTab, x: &str) -> Result<u64, PivotErrors> {
    match table.x_occurrence().get(x) {
        Some(occ) if *occ > 0 => Ok(*occ),
        _ => Err(PivotErrors::ZeroOccurrence(x.to_string())),
    }
}

/// The centres of the groups of bars, one per x-value, evenly spaced.
///
/// The step is 100 with percentages, and the largest raw count otherwise.
pub fn layout_positions(table: &CrossTab, ordered_x: &[String], normalization: Normalization) -> Vec<f64> {
    let step: f64 = match normalization {
        Normalization::Percentage => 100.0,
        Normalization::Magnitude => table.global_max().unwrap_or(0) as f64,
    };
    (0..ordered_x.len()).map(|idx| idx as f64 * step).collect()
}

/// The text displayed on a bar: the share of the respondents of the x-value,
/// followed by the raw fraction.
pub fn cell_label(count: u64, occurrence: u64) -> String {
    let pct = if occurrence == 0 {
        0.0
    } else {
        100.0 * count as f64 / occurrence as f64
    };
    format!("{:.1}% ({}/{})", pct, count, occurrence)
}

/// Runs the whole pipeline for one pair of questions.
///
/// Arguments:
/// * `x` the question whose answers form the groups of bars
/// * `y` the question whose answers form the bins of each group
/// * `records` the respondents
/// * `rules` the normalization, axis orders and delimiter
/// * `ranking` the ranks of the known labels for the ordinal axes
pub fn run_pivot(
    x: &Question,
    y: &Question,
    records: &[Record],
    rules: &PivotRules,
    ranking: &OrdinalRanking,
) -> Result<ChartData, PivotErrors> {
    info!(
        "Processing {:?} records, x: {:?}, y: {:?}, rules: {:?}",
        records.len(),
        x.column,
        y.column,
        rules
    );
    let table = build_cross_tab(x, y, records, rules.delimiter);
    let normalized = normalize(&table, rules.normalization)?;

    let xs_sorted = sort_axis(table.x_values(), rules.x_order, table.x_occurrence(), ranking);
    let ys_sorted = sort_axis(table.y_values(), rules.y_order, table.y_occurrence(), ranking);
    let positions = layout_positions(&table, &xs_sorted, rules.normalization);
    debug!("run_pivot: xs: {:?} positions: {:?}", xs_sorted, positions);
    debug!("run_pivot: ys: {:?}", ys_sorted);

    let xs: Vec<XEntry> = xs_sorted
        .iter()
        .zip(positions.iter())
        .map(|(label, position)| XEntry {
            label: label.clone(),
            position: *position,
            occurrence: table.x_occurrence().get(label).cloned().unwrap_or(0),
        })
        .collect();
    let ys: Vec<YEntry> = ys_sorted
        .iter()
        .enumerate()
        .map(|(bin, label)| YEntry {
            label: label.clone(),
            bin,
            occurrence: table.y_occurrence().get(label).cloned().unwrap_or(0),
        })
        .collect();

    let mut cells: Vec<ChartCell> = Vec::new();
    for xe in xs.iter() {
        for ye in ys.iter() {
            if let Some(nc) = normalized.get(&xe.label, &ye.label) {
                cells.push(ChartCell {
                    x: xe.label.clone(),
                    y: ye.label.clone(),
                    count: nc.count,
                    width: nc.width,
                    label: cell_label(nc.count, xe.occurrence),
                });
            }
        }
    }

    for xe in xs.iter() {
        info!("{:>8} {} ({} respondents)", xe.position, xe.label, xe.occurrence);
    }

    Ok(ChartData {
        x_question: x.column.clone(),
        y_question: y.column.clone(),
        normalization: rules.normalization,
        x_order: rules.x_order,
        y_order: rules.y_order,
        xs,
        ys,
        cells,
        table: normalized,
    })
}
