pub use crate::config::*;

use log::debug;
use std::collections::{HashMap, HashSet};

/// A builder for the cross-tabulation of two questions.
///
/// Records can be added one at a time, which avoids holding the whole survey
/// when reading it as a stream.
///
/// ```
/// use crosstab::builder::CrossTabBuilder;
/// use crosstab::{Question, Record};
///
/// let mut builder = CrossTabBuilder::new(Question::new("1.Q"), Question::new("2.Q"));
/// builder.add_record(&Record::new(
///     None,
///     vec![
///         ("1.Q".to_string(), "A;B".to_string()),
///         ("2.Q".to_string(), "X".to_string()),
///     ],
/// ));
/// let tab = builder.build();
/// assert_eq!(tab.get("A", "X"), Some(1));
/// assert_eq!(tab.get("B", "X"), Some(1));
/// ```
pub struct CrossTabBuilder {
    x: Question,
    y: Question,
    delimiter: char,
    cells: HashMap<String, HashMap<String, u64>>,
    x_values: Vec<String>,
    y_values: Vec<String>,
    x_occurrence: HashMap<String, u64>,
    y_occurrence: HashMap<String, u64>,
}

impl CrossTabBuilder {
    pub fn new(x: Question, y: Question) -> CrossTabBuilder {
        CrossTabBuilder {
            x,
            y,
            delimiter: PivotRules::DEFAULT_RULES.delimiter,
            cells: HashMap::new(),
            x_values: Vec::new(),
            y_values: Vec::new(),
            x_occurrence: HashMap::new(),
            y_occurrence: HashMap::new(),
        }
    }

    pub fn delimiter(self, delimiter: char) -> CrossTabBuilder {
        CrossTabBuilder { delimiter, ..self }
    }

    /// Adds the answers of one respondent.
    ///
    /// Every x-token of the record is paired with every y-token of the record.
    /// Empty tokens never form a pair, but an empty x-token still gets a slot.
    pub fn add_record(&mut self, record: &Record) {
        let (x_cell, y_cell) = match (record.get(&self.x.column), record.get(&self.y.column)) {
            (Some(x_cell), Some(y_cell)) => (x_cell, y_cell),
            _ => {
                debug!(
                    "add_record: record {:?} misses {:?} or {:?}",
                    record.id, self.x.column, self.y.column
                );
                return;
            }
        };

        let y_tokens: Vec<&str> = y_cell
            .split(self.delimiter)
            .map(|s| self.y.transform.apply(s))
            .collect();

        for y_token in y_tokens.iter().filter(|s| !s.is_empty()) {
            if !self.y_occurrence.contains_key(*y_token) {
                self.y_occurrence.insert(y_token.to_string(), 0);
                self.y_values.push(y_token.to_string());
            }
        }

        // A token selected twice in one answer is one respondent: its repetitions
        // contribute neither pairs nor occurrence.
        let mut seen: HashSet<&str> = HashSet::new();
        for x_token in x_cell.split(self.delimiter).map(|s| self.x.transform.apply(s)) {
            if !seen.insert(x_token) {
                continue;
            }
            if !self.x_occurrence.contains_key(x_token) {
                self.x_occurrence.insert(x_token.to_string(), 0);
                self.x_values.push(x_token.to_string());
            }
            let row = self.cells.entry(x_token.to_string()).or_default();
            if x_token.is_empty() {
                continue;
            }
            let mut has_pair = false;
            for y_token in y_tokens.iter().filter(|s| !s.is_empty()) {
                *row.entry(y_token.to_string()).or_insert(0) += 1;
                if let Some(c) = self.y_occurrence.get_mut(*y_token) {
                    *c += 1;
                }
                has_pair = true;
            }
            if has_pair {
                if let Some(c) = self.x_occurrence.get_mut(x_token) {
                    *c += 1;
                }
            }
        }
    }

    pub fn add_records(&mut self, records: &[Record]) {
        for r in records {
            self.add_record(r);
        }
    }

    /// Finishes the table, dropping the x-values that were never paired.
    pub fn build(self) -> CrossTab {
        let cells: HashMap<String, HashMap<String, u64>> = self
            .cells
            .into_iter()
            .filter(|(_, row)| !row.is_empty())
            .collect();
        let x_values: Vec<String> = self
            .x_values
            .into_iter()
            .filter(|x| cells.contains_key(x))
            .collect();
        debug!(
            "build: {:?} x-values, {:?} y-values for {:?} x {:?}",
            x_values.len(),
            self.y_values.len(),
            self.x.column,
            self.y.column
        );
        CrossTab {
            cells,
            x_values,
            y_values: self.y_values,
            x_occurrence: self.x_occurrence,
            y_occurrence: self.y_occurrence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(x: &str, y: &str) -> Record {
        Record::new(
            None,
            vec![
                ("1.Q".to_string(), x.to_string()),
                ("2.Q".to_string(), y.to_string()),
            ],
        )
    }

    fn build(records: &[Record]) -> CrossTab {
        let mut builder = CrossTabBuilder::new(Question::new("1.Q"), Question::new("2.Q"));
        builder.add_records(records);
        builder.build()
    }

    #[test]
    fn empty_tokens_do_not_pair() {
        let tab = build(&[record("A;", "X"), record("B", ";")]);
        assert_eq!(tab.x_values(), &["A".to_string()]);
        assert_eq!(tab.get("A", "X"), Some(1));
        assert!(tab.row("").is_none());
        assert!(tab.row("B").is_none());
        // Slots are kept for the x-values without pairs.
        assert_eq!(tab.x_occurrence().get(""), Some(&0));
        assert_eq!(tab.x_occurrence().get("B"), Some(&0));
    }

    #[test]
    fn occurrence_counts_respondents_once() {
        let tab = build(&[record("A", "X;Y;Z"), record("A", "X")]);
        assert_eq!(tab.x_occurrence().get("A"), Some(&2));
        assert_eq!(tab.get("A", "X"), Some(2));
        assert_eq!(tab.y_occurrence().get("Y"), Some(&1));
    }

    #[test]
    fn repeated_x_token_in_one_answer() {
        let tab = build(&[record("A;A", "X"), record("A;B;A", "X;Y")]);
        assert_eq!(tab.get("A", "X"), Some(2));
        assert_eq!(tab.get("A", "Y"), Some(1));
        assert_eq!(tab.x_occurrence().get("A"), Some(&2));
        assert_eq!(tab.x_occurrence().get("B"), Some(&1));
        // A row never holds more pairs than its respondents times their y-tokens.
        let max_y_tokens = 2;
        for x in tab.x_values() {
            let sum: u64 = tab.row(x).unwrap().values().sum();
            assert!(sum <= tab.x_occurrence()[x] * max_y_tokens);
        }
        assert_eq!(crate::cell_label(tab.get("A", "X").unwrap(), tab.x_occurrence()["A"]), "100.0% (2/2)");
    }

    #[test]
    fn y_values_seen_without_partner() {
        let tab = build(&[record("", "X"), record("A", "Y")]);
        assert_eq!(tab.y_values(), &["X".to_string(), "Y".to_string()]);
        assert_eq!(tab.y_occurrence().get("X"), Some(&0));
        assert_eq!(tab.y_occurrence().get("Y"), Some(&1));
    }

    #[test]
    fn custom_delimiter() {
        let mut builder = CrossTabBuilder::new(Question::new("1.Q"), Question::new("2.Q"))
            .delimiter(',');
        builder.add_record(&record("A,B", "X;Y"));
        let tab = builder.build();
        assert_eq!(tab.get("A", "X;Y"), Some(1));
        assert_eq!(tab.get("B", "X;Y"), Some(1));
    }

    #[test]
    fn missing_column_is_skipped() {
        let mut builder = CrossTabBuilder::new(Question::new("1.Q"), Question::new("3.Q"));
        builder.add_record(&record("A", "X"));
        assert!(builder.build().is_empty());
    }
}
