// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

/// One respondent, as handed over by the loader.
///
/// The fields keep the column order of the export. The `id` is the submission
/// timestamp (or any other key used for deduplication) and is not part of the
/// content of the record.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Record {
    pub id: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl Record {
    pub fn new(id: Option<String>, fields: Vec<(String, String)>) -> Record {
        Record { id, fields }
    }

    /// The answer stored under the given full column name.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    /// Equality of the answers, ignoring the id.
    pub fn content_eq(&self, other: &Record) -> bool {
        self.fields == other.fields
    }
}

/// A transformation applied to every token of a question before counting.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub enum TokenTransform {
    #[default]
    Identity,
    /// Keeps the part before the first space. Used for answers that carry a
    /// unit, e.g. `16 Jahre` becomes `16`.
    FirstWord,
}

impl TokenTransform {
    pub fn apply<'a>(&self, token: &'a str) -> &'a str {
        match self {
            TokenTransform::Identity => token,
            TokenTransform::FirstWord => token.split(' ').next().unwrap_or(token),
        }
    }
}

/// A question (a full column name) together with the transform of its tokens.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Question {
    pub column: String,
    pub transform: TokenTransform,
}

impl Question {
    pub fn new(column: &str) -> Question {
        Question {
            column: column.to_string(),
            transform: TokenTransform::Identity,
        }
    }

    pub fn with_transform(self, transform: TokenTransform) -> Question {
        Question { transform, ..self }
    }
}

// ******** Output data structures *********

/// The sparse co-occurrence table of two questions.
///
/// Invariants:
/// - every count in `cells` is strictly positive
/// - every x-value present in `cells` has at least one y-value
/// - `x_values` lists the keys of `cells` in the order they were first seen
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct CrossTab {
    pub(crate) cells: HashMap<String, HashMap<String, u64>>,
    pub(crate) x_values: Vec<String>,
    pub(crate) y_values: Vec<String>,
    pub(crate) x_occurrence: HashMap<String, u64>,
    pub(crate) y_occurrence: HashMap<String, u64>,
}

impl CrossTab {
    pub fn get(&self, x: &str, y: &str) -> Option<u64> {
        self.cells.get(x).and_then(|row| row.get(y)).cloned()
    }

    pub fn row(&self, x: &str) -> Option<&HashMap<String, u64>> {
        self.cells.get(x)
    }

    pub fn cells(&self) -> &HashMap<String, HashMap<String, u64>> {
        &self.cells
    }

    /// The x-values that have at least one pairing, in first-seen order.
    pub fn x_values(&self) -> &[String] {
        &self.x_values
    }

    /// All the non-empty y-values encountered, in first-seen order.
    pub fn y_values(&self) -> &[String] {
        &self.y_values
    }

    /// Number of respondents that paired each x-value with at least one y-value.
    pub fn x_occurrence(&self) -> &HashMap<String, u64> {
        &self.x_occurrence
    }

    /// Total number of pairings of each y-value, across all x-values.
    pub fn y_occurrence(&self) -> &HashMap<String, u64> {
        &self.y_occurrence
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The largest raw count in the row of `x`.
    pub fn row_max(&self, x: &str) -> Option<u64> {
        self.cells.get(x).and_then(|row| row.values().max().cloned())
    }

    /// The largest raw count of the whole table.
    pub fn global_max(&self) -> Option<u64> {
        self.cells
            .values()
            .filter_map(|row| row.values().max().cloned())
            .max()
    }
}

/// A raw count and the width of its bar after normalization.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct NormalizedCell {
    pub count: u64,
    pub width: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct NormalizedTable {
    pub normalization: Normalization,
    pub cells: HashMap<String, HashMap<String, NormalizedCell>>,
}

impl NormalizedTable {
    pub fn get(&self, x: &str, y: &str) -> Option<&NormalizedCell> {
        self.cells.get(x).and_then(|row| row.get(y))
    }
}

/// A group of bars on the x axis.
#[derive(PartialEq, Debug, Clone)]
pub struct XEntry {
    pub label: String,
    pub position: f64,
    pub occurrence: u64,
}

/// A bin on the y axis.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct YEntry {
    pub label: String,
    pub bin: usize,
    pub occurrence: u64,
}

/// One bar of the chart.
#[derive(PartialEq, Debug, Clone)]
pub struct ChartCell {
    pub x: String,
    pub y: String,
    pub count: u64,
    pub width: f64,
    pub label: String,
}

/// Everything a renderer needs to draw the chart of one pair of questions.
#[derive(PartialEq, Debug, Clone)]
pub struct ChartData {
    pub x_question: String,
    pub y_question: String,
    pub normalization: Normalization,
    pub x_order: AxisOrder,
    pub y_order: AxisOrder,
    pub xs: Vec<XEntry>,
    pub ys: Vec<YEntry>,
    /// Ordered by x then by y, following the axes.
    pub cells: Vec<ChartCell>,
    pub table: NormalizedTable,
}

/// Errors that prevent a pivot from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PivotErrors {
    /// No column starts with the given question identifier.
    QuestionNotFound(String),
    /// None of the x-values was paired with a y-value.
    EmptyTable,
    /// The x-value has a row in the table but no respondent counted for it.
    ZeroOccurrence(String),
}

impl Error for PivotErrors {}

impl Display for PivotErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PivotErrors::QuestionNotFound(id) => write!(f, "Question with ID {} not found", id),
            PivotErrors::EmptyTable => write!(f, "No pair of answers to tabulate"),
            PivotErrors::ZeroOccurrence(x) => {
                write!(f, "Answer {:?} has no respondent to normalize against", x)
            }
        }
    }
}

// ********* Configuration **********

/// How the values of an axis are ordered.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum AxisOrder {
    /// Following the rank of the labels in an [OrdinalRanking].
    Ordinal,
    /// By increasing marginal count, ties keep the first-seen order.
    Frequency,
}

/// The scaling policy for the width of the bars.
///
/// - Percentage divides each count by the number of respondents of its
/// x-value, then rescales so that the largest ratio of the chart is 100.
///
/// - Magnitude rescales each row so that its largest count equals the largest
/// count of the whole table. Only the shape of each row is kept.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Normalization {
    Percentage,
    Magnitude,
}

/// A ranking of known answer labels (typically frequency adverbs).
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct OrdinalRanking {
    ranks: HashMap<String, i64>,
}

impl OrdinalRanking {
    pub fn new(ranks: &[(String, i64)]) -> OrdinalRanking {
        OrdinalRanking {
            ranks: ranks.iter().cloned().collect(),
        }
    }

    pub fn rank(&self, label: &str) -> Option<i64> {
        self.ranks.get(label).cloned()
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PivotRules {
    pub normalization: Normalization,
    pub x_order: AxisOrder,
    pub y_order: AxisOrder,
    /// Separator of the values of a multi-select answer.
    pub delimiter: char,
}

impl PivotRules {
    pub const DEFAULT_RULES: PivotRules = PivotRules {
        normalization: Normalization::Percentage,
        x_order: AxisOrder::Ordinal,
        y_order: AxisOrder::Ordinal,
        delimiter: ';',
    };
}
