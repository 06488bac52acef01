use crate::survey::*;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RankedLabel {
    pub label: String,
    pub rank: i64,
}

/// The settings of a survey, as read from the JSON configuration file.
///
/// All the fields are optional. The defaults follow the exports of the
/// German Google Forms survey this tool was first written for.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "inputType")]
    pub input_type: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "timestampColumns")]
    pub timestamp_columns: Option<Vec<String>>,
    #[serde(rename = "consentQuestion")]
    pub consent_question: Option<String>,
    #[serde(rename = "consentRejectMarker")]
    pub consent_reject_marker: Option<String>,
    pub delimiter: Option<String>,
    #[serde(rename = "ordinalRanking")]
    pub ordinal_ranking: Option<Vec<RankedLabel>>,
    #[serde(rename = "questionTransforms")]
    pub question_transforms: Option<BTreeMap<String, String>>,
    pub normalization: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "chartWidth")]
    pub chart_width: Option<u32>,
    #[serde(rename = "chartHeight")]
    pub chart_height: Option<u32>,
}

/// The validated settings used by the commands.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveySettings {
    pub input_type: Option<InputType>,
    pub excel_worksheet_name: Option<String>,
    pub timestamp_columns: Vec<String>,
    pub consent_question: Option<String>,
    pub consent_reject_marker: String,
    pub delimiter: char,
    pub ranking: OrdinalRanking,
    pub transforms: BTreeMap<String, TokenTransform>,
    pub normalization: Normalization,
    pub output_directory: String,
    pub chart_size: (u32, u32),
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputType {
    Csv,
    Xlsx,
}

impl InputType {
    pub fn parse(s: &str) -> SurveyResult<InputType> {
        match s {
            "csv" => Ok(InputType::Csv),
            "xlsx" | "excel" => Ok(InputType::Xlsx),
            x => whatever!("Unknown input type {:?}", x),
        }
    }

    /// Guesses the type from the extension of the file, CSV being the default.
    pub fn from_path(path: &str) -> InputType {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("xlsx") | Some("xlsm") => InputType::Xlsx,
            _ => InputType::Csv,
        }
    }
}

impl SurveySettings {
    /// The transform applied to the tokens of the given question.
    pub fn transform(&self, question_id: &str) -> TokenTransform {
        self.transforms
            .get(question_id)
            .cloned()
            .unwrap_or(TokenTransform::Identity)
    }

    pub fn rules(&self) -> PivotRules {
        PivotRules {
            normalization: self.normalization,
            delimiter: self.delimiter,
            ..PivotRules::DEFAULT_RULES
        }
    }
}

pub fn default_ranking() -> Vec<RankedLabel> {
    [
        ("immer", 12),
        ("mehrmals täglich", 11),
        ("täglich", 10),
        ("mehrmals die Woche", 8),
        ("häufig", 7),
        ("einmal die Woche", 5),
        ("manchmal", 4),
        ("seltener", 3),
        ("selten", 2),
        ("nie", 1),
        ("weiß nicht", 0),
    ]
    .iter()
    .map(|(label, rank)| RankedLabel {
        label: label.to_string(),
        rank: *rank,
    })
    .collect()
}

fn parse_transform(s: &str) -> SurveyResult<TokenTransform> {
    match s {
        "identity" => Ok(TokenTransform::Identity),
        "firstWord" => Ok(TokenTransform::FirstWord),
        x => whatever!("Unknown question transform {:?}", x),
    }
}

fn parse_normalization(s: &str) -> SurveyResult<Normalization> {
    match s {
        "percentage" => Ok(Normalization::Percentage),
        "magnitude" => Ok(Normalization::Magnitude),
        x => whatever!("Unknown normalization {:?}", x),
    }
}

pub fn read_config(path: &str) -> SurveyResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: SurveyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn validate_config(config: &SurveyConfig) -> SurveyResult<SurveySettings> {
    let delimiter: char = match config.delimiter.as_deref() {
        None => ';',
        Some(d) => {
            let mut chars = d.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => whatever!("The delimiter must be a single character, got {:?}", d),
            }
        }
    };

    let ranking: Vec<(String, i64)> = config
        .ordinal_ranking
        .clone()
        .unwrap_or_else(default_ranking)
        .into_iter()
        .map(|rl| (rl.label, rl.rank))
        .collect();

    let transforms: BTreeMap<String, TokenTransform> = match &config.question_transforms {
        Some(m) => {
            let mut res = BTreeMap::new();
            for (qid, t) in m.iter() {
                res.insert(qid.clone(), parse_transform(t)?);
            }
            res
        }
        None => [("25".to_string(), TokenTransform::FirstWord)]
            .into_iter()
            .collect(),
    };

    let res = SurveySettings {
        input_type: match &config.input_type {
            Some(s) => Some(InputType::parse(s)?),
            None => None,
        },
        excel_worksheet_name: config.excel_worksheet_name.clone(),
        timestamp_columns: config
            .timestamp_columns
            .clone()
            .unwrap_or_else(|| vec!["Timestamp".to_string(), "Zeitstempel".to_string()]),
        consent_question: match &config.consent_question {
            Some(q) if q.is_empty() => None,
            Some(q) => Some(q.clone()),
            None => Some("1".to_string()),
        },
        consent_reject_marker: config
            .consent_reject_marker
            .clone()
            .unwrap_or_else(|| "keine".to_string()),
        delimiter,
        ranking: OrdinalRanking::new(&ranking),
        transforms,
        normalization: match &config.normalization {
            Some(s) => parse_normalization(s)?,
            None => Normalization::Percentage,
        },
        output_directory: config
            .output_directory
            .clone()
            .unwrap_or_else(|| ".".to_string()),
        chart_size: (
            config.chart_width.unwrap_or(1366),
            config.chart_height.unwrap_or(768),
        ),
    };
    Ok(res)
}
