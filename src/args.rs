use clap::{Parser, Subcommand};

/// This is a cross-tabulation program for survey exports with multi-select answers.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    /// (file path, optional) A JSON file with the settings of the survey: delimiter, consent question,
    /// ranking of the ordinal answers, transforms of the questions, etc. See the manual of the crosstab library.
    #[clap(short, long, value_parser, global = true)]
    pub config: Option<String>,

    /// (default from the file extension) The type of the input: csv or xlsx.
    /// Setting this option overrides the type that may be specified with the --config option.
    #[clap(long, value_parser, global = true)]
    pub input_type: Option<String>,

    /// When using an Excel file with several worksheets, indicates the name of the worksheet to use.
    #[clap(long, value_parser, global = true)]
    pub excel_worksheet_name: Option<String>,

    /// (directory path) Where the charts are written. Setting this option overrides the directory that may be
    /// specified with the --config option.
    #[clap(long, value_parser, global = true)]
    pub output_dir: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Draws the charts of one question (x axis) against another one (y axis).
    #[clap(name = "plot")]
    Plot {
        /// (file path) The survey results (CSV or Excel export).
        #[clap(value_parser)]
        input: String,
        /// The identifier of the question on the x axis (the number before the first '.').
        #[clap(short = 'x', long = "x", value_parser)]
        x_id: String,
        /// The identifier of the question on the y axis.
        #[clap(short = 'y', long = "y", value_parser)]
        y_id: String,
        /// (file path, 'stdout' or empty) If specified, the chart data will be written in JSON format to the
        /// given location.
        #[clap(short, long, value_parser)]
        out: Option<String>,
        /// (file path) A reference file containing the chart data in JSON format. If provided, the computed
        /// chart data must match the reference.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
    /// Draws the charts of every pair of questions and packs them in a zip archive.
    #[clap(name = "plot_all")]
    PlotAll {
        /// (file path) The survey results (CSV or Excel export).
        #[clap(value_parser)]
        input: String,
        /// Stops at the first pair of questions that cannot be charted, instead of skipping it.
        #[clap(long, takes_value = false)]
        fail_fast: bool,
    },
    /// Counts the words of the answers to one question.
    #[clap(name = "word_cloud")]
    WordCloud {
        /// (file path) The survey results (CSV or Excel export).
        #[clap(value_parser)]
        input: String,
        /// The identifier of the question.
        #[clap(short, long, value_parser)]
        question: String,
    },
    /// Writes the valid and unique results to filtered_<input>.
    #[clap(name = "filter")]
    Filter {
        /// (file path) The survey results (CSV or Excel export).
        #[clap(value_parser)]
        input: String,
    },
}
