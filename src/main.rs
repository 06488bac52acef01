mod args;
mod survey;

use clap::Parser;
use log::{debug, info};
use snafu::ErrorCompat;

use crate::args::{Args, Command};
use crate::survey::config_reader::{
    read_config, validate_config, InputType, SurveyConfig, SurveySettings,
};
use crate::survey::{PlotOutputs, SurveyResult};

fn settings_from_args(args: &Args) -> SurveyResult<SurveySettings> {
    let config: SurveyConfig = match &args.config {
        Some(path) => read_config(path)?,
        None => SurveyConfig::default(),
    };
    let mut settings = validate_config(&config)?;
    if let Some(it) = &args.input_type {
        settings.input_type = Some(InputType::parse(it)?);
    }
    if let Some(name) = &args.excel_worksheet_name {
        settings.excel_worksheet_name = Some(name.clone());
    }
    if let Some(dir) = &args.output_dir {
        settings.output_directory = dir.clone();
    }
    debug!("settings: {:?}", settings);
    Ok(settings)
}

fn run(args: &Args) -> SurveyResult<()> {
    let settings = settings_from_args(args)?;
    match &args.command {
        Command::Plot {
            input,
            x_id,
            y_id,
            out,
            reference,
        } => {
            let outputs = PlotOutputs {
                out: out.clone(),
                reference: reference.clone(),
            };
            survey::run_plot(input, x_id, y_id, &settings, &outputs)?;
        }
        Command::PlotAll { input, fail_fast } => {
            let summary = survey::run_plot_all(input, &settings, *fail_fast)?;
            info!(
                "{} charts archived to {}",
                summary.charts,
                summary.archive.display()
            );
        }
        Command::WordCloud { input, question } => {
            survey::run_word_cloud(input, question, &settings)?;
        }
        Command::Filter { input } => {
            survey::run_filter(input, &settings)?;
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    debug!("args: {:?}", args);

    if let Err(e) = run(&args) {
        eprintln!("An error occured: {}", e);
        for cause in e.iter_chain().skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
