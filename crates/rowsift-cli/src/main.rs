mod errors;
mod io;
mod logging;
mod source;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use rowsift_constraints::{
    ConstraintPipeline, Diagnostic, Diagnostics, config_json_schema, load_config,
    validate_config_json,
};
use rowsift_resample::{ResampleOptions, Resampler};
use serde::Serialize;

use errors::CliError;
use io::{read_table_csv, write_table_csv};
use logging::init_logging;
use source::MarginalSource;

#[derive(Parser, Debug)]
#[command(
    name = "rowsift",
    version,
    about = "Declarative row filtering and rejection sampling for CSV data"
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
    /// Append logs to this file instead of stderr.
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a constraint configuration, optionally against a CSV header.
    Check(CheckArgs),
    /// Apply a constraint configuration to a CSV file.
    Filter(FilterArgs),
    /// Bootstrap rows from a CSV file until enough pass the constraints.
    Resample(ResampleArgs),
    /// Print the JSON Schema of the constraint configuration.
    Schema,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Constraint configuration (.json or .toml).
    #[arg(long, short)]
    config: PathBuf,
    /// CSV file whose columns must cover every referenced field.
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Constraint configuration (.json or .toml).
    #[arg(long, short)]
    config: PathBuf,
    /// Input CSV file.
    #[arg(long, short)]
    input: PathBuf,
    /// Output CSV file.
    #[arg(long, short)]
    output: PathBuf,
    /// Optional JSON file for the diagnostics raised while filtering.
    #[arg(long)]
    diagnostics: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ResampleArgs {
    /// Constraint configuration (.json or .toml).
    #[arg(long, short)]
    config: PathBuf,
    /// Reference CSV file the rows are bootstrapped from.
    #[arg(long, short)]
    input: PathBuf,
    /// Output CSV file.
    #[arg(long, short)]
    output: PathBuf,
    /// Number of rows to produce.
    #[arg(long, short = 'n')]
    rows: usize,
    /// Maximum number of sampling rounds.
    #[arg(long, default_value_t = 300)]
    max_trials: u32,
    /// Rows requested per round, as a multiple of --rows.
    #[arg(long, default_value_t = 10.0)]
    sampling_ratio: f64,
    /// Log progress every N rounds (0 disables it).
    #[arg(long, default_value_t = 10)]
    progress_every: u32,
    /// Seed for bootstrapping and the final subsample.
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Optional JSON file for the run report.
    #[arg(long)]
    report: Option<PathBuf>,
}

/// Printed by `check`.
#[derive(Debug, Serialize)]
struct CheckSummary {
    kinds: Vec<String>,
    fields: Vec<String>,
    warnings: Vec<Diagnostic>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.log_json, cli.log_file.as_deref())?;

    match cli.command {
        Command::Check(args) => run_check(args),
        Command::Filter(args) => run_filter(args),
        Command::Resample(args) => run_resample(args),
        Command::Schema => {
            let json = serde_json::to_string_pretty(&config_json_schema())?;
            println!("{json}");
            Ok(())
        }
    }
}

fn build_pipeline(path: &Path) -> Result<ConstraintPipeline, CliError> {
    let config = load_config(path)?;
    let violations = validate_config_json(&serde_json::to_value(&config)?)?;
    if !violations.is_empty() {
        return Err(CliError::InvalidConfig(format!(
            "{} violates the configuration schema ({} issue(s), first: {})",
            path.display(),
            violations.len(),
            violations
                .iter()
                .next()
                .map(|issue| format!("{}: {}", issue.rule, issue.message))
                .unwrap_or_default()
        )));
    }
    let pipeline = ConstraintPipeline::from_config(&config)?;
    tracing::info!(
        event = "config_loaded",
        path = %path.display(),
        kinds = ?pipeline.kinds().collect::<Vec<_>>()
    );
    Ok(pipeline)
}

fn run_check(args: CheckArgs) -> Result<(), CliError> {
    let pipeline = build_pipeline(&args.config)?;
    if let Some(csv) = &args.csv {
        let table = read_table_csv(csv)?;
        pipeline.validate(&table)?;
        tracing::info!(event = "fields_validated", csv = %csv.display());
    }

    let summary = CheckSummary {
        kinds: pipeline.kinds().map(str::to_string).collect(),
        fields: pipeline.fields().into_iter().collect(),
        warnings: pipeline.build_diagnostics().warnings.clone(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_filter(args: FilterArgs) -> Result<(), CliError> {
    let timer = Instant::now();
    let pipeline = build_pipeline(&args.config)?;
    let table = read_table_csv(&args.input)?;

    let mut diagnostics = Diagnostics::new();
    diagnostics.merge(pipeline.build_diagnostics().clone());
    let filtered = pipeline.apply(&table, &mut diagnostics)?;
    write_table_csv(&args.output, &filtered)?;

    if let Some(path) = &args.diagnostics {
        std::fs::write(path, serde_json::to_vec_pretty(&diagnostics)?)?;
    }

    tracing::info!(
        event = "filter_finished",
        rows_in = table.n_rows(),
        rows_out = filtered.n_rows(),
        warnings = diagnostics.len(),
        output = %args.output.display(),
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(())
}

fn run_resample(args: ResampleArgs) -> Result<(), CliError> {
    let pipeline = build_pipeline(&args.config)?;
    let data = read_table_csv(&args.input)?;
    let options = ResampleOptions {
        max_trials: args.max_trials,
        sampling_ratio: args.sampling_ratio,
        progress_every: args.progress_every,
        seed: args.seed,
    };

    let mut source = MarginalSource::new(data.clone(), args.seed)?;
    let mut resampler = Resampler::new(pipeline, options);
    let outcome = resampler.resample_until_satisfy(&data, args.rows, &mut source, None)?;
    write_table_csv(&args.output, &outcome.table)?;

    let report = outcome.report(resampler.options());
    if let Some(path) = &args.report {
        std::fs::write(path, serde_json::to_vec_pretty(&report)?)?;
    }

    tracing::info!(
        event = "resample_finished",
        run_id = %report.run_id,
        status = ?report.status,
        rows = report.rows_generated,
        trials = report.trials,
        output = %args.output.display()
    );
    Ok(())
}
