use std::time::Instant;

use rowsift_constraints::{ConstraintPipeline, Diagnostic, Diagnostics};
use rowsift_core::Table;
use tracing::{info, warn};

use crate::errors::{ResampleError, Result};
use crate::model::{ResampleOptions, ResampleOutcome, ResampleStatus};
use crate::source::{DataSource, InverseTransform};

/// Drives a data source until the constraint pipeline has let through
/// enough distinct rows.
///
/// A `Resampler` keeps no state between calls apart from the trial count of
/// the most recent run.
#[derive(Debug)]
pub struct Resampler {
    pipeline: ConstraintPipeline,
    options: ResampleOptions,
    trials: u32,
}

impl Resampler {
    pub fn new(pipeline: ConstraintPipeline, options: ResampleOptions) -> Self {
        Self {
            pipeline,
            options,
            trials: 0,
        }
    }

    pub fn pipeline(&self) -> &ConstraintPipeline {
        &self.pipeline
    }

    pub fn options(&self) -> &ResampleOptions {
        &self.options
    }

    /// Trials used by the last run.
    pub fn trials(&self) -> u32 {
        self.trials
    }

    /// Rows requested from the source per trial.
    pub fn batch_rows(&self, target_rows: usize) -> usize {
        let rows = (self.options.sampling_ratio * target_rows as f64).ceil();
        (rows as usize).max(1)
    }

    /// Oversample, filter and accumulate until `target_rows` distinct rows
    /// pass the pipeline or the trial budget runs out.
    ///
    /// `data` is the reference table the source was fitted on; it must be
    /// non-empty and contain every field the pipeline references. On success
    /// the table holds exactly `target_rows` rows, uniformly subsampled with
    /// the configured seed. When the budget runs out the accumulated rows
    /// are returned with `ResampleStatus::Aborted` and a
    /// `resample_exhausted` diagnostic.
    pub fn resample_until_satisfy(
        &mut self,
        data: &Table,
        target_rows: usize,
        source: &mut dyn DataSource,
        inverse: Option<&dyn InverseTransform>,
    ) -> Result<ResampleOutcome> {
        self.check_preconditions(data, target_rows)?;
        self.trials = 0;

        let start = Instant::now();
        let batch_rows = self.batch_rows(target_rows);
        let mut diagnostics = Diagnostics::new();
        diagnostics.merge(self.pipeline.build_diagnostics().clone());
        let mut accumulated: Option<Table> = None;

        info!(
            target_rows,
            batch_rows,
            max_trials = self.options.max_trials,
            constraints = self.pipeline.len(),
            "resample started"
        );

        while self.trials < self.options.max_trials {
            self.trials += 1;

            let mut batch = source.sample(batch_rows).map_err(ResampleError::Source)?;
            if let Some(inverse) = inverse {
                batch = inverse
                    .inverse_transform(batch)
                    .map_err(ResampleError::Source)?;
            }
            let passed = self.pipeline.apply(&batch, &mut diagnostics)?;

            let merged = match accumulated.take() {
                Some(current) => current.concat(&passed)?,
                None => passed,
            };
            let merged = merged.drop_duplicates();
            let rows = merged.n_rows();

            if self.options.progress_every > 0 && self.trials % self.options.progress_every == 0 {
                info!(
                    trial = self.trials,
                    accumulated = rows,
                    target_rows,
                    "resample progress"
                );
            }

            if rows >= target_rows {
                let table = merged.sample_rows(target_rows, self.options.seed);
                info!(
                    trials = self.trials,
                    rows = table.n_rows(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "resample finished"
                );
                return Ok(self.outcome(
                    table,
                    target_rows,
                    ResampleStatus::Done,
                    diagnostics,
                    start,
                ));
            }
            accumulated = Some(merged);
        }

        let table = accumulated.unwrap_or_else(|| data.empty_like());
        warn!(
            trials = self.trials,
            rows = table.n_rows(),
            target_rows,
            "resample trial budget exhausted"
        );
        diagnostics.record(Diagnostic::new(
            "resample_exhausted",
            "resample",
            format!("max_trials={}", self.options.max_trials),
            format!(
                "reached {} of {target_rows} rows after {} trials",
                table.n_rows(),
                self.trials
            ),
        ));
        Ok(self.outcome(table, target_rows, ResampleStatus::Aborted, diagnostics, start))
    }

    fn check_preconditions(&self, data: &Table, target_rows: usize) -> Result<()> {
        if target_rows == 0 {
            return Err(ResampleError::InvalidInput(
                "target_rows must be greater than zero".to_string(),
            ));
        }
        if data.is_empty() {
            return Err(ResampleError::InvalidInput(
                "reference data has no rows".to_string(),
            ));
        }
        let ratio = self.options.sampling_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ResampleError::InvalidInput(format!(
                "sampling_ratio must be a positive number, found {ratio}"
            )));
        }
        if self.options.max_trials == 0 {
            return Err(ResampleError::InvalidInput(
                "max_trials must be greater than zero".to_string(),
            ));
        }
        self.pipeline.validate(data)?;
        Ok(())
    }

    fn outcome(
        &self,
        table: Table,
        target_rows: usize,
        status: ResampleStatus,
        diagnostics: Diagnostics,
        start: Instant,
    ) -> ResampleOutcome {
        ResampleOutcome {
            table,
            target_rows,
            trials: self.trials,
            status,
            diagnostics,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// One-shot form of [`Resampler::resample_until_satisfy`].
pub fn resample_until_satisfy(
    data: &Table,
    target_rows: usize,
    pipeline: ConstraintPipeline,
    source: &mut dyn DataSource,
    inverse: Option<&dyn InverseTransform>,
    options: ResampleOptions,
) -> Result<ResampleOutcome> {
    Resampler::new(pipeline, options).resample_until_satisfy(data, target_rows, source, inverse)
}
