use std::collections::BTreeMap;

use rowsift_constraints::{Diagnostic, Diagnostics};
use rowsift_core::Table;
use serde::{Deserialize, Serialize};

/// Options for the resample loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleOptions {
    /// Trial budget. The loop stops with a partial result once it is spent.
    pub max_trials: u32,
    /// Oversampling multiplier: each trial requests
    /// `ceil(sampling_ratio * target_rows)` rows.
    pub sampling_ratio: f64,
    /// Emit a progress event every this many trials (0 disables it).
    pub progress_every: u32,
    /// Seed for the final uniform subsample.
    pub seed: u64,
}

impl Default for ResampleOptions {
    fn default() -> Self {
        Self {
            max_trials: 300,
            sampling_ratio: 10.0,
            progress_every: 10,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleStatus {
    /// Exactly `target_rows` rows were produced.
    Done,
    /// The trial budget ran out first; the table may be short.
    Aborted,
}

/// Result of one `resample_until_satisfy` call.
#[derive(Debug, Clone)]
pub struct ResampleOutcome {
    pub table: Table,
    pub target_rows: usize,
    pub trials: u32,
    pub status: ResampleStatus,
    pub diagnostics: Diagnostics,
    pub duration_ms: u64,
}

impl ResampleOutcome {
    pub fn is_done(&self) -> bool {
        self.status == ResampleStatus::Done
    }

    /// Serializable summary of the run under a fresh run id.
    pub fn report(&self, options: &ResampleOptions) -> ResampleReport {
        ResampleReport {
            run_id: uuid::Uuid::new_v4().to_string(),
            status: self.status,
            rows_requested: self.target_rows as u64,
            rows_generated: self.table.n_rows() as u64,
            trials: self.trials,
            max_trials: options.max_trials,
            sampling_ratio: options.sampling_ratio,
            seed: options.seed,
            duration_ms: self.duration_ms,
            warnings_by_code: self.diagnostics.warnings_by_code.clone(),
            warnings: self.diagnostics.warnings.clone(),
        }
    }
}

/// Report for a resample run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResampleReport {
    pub run_id: String,
    pub status: ResampleStatus,
    pub rows_requested: u64,
    pub rows_generated: u64,
    pub trials: u32,
    pub max_trials: u32,
    pub sampling_ratio: f64,
    pub seed: u64,
    pub duration_ms: u64,
    pub warnings_by_code: BTreeMap<String, u64>,
    pub warnings: Vec<Diagnostic>,
}
