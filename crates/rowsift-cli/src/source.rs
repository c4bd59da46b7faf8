use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rowsift_core::{Column, Table};
use rowsift_resample::{DataSource, SourceError};

use crate::errors::CliError;

/// Bootstrap source: every column is drawn independently, with replacement,
/// from the observed values of the reference table. Cross-column structure
/// is not preserved, which is what the constraint pipeline is for.
#[derive(Debug)]
pub struct MarginalSource {
    data: Table,
    rng: ChaCha8Rng,
}

impl MarginalSource {
    pub fn new(data: Table, seed: u64) -> Result<Self, CliError> {
        if data.is_empty() {
            return Err(CliError::InvalidInput(
                "cannot bootstrap from an empty table".to_string(),
            ));
        }
        Ok(Self {
            data,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }
}

impl DataSource for MarginalSource {
    fn sample(&mut self, n: usize) -> Result<Table, SourceError> {
        let rows = self.data.n_rows();
        let mut columns = Vec::with_capacity(self.data.n_cols());
        for column in self.data.columns() {
            let mut values = Vec::with_capacity(n);
            for _ in 0..n {
                let row = self.rng.random_range(0..rows);
                values.push(column.values()[row].clone());
            }
            columns.push(Column::new(column.name(), column.dtype(), values)?);
        }
        Ok(Table::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use rowsift_core::Value;

    use super::*;

    fn reference() -> Table {
        Table::new(vec![
            Column::infer("a", vec![Value::Int(1), Value::Int(2), Value::Int(3)]).expect("a"),
            Column::infer("b", vec!["x".into(), "y".into(), Value::Null]).expect("b"),
        ])
        .expect("table")
    }

    #[test]
    fn samples_only_observed_values() {
        let data = reference();
        let mut source = MarginalSource::new(data.clone(), 1).expect("source");
        let batch = source.sample(50).expect("sample");

        assert_eq!(batch.n_rows(), 50);
        assert_eq!(batch.schema(), data.schema());
        for (column, observed) in batch.columns().iter().zip(data.columns()) {
            assert!(column.values().iter().all(|value| observed.values().contains(value)));
        }
    }

    #[test]
    fn same_seed_same_batches() {
        let mut first = MarginalSource::new(reference(), 9).expect("source");
        let mut second = MarginalSource::new(reference(), 9).expect("source");
        assert_eq!(
            first.sample(20).expect("sample"),
            second.sample(20).expect("sample")
        );
    }

    #[test]
    fn empty_reference_is_rejected() {
        let empty = reference().take(&[]);
        assert!(MarginalSource::new(empty, 1).is_err());
    }
}
