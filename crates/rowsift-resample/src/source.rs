use rowsift_core::Table;

/// Error type returned by collaborators.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Produces candidate rows on demand, e.g. a fitted synthesizer.
pub trait DataSource {
    /// Draw `n` new rows. Calls may be slow; the loop bounds them only by
    /// its trial budget.
    fn sample(&mut self, n: usize) -> Result<Table, SourceError>;
}

impl<F> DataSource for F
where
    F: FnMut(usize) -> Result<Table, SourceError>,
{
    fn sample(&mut self, n: usize) -> Result<Table, SourceError> {
        self(n)
    }
}

/// Maps sampled rows back to the original representation before filtering.
pub trait InverseTransform {
    fn inverse_transform(&self, table: Table) -> Result<Table, SourceError>;
}

impl<F> InverseTransform for F
where
    F: Fn(Table) -> Result<Table, SourceError>,
{
    fn inverse_transform(&self, table: Table) -> Result<Table, SourceError> {
        self(table)
    }
}
