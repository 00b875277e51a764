//! Deterministic row reduction.
//!
//! Rows are kept at a fixed stride from the first row. No randomness is
//! involved, so the same table always yields the same sample.

use polars::prelude::{DataFrame, IdxCa, IdxSize, PolarsResult};

/// Outcome of [`Sampler::apply`].
#[derive(Debug, Clone)]
pub struct Sampled {
    pub df: DataFrame,
    pub original_rows: usize,
    pub sampled: bool,
}

impl Sampled {
    pub fn kept_rows(&self) -> usize {
        self.df.height()
    }

    /// Warning text for a sampled table; `None` when nothing was dropped.
    pub fn warning(&self) -> Option<String> {
        self.sampled.then(|| {
            format!(
                "Data sampled from {} to {} rows",
                self.original_rows,
                self.kept_rows()
            )
        })
    }
}

/// Row and cell caps that trigger equidistant sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sampler {
    max_rows: usize,
    max_cells: usize,
}

impl Sampler {
    pub fn new(max_rows: usize, max_cells: usize) -> Self {
        Self {
            max_rows: max_rows.max(1),
            max_cells: max_cells.max(1),
        }
    }

    /// Whether a table of this shape exceeds either cap.
    pub fn needs_sampling(&self, rows: usize, cols: usize) -> bool {
        rows.saturating_mul(cols) > self.max_cells || rows > self.max_rows
    }

    /// Rows kept for a table with `cols` columns.
    pub fn target_rows(&self, cols: usize) -> usize {
        self.max_rows.min(self.max_cells / cols.max(1)).max(1)
    }

    /// Indices to keep, or `None` when the table fits.
    pub fn plan(&self, rows: usize, cols: usize) -> Option<Vec<usize>> {
        if !self.needs_sampling(rows, cols) {
            return None;
        }
        Some(equidistant_indices(rows, self.target_rows(cols)))
    }

    pub fn apply(&self, df: DataFrame) -> PolarsResult<Sampled> {
        let original_rows = df.height();
        let Some(indices) = self.plan(original_rows, df.width()) else {
            return Ok(Sampled {
                df,
                original_rows,
                sampled: false,
            });
        };
        let df = take_rows(&df, &indices)?;
        tracing::debug!(
            original_rows,
            kept_rows = df.height(),
            "sampled table"
        );
        Ok(Sampled {
            df,
            original_rows,
            sampled: true,
        })
    }
}

/// Indices `0, step, 2·step, …` with `step = total / target`, at most
/// `target` of them.
pub fn equidistant_indices(total: usize, target: usize) -> Vec<usize> {
    if total == 0 || target == 0 {
        return Vec::new();
    }
    if target >= total {
        return (0..total).collect();
    }
    let step = (total / target).max(1);
    (0..total).step_by(step).take(target).collect()
}

/// Gathers the given rows in order.
pub fn take_rows(df: &DataFrame, indices: &[usize]) -> PolarsResult<DataFrame> {
    let indices: Vec<IdxSize> = indices.iter().map(|&idx| idx as IdxSize).collect();
    let idx = IdxCa::from_vec("idx".into(), indices);
    df.take(&idx)
}
