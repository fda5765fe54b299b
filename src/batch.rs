//! Row batch generation
//!
//! Each batch covers a contiguous, wrap-around run of `val0` keys starting at a
//! random offset, so batches from independent workers intersect without any
//! coordination between them.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::error::{HarnessError, Result};

/// Batch sizes used by the reference workload.
pub const DEFAULT_BATCH_SIZES: [usize; 4] = [10, 50, 100, 200];

/// Largest `max_value0` whose keys keep `val0 * 10` inside a signed 32-bit column.
pub const MAX_VALUE0_LIMIT: i64 = i32::MAX as i64 / 10 + 1;

/// One candidate row. `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Contention key in `[0, max_value0)`.
    pub val0: i64,
    /// Always `val0 * 10`.
    pub val1: i64,
    /// Random hex filler.
    pub padding: String,
}

impl Row {
    pub fn new(val0: i64, padding: String) -> Self {
        Self {
            val0,
            val1: val0 * 10,
            padding,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.val1 == self.val0 * 10
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowBatch {
    rows: Vec<Row>,
}

impl RowBatch {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The `val0` key set, in generation order.
    pub fn keys(&self) -> Vec<i64> {
        self.rows.iter().map(|r| r.val0).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Validated generation parameters shared by every worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchShape {
    batch_sizes: Vec<usize>,
    max_value0: i64,
    padding_size: usize,
}

impl BatchShape {
    /// `padding_size` is the width of the padding column in characters.
    pub fn new(batch_sizes: Vec<usize>, max_value0: i64, padding_size: usize) -> Result<Self> {
        if max_value0 <= 0 {
            return Err(HarnessError::config(format!(
                "max value0 must be positive, got {}",
                max_value0
            )));
        }
        if max_value0 > MAX_VALUE0_LIMIT {
            return Err(HarnessError::config(format!(
                "max value0 must be at most {} so val1 = val0 * 10 fits an int column, got {}",
                MAX_VALUE0_LIMIT, max_value0
            )));
        }
        if batch_sizes.is_empty() {
            return Err(HarnessError::config("batch size set is empty"));
        }
        if let Some(bad) = batch_sizes
            .iter()
            .find(|&&size| size == 0 || size as i64 > max_value0)
        {
            return Err(HarnessError::config(format!(
                "batch size {} must be in 1..={} so keys within a batch stay distinct",
                bad, max_value0
            )));
        }
        if padding_size < 2 {
            return Err(HarnessError::config(format!(
                "padding size must be at least 2, got {}",
                padding_size
            )));
        }
        Ok(Self {
            batch_sizes,
            max_value0,
            padding_size,
        })
    }

    pub fn batch_sizes(&self) -> &[usize] {
        &self.batch_sizes
    }

    pub fn max_value0(&self) -> i64 {
        self.max_value0
    }

    pub fn padding_size(&self) -> usize {
        self.padding_size
    }
}

/// Produces batches from an owned random source.
///
/// Generation is a pure function of the source state: two generators built
/// with the same seed yield the same sequence of batches.
pub struct RowBatchGenerator<R = StdRng> {
    shape: BatchShape,
    rng: R,
    padding_buf: Vec<u8>,
}

impl RowBatchGenerator<StdRng> {
    pub fn seeded(shape: BatchShape, seed: u64) -> Self {
        Self::with_rng(shape, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RowBatchGenerator<R> {
    pub fn with_rng(shape: BatchShape, rng: R) -> Self {
        let padding_buf = vec![0u8; shape.padding_size / 2];
        Self {
            shape,
            rng,
            padding_buf,
        }
    }

    pub fn generate(&mut self) -> RowBatch {
        let size = *self
            .shape
            .batch_sizes
            .choose(&mut self.rng)
            .unwrap_or(&DEFAULT_BATCH_SIZES[0]);
        let max = self.shape.max_value0;

        let mut val0 = self.rng.random_range(0..max);
        let mut rows = Vec::with_capacity(size);
        for _ in 0..size {
            self.rng.fill(self.padding_buf.as_mut_slice());
            rows.push(Row::new(val0, hex::encode(&self.padding_buf)));
            val0 = (val0 + 1) % max;
        }

        RowBatch { rows }
    }
}
