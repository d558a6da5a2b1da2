//! Train/eval split over the valid records

use std::fmt;

use rand::SeedableRng;
use rand::rngs::StdRng;

/// How evaluation records are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    /// A run of records starting at `start`
    Contiguous { start: usize },
    /// Uniform sample without replacement; seeded runs are reproducible
    Random { seed: Option<u64> },
}

impl Default for SplitStrategy {
    fn default() -> Self {
        Self::Random { seed: None }
    }
}

/// Fatal split configuration errors
#[derive(Debug, Clone, PartialEq)]
pub enum SplitError {
    /// Fraction outside [0, 1] or NaN
    InvalidFraction(f64),
    /// Contiguous start beyond the last valid index
    StartOutOfBounds { start: usize, len: usize },
}

impl fmt::Display for SplitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFraction(p) => {
                write!(f, "evaluation fraction must be within [0, 1], got {p}")
            }
            Self::StartOutOfBounds { start, len } => write!(
                f,
                "evaluation start index {start} out of bounds for {len} records"
            ),
        }
    }
}

impl std::error::Error for SplitError {}

pub fn validate_fraction(fraction: f64) -> Result<(), SplitError> {
    if (0.0..=1.0).contains(&fraction) {
        Ok(())
    } else {
        Err(SplitError::InvalidFraction(fraction))
    }
}

/// `round(len * fraction)`, rounding half away from zero
pub fn eval_count(len: usize, fraction: f64) -> usize {
    ((len as f64 * fraction).round() as usize).min(len)
}

/// Chosen evaluation indices, strictly ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalSelection {
    pub indices: Vec<usize>,
    /// Count asked for before any truncation
    pub requested: usize,
}

impl EvalSelection {
    /// Records missing from a truncated contiguous range
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.indices.len())
    }
}

/// Pick evaluation indices into a slice of `len` valid records.
///
/// A contiguous range is `[start, min(start + k, len - 1))`: it never reaches
/// the last record, and a range running past that point is truncated with a
/// warning rather than failing.
pub fn select_eval_indices(
    len: usize,
    fraction: f64,
    strategy: SplitStrategy,
) -> Result<EvalSelection, SplitError> {
    validate_fraction(fraction)?;
    let requested = eval_count(len, fraction);

    let indices = match strategy {
        SplitStrategy::Contiguous { start } => {
            if len == 0 || start > len - 1 {
                return Err(SplitError::StartOutOfBounds { start, len });
            }
            let end = start.saturating_add(requested).min(len - 1);
            (start..end).collect()
        }
        SplitStrategy::Random { seed } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let mut indices = rand::seq::index::sample(&mut rng, len, requested).into_vec();
            indices.sort_unstable();
            indices
        }
    };

    let selection = EvalSelection { indices, requested };
    if selection.shortfall() > 0 {
        log::warn!(
            "Evaluation range truncated at the end of the corpus: {} of {} requested records selected ({} short)",
            selection.indices.len(),
            selection.requested,
            selection.shortfall()
        );
    }
    Ok(selection)
}

/// Split `records` into (train, eval) with one pass over both sequences.
///
/// `eval_indices` must be strictly ascending. Relative order is kept in
/// both halves.
pub fn partition<'a, T>(records: &'a [T], eval_indices: &[usize]) -> (Vec<&'a T>, Vec<&'a T>) {
    let mut train = Vec::with_capacity(records.len().saturating_sub(eval_indices.len()));
    let mut eval = Vec::with_capacity(eval_indices.len());
    let mut next = eval_indices.iter().peekable();

    for (i, record) in records.iter().enumerate() {
        if next.next_if_eq(&&i).is_some() {
            eval.push(record);
        } else {
            train.push(record);
        }
    }
    (train, eval)
}
