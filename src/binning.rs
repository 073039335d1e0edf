//! Five-way score binning with quantile, equal-width and neutral fallbacks

use std::fmt;

use thiserror::Error;

pub const SCORE_BINS: usize = 5;

/// Higher value, higher score (frequency, monetary)
pub const ASCENDING_LABELS: [u8; SCORE_BINS] = [1, 2, 3, 4, 5];
/// Lower value, higher score (recency)
pub const DESCENDING_LABELS: [u8; SCORE_BINS] = [5, 4, 3, 2, 1];

type Edges = [f64; SCORE_BINS + 1];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BinningError {
    #[error("no values to bin")]
    Empty,

    #[error("values contain NaN or infinity")]
    NonFinite,

    #[error("bin edges must be unique, too few distinct values for five groups")]
    DuplicateEdges,
}

/// Binning strategy that scored a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Quantile,
    EqualWidth,
    NeutralDefault,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Quantile => "quantile",
            Strategy::EqualWidth => "equal-width",
            Strategy::NeutralDefault => "neutral-default",
        };
        f.write_str(name)
    }
}

/// Scores tagged with the strategy that produced them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreOutcome {
    Quantile(Vec<u8>),
    EqualWidth(Vec<u8>),
    NeutralDefault(Vec<u8>),
}

impl ScoreOutcome {
    pub fn scores(&self) -> &[u8] {
        match self {
            ScoreOutcome::Quantile(s)
            | ScoreOutcome::EqualWidth(s)
            | ScoreOutcome::NeutralDefault(s) => s,
        }
    }

    pub fn into_scores(self) -> Vec<u8> {
        match self {
            ScoreOutcome::Quantile(s)
            | ScoreOutcome::EqualWidth(s)
            | ScoreOutcome::NeutralDefault(s) => s,
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            ScoreOutcome::Quantile(_) => Strategy::Quantile,
            ScoreOutcome::EqualWidth(_) => Strategy::EqualWidth,
            ScoreOutcome::NeutralDefault(_) => Strategy::NeutralDefault,
        }
    }
}

/// Score `values` into five labelled bins
///
/// Quantile bins are tried first, then equal-width bins over the value range.
/// If neither can be built every value gets `neutral`.
pub fn score_with_fallback(values: &[f64], labels: &[u8; SCORE_BINS], neutral: u8) -> ScoreOutcome {
    match quantile_bins(values, labels) {
        Ok(scores) => ScoreOutcome::Quantile(scores),
        Err(_) => match equal_width_bins(values, labels) {
            Ok(scores) => ScoreOutcome::EqualWidth(scores),
            Err(_) => ScoreOutcome::NeutralDefault(vec![neutral; values.len()]),
        },
    }
}

/// Distinct 1-based ranks; ties keep their input order
pub fn stable_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    for (position, index) in order.into_iter().enumerate() {
        ranks[index] = (position + 1) as f64;
    }
    ranks
}

pub fn quantile_bins(values: &[f64], labels: &[u8; SCORE_BINS]) -> Result<Vec<u8>, BinningError> {
    let edges = quantile_edges(values)?;
    Ok(assign(values, &edges, labels))
}

pub fn equal_width_bins(values: &[f64], labels: &[u8; SCORE_BINS]) -> Result<Vec<u8>, BinningError> {
    let edges = equal_width_edges(values)?;
    Ok(assign(values, &edges, labels))
}

/// Quantile cut points at 0, 20, 40, 60, 80 and 100 percent
///
/// Interpolates linearly between order statistics at position `q * (n - 1)`.
pub fn quantile_edges(values: &[f64]) -> Result<Edges, BinningError> {
    check_values(values)?;

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let last = (sorted.len() - 1) as f64;
    let step = 1.0 / SCORE_BINS as f64;

    let mut edges = [0.0; SCORE_BINS + 1];
    for (k, edge) in edges.iter_mut().enumerate() {
        let position = k as f64 * step * last;
        let lower = position.floor() as usize;
        let upper = position.ceil() as usize;
        let fraction = position - lower as f64;
        *edge = sorted[lower] + (sorted[upper] - sorted[lower]) * fraction;
    }
    edges[SCORE_BINS] = sorted[sorted.len() - 1];

    if edges.windows(2).any(|w| w[0] == w[1]) {
        return Err(BinningError::DuplicateEdges);
    }
    Ok(edges)
}

/// Five equal-width intervals over `[min, max]`
///
/// The lowest edge is widened by 0.1% of the range so the minimum lands in
/// the first bin. A zero range is widened by 0.1% of its magnitude on both
/// sides (0.001 when the value is zero).
pub fn equal_width_edges(values: &[f64]) -> Result<Edges, BinningError> {
    check_values(values)?;

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let (low, high, widen) = if min == max {
        let low = if min != 0.0 { min - 0.001 * min.abs() } else { -0.001 };
        let high = if max != 0.0 { max + 0.001 * max.abs() } else { 0.001 };
        (low, high, 0.0)
    } else {
        (min, max, (max - min) * 0.001)
    };

    let step = (high - low) / SCORE_BINS as f64;
    let mut edges = [0.0; SCORE_BINS + 1];
    for (k, edge) in edges.iter_mut().enumerate() {
        *edge = low + k as f64 * step;
    }
    edges[SCORE_BINS] = high;
    edges[0] -= widen;

    Ok(edges)
}

fn check_values(values: &[f64]) -> Result<(), BinningError> {
    if values.is_empty() {
        return Err(BinningError::Empty);
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(BinningError::NonFinite);
    }
    Ok(())
}

/// Right-closed bins `(lo, hi]`; the first bin also holds its lower edge
fn assign(values: &[f64], edges: &Edges, labels: &[u8; SCORE_BINS]) -> Vec<u8> {
    values
        .iter()
        .map(|value| {
            let bin = edges[1..]
                .iter()
                .position(|edge| value <= edge)
                .unwrap_or(SCORE_BINS - 1);
            labels[bin]
        })
        .collect()
}
