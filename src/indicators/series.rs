// =============================================================================
// Series Alignment
// =============================================================================
//
// Every indicator output is exactly as long as its input. Index `i` of any
// output refers to the same date as index `i` of the price series, whatever
// the indicator's lookback. The warm-up head is padded with `None`, never
// with a magic number, and the tail is never truncated or shifted.
//
// Non-finite values are normalised to `None` here so NaN / Infinity can never
// leak into the chart layer.
// =============================================================================

/// An N-length indicator column. `None` marks "not yet defined" entries.
pub type IndicatorSeries = Vec<Option<f64>>;

/// A column with no defined values, used when the input is shorter than the
/// indicator's lookback.
pub fn all_undefined(len: usize) -> IndicatorSeries {
    vec![None; len]
}

/// Right-align `tail` against an axis of length `len`.
///
/// `tail[j]` lands at index `len - tail.len() + j`. The head is filled with
/// `None`. When `tail` is longer than the axis (never the case for engine
/// output) only its last `len` values are kept so the length contract holds.
pub fn align_tail(len: usize, tail: &[f64]) -> IndicatorSeries {
    let tail = &tail[tail.len().saturating_sub(len)..];
    let offset = len - tail.len();

    let mut out = Vec::with_capacity(len);
    out.resize(offset, None);
    out.extend(tail.iter().map(|&v| finite(v)));
    out
}

/// Number of leading `None` entries.
pub fn defined_prefix_len(series: &[Option<f64>]) -> usize {
    series.iter().take_while(|v| v.is_none()).count()
}

/// Most recent defined value, if any.
pub fn last_defined(series: &[Option<f64>]) -> Option<f64> {
    series.iter().rev().find_map(|v| *v)
}

fn finite(v: f64) -> Option<f64> {
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}
