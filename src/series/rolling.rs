//! Row-aligned window statistics over nullable columns.
//!
//! Every function returns one value per input row. A row whose trailing window
//! is incomplete or contains a null yields `None`, never an error.

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - avg).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Applies `stat` to each complete trailing window of `window` rows.
pub fn rolling<F>(values: &[Option<f64>], window: usize, stat: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    let mut buffer = Vec::with_capacity(window);
    for end in (window - 1)..values.len() {
        buffer.clear();
        buffer.extend(values[end + 1 - window..=end].iter().map_while(|v| *v));
        if buffer.len() == window {
            out[end] = stat(&buffer);
        }
    }
    out
}

pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, mean)
}

pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, sample_std)
}

pub fn rolling_sum(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| Some(w.iter().sum()))
}

pub fn rolling_min(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().copied().reduce(f64::min))
}

pub fn rolling_max(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().copied().reduce(f64::max))
}

/// Fractional change from the previous row: `x[t] / x[t-1] - 1`.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    out.extend(values.windows(2).map(|pair| Some(pair[1] / pair[0] - 1.0)));
    out
}

/// Difference from the previous row: `x[t] - x[t-1]`.
pub fn diff(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    out.extend(values.windows(2).map(|pair| Some(pair[1] - pair[0])));
    out
}

/// Wraps a dense column as a nullable one.
pub fn dense(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}
