//! Timestamp post-processing applied after a file has been read
//!
//! These mirror the LSL inlet post-processing flags (`ClockSync`, `Dejitter`)
//! for data that was recorded without them: clock offsets are folded into the
//! timestamps, and regular streams get their sampling jitter smoothed out.

use super::stream::Stream;

/// Least-squares fit of `y = intercept + slope * x`
///
/// A degenerate `x` (fewer than two distinct values) yields slope 0 and the
/// mean of `y` as intercept.
pub(crate) fn linear_fit(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len().min(y.len());
    if n == 0 {
        return (0.0, 0.0);
    }

    let mean_x = x[..n].iter().sum::<f64>() / n as f64;
    let mean_y = y[..n].iter().sum::<f64>() / n as f64;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (&xi, &yi) in x[..n].iter().zip(&y[..n]) {
        sxx += (xi - mean_x) * (xi - mean_x);
        sxy += (xi - mean_x) * (yi - mean_y);
    }

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    (mean_y - slope * mean_x, slope)
}

/// Fold the stream's clock offset measurements into its timestamps
///
/// Fits the measured offsets linearly against their collection times, then
/// shifts every timestamp by the fitted offset at that time. A single
/// measurement is applied as a constant.
///
/// This is a plain least-squares fit over all measurements. It does not
/// winsorize outliers and does not split the stream at clock resets, so
/// results differ from pyxdf's default synchronization when offsets are
/// noisy or the recording host rebooted mid-stream.
pub fn synchronize_clocks(stream: &mut Stream) {
    let (intercept, slope) = match stream.clock_times.len() {
        0 => return,
        1 => (stream.clock_values[0], 0.0),
        _ => linear_fit(&stream.clock_times, &stream.clock_values),
    };

    tracing::debug!(
        "Clock sync for '{}': offset {:.6} s + {:.3e} s/s drift from {} measurements",
        stream.name(),
        intercept,
        slope,
        stream.clock_times.len()
    );

    for ts in stream.time_stamps.iter_mut() {
        *ts += intercept + slope * *ts;
    }
}

/// Replace jittery timestamps of a regular stream with a piecewise linear fit
///
/// The stream is split into segments wherever two consecutive timestamps
/// are further apart than `max(threshold_seconds, threshold_samples /
/// nominal_srate)`; within each segment timestamps are refit against sample
/// index. Irregular and empty streams are left untouched.
pub fn dejitter(stream: &mut Stream, threshold_seconds: f64, threshold_samples: f64) {
    let srate = stream.info.nominal_srate;
    if srate <= 0.0 || stream.time_stamps.is_empty() {
        return;
    }

    let threshold = threshold_seconds.max(threshold_samples / srate);
    let timestamps = &mut stream.time_stamps;

    let mut segment_start = 0;
    let mut segments = 0;
    for i in 1..=timestamps.len() {
        let is_break = i == timestamps.len() || timestamps[i] - timestamps[i - 1] > threshold;
        if !is_break {
            continue;
        }

        let indices: Vec<f64> = (segment_start..i).map(|ix| ix as f64).collect();
        let (intercept, slope) = linear_fit(&indices, &timestamps[segment_start..i]);
        for (ix, ts) in (segment_start..i).zip(timestamps[segment_start..i].iter_mut()) {
            *ts = intercept + slope * ix as f64;
        }

        segments += 1;
        segment_start = i;
    }

    tracing::debug!(
        "Dejittered '{}' ({} samples, {} segment(s))",
        stream.info.name,
        stream.time_stamps.len(),
        segments
    );
}
