//! Decibel and gain conversions

/// Convert decibels to a linear amplitude factor
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Linear gain that moves `measured_lufs` to `target_lufs`
///
/// `gain = 10 ^ ((target - measured) / 20)`. A NaN or infinite measurement,
/// or a gain that overflows, falls back to unity so audio passes through
/// unchanged rather than being silenced or blown up.
#[inline]
pub fn gain_for_loudness(target_lufs: f64, measured_lufs: f64) -> f64 {
    if !measured_lufs.is_finite() {
        return 1.0;
    }
    let gain = db_to_linear(target_lufs - measured_lufs);
    if gain.is_finite() {
        gain
    } else {
        1.0
    }
}
