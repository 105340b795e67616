//! Conversion of raw adapter tick counts into nanoseconds.
//!
//! The adapter reports timestamps as ticks of its sample clock. The conversion
//! must reproduce the adapter tooling bit-for-bit, so the divisor is computed
//! first (`sample_rate_khz / 1000`, truncated) and the scaled tick count is
//! divided by it afterwards. Reordering the operations changes the rounding
//! for sample rates that are not a multiple of 1000 kHz.
use crate::error::TimestampError;

/// Lowest sample rate (kHz) for which the inner division is non-zero.
pub const MIN_SAMPLE_RATE_KHZ: u32 = 1000;

/// Convert `ticks` of a `sample_rate_khz` clock into nanoseconds.
///
/// # Errors
///
/// - [`TimestampError::SampleRateTooLow`] when `sample_rate_khz < 1000`.
/// - [`TimestampError::Overflow`] when the result exceeds `u64::MAX`.
///
/// # Example
///
/// ```
/// use can_mitm::infra::timestamp::to_nanoseconds;
///
/// // 50 MHz sample clock: one tick every 20 ns.
/// assert_eq!(to_nanoseconds(3, 50_000).unwrap(), 60);
/// assert!(to_nanoseconds(3, 999).is_err());
/// ```
pub fn to_nanoseconds(ticks: u64, sample_rate_khz: u32) -> Result<u64, TimestampError> {
    let divisor = sample_rate_khz / 1000;
    if divisor == 0 {
        return Err(TimestampError::SampleRateTooLow { sample_rate_khz });
    }
    // u128 holds `u64::MAX * 1000` without wrapping.
    let scaled = (ticks as u128) * 1000;
    u64::try_from(scaled / divisor as u128).map_err(|_| TimestampError::Overflow { ticks })
}

/// Check that `sample_rate_khz` can be used with [`to_nanoseconds`].
pub fn validate_sample_rate(sample_rate_khz: u32) -> Result<(), TimestampError> {
    if sample_rate_khz < MIN_SAMPLE_RATE_KHZ {
        return Err(TimestampError::SampleRateTooLow { sample_rate_khz });
    }
    Ok(())
}
