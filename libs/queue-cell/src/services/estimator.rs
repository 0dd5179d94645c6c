use tracing::debug;

use crate::models::WaitEstimate;
use crate::services::clock::TariffBucket;

/// Fallback consultation length when the provider has no recorded average.
pub const DEFAULT_AVG_CONSULT_MINUTES: f64 = 15.0;

/// Estimates never drop below this, whatever the inputs.
pub const MINIMUM_WAIT_MINUTES: u32 = 5;

const EMERGENCY_FACTOR: f64 = 0.3;

/// Predicted wait in minutes for a token with `ahead` waiting patients in
/// front of it. Emergency bookings jump the queue, so their base shrinks;
/// the tariff bucket stretches or squeezes the result by time of day.
pub fn estimate_wait(
    ahead: u32,
    avg_consult_minutes: f64,
    is_emergency: bool,
    bucket: TariffBucket,
) -> u32 {
    let mut minutes = ahead as f64 * avg_consult_minutes;

    if is_emergency {
        minutes *= EMERGENCY_FACTOR;
    }

    minutes *= bucket.multiplier();

    (minutes.round() as u32).max(MINIMUM_WAIT_MINUTES)
}

/// Advisory wrapper around [`estimate_wait`]: a missing or unusable average
/// must never fail the booking, so it degrades to the default and flags the
/// estimate instead.
pub fn estimate_or_default(
    ahead: u32,
    avg_consult_minutes: Option<f64>,
    is_emergency: bool,
    bucket: TariffBucket,
) -> WaitEstimate {
    match avg_consult_minutes {
        Some(avg) if avg > 0.0 && avg.is_finite() => WaitEstimate {
            minutes: estimate_wait(ahead, avg, is_emergency, bucket),
            degraded: false,
        },
        other => {
            debug!(
                "No usable avg consultation time ({:?}), falling back to {} minutes",
                other, DEFAULT_AVG_CONSULT_MINUTES
            );
            WaitEstimate {
                minutes: estimate_wait(ahead, DEFAULT_AVG_CONSULT_MINUTES, is_emergency, bucket),
                degraded: true,
            }
        }
    }
}
