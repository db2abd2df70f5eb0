//! Core numeric formulas shared by the analyzers and goal calculators
//!
//! Every division in this module has a defined zero-baseline outcome, so
//! callers never need to guard against division by zero themselves.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Coefficient of the Epley one-rep-max estimate
pub const EPLEY_COEFFICIENT: Decimal = dec!(0.0333);

/// Decimal places used for every reported metric
pub const REPORT_PRECISION: u32 = 2;

const HUNDRED: Decimal = dec!(100);

/// Round to the reporting precision (banker's rounding at the midpoint)
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp(REPORT_PRECISION)
}

/// Volume of a single set: weight × reps
pub fn set_volume(weight: Decimal, reps: i32) -> Decimal {
    weight * Decimal::from(reps)
}

/// Estimated one-rep max using the Epley formula
///
/// reps ≤ 0 → 0, reps == 1 → weight, otherwise weight × (1 + 0.0333 × reps)
pub fn epley_one_rep_max(weight: Decimal, reps: i32) -> Decimal {
    epley_one_rep_max_with(weight, reps, EPLEY_COEFFICIENT)
}

/// Epley estimate with a custom coefficient
pub fn epley_one_rep_max_with(weight: Decimal, reps: i32, coefficient: Decimal) -> Decimal {
    match reps {
        r if r <= 0 => Decimal::ZERO,
        1 => weight,
        r => round2(weight * (Decimal::ONE + coefficient * Decimal::from(r))),
    }
}

/// Share of `part` in `whole` as a percentage, 0 when `whole` is not positive
pub fn percentage_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round2(part / whole * HUNDRED)
}

/// Relative change from `baseline` to `current`, 0 when baseline is not positive
pub fn percentage_change(baseline: Decimal, current: Decimal) -> Decimal {
    if baseline <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round2((current - baseline) / baseline * HUNDRED)
}

/// Progress of `achieved` towards `target`, capped at 100
///
/// Unrounded so that weighted combinations keep full precision.
pub fn capped_progress(achieved: Decimal, target: Decimal) -> Decimal {
    if target <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (achieved / target * HUNDRED).min(HUNDRED)
}

/// Clamp a percentage into [0, 100] at full precision
pub fn clamp_progress(value: Decimal) -> Decimal {
    value.clamp(Decimal::ZERO, HUNDRED)
}

/// Clamp a percentage into [0, 100] at reporting precision
pub fn clamp_percentage(value: Decimal) -> Decimal {
    round2(clamp_progress(value))
}

/// Arithmetic mean, 0 for an empty input
pub fn mean<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    let (sum, count) = values
        .into_iter()
        .fold((Decimal::ZERO, 0u32), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        Decimal::ZERO
    } else {
        sum / Decimal::from(count)
    }
}
