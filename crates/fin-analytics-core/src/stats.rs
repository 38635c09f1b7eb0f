//! Decimal statistics shared by the analysis modules.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::FinError;
use crate::types::Rate;
use crate::FinResult;

pub fn safe_div(num: Decimal, den: Decimal, ctx: &str) -> FinResult<Decimal> {
    if den.is_zero() {
        return Err(FinError::DivisionByZero {
            context: ctx.to_string(),
        });
    }
    Ok(num / den)
}

/// Division that falls back to zero instead of failing.
pub fn div_or_zero(num: Decimal, den: Decimal) -> Decimal {
    if den.is_zero() {
        Decimal::ZERO
    } else {
        num / den
    }
}

pub fn validate_positive(val: Decimal, field: &str) -> FinResult<()> {
    if val <= Decimal::ZERO {
        return Err(FinError::invalid(field, "Must be positive"));
    }
    Ok(())
}

pub fn validate_confidence(confidence: Decimal) -> FinResult<()> {
    if confidence <= Decimal::ZERO || confidence >= Decimal::ONE {
        return Err(FinError::invalid(
            "confidence_level",
            "Confidence level must be between 0 and 1 (exclusive)",
        ));
    }
    Ok(())
}

pub fn require_observations(values: &[Decimal], min: usize, what: &str) -> FinResult<()> {
    if values.len() < min {
        return Err(FinError::InsufficientData(format!(
            "At least {min} {what} observations required, got {}",
            values.len()
        )));
    }
    Ok(())
}

pub fn sqrt_decimal(val: Decimal) -> Decimal {
    if val <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    val.sqrt().unwrap_or(Decimal::ZERO)
}

pub fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len() as i64)
}

/// Sample variance (n - 1 denominator).
pub fn sample_variance(values: &[Decimal]) -> Decimal {
    let n = values.len();
    if n < 2 {
        return Decimal::ZERO;
    }
    let m = mean(values);
    let sum_sq: Decimal = values.iter().map(|v| (v - m) * (v - m)).sum();
    sum_sq / Decimal::from((n - 1) as i64)
}

pub fn std_dev(values: &[Decimal]) -> Decimal {
    sqrt_decimal(sample_variance(values))
}

/// Sample covariance of two equally long series.
pub fn covariance(a: &[Decimal], b: &[Decimal]) -> Decimal {
    let n = a.len().min(b.len());
    if n < 2 {
        return Decimal::ZERO;
    }
    let ma = mean(&a[..n]);
    let mb = mean(&b[..n]);
    let sum: Decimal = a.iter().zip(b.iter()).map(|(x, y)| (x - ma) * (y - mb)).sum();
    sum / Decimal::from((n - 1) as i64)
}

pub fn correlation(a: &[Decimal], b: &[Decimal]) -> Decimal {
    let n = a.len().min(b.len());
    let sa = std_dev(&a[..n]);
    let sb = std_dev(&b[..n]);
    div_or_zero(covariance(a, b), sa * sb)
}

/// Semi-deviation below `target`, using the full sample size as denominator.
pub fn downside_deviation(values: &[Decimal], target: Decimal) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let sum_sq: Decimal = values
        .iter()
        .filter(|r| **r < target)
        .map(|r| (*r - target) * (*r - target))
        .sum();
    sqrt_decimal(sum_sq / Decimal::from(values.len() as i64))
}

/// Sample skewness with small-sample adjustment; zero for degenerate input.
pub fn skewness(values: &[Decimal]) -> Decimal {
    let n = values.len();
    let sd = std_dev(values);
    if n < 3 || sd.is_zero() {
        return Decimal::ZERO;
    }
    let m = mean(values);
    let n_dec = Decimal::from(n as i64);
    let m3: Decimal = values.iter().map(|r| (r - m) * (r - m) * (r - m)).sum();
    let adjustment = n_dec / (Decimal::from((n - 1) as i64) * Decimal::from((n - 2) as i64));
    adjustment * m3 / (sd * sd * sd)
}

/// Sample excess kurtosis; zero for degenerate input.
pub fn excess_kurtosis(values: &[Decimal]) -> Decimal {
    let n = values.len();
    let var = sample_variance(values);
    if n < 4 || var.is_zero() {
        return Decimal::ZERO;
    }
    let m = mean(values);
    let n_dec = Decimal::from(n as i64);
    let m4: Decimal = values
        .iter()
        .map(|r| {
            let d = r - m;
            d * d * d * d
        })
        .sum();
    let n1 = Decimal::from((n - 1) as i64);
    let n2 = Decimal::from((n - 2) as i64);
    let n3 = Decimal::from((n - 3) as i64);
    let factor1 = n_dec * (n_dec + Decimal::ONE) / (n1 * n2 * n3);
    let factor2 = Decimal::from(3) * n1 * n1 / (n2 * n3);
    factor1 * (m4 / (var * var)) - factor2
}

/// Empirical quantile with linear interpolation between order statistics.
pub fn percentile(values: &[Decimal], q: Decimal) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let mut sorted = values.to_vec();
    sorted.sort();
    let q = q.max(Decimal::ZERO).min(Decimal::ONE);
    let pos = q * Decimal::from((sorted.len() - 1) as i64);
    let lower = pos.floor().to_usize().unwrap_or(0).min(sorted.len() - 1);
    let upper = (lower + 1).min(sorted.len() - 1);
    let frac = pos - Decimal::from(lower as i64);
    sorted[lower] + frac * (sorted[upper] - sorted[lower])
}

/// Simple returns from a price series.
pub fn simple_returns(prices: &[Decimal]) -> FinResult<Vec<Decimal>> {
    prices
        .windows(2)
        .map(|w| safe_div(w[1] - w[0], w[0], "simple return"))
        .collect()
}

/// One step of a compounded wealth path: `wealth * (1 + r)`.
///
/// Long runs of high returns leave Decimal's range; that surfaces as an
/// error instead of an arithmetic panic.
pub fn compound(wealth: Decimal, r: Decimal) -> FinResult<Decimal> {
    Decimal::ONE
        .checked_add(r)
        .and_then(|growth| wealth.checked_mul(growth))
        .ok_or_else(|| {
            FinError::FinancialImpossibility(
                "Compounded return path exceeds the representable range".into(),
            )
        })
}

/// Maximum drawdown of the compounded return path and its length in periods
/// (peak to trough).
pub fn max_drawdown_with_duration(returns: &[Decimal]) -> FinResult<(Rate, u32)> {
    let mut cumulative = Decimal::ONE;
    let mut peak = Decimal::ONE;
    let mut max_dd = Decimal::ZERO;
    let mut peak_idx: usize = 0;
    let mut max_dd_start: usize = 0;
    let mut max_dd_end: usize = 0;

    for (i, r) in returns.iter().enumerate() {
        cumulative = compound(cumulative, *r)?;
        if cumulative > peak {
            peak = cumulative;
            peak_idx = i + 1;
        }
        if !peak.is_zero() {
            let dd = (peak - cumulative) / peak;
            if dd > max_dd {
                max_dd = dd;
                max_dd_start = peak_idx;
                max_dd_end = i + 1;
            }
        }
    }

    Ok((max_dd, max_dd_end.saturating_sub(max_dd_start) as u32))
}

/// Compound growth of a return series, e.g. `[0.1, 0.1]` -> `0.21`.
pub fn cumulative_return(returns: &[Decimal]) -> FinResult<Decimal> {
    let growth = returns
        .iter()
        .try_fold(Decimal::ONE, |acc, r| compound(acc, *r))?;
    Ok(growth - Decimal::ONE)
}

pub fn to_f64(val: Decimal) -> f64 {
    val.to_f64().unwrap_or(0.0)
}

/// f64 back to Decimal; non-finite values map to zero.
pub fn from_f64(val: f64) -> Decimal {
    if !val.is_finite() {
        return Decimal::ZERO;
    }
    Decimal::from_f64(val).unwrap_or(Decimal::ZERO).round_dp(10)
}

pub fn to_f64_vec(values: &[Decimal]) -> Vec<f64> {
    values.iter().map(|v| to_f64(*v)).collect()
}

/// Standard normal distribution for quantiles, densities and sampling.
#[cfg(any(feature = "portfolio_risk", feature = "quant"))]
pub fn standard_normal() -> FinResult<statrs::distribution::Normal> {
    statrs::distribution::Normal::new(0.0, 1.0)
        .map_err(|e| FinError::invalid("distribution", e.to_string()))
}

/// Lower-tail standard normal quantile for a confidence level, e.g.
/// 0.95 -> -1.645.
#[cfg(any(feature = "portfolio_risk", feature = "quant"))]
pub fn normal_tail_quantile(confidence: Decimal) -> FinResult<f64> {
    use statrs::distribution::ContinuousCDF;
    validate_confidence(confidence)?;
    Ok(standard_normal()?.inverse_cdf(1.0 - to_f64(confidence)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_mean_and_variance() {
        let v = vec![dec!(2), dec!(4), dec!(4), dec!(4), dec!(5), dec!(5), dec!(7), dec!(9)];
        assert_eq!(mean(&v), dec!(5));
        assert_eq!(sample_variance(&v), dec!(32) / dec!(7));
    }

    #[test]
    fn test_correlation_perfect() {
        let a = vec![dec!(1), dec!(2), dec!(3), dec!(4)];
        let b = vec![dec!(2), dec!(4), dec!(6), dec!(8)];
        let c = correlation(&a, &b);
        assert!((c - Decimal::ONE).abs() < dec!(0.0000001), "corr = {c}");
    }

    #[test]
    fn test_percentile_interpolates() {
        let v = vec![dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)];
        assert_eq!(percentile(&v, dec!(0.5)), dec!(3));
        assert_eq!(percentile(&v, dec!(0.25)), dec!(2));
        assert_eq!(percentile(&v, dec!(0.1)), dec!(1.4));
        assert_eq!(percentile(&v, Decimal::ONE), dec!(5));
    }

    #[test]
    fn test_max_drawdown() {
        let (dd, dur) =
            max_drawdown_with_duration(&[dec!(0.10), dec!(-0.20), dec!(0.05), dec!(-0.15)]).unwrap();
        // peak 1.10, trough 1.10 * 0.8 * 1.05 * 0.85 = 0.7854
        assert_eq!(dd, (dec!(1.10) - dec!(0.7854)) / dec!(1.10));
        assert_eq!(dur, 3);
    }

    #[test]
    fn test_no_drawdown_when_rising() {
        let (dd, dur) = max_drawdown_with_duration(&[dec!(0.01), dec!(0.02)]).unwrap();
        assert_eq!(dd, Decimal::ZERO);
        assert_eq!(dur, 0);
    }

    #[test]
    fn test_simple_returns() {
        let r = simple_returns(&[dec!(100), dec!(110), dec!(99)]).unwrap();
        assert_eq!(r, vec![dec!(0.1), dec!(-0.1)]);
        assert!(simple_returns(&[dec!(0), dec!(1)]).is_err());
    }

    #[test]
    fn test_cumulative_return() {
        assert_eq!(cumulative_return(&[dec!(0.1), dec!(0.1)]).unwrap(), dec!(0.21));
    }

    #[test]
    fn test_compounding_overflow_is_an_error() {
        // 1.12 * 1.08 per pair; 400 pairs is far beyond 7.9e28
        let returns: Vec<Decimal> = (0..800)
            .map(|i| if i % 2 == 0 { dec!(0.12) } else { dec!(0.08) })
            .collect();
        assert!(matches!(
            cumulative_return(&returns),
            Err(FinError::FinancialImpossibility(_))
        ));
        assert!(matches!(
            max_drawdown_with_duration(&returns),
            Err(FinError::FinancialImpossibility(_))
        ));
        assert!(compound(Decimal::MAX, dec!(0.5)).is_err());
        assert_eq!(compound(dec!(2), dec!(-0.25)).unwrap(), dec!(1.5));
    }

    #[test]
    fn test_symmetric_skew_is_zero() {
        let v = vec![dec!(-2), dec!(-1), dec!(0), dec!(1), dec!(2)];
        assert_eq!(skewness(&v), Decimal::ZERO);
    }

    #[test]
    fn test_from_f64_non_finite() {
        assert_eq!(from_f64(f64::NAN), Decimal::ZERO);
        assert_eq!(from_f64(0.5), dec!(0.5));
    }

    #[cfg(any(feature = "portfolio_risk", feature = "quant"))]
    #[test]
    fn test_normal_tail_quantile() {
        let z = normal_tail_quantile(dec!(0.95)).unwrap();
        approx::assert_abs_diff_eq!(z, -1.6449, epsilon = 1e-4);
        assert!(normal_tail_quantile(Decimal::ONE).is_err());
    }
}
