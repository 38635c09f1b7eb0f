//! Value at Risk by three methods.
//!
//! * Parametric: VaR = -(μh + zσ√h) with z the normal lower-tail quantile.
//! * Historical: the empirical (1 - c) quantile of returns, scaled by √h.
//! * Modified (Cornish-Fisher): z adjusted for sample skewness S and excess
//!   kurtosis K:
//!   z_cf = z + (z² - 1)S/6 + (z³ - 3z)K/24 - (2z³ - 5z)S²/36
//!
//! All VaR figures are positive loss fractions over the horizon.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinError;
use crate::report::{
    fmt_money, fmt_pct, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{
    excess_kurtosis, from_f64, mean, normal_tail_quantile, percentile, skewness, sqrt_decimal,
    std_dev, to_f64, validate_confidence,
};
use crate::types::{Money, Rate, ReturnSeries};
use crate::FinResult;

pub const MIN_OBSERVATIONS: usize = 10;
const RELIABLE_HISTORY: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailRiskInput {
    #[serde(flatten)]
    pub series: ReturnSeries,
    /// Current portfolio value, to express losses in money
    #[serde(default)]
    pub portfolio_value: Option<Money>,
    /// Holding period in return periods
    #[serde(default = "default_horizon")]
    pub horizon_periods: u32,
    /// Overrides the report options' confidence level
    #[serde(default)]
    pub confidence_level: Option<Rate>,
}

fn default_horizon() -> u32 {
    1
}

/// Validated parameters shared by VaR and ES.
pub(crate) struct TailParams {
    pub confidence: Rate,
    pub horizon: Decimal,
    pub sqrt_horizon: Decimal,
    pub mean: Decimal,
    pub sigma: Decimal,
    pub z: f64,
    pub warnings: Vec<String>,
}

pub(crate) fn tail_params(input: &TailRiskInput, options: &ReportOptions) -> FinResult<TailParams> {
    input.series.require(MIN_OBSERVATIONS)?;
    let confidence = input.confidence_level.unwrap_or(options.confidence_level);
    validate_confidence(confidence)?;
    if input.horizon_periods == 0 {
        return Err(FinError::invalid("horizon_periods", "Must be at least 1"));
    }
    if let Some(v) = input.portfolio_value {
        if v <= Decimal::ZERO {
            return Err(FinError::invalid("portfolio_value", "Must be positive"));
        }
    }

    let mut warnings = Vec::new();
    if input.series.len() < RELIABLE_HISTORY {
        warnings.push(format!(
            "Only {} observations; historical tail estimates are imprecise below {RELIABLE_HISTORY}.",
            input.series.len()
        ));
    }
    if input.horizon_periods > 1 {
        warnings.push("Horizon scaling by √h assumes independent, identically distributed returns.".into());
    }

    let horizon = Decimal::from(input.horizon_periods);
    let sqrt_horizon = match input.horizon_periods {
        1 => Decimal::ONE,
        _ => sqrt_decimal(horizon),
    };
    Ok(TailParams {
        confidence,
        horizon,
        sqrt_horizon,
        mean: mean(&input.series.returns),
        sigma: std_dev(&input.series.returns),
        z: normal_tail_quantile(confidence)?,
        warnings,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarOutput {
    pub confidence_level: Rate,
    pub horizon_periods: u32,
    pub parametric_var: Rate,
    pub historical_var: Rate,
    pub modified_var: Rate,
    pub skewness: Decimal,
    pub excess_kurtosis: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parametric_var_amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical_var_amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_var_amount: Option<Money>,
    pub warnings: Vec<String>,
}

fn cornish_fisher(z: f64, s: f64, k: f64) -> f64 {
    z + (z * z - 1.0) * s / 6.0 + (z.powi(3) - 3.0 * z) * k / 24.0
        - (2.0 * z.powi(3) - 5.0 * z) * s * s / 36.0
}

pub fn calculate_var(input: &TailRiskInput, options: &ReportOptions) -> FinResult<VarOutput> {
    let p = tail_params(input, options)?;
    let returns = &input.series.returns;

    let drift = p.mean * p.horizon;
    let scaled_sigma = p.sigma * p.sqrt_horizon;
    let parametric_var = -(drift + from_f64(p.z) * scaled_sigma);

    let quantile = percentile(returns, Decimal::ONE - p.confidence);
    let historical_var = -quantile * p.sqrt_horizon;

    let skew = skewness(returns);
    let kurt = excess_kurtosis(returns);
    let z_cf = cornish_fisher(p.z, to_f64(skew), to_f64(kurt));
    let modified_var = -(drift + from_f64(z_cf) * scaled_sigma);

    let amount = |var: Rate| input.portfolio_value.map(|v| v * var);

    Ok(VarOutput {
        confidence_level: p.confidence,
        horizon_periods: input.horizon_periods,
        parametric_var,
        historical_var,
        modified_var,
        skewness: skew,
        excess_kurtosis: kurt,
        parametric_var_amount: amount(parametric_var),
        historical_var_amount: amount(historical_var),
        modified_var_amount: amount(modified_var),
        warnings: p.warnings,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "value_at_risk",
    category: AnalysisCategory::PortfolioRisk,
    title_en: "Value at Risk",
    title_ar: "القيمة المعرضة للمخاطر",
    methodology: "Parametric normal, historical simulation and Cornish-Fisher VaR",
};

pub fn report(input: &TailRiskInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_var(input, options)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.modified_var)
        .metric("parametric_var", "Parametric VaR", "القيمة المعرضة للمخاطر (معلمية)", out.parametric_var, MetricUnit::Percent)
        .metric("historical_var", "Historical VaR", "القيمة المعرضة للمخاطر (تاريخية)", out.historical_var, MetricUnit::Percent)
        .metric("modified_var", "Modified (Cornish-Fisher) VaR", "القيمة المعرضة للمخاطر المعدلة", out.modified_var, MetricUnit::Percent)
        .metric("skewness", "Skewness", "الالتواء", out.skewness, MetricUnit::Ratio)
        .metric("excess_kurtosis", "Excess kurtosis", "التفرطح الزائد", out.excess_kurtosis, MetricUnit::Ratio)
        .metric("confidence_level", "Confidence level", "مستوى الثقة", out.confidence_level, MetricUnit::Probability);
    if let Some(a) = out.historical_var_amount {
        b.metric("historical_var_amount", "Historical VaR (amount)", "القيمة المعرضة للمخاطر (مبلغ)", a, MetricUnit::Currency);
    }

    let conf = fmt_pct(out.confidence_level);
    let h = out.horizon_periods;
    let var = fmt_pct(out.historical_var);
    match out.historical_var_amount {
        Some(a) => {
            let amt = fmt_money(a);
            b.interpret(
                format!("With {conf} confidence, losses over {h} period(s) should not exceed {var} ({amt}) based on history."),
                format!("بثقة {conf} لا ينبغي أن تتجاوز الخسائر خلال {h} فترة نسبة {var} ({amt}) وفق البيانات التاريخية."),
            );
        }
        None => {
            b.interpret(
                format!("With {conf} confidence, losses over {h} period(s) should not exceed {var} based on history."),
                format!("بثقة {conf} لا ينبغي أن تتجاوز الخسائر خلال {h} فترة نسبة {var} وفق البيانات التاريخية."),
            );
        }
    }

    let worst = out.historical_var.max(out.modified_var);
    let assessment = match worst {
        v if v < dec!(0.02) => Assessment::Favourable,
        v if v < dec!(0.05) => Assessment::Neutral,
        v if v < dec!(0.10) => Assessment::Caution,
        _ => Assessment::Adverse,
    };
    b.assessment(assessment);

    if out.modified_var > out.parametric_var * dec!(1.2) && out.parametric_var > Decimal::ZERO {
        b.interpret(
            "Fat tails or negative skew make the normal model understate risk; the Cornish-Fisher figure is more reliable.",
            "الذيول السميكة أو الالتواء السالب تجعل النموذج الطبيعي يقلل من المخاطر؛ رقم كورنيش-فيشر أكثر موثوقية.",
        );
        b.recommend(
            "Size limits on modified or historical VaR rather than parametric VaR.",
            "تحديد حدود المخاطر بناءً على القيمة المعدلة أو التاريخية بدلاً من المعلمية.",
        );
    }
    if matches!(assessment, Assessment::Caution | Assessment::Adverse) {
        b.recommend(
            "Complement VaR with expected shortfall and stress tests to capture losses beyond the threshold.",
            "استكمال القيمة المعرضة للمخاطر بالعجز المتوقع واختبارات الضغط لرصد الخسائر بعد العتبة.",
        );
    }
    b.warnings(out.warnings);

    Ok(b.finish())
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_three_methods_positive() {
        let out = calculate_var(&input(daily_returns()), &ReportOptions::default()).unwrap();
        assert!(out.parametric_var > Decimal::ZERO);
        assert!(out.historical_var > Decimal::ZERO);
        assert!(out.modified_var > Decimal::ZERO);
        assert_eq!(
            out.historical_var_amount,
            Some(out.historical_var * dec!(1000000))
        );
    }

    #[test]
    fn test_historical_quantile() {
        let out = calculate_var(&input(daily_returns()), &ReportOptions::default()).unwrap();
        // 5th percentile of 20 sorted returns: -0.030 + 0.95 * (-0.021 + 0.030)
        assert_eq!(out.historical_var, dec!(0.02145));
    }

    #[test]
    fn test_horizon_scaling() {
        let mut i = input(daily_returns());
        let one_day = calculate_var(&i, &ReportOptions::default()).unwrap();
        i.horizon_periods = 4;
        let four_day = calculate_var(&i, &ReportOptions::default()).unwrap();
        let diff = four_day.historical_var - one_day.historical_var * dec!(2);
        assert!(diff.abs() < dec!(0.000000001));
        assert!(four_day.warnings.iter().any(|w| w.contains("√h")));
    }

    #[test]
    fn test_higher_confidence_larger_var() {
        let mut i = input(daily_returns());
        let v95 = calculate_var(&i, &ReportOptions::default()).unwrap();
        i.confidence_level = Some(dec!(0.99));
        let v99 = calculate_var(&i, &ReportOptions::default()).unwrap();
        assert!(v99.parametric_var > v95.parametric_var);
    }

    #[test]
    fn test_rejects_bad_confidence_and_short_history() {
        let mut i = input(daily_returns());
        i.confidence_level = Some(dec!(1.5));
        assert!(calculate_var(&i, &ReportOptions::default()).is_err());
        let short = input(daily_returns()[..5].to_vec());
        match calculate_var(&short, &ReportOptions::default()).unwrap_err() {
            FinError::InsufficientData(_) => {}
            e => panic!("Expected InsufficientData, got {e:?}"),
        }
    }

    #[test]
    fn test_cornish_fisher_reduces_to_normal() {
        approx::assert_abs_diff_eq!(cornish_fisher(-1.645, 0.0, 0.0), -1.645, epsilon = 1e-12);
        assert!(cornish_fisher(-1.645, -1.0, 0.0) < -1.645);
    }
}
