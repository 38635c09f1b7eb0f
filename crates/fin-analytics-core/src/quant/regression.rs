//! Ordinary least squares with an intercept.
//!
//! β = (XᵀX)⁻¹Xᵀy, Var(β) = σ²(XᵀX)⁻¹ with σ² = SSR / (n - k - 1).
//! Two-sided p-values come from Student's t with n - k - 1 degrees of
//! freedom.

use nalgebra::{DMatrix, DVector};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::FinError;
use crate::report::{
    fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{from_f64, to_f64, to_f64_vec, validate_confidence};
use crate::FinResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Regressor {
    pub name: String,
    pub values: Vec<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionInput {
    pub dependent: Vec<Decimal>,
    pub regressors: Vec<Regressor>,
    /// Significance threshold for coefficients; defaults to the report options' level
    #[serde(default)]
    pub confidence_level: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: Decimal,
    pub std_error: Decimal,
    /// Undefined when the standard error is zero
    pub t_stat: Option<Decimal>,
    pub p_value: Option<Decimal>,
    pub significant: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionOutput {
    pub observations: usize,
    pub degrees_of_freedom: usize,
    /// Intercept first, then one entry per regressor
    pub coefficients: Vec<Coefficient>,
    pub r_squared: Decimal,
    pub adjusted_r_squared: Decimal,
    pub residual_std_error: Decimal,
    pub f_statistic: Option<Decimal>,
    pub durbin_watson: Decimal,
    pub warnings: Vec<String>,
}

pub fn calculate_regression(
    input: &RegressionInput,
    options: &ReportOptions,
) -> FinResult<RegressionOutput> {
    let n = input.dependent.len();
    let k = input.regressors.len();
    if k == 0 {
        return Err(FinError::invalid("regressors", "At least one regressor required"));
    }
    for r in &input.regressors {
        if r.values.len() != n {
            return Err(FinError::invalid(
                &format!("regressors.{}", r.name),
                format!("Expected {n} observations, got {}", r.values.len()),
            ));
        }
    }
    if n <= k + 1 {
        return Err(FinError::InsufficientData(format!(
            "{n} observations cannot identify {} coefficients with residual degrees of freedom",
            k + 1
        )));
    }
    let confidence = input.confidence_level.unwrap_or(options.confidence_level);
    validate_confidence(confidence)?;
    let mut warnings = Vec::new();

    let columns: Vec<Vec<f64>> = input.regressors.iter().map(|r| to_f64_vec(&r.values)).collect();
    let x = DMatrix::from_fn(n, k + 1, |i, j| if j == 0 { 1.0 } else { columns[j - 1][i] });
    let y = DVector::from_column_slice(&to_f64_vec(&input.dependent));

    let xt = x.transpose();
    let xtx = &xt * &x;
    let singular = || {
        FinError::FinancialImpossibility("Regressors are perfectly collinear; XᵀX is singular".into())
    };
    let svd = xtx.clone().svd(false, false);
    if svd.rank(svd.singular_values.max() * 1e-10) < k + 1 {
        return Err(singular());
    }
    let xtx_inv = xtx.try_inverse().ok_or_else(singular)?;
    let beta = &xtx_inv * &xt * &y;
    let residuals = &y - &x * &beta;

    let ss_res = residuals.dot(&residuals);
    let y_mean = y.mean();
    let ss_tot: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let dof = n - k - 1;
    let sigma_sq = ss_res / dof as f64;

    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };
    let adjusted = 1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / dof as f64;
    let f_statistic = if r_squared < 1.0 {
        Some(from_f64((r_squared / k as f64) / ((1.0 - r_squared) / dof as f64)))
    } else {
        None
    };

    let t_dist = StudentsT::new(0.0, 1.0, dof as f64)
        .map_err(|e| FinError::invalid("degrees_of_freedom", e.to_string()))?;
    let alpha = 1.0 - to_f64(confidence);
    let names = std::iter::once("intercept".to_string())
        .chain(input.regressors.iter().map(|r| r.name.clone()));
    let coefficients = names
        .enumerate()
        .map(|(j, name)| {
            let se = (sigma_sq * xtx_inv[(j, j)]).max(0.0).sqrt();
            let (t_stat, p_value) = if se > 1e-14 {
                let t = beta[j] / se;
                let p = 2.0 * (1.0 - t_dist.cdf(t.abs()));
                (Some(t), Some(p))
            } else {
                (None, None)
            };
            Coefficient {
                name,
                estimate: from_f64(beta[j]),
                std_error: from_f64(se),
                t_stat: t_stat.map(from_f64),
                p_value: p_value.map(from_f64),
                significant: p_value.map_or(se <= 1e-14, |p| p < alpha),
            }
        })
        .collect();

    let dw_num: f64 = residuals.as_slice().windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    let durbin_watson = if ss_res > 0.0 { dw_num / ss_res } else { 2.0 };
    if !(1.5..=2.5).contains(&durbin_watson) {
        warnings.push(format!(
            "Durbin-Watson of {durbin_watson:.2} suggests autocorrelated residuals; standard errors may be understated."
        ));
    }
    if n < 30 {
        warnings.push(format!("Small sample ({n} observations); inference is fragile."));
    }

    Ok(RegressionOutput {
        observations: n,
        degrees_of_freedom: dof,
        coefficients,
        r_squared: from_f64(r_squared),
        adjusted_r_squared: from_f64(adjusted),
        residual_std_error: from_f64(sigma_sq.sqrt()),
        f_statistic,
        durbin_watson: from_f64(durbin_watson),
        warnings,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "linear_regression",
    category: AnalysisCategory::Quantitative,
    title_en: "Linear Regression (OLS)",
    title_ar: "الانحدار الخطي (المربعات الصغرى)",
    methodology: "Ordinary least squares with Student-t inference",
};

pub fn report(input: &RegressionInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_regression(input, options)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.r_squared)
        .metric("r_squared", "R²", "معامل التحديد", out.r_squared, MetricUnit::Ratio)
        .metric("adjusted_r_squared", "Adjusted R²", "معامل التحديد المعدل", out.adjusted_r_squared, MetricUnit::Ratio)
        .metric("residual_std_error", "Residual standard error", "الخطأ المعياري للبواقي", out.residual_std_error, MetricUnit::Ratio)
        .metric("durbin_watson", "Durbin-Watson", "دربن-واتسون", out.durbin_watson, MetricUnit::Ratio);
    if let Some(f) = out.f_statistic {
        b.metric("f_statistic", "F-statistic", "إحصائية F", f, MetricUnit::Ratio);
    }
    for c in &out.coefficients {
        b.metric(
            &format!("coef_{}", c.name),
            &format!("Coefficient: {}", c.name),
            &format!("المعامل: {}", c.name),
            c.estimate,
            MetricUnit::Ratio,
        );
    }

    let r2 = fmt_ratio(out.r_squared);
    b.interpret(
        format!("The model explains an R² of {r2} of the variation in the dependent variable."),
        format!("يفسر النموذج ما نسبته {r2} (R²) من تباين المتغير التابع."),
    );

    let assessment = match out.adjusted_r_squared {
        v if v >= dec!(0.7) => Assessment::Favourable,
        v if v >= dec!(0.4) => Assessment::Neutral,
        v if v >= dec!(0.1) => Assessment::Caution,
        _ => Assessment::Adverse,
    };
    b.assessment(assessment);

    let insignificant: Vec<&str> = out
        .coefficients
        .iter()
        .skip(1)
        .filter(|c| !c.significant)
        .map(|c| c.name.as_str())
        .collect();
    if !insignificant.is_empty() {
        let list = insignificant.join(", ");
        b.interpret(
            format!("Not statistically significant: {list}."),
            format!("غير دالة إحصائياً: {list}."),
        )
        .recommend(
            format!("Consider dropping {list} or gathering more data."),
            format!("النظر في حذف {list} أو جمع بيانات إضافية."),
        );
    }
    b.warnings(out.warnings);

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use statrs::distribution::Normal;

    fn regressor(name: &str, values: Vec<Decimal>) -> Regressor {
        Regressor { name: name.into(), values }
    }

    #[test]
    fn test_exact_fit() {
        let x1: Vec<Decimal> = (1..=10).map(Decimal::from).collect();
        let x2: Vec<Decimal> = (1..=10).map(|i| Decimal::from(i * i % 7)).collect();
        let y = x1.iter().zip(&x2).map(|(a, b)| dec!(1) + dec!(2) * a - dec!(0.5) * b).collect();
        let input = RegressionInput {
            dependent: y,
            regressors: vec![regressor("x1", x1), regressor("x2", x2)],
            confidence_level: None,
        };
        let out = calculate_regression(&input, &ReportOptions::default()).unwrap();
        assert_abs_diff_eq!(to_f64(out.coefficients[0].estimate), 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(to_f64(out.coefficients[1].estimate), 2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(to_f64(out.coefficients[2].estimate), -0.5, epsilon = 1e-8);
        assert_abs_diff_eq!(to_f64(out.r_squared), 1.0, epsilon = 1e-8);
        assert_eq!(out.degrees_of_freedom, 7);
    }

    #[test]
    fn test_noisy_fit_inference() {
        let mut rng = StdRng::seed_from_u64(5);
        let noise = Normal::new(0.0, 0.5).unwrap();
        let x: Vec<f64> = (0..60).map(|i| i as f64 / 10.0).collect();
        let junk: Vec<f64> = (0..60).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.3 + 1.5 * v + rng.sample::<f64, _>(noise)).collect();
        let dec_vec = |v: &[f64]| v.iter().map(|x| from_f64(*x)).collect::<Vec<_>>();
        let input = RegressionInput {
            dependent: dec_vec(&y),
            regressors: vec![regressor("x", dec_vec(&x)), regressor("junk", dec_vec(&junk))],
            confidence_level: None,
        };
        let out = calculate_regression(&input, &ReportOptions::default()).unwrap();
        let slope = &out.coefficients[1];
        assert!((to_f64(slope.estimate) - 1.5).abs() < 0.15);
        assert!(slope.significant);
        assert!(slope.p_value.unwrap() < dec!(0.001));
        assert!(out.adjusted_r_squared <= out.r_squared);
        assert!(out.f_statistic.is_some());
    }

    #[test]
    fn test_collinear_regressors() {
        let x: Vec<Decimal> = (1..=8).map(Decimal::from).collect();
        let doubled = x.iter().map(|v| v * dec!(2)).collect();
        let input = RegressionInput {
            dependent: x.iter().map(|v| v + dec!(1)).collect(),
            regressors: vec![regressor("x", x.clone()), regressor("2x", doubled)],
            confidence_level: None,
        };
        assert!(matches!(
            calculate_regression(&input, &ReportOptions::default()).unwrap_err(),
            FinError::FinancialImpossibility(_)
        ));
    }

    #[test]
    fn test_too_few_observations() {
        let input = RegressionInput {
            dependent: vec![dec!(1), dec!(2)],
            regressors: vec![regressor("x", vec![dec!(1), dec!(2)])],
            confidence_level: None,
        };
        assert!(matches!(
            calculate_regression(&input, &ReportOptions::default()).unwrap_err(),
            FinError::InsufficientData(_)
        ));
    }
}
