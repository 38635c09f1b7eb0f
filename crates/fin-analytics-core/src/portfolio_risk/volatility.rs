//! Portfolio volatility and risk decomposition.
//!
//! σp = √(wᵀΣw). Marginal contribution MCᵢ = (Σw)ᵢ / σp, component
//! contribution CCᵢ = wᵢ·MCᵢ (the components sum to σp), and the
//! diversification ratio Σwᵢσᵢ / σp.

use nalgebra::{DMatrix, DVector};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinError;
use crate::report::{
    fmt_pct, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{covariance, from_f64, require_observations, to_f64, to_f64_vec};
use crate::types::{Rate, ReturnFrequency};
use crate::FinResult;

const WEIGHT_TOLERANCE: Decimal = dec!(0.0001);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioVolatilityInput {
    pub weights: Vec<Rate>,
    /// Annualised covariance matrix, row-major
    #[serde(default)]
    pub covariance_matrix: Option<Vec<Vec<Decimal>>>,
    /// Per-asset periodic returns, used when no covariance matrix is given
    #[serde(default)]
    pub asset_returns: Option<Vec<Vec<Rate>>>,
    #[serde(default)]
    pub frequency: ReturnFrequency,
    #[serde(default)]
    pub asset_names: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRiskContribution {
    pub asset: String,
    pub weight: Rate,
    pub volatility: Rate,
    pub marginal_contribution: Decimal,
    pub component_contribution: Decimal,
    /// Share of portfolio volatility
    pub percent_contribution: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioVolatilityOutput {
    pub portfolio_variance: Decimal,
    pub portfolio_volatility: Rate,
    pub weighted_average_volatility: Rate,
    pub diversification_ratio: Decimal,
    pub contributions: Vec<AssetRiskContribution>,
    pub warnings: Vec<String>,
}

fn covariance_from_returns(returns: &[Vec<Rate>], frequency: ReturnFrequency) -> FinResult<DMatrix<f64>> {
    let n = returns.len();
    let len = returns.first().map_or(0, Vec::len);
    for (i, series) in returns.iter().enumerate() {
        require_observations(series, 2, "asset return")?;
        if series.len() != len {
            return Err(FinError::invalid(
                "asset_returns",
                format!("Series {i} has {} observations, expected {len}", series.len()),
            ));
        }
    }
    let ppy = frequency.periods_per_year();
    let mut cov = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in i..n {
            let c = to_f64(covariance(&returns[i], &returns[j]) * ppy);
            cov[(i, j)] = c;
            cov[(j, i)] = c;
        }
    }
    Ok(cov)
}

fn covariance_from_rows(rows: &[Vec<Decimal>], n: usize) -> FinResult<DMatrix<f64>> {
    if rows.len() != n || rows.iter().any(|r| r.len() != n) {
        return Err(FinError::invalid(
            "covariance_matrix",
            format!("Must be {n}x{n} to match the weights"),
        ));
    }
    let flat: Vec<f64> = rows.iter().flat_map(|r| to_f64_vec(r)).collect();
    let cov = DMatrix::from_row_slice(n, n, &flat);
    if (0..n).any(|i| cov[(i, i)] < 0.0) {
        return Err(FinError::invalid(
            "covariance_matrix",
            "Diagonal variances must be non-negative",
        ));
    }
    Ok(cov)
}

pub fn calculate_portfolio_volatility(
    input: &PortfolioVolatilityInput,
) -> FinResult<PortfolioVolatilityOutput> {
    let n = input.weights.len();
    if n == 0 {
        return Err(FinError::invalid("weights", "At least one weight required"));
    }
    let mut warnings = Vec::new();

    let cov = match (&input.covariance_matrix, &input.asset_returns) {
        (Some(rows), _) => covariance_from_rows(rows, n)?,
        (None, Some(returns)) => {
            if returns.len() != n {
                return Err(FinError::invalid(
                    "asset_returns",
                    format!("{} series supplied for {n} weights", returns.len()),
                ));
            }
            covariance_from_returns(returns, input.frequency)?
        }
        (None, None) => {
            return Err(FinError::invalid(
                "covariance_matrix",
                "Either covariance_matrix or asset_returns is required",
            ))
        }
    };

    let total: Decimal = input.weights.iter().sum();
    if total.is_zero() {
        return Err(FinError::invalid("weights", "Weights sum to zero"));
    }
    let weights: Vec<Rate> = if (total - Decimal::ONE).abs() > WEIGHT_TOLERANCE {
        warnings.push(format!("Weights summed to {total}; normalised to 1."));
        input.weights.iter().map(|w| w / total).collect()
    } else {
        input.weights.clone()
    };

    let w = DVector::from_column_slice(&to_f64_vec(&weights));
    let sigma_w = &cov * &w;
    let variance = w.dot(&sigma_w);
    if variance < -1e-12 {
        return Err(FinError::FinancialImpossibility(
            "Covariance matrix produced a negative portfolio variance".into(),
        ));
    }
    let variance = variance.max(0.0);
    let vol = variance.sqrt();

    let names: Vec<String> = match &input.asset_names {
        Some(names) if names.len() == n => names.clone(),
        Some(_) => {
            warnings.push("asset_names length does not match weights; using positional names.".into());
            (1..=n).map(|i| format!("asset_{i}")).collect()
        }
        None => (1..=n).map(|i| format!("asset_{i}")).collect(),
    };

    let mut weighted_vol = 0.0;
    let mut contributions = Vec::with_capacity(n);
    for i in 0..n {
        let asset_vol = cov[(i, i)].sqrt();
        weighted_vol += w[i] * asset_vol;
        let (marginal, component) = if vol > 0.0 {
            (sigma_w[i] / vol, w[i] * sigma_w[i] / vol)
        } else {
            (0.0, 0.0)
        };
        let percent = if vol > 0.0 { component / vol } else { 0.0 };
        contributions.push(AssetRiskContribution {
            asset: names[i].clone(),
            weight: weights[i],
            volatility: from_f64(asset_vol),
            marginal_contribution: from_f64(marginal),
            component_contribution: from_f64(component),
            percent_contribution: from_f64(percent),
        });
    }

    let diversification_ratio = if vol > 0.0 {
        from_f64(weighted_vol / vol)
    } else {
        warnings.push("Portfolio volatility is zero; diversification ratio undefined.".into());
        Decimal::ONE
    };

    Ok(PortfolioVolatilityOutput {
        portfolio_variance: from_f64(variance),
        portfolio_volatility: from_f64(vol),
        weighted_average_volatility: from_f64(weighted_vol),
        diversification_ratio,
        contributions,
        warnings,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "portfolio_volatility",
    category: AnalysisCategory::PortfolioRisk,
    title_en: "Portfolio Volatility and Risk Contribution",
    title_ar: "تقلب المحفظة ومساهمة الأصول في المخاطر",
    methodology: "Covariance-matrix volatility with Euler risk decomposition",
};

pub fn report(input: &PortfolioVolatilityInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_portfolio_volatility(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.portfolio_volatility)
        .metric("portfolio_volatility", "Portfolio volatility", "تقلب المحفظة", out.portfolio_volatility, MetricUnit::Percent)
        .metric("weighted_average_volatility", "Weighted average asset volatility", "متوسط التقلب المرجح للأصول", out.weighted_average_volatility, MetricUnit::Percent)
        .metric("diversification_ratio", "Diversification ratio", "نسبة التنويع", out.diversification_ratio, MetricUnit::Ratio);
    for c in &out.contributions {
        b.metric(
            &format!("contribution_{}", c.asset),
            &format!("Risk share: {}", c.asset),
            &format!("حصة المخاطر: {}", c.asset),
            c.percent_contribution,
            MetricUnit::Percent,
        );
    }

    let vol = fmt_pct(out.portfolio_volatility);
    let dr = fmt_ratio(out.diversification_ratio);
    b.interpret(
        format!("Annualised portfolio volatility is {vol} with a diversification ratio of {dr}."),
        format!("يبلغ التقلب السنوي للمحفظة {vol} بنسبة تنويع {dr}."),
    );

    let assessment = match out.portfolio_volatility {
        v if v < dec!(0.10) => Assessment::Favourable,
        v if v < dec!(0.20) => Assessment::Neutral,
        v if v < dec!(0.30) => Assessment::Caution,
        _ => Assessment::Adverse,
    };
    b.assessment(assessment);

    if let Some(top) = out
        .contributions
        .iter()
        .max_by(|a, b| a.percent_contribution.cmp(&b.percent_contribution))
    {
        if top.percent_contribution > top.weight * dec!(1.5) && top.percent_contribution > dec!(0.3) {
            let share = fmt_pct(top.percent_contribution);
            let weight = fmt_pct(top.weight);
            b.interpret(
                format!("{} contributes {share} of risk on a {weight} weight.", top.asset),
                format!("يساهم {} بنسبة {share} من المخاطر مقابل وزن {weight}.", top.asset),
            )
            .recommend(
                format!("Reduce the weight of {} or pair it with lower-correlated assets.", top.asset),
                format!("تخفيض وزن {} أو إقرانه بأصول أقل ارتباطاً.", top.asset),
            );
        }
    }
    if out.diversification_ratio < dec!(1.1) && out.contributions.len() > 1 {
        b.recommend(
            "Holdings move closely together; add assets with lower correlation to improve diversification.",
            "الأصول تتحرك معاً بشكل وثيق؛ إضافة أصول أقل ارتباطاً لتحسين التنويع.",
        );
    }
    b.warnings(out.warnings);

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn two_asset(weights: Vec<Decimal>) -> PortfolioVolatilityInput {
        PortfolioVolatilityInput {
            weights,
            covariance_matrix: Some(vec![
                vec![dec!(0.04), dec!(0.01)],
                vec![dec!(0.01), dec!(0.09)],
            ]),
            asset_returns: None,
            frequency: ReturnFrequency::Annual,
            asset_names: Some(vec!["bonds".into(), "equity".into()]),
        }
    }

    #[test]
    fn test_two_asset_volatility() {
        let out = calculate_portfolio_volatility(&two_asset(vec![dec!(0.5), dec!(0.5)])).unwrap();
        // 0.25*0.04 + 0.25*0.09 + 2*0.25*0.01 = 0.0375
        assert_abs_diff_eq!(to_f64(out.portfolio_variance), 0.0375, epsilon = 1e-9);
        assert_abs_diff_eq!(to_f64(out.portfolio_volatility), 0.0375f64.sqrt(), epsilon = 1e-9);
        assert_abs_diff_eq!(to_f64(out.diversification_ratio), 0.25 / 0.0375f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_components_sum_to_volatility() {
        let out = calculate_portfolio_volatility(&two_asset(vec![dec!(0.3), dec!(0.7)])).unwrap();
        let sum: Decimal = out.contributions.iter().map(|c| c.component_contribution).sum();
        assert!((sum - out.portfolio_volatility).abs() < dec!(0.000001));
        let pct: Decimal = out.contributions.iter().map(|c| c.percent_contribution).sum();
        assert!((pct - Decimal::ONE).abs() < dec!(0.000001));
        assert_eq!(out.contributions[1].asset, "equity");
    }

    #[test]
    fn test_weights_normalised_with_warning() {
        let out = calculate_portfolio_volatility(&two_asset(vec![dec!(1), dec!(1)])).unwrap();
        assert_eq!(out.contributions[0].weight, dec!(0.5));
        assert!(out.warnings.iter().any(|w| w.contains("normalised")));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = calculate_portfolio_volatility(&two_asset(vec![dec!(0.5), dec!(0.3), dec!(0.2)]))
            .unwrap_err();
        match err {
            FinError::InvalidInput { field, .. } => assert_eq!(field, "covariance_matrix"),
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_covariance_from_returns() {
        let input = PortfolioVolatilityInput {
            weights: vec![dec!(0.6), dec!(0.4)],
            covariance_matrix: None,
            asset_returns: Some(vec![
                vec![dec!(0.01), dec!(-0.02), dec!(0.03), dec!(0.00)],
                vec![dec!(0.02), dec!(-0.01), dec!(0.01), dec!(0.01)],
            ]),
            frequency: ReturnFrequency::Monthly,
            asset_names: None,
        };
        let out = calculate_portfolio_volatility(&input).unwrap();
        assert!(out.portfolio_volatility > Decimal::ZERO);
        assert_eq!(out.contributions[0].asset, "asset_1");
        assert!(out.diversification_ratio >= Decimal::ONE);
    }

    #[test]
    fn test_negative_variance_rejected() {
        let mut input = two_asset(vec![dec!(0.5), dec!(0.5)]);
        input.covariance_matrix = Some(vec![
            vec![dec!(0.01), dec!(-0.5)],
            vec![dec!(-0.5), dec!(0.01)],
        ]);
        assert!(matches!(
            calculate_portfolio_volatility(&input).unwrap_err(),
            FinError::FinancialImpossibility(_)
        ));
    }
}
