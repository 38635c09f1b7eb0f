//! Position concentration: Herfindahl-Hirschman index, effective number of
//! holdings and top-N share.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinError;
use crate::report::{
    fmt_pct, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::safe_div;
use crate::types::{Holding, Money, Rate};
use crate::FinResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcentrationInput {
    pub holdings: Vec<Holding>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_top_n() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcentrationOutput {
    pub total_value: Money,
    /// Σ wᵢ², between 1/N and 1
    pub hhi: Decimal,
    /// HHI rescaled to [0, 1] for the number of holdings
    pub normalised_hhi: Decimal,
    pub effective_holdings: Decimal,
    pub top_n: usize,
    pub top_n_share: Rate,
    pub largest_holding: String,
    pub largest_weight: Rate,
    pub weights: Vec<(String, Rate)>,
}

pub fn calculate_concentration(input: &ConcentrationInput) -> FinResult<ConcentrationOutput> {
    if input.holdings.is_empty() {
        return Err(FinError::InsufficientData("At least one holding required".into()));
    }
    if input.top_n == 0 {
        return Err(FinError::invalid("top_n", "Must be at least 1"));
    }
    if let Some(h) = input.holdings.iter().find(|h| h.value < Decimal::ZERO) {
        return Err(FinError::invalid(
            &format!("holdings.{}.value", h.symbol),
            "Short positions are not supported; values must be non-negative",
        ));
    }

    let total_value: Money = input.holdings.iter().map(|h| h.value).sum();
    let mut weights = input
        .holdings
        .iter()
        .map(|h| Ok((h.symbol.clone(), safe_div(h.value, total_value, "holding weight")?)))
        .collect::<FinResult<Vec<(String, Rate)>>>()?;
    weights.sort_by(|a, b| b.1.cmp(&a.1));

    let hhi: Decimal = weights.iter().map(|(_, w)| w * w).sum();
    let n = Decimal::from(weights.len() as u64);
    let normalised_hhi = if weights.len() > 1 {
        (hhi - Decimal::ONE / n) / (Decimal::ONE - Decimal::ONE / n)
    } else {
        Decimal::ONE
    };
    let effective_holdings = safe_div(Decimal::ONE, hhi, "effective holdings")?;
    let top_n_share = weights.iter().take(input.top_n).map(|(_, w)| *w).sum();
    let (largest_holding, largest_weight) = weights[0].clone();

    Ok(ConcentrationOutput {
        total_value,
        hhi,
        normalised_hhi,
        effective_holdings,
        top_n: input.top_n.min(weights.len()),
        top_n_share,
        largest_holding,
        largest_weight,
        weights,
    })
}

fn classify(hhi: Decimal) -> Assessment {
    match hhi {
        v if v < dec!(0.10) => Assessment::Favourable,
        v if v < dec!(0.15) => Assessment::Neutral,
        v if v < dec!(0.25) => Assessment::Caution,
        _ => Assessment::Adverse,
    }
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "concentration_risk",
    category: AnalysisCategory::PortfolioRisk,
    title_en: "Concentration Risk",
    title_ar: "مخاطر التركز",
    methodology: "Herfindahl-Hirschman index on position weights",
};

pub fn report(input: &ConcentrationInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_concentration(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.hhi)
        .metric("hhi", "Herfindahl-Hirschman index", "مؤشر هيرفندال-هيرشمان", out.hhi, MetricUnit::Ratio)
        .benchmark(dec!(0.15))
        .metric("effective_holdings", "Effective number of holdings", "العدد الفعلي للمراكز", out.effective_holdings, MetricUnit::Count)
        .metric("top_n_share", &format!("Top {} share", out.top_n), &format!("حصة أكبر {} مراكز", out.top_n), out.top_n_share, MetricUnit::Percent)
        .metric("largest_weight", "Largest position", "أكبر مركز", out.largest_weight, MetricUnit::Percent);

    let hhi = fmt_ratio(out.hhi);
    let eff = fmt_ratio(out.effective_holdings);
    let top = fmt_pct(out.top_n_share);
    let n = out.top_n;
    b.interpret(
        format!("HHI of {hhi}: the portfolio behaves like {eff} equally weighted positions, and the top {n} hold {top}."),
        format!("مؤشر HHI يبلغ {hhi}: تتصرف المحفظة كأنها {eff} مراكز متساوية الوزن، وتستحوذ أكبر {n} مراكز على {top}."),
    );

    let assessment = classify(out.hhi);
    b.assessment(assessment);
    if matches!(assessment, Assessment::Caution | Assessment::Adverse) {
        let name = &out.largest_holding;
        let w = fmt_pct(out.largest_weight);
        b.recommend(
            format!("Trim {name} ({w}) and spread the proceeds across smaller positions."),
            format!("تقليص {name} ({w}) وتوزيع العائد على مراكز أصغر."),
        );
    }
    if out.largest_weight > dec!(0.20) {
        b.warn(format!(
            "{} exceeds 20% of the portfolio.",
            out.largest_holding
        ));
    }

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn holding(symbol: &str, value: Decimal) -> Holding {
        Holding { symbol: symbol.into(), value }
    }

    #[test]
    fn test_equal_weights() {
        let holdings = (0..10).map(|i| holding(&format!("H{i}"), dec!(100))).collect();
        let out = calculate_concentration(&ConcentrationInput { holdings, top_n: 5 }).unwrap();
        assert_eq!(out.hhi, dec!(0.1));
        assert_eq!(out.effective_holdings, dec!(10));
        assert_eq!(out.normalised_hhi, Decimal::ZERO);
        assert_eq!(out.top_n_share, dec!(0.5));
    }

    #[test]
    fn test_concentrated_book() {
        let input = ConcentrationInput {
            holdings: vec![holding("A", dec!(600)), holding("B", dec!(300)), holding("C", dec!(100))],
            top_n: 2,
        };
        let out = calculate_concentration(&input).unwrap();
        // 0.36 + 0.09 + 0.01
        assert_eq!(out.hhi, dec!(0.46));
        assert_eq!(out.largest_holding, "A");
        assert_eq!(out.top_n_share, dec!(0.9));
        let r = report(&input, &ReportOptions::default()).unwrap();
        assert_eq!(r.assessment, Assessment::Adverse);
        assert_eq!(r.warnings.len(), 1);
    }

    #[test]
    fn test_bands() {
        assert_eq!(classify(dec!(0.05)), Assessment::Favourable);
        assert_eq!(classify(dec!(0.12)), Assessment::Neutral);
        assert_eq!(classify(dec!(0.20)), Assessment::Caution);
        assert_eq!(classify(dec!(0.25)), Assessment::Adverse);
    }

    #[test]
    fn test_zero_total_value() {
        let input = ConcentrationInput { holdings: vec![holding("A", Decimal::ZERO)], top_n: 5 };
        assert!(matches!(
            calculate_concentration(&input).unwrap_err(),
            FinError::DivisionByZero { .. }
        ));
    }
}
