use rust_decimal::Decimal;

use super::metrics::{calculate_with_benchmark, PerformanceInput};
use crate::report::{
    fmt_pct, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::FinResult;

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "treynor_ratio",
    category: AnalysisCategory::Performance,
    title_en: "Treynor Ratio",
    title_ar: "نسبة ترينور",
    methodology: "(annualised return - risk-free rate) / beta",
};

pub fn report(input: &PerformanceInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let (m, bench) = calculate_with_benchmark(input, options)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.metric("beta", "Beta", "بيتا", bench.beta, MetricUnit::Ratio)
        .metric("annualised_return", "Annualised return", "العائد السنوي", m.annualised_return, MetricUnit::Percent);

    let Some(treynor) = bench.treynor_ratio else {
        b.warn("Beta is zero; Treynor ratio undefined.").interpret(
            "The portfolio has no measurable market exposure.",
            "لا يوجد تعرض ملموس للسوق في المحفظة.",
        );
        return Ok(b.finish());
    };

    // The market line: the benchmark's own excess return per unit of beta
    let market_premium = bench.benchmark_return - m.risk_free_rate;
    b.score(treynor)
        .metric("treynor_ratio", "Treynor ratio", "نسبة ترينور", treynor, MetricUnit::Percent)
        .benchmark(market_premium);

    let t = fmt_pct(treynor);
    let mp = fmt_pct(market_premium);
    let beta = fmt_ratio(bench.beta);
    if bench.beta < Decimal::ZERO {
        b.assessment(Assessment::Caution).interpret(
            format!("Beta is negative ({beta}); the Treynor ratio of {t} should be read with care."),
            format!("بيتا سالبة ({beta})، لذا يجب قراءة نسبة ترينور البالغة {t} بحذر."),
        );
    } else if treynor > market_premium {
        b.assessment(Assessment::Favourable).interpret(
            format!("Excess return per unit of market risk ({t}) beats the benchmark premium of {mp}."),
            format!("العائد الزائد لكل وحدة من مخاطر السوق ({t}) يتفوق على علاوة المؤشر البالغة {mp}."),
        );
    } else {
        b.assessment(Assessment::Adverse).interpret(
            format!("Excess return per unit of market risk ({t}) trails the benchmark premium of {mp}."),
            format!("العائد الزائد لكل وحدة من مخاطر السوق ({t}) أقل من علاوة المؤشر البالغة {mp}."),
        );
        b.recommend(
            "Systematic risk is not being rewarded; consider a lower-cost index exposure.",
            "المخاطر النظامية لا تُكافأ؛ يمكن النظر في التعرض للمؤشر بتكلفة أقل.",
        );
    }

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinError;
    use crate::performance::metrics::fixtures::*;

    #[test]
    fn test_outperforming_manager() {
        let r = report(
            &input(monthly_returns(), Some(benchmark_returns())),
            &ReportOptions::default(),
        )
        .unwrap();
        assert_eq!(r.assessment, Assessment::Favourable);
    }

    #[test]
    fn test_requires_benchmark() {
        match report(&input(monthly_returns(), None), &ReportOptions::default()).unwrap_err() {
            FinError::InvalidInput { field, .. } => assert_eq!(field, "benchmark_returns"),
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }
}
