use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::metrics::{calculate_performance, PerformanceInput};
use crate::report::{
    fmt_pct, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::FinResult;

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "sortino_ratio",
    category: AnalysisCategory::Performance,
    title_en: "Sortino Ratio",
    title_ar: "نسبة سورتينو",
    methodology: "(annualised return - target) / annualised downside deviation",
};

pub fn report(input: &PerformanceInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let m = calculate_performance(input, options)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.metric("annualised_return", "Annualised return", "العائد السنوي", m.annualised_return, MetricUnit::Percent)
        .metric("target_return", "Target return", "العائد المستهدف", m.target_return, MetricUnit::Percent)
        .metric(
            "downside_deviation",
            "Downside deviation",
            "الانحراف السلبي",
            m.downside_deviation,
            MetricUnit::Percent,
        );

    let Some(sortino) = m.sortino_ratio else {
        b.assessment(Assessment::Favourable).interpret(
            "No period fell short of the target return, so downside risk is nil.",
            "لم تقل أي فترة عن العائد المستهدف، لذا فإن مخاطر الهبوط منعدمة.",
        );
        return Ok(b.finish());
    };

    let assessment = match sortino {
        s if s < Decimal::ZERO => Assessment::Adverse,
        s if s < Decimal::ONE => Assessment::Caution,
        s if s < dec!(2) => Assessment::Neutral,
        _ => Assessment::Favourable,
    };
    let s = fmt_ratio(sortino);
    let dd = fmt_pct(m.downside_deviation);
    b.score(sortino)
        .metric("sortino_ratio", "Sortino ratio", "نسبة سورتينو", sortino, MetricUnit::Ratio)
        .benchmark(dec!(2))
        .assessment(assessment)
        .interpret(
            format!("Excess return over target is {s} times the downside deviation of {dd}."),
            format!("العائد الزائد عن المستهدف يعادل {s} ضعف الانحراف السلبي البالغ {dd}."),
        );
    if let Some(sharpe) = m.sharpe_ratio.filter(|sh| *sh > Decimal::ZERO) {
        if sortino > sharpe * dec!(1.5) {
            b.interpret(
                "Volatility is skewed to the upside.",
                "التقلب يميل نحو الجانب الإيجابي.",
            );
        }
    }
    if sortino < Decimal::ONE {
        b.recommend(
            "Introduce downside protection such as stop-loss rules or hedges.",
            "إضافة حماية من الهبوط مثل أوامر وقف الخسارة أو التحوط.",
        );
    }

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::performance::metrics::fixtures::*;

    #[test]
    fn test_report() {
        let r = report(&input(monthly_returns(), None), &ReportOptions::default()).unwrap();
        assert!(r.metric_value("sortino_ratio").unwrap() > Decimal::ZERO);
    }

    #[test]
    fn test_no_downside() {
        let r = report(
            &input(vec![dec!(0.02), dec!(0.03), dec!(0.025)], None),
            &ReportOptions::default(),
        )
        .unwrap();
        assert_eq!(r.assessment, Assessment::Favourable);
        assert!(r.score.is_none());
    }
}
