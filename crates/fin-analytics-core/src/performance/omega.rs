use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::metrics::{calculate_performance, PerformanceInput};
use crate::report::{
    fmt_pct, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::FinResult;

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "omega_ratio",
    category: AnalysisCategory::Performance,
    title_en: "Omega Ratio",
    title_ar: "نسبة أوميغا",
    methodology: "Probability-weighted gains over losses relative to a threshold return",
};

pub fn report(input: &PerformanceInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let m = calculate_performance(input, options)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.metric("threshold", "Threshold return (annual)", "العائد المرجعي (سنوي)", m.target_return, MetricUnit::Percent);
    let threshold = fmt_pct(m.target_return);

    let Some(omega) = m.omega_ratio else {
        b.assessment(Assessment::Favourable).interpret(
            format!("Every period met the {threshold} threshold."),
            format!("حققت جميع الفترات العائد المرجعي البالغ {threshold}."),
        );
        return Ok(b.finish());
    };

    let assessment = if omega > dec!(1.5) {
        Assessment::Favourable
    } else if omega >= Decimal::ONE {
        Assessment::Neutral
    } else {
        Assessment::Adverse
    };
    let o = fmt_ratio(omega);
    b.score(omega)
        .metric("omega_ratio", "Omega ratio", "نسبة أوميغا", omega, MetricUnit::Ratio)
        .benchmark(Decimal::ONE)
        .assessment(assessment)
        .interpret(
            format!("Gains above the {threshold} threshold outweigh shortfalls {o} to 1."),
            format!("المكاسب فوق العائد المرجعي {threshold} تفوق الخسائر بنسبة {o} إلى 1."),
        );
    if omega < Decimal::ONE {
        b.recommend(
            "The return distribution does not clear the threshold; revisit the target or the strategy.",
            "توزيع العوائد لا يتجاوز العائد المرجعي؛ يجب مراجعة الهدف أو الاستراتيجية.",
        );
    }

    Ok(b.finish())
}
