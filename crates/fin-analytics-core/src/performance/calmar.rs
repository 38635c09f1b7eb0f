use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::metrics::{calculate_performance, PerformanceInput};
use crate::report::{
    fmt_pct, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::FinResult;

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "calmar_ratio",
    category: AnalysisCategory::Performance,
    title_en: "Calmar Ratio",
    title_ar: "نسبة كالمار",
    methodology: "Annualised return / maximum drawdown",
};

pub fn report(input: &PerformanceInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let m = calculate_performance(input, options)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.metric("annualised_return", "Annualised return", "العائد السنوي", m.annualised_return, MetricUnit::Percent)
        .metric("max_drawdown", "Maximum drawdown", "أقصى تراجع", m.max_drawdown, MetricUnit::Percent);

    let Some(calmar) = m.calmar_ratio else {
        b.assessment(Assessment::Favourable).interpret(
            "The return path never fell below a previous peak.",
            "لم ينخفض مسار العائد أبداً عن قمة سابقة.",
        );
        return Ok(b.finish());
    };

    let assessment = match calmar {
        c if c < Decimal::ZERO => Assessment::Adverse,
        c if c < dec!(0.5) => Assessment::Caution,
        c if c < Decimal::ONE => Assessment::Neutral,
        _ => Assessment::Favourable,
    };
    let c = fmt_ratio(calmar);
    let dd = fmt_pct(m.max_drawdown);
    b.score(calmar)
        .metric("calmar_ratio", "Calmar ratio", "نسبة كالمار", calmar, MetricUnit::Ratio)
        .benchmark(Decimal::ONE)
        .assessment(assessment)
        .interpret(
            format!("Annual return is {c} times the worst peak-to-trough loss of {dd}."),
            format!("العائد السنوي يعادل {c} ضعف أسوأ تراجع من القمة إلى القاع البالغ {dd}."),
        );
    if calmar < dec!(0.5) {
        b.recommend(
            "Recovering from drawdowns of this size takes years at the current return; tighten risk limits.",
            "التعافي من تراجعات بهذا الحجم يستغرق سنوات بالعائد الحالي؛ يجب تشديد حدود المخاطر.",
        );
    }
    if m.observations < 36 && input.series.frequency == crate::types::ReturnFrequency::Monthly {
        b.warn("Calmar is conventionally measured over 36 monthly observations; shorter histories understate drawdown risk.");
    }

    Ok(b.finish())
}
