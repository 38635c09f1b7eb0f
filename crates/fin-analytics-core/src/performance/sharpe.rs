use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::metrics::{calculate_performance, PerformanceInput};
use crate::report::{
    fmt_pct, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::FinResult;

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "sharpe_ratio",
    category: AnalysisCategory::Performance,
    title_en: "Sharpe Ratio",
    title_ar: "نسبة شارب",
    methodology: "(annualised return - risk-free rate) / annualised volatility",
};

pub(crate) fn sharpe_assessment(sharpe: Decimal) -> Assessment {
    match sharpe {
        s if s < Decimal::ZERO => Assessment::Adverse,
        s if s < dec!(0.5) => Assessment::Caution,
        s if s < Decimal::ONE => Assessment::Neutral,
        _ => Assessment::Favourable,
    }
}

pub fn report(input: &PerformanceInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let m = calculate_performance(input, options)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.metric("annualised_return", "Annualised return", "العائد السنوي", m.annualised_return, MetricUnit::Percent)
        .metric(
            "annualised_volatility",
            "Annualised volatility",
            "التقلب السنوي",
            m.annualised_volatility,
            MetricUnit::Percent,
        )
        .metric("risk_free_rate", "Risk-free rate", "المعدل الخالي من المخاطر", m.risk_free_rate, MetricUnit::Percent);

    let Some(sharpe) = m.sharpe_ratio else {
        b.warn("Return volatility is zero; Sharpe ratio undefined.")
            .interpret(
                "Returns show no variability, so risk-adjusted performance cannot be measured.",
                "العوائد لا تظهر أي تقلب، لذا لا يمكن قياس الأداء المعدل بالمخاطر.",
            );
        return Ok(b.finish());
    };

    b.score(sharpe)
        .metric("sharpe_ratio", "Sharpe ratio", "نسبة شارب", sharpe, MetricUnit::Ratio)
        .benchmark(Decimal::ONE)
        .assessment(sharpe_assessment(sharpe));

    let s = fmt_ratio(sharpe);
    let vol = fmt_pct(m.annualised_volatility);
    b.interpret(
        format!("The portfolio earned {s} units of excess return per unit of total risk ({vol} volatility)."),
        format!("حققت المحفظة {s} وحدة من العائد الإضافي لكل وحدة من المخاطر الكلية (تقلب {vol})."),
    );
    if sharpe >= dec!(2) {
        b.interpret("This is an exceptional risk-adjusted result.", "هذه نتيجة استثنائية بعد تعديلها بالمخاطر.");
    } else if sharpe < dec!(0.5) {
        b.recommend(
            "Reduce volatility through diversification or review the strategy's return drivers.",
            "خفض التقلب عبر التنويع أو مراجعة مصادر العائد في الاستراتيجية.",
        );
    }

    Ok(b.finish())
}
