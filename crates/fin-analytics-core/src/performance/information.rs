use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::metrics::{calculate_with_benchmark, PerformanceInput};
use crate::report::{
    fmt_pct, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::FinResult;

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "information_ratio",
    category: AnalysisCategory::Performance,
    title_en: "Information Ratio",
    title_ar: "نسبة المعلومات",
    methodology: "Annualised active return / tracking error",
};

pub fn report(input: &PerformanceInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let (m, bench) = calculate_with_benchmark(input, options)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    let active = m.annualised_return - bench.benchmark_return;
    b.metric("active_return", "Active return", "العائد النشط", active, MetricUnit::Percent)
        .metric("tracking_error", "Tracking error", "خطأ التتبع", bench.tracking_error, MetricUnit::Percent);

    let Some(ir) = bench.information_ratio else {
        b.assessment(Assessment::Neutral)
            .warn("Tracking error is zero; information ratio undefined.")
            .interpret(
                "The portfolio replicates its benchmark exactly.",
                "المحفظة تحاكي مؤشرها المرجعي تماماً.",
            );
        return Ok(b.finish());
    };

    b.score(ir)
        .metric("information_ratio", "Information ratio", "نسبة المعلومات", ir, MetricUnit::Ratio)
        .benchmark(dec!(0.5));

    let irs = fmt_ratio(ir);
    let te = fmt_pct(bench.tracking_error);
    let assessment = match ir {
        x if x < Decimal::ZERO => Assessment::Adverse,
        x if x < dec!(0.5) => Assessment::Neutral,
        _ => Assessment::Favourable,
    };
    b.assessment(assessment).interpret(
        format!("Active management delivered an information ratio of {irs} for {te} tracking error."),
        format!("حققت الإدارة النشطة نسبة معلومات قدرها {irs} مقابل خطأ تتبع {te}."),
    );
    if ir < Decimal::ZERO {
        b.recommend(
            "Active bets are destroying value; reduce tracking error or move to passive exposure.",
            "الرهانات النشطة تهدر القيمة؛ يجب خفض خطأ التتبع أو التحول للاستثمار السلبي.",
        );
    } else if ir >= Decimal::ONE {
        b.interpret("Consistency of outperformance is top-quartile.", "ثبات التفوق في الأداء ضمن الربع الأعلى.");
    }

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::performance::metrics::fixtures::*;

    #[test]
    fn test_active_return_positive() {
        let r = report(
            &input(monthly_returns(), Some(benchmark_returns())),
            &ReportOptions::default(),
        )
        .unwrap();
        let active = r.metric_value("active_return").unwrap();
        assert!((active - dec!(0.04)).abs() < dec!(0.0000001));
        assert!(r.score.unwrap() > Decimal::ZERO);
    }

    #[test]
    fn test_replication_has_zero_tracking_error() {
        let bench = benchmark_returns();
        let r = report(&input(bench.clone(), Some(bench)), &ReportOptions::default()).unwrap();
        assert!(r.score.is_none());
        assert_eq!(r.warnings.len(), 1);
    }
}
