//! One report combining every return-based measure; benchmark-relative
//! measures appear only when benchmark returns are supplied.

use rust_decimal::Decimal;

use super::metrics::{calculate_performance, PerformanceInput};
use super::sharpe::sharpe_assessment;
use crate::report::{
    fmt_pct, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::FinResult;

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "performance_summary",
    category: AnalysisCategory::Performance,
    title_en: "Performance Summary",
    title_ar: "ملخص الأداء",
    methodology: "Return, risk and risk-adjusted ratios on one return series",
};

pub fn report(input: &PerformanceInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let m = calculate_performance(input, options)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.metric("annualised_return", "Annualised return", "العائد السنوي", m.annualised_return, MetricUnit::Percent)
        .metric("cumulative_return", "Cumulative return", "العائد التراكمي", m.cumulative_return, MetricUnit::Percent)
        .metric(
            "annualised_volatility",
            "Annualised volatility",
            "التقلب السنوي",
            m.annualised_volatility,
            MetricUnit::Percent,
        )
        .metric("max_drawdown", "Maximum drawdown", "أقصى تراجع", m.max_drawdown, MetricUnit::Percent);

    let optional = [
        ("sharpe_ratio", "Sharpe ratio", "نسبة شارب", m.sharpe_ratio),
        ("sortino_ratio", "Sortino ratio", "نسبة سورتينو", m.sortino_ratio),
        ("calmar_ratio", "Calmar ratio", "نسبة كالمار", m.calmar_ratio),
        ("omega_ratio", "Omega ratio", "نسبة أوميغا", m.omega_ratio),
    ];
    for (key, en, ar, value) in optional {
        if let Some(v) = value {
            b.metric(key, en, ar, v, MetricUnit::Ratio);
        }
    }

    if let Some(bench) = &m.benchmark {
        b.metric("beta", "Beta", "بيتا", bench.beta, MetricUnit::Ratio)
            .metric("jensens_alpha", "Jensen's alpha", "ألفا جنسن", bench.jensens_alpha, MetricUnit::Percent)
            .metric("tracking_error", "Tracking error", "خطأ التتبع", bench.tracking_error, MetricUnit::Percent);
        if let Some(ir) = bench.information_ratio {
            b.metric("information_ratio", "Information ratio", "نسبة المعلومات", ir, MetricUnit::Ratio);
        }
        if let Some(t) = bench.treynor_ratio {
            b.metric("treynor_ratio", "Treynor ratio", "نسبة ترينور", t, MetricUnit::Percent);
        }
    }

    let ret = fmt_pct(m.annualised_return);
    let vol = fmt_pct(m.annualised_volatility);
    let dd = fmt_pct(m.max_drawdown);
    b.interpret(
        format!("Over {} periods the portfolio returned {ret} a year with {vol} volatility and a worst drawdown of {dd}.", m.observations),
        format!("على مدى {} فترة حققت المحفظة عائداً سنوياً {ret} بتقلب {vol} وأقصى تراجع {dd}.", m.observations),
    );

    match m.sharpe_ratio {
        Some(sharpe) => {
            b.score(sharpe).assessment(sharpe_assessment(sharpe));
            let s = fmt_ratio(sharpe);
            b.interpret(
                format!("Risk-adjusted, that is a Sharpe ratio of {s}."),
                format!("وبعد التعديل بالمخاطر تبلغ نسبة شارب {s}."),
            );
        }
        None => {
            b.assessment(Assessment::Neutral);
        }
    }

    if let Some(bench) = &m.benchmark {
        let alpha = fmt_pct(bench.jensens_alpha);
        if bench.jensens_alpha > Decimal::ZERO {
            b.interpret(
                format!("Against the benchmark the manager generated {alpha} of alpha."),
                format!("مقارنة بالمؤشر حقق المدير ألفا قدرها {alpha}."),
            );
        } else {
            b.interpret(
                format!("Against the benchmark alpha was {alpha}."),
                format!("مقارنة بالمؤشر بلغت ألفا {alpha}."),
            )
            .recommend(
                "Compare fees against a passive alternative given the lack of alpha.",
                "مقارنة الرسوم ببديل سلبي نظراً لغياب ألفا.",
            );
        }
    } else {
        b.recommend(
            "Supply benchmark returns to assess beta, alpha and tracking error.",
            "تزويد عوائد المؤشر المرجعي لتقييم بيتا وألفا وخطأ التتبع.",
        );
    }

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::performance::metrics::fixtures::*;

    #[test]
    fn test_without_benchmark() {
        let r = report(&input(monthly_returns(), None), &ReportOptions::default()).unwrap();
        assert!(r.metric("sharpe_ratio").is_some());
        assert!(r.metric("beta").is_none());
        assert_eq!(r.recommendations.len(), 1);
    }

    #[test]
    fn test_with_benchmark() {
        let r = report(
            &input(monthly_returns(), Some(benchmark_returns())),
            &ReportOptions::default(),
        )
        .unwrap();
        assert!(r.metric("beta").is_some());
        assert!(r.metric("information_ratio").is_some());
        assert!(r.interpretation.contains("alpha"));
    }
}
