//! Jensen's alpha: return above the CAPM-predicted return for the
//! portfolio's beta.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::metrics::{calculate_with_benchmark, PerformanceInput};
use crate::report::{
    fmt_pct, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::FinResult;

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "jensens_alpha",
    category: AnalysisCategory::Performance,
    title_en: "Jensen's Alpha",
    title_ar: "ألفا جنسن",
    methodology: "Rp - [Rf + beta x (Rm - Rf)], annualised",
};

// Alphas inside this band are treated as noise
const ALPHA_BAND: Decimal = dec!(0.005);

pub fn report(input: &PerformanceInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let (m, bench) = calculate_with_benchmark(input, options)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    let expected = m.annualised_return - bench.jensens_alpha;
    b.score(bench.jensens_alpha)
        .metric("jensens_alpha", "Jensen's alpha", "ألفا جنسن", bench.jensens_alpha, MetricUnit::Percent)
        .benchmark(Decimal::ZERO)
        .metric("beta", "Beta", "بيتا", bench.beta, MetricUnit::Ratio)
        .metric("r_squared", "R-squared", "معامل التحديد", bench.r_squared, MetricUnit::Ratio)
        .metric("actual_return", "Actual return", "العائد الفعلي", m.annualised_return, MetricUnit::Percent)
        .metric("capm_return", "CAPM expected return", "العائد المتوقع وفق CAPM", expected, MetricUnit::Percent);

    let alpha = fmt_pct(bench.jensens_alpha);
    let beta = fmt_ratio(bench.beta);
    if bench.jensens_alpha > ALPHA_BAND {
        b.assessment(Assessment::Favourable).interpret(
            format!("The manager added {alpha} a year above the return expected for a beta of {beta}."),
            format!("أضاف المدير {alpha} سنوياً فوق العائد المتوقع لبيتا قدرها {beta}."),
        );
    } else if bench.jensens_alpha < -ALPHA_BAND {
        b.assessment(Assessment::Adverse).interpret(
            format!("Returns fell {alpha} a year short of the CAPM expectation for a beta of {beta}."),
            format!("قصرت العوائد بمقدار {alpha} سنوياً عن توقع CAPM لبيتا قدرها {beta}."),
        );
        b.recommend(
            "Review security selection; the manager is not earning its risk budget.",
            "مراجعة اختيار الأوراق المالية؛ المدير لا يحقق عائداً يوازي المخاطر.",
        );
    } else {
        b.assessment(Assessment::Neutral).interpret(
            format!("Alpha of {alpha} is indistinguishable from zero: returns are explained by market exposure."),
            format!("ألفا البالغة {alpha} لا تختلف جوهرياً عن الصفر، والعوائد تفسرها حركة السوق."),
        );
    }
    if bench.r_squared < dec!(0.5) {
        b.warn("R-squared below 0.5; the benchmark explains little of the return variation and alpha is unreliable.");
    }

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::performance::metrics::fixtures::*;

    #[test]
    fn test_positive_alpha() {
        let r = report(
            &input(monthly_returns(), Some(benchmark_returns())),
            &ReportOptions::default(),
        )
        .unwrap();
        assert_eq!(r.assessment, Assessment::Favourable);
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn test_index_tracker_has_no_alpha() {
        let bench = benchmark_returns();
        let mut i = input(bench.clone(), Some(bench));
        i.risk_free_rate = Some(Decimal::ZERO);
        let r = report(&i, &ReportOptions::default()).unwrap();
        assert_eq!(r.assessment, Assessment::Neutral);
        assert_eq!(r.metric_value("beta"), Some(Decimal::ONE));
    }
}
