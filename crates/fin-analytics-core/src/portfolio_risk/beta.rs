//! Market beta and the split of total risk into systematic and
//! idiosyncratic parts.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinError;
use crate::report::{
    fmt_pct, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{correlation, covariance, div_or_zero, mean, sample_variance, safe_div};
use crate::types::{Rate, ReturnSeries};
use crate::FinResult;

const MIN_OBSERVATIONS: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetaInput {
    #[serde(flatten)]
    pub series: ReturnSeries,
    pub benchmark_returns: Vec<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetaOutput {
    pub beta: Decimal,
    /// Regression intercept, annualised
    pub alpha: Rate,
    pub correlation: Decimal,
    pub r_squared: Decimal,
    /// Beta measured only over periods where the benchmark rose
    pub upside_beta: Option<Decimal>,
    /// Beta measured only over periods where the benchmark fell
    pub downside_beta: Option<Decimal>,
    /// Annualised variances
    pub total_variance: Decimal,
    pub systematic_variance: Decimal,
    pub idiosyncratic_variance: Decimal,
    pub systematic_share: Rate,
    pub warnings: Vec<String>,
}

fn conditional_beta(pairs: &[(Decimal, Decimal)]) -> Option<Decimal> {
    if pairs.len() < 3 {
        return None;
    }
    let (p, m): (Vec<Decimal>, Vec<Decimal>) = pairs.iter().copied().unzip();
    let var_m = sample_variance(&m);
    if var_m.is_zero() {
        return None;
    }
    Some(covariance(&p, &m) / var_m)
}

pub fn calculate_beta(input: &BetaInput) -> FinResult<BetaOutput> {
    input.series.require(MIN_OBSERVATIONS)?;
    let returns = &input.series.returns;
    let bench = &input.benchmark_returns;
    if bench.len() != returns.len() {
        return Err(FinError::invalid(
            "benchmark_returns",
            format!("Expected {} observations, got {}", returns.len(), bench.len()),
        ));
    }
    let mut warnings = Vec::new();

    let var_m = sample_variance(bench);
    let beta = safe_div(covariance(returns, bench), var_m, "beta (benchmark variance)")?;
    let ppy = input.series.frequency.periods_per_year();
    let alpha = (mean(returns) - beta * mean(bench)) * ppy;
    let corr = correlation(returns, bench);
    let r_squared = corr * corr;

    let total_variance = sample_variance(returns) * ppy;
    let systematic_variance = (beta * beta * var_m * ppy).min(total_variance);
    let idiosyncratic_variance = (total_variance - systematic_variance).max(Decimal::ZERO);
    let systematic_share = div_or_zero(systematic_variance, total_variance);

    let pairs: Vec<(Decimal, Decimal)> = returns.iter().copied().zip(bench.iter().copied()).collect();
    let up: Vec<_> = pairs.iter().copied().filter(|(_, m)| *m > Decimal::ZERO).collect();
    let down: Vec<_> = pairs.iter().copied().filter(|(_, m)| *m < Decimal::ZERO).collect();
    let upside_beta = conditional_beta(&up);
    let downside_beta = conditional_beta(&down);
    if upside_beta.is_none() || downside_beta.is_none() {
        warnings.push("Too few up or down benchmark periods for conditional betas.".into());
    }
    if r_squared < dec!(0.3) {
        warnings.push("Low R²: the benchmark explains little of the return variation, so beta is unreliable.".into());
    }

    Ok(BetaOutput {
        beta,
        alpha,
        correlation: corr,
        r_squared,
        upside_beta,
        downside_beta,
        total_variance,
        systematic_variance,
        idiosyncratic_variance,
        systematic_share,
        warnings,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "beta_analysis",
    category: AnalysisCategory::PortfolioRisk,
    title_en: "Beta and Systematic Risk",
    title_ar: "معامل بيتا والمخاطر النظامية",
    methodology: "Single-index regression against a benchmark with up/down-market betas",
};

pub fn report(input: &BetaInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_beta(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.beta)
        .metric("beta", "Beta", "بيتا", out.beta, MetricUnit::Ratio)
        .benchmark(Decimal::ONE)
        .metric("alpha", "Annualised alpha", "ألفا السنوية", out.alpha, MetricUnit::Percent)
        .metric("correlation", "Correlation", "الارتباط", out.correlation, MetricUnit::Ratio)
        .metric("r_squared", "R²", "معامل التحديد", out.r_squared, MetricUnit::Ratio)
        .metric("systematic_share", "Systematic share of variance", "حصة المخاطر النظامية", out.systematic_share, MetricUnit::Percent);
    if let Some(v) = out.upside_beta {
        b.metric("upside_beta", "Upside beta", "بيتا الصعود", v, MetricUnit::Ratio);
    }
    if let Some(v) = out.downside_beta {
        b.metric("downside_beta", "Downside beta", "بيتا الهبوط", v, MetricUnit::Ratio);
    }

    let beta = fmt_ratio(out.beta);
    let share = fmt_pct(out.systematic_share);
    b.interpret(
        format!("Beta of {beta}: systematic market risk explains {share} of total variance."),
        format!("بيتا تبلغ {beta}: تفسر مخاطر السوق النظامية {share} من إجمالي التباين."),
    );

    let assessment = match out.beta.abs() {
        v if v <= dec!(0.8) => Assessment::Favourable,
        v if v <= dec!(1.2) => Assessment::Neutral,
        v if v <= dec!(1.5) => Assessment::Caution,
        _ => Assessment::Adverse,
    };
    b.assessment(assessment);

    if let (Some(up), Some(down)) = (out.upside_beta, out.downside_beta) {
        if down > up {
            b.interpret(
                "The portfolio falls harder in down markets than it rises in up markets.",
                "تنخفض المحفظة في الأسواق الهابطة أكثر مما ترتفع في الأسواق الصاعدة.",
            )
            .recommend(
                "Review holdings that amplify market declines.",
                "مراجعة المراكز التي تضخم الانخفاضات السوقية.",
            );
        }
    }
    if out.beta > dec!(1.2) {
        b.recommend(
            "Consider index hedges to bring market exposure closer to target.",
            "النظر في التحوط بالمؤشرات لتقريب التعرض السوقي من المستهدف.",
        );
    }
    b.warnings(out.warnings);

    Ok(b.finish())
}
