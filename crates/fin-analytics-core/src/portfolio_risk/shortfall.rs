//! Expected shortfall (CVaR): the average loss in the tail beyond VaR.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use statrs::distribution::Continuous;

use super::var::{tail_params, TailRiskInput};
use crate::report::{
    fmt_pct, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{from_f64, mean, percentile, standard_normal, to_f64};
use crate::types::{Money, Rate};
use crate::FinResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortfallOutput {
    pub confidence_level: Rate,
    pub historical_var: Rate,
    pub historical_es: Rate,
    pub parametric_var: Rate,
    pub parametric_es: Rate,
    /// Observations at or beyond the historical VaR threshold
    pub tail_observations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical_es_amount: Option<Money>,
    pub warnings: Vec<String>,
}

pub fn calculate_expected_shortfall(
    input: &TailRiskInput,
    options: &ReportOptions,
) -> FinResult<ShortfallOutput> {
    let p = tail_params(input, options)?;
    let returns = &input.series.returns;

    let threshold = percentile(returns, Decimal::ONE - p.confidence);
    let tail: Vec<Decimal> = returns.iter().copied().filter(|r| *r <= threshold).collect();
    let historical_var = -threshold * p.sqrt_horizon;
    let historical_es = -mean(&tail) * p.sqrt_horizon;

    // Normal ES = -(μh - σ√h φ(z) / (1 - c))
    let density = standard_normal()?.pdf(p.z);
    let tail_prob = 1.0 - to_f64(p.confidence);
    let drift = p.mean * p.horizon;
    let scaled_sigma = p.sigma * p.sqrt_horizon;
    let parametric_var = -(drift + from_f64(p.z) * scaled_sigma);
    let parametric_es = -(drift - scaled_sigma * from_f64(density / tail_prob));

    Ok(ShortfallOutput {
        confidence_level: p.confidence,
        historical_var,
        historical_es,
        parametric_var,
        parametric_es,
        tail_observations: tail.len(),
        historical_es_amount: input.portfolio_value.map(|v| v * historical_es),
        warnings: p.warnings,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "expected_shortfall",
    category: AnalysisCategory::PortfolioRisk,
    title_en: "Expected Shortfall (CVaR)",
    title_ar: "العجز المتوقع",
    methodology: "Historical tail average and normal closed-form expected shortfall",
};

pub fn report(input: &TailRiskInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_expected_shortfall(input, options)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.historical_es)
        .metric("historical_es", "Historical expected shortfall", "العجز المتوقع التاريخي", out.historical_es, MetricUnit::Percent)
        .metric("parametric_es", "Parametric expected shortfall", "العجز المتوقع المعلمي", out.parametric_es, MetricUnit::Percent)
        .metric("historical_var", "Historical VaR", "القيمة المعرضة للمخاطر التاريخية", out.historical_var, MetricUnit::Percent)
        .metric(
            "tail_observations",
            "Tail observations",
            "عدد المشاهدات في الذيل",
            Decimal::from(out.tail_observations as u64),
            MetricUnit::Count,
        );
    if let Some(a) = out.historical_es_amount {
        b.metric("historical_es_amount", "Expected shortfall (amount)", "العجز المتوقع (مبلغ)", a, MetricUnit::Currency);
    }

    let es = fmt_pct(out.historical_es);
    let conf = fmt_pct(out.confidence_level);
    b.interpret(
        format!("When losses breach the {conf} VaR, the average loss is {es}."),
        format!("عندما تتجاوز الخسائر القيمة المعرضة للمخاطر عند {conf} يبلغ متوسط الخسارة {es}."),
    );

    let assessment = match out.historical_es {
        v if v < dec!(0.03) => Assessment::Favourable,
        v if v < dec!(0.07) => Assessment::Neutral,
        v if v < dec!(0.15) => Assessment::Caution,
        _ => Assessment::Adverse,
    };
    b.assessment(assessment);

    if out.historical_var > Decimal::ZERO {
        let ratio = out.historical_es / out.historical_var;
        if ratio > dec!(1.5) {
            b.interpret(
                "Tail losses are much deeper than VaR suggests.",
                "خسائر الذيل أعمق بكثير مما تشير إليه القيمة المعرضة للمخاطر.",
            )
            .recommend(
                "Hedge tail exposure with options or reduce positions in the most volatile assets.",
                "التحوط من مخاطر الذيل بالخيارات أو تقليص المراكز في الأصول الأكثر تقلباً.",
            );
        }
    }
    if out.tail_observations < 5 {
        b.warn(format!(
            "Only {} observations fall in the tail; the historical estimate rests on very few losses.",
            out.tail_observations
        ));
    }
    b.warnings(out.warnings);

    Ok(b.finish())
}
