//! GARCH(1,1) volatility estimated by maximum likelihood.
//!
//! hₜ = ω + α·εₜ₋₁² + β·hₜ₋₁, with εₜ the demeaned return. Parameters are
//! searched in an unconstrained space (ω = eˣ⁰, α and β through a logistic
//! split) so that ω > 0, α, β ≥ 0 and α + β < 1 hold throughout.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::optimize::nelder_mead;
use crate::error::FinError;
use crate::report::{
    fmt_pct, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{from_f64, std_dev, to_f64, to_f64_vec};
use crate::types::ReturnSeries;
use crate::FinResult;

const MIN_OBSERVATIONS: usize = 30;
const RELIABLE_HISTORY: usize = 250;
const MAX_ITERATIONS: u32 = 5_000;
const TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarchInput {
    #[serde(flatten)]
    pub series: ReturnSeries,
    /// Periods ahead to forecast
    #[serde(default = "default_horizon")]
    pub forecast_horizon: u32,
}

fn default_horizon() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityForecast {
    pub step: u32,
    pub variance: Decimal,
    /// Annualised volatility implied by the step's variance
    pub annualised_volatility: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarchOutput {
    pub omega: Decimal,
    pub alpha: Decimal,
    pub beta: Decimal,
    pub persistence: Decimal,
    /// Periods for a variance shock to decay by half
    pub half_life: Option<Decimal>,
    pub long_run_variance: Decimal,
    pub long_run_volatility: Decimal,
    pub current_volatility: Decimal,
    pub log_likelihood: Decimal,
    pub aic: Decimal,
    pub bic: Decimal,
    pub iterations: u32,
    pub forecast: Vec<VolatilityForecast>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct Params {
    omega: f64,
    alpha: f64,
    beta: f64,
}

impl Params {
    fn from_unconstrained(x: &[f64]) -> Self {
        let a = x[1].exp();
        let b = x[2].exp();
        let denom = 1.0 + a + b;
        Params {
            omega: x[0].exp(),
            alpha: a / denom,
            beta: b / denom,
        }
    }

    fn to_unconstrained(self) -> Vec<f64> {
        let rest = 1.0 - self.alpha - self.beta;
        vec![
            self.omega.ln(),
            (self.alpha / rest).ln(),
            (self.beta / rest).ln(),
        ]
    }

    fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }
}

/// Conditional variances h₁..h_T followed by the one-step forecast h_{T+1}.
fn conditional_variances(eps: &[f64], p: Params, initial: f64) -> Vec<f64> {
    let mut h = Vec::with_capacity(eps.len() + 1);
    h.push(initial);
    for e in eps {
        let prev = h[h.len() - 1];
        h.push(p.omega + p.alpha * e * e + p.beta * prev);
    }
    h
}

/// Gaussian negative log-likelihood without the constant term.
fn negative_log_likelihood(eps: &[f64], p: Params, initial: f64) -> f64 {
    let h = conditional_variances(eps, p, initial);
    let mut nll = 0.0;
    for (e, ht) in eps.iter().zip(&h) {
        if *ht <= 0.0 || !ht.is_finite() {
            return f64::INFINITY;
        }
        nll += ht.ln() + e * e / ht;
    }
    0.5 * nll
}

pub fn calculate_garch(input: &GarchInput) -> FinResult<GarchOutput> {
    input.series.require(MIN_OBSERVATIONS)?;
    if input.forecast_horizon == 0 {
        return Err(FinError::invalid("forecast_horizon", "Must be at least 1"));
    }
    let mut warnings = Vec::new();
    if input.series.len() < RELIABLE_HISTORY {
        warnings.push(format!(
            "GARCH estimates from {} observations are imprecise; {RELIABLE_HISTORY}+ recommended.",
            input.series.len()
        ));
    }

    if std_dev(&input.series.returns).is_zero() {
        return Err(FinError::invalid("returns", "Returns have zero variance"));
    }

    let returns = to_f64_vec(&input.series.returns);
    let n = returns.len() as f64;
    let mu = returns.iter().sum::<f64>() / n;
    let eps: Vec<f64> = returns.iter().map(|r| r - mu).collect();
    let sample_var = eps.iter().map(|e| e * e).sum::<f64>() / (n - 1.0);

    let start = Params {
        omega: sample_var * 0.05,
        alpha: 0.05,
        beta: 0.90,
    };
    let fit = nelder_mead(
        "garch_volatility",
        |x| negative_log_likelihood(&eps, Params::from_unconstrained(x), sample_var),
        &start.to_unconstrained(),
        0.5,
        MAX_ITERATIONS,
        TOLERANCE,
    )?;
    let p = Params::from_unconstrained(&fit.point);
    let persistence = p.persistence();

    let long_run_variance = p.omega / (1.0 - persistence);
    let ppy = to_f64(input.series.frequency.periods_per_year());
    let h = conditional_variances(&eps, p, sample_var);
    let next = h[h.len() - 1];

    let forecast = (1..=input.forecast_horizon)
        .map(|k| {
            let variance =
                long_run_variance + persistence.powi(k as i32 - 1) * (next - long_run_variance);
            VolatilityForecast {
                step: k,
                variance: from_f64(variance),
                annualised_volatility: from_f64((variance * ppy).sqrt()),
            }
        })
        .collect();

    let log_likelihood = -fit.value - 0.5 * n * (2.0 * std::f64::consts::PI).ln();
    let k = 4.0; // μ, ω, α, β
    let half_life = if persistence > 0.0 {
        Some(from_f64(0.5f64.ln() / persistence.ln()))
    } else {
        None
    };
    if persistence > 0.99 {
        warnings.push("Persistence near 1: shocks to volatility are close to permanent (IGARCH).".into());
    }

    Ok(GarchOutput {
        omega: from_f64(p.omega),
        alpha: from_f64(p.alpha),
        beta: from_f64(p.beta),
        persistence: from_f64(persistence),
        half_life,
        long_run_variance: from_f64(long_run_variance),
        long_run_volatility: from_f64((long_run_variance * ppy).sqrt()),
        current_volatility: from_f64((next * ppy).sqrt()),
        log_likelihood: from_f64(log_likelihood),
        aic: from_f64(2.0 * k - 2.0 * log_likelihood),
        bic: from_f64(k * n.ln() - 2.0 * log_likelihood),
        iterations: fit.iterations,
        forecast,
        warnings,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "garch_volatility",
    category: AnalysisCategory::Quantitative,
    title_en: "GARCH(1,1) Volatility Model",
    title_ar: "نموذج GARCH(1,1) للتقلب",
    methodology: "Gaussian maximum likelihood via Nelder-Mead over constrained parameters",
};

pub fn report(input: &GarchInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_garch(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.persistence)
        .metric("omega", "ω (constant)", "ω (الثابت)", out.omega, MetricUnit::Ratio)
        .metric("alpha", "α (shock reaction)", "α (الاستجابة للصدمات)", out.alpha, MetricUnit::Ratio)
        .metric("beta", "β (volatility memory)", "β (ذاكرة التقلب)", out.beta, MetricUnit::Ratio)
        .metric("persistence", "Persistence (α + β)", "الاستمرارية (α + β)", out.persistence, MetricUnit::Ratio)
        .metric("current_volatility", "Current volatility (annualised)", "التقلب الحالي (سنوي)", out.current_volatility, MetricUnit::Percent)
        .metric("long_run_volatility", "Long-run volatility (annualised)", "التقلب طويل الأجل (سنوي)", out.long_run_volatility, MetricUnit::Percent)
        .metric("log_likelihood", "Log-likelihood", "لوغاريتم الاحتمال", out.log_likelihood, MetricUnit::Ratio);
    if let Some(hl) = out.half_life {
        b.metric("half_life", "Shock half-life (periods)", "عمر نصف الصدمة (فترات)", hl, MetricUnit::Count);
    }
    if let Some(last) = out.forecast.last() {
        b.metric(
            "forecast_volatility",
            &format!("Forecast volatility, step {}", last.step),
            &format!("التقلب المتوقع، الخطوة {}", last.step),
            last.annualised_volatility,
            MetricUnit::Percent,
        );
    }

    let cur = fmt_pct(out.current_volatility);
    let lr = fmt_pct(out.long_run_volatility);
    let pers = fmt_ratio(out.persistence);
    b.interpret(
        format!("Current volatility is {cur} against a long-run level of {lr}; persistence is {pers}."),
        format!("التقلب الحالي {cur} مقابل مستوى طويل الأجل {lr}؛ والاستمرارية {pers}."),
    );

    let ratio = if out.long_run_volatility.is_zero() {
        Decimal::ONE
    } else {
        out.current_volatility / out.long_run_volatility
    };
    let assessment = match ratio {
        r if r < dec!(0.9) => Assessment::Favourable,
        r if r <= dec!(1.1) => Assessment::Neutral,
        r if r <= dec!(1.5) => Assessment::Caution,
        _ => Assessment::Adverse,
    };
    b.assessment(assessment);
    if ratio > dec!(1.1) {
        b.interpret(
            "Volatility is elevated and expected to decay toward its long-run level.",
            "التقلب مرتفع ومن المتوقع أن يتراجع نحو مستواه طويل الأجل.",
        )
        .recommend(
            "Scale position sizes to the forecast rather than historical volatility.",
            "تحجيم المراكز وفق التقلب المتوقع بدلاً من التقلب التاريخي.",
        );
    } else if ratio < dec!(0.9) {
        b.recommend(
            "Calm conditions tend to revert; avoid adding leverage on low current volatility.",
            "الفترات الهادئة تميل إلى الانعكاس؛ تجنب زيادة الرافعة بسبب انخفاض التقلب الحالي.",
        );
    }
    b.warnings(out.warnings);

    Ok(b.finish())
}
