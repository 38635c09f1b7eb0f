//! Rank-based dependence between two return series.
//!
//! Pseudo-observations uᵢ = rank(xᵢ) / (n + 1) strip out the marginals.
//! From them: Kendall's τ-b, Spearman's ρ, the Gaussian copula correlation
//! on normal scores, and Archimedean fits by inverting τ:
//! Clayton θ = 2τ / (1 - τ) with lower tail dependence 2^(-1/θ), and
//! Gumbel θ = 1 / (1 - τ) with upper tail dependence 2 - 2^(1/θ).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use statrs::distribution::ContinuousCDF;

use crate::error::FinError;
use crate::report::{
    fmt_pct, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{from_f64, require_observations, standard_normal, to_f64, to_f64_vec};
use crate::types::Rate;
use crate::FinResult;

const MIN_OBSERVATIONS: usize = 20;
const MIN_SIMULATIONS: u32 = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopulaInput {
    pub returns_a: Vec<Rate>,
    pub returns_b: Vec<Rate>,
    /// Quantile defining a joint downside event
    #[serde(default = "default_quantile")]
    pub downside_quantile: Rate,
    /// Simulate joint downside under the fitted copulas when set
    #[serde(default)]
    pub simulations: Option<u32>,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_quantile() -> Rate {
    dec!(0.05)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchimedeanFit {
    pub theta: Decimal,
    pub tail_dependence: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointDownsideSimulation {
    pub simulations: u32,
    pub gaussian: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clayton: Option<Decimal>,
    /// Probability if the two series were independent (q²)
    pub independent: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopulaOutput {
    pub observations: usize,
    pub kendall_tau: Decimal,
    pub spearman_rho: Decimal,
    pub gaussian_correlation: Decimal,
    /// sin(πτ/2), the Gaussian correlation implied by Kendall's τ
    pub tau_implied_correlation: Decimal,
    pub clayton: Option<ArchimedeanFit>,
    pub gumbel: Option<ArchimedeanFit>,
    /// Observed P(both below the downside quantile)
    pub empirical_joint_downside: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation: Option<JointDownsideSimulation>,
    pub warnings: Vec<String>,
}

/// Average ranks (1-based), ties sharing the mean of their positions.
fn ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut out = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && values[order[j]] == values[order[i]] {
            j += 1;
        }
        let avg = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            out[idx] = avg;
        }
        i = j;
    }
    out
}

pub(crate) fn pseudo_observations(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    ranks(values).into_iter().map(|r| r / (n + 1.0)).collect()
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx) * (a - mx);
        syy += (b - my) * (b - my);
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return 0.0;
    }
    sxy / (sxx * syy).sqrt()
}

/// Kendall's τ-b, adjusted for ties.
pub(crate) fn kendall_tau(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    let (mut concordant, mut discordant, mut ties_x, mut ties_y) = (0i64, 0i64, 0i64, 0i64);
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];
            if dx == 0.0 && dy == 0.0 {
                continue;
            } else if dx == 0.0 {
                ties_x += 1;
            } else if dy == 0.0 {
                ties_y += 1;
            } else if dx * dy > 0.0 {
                concordant += 1;
            } else {
                discordant += 1;
            }
        }
    }
    let denom = (((concordant + discordant + ties_x) * (concordant + discordant + ties_y)) as f64).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        (concordant - discordant) as f64 / denom
    }
}

fn clayton_fit(tau: f64) -> Option<ArchimedeanFit> {
    if tau <= 0.0 || tau >= 1.0 {
        return None;
    }
    let theta = 2.0 * tau / (1.0 - tau);
    Some(ArchimedeanFit {
        theta: from_f64(theta),
        tail_dependence: from_f64(2f64.powf(-1.0 / theta)),
    })
}

fn gumbel_fit(tau: f64) -> Option<ArchimedeanFit> {
    if tau <= 0.0 || tau >= 1.0 {
        return None;
    }
    let theta = 1.0 / (1.0 - tau);
    Some(ArchimedeanFit {
        theta: from_f64(theta),
        tail_dependence: from_f64(2.0 - 2f64.powf(1.0 / theta)),
    })
}

fn simulate_joint_downside(
    rho: f64,
    clayton_theta: Option<f64>,
    q: f64,
    simulations: u32,
    seed: Option<u64>,
) -> FinResult<JointDownsideSimulation> {
    let normal = standard_normal()?;
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let z_q = normal.inverse_cdf(q);
    let rho = rho.clamp(-0.999_999, 0.999_999);
    let resid = (1.0 - rho * rho).sqrt();

    let mut gaussian_hits = 0u32;
    let mut clayton_hits = 0u32;
    for _ in 0..simulations {
        let z1: f64 = rng.sample(normal);
        let z2 = rho * z1 + resid * rng.sample::<f64, _>(normal);
        if z1 <= z_q && z2 <= z_q {
            gaussian_hits += 1;
        }
        if let Some(theta) = clayton_theta {
            // Conditional inversion: v = (u^-θ (w^(-θ/(1+θ)) - 1) + 1)^(-1/θ)
            let u: f64 = rng.gen_range(f64::EPSILON..1.0);
            let w: f64 = rng.gen_range(f64::EPSILON..1.0);
            let v = (u.powf(-theta) * (w.powf(-theta / (1.0 + theta)) - 1.0) + 1.0)
                .powf(-1.0 / theta);
            if u <= q && v <= q {
                clayton_hits += 1;
            }
        }
    }
    let n = simulations as f64;
    Ok(JointDownsideSimulation {
        simulations,
        gaussian: from_f64(gaussian_hits as f64 / n),
        clayton: clayton_theta.map(|_| from_f64(clayton_hits as f64 / n)),
        independent: from_f64(q * q),
    })
}

pub fn calculate_copula(input: &CopulaInput) -> FinResult<CopulaOutput> {
    require_observations(&input.returns_a, MIN_OBSERVATIONS, "return")?;
    if input.returns_a.len() != input.returns_b.len() {
        return Err(FinError::invalid(
            "returns_b",
            format!(
                "Expected {} observations, got {}",
                input.returns_a.len(),
                input.returns_b.len()
            ),
        ));
    }
    if input.downside_quantile <= Decimal::ZERO || input.downside_quantile >= dec!(0.5) {
        return Err(FinError::invalid(
            "downside_quantile",
            "Must lie strictly between 0 and 0.5",
        ));
    }
    let mut warnings = Vec::new();

    let a = to_f64_vec(&input.returns_a);
    let b = to_f64_vec(&input.returns_b);
    let u = pseudo_observations(&a);
    let v = pseudo_observations(&b);

    let tau = kendall_tau(&a, &b);
    let spearman = pearson(&ranks(&a), &ranks(&b));

    let normal = standard_normal()?;
    let scores_u: Vec<f64> = u.iter().map(|p| normal.inverse_cdf(*p)).collect();
    let scores_v: Vec<f64> = v.iter().map(|p| normal.inverse_cdf(*p)).collect();
    let gaussian = pearson(&scores_u, &scores_v);
    let tau_implied = (std::f64::consts::FRAC_PI_2 * tau).sin();

    let clayton = clayton_fit(tau);
    let gumbel = gumbel_fit(tau);
    if tau <= 0.0 {
        warnings.push("Non-positive Kendall's τ: Clayton and Gumbel copulas do not apply.".into());
    } else if tau >= 1.0 {
        warnings.push("Perfect rank dependence: the series are comonotonic.".into());
    }

    let q = to_f64(input.downside_quantile);
    let joint = u.iter().zip(&v).filter(|(x, y)| **x <= q && **y <= q).count();
    let empirical_joint_downside = from_f64(joint as f64 / u.len() as f64);
    if (u.len() as f64 * q) < 5.0 {
        warnings.push("Fewer than five expected downside observations; the empirical joint downside is noisy.".into());
    }

    let simulation = match input.simulations {
        Some(n) if n < MIN_SIMULATIONS => {
            return Err(FinError::invalid(
                "simulations",
                format!("Must be at least {MIN_SIMULATIONS}"),
            ))
        }
        Some(n) => {
            let theta = clayton.as_ref().map(|c| to_f64(c.theta));
            Some(simulate_joint_downside(gaussian, theta, q, n, input.seed)?)
        }
        None => None,
    };

    Ok(CopulaOutput {
        observations: u.len(),
        kendall_tau: from_f64(tau),
        spearman_rho: from_f64(spearman),
        gaussian_correlation: from_f64(gaussian),
        tau_implied_correlation: from_f64(tau_implied),
        clayton,
        gumbel,
        empirical_joint_downside,
        simulation,
        warnings,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "copula_dependence",
    category: AnalysisCategory::Quantitative,
    title_en: "Copula Dependence Analysis",
    title_ar: "تحليل الاعتماد بالكوبولا",
    methodology: "Rank correlations, Gaussian copula on normal scores, Clayton and Gumbel by tau inversion",
};

pub fn report(input: &CopulaInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_copula(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.kendall_tau)
        .metric("kendall_tau", "Kendall's τ", "تاو كندال", out.kendall_tau, MetricUnit::Ratio)
        .metric("spearman_rho", "Spearman's ρ", "رو سبيرمان", out.spearman_rho, MetricUnit::Ratio)
        .metric("gaussian_correlation", "Gaussian copula correlation", "ارتباط الكوبولا الطبيعية", out.gaussian_correlation, MetricUnit::Ratio)
        .metric("empirical_joint_downside", "Observed joint downside probability", "احتمال الهبوط المشترك المرصود", out.empirical_joint_downside, MetricUnit::Probability);
    if let Some(c) = &out.clayton {
        b.metric("clayton_theta", "Clayton θ", "θ كلايتون", c.theta, MetricUnit::Ratio)
            .metric("lower_tail_dependence", "Lower tail dependence", "اعتماد الذيل الأدنى", c.tail_dependence, MetricUnit::Probability);
    }
    if let Some(g) = &out.gumbel {
        b.metric("upper_tail_dependence", "Upper tail dependence", "اعتماد الذيل الأعلى", g.tail_dependence, MetricUnit::Probability);
    }
    if let Some(sim) = &out.simulation {
        b.metric("simulated_joint_downside_gaussian", "Simulated joint downside (Gaussian)", "الهبوط المشترك المحاكى (طبيعية)", sim.gaussian, MetricUnit::Probability);
        if let Some(c) = sim.clayton {
            b.metric("simulated_joint_downside_clayton", "Simulated joint downside (Clayton)", "الهبوط المشترك المحاكى (كلايتون)", c, MetricUnit::Probability);
        }
    }

    let tau = fmt_ratio(out.kendall_tau);
    let rho = fmt_ratio(out.spearman_rho);
    b.interpret(
        format!("Kendall's τ of {tau} and Spearman's ρ of {rho} measure rank dependence between the two series."),
        format!("يقيس تاو كندال البالغ {tau} ورو سبيرمان البالغ {rho} الاعتماد الرتبي بين السلسلتين."),
    );

    let lower = out.clayton.as_ref().map_or(Decimal::ZERO, |c| c.tail_dependence);
    let assessment = match lower {
        l if l < dec!(0.1) => Assessment::Favourable,
        l if l < dec!(0.3) => Assessment::Neutral,
        l if l < dec!(0.5) => Assessment::Caution,
        _ => Assessment::Adverse,
    };
    b.assessment(assessment);
    if lower >= dec!(0.3) {
        let l = fmt_pct(lower);
        b.interpret(
            format!("The assets tend to crash together: lower tail dependence is {l}."),
            format!("تميل الأصول إلى الانهيار معاً: اعتماد الذيل الأدنى {l}."),
        )
        .recommend(
            "Diversification benefits shrink in sell-offs; do not rely on linear correlation for hedging.",
            "تتقلص فوائد التنويع في موجات البيع؛ لا تعتمد على الارتباط الخطي في التحوط.",
        );
    }
    b.warnings(out.warnings);

    Ok(b.finish())
}
