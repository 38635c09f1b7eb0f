//! Terminal price distribution under geometric Brownian motion.
//!
//! S_T = S₀ · exp((μ - σ²/2)T + σ√T·Z), Z ~ N(0, 1). Paths are drawn from
//! a seedable RNG so results are reproducible given `seed`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinError;
use crate::report::{
    fmt_money, fmt_pct, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{from_f64, standard_normal, to_f64, validate_positive};
use crate::types::{Money, Rate, Years};
use crate::FinResult;

const MIN_SIMULATIONS: u32 = 100;
const MAX_SIMULATIONS: u32 = 1_000_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloPriceInput {
    pub initial_price: Money,
    /// Annual drift μ
    pub expected_return: Rate,
    /// Annual volatility σ
    pub volatility: Rate,
    pub horizon_years: Years,
    #[serde(default = "default_simulations")]
    pub simulations: u32,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Price whose probability of being exceeded at the horizon is reported
    #[serde(default)]
    pub target_price: Option<Money>,
}

fn default_simulations() -> u32 {
    10_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePercentiles {
    pub p5: Money,
    pub p25: Money,
    pub p50: Money,
    pub p75: Money,
    pub p95: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloPriceOutput {
    pub simulations: u32,
    pub expected_price: Money,
    /// S₀·e^(μT), for comparison with the simulated mean
    pub analytical_expected_price: Money,
    pub std_dev: Money,
    pub percentiles: PricePercentiles,
    pub probability_of_loss: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability_above_target: Option<Rate>,
    /// Loss from S₀ at the 5th percentile
    pub value_at_risk_95: Money,
    /// Mean loss from S₀ across the worst 5% of paths
    pub expected_shortfall_95: Money,
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] * (1.0 - frac) + sorted[upper] * frac
}

pub fn simulate_terminal_prices(input: &MonteCarloPriceInput) -> FinResult<Vec<f64>> {
    validate_positive(input.initial_price, "initial_price")?;
    validate_positive(input.horizon_years, "horizon_years")?;
    if input.volatility < Decimal::ZERO {
        return Err(FinError::invalid("volatility", "Must be non-negative"));
    }
    if !(MIN_SIMULATIONS..=MAX_SIMULATIONS).contains(&input.simulations) {
        return Err(FinError::invalid(
            "simulations",
            format!("Must be between {MIN_SIMULATIONS} and {MAX_SIMULATIONS}"),
        ));
    }

    let s0 = to_f64(input.initial_price);
    let mu = to_f64(input.expected_return);
    let sigma = to_f64(input.volatility);
    let t = to_f64(input.horizon_years);
    let drift = (mu - 0.5 * sigma * sigma) * t;
    let diffusion = sigma * t.sqrt();

    let normal = standard_normal()?;
    let mut rng = match input.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    Ok((0..input.simulations)
        .map(|_| {
            let z: f64 = rng.sample(normal);
            s0 * (drift + diffusion * z).exp()
        })
        .collect())
}

pub fn calculate_monte_carlo_price(input: &MonteCarloPriceInput) -> FinResult<MonteCarloPriceOutput> {
    let mut prices = simulate_terminal_prices(input)?;
    prices.sort_by(|a, b| a.total_cmp(b));

    let n = prices.len() as f64;
    let s0 = to_f64(input.initial_price);
    let mean = prices.iter().sum::<f64>() / n;
    let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let losses = prices.iter().filter(|p| **p < s0).count();

    let tail_len = ((n * 0.05).ceil() as usize).max(1);
    let tail_mean = prices[..tail_len].iter().sum::<f64>() / tail_len as f64;
    let p5 = percentile_sorted(&prices, 5.0);

    let probability_above_target = input.target_price.map(|target| {
        let target = to_f64(target);
        from_f64(prices.iter().filter(|p| **p > target).count() as f64 / n)
    });

    let analytical = s0 * (to_f64(input.expected_return) * to_f64(input.horizon_years)).exp();

    Ok(MonteCarloPriceOutput {
        simulations: input.simulations,
        expected_price: from_f64(mean),
        analytical_expected_price: from_f64(analytical),
        std_dev: from_f64(variance.sqrt()),
        percentiles: PricePercentiles {
            p5: from_f64(p5),
            p25: from_f64(percentile_sorted(&prices, 25.0)),
            p50: from_f64(percentile_sorted(&prices, 50.0)),
            p75: from_f64(percentile_sorted(&prices, 75.0)),
            p95: from_f64(percentile_sorted(&prices, 95.0)),
        },
        probability_of_loss: from_f64(losses as f64 / n),
        probability_above_target,
        value_at_risk_95: from_f64((s0 - p5).max(0.0)),
        expected_shortfall_95: from_f64((s0 - tail_mean).max(0.0)),
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "monte_carlo_price",
    category: AnalysisCategory::Quantitative,
    title_en: "Monte Carlo Price Simulation",
    title_ar: "محاكاة مونت كارلو للأسعار",
    methodology: "Geometric Brownian motion terminal-price simulation",
};

pub fn report(input: &MonteCarloPriceInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_monte_carlo_price(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.probability_of_loss)
        .metric("expected_price", "Expected price", "السعر المتوقع", out.expected_price, MetricUnit::Currency)
        .metric("median_price", "Median price", "السعر الوسيط", out.percentiles.p50, MetricUnit::Currency)
        .metric("p5_price", "5th percentile price", "سعر المئين الخامس", out.percentiles.p5, MetricUnit::Currency)
        .metric("p95_price", "95th percentile price", "سعر المئين 95", out.percentiles.p95, MetricUnit::Currency)
        .metric("probability_of_loss", "Probability of loss", "احتمال الخسارة", out.probability_of_loss, MetricUnit::Probability)
        .metric("value_at_risk_95", "95% VaR (per unit)", "القيمة المعرضة للمخاطر 95% (للوحدة)", out.value_at_risk_95, MetricUnit::Currency)
        .metric("expected_shortfall_95", "95% expected shortfall (per unit)", "العجز المتوقع 95% (للوحدة)", out.expected_shortfall_95, MetricUnit::Currency);
    if let Some(p) = out.probability_above_target {
        b.metric("probability_above_target", "Probability above target", "احتمال تجاوز السعر المستهدف", p, MetricUnit::Probability);
    }

    let lo = fmt_money(out.percentiles.p5);
    let hi = fmt_money(out.percentiles.p95);
    let loss = fmt_pct(out.probability_of_loss);
    b.interpret(
        format!("90% of simulated outcomes fall between {lo} and {hi}; the chance of ending below today's price is {loss}."),
        format!("تقع 90% من النتائج المحاكاة بين {lo} و{hi}؛ واحتمال الانتهاء دون السعر الحالي {loss}."),
    );

    let assessment = match out.probability_of_loss {
        p if p < dec!(0.25) => Assessment::Favourable,
        p if p < dec!(0.40) => Assessment::Neutral,
        p if p < dec!(0.50) => Assessment::Caution,
        _ => Assessment::Adverse,
    };
    b.assessment(assessment);
    if input.seed.is_none() {
        b.warn("No seed supplied; results will differ between runs.");
    }
    if out.expected_shortfall_95 > input.initial_price * dec!(0.3) {
        b.recommend(
            "Tail losses exceed 30% of the current price; size the position or buy downside protection accordingly.",
            "خسائر الذيل تتجاوز 30% من السعر الحالي؛ حدد حجم المركز أو اشترِ حماية من الهبوط وفقاً لذلك.",
        );
    }

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> MonteCarloPriceInput {
        MonteCarloPriceInput {
            initial_price: dec!(100),
            expected_return: dec!(0.08),
            volatility: dec!(0.20),
            horizon_years: dec!(1),
            simulations: 20_000,
            seed: Some(42),
            target_price: Some(dec!(120)),
        }
    }

    #[test]
    fn test_seeded_reproducibility() {
        let a = calculate_monte_carlo_price(&input()).unwrap();
        let b = calculate_monte_carlo_price(&input()).unwrap();
        assert_eq!(a.expected_price, b.expected_price);
        assert_eq!(a.percentiles.p5, b.percentiles.p5);
    }

    #[test]
    fn test_mean_matches_analytical() {
        let out = calculate_monte_carlo_price(&input()).unwrap();
        let rel = (out.expected_price - out.analytical_expected_price).abs() / out.analytical_expected_price;
        assert!(rel < dec!(0.01), "relative error {rel}");
        // P(S_T < S0) = Φ(-(μ - σ²/2)√T / σ) = Φ(-0.3) ≈ 0.382
        assert!((to_f64(out.probability_of_loss) - 0.382).abs() < 0.02);
    }

    #[test]
    fn test_percentiles_ordered() {
        let out = calculate_monte_carlo_price(&input()).unwrap();
        let p = &out.percentiles;
        assert!(p.p5 < p.p25 && p.p25 < p.p50 && p.p50 < p.p75 && p.p75 < p.p95);
        assert!(out.expected_shortfall_95 >= out.value_at_risk_95);
        assert!(out.probability_above_target.unwrap() > Decimal::ZERO);
    }

    #[test]
    fn test_zero_volatility_is_deterministic() {
        let mut i = input();
        i.volatility = Decimal::ZERO;
        let prices = simulate_terminal_prices(&i).unwrap();
        let expected = 100.0 * 0.08f64.exp();
        assert!(prices.iter().all(|p| (p - expected).abs() < 1e-9));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let mut i = input();
        i.simulations = 10;
        assert!(calculate_monte_carlo_price(&i).is_err());
        let mut i = input();
        i.initial_price = Decimal::ZERO;
        assert!(calculate_monte_carlo_price(&i).is_err());
    }
}
