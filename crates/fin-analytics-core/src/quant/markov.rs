//! Three-state Markov regime model over discretised returns.
//!
//! Returns are classified as bear, sideways or bull by two thresholds
//! (by default the mean ± half a standard deviation). The transition matrix
//! is estimated from consecutive classifications; the stationary
//! distribution solves πP = π with Σπ = 1.

use nalgebra::{DMatrix, DVector};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinError;
use crate::report::{
    fmt_pct, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{from_f64, mean, std_dev, to_f64};
use crate::types::{Rate, ReturnSeries};
use crate::FinResult;

const MIN_OBSERVATIONS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Bear,
    Sideways,
    Bull,
}

impl Regime {
    pub const ALL: [Regime; 3] = [Regime::Bear, Regime::Sideways, Regime::Bull];

    fn index(self) -> usize {
        match self {
            Regime::Bear => 0,
            Regime::Sideways => 1,
            Regime::Bull => 2,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Regime::Bear => "bear",
            Regime::Sideways => "sideways",
            Regime::Bull => "bull",
        }
    }

    fn names(self) -> (&'static str, &'static str) {
        match self {
            Regime::Bear => ("bear", "هابط"),
            Regime::Sideways => ("sideways", "عرضي"),
            Regime::Bull => ("bull", "صاعد"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkovRegimeInput {
    #[serde(flatten)]
    pub series: ReturnSeries,
    /// Returns below this are bear periods
    #[serde(default)]
    pub bear_threshold: Option<Rate>,
    /// Returns above this are bull periods
    #[serde(default)]
    pub bull_threshold: Option<Rate>,
    #[serde(default = "default_steps")]
    pub forecast_steps: u32,
}

fn default_steps() -> u32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeStats {
    pub regime: Regime,
    pub observations: usize,
    pub mean_return: Rate,
    pub volatility: Rate,
    pub stationary_probability: Decimal,
    /// Expected periods spent in the regime once entered
    pub expected_duration: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepForecast {
    pub step: u32,
    /// Probabilities of bear, sideways, bull
    pub probabilities: [Decimal; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkovRegimeOutput {
    pub bear_threshold: Rate,
    pub bull_threshold: Rate,
    /// Row i gives the probabilities of moving from regime i
    pub transition_matrix: [[Decimal; 3]; 3],
    pub regimes: Vec<RegimeStats>,
    pub current_regime: Regime,
    pub forecast: Vec<StepForecast>,
    pub warnings: Vec<String>,
}

pub fn classify(r: Rate, bear: Rate, bull: Rate) -> Regime {
    if r < bear {
        Regime::Bear
    } else if r > bull {
        Regime::Bull
    } else {
        Regime::Sideways
    }
}

fn stationary_distribution(p: &DMatrix<f64>) -> FinResult<DVector<f64>> {
    // (Pᵀ - I)π = 0 with the last equation replaced by Σπ = 1
    let mut a = p.transpose() - DMatrix::identity(3, 3);
    for j in 0..3 {
        a[(2, j)] = 1.0;
    }
    let b = DVector::from_column_slice(&[0.0, 0.0, 1.0]);
    a.lu().solve(&b).ok_or_else(|| {
        FinError::FinancialImpossibility(
            "Transition matrix has no unique stationary distribution".into(),
        )
    })
}

pub fn calculate_markov_regime(input: &MarkovRegimeInput) -> FinResult<MarkovRegimeOutput> {
    input.series.require(MIN_OBSERVATIONS)?;
    let returns = &input.series.returns;
    let mut warnings = Vec::new();

    let m = mean(returns);
    let half_sd = std_dev(returns) / dec!(2);
    let bear = input.bear_threshold.unwrap_or(m - half_sd);
    let bull = input.bull_threshold.unwrap_or(m + half_sd);
    if bear > bull {
        return Err(FinError::invalid(
            "bear_threshold",
            "Must not exceed bull_threshold",
        ));
    }

    let states: Vec<Regime> = returns.iter().map(|r| classify(*r, bear, bull)).collect();
    let mut counts = [[0u32; 3]; 3];
    for w in states.windows(2) {
        counts[w[0].index()][w[1].index()] += 1;
    }

    let mut transition = [[Decimal::ZERO; 3]; 3];
    for (i, row) in counts.iter().enumerate() {
        let total: u32 = row.iter().sum();
        if total == 0 {
            warnings.push(format!(
                "No transitions observed out of the {} regime; assumed equally likely.",
                Regime::ALL[i].key()
            ));
            transition[i] = [Decimal::ONE / dec!(3); 3];
            continue;
        }
        for j in 0..3 {
            transition[i][j] = Decimal::from(row[j]) / Decimal::from(total);
        }
    }

    let p = DMatrix::from_fn(3, 3, |i, j| to_f64(transition[i][j]));
    let pi = stationary_distribution(&p)?;

    let regimes = Regime::ALL
        .iter()
        .map(|&regime| {
            let members: Vec<Decimal> = returns
                .iter()
                .zip(&states)
                .filter(|(_, s)| **s == regime)
                .map(|(r, _)| *r)
                .collect();
            let stay = transition[regime.index()][regime.index()];
            RegimeStats {
                regime,
                observations: members.len(),
                mean_return: mean(&members),
                volatility: std_dev(&members),
                stationary_probability: from_f64(pi[regime.index()]),
                expected_duration: if stay < Decimal::ONE {
                    Some(Decimal::ONE / (Decimal::ONE - stay))
                } else {
                    None
                },
            }
        })
        .collect::<Vec<_>>();
    for r in regimes.iter().filter(|r| r.observations < 3) {
        warnings.push(format!(
            "Only {} {} observations; its statistics are unreliable.",
            r.observations,
            r.regime.key()
        ));
    }

    let current_regime = states[states.len() - 1];
    let mut state = DVector::<f64>::zeros(3);
    state[current_regime.index()] = 1.0;
    let pt = p.transpose();
    let forecast = (1..=input.forecast_steps)
        .map(|step| {
            state = &pt * &state;
            StepForecast {
                step,
                probabilities: [from_f64(state[0]), from_f64(state[1]), from_f64(state[2])],
            }
        })
        .collect();

    Ok(MarkovRegimeOutput {
        bear_threshold: bear,
        bull_threshold: bull,
        transition_matrix: transition,
        regimes,
        current_regime,
        forecast,
        warnings,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "markov_regime",
    category: AnalysisCategory::Quantitative,
    title_en: "Markov Regime Analysis",
    title_ar: "تحليل أنظمة السوق بسلسلة ماركوف",
    methodology: "Discrete three-state Markov chain with maximum-likelihood transition estimates",
};

pub fn report(input: &MarkovRegimeInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_markov_regime(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    for r in &out.regimes {
        let key = r.regime.key();
        let (en, ar) = r.regime.names();
        b.metric(
            &format!("stationary_{key}"),
            &format!("Long-run probability: {en}"),
            &format!("الاحتمال طويل الأجل: {ar}"),
            r.stationary_probability,
            MetricUnit::Probability,
        );
        if let Some(d) = r.expected_duration {
            b.metric(
                &format!("duration_{key}"),
                &format!("Expected duration: {en}"),
                &format!("المدة المتوقعة: {ar}"),
                d,
                MetricUnit::Count,
            );
        }
    }
    let bear_next = out.forecast.first().map(|f| f.probabilities[0]);
    if let Some(p) = bear_next {
        b.score(p).metric(
            "bear_probability_next",
            "Probability of a bear period next",
            "احتمال فترة هابطة تالية",
            p,
            MetricUnit::Probability,
        );
    }

    let (current_en, current_ar) = out.current_regime.names();
    let long_run_bear = out.regimes[0].stationary_probability;
    let share = fmt_pct(long_run_bear);
    b.interpret(
        format!("The market is currently in a {current_en} regime; in the long run {share} of periods are bearish."),
        format!("السوق حالياً في نظام {current_ar}؛ وعلى المدى الطويل تكون {share} من الفترات هابطة."),
    );

    let assessment = match (out.current_regime, bear_next.unwrap_or(long_run_bear)) {
        (Regime::Bull, p) if p < dec!(0.25) => Assessment::Favourable,
        (_, p) if p < dec!(0.35) => Assessment::Neutral,
        (_, p) if p < dec!(0.5) => Assessment::Caution,
        _ => Assessment::Adverse,
    };
    b.assessment(assessment);
    if out.current_regime == Regime::Bear {
        if let Some(d) = out.regimes[0].expected_duration {
            b.recommend(
                format!("Bear regimes last about {} periods on average; plan hedges over that horizon.", d.round_dp(1)),
                format!("تستمر الأنظمة الهابطة نحو {} فترات في المتوسط؛ خطط للتحوط على هذا الأفق.", d.round_dp(1)),
            );
        }
    }
    b.warnings(out.warnings);

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReturnFrequency;

    /// Alternating blocks: 4 bull, 3 sideways, 3 bear, repeated twice.
    fn blocks() -> Vec<Decimal> {
        let block = [
            dec!(0.03), dec!(0.02), dec!(0.025), dec!(0.02),
            dec!(0.0), dec!(0.001), dec!(-0.001),
            dec!(-0.02), dec!(-0.03), dec!(-0.025),
        ];
        block.iter().chain(block.iter()).copied().collect()
    }

    fn input(returns: Vec<Decimal>) -> MarkovRegimeInput {
        MarkovRegimeInput {
            series: ReturnSeries {
                returns,
                frequency: ReturnFrequency::Monthly,
            },
            bear_threshold: Some(dec!(-0.01)),
            bull_threshold: Some(dec!(0.01)),
            forecast_steps: 3,
        }
    }

    #[test]
    fn test_transition_counts() {
        let out = calculate_markov_regime(&input(blocks())).unwrap();
        // bull: 6 stays, 2 exits to sideways
        assert_eq!(out.transition_matrix[2], [Decimal::ZERO, dec!(0.25), dec!(0.75)]);
        // bear: 4 stays, 1 exit to bull (the final bear period has no successor)
        assert_eq!(out.transition_matrix[0], [dec!(0.8), Decimal::ZERO, dec!(0.2)]);
        assert_eq!(out.current_regime, Regime::Bear);
        for row in out.transition_matrix {
            assert_eq!(row.iter().copied().sum::<Decimal>(), Decimal::ONE);
        }
    }

    #[test]
    fn test_stationary_and_durations() {
        let out = calculate_markov_regime(&input(blocks())).unwrap();
        let total: Decimal = out.regimes.iter().map(|r| r.stationary_probability).sum();
        assert!((total - Decimal::ONE).abs() < dec!(0.000001));
        assert_eq!(out.regimes[2].expected_duration, Some(dec!(4)));
        assert_eq!(out.regimes[0].expected_duration, Some(dec!(5)));
    }

    #[test]
    fn test_forecast_from_current_state() {
        let out = calculate_markov_regime(&input(blocks())).unwrap();
        assert_eq!(out.forecast.len(), 3);
        assert_eq!(out.forecast[0].probabilities[0], dec!(0.8));
        assert_eq!(out.forecast[0].probabilities[2], dec!(0.2));
    }

    #[test]
    fn test_unvisited_regime_warns() {
        let mut returns = blocks();
        for r in returns.iter_mut() {
            if *r < dec!(-0.01) {
                *r = Decimal::ZERO;
            }
        }
        let out = calculate_markov_regime(&input(returns)).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("bear")));
        assert_eq!(out.regimes[0].observations, 0);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut i = input(blocks());
        i.bear_threshold = Some(dec!(0.02));
        assert!(calculate_markov_regime(&i).is_err());
    }
}
