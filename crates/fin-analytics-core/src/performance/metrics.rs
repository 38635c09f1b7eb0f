//! Shared return-series statistics behind every performance analysis.
//!
//! Returns are annualised arithmetically (mean x periods per year) and
//! volatilities by √(periods per year). The risk-free rate and target
//! return are annual figures; they are de-annualised where a per-period
//! threshold is needed (Sortino downside deviation, Omega).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FinError;
use crate::report::ReportOptions;
use crate::stats::{
    correlation, covariance, cumulative_return, div_or_zero, downside_deviation,
    max_drawdown_with_duration, mean, safe_div, sample_variance, sqrt_decimal, std_dev,
};
use crate::types::{Rate, ReturnSeries};
use crate::FinResult;

pub const MIN_OBSERVATIONS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceInput {
    #[serde(flatten)]
    pub series: ReturnSeries,
    /// Benchmark returns aligned period-by-period with `returns`
    #[serde(default)]
    pub benchmark_returns: Option<Vec<Rate>>,
    /// Annual risk-free rate; falls back to the report options
    #[serde(default)]
    pub risk_free_rate: Option<Rate>,
    /// Annual minimum acceptable return for Sortino and Omega; defaults to
    /// the risk-free rate
    #[serde(default)]
    pub target_return: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    pub benchmark_return: Rate,
    pub beta: Decimal,
    pub correlation: Decimal,
    pub r_squared: Decimal,
    pub tracking_error: Rate,
    pub information_ratio: Option<Decimal>,
    pub jensens_alpha: Rate,
    pub treynor_ratio: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub observations: usize,
    pub annualised_return: Rate,
    pub annualised_volatility: Rate,
    pub cumulative_return: Rate,
    pub risk_free_rate: Rate,
    pub target_return: Rate,
    pub sharpe_ratio: Option<Decimal>,
    pub downside_deviation: Rate,
    pub sortino_ratio: Option<Decimal>,
    pub max_drawdown: Rate,
    pub drawdown_duration: u32,
    pub calmar_ratio: Option<Decimal>,
    pub omega_ratio: Option<Decimal>,
    pub benchmark: Option<BenchmarkMetrics>,
}

impl PerformanceInput {
    pub(crate) fn require_benchmark(&self) -> FinResult<&[Rate]> {
        self.benchmark_returns
            .as_deref()
            .ok_or_else(|| FinError::invalid("benchmark_returns", "A benchmark return series is required"))
    }
}

fn benchmark_metrics(
    returns: &[Rate],
    bench: &[Rate],
    periods: Decimal,
    annualised_return: Rate,
    rf: Rate,
) -> FinResult<BenchmarkMetrics> {
    if bench.len() != returns.len() {
        return Err(FinError::invalid(
            "benchmark_returns",
            format!(
                "Benchmark has {} observations but returns have {}",
                bench.len(),
                returns.len()
            ),
        ));
    }
    let beta = safe_div(covariance(returns, bench), sample_variance(bench), "beta (benchmark variance)")?;
    let corr = correlation(returns, bench);
    let benchmark_return = mean(bench) * periods;

    let active: Vec<Decimal> = returns.iter().zip(bench).map(|(r, b)| r - b).collect();
    let tracking_error = std_dev(&active) * sqrt_decimal(periods);
    let information_ratio =
        (!tracking_error.is_zero()).then(|| (annualised_return - benchmark_return) / tracking_error);

    let jensens_alpha = annualised_return - (rf + beta * (benchmark_return - rf));
    let treynor_ratio = (!beta.is_zero()).then(|| (annualised_return - rf) / beta);

    Ok(BenchmarkMetrics {
        benchmark_return,
        beta,
        correlation: corr,
        r_squared: corr * corr,
        tracking_error,
        information_ratio,
        jensens_alpha,
        treynor_ratio,
    })
}

pub fn calculate_performance(
    input: &PerformanceInput,
    options: &ReportOptions,
) -> FinResult<PerformanceMetrics> {
    input.series.require(MIN_OBSERVATIONS)?;
    let returns = &input.series.returns;
    let periods = input.series.frequency.periods_per_year();
    let rf = input.risk_free_rate.unwrap_or(options.risk_free_rate);
    let target = input.target_return.unwrap_or(rf);

    let annualised_return = input.series.annualised_return();
    let annualised_volatility = input.series.annualised_volatility();
    let sharpe_ratio =
        (!annualised_volatility.is_zero()).then(|| (annualised_return - rf) / annualised_volatility);

    let period_target = target / periods;
    let downside = downside_deviation(returns, period_target) * sqrt_decimal(periods);
    let sortino_ratio = (!downside.is_zero()).then(|| (annualised_return - target) / downside);

    let (max_drawdown, drawdown_duration) = max_drawdown_with_duration(returns)?;
    let calmar_ratio = (!max_drawdown.is_zero()).then(|| annualised_return / max_drawdown);

    let gains: Decimal = returns.iter().map(|r| (r - period_target).max(Decimal::ZERO)).sum();
    let losses: Decimal = returns.iter().map(|r| (period_target - r).max(Decimal::ZERO)).sum();
    let omega_ratio = (!losses.is_zero()).then(|| div_or_zero(gains, losses));

    let benchmark = match &input.benchmark_returns {
        Some(bench) => Some(benchmark_metrics(returns, bench, periods, annualised_return, rf)?),
        None => None,
    };

    Ok(PerformanceMetrics {
        observations: returns.len(),
        annualised_return,
        annualised_volatility,
        cumulative_return: cumulative_return(returns)?,
        risk_free_rate: rf,
        target_return: target,
        sharpe_ratio,
        downside_deviation: downside,
        sortino_ratio,
        max_drawdown,
        drawdown_duration,
        calmar_ratio,
        omega_ratio,
        benchmark,
    })
}

/// Metrics for analyses that only make sense relative to a benchmark.
pub(crate) fn calculate_with_benchmark(
    input: &PerformanceInput,
    options: &ReportOptions,
) -> FinResult<(PerformanceMetrics, BenchmarkMetrics)> {
    input.require_benchmark()?;
    let mut metrics = calculate_performance(input, options)?;
    let bench = metrics
        .benchmark
        .take()
        .ok_or_else(|| FinError::invalid("benchmark_returns", "A benchmark return series is required"))?;
    Ok((metrics, bench))
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_core_metrics() {
        let m = calculate_performance(&input(monthly_returns(), None), &ReportOptions::default())
            .unwrap();
        // mean monthly 0.00875 -> 10.5% annualised
        assert_eq!(m.annualised_return, dec!(0.105));
        assert!(m.sharpe_ratio.unwrap() > Decimal::ZERO);
        assert!(m.sortino_ratio.unwrap() > m.sharpe_ratio.unwrap());
        assert!(m.max_drawdown > Decimal::ZERO);
        assert!(m.omega_ratio.unwrap() > Decimal::ONE);
        assert!(m.benchmark.is_none());
    }

    #[test]
    fn test_benchmark_metrics() {
        let m = calculate_performance(
            &input(monthly_returns(), Some(benchmark_returns())),
            &ReportOptions::default(),
        )
        .unwrap();
        let b = m.benchmark.unwrap();
        assert!(b.beta > Decimal::ONE);
        assert!(b.correlation > dec!(0.9));
        assert!(b.jensens_alpha > Decimal::ZERO);
        assert!(b.information_ratio.unwrap() > Decimal::ZERO);
    }

    #[test]
    fn test_runaway_compounding_is_rejected() {
        let returns = (0..800)
            .map(|i| if i % 2 == 0 { dec!(0.12) } else { dec!(0.08) })
            .collect();
        let err = calculate_performance(&input(returns, None), &ReportOptions::default());
        assert!(matches!(err.unwrap_err(), FinError::FinancialImpossibility(_)));
    }

    #[test]
    fn test_insufficient_data() {
        let err = calculate_performance(&input(vec![dec!(0.01)], None), &ReportOptions::default());
        assert!(matches!(err.unwrap_err(), FinError::InsufficientData(_)));
    }

    #[test]
    fn test_benchmark_length_mismatch() {
        let err = calculate_performance(
            &input(monthly_returns(), Some(vec![dec!(0.01); 5])),
            &ReportOptions::default(),
        );
        match err.unwrap_err() {
            FinError::InvalidInput { field, .. } => assert_eq!(field, "benchmark_returns"),
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_risk_free_falls_back_to_options() {
        let mut i = input(monthly_returns(), None);
        i.risk_free_rate = None;
        let opts = ReportOptions {
            risk_free_rate: dec!(0.04),
            ..Default::default()
        };
        let m = calculate_performance(&i, &opts).unwrap();
        assert_eq!(m.risk_free_rate, dec!(0.04));
        assert_eq!(m.target_return, dec!(0.04));
    }

    #[test]
    fn test_flattened_json() {
        let i: PerformanceInput =
            serde_json::from_str(r#"{"returns": [0.01, 0.02, -0.01], "frequency": "daily"}"#)
                .unwrap();
        assert_eq!(i.series.len(), 3);
        assert!(i.benchmark_returns.is_none());
    }
}
