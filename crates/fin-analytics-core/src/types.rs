use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::stats::{mean, require_observations, sqrt_decimal, std_dev};
use crate::FinResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Multiples (e.g., 8.5x EV/EBITDA)
pub type Multiple = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

/// One fiscal period of company financials.
///
/// Every field defaults to zero so callers only supply what an analysis
/// needs. Expenses and outflows (`cogs`, `capital_expenditure`,
/// `dividends_paid`, `debt_repayment`) are positive numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialStatements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_end: Option<NaiveDate>,

    // Income statement
    pub revenue: Money,
    pub cogs: Money,
    pub sga: Money,
    pub depreciation: Money,
    pub ebit: Money,
    pub interest_expense: Money,
    pub pretax_income: Money,
    pub income_tax: Money,
    pub net_income: Money,

    // Balance sheet
    pub cash: Money,
    pub receivables: Money,
    pub inventory: Money,
    pub current_assets: Money,
    pub ppe: Money,
    pub total_assets: Money,
    pub accounts_payable: Money,
    pub current_liabilities: Money,
    pub short_term_debt: Money,
    pub long_term_debt: Money,
    pub total_liabilities: Money,
    pub retained_earnings: Money,
    pub shareholders_equity: Money,
    pub shares_outstanding: Decimal,

    // Cash flow statement
    pub operating_cash_flow: Money,
    pub capital_expenditure: Money,
    pub dividends_paid: Money,
    pub debt_repayment: Money,
    pub net_borrowing: Money,

    // Market
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_price: Option<Money>,
}

impl FinancialStatements {
    pub fn gross_profit(&self) -> Money {
        self.revenue - self.cogs
    }

    pub fn ebitda(&self) -> Money {
        self.ebit + self.depreciation
    }

    pub fn total_debt(&self) -> Money {
        self.short_term_debt + self.long_term_debt
    }

    pub fn working_capital(&self) -> Money {
        self.current_assets - self.current_liabilities
    }

    pub fn net_debt(&self) -> Money {
        self.total_debt() - self.cash
    }

    /// Operating cash flow less capital expenditure.
    pub fn free_cash_flow(&self) -> Money {
        self.operating_cash_flow - self.capital_expenditure
    }

    /// Effective tax rate, falling back to zero when pretax income is not positive.
    pub fn effective_tax_rate(&self) -> Rate {
        if self.pretax_income > Decimal::ZERO {
            self.income_tax / self.pretax_income
        } else {
            Decimal::ZERO
        }
    }

    pub fn market_cap(&self) -> Option<Money> {
        self.share_price.map(|p| p * self.shares_outstanding)
    }
}

/// Current and prior period, for analyses that look at year-on-year change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub current: FinancialStatements,
    pub prior: FinancialStatements,
}

/// Frequency of return observations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnFrequency {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Annual,
}

impl ReturnFrequency {
    /// Number of periods in a year for annualisation
    pub fn periods_per_year(&self) -> Decimal {
        match self {
            ReturnFrequency::Daily => dec!(252),
            ReturnFrequency::Weekly => dec!(52),
            ReturnFrequency::Monthly => dec!(12),
            ReturnFrequency::Quarterly => dec!(4),
            ReturnFrequency::Annual => dec!(1),
        }
    }
}

/// Periodic returns at a fixed frequency, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnSeries {
    pub returns: Vec<Rate>,
    #[serde(default)]
    pub frequency: ReturnFrequency,
}

impl ReturnSeries {
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    pub fn require(&self, min: usize) -> FinResult<()> {
        require_observations(&self.returns, min, "return")
    }

    /// Arithmetic annualisation: mean periodic return x periods per year.
    pub fn annualised_return(&self) -> Rate {
        mean(&self.returns) * self.frequency.periods_per_year()
    }

    pub fn annualised_volatility(&self) -> Rate {
        std_dev(&self.returns) * sqrt_decimal(self.frequency.periods_per_year())
    }
}

/// A single portfolio position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    /// Market value of the position
    pub value: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_fields() {
        let fs = FinancialStatements {
            revenue: dec!(1000),
            cogs: dec!(600),
            ebit: dec!(150),
            depreciation: dec!(50),
            short_term_debt: dec!(100),
            long_term_debt: dec!(300),
            cash: dec!(80),
            operating_cash_flow: dec!(200),
            capital_expenditure: dec!(70),
            ..Default::default()
        };
        assert_eq!(fs.gross_profit(), dec!(400));
        assert_eq!(fs.ebitda(), dec!(200));
        assert_eq!(fs.net_debt(), dec!(320));
        assert_eq!(fs.free_cash_flow(), dec!(130));
    }

    #[test]
    fn test_partial_json_defaults_to_zero() {
        let fs: FinancialStatements =
            serde_json::from_str(r#"{"revenue": "500", "net_income": "40"}"#).unwrap();
        assert_eq!(fs.revenue, dec!(500));
        assert_eq!(fs.total_assets, Decimal::ZERO);
        assert!(fs.share_price.is_none());
    }

    #[test]
    fn test_effective_tax_rate_loss_year() {
        let fs = FinancialStatements {
            pretax_income: dec!(-10),
            income_tax: dec!(2),
            ..Default::default()
        };
        assert_eq!(fs.effective_tax_rate(), Decimal::ZERO);
    }

    #[test]
    fn test_return_series_annualisation() {
        let series = ReturnSeries {
            returns: vec![dec!(0.01), dec!(0.03)],
            frequency: ReturnFrequency::Quarterly,
        };
        assert_eq!(series.annualised_return(), dec!(0.08));
        assert!(series.require(3).is_err());
        let parsed: ReturnSeries = serde_json::from_str(r#"{"returns": [0.01, -0.02]}"#).unwrap();
        assert_eq!(parsed.frequency, ReturnFrequency::Monthly);
    }

    #[test]
    fn test_frequency_snake_case() {
        let f: ReturnFrequency = serde_json::from_str("\"daily\"").unwrap();
        assert_eq!(f.periods_per_year(), dec!(252));
    }
}
