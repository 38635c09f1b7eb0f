//! Market valuation multiples. Requires a share price.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinError;
use crate::report::{
    fmt_pct, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{div_or_zero, validate_positive};
use crate::types::{FinancialStatements, Money, Multiple, Rate};
use crate::FinResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationOutput {
    pub market_cap: Money,
    pub enterprise_value: Money,
    pub eps: Money,
    pub pe_ratio: Option<Multiple>,
    pub pb_ratio: Option<Multiple>,
    pub ps_ratio: Option<Multiple>,
    pub ev_to_ebitda: Option<Multiple>,
    pub earnings_yield: Rate,
    pub dividend_yield: Rate,
    pub warnings: Vec<String>,
}

fn positive_multiple(num: Decimal, den: Decimal, name: &str, warnings: &mut Vec<String>) -> Option<Multiple> {
    if den > Decimal::ZERO {
        Some(num / den)
    } else {
        warnings.push(format!("{name} not meaningful: denominator is not positive."));
        None
    }
}

pub fn calculate_valuation_ratios(fs: &FinancialStatements) -> FinResult<ValuationOutput> {
    let price = fs
        .share_price
        .ok_or_else(|| FinError::invalid("share_price", "A share price is required for valuation multiples"))?;
    validate_positive(price, "share_price")?;
    validate_positive(fs.shares_outstanding, "shares_outstanding")?;

    let mut warnings = Vec::new();
    let market_cap = price * fs.shares_outstanding;
    let enterprise_value = market_cap + fs.net_debt();
    let eps = fs.net_income / fs.shares_outstanding;

    let pe_ratio = positive_multiple(price, eps, "P/E", &mut warnings);
    let pb_ratio = positive_multiple(market_cap, fs.shareholders_equity, "P/B", &mut warnings);
    let ps_ratio = positive_multiple(market_cap, fs.revenue, "P/S", &mut warnings);
    let ev_to_ebitda = positive_multiple(enterprise_value, fs.ebitda(), "EV/EBITDA", &mut warnings);

    Ok(ValuationOutput {
        market_cap,
        enterprise_value,
        eps,
        pe_ratio,
        pb_ratio,
        ps_ratio,
        ev_to_ebitda,
        earnings_yield: eps / price,
        dividend_yield: div_or_zero(fs.dividends_paid, market_cap),
        warnings,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "valuation_ratios",
    category: AnalysisCategory::Ratios,
    title_en: "Valuation Multiples",
    title_ar: "مضاعفات التقييم",
    methodology: "Trailing price and enterprise-value multiples",
};

pub fn report(input: &FinancialStatements, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_valuation_ratios(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.metric("market_cap", "Market capitalisation", "القيمة السوقية", out.market_cap, MetricUnit::Currency)
        .metric(
            "enterprise_value",
            "Enterprise value",
            "قيمة المنشأة",
            out.enterprise_value,
            MetricUnit::Currency,
        )
        .metric("eps", "Earnings per share", "ربحية السهم", out.eps, MetricUnit::Currency);
    if let Some(pe) = out.pe_ratio {
        b.score(pe)
            .metric("pe_ratio", "Price / earnings", "مكرر الربحية", pe, MetricUnit::Ratio)
            .benchmark(dec!(15));
    }
    if let Some(pb) = out.pb_ratio {
        b.metric("pb_ratio", "Price / book", "السعر إلى القيمة الدفترية", pb, MetricUnit::Ratio);
    }
    if let Some(ps) = out.ps_ratio {
        b.metric("ps_ratio", "Price / sales", "السعر إلى المبيعات", ps, MetricUnit::Ratio);
    }
    if let Some(ev) = out.ev_to_ebitda {
        b.metric("ev_to_ebitda", "EV / EBITDA", "قيمة المنشأة إلى EBITDA", ev, MetricUnit::Ratio)
            .benchmark(dec!(10));
    }
    b.metric("earnings_yield", "Earnings yield", "عائد الأرباح", out.earnings_yield, MetricUnit::Percent)
        .metric("dividend_yield", "Dividend yield", "عائد التوزيعات", out.dividend_yield, MetricUnit::Percent);

    match out.pe_ratio {
        None => {
            b.assessment(Assessment::Caution).interpret(
                "Earnings are negative, so the P/E ratio is not meaningful; valuation rests on sales and book value.",
                "الأرباح سالبة لذا فإن مكرر الربحية غير ذي دلالة، ويعتمد التقييم على المبيعات والقيمة الدفترية.",
            );
        }
        Some(pe) => {
            let pe_s = fmt_ratio(pe);
            let (assessment, en, ar) = if pe < dec!(10) {
                (
                    Assessment::Favourable,
                    format!("At {pe_s}x earnings the shares trade at a low multiple."),
                    format!("يتداول السهم عند {pe_s} مرة من الأرباح، وهو مكرر منخفض."),
                )
            } else if pe <= dec!(25) {
                (
                    Assessment::Neutral,
                    format!("At {pe_s}x earnings the valuation is within the usual market range."),
                    format!("يتداول السهم عند {pe_s} مرة من الأرباح ضمن النطاق المعتاد للسوق."),
                )
            } else {
                (
                    Assessment::Caution,
                    format!("At {pe_s}x earnings the market is pricing in substantial growth."),
                    format!("يتداول السهم عند {pe_s} مرة من الأرباح، ما يعكس توقعات نمو كبيرة."),
                )
            };
            b.assessment(assessment).interpret(en, ar);
            if assessment == Assessment::Caution {
                b.recommend(
                    "Check that consensus growth forecasts justify the premium multiple.",
                    "التحقق من أن توقعات النمو تبرر المضاعف المرتفع.",
                );
            }
        }
    }
    if out.dividend_yield > Decimal::ZERO {
        let dy = fmt_pct(out.dividend_yield);
        b.interpret(
            format!("The dividend yield is {dy}."),
            format!("عائد التوزيعات {dy}."),
        );
    }
    b.warnings(out.warnings);

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FinancialStatements {
        FinancialStatements {
            share_price: Some(dec!(20)),
            shares_outstanding: dec!(100),
            net_income: dec!(160),
            revenue: dec!(1000),
            shareholders_equity: dec!(800),
            ebit: dec!(250),
            depreciation: dec!(50),
            long_term_debt: dec!(500),
            cash: dec!(100),
            dividends_paid: dec!(40),
            ..Default::default()
        }
    }

    #[test]
    fn test_multiples() {
        let out = calculate_valuation_ratios(&sample()).unwrap();
        assert_eq!(out.market_cap, dec!(2000));
        assert_eq!(out.enterprise_value, dec!(2400));
        assert_eq!(out.eps, dec!(1.6));
        assert_eq!(out.pe_ratio, Some(dec!(12.5)));
        assert_eq!(out.pb_ratio, Some(dec!(2.5)));
        assert_eq!(out.ps_ratio, Some(dec!(2)));
        assert_eq!(out.ev_to_ebitda, Some(dec!(8)));
        assert_eq!(out.dividend_yield, dec!(0.02));
        assert_eq!(out.earnings_yield, dec!(0.08));
    }

    #[test]
    fn test_missing_price_rejected() {
        let mut fs = sample();
        fs.share_price = None;
        match calculate_valuation_ratios(&fs).unwrap_err() {
            FinError::InvalidInput { field, .. } => assert_eq!(field, "share_price"),
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_loss_makes_pe_meaningless() {
        let mut fs = sample();
        fs.net_income = dec!(-50);
        let r = report(&fs, &ReportOptions::default()).unwrap();
        assert!(r.metric("pe_ratio").is_none());
        assert_eq!(r.assessment, Assessment::Caution);
        assert_eq!(r.warnings.len(), 1);
    }
}
