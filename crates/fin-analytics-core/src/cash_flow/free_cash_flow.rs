//! Free cash flow to the firm and to equity.
//!
//! FCFF = CFO + interest x (1 - t) - capex
//! FCFE = CFO - capex + net borrowing

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::report::{
    fmt_money, fmt_pct, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::validate_positive;
use crate::types::{FinancialStatements, Money, Rate};
use crate::FinResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreeCashFlowOutput {
    pub fcf: Money,
    pub fcff: Money,
    pub fcfe: Money,
    pub fcf_margin: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcf_conversion: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcf_yield: Option<Rate>,
}

pub fn calculate_free_cash_flow(fs: &FinancialStatements) -> FinResult<FreeCashFlowOutput> {
    validate_positive(fs.revenue, "revenue")?;

    let fcf = fs.free_cash_flow();
    let after_tax_interest = fs.interest_expense * (Decimal::ONE - fs.effective_tax_rate());
    let fcff = fcf + after_tax_interest;
    let fcfe = fcf + fs.net_borrowing;

    Ok(FreeCashFlowOutput {
        fcf,
        fcff,
        fcfe,
        fcf_margin: fcf / fs.revenue,
        fcf_conversion: (fs.net_income > Decimal::ZERO).then(|| fcf / fs.net_income),
        fcf_yield: fs
            .market_cap()
            .filter(|m| *m > Decimal::ZERO)
            .map(|m| fcf / m),
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "free_cash_flow",
    category: AnalysisCategory::CashFlow,
    title_en: "Free Cash Flow Analysis",
    title_ar: "تحليل التدفق النقدي الحر",
    methodology: "FCFF and FCFE from the cash-flow statement",
};

pub fn report(input: &FinancialStatements, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_free_cash_flow(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.fcf_margin)
        .metric("fcf", "Free cash flow", "التدفق النقدي الحر", out.fcf, MetricUnit::Currency)
        .metric("fcff", "Free cash flow to firm", "التدفق النقدي الحر للمنشأة", out.fcff, MetricUnit::Currency)
        .metric("fcfe", "Free cash flow to equity", "التدفق النقدي الحر للملاك", out.fcfe, MetricUnit::Currency)
        .metric("fcf_margin", "FCF margin", "هامش التدفق النقدي الحر", out.fcf_margin, MetricUnit::Percent)
        .benchmark(dec!(0.05));
    if let Some(c) = out.fcf_conversion {
        b.metric("fcf_conversion", "FCF / net income", "التدفق الحر إلى صافي الدخل", c, MetricUnit::Percent);
    }
    if let Some(y) = out.fcf_yield {
        b.metric("fcf_yield", "FCF yield", "عائد التدفق النقدي الحر", y, MetricUnit::Percent);
    }

    let fcf = fmt_money(out.fcf);
    let margin = fmt_pct(out.fcf_margin);
    if out.fcf < Decimal::ZERO {
        b.assessment(Assessment::Adverse).interpret(
            format!("Free cash flow is negative at {fcf}: capital spending exceeds operating cash generation."),
            format!("التدفق النقدي الحر سالب بقيمة {fcf}، إذ يتجاوز الإنفاق الرأسمالي النقد التشغيلي."),
        );
        b.recommend(
            "Phase discretionary capex or secure funding for the investment programme.",
            "جدولة الإنفاق الرأسمالي الاختياري أو تأمين تمويل لبرنامج الاستثمار.",
        );
    } else if out.fcf_margin >= dec!(0.10) {
        b.assessment(Assessment::Favourable).interpret(
            format!("Free cash flow of {fcf} represents a strong {margin} of revenue."),
            format!("التدفق النقدي الحر البالغ {fcf} يمثل نسبة قوية قدرها {margin} من الإيرادات."),
        );
    } else {
        b.assessment(Assessment::Neutral).interpret(
            format!("Free cash flow of {fcf} represents {margin} of revenue."),
            format!("التدفق النقدي الحر البالغ {fcf} يمثل {margin} من الإيرادات."),
        );
    }
    if out.fcfe < Decimal::ZERO && out.fcf > Decimal::ZERO {
        b.interpret(
            "Debt repayments absorb all free cash flow available to shareholders.",
            "سداد الديون يستنفد كامل التدفق الحر المتاح للمساهمين.",
        );
    }

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FinancialStatements {
        FinancialStatements {
            revenue: dec!(2000),
            operating_cash_flow: dec!(400),
            capital_expenditure: dec!(150),
            interest_expense: dec!(40),
            pretax_income: dec!(200),
            income_tax: dec!(50),
            net_income: dec!(150),
            net_borrowing: dec!(-100),
            shares_outstanding: dec!(100),
            share_price: Some(dec!(25)),
            ..Default::default()
        }
    }

    #[test]
    fn test_fcff_and_fcfe() {
        let out = calculate_free_cash_flow(&sample()).unwrap();
        assert_eq!(out.fcf, dec!(250));
        assert_eq!(out.fcff, dec!(280));
        assert_eq!(out.fcfe, dec!(150));
        assert_eq!(out.fcf_margin, dec!(0.125));
        assert_eq!(out.fcf_yield, Some(dec!(0.1)));
    }

    #[test]
    fn test_negative_fcf_adverse() {
        let mut fs = sample();
        fs.capital_expenditure = dec!(600);
        let r = report(&fs, &ReportOptions::default()).unwrap();
        assert_eq!(r.assessment, Assessment::Adverse);
    }

    #[test]
    fn test_no_market_price_omits_yield() {
        let mut fs = sample();
        fs.share_price = None;
        let out = calculate_free_cash_flow(&fs).unwrap();
        assert!(out.fcf_yield.is_none());
    }
}
