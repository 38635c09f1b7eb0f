//! Cash flow adequacy over one or more periods.
//!
//! Adequacy = Σ CFO / Σ (capex + debt repayment + dividends). Summing over
//! several years smooths out lumpy investment programmes.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinError;
use crate::report::{
    fmt_pct, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::div_or_zero;
use crate::types::{FinancialStatements, Money, Multiple, Rate};
use crate::FinResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowAdequacyInput {
    pub periods: Vec<FinancialStatements>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowAdequacyOutput {
    pub total_operating_cash_flow: Money,
    pub total_requirements: Money,
    pub adequacy_ratio: Multiple,
    pub reinvestment_ratio: Rate,
    pub dividend_payout_ratio: Rate,
    pub debt_repayment_ratio: Rate,
}

pub fn calculate_cash_flow_adequacy(
    input: &CashFlowAdequacyInput,
) -> FinResult<CashFlowAdequacyOutput> {
    if input.periods.is_empty() {
        return Err(FinError::InsufficientData(
            "At least one period is required".into(),
        ));
    }

    let sum = |f: fn(&FinancialStatements) -> Money| input.periods.iter().map(f).sum::<Decimal>();
    let cfo = sum(|p| p.operating_cash_flow);
    let capex = sum(|p| p.capital_expenditure);
    let repayments = sum(|p| p.debt_repayment);
    let dividends = sum(|p| p.dividends_paid);
    let requirements = capex + repayments + dividends;

    if requirements <= Decimal::ZERO {
        return Err(FinError::DivisionByZero {
            context: "cash flow adequacy: no capex, debt repayment or dividends".into(),
        });
    }

    Ok(CashFlowAdequacyOutput {
        total_operating_cash_flow: cfo,
        total_requirements: requirements,
        adequacy_ratio: cfo / requirements,
        reinvestment_ratio: div_or_zero(capex, cfo),
        dividend_payout_ratio: div_or_zero(dividends, cfo),
        debt_repayment_ratio: div_or_zero(repayments, cfo),
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "cash_flow_adequacy",
    category: AnalysisCategory::CashFlow,
    title_en: "Cash Flow Adequacy",
    title_ar: "كفاية التدفقات النقدية",
    methodology: "Operating cash flow over capex, debt repayment and dividends",
};

pub fn report(input: &CashFlowAdequacyInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_cash_flow_adequacy(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.adequacy_ratio)
        .metric("adequacy_ratio", "Adequacy ratio", "نسبة الكفاية", out.adequacy_ratio, MetricUnit::Ratio)
        .benchmark(Decimal::ONE)
        .metric("reinvestment_ratio", "Capex / CFO", "نسبة إعادة الاستثمار", out.reinvestment_ratio, MetricUnit::Percent)
        .metric(
            "dividend_payout_ratio",
            "Dividends / CFO",
            "نسبة التوزيعات من التدفق التشغيلي",
            out.dividend_payout_ratio,
            MetricUnit::Percent,
        )
        .metric(
            "debt_repayment_ratio",
            "Debt repayment / CFO",
            "نسبة سداد الديون من التدفق التشغيلي",
            out.debt_repayment_ratio,
            MetricUnit::Percent,
        );
    if input.periods.len() > 1 {
        b.metric(
            "periods",
            "Periods aggregated",
            "عدد الفترات المجمعة",
            Decimal::from(input.periods.len() as u64),
            MetricUnit::Count,
        );
    }

    let ratio = fmt_ratio(out.adequacy_ratio);
    if out.adequacy_ratio >= Decimal::ONE {
        b.assessment(Assessment::Favourable).interpret(
            format!("Operating cash flow covers investment, debt service and dividends {ratio} times."),
            format!("يغطي التدفق النقدي التشغيلي الاستثمار وخدمة الدين والتوزيعات {ratio} مرة."),
        );
    } else {
        let assessment = if out.adequacy_ratio >= dec!(0.8) {
            Assessment::Caution
        } else {
            Assessment::Adverse
        };
        b.assessment(assessment).interpret(
            format!("An adequacy ratio of {ratio} means external funding is needed to cover cash commitments."),
            format!("نسبة كفاية قدرها {ratio} تعني الحاجة إلى تمويل خارجي لتغطية الالتزامات النقدية."),
        );
        b.recommend(
            "Align dividend policy with internally generated cash.",
            "مواءمة سياسة التوزيعات مع النقد المتولد داخلياً.",
        );
    }
    if out.dividend_payout_ratio > dec!(0.6) {
        b.interpret(
            format!("Dividends absorb {} of operating cash flow.", fmt_pct(out.dividend_payout_ratio)),
            format!("تستهلك التوزيعات {} من التدفق النقدي التشغيلي.", fmt_pct(out.dividend_payout_ratio)),
        );
    }

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year(cfo: Decimal, capex: Decimal, repay: Decimal, div: Decimal) -> FinancialStatements {
        FinancialStatements {
            operating_cash_flow: cfo,
            capital_expenditure: capex,
            debt_repayment: repay,
            dividends_paid: div,
            ..Default::default()
        }
    }

    #[test]
    fn test_multi_year_adequacy() {
        let input = CashFlowAdequacyInput {
            periods: vec![
                year(dec!(300), dec!(150), dec!(50), dec!(50)),
                year(dec!(300), dec!(250), dec!(50), dec!(50)),
            ],
        };
        let out = calculate_cash_flow_adequacy(&input).unwrap();
        assert_eq!(out.total_requirements, dec!(600));
        assert_eq!(out.adequacy_ratio, Decimal::ONE);
        assert_eq!(out.reinvestment_ratio, dec!(400) / dec!(600));
        let r = report(&input, &ReportOptions::default()).unwrap();
        assert_eq!(r.assessment, Assessment::Favourable);
        assert_eq!(r.metric_value("periods"), Some(dec!(2)));
    }

    #[test]
    fn test_shortfall() {
        let input = CashFlowAdequacyInput {
            periods: vec![year(dec!(100), dec!(150), dec!(0), dec!(70))],
        };
        let r = report(&input, &ReportOptions::default()).unwrap();
        assert_eq!(r.assessment, Assessment::Adverse);
        assert!(r.interpretation.contains("Dividends absorb 70"));
    }

    #[test]
    fn test_no_requirements() {
        let input = CashFlowAdequacyInput {
            periods: vec![year(dec!(100), dec!(0), dec!(0), dec!(0))],
        };
        assert!(calculate_cash_flow_adequacy(&input).is_err());
    }
}
