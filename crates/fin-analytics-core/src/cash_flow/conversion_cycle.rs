//! Cash conversion cycle: DSO + DIO - DPO.
//!
//! When a prior period is supplied, balances are averaged across the two
//! period ends; otherwise period-end balances are used.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::report::{
    AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit, ReportBuilder,
    ReportOptions,
};
use crate::stats::validate_positive;
use crate::types::FinancialStatements;
use crate::FinResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionCycleInput {
    pub current: FinancialStatements,
    #[serde(default)]
    pub prior: Option<FinancialStatements>,
    /// Length of the reporting period in days
    #[serde(default = "default_days")]
    pub days_in_period: Decimal,
}

fn default_days() -> Decimal {
    dec!(365)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionCycleOutput {
    pub dso: Decimal,
    pub dio: Decimal,
    pub dpo: Decimal,
    pub ccc: Decimal,
    /// Change in CCC against the prior period, when one was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ccc_change: Option<Decimal>,
}

fn cycle(ar: Decimal, inv: Decimal, ap: Decimal, fs: &FinancialStatements, days: Decimal) -> (Decimal, Decimal, Decimal) {
    let dso = ar * days / fs.revenue;
    let dio = inv * days / fs.cogs;
    let dpo = ap * days / fs.cogs;
    (dso, dio, dpo)
}

pub fn calculate_cash_conversion_cycle(
    input: &ConversionCycleInput,
) -> FinResult<ConversionCycleOutput> {
    let cur = &input.current;
    validate_positive(cur.revenue, "current.revenue")?;
    validate_positive(cur.cogs, "current.cogs")?;
    validate_positive(input.days_in_period, "days_in_period")?;
    let days = input.days_in_period;

    let (ar, inv, ap) = match &input.prior {
        Some(p) => (
            (cur.receivables + p.receivables) / dec!(2),
            (cur.inventory + p.inventory) / dec!(2),
            (cur.accounts_payable + p.accounts_payable) / dec!(2),
        ),
        None => (cur.receivables, cur.inventory, cur.accounts_payable),
    };
    let (dso, dio, dpo) = cycle(ar, inv, ap, cur, days);
    let ccc = dso + dio - dpo;

    let ccc_change = match &input.prior {
        Some(p) if p.revenue > Decimal::ZERO && p.cogs > Decimal::ZERO => {
            let (pdso, pdio, pdpo) = cycle(p.receivables, p.inventory, p.accounts_payable, p, days);
            let (cdso, cdio, cdpo) = cycle(cur.receivables, cur.inventory, cur.accounts_payable, cur, days);
            Some((cdso + cdio - cdpo) - (pdso + pdio - pdpo))
        }
        _ => None,
    };

    Ok(ConversionCycleOutput {
        dso,
        dio,
        dpo,
        ccc,
        ccc_change,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "cash_conversion_cycle",
    category: AnalysisCategory::CashFlow,
    title_en: "Cash Conversion Cycle",
    title_ar: "دورة التحول النقدي",
    methodology: "DSO + DIO - DPO on average or period-end balances",
};

pub fn report(input: &ConversionCycleInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_cash_conversion_cycle(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.ccc)
        .metric("dso", "Days sales outstanding", "أيام التحصيل", out.dso, MetricUnit::Days)
        .metric("dio", "Days inventory outstanding", "أيام المخزون", out.dio, MetricUnit::Days)
        .metric("dpo", "Days payables outstanding", "أيام السداد للموردين", out.dpo, MetricUnit::Days)
        .metric("ccc", "Cash conversion cycle", "دورة التحول النقدي", out.ccc, MetricUnit::Days)
        .benchmark(dec!(60));
    if let Some(delta) = out.ccc_change {
        b.metric("ccc_change", "Change vs prior period", "التغير عن الفترة السابقة", delta, MetricUnit::Days);
    }

    let ccc = out.ccc.round_dp(0);
    if out.ccc < Decimal::ZERO {
        b.assessment(Assessment::Favourable).interpret(
            format!("The cycle is negative ({ccc} days): suppliers finance operations before customers pay."),
            format!("الدورة سالبة ({ccc} يوماً)، فالموردون يمولون العمليات قبل سداد العملاء."),
        );
    } else if out.ccc <= dec!(60) {
        b.assessment(Assessment::Neutral).interpret(
            format!("Cash is tied up in working capital for {ccc} days."),
            format!("النقد محتجز في رأس المال العامل لمدة {ccc} يوماً."),
        );
    } else {
        b.assessment(Assessment::Caution).interpret(
            format!("A {ccc}-day cycle ties up significant cash in working capital."),
            format!("دورة مدتها {ccc} يوماً تحتجز نقداً كبيراً في رأس المال العامل."),
        );
        if out.dso > dec!(45) {
            b.recommend("Shorten customer payment terms.", "تقصير آجال سداد العملاء.");
        }
        if out.dio > dec!(60) {
            b.recommend("Reduce safety stock and improve demand planning.", "خفض مخزون الأمان وتحسين تخطيط الطلب.");
        }
        if out.dpo < dec!(30) {
            b.recommend("Negotiate longer supplier terms.", "التفاوض على آجال أطول مع الموردين.");
        }
    }
    if let Some(delta) = out.ccc_change.filter(|d| *d > dec!(10)) {
        let d = delta.round_dp(0);
        b.interpret(
            format!("The cycle lengthened by {d} days versus the prior period."),
            format!("طالت الدورة بمقدار {d} يوماً مقارنة بالفترة السابقة."),
        );
    }

    Ok(b.finish())
}
