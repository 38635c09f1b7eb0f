//! Asset-use efficiency: turnover ratios and their day-count equivalents.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::report::{
    fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::validate_positive;
use crate::types::{FinancialStatements, Multiple};
use crate::FinResult;

const DAYS_IN_YEAR: Decimal = dec!(365);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turnover {
    pub turnover: Multiple,
    pub days: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EfficiencyOutput {
    pub asset_turnover: Multiple,
    pub receivables: Option<Turnover>,
    pub inventory: Option<Turnover>,
    pub payables: Option<Turnover>,
    pub warnings: Vec<String>,
}

fn turnover(flow: Decimal, balance: Decimal) -> Option<Turnover> {
    if balance <= Decimal::ZERO || flow <= Decimal::ZERO {
        return None;
    }
    let t = flow / balance;
    Some(Turnover {
        turnover: t,
        days: DAYS_IN_YEAR / t,
    })
}

pub fn calculate_efficiency_ratios(fs: &FinancialStatements) -> FinResult<EfficiencyOutput> {
    validate_positive(fs.revenue, "revenue")?;
    validate_positive(fs.total_assets, "total_assets")?;
    let mut warnings = Vec::new();

    let receivables = turnover(fs.revenue, fs.receivables);
    let inventory = turnover(fs.cogs, fs.inventory);
    let payables = turnover(fs.cogs, fs.accounts_payable);
    for (name, t) in [
        ("receivables", &receivables),
        ("inventory", &inventory),
        ("payables", &payables),
    ] {
        if t.is_none() {
            warnings.push(format!("{name} turnover omitted: balance or flow not positive."));
        }
    }

    Ok(EfficiencyOutput {
        asset_turnover: fs.revenue / fs.total_assets,
        receivables,
        inventory,
        payables,
        warnings,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "efficiency_ratios",
    category: AnalysisCategory::Ratios,
    title_en: "Efficiency (Activity) Ratios",
    title_ar: "نسب الكفاءة (النشاط)",
    methodology: "Turnover on period-end balances, 365-day year",
};

pub fn report(input: &FinancialStatements, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_efficiency_ratios(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.asset_turnover).metric(
        "asset_turnover",
        "Asset turnover",
        "معدل دوران الأصول",
        out.asset_turnover,
        MetricUnit::Ratio,
    );
    if let Some(t) = &out.receivables {
        b.metric("receivables_turnover", "Receivables turnover", "معدل دوران الذمم المدينة", t.turnover, MetricUnit::Ratio)
            .metric("days_sales_outstanding", "Days sales outstanding", "متوسط فترة التحصيل", t.days, MetricUnit::Days)
            .benchmark(dec!(45));
    }
    if let Some(t) = &out.inventory {
        b.metric("inventory_turnover", "Inventory turnover", "معدل دوران المخزون", t.turnover, MetricUnit::Ratio)
            .metric("days_inventory_outstanding", "Days inventory outstanding", "متوسط فترة التخزين", t.days, MetricUnit::Days);
    }
    if let Some(t) = &out.payables {
        b.metric("payables_turnover", "Payables turnover", "معدل دوران الذمم الدائنة", t.turnover, MetricUnit::Ratio)
            .metric("days_payables_outstanding", "Days payables outstanding", "متوسط فترة السداد", t.days, MetricUnit::Days);
    }

    let at = fmt_ratio(out.asset_turnover);
    let assessment = if out.asset_turnover >= Decimal::ONE {
        Assessment::Favourable
    } else if out.asset_turnover >= dec!(0.5) {
        Assessment::Neutral
    } else {
        Assessment::Caution
    };
    b.assessment(assessment).interpret(
        format!("Each unit of assets generates {at} units of revenue."),
        format!("كل وحدة من الأصول تولد {at} وحدة من الإيرادات."),
    );

    if let Some(t) = out.receivables.as_ref().filter(|t| t.days > dec!(60)) {
        let days = t.days.round_dp(0);
        b.interpret(
            format!("Customers take {days} days to pay."),
            format!("يستغرق العملاء {days} يوماً للسداد."),
        )
        .recommend(
            "Tighten credit terms and collection follow-up.",
            "تشديد شروط الائتمان ومتابعة التحصيل.",
        );
    }
    if let Some(t) = out.inventory.as_ref().filter(|t| t.days > dec!(120)) {
        let days = t.days.round_dp(0);
        b.interpret(
            format!("Inventory sits for {days} days before sale."),
            format!("يبقى المخزون {days} يوماً قبل البيع."),
        )
        .recommend(
            "Review slow-moving stock for obsolescence.",
            "مراجعة الأصناف بطيئة الحركة تحسباً للتقادم.",
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
            revenue: dec!(3650),
            cogs: dec!(2190),
            total_assets: dec!(2920),
            receivables: dec!(365),
            inventory: dec!(438),
            accounts_payable: dec!(219),
            ..Default::default()
        }
    }

    #[test]
    fn test_turnovers_and_days() {
        let out = calculate_efficiency_ratios(&sample()).unwrap();
        assert_eq!(out.asset_turnover, dec!(1.25));
        let ar = out.receivables.unwrap();
        assert_eq!(ar.turnover, dec!(10));
        assert_eq!(ar.days, dec!(36.5));
        let inv = out.inventory.unwrap();
        assert_eq!(inv.turnover, dec!(5));
        assert_eq!(inv.days, dec!(73));
        assert_eq!(out.payables.unwrap().days, dec!(36.5));
    }

    #[test]
    fn test_missing_inventory_warns() {
        let mut fs = sample();
        fs.inventory = Decimal::ZERO;
        let r = report(&fs, &ReportOptions::default()).unwrap();
        assert!(r.metric("inventory_turnover").is_none());
        assert_eq!(r.warnings.len(), 1);
    }

    #[test]
    fn test_slow_collection_flagged() {
        let mut fs = sample();
        fs.receivables = dec!(1000);
        let r = report(&fs, &ReportOptions::default()).unwrap();
        assert!(r.interpretation.contains("days to pay"));
        assert_eq!(r.recommendations.len(), 1);
    }
}
