//! Cash runway: how many months the current cash balance lasts at the
//! observed monthly burn.

use chrono::{Days, Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinError;
use crate::report::{
    fmt_money, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{mean, require_observations};
use crate::types::Money;
use crate::FinResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashRunwayInput {
    pub cash_balance: Money,
    /// Historical monthly net cash flows, oldest first (outflows negative)
    pub monthly_net_cash_flows: Vec<Money>,
    /// Committed but undrawn funding counted towards available cash
    #[serde(default)]
    pub undrawn_facilities: Money,
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashRunwayOutput {
    pub available_cash: Money,
    pub average_net_cash_flow: Money,
    /// Positive monthly net outflow; zero when cash-flow positive
    pub monthly_burn: Money,
    /// Burn over the last three months, for trend comparison
    pub recent_burn: Money,
    /// `None` when the business is not burning cash
    pub runway_months: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_out_date: Option<NaiveDate>,
}

const RECENT_WINDOW: usize = 3;
const DAYS_PER_MONTH: Decimal = dec!(30);

fn project_cash_out(as_of: NaiveDate, months: Decimal) -> Option<NaiveDate> {
    let whole = months.trunc();
    let extra_days = ((months - whole) * DAYS_PER_MONTH).round().to_u64()?;
    as_of
        .checked_add_months(Months::new(whole.to_u32()?))?
        .checked_add_days(Days::new(extra_days))
}

pub fn calculate_cash_runway(input: &CashRunwayInput) -> FinResult<CashRunwayOutput> {
    require_observations(&input.monthly_net_cash_flows, 1, "monthly cash flow")?;
    if input.cash_balance < Decimal::ZERO {
        return Err(FinError::invalid("cash_balance", "Cannot be negative"));
    }
    if input.undrawn_facilities < Decimal::ZERO {
        return Err(FinError::invalid("undrawn_facilities", "Cannot be negative"));
    }

    let flows = &input.monthly_net_cash_flows;
    let available_cash = input.cash_balance + input.undrawn_facilities;
    let average_net_cash_flow = mean(flows);
    let monthly_burn = (-average_net_cash_flow).max(Decimal::ZERO);
    let recent = &flows[flows.len().saturating_sub(RECENT_WINDOW)..];
    let recent_burn = (-mean(recent)).max(Decimal::ZERO);

    let runway_months = (monthly_burn > Decimal::ZERO).then(|| available_cash / monthly_burn);
    let cash_out_date = match (input.as_of, runway_months) {
        (Some(d), Some(m)) => project_cash_out(d, m),
        _ => None,
    };

    Ok(CashRunwayOutput {
        available_cash,
        average_net_cash_flow,
        monthly_burn,
        recent_burn,
        runway_months,
        cash_out_date,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "cash_runway",
    category: AnalysisCategory::CashFlow,
    title_en: "Cash Runway",
    title_ar: "مدة كفاية النقد",
    methodology: "Available cash over average monthly net burn",
};

pub fn report(input: &CashRunwayInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_cash_runway(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.metric("available_cash", "Available cash", "النقد المتاح", out.available_cash, MetricUnit::Currency)
        .metric("monthly_burn", "Average monthly burn", "متوسط الحرق الشهري", out.monthly_burn, MetricUnit::Currency)
        .metric("recent_burn", "Burn, last three months", "الحرق في آخر ثلاثة أشهر", out.recent_burn, MetricUnit::Currency);

    let Some(months) = out.runway_months else {
        b.assessment(Assessment::Favourable).interpret(
            format!(
                "The business is cash-flow positive, generating {} per month on average.",
                fmt_money(out.average_net_cash_flow)
            ),
            format!(
                "النشاط يحقق تدفقاً نقدياً موجباً بمتوسط {} شهرياً.",
                fmt_money(out.average_net_cash_flow)
            ),
        );
        return Ok(b.finish());
    };

    b.score(months)
        .metric("runway_months", "Runway", "مدة الكفاية", months, MetricUnit::Months)
        .benchmark(dec!(18));

    let m = fmt_ratio(months);
    let assessment = match months {
        x if x >= dec!(18) => Assessment::Favourable,
        x if x >= dec!(12) => Assessment::Neutral,
        x if x >= dec!(6) => Assessment::Caution,
        _ => Assessment::Adverse,
    };
    b.assessment(assessment).interpret(
        format!("At the current burn rate, cash lasts {m} months."),
        format!("بمعدل الحرق الحالي يكفي النقد لمدة {m} شهراً."),
    );
    if let Some(date) = out.cash_out_date {
        b.interpret(
            format!("Projected cash-out date: {date}."),
            format!("التاريخ المتوقع لنفاد النقد: {date}."),
        );
    }
    if out.recent_burn > out.monthly_burn * dec!(1.2) {
        b.interpret(
            "Burn has accelerated over the last three months.",
            "تسارع معدل الحرق خلال الأشهر الثلاثة الأخيرة.",
        );
    }
    if months < dec!(12) {
        b.recommend(
            "Start fundraising now; new rounds typically take six months to close.",
            "البدء في جمع التمويل فوراً؛ جولات التمويل تستغرق عادة ستة أشهر.",
        )
        .recommend(
            "Identify discretionary spend that can be cut to extend runway.",
            "تحديد النفقات الاختيارية التي يمكن خفضها لإطالة مدة الكفاية.",
        );
    }

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(flows: Vec<Decimal>) -> CashRunwayInput {
        CashRunwayInput {
            cash_balance: dec!(1200),
            monthly_net_cash_flows: flows,
            undrawn_facilities: Decimal::ZERO,
            as_of: NaiveDate::from_ymd_opt(2024, 1, 31),
        }
    }

    #[test]
    fn test_runway_months_and_date() {
        let out = calculate_cash_runway(&input(vec![dec!(-100); 6])).unwrap();
        assert_eq!(out.monthly_burn, dec!(100));
        assert_eq!(out.runway_months, Some(dec!(12)));
        assert_eq!(out.cash_out_date, NaiveDate::from_ymd_opt(2025, 1, 31));
    }

    #[test]
    fn test_cash_positive_has_no_runway() {
        let r = report(&input(vec![dec!(50), dec!(-10), dec!(20)]), &ReportOptions::default()).unwrap();
        assert_eq!(r.assessment, Assessment::Favourable);
        assert!(r.metric("runway_months").is_none());
    }

    #[test]
    fn test_accelerating_burn() {
        let flows = vec![dec!(-50), dec!(-50), dec!(-50), dec!(-200), dec!(-200), dec!(-200)];
        let out = calculate_cash_runway(&input(flows.clone())).unwrap();
        assert_eq!(out.recent_burn, dec!(200));
        let r = report(&input(flows), &ReportOptions::default()).unwrap();
        assert_eq!(r.assessment, Assessment::Caution);
        assert!(r.interpretation.contains("accelerated"));
        assert_eq!(r.recommendations.len(), 2);
    }

    #[test]
    fn test_empty_history_rejected() {
        match calculate_cash_runway(&input(vec![])).unwrap_err() {
            FinError::InsufficientData(_) => {}
            e => panic!("Expected InsufficientData, got {e:?}"),
        }
    }
}
