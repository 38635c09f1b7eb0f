//! Cash backing of reported earnings.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::report::{
    fmt_pct, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::types::{FinancialStatements, Money, Rate};
use crate::FinResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowQualityOutput {
    /// CFO / net income; `None` when net income is not positive
    pub quality_ratio: Option<Rate>,
    /// CFO / EBITDA
    pub cash_conversion: Option<Rate>,
    /// Net income less CFO
    pub accrual_gap: Money,
    /// Accrual gap scaled by total assets
    pub accrual_gap_ratio: Option<Rate>,
    pub warnings: Vec<String>,
}

pub fn calculate_cash_flow_quality(fs: &FinancialStatements) -> FinResult<CashFlowQualityOutput> {
    let mut warnings = Vec::new();

    let quality_ratio = if fs.net_income > Decimal::ZERO {
        Some(fs.operating_cash_flow / fs.net_income)
    } else {
        warnings.push("Net income is not positive; CFO / net income omitted.".to_string());
        None
    };
    let ebitda = fs.ebitda();
    let cash_conversion = if ebitda > Decimal::ZERO {
        Some(fs.operating_cash_flow / ebitda)
    } else {
        warnings.push("EBITDA is not positive; cash conversion omitted.".to_string());
        None
    };
    let accrual_gap = fs.net_income - fs.operating_cash_flow;
    let accrual_gap_ratio = (fs.total_assets > Decimal::ZERO).then(|| accrual_gap / fs.total_assets);

    Ok(CashFlowQualityOutput {
        quality_ratio,
        cash_conversion,
        accrual_gap,
        accrual_gap_ratio,
        warnings,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "cash_flow_quality",
    category: AnalysisCategory::CashFlow,
    title_en: "Cash Flow Quality",
    title_ar: "جودة التدفقات النقدية",
    methodology: "Operating cash flow relative to net income and EBITDA",
};

pub fn report(input: &FinancialStatements, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_cash_flow_quality(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    if let Some(q) = out.quality_ratio {
        b.score(q)
            .metric("quality_ratio", "Operating cash flow / net income", "التدفق النقدي التشغيلي إلى صافي الدخل", q, MetricUnit::Ratio)
            .benchmark(Decimal::ONE);
    }
    if let Some(c) = out.cash_conversion {
        b.metric("cash_conversion", "Cash conversion (CFO / EBITDA)", "التحول النقدي", c, MetricUnit::Percent);
    }
    b.metric("accrual_gap", "Net income less operating cash flow", "فجوة المستحقات", out.accrual_gap, MetricUnit::Currency);
    if let Some(r) = out.accrual_gap_ratio {
        b.metric("accrual_gap_ratio", "Accrual gap / total assets", "فجوة المستحقات إلى الأصول", r, MetricUnit::Percent);
    }

    match out.quality_ratio {
        Some(q) => {
            let qs = fmt_ratio(q);
            let assessment = match q {
                q if q >= Decimal::ONE => Assessment::Favourable,
                q if q >= dec!(0.8) => Assessment::Neutral,
                q if q >= dec!(0.5) => Assessment::Caution,
                _ => Assessment::Adverse,
            };
            b.assessment(assessment).interpret(
                format!("Each unit of net income is backed by {qs} units of operating cash flow."),
                format!("كل وحدة من صافي الدخل مدعومة بـ {qs} وحدة من التدفق النقدي التشغيلي."),
            );
            if q < dec!(0.8) {
                b.recommend(
                    "Investigate working-capital build-up and non-cash revenue recognition.",
                    "فحص تراكم رأس المال العامل والإيرادات غير النقدية.",
                );
            }
        }
        None if input.operating_cash_flow > Decimal::ZERO => {
            b.assessment(Assessment::Neutral).interpret(
                "Accounting losses are accompanied by positive operating cash flow.",
                "الخسائر المحاسبية يقابلها تدفق نقدي تشغيلي موجب.",
            );
        }
        None => {
            b.assessment(Assessment::Adverse).interpret(
                "Both earnings and operating cash flow are negative.",
                "كل من الأرباح والتدفق النقدي التشغيلي سالبان.",
            );
            b.recommend(
                "Build a 13-week cash forecast and secure liquidity headroom.",
                "إعداد توقعات نقدية لثلاثة عشر أسبوعاً وتأمين هامش سيولة.",
            );
        }
    }
    if let Some(c) = out.cash_conversion.filter(|c| *c < dec!(0.6)) {
        let cs = fmt_pct(c);
        b.interpret(
            format!("Only {cs} of EBITDA converts into operating cash."),
            format!("فقط {cs} من EBITDA يتحول إلى نقد تشغيلي."),
        );
    }
    b.warnings(out.warnings);

    Ok(b.finish())
}
