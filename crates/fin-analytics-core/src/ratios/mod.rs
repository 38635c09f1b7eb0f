pub mod dupont;
pub mod efficiency;
pub mod leverage;
pub mod liquidity;
pub mod profitability;
pub mod valuation;

use crate::catalogue::{entry, AnalysisEntry};

pub(crate) fn entries() -> Vec<AnalysisEntry> {
    vec![
        entry!(liquidity),
        entry!(profitability),
        entry!(leverage),
        entry!(efficiency),
        entry!(dupont),
        entry!(valuation),
    ]
}
