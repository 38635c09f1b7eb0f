pub mod beta;
pub mod concentration;
pub mod shortfall;
pub mod stress;
pub mod var;
pub mod volatility;

use crate::catalogue::{entry, AnalysisEntry};

pub(crate) fn entries() -> Vec<AnalysisEntry> {
    vec![
        entry!(var),
        entry!(shortfall),
        entry!(volatility),
        entry!(beta),
        entry!(stress),
        entry!(concentration),
    ]
}
