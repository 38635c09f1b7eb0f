pub mod adequacy;
pub mod conversion_cycle;
pub mod free_cash_flow;
pub mod quality;
pub mod runway;

use crate::catalogue::{entry, AnalysisEntry};

pub(crate) fn entries() -> Vec<AnalysisEntry> {
    vec![
        entry!(quality),
        entry!(free_cash_flow),
        entry!(conversion_cycle),
        entry!(runway),
        entry!(adequacy),
    ]
}
