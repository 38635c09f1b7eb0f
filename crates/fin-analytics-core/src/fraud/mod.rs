pub mod accruals;
pub mod altman;
pub mod beneish;
pub mod benford;
pub mod piotroski;
pub mod red_flags;

use crate::catalogue::{entry, AnalysisEntry};

pub(crate) fn entries() -> Vec<AnalysisEntry> {
    vec![
        entry!(altman),
        entry!(beneish),
        entry!(piotroski),
        entry!(benford),
        entry!(accruals),
        entry!(red_flags),
    ]
}
