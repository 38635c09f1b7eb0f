pub mod copula;
pub mod garch;
pub mod markov;
pub mod monte_carlo;
mod optimize;
pub mod regression;

use crate::catalogue::{entry, AnalysisEntry};

pub(crate) fn entries() -> Vec<AnalysisEntry> {
    vec![
        entry!(garch),
        entry!(markov),
        entry!(copula),
        entry!(regression),
        entry!(monte_carlo),
    ]
}
