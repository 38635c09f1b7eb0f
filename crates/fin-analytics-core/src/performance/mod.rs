pub mod calmar;
pub mod drawdown;
pub mod information;
pub mod jensen;
pub mod metrics;
pub mod omega;
pub mod sharpe;
pub mod sortino;
pub mod summary;
pub mod treynor;

use crate::catalogue::{entry, AnalysisEntry};

pub(crate) fn entries() -> Vec<AnalysisEntry> {
    vec![
        entry!(sharpe),
        entry!(sortino),
        entry!(treynor),
        entry!(jensen),
        entry!(information),
        entry!(calmar),
        entry!(omega),
        entry!(drawdown),
        entry!(summary),
    ]
}
