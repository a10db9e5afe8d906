// Valuation engine: replacement baselines, SGP scoring, dollar conversion,
// and the full-pass recalculation that ties them together.

pub mod dollars;
pub mod recalc;
pub mod replacement;
pub mod sgp;
pub mod stats;

pub use recalc::{apply_epoch, recalculate, PlayerValue, ValuationEpoch};
