//! Core data models: the raw GRID series document, series listings and the
//! derived report.

mod listing;
mod report;
mod series;

pub use listing::*;
pub use report::*;
pub use series::*;
