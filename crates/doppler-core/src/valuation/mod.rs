pub mod engine;
pub mod ratios;
pub mod selection;

pub use engine::{
    value, CashFlowSeries, FcfProjection, PerShareSeries, Projection, SelectedSeries, Valuation,
};
pub use ratios::{latest_ratios, LatestRatios};
pub use selection::select_conservative;
