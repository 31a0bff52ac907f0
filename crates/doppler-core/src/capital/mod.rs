pub mod aggregates;
pub mod structure;

pub use aggregates::{resolve_aggregates, Aggregate, AggregateRule, ResolvedAggregates};
pub use structure::{resolve, Assumption, CapitalStructure, DualAssumption};
