pub mod lowball;
pub mod reconcile;
pub mod verdict;

pub use lowball::{calculate_lowball, lowball_stats, LowballInput, LowballStats};
pub use reconcile::{cross_check, db, ppe_growth_stability, reconcile, CrossCheck, PpeGrowth, ReconcileInput};
pub use verdict::{partition, screen, ScreenFlags, ScreenVerdict, SecondaryFigures};
