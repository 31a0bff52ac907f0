pub mod table;

pub use table::{Category, CodeEntry, CodeTable, Sign};
