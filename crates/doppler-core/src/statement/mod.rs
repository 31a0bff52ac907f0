pub mod normalize;
pub mod table;

pub use normalize::{normalize, normalize_rows, CategorizedItem, CategoryMembers, NormalizedStatement};
pub use table::{parse_number, parse_unit, LineItem, StatementTable, UNIT_MINUS_CODE};
