mod case_fold;
mod row;

pub use case_fold::{json_keys_to_lower, rows_keys_to_lower};
pub use row::CustomDbRow;
