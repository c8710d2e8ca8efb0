mod exec;
mod result_set;
mod row;
mod rows;

pub use exec::{DelayedResult, ExecResult, StatementResult};
pub use result_set::ResultSet;
pub use row::Row;
pub use rows::Rows;
