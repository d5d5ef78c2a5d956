//! Query construction: structured filters and the directory query compiler.

pub mod compiler;
mod filter;

pub use compiler::compile;
pub use filter::{FilterClause, FilterExpression, FilterOperator};
