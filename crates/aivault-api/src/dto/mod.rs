pub mod execution;
pub mod operations;
pub mod query;
pub mod response;
pub mod strategy;
pub mod vault;

pub use execution::*;
pub use operations::*;
pub use query::*;
pub use response::*;
pub use strategy::*;
pub use vault::*;
