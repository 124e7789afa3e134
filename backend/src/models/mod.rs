pub mod macros;
pub mod period;
pub mod report;
pub mod store;

pub use period::*;
pub use report::*;
pub use store::*;
