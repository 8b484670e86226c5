//! CLI command handlers. `get` and `batch` build a request list and hand it to `execute`.

mod batch;
mod execute;
mod get;

pub use batch::run_batch;
pub use get::run_get;
