pub mod models;
pub mod pool;
pub mod writer;

pub use writer::{BatchExecutor, BatchedWriter, PgLiveStore};
