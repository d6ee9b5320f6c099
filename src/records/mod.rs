pub mod http;
pub mod memory;
pub mod traits;

pub use http::HttpRecords;
pub use memory::MemoryRecords;
pub use traits::{PropertyRepository, UserRepository};
