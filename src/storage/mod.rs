pub mod memory;
pub mod s3;
pub mod traits;

pub use memory::{MemoryStore, StoredObject};
pub use s3::S3Store;
pub use traits::{avatar_key, object_url, property_image_key, upload_batch, ObjectStore};
