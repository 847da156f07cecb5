// Service exports
pub mod appwrite;
pub mod handle;
pub mod memory;
pub mod store;

pub use appwrite::{AppwriteClient, AppwriteCollections};
pub use handle::StoreHandle;
pub use memory::{MemorySeed, MemoryStore};
pub use store::{DocumentStore, StoreError};
