pub mod content;
pub mod error;
pub mod local;

#[cfg(test)]
mod tests;

pub use content::{ContentStore, IpfsClient};
pub use error::{StorageError, StorageResult};
pub use local::LocalStore;
