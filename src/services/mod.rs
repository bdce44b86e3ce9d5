// Service exports
pub mod appwrite;
pub mod identity;
pub mod memory;
pub mod store;

pub use appwrite::{AppwriteClient, AppwriteCollections, AppwriteError};
pub use identity::{AuthError, Claims, TokenIdentityResolver, TokenVerifier};
pub use memory::{MemoryEventStore, MemoryProfileStore};
pub use store::{EventStore, IdentityResolver, ProfileStore, StoreError};
