pub mod memory;
pub mod mock;
pub mod rest;
pub mod traits;

pub use memory::MemoryBackend;
pub use rest::RestBackend;
pub use traits::{EngagementSource, ListingStore, MediaStorage, SellerSession, SessionProvider};
