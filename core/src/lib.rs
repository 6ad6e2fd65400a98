//! Client-side cache for a lending-platform lender: profile, country
//! catalog, and preferred loans, fed by key-tagged tuples whose set values
//! are packed as delimited flat records.
//!
//! Data flow:
//!   transport → `adapter` → (`tokenizer` → `decoder`) → `store` → view

pub mod adapter;
pub mod collaborator;
pub mod config;
pub mod decoder;
pub mod error;
pub mod message;
pub mod snapshot;
pub mod store;
pub mod tokenizer;
pub mod types;

pub use adapter::{MessageReport, ProtocolAdapter};
pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use store::EntityStore;
