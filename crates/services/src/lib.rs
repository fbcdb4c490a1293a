pub mod conversation_store;
pub mod kv_store;
pub mod local_store;

pub use conversation_store::{ConversationStore, StoreError};
pub use kv_store::{JsonFileStore, KeyValueStore, MemoryStore, SqliteStore};
pub use local_store::LocalStore;
