pub mod error;
pub mod store;
pub mod memory;
pub mod models;
pub mod conversation;
pub mod settings;
#[cfg(feature = "mongodb")]
pub mod dbs;

pub use error::{PersistError, Result};
pub use store::KeyValueStore;
pub use memory::InMemoryStore;
pub use models::{ProviderSettings, SettingName};
pub use conversation::{ConversationStore, THREAD_RETENTION};
pub use settings::SettingsStore;
#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoStore;
