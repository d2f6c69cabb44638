mod client;
mod models;
mod repository;

pub use client::MongoStore;
pub use models::MongoEntry;
pub use repository::MongoEntryRepository;
