mod config;
mod models;
mod client;
mod listener;

pub use config::MattermostConfig;
pub use models::{MmPost, MmPostList, MmUser, WsEvent};
pub use client::MattermostClient;
pub use listener::{parse_posted_event, MattermostListener};
