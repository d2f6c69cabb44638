pub mod config;
pub mod auth;
pub mod history;
pub mod markdown;
pub mod throttle;
pub mod handlers;
pub mod dispatch;
pub mod state;

pub use auth::{Authorizer, StaticAuthorizer};
pub use config::Config;
pub use dispatch::Dispatcher;
pub use handlers::{SettingsCommand, SettingsCommandHandler, TurnHandler};
pub use state::BotState;
