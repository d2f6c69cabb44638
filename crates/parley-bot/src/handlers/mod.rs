pub mod turn;
pub mod settings;

pub use turn::{TurnHandler, DEFAULT_IDLE_TIMEOUT, FAILURE_REACTION, IN_PROGRESS_REACTION};
pub use settings::{SettingsCommand, SettingsCommandHandler};
