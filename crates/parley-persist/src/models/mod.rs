mod provider_settings;
mod stored_turn;

pub use provider_settings::{ProviderSettings, SettingName};
pub use stored_turn::{decode_turn, encode_turn};
