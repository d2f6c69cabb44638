pub mod error;
pub mod post;
pub mod platform;
pub mod mattermost;

pub use error::{PlatformError, Result};
pub use post::ChatPost;
pub use platform::ChatPlatform;
pub use mattermost::{MattermostClient, MattermostConfig, MattermostListener};
