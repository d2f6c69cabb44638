use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::config::MattermostConfig;
use super::models::{MmPost, WsEvent};
use crate::error::Result;
use crate::post::ChatPost;

const CHANNEL_CAPACITY: usize = 256;

/// Receives `posted` events over the Mattermost WebSocket
pub struct MattermostListener {
    config: MattermostConfig,
    bot_user_id: String,
}

impl MattermostListener {
    pub fn new(config: MattermostConfig, bot_user_id: impl Into<String>) -> Self {
        Self {
            config,
            bot_user_id: bot_user_id.into(),
        }
    }

    /// Spawn the connection loop and hand back the stream of new posts
    ///
    /// The loop reconnects after `reconnect_delay` until the receiver is dropped.
    /// Posts authored by the bot itself are filtered out.
    pub fn start(self) -> mpsc::Receiver<ChatPost> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            loop {
                match self.run_session(&tx).await {
                    Ok(()) => info!("Mattermost WebSocket closed"),
                    Err(e) => warn!(error = %e, "Mattermost WebSocket session failed"),
                }

                if tx.is_closed() {
                    debug!("Post receiver dropped, stopping listener");
                    break;
                }

                tokio::time::sleep(self.config.reconnect_delay()).await;
                info!("Reconnecting to Mattermost WebSocket");
            }
        });

        rx
    }

    async fn run_session(&self, tx: &mpsc::Sender<ChatPost>) -> Result<()> {
        let url = self.config.websocket_url()?;
        let (ws, _) = connect_async(url.as_str()).await?;
        let (mut write, mut read) = ws.split();

        let challenge = json!({
            "seq": 1,
            "action": "authentication_challenge",
            "data": { "token": self.config.token },
        });
        write.send(Message::Text(challenge.to_string().into())).await?;
        info!(url = %url, "Mattermost WebSocket connected");

        while let Some(frame) = read.next().await {
            let text = match frame? {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };

            let Some(post) = parse_posted_event(&text) else {
                continue;
            };
            if post.is_from(&self.bot_user_id) {
                continue;
            }

            debug!(post_id = %post.id, thread_id = %post.thread_id(), "Received post");
            if tx.send(post).await.is_err() {
                return Ok(());
            }
        }

        Ok(())
    }
}

/// Extract the post from a `posted` event frame
///
/// The post itself arrives as a JSON string inside `data.post`.
/// Anything else (other events, status replies, malformed frames) yields `None`.
pub fn parse_posted_event(text: &str) -> Option<ChatPost> {
    let event: WsEvent = serde_json::from_str(text).ok()?;
    if event.event != "posted" {
        return None;
    }

    let raw = event.data.get("post")?.as_str()?;
    let post: MmPost = match serde_json::from_str(raw) {
        Ok(post) => post,
        Err(e) => {
            warn!(error = %e, "Malformed post in posted event");
            return None;
        }
    };

    let sender = event.data.get("sender_name").and_then(|v| v.as_str());
    Some(post.into_chat_post(sender))
}
