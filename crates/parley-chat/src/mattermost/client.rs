use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::config::MattermostConfig;
use super::models::{ApiErrorBody, CreatePost, MmPost, MmPostList, MmUser, NewReaction, PatchPost};
use crate::error::{PlatformError, Result};
use crate::platform::ChatPlatform;
use crate::post::ChatPost;

/// Mattermost REST client (API v4)
pub struct MattermostClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
    bot_user: MmUser,
}

impl MattermostClient {
    /// Build the client and resolve the bot's own user
    pub async fn connect(config: &MattermostConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        let mut client = Self {
            http,
            api_base: config.api_base(),
            token: config.token.clone(),
            bot_user: MmUser {
                id: String::new(),
                username: String::new(),
            },
        };

        let me: MmUser = client.get_json(client.request(Method::GET, "/users/me")).await?;
        client.bot_user = me;
        tracing::info!(
            user_id = %client.bot_user.id,
            username = %client.bot_user.username,
            "Connected to Mattermost"
        );

        Ok(client)
    }

    pub fn bot_username(&self) -> &str {
        &self.bot_user.username
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.api_base, path))
            .bearer_auth(&self.token)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|e| e.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or(body);

        Err(PlatformError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Create a post, optionally inside a thread
    pub async fn create_post(&self, channel_id: &str, root_id: &str, message: &str) -> Result<ChatPost> {
        let body = CreatePost {
            channel_id,
            message,
            root_id,
        };
        let post: MmPost = self
            .get_json(self.request(Method::POST, "/posts").json(&body))
            .await?;
        Ok(post.into_chat_post(Some(&self.bot_user.username)))
    }
}

#[async_trait]
impl ChatPlatform for MattermostClient {
    fn bot_user_id(&self) -> &str {
        &self.bot_user.id
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Vec<ChatPost>> {
        let list: MmPostList = self
            .get_json(self.request(Method::GET, &format!("/posts/{}/thread", thread_id)))
            .await?;

        Ok(list
            .into_sorted()
            .into_iter()
            .map(|post| post.into_chat_post(None))
            .collect())
    }

    async fn reply(&self, to: &ChatPost, message: &str) -> Result<String> {
        let post = self
            .create_post(&to.channel_id, to.thread_id(), message)
            .await?;
        Ok(post.id)
    }

    async fn edit(&self, post_id: &str, message: &str) -> Result<()> {
        self.send(
            self.request(Method::PUT, &format!("/posts/{}/patch", post_id))
                .json(&PatchPost { message }),
        )
        .await?;
        Ok(())
    }

    async fn add_reaction(&self, post_id: &str, emoji: &str) -> Result<()> {
        let body = NewReaction {
            user_id: &self.bot_user.id,
            post_id,
            emoji_name: emoji,
        };
        self.send(self.request(Method::POST, "/reactions").json(&body))
            .await?;
        Ok(())
    }

    async fn remove_reaction(&self, post_id: &str, emoji: &str) -> Result<()> {
        let path = format!(
            "/users/{}/posts/{}/reactions/{}",
            self.bot_user.id, post_id, emoji
        );
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }
}
