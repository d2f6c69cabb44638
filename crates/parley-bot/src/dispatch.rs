use parley_chat::ChatPost;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::handlers::{SettingsCommandHandler, TurnHandler};

/// A turn handler and the mention that summons it
pub struct Route {
    pub trigger: String,
    pub handler: Arc<TurnHandler>,
}

/// Routes incoming posts to the settings commands or a provider
pub struct Dispatcher {
    routes: Vec<Route>,
    commands: SettingsCommandHandler,
}

impl Dispatcher {
    pub fn new(commands: SettingsCommandHandler) -> Self {
        Self {
            routes: Vec::new(),
            commands,
        }
    }

    pub fn route(mut self, trigger: impl Into<String>, handler: TurnHandler) -> Self {
        self.routes.push(Route {
            trigger: trigger.into(),
            handler: Arc::new(handler),
        });
        self
    }

    /// Pick the provider for a post
    ///
    /// An explicit mention wins. Otherwise a reply goes to the provider
    /// that already holds history for its thread.
    pub async fn select(&self, post: &ChatPost) -> Option<Arc<TurnHandler>> {
        if let Some(route) = self.routes.iter().find(|r| post.mentions(&r.trigger)) {
            return Some(route.handler.clone());
        }

        if post.is_reply() {
            for route in &self.routes {
                if route.handler.owns_thread(post.thread_id()).await {
                    return Some(route.handler.clone());
                }
            }
        }

        None
    }

    pub async fn dispatch(&self, post: ChatPost) {
        if self.commands.handle(&post).await {
            return;
        }

        match self.select(&post).await {
            Some(handler) => handler.handle(&post).await,
            None => debug!(post_id = %post.id, "No provider for post"),
        }
    }

    /// Consume posts until the channel closes, one task per post
    pub async fn run(self: Arc<Self>, mut posts: mpsc::Receiver<ChatPost>) {
        info!(providers = self.routes.len(), "Dispatcher started");

        while let Some(post) = posts.recv().await {
            let dispatcher = self.clone();
            tokio::spawn(async move {
                dispatcher.dispatch(post).await;
            });
        }

        info!("Post channel closed, dispatcher stopped");
    }
}
