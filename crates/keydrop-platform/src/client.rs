//! Thin REST client for the chat platform.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use keydrop_core::config::PlatformConfig;
use keydrop_core::error::{AppError, ErrorKind};
use keydrop_core::result::AppResult;
use keydrop_core::types::id::{ChannelId, MessageId, UserId};
use keydrop_core::types::message::OutboundMessage;

use crate::payload::{
    ChannelResponse, MessagePayload, MessageResponse, OpenDmPayload, UserResponse,
};

/// Authenticated client for the platform REST API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl PlatformClient {
    /// Build a client from configuration.
    pub fn new(config: &PlatformConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("keydrop/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to build platform HTTP client",
                    e,
                )
            })?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
        })
    }

    /// Absolute URL for an API path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.bot_token))
    }

    async fn execute(&self, builder: RequestBuilder, what: &str) -> AppResult<Response> {
        builder.send().await.map_err(|e| {
            AppError::with_source(ErrorKind::ExternalService, format!("Failed to {what}"), e)
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> AppResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external(format!("Failed to {what}: HTTP {status}")));
        }
        response.json::<T>().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Serialization,
                format!("Failed to decode response to {what}"),
                e,
            )
        })
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        what: &str,
    ) -> AppResult<T> {
        let response = self.execute(self.request(method, path).json(body), what).await?;
        Self::read_json(response, what).await
    }

    /// Open (or reuse) the private channel with `user`.
    pub async fn open_dm(&self, user: UserId) -> AppResult<ChannelId> {
        let channel: ChannelResponse = self
            .send_json(
                Method::POST,
                "/users/@me/channels",
                &OpenDmPayload { recipient_id: user },
                "open private channel",
            )
            .await?;
        debug!(user = %user, channel = %channel.id, "Opened private channel");
        Ok(channel.id)
    }

    /// Post a new message in `channel`.
    pub async fn create_message(
        &self,
        channel: ChannelId,
        message: &OutboundMessage,
    ) -> AppResult<MessageId> {
        let created: MessageResponse = self
            .send_json(
                Method::POST,
                &format!("/channels/{channel}/messages"),
                &MessagePayload::from(message),
                "create message",
            )
            .await?;
        Ok(created.id)
    }

    /// Whether `message` still exists in `channel`.
    pub async fn message_exists(&self, channel: ChannelId, message: MessageId) -> AppResult<bool> {
        let response = self
            .execute(
                self.request(Method::GET, &format!("/channels/{channel}/messages/{message}")),
                "fetch message",
            )
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(AppError::external(format!(
                "Failed to fetch message: HTTP {status}"
            ))),
        }
    }

    /// Replace the content of `message` in `channel`.
    ///
    /// A message that no longer exists is reported as `NotFound`.
    pub async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: &OutboundMessage,
    ) -> AppResult<()> {
        let response = self
            .execute(
                self.request(Method::PATCH, &format!("/channels/{channel}/messages/{message}"))
                    .json(&MessagePayload::from(content)),
                "edit message",
            )
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::not_found(format!("Message {message} no longer exists")));
        }
        let _: MessageResponse = Self::read_json(response, "edit message").await?;
        Ok(())
    }

    /// Look up a user. `Ok(None)` when the platform does not know them.
    pub async fn fetch_user(&self, user: UserId) -> AppResult<Option<UserResponse>> {
        let response = self
            .execute(
                self.request(Method::GET, &format!("/users/{user}")),
                "fetch user",
            )
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::read_json(response, "fetch user").await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = PlatformConfig {
            api_base: "https://chat.example/api/v10/".to_string(),
            ..PlatformConfig::default()
        };
        let client = PlatformClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("/users/@me/channels"),
            "https://chat.example/api/v10/users/@me/channels"
        );
        assert_eq!(
            client.endpoint("channels/1/messages"),
            "https://chat.example/api/v10/channels/1/messages"
        );
    }
}
