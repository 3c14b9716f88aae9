//! Telegram Bot API transport

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Notifier, NotifyError, PaymentReminder};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
}

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends reminders to one chat through a Telegram bot
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
    chat_id: i64,
}

impl TelegramNotifier {
    pub fn new(api_url: impl Into<String>, bot_token: impl Into<String>, chat_id: i64) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            chat_id,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }

    /// Send arbitrary Markdown text to the configured chat
    pub async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessageRequest {
                chat_id: self.chat_id,
                text,
                parse_mode: "Markdown",
            })
            .send()
            .await?;

        check_response(response).await
    }
}

/// Non-2xx status or `ok = false` is a transport failure
async fn check_response(response: reqwest::Response) -> Result<(), NotifyError> {
    let status = response.status();
    let body: Option<ApiResponse> = response.json().await.ok();

    match body {
        Some(ApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
        Some(ApiResponse { description, .. }) => Err(NotifyError::TransportFailure(format!(
            "telegram returned {}: {}",
            status,
            description.unwrap_or_else(|| "no description".to_string())
        ))),
        None => Err(NotifyError::TransportFailure(format!(
            "telegram returned {} with an unreadable body",
            status
        ))),
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, reminder: &PaymentReminder) -> Result<(), NotifyError> {
        self.send_message(&reminder.render()).await
    }

    async fn health_check(&self) -> Result<(), NotifyError> {
        let response = self.client.get(self.method_url("getMe")).send().await?;
        check_response(response).await
    }
}
