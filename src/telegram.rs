use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::TELEGRAM_API_BASE;

/// Seconds a getUpdates long poll holds the connection open.
const LONG_POLL_SECS: u64 = 50;

pub const HELP_TEXT: &str = "Available commands:\n\
/rank - Show current rankings\n\
/help - Show this help message";

/// A bot command received from a chat.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Rank { chat_id: i64 },
    Help { chat_id: i64 },
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

/// Thin Telegram Bot API client: report delivery plus command long-polling.
#[derive(Debug, Clone)]
pub struct Telegram {
    http: reqwest::Client,
    token: String,
    message_thread: Option<i64>,
}

impl Telegram {
    pub fn new(token: &str, message_thread: Option<i64>) -> Result<Self> {
        if token.is_empty() {
            bail!("telegram bot token is empty (set it in config.toml or TELEGRAM_BOT_TOKEN)");
        }
        let http = reqwest::Client::builder()
            // Must outlive the long poll itself
            .timeout(Duration::from_secs(LONG_POLL_SECS + 15))
            .build()
            .context("failed to build Telegram HTTP client")?;
        Ok(Self {
            http,
            token: token.to_string(),
            message_thread,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{TELEGRAM_API_BASE}/bot{}/{method}", self.token)
    }

    /// Deliver a text report to a chat.
    pub async fn send(&self, chat_id: i64, text: &str) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(thread) = self.message_thread {
            body["reply_to_message_id"] = json!(thread);
        }

        let resp: SendResponse = self
            .http
            .post(self.url("sendMessage"))
            .json(&body)
            .send()
            .await
            .context("sendMessage request failed")?
            .json()
            .await
            .context("failed to decode sendMessage response")?;
        if !resp.ok {
            bail!(
                "sendMessage rejected: {}",
                resp.description.unwrap_or_default()
            );
        }
        Ok(())
    }

    /// Long-poll for new bot commands, advancing `offset` past every update
    /// seen. Cancel-safe: a dropped poll leaves `offset` untouched, so the
    /// same updates are redelivered on the next call.
    pub async fn next_commands(&self, offset: &mut i64) -> Result<Vec<Command>> {
        let resp: UpdatesResponse = self
            .http
            .get(self.url("getUpdates"))
            .query(&[
                ("timeout", LONG_POLL_SECS.to_string()),
                ("offset", offset.to_string()),
            ])
            .send()
            .await
            .context("getUpdates request failed")?
            .json()
            .await
            .context("failed to decode getUpdates response")?;
        if !resp.ok {
            bail!(
                "getUpdates rejected: {}",
                resp.description.unwrap_or_default()
            );
        }

        let mut commands = Vec::new();
        for update in resp.result {
            *offset = (*offset).max(update.update_id + 1);
            let Some(message) = update.message else { continue };
            let Some(text) = message.text else { continue };
            match parse_command(&text) {
                Some(CommandKind::Rank) => commands.push(Command::Rank {
                    chat_id: message.chat.id,
                }),
                Some(CommandKind::Help) => commands.push(Command::Help {
                    chat_id: message.chat.id,
                }),
                None => {}
            }
        }
        if !commands.is_empty() {
            debug!("Received {} command(s)", commands.len());
        }
        Ok(commands)
    }
}

#[derive(Debug, PartialEq)]
enum CommandKind {
    Rank,
    Help,
}

/// Recognize a command at the start of a message, tolerating the
/// `/cmd@botname` form Telegram uses in group chats.
fn parse_command(text: &str) -> Option<CommandKind> {
    let first = text.split_whitespace().next()?;
    let name = first.split('@').next()?;
    match name {
        "/rank" => Some(CommandKind::Rank),
        "/help" => Some(CommandKind::Help),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_plain_commands() {
        assert_eq!(parse_command("/rank"), Some(CommandKind::Rank));
        assert_eq!(parse_command("/help"), Some(CommandKind::Help));
    }

    #[test]
    fn recognizes_group_chat_form() {
        assert_eq!(parse_command("/rank@rankbot"), Some(CommandKind::Rank));
    }

    #[test]
    fn ignores_other_text() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("/ranking"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn command_may_trail_arguments() {
        assert_eq!(parse_command("/rank now please"), Some(CommandKind::Rank));
    }
}
