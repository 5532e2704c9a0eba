//! 텔레그램 알림 서비스.
//!
//! Telegram Bot API를 통해 주문 배치 및 운영 알림을 전송합니다.

use crate::types::{
    Notification, NotificationError, NotificationEvent, NotificationPriority, NotificationResult,
    NotificationSender,
};
use async_trait::async_trait;
use flagbot_core::TelegramConfig;
use tracing::{debug, error, info, warn};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// 텔레그램 알림 전송기.
pub struct TelegramSender {
    config: TelegramConfig,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramSender {
    /// 새 텔레그램 전송기를 생성합니다.
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            api_base: DEFAULT_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// API 기본 URL을 바꿉니다 (테스트 서버 등).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// 알림을 텔레그램 HTML 메시지로 포맷합니다.
    pub fn format_message(&self, notification: &Notification) -> String {
        let priority_emoji = match notification.priority {
            NotificationPriority::Low => "ℹ️",
            NotificationPriority::Normal => "📊",
            NotificationPriority::High => "⚠️",
            NotificationPriority::Critical => "🚨",
        };

        let content = match &notification.event {
            NotificationEvent::OrderPlaced {
                symbol,
                side,
                price,
                stop_loss,
                take_profit,
                volume,
                chance,
            } => {
                let side_emoji = if side.is_buy() { "🟢" } else { "🔴" };
                format!(
                    "{side_emoji} <b>{side} 주문 배치</b>\n\
                     <code>{:.0}</code>% 확률\n\n\
                     심볼: <code>{symbol}</code>\n\
                     가격: <code>{price}</code>\n\
                     SL: <code>{stop_loss}</code>\n\
                     TP: <code>{take_profit}</code>\n\
                     수량: <code>{volume}</code>",
                    chance * 100.0
                )
            }

            NotificationEvent::RetriesExhausted {
                stage,
                timeframe,
                attempts,
                message,
            } => format!(
                "{priority_emoji} <b>재시도 소진</b>\n\n\
                 단계: {stage}\n\
                 타임프레임: {timeframe}\n\
                 시도: {attempts}회\n\
                 에러: {}",
                escape_html(message)
            ),

            NotificationEvent::BotStarted { asset, timeframes } => format!(
                "▶️ <b>봇 시작</b>\n\n\
                 심볼: <code>{asset}</code>\n\
                 타임프레임: {}",
                timeframes.join(", ")
            ),

            NotificationEvent::BotStopped { reason } => {
                format!("⏹️ <b>봇 중지</b>\n\n이유: {}", escape_html(reason))
            }

            NotificationEvent::Custom { title, message } => format!(
                "{priority_emoji} <b>{}</b>\n\n{}",
                escape_html(title),
                escape_html(message)
            ),
        };

        let timestamp = notification.timestamp.format("%Y-%m-%d %H:%M:%S UTC");
        format!("{content}\n\n<i>🕐 {timestamp}</i>")
    }

    /// 텔레그램에 원시 메시지를 전송합니다.
    async fn send_message(&self, text: &str) -> NotificationResult<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.config.bot_token);

        let params = serde_json::json!({
            "chat_id": self.config.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        debug!(chat_id = %self.config.chat_id, "Sending Telegram message");

        let response = self
            .client
            .post(&url)
            .json(&params)
            .send()
            .await
            .map_err(NotificationError::NetworkError)?;

        let status = response.status();
        if status.is_success() {
            info!("Telegram notification sent successfully");
            return Ok(());
        }

        if status.as_u16() == 429 {
            warn!("Telegram rate limited");
            return Err(NotificationError::RateLimited(60));
        }

        let body = response.text().await.unwrap_or_default();
        error!(%status, body = %body, "Failed to send Telegram message");
        Err(NotificationError::SendFailed(format!("HTTP {status}: {body}")))
    }
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, notification: &Notification) -> NotificationResult<()> {
        if !self.is_enabled() {
            debug!("Telegram notifications are disabled, skipping");
            return Ok(());
        }

        let message = self.format_message(notification);
        self.send_message(&message).await
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.bot_token.is_empty() && !self.config.chat_id.is_empty()
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use flagbot_core::OrderSide;
    use rust_decimal_macros::dec;

    fn sender() -> TelegramSender {
        TelegramSender::new(TelegramConfig {
            enabled: true,
            bot_token: "test_token".to_string(),
            chat_id: "123456".to_string(),
        })
    }

    #[test]
    fn test_format_order_placed() {
        let notification = Notification::new(NotificationEvent::OrderPlaced {
            symbol: "EURUSD".to_string(),
            side: OrderSide::SellLimit,
            price: dec!(1.0950),
            stop_loss: dec!(1.1000),
            take_profit: dec!(1.0875),
            volume: dec!(0.07),
            chance: 0.62,
        });

        let message = sender().format_message(&notification);
        assert!(message.contains("🔴"));
        assert!(message.contains("Sell Limit 주문 배치"));
        assert!(message.contains("<code>62</code>% 확률"));
        assert!(message.contains("1.0875"));
    }

    #[test]
    fn test_format_escapes_error_text() {
        let notification = Notification::new(NotificationEvent::RetriesExhausted {
            stage: "persist".to_string(),
            timeframe: "M15".to_string(),
            attempts: 3,
            message: "io <closed>".to_string(),
        });

        let message = sender().format_message(&notification);
        assert!(message.contains("io &lt;closed&gt;"));
        assert!(message.contains("시도: 3회"));
    }

    #[test]
    fn test_disabled_without_token() {
        let sender = TelegramSender::new(TelegramConfig {
            enabled: true,
            bot_token: String::new(),
            chat_id: "1".to_string(),
        });
        assert!(!sender.is_enabled());
    }
}
