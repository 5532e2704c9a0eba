//! 알림 타입 및 trait 정의.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flagbot_core::OrderSide;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 알림 우선순위 레벨.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    /// 낮은 우선순위 (정보성)
    Low,
    /// 일반 우선순위
    #[default]
    Normal,
    /// 높은 우선순위 (중요 이벤트)
    High,
    /// 긴급 우선순위 (즉시 대응 필요)
    Critical,
}

/// 알림 이벤트 타입.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// 지정가 주문 배치
    OrderPlaced {
        symbol: String,
        side: OrderSide,
        price: Decimal,
        stop_loss: Decimal,
        take_profit: Decimal,
        volume: Decimal,
        /// 선택된 RR의 승률 (0.0 ~ 1.0)
        chance: f64,
    },
    /// 재시도 소진
    RetriesExhausted {
        stage: String,
        timeframe: String,
        attempts: u32,
        message: String,
    },
    /// 봇 시작
    BotStarted { asset: String, timeframes: Vec<String> },
    /// 봇 중지
    BotStopped { reason: String },
    /// 사용자 정의 알림
    Custom { title: String, message: String },
}

/// 알림 메시지.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// 고유 알림 ID
    pub id: String,
    /// 알림 이벤트
    pub event: NotificationEvent,
    /// 우선순위 레벨
    pub priority: NotificationPriority,
    /// 타임스탬프
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// 새 알림을 생성합니다.
    pub fn new(event: NotificationEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event,
            priority: NotificationPriority::Normal,
            timestamp: Utc::now(),
        }
    }

    /// 우선순위 레벨을 설정합니다.
    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// 알림 작업용 Result 타입.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// 알림 에러.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("알림 전송 실패: {0}")]
    SendFailed(String),

    #[error("잘못된 설정: {0}")]
    InvalidConfig(String),

    #[error("요청 한도 초과: {0}초 후 재시도")]
    RateLimited(u64),

    #[error("네트워크 에러: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("직렬화 에러: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl NotificationError {
    /// 재시도 가능한 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NotificationError::RateLimited(_) | NotificationError::NetworkError(_)
        )
    }
}

/// 알림 전송기 trait.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 알림을 전송합니다.
    async fn send(&self, notification: &Notification) -> NotificationResult<()>;

    /// 전송기가 활성화되어 있는지 확인합니다.
    fn is_enabled(&self) -> bool;

    /// 전송기 이름을 반환합니다.
    fn name(&self) -> &str;
}
