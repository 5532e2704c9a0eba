//! # Flagbot Notification
//!
//! 트레이딩 알림 서비스.
//!
//! 지원 채널:
//! - Telegram
//!
//! 알림은 정보 제공용이며 전송 실패가 트레이딩 상태에 영향을 주지 않습니다.

pub mod manager;
pub mod telegram;
pub mod types;

pub use manager::*;
pub use telegram::*;
pub use types::*;
