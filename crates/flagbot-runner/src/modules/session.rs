//! 거래 시간대 판정.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use flagbot_core::TradingHoursConfig;

/// 주문을 낼 수 있는 시간대 (UTC).
#[derive(Debug, Clone)]
pub struct TradingSession {
    start_hour: u32,
    end_hour: u32,
    weekdays_only: bool,
}

impl TradingSession {
    pub fn from_config(config: &TradingHoursConfig) -> Self {
        Self {
            start_hour: config.start_hour,
            end_hour: config.end_hour,
            weekdays_only: config.weekdays_only,
        }
    }

    /// 항상 열려 있는 세션.
    pub fn always_open() -> Self {
        Self {
            start_hour: 0,
            end_hour: 24,
            weekdays_only: false,
        }
    }

    /// `[start_hour, end_hour)` 안이고 (필요하면) 평일인지 확인합니다.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        if self.weekdays_only && matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let hour = now.hour();
        hour >= self.start_hour && hour < self.end_hour
    }
}

impl Default for TradingSession {
    fn default() -> Self {
        Self::from_config(&TradingHoursConfig::default())
    }
}
