//! 봉 타임프레임 정의.
//!
//! 브로커 터미널의 표기법(`M15`, `H1`, `D1` 등)을 기본 형식으로 사용하며,
//! 소문자 간격 표기(`15m`, `1h`)도 파싱할 수 있습니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 봉 타임프레임.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Timeframe {
    /// 1분봉
    M1,
    /// 5분봉
    M5,
    /// 15분봉
    M15,
    /// 30분봉
    M30,
    /// 1시간봉
    H1,
    /// 4시간봉
    H4,
    /// 일봉
    D1,
    /// 주봉
    W1,
    /// 월봉
    MN1,
}

impl Timeframe {
    /// 이 타임프레임의 기간을 반환합니다.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.as_minutes() * 60)
    }

    /// 분 단위 값을 반환합니다.
    pub fn as_minutes(&self) -> u64 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::M30 => 30,
            Timeframe::H1 => 60,
            Timeframe::H4 => 4 * 60,
            Timeframe::D1 => 24 * 60,
            Timeframe::W1 => 7 * 24 * 60,
            Timeframe::MN1 => 30 * 24 * 60, // 근사값
        }
    }

    /// 터미널 표기 문자열을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
            Timeframe::W1 => "W1",
            Timeframe::MN1 => "MN1",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "M1" | "1m" => Ok(Timeframe::M1),
            "M5" | "5m" => Ok(Timeframe::M5),
            "M15" | "15m" => Ok(Timeframe::M15),
            "M30" | "30m" => Ok(Timeframe::M30),
            "H1" | "1h" => Ok(Timeframe::H1),
            "H4" | "4h" => Ok(Timeframe::H4),
            "D1" | "1d" => Ok(Timeframe::D1),
            "W1" | "1w" => Ok(Timeframe::W1),
            "MN1" | "1M" => Ok(Timeframe::MN1),
            other => Err(format!("Invalid timeframe: {}", other)),
        }
    }
}

impl TryFrom<String> for Timeframe {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_duration() {
        assert_eq!(Timeframe::M1.duration().as_secs(), 60);
        assert_eq!(Timeframe::H1.duration().as_secs(), 3600);
        assert_eq!(Timeframe::D1.as_minutes(), 1440);
    }

    #[test]
    fn test_timeframe_parse() {
        assert_eq!("M15".parse::<Timeframe>().unwrap(), Timeframe::M15);
        assert_eq!("4h".parse::<Timeframe>().unwrap(), Timeframe::H4);
        assert!("M7".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_timeframe_serde() {
        let json = serde_json::to_string(&Timeframe::H1).unwrap();
        assert_eq!(json, "\"H1\"");
        let tf: Timeframe = serde_json::from_str("\"M5\"").unwrap();
        assert_eq!(tf, Timeframe::M5);
    }
}
