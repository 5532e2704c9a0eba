//! 플래그 및 거래 방향.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 플래그 방향.
///
/// 극점과 저점이 같은 봉에 있으면 방향을 결정할 수 없으므로 `Undefined`가 됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// 상승
    Bullish,
    /// 하락
    Bearish,
    /// 미정
    Undefined,
}

impl Direction {
    /// 반대 방향을 반환합니다. `Undefined`는 그대로입니다.
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Bullish => Direction::Bearish,
            Direction::Bearish => Direction::Bullish,
            Direction::Undefined => Direction::Undefined,
        }
    }

    /// 방향이 결정되었는지 확인합니다.
    pub fn is_defined(&self) -> bool {
        !matches!(self, Direction::Undefined)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Bullish => write!(f, "Bullish"),
            Direction::Bearish => write!(f, "Bearish"),
            Direction::Undefined => write!(f, "Undefined"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite() {
        assert_eq!(Direction::Bullish.opposite(), Direction::Bearish);
        assert_eq!(Direction::Bearish.opposite(), Direction::Bullish);
        assert_eq!(Direction::Undefined.opposite(), Direction::Undefined);
    }
}
