//! 방향을 데이터로 다루기 위한 극성 헬퍼.
//!
//! 상승 플래그의 규칙을 고가/저가와 부등호를 바꿔 하락 플래그에 그대로 적용합니다.

use flagbot_core::{Bar, Direction, Price, PriceSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Polarity {
    Up,
    Down,
}

impl Polarity {
    pub(crate) fn of(direction: Direction) -> Option<Self> {
        match direction {
            Direction::Bullish => Some(Polarity::Up),
            Direction::Bearish => Some(Polarity::Down),
            Direction::Undefined => None,
        }
    }

    pub(crate) fn direction(self) -> Direction {
        match self {
            Polarity::Up => Direction::Bullish,
            Polarity::Down => Direction::Bearish,
        }
    }

    pub(crate) fn opposite(self) -> Self {
        match self {
            Polarity::Up => Polarity::Down,
            Polarity::Down => Polarity::Up,
        }
    }

    /// 극점 쪽 가격 (상승: 고가).
    pub(crate) fn pole(self, bar: &Bar) -> Price {
        match self {
            Polarity::Up => bar.high,
            Polarity::Down => bar.low,
        }
    }

    /// 반대쪽 가격 (상승: 저가).
    pub(crate) fn counter(self, bar: &Bar) -> Price {
        match self {
            Polarity::Up => bar.low,
            Polarity::Down => bar.high,
        }
    }

    /// `a`가 극점 방향으로 `b`를 엄격하게 넘어섰는지.
    pub(crate) fn beyond(self, a: Price, b: Price) -> bool {
        match self {
            Polarity::Up => a > b,
            Polarity::Down => a < b,
        }
    }

    /// 극점 후보가 되는 로컬 극값인지.
    pub(crate) fn is_anchor(self, series: &PriceSeries, index: usize) -> bool {
        match self {
            Polarity::Up => series.is_local_max(index),
            Polarity::Down => series.is_local_min(index),
        }
    }
}
