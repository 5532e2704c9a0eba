//! 가격 포인트.

use crate::types::{DecimalExt, Price};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// 시리즈 위의 한 점 (가격, 시각, 봉 인덱스).
///
/// 가격이나 시각 중 하나라도 없으면 식별자가 없으며 저장하거나 참조할 수 없습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// 가격
    pub price: Option<Price>,
    /// 봉 시각
    pub time: Option<DateTime<Utc>>,
    /// 시리즈 내 인덱스
    pub index: Option<usize>,
}

impl Point {
    /// 완전한 포인트를 생성합니다.
    pub fn new(price: Price, time: DateTime<Utc>, index: usize) -> Self {
        Self {
            price: Some(price),
            time: Some(time),
            index: Some(index),
        }
    }

    /// 빈 포인트를 생성합니다.
    pub fn empty() -> Self {
        Self::default()
    }

    /// 결정적 식별자를 반환합니다.
    ///
    /// 형식은 `"{price}@{RFC3339}"`이며 가격의 후행 0은 제거됩니다.
    pub fn id(&self) -> Option<String> {
        match (self.price, self.time) {
            (Some(price), Some(time)) => Some(format!(
                "{}@{}",
                price.to_canonical_string(),
                time.to_rfc3339_opts(SecondsFormat::Secs, true)
            )),
            _ => None,
        }
    }

    /// 식별자를 가질 수 있는지 확인합니다.
    pub fn has_identity(&self) -> bool {
        self.price.is_some() && self.time.is_some()
    }
}
