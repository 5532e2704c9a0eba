//! 가격 봉과 로컬 극값이 표시된 가격 시리즈.

use crate::error::{FlagError, FlagResult};
use crate::types::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 가격 봉. 플래그 탐지에는 고가와 저가만 필요합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// 봉 시작 시각
    pub time: DateTime<Utc>,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
}

impl Bar {
    /// 새 봉을 생성합니다.
    pub fn new(time: DateTime<Utc>, high: Price, low: Price) -> Self {
        Self { time, high, low }
    }
}

/// 시리즈 양 끝 봉의 극값 판정 방식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgePolicy {
    /// 양 끝 봉은 극값이 될 수 없습니다.
    #[default]
    Exclude,
    /// 양 끝 봉을 반대편 끝과 비교합니다 (순환 비교).
    Wrap,
}

/// 시간순으로 정렬된 불변 봉 시리즈.
///
/// 로컬 극값 표시는 생성 시와 `extend` 시 한 번씩만 계산됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<Bar>,
    local_max: Vec<bool>,
    local_min: Vec<bool>,
    edge_policy: EdgePolicy,
}

impl PriceSeries {
    /// 새 시리즈를 생성합니다.
    ///
    /// 봉 시각이 엄격하게 증가하지 않으면 `FlagError::Data`를 반환합니다.
    pub fn new(bars: Vec<Bar>, edge_policy: EdgePolicy) -> FlagResult<Self> {
        if let Some(pos) = bars.windows(2).position(|w| w[1].time <= w[0].time) {
            return Err(FlagError::Data(format!(
                "bar time not increasing at index {} ({} -> {})",
                pos + 1,
                bars[pos].time,
                bars[pos + 1].time
            )));
        }

        let (local_max, local_min) = compute_extrema(&bars, edge_policy);
        Ok(Self {
            bars,
            local_max,
            local_min,
            edge_policy,
        })
    }

    /// 빈 시리즈를 생성합니다.
    pub fn empty(edge_policy: EdgePolicy) -> Self {
        Self {
            bars: Vec::new(),
            local_max: Vec::new(),
            local_min: Vec::new(),
            edge_policy,
        }
    }

    /// 새 봉 묶음을 뒤에 추가하고 극값을 다시 계산합니다.
    ///
    /// 마지막 봉보다 늦지 않은 봉은 버려집니다. 추가된 봉 수를 반환합니다.
    pub fn extend(&mut self, batch: impl IntoIterator<Item = Bar>) -> usize {
        let before = self.bars.len();
        for bar in batch {
            let newer = self.bars.last().map_or(true, |last| bar.time > last.time);
            if newer {
                self.bars.push(bar);
            }
        }

        let appended = self.bars.len() - before;
        if appended > 0 {
            let (local_max, local_min) = compute_extrema(&self.bars, self.edge_policy);
            self.local_max = local_max;
            self.local_min = local_min;
        }
        appended
    }

    /// 최근 `max_bars`개만 남기고 오래된 봉을 버립니다. 버린 봉 수를 반환합니다.
    ///
    /// 인덱스는 남은 첫 봉부터 다시 매겨집니다.
    pub fn retain_last(&mut self, max_bars: usize) -> usize {
        let excess = self.bars.len().saturating_sub(max_bars);
        if excess > 0 {
            self.bars.drain(..excess);
            let (local_max, local_min) = compute_extrema(&self.bars, self.edge_policy);
            self.local_max = local_max;
            self.local_min = local_min;
        }
        excess
    }

    /// 첫 봉 시각.
    pub fn first_time(&self) -> Option<DateTime<Utc>> {
        self.bars.first().map(|b| b.time)
    }

    /// 봉 개수.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// 전체 봉 슬라이스.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// 인덱스의 봉.
    pub fn bar(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn high(&self, index: usize) -> Price {
        self.bars[index].high
    }

    pub fn low(&self, index: usize) -> Price {
        self.bars[index].low
    }

    pub fn time(&self, index: usize) -> DateTime<Utc> {
        self.bars[index].time
    }

    /// 마지막 봉 시각.
    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.bars.last().map(|b| b.time)
    }

    pub fn is_local_max(&self, index: usize) -> bool {
        self.local_max.get(index).copied().unwrap_or(false)
    }

    pub fn is_local_min(&self, index: usize) -> bool {
        self.local_min.get(index).copied().unwrap_or(false)
    }

    /// 극값 판정 방식.
    pub fn edge_policy(&self) -> EdgePolicy {
        self.edge_policy
    }

    /// 주어진 시각보다 엄격하게 늦은 첫 봉의 인덱스 (이진 탐색).
    ///
    /// 그런 봉이 없으면 `None`.
    pub fn first_index_after(&self, time: DateTime<Utc>) -> Option<usize> {
        let pos = self.bars.partition_point(|b| b.time <= time);
        (pos < self.bars.len()).then_some(pos)
    }
}

/// 봉 슬라이스의 로컬 최대/최소 표시를 계산합니다.
pub fn compute_extrema(bars: &[Bar], edge_policy: EdgePolicy) -> (Vec<bool>, Vec<bool>) {
    let n = bars.len();
    let mut local_max = vec![false; n];
    let mut local_min = vec![false; n];

    for i in 0..n {
        let (prev, next) = match edge_policy {
            EdgePolicy::Exclude => {
                if i == 0 || i + 1 >= n {
                    continue;
                }
                (i - 1, i + 1)
            }
            EdgePolicy::Wrap => ((i + n - 1) % n, (i + 1) % n),
        };

        let bar = &bars[i];
        local_max[i] = bar.high > bars[prev].high && bar.high > bars[next].high;
        local_min[i] = bar.low < bars[prev].low && bar.low < bars[next].low;
    }

    (local_max, local_min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn series(values: &[(i64, i64)], policy: EdgePolicy) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = values
            .iter()
            .enumerate()
            .map(|(i, (h, l))| {
                Bar::new(
                    start + Duration::minutes(i as i64),
                    Decimal::from(*h),
                    Decimal::from(*l),
                )
            })
            .collect();
        PriceSeries::new(bars, policy).unwrap()
    }

    #[test]
    fn test_extrema_exclude_edges() {
        let s = series(&[(10, 5), (12, 6), (11, 4), (13, 7)], EdgePolicy::Exclude);
        assert!(!s.is_local_max(0));
        assert!(s.is_local_max(1));
        assert!(s.is_local_min(2));
        assert!(!s.is_local_max(3));
    }

    #[test]
    fn test_extrema_wrap_edges() {
        // 마지막 봉(13)이 첫 봉(10)과 바로 앞 봉(11)보다 높음
        let s = series(&[(10, 5), (12, 6), (11, 4), (13, 7)], EdgePolicy::Wrap);
        assert!(s.is_local_max(3));
        assert!(!s.is_local_max(0));
    }

    #[test]
    fn test_equal_neighbors_not_extreme() {
        let s = series(&[(10, 5), (10, 5), (10, 5)], EdgePolicy::Exclude);
        assert!(!s.is_local_max(1));
        assert!(!s.is_local_min(1));
    }

    #[test]
    fn test_retain_last_drops_oldest_and_reindexes() {
        let mut s = series(&[(10, 5), (12, 6), (11, 4), (13, 7), (12, 6)], EdgePolicy::Exclude);
        let third = s.time(2);

        assert_eq!(s.retain_last(3), 2);
        assert_eq!(s.len(), 3);
        assert_eq!(s.first_time(), Some(third));
        // 새 첫 봉은 가장자리라 극값이 아님
        assert!(!s.is_local_min(0));
        assert!(s.is_local_max(1));

        assert_eq!(s.retain_last(10), 0);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_new_rejects_unordered() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = vec![
            Bar::new(t, Decimal::ONE, Decimal::ONE),
            Bar::new(t, Decimal::ONE, Decimal::ONE),
        ];
        assert!(matches!(
            PriceSeries::new(bars, EdgePolicy::Exclude),
            Err(FlagError::Data(_))
        ));
    }

    #[test]
    fn test_extend_drops_stale_bars() {
        let mut s = series(&[(10, 5), (12, 6), (11, 4)], EdgePolicy::Exclude);
        let last = s.last_time().unwrap();
        let appended = s.extend(vec![
            Bar::new(last, Decimal::from(99), Decimal::from(1)),
            Bar::new(last + Duration::minutes(1), Decimal::from(9), Decimal::from(5)),
        ]);
        assert_eq!(appended, 1);
        assert_eq!(s.len(), 4);
        // 이전 마지막 봉은 이제 양쪽 이웃을 가짐
        assert!(s.is_local_min(2));
    }

    #[test]
    fn test_first_index_after() {
        let s = series(&[(10, 5), (12, 6), (11, 4)], EdgePolicy::Exclude);
        assert_eq!(s.first_index_after(s.time(0)), Some(1));
        assert_eq!(s.first_index_after(s.time(0) - Duration::minutes(5)), Some(0));
        assert_eq!(s.first_index_after(s.time(2)), None);
    }
}
