//! 사이클 간 전달되는 상태.
//!
//! 사이클은 상태의 스냅샷을 읽고 변경분을 별도로 반환합니다.
//! 데몬은 모든 타임프레임이 끝난 뒤 변경분을 순서대로 병합합니다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 거래 여부와 사이클 카운터.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleState {
    /// 이미 주문한 DP 식별자
    pub traded: BTreeSet<String>,
    /// 완료된 사이클 수
    pub cycles: u64,
}

impl CycleState {
    /// 저장소에서 불러온 거래 내역으로 상태를 생성합니다.
    pub fn with_traded(traded: impl IntoIterator<Item = String>) -> Self {
        Self {
            traded: traded.into_iter().collect(),
            cycles: 0,
        }
    }

    pub fn is_traded(&self, dp_id: &str) -> bool {
        self.traded.contains(dp_id)
    }

    /// 거래한 DP를 기록합니다. 처음이면 `true`.
    pub fn mark_traded(&mut self, dp_id: impl Into<String>) -> bool {
        self.traded.insert(dp_id.into())
    }

    /// 한 사이클의 변경분을 병합합니다.
    pub fn merge(&mut self, delta: CycleState) {
        self.traded.extend(delta.traded);
        self.cycles += delta.cycles;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_deltas() {
        let mut state = CycleState::with_traded(["FTC:a".to_string()]);

        let mut m5 = CycleState::default();
        m5.mark_traded("FTC:b");
        let mut m15 = CycleState::default();
        assert!(m15.mark_traded("FTC:a"));
        m15.cycles = 1;

        state.merge(m5);
        state.merge(m15);

        assert_eq!(state.traded.len(), 2);
        assert!(state.is_traded("FTC:b"));
        assert_eq!(state.cycles, 1);
    }
}
