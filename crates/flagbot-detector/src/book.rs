//! 극점 시각 기준 플래그 저장소.
//!
//! 시리즈가 늘어날 때마다 재탐지를 해도 같은 극점의 플래그는 다시 내보내지 않습니다.

use chrono::{DateTime, Utc};
use flagbot_core::Flag;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// 탐지된 플래그 모음.
#[derive(Debug, Clone, Default)]
pub struct FlagBook {
    flags: BTreeMap<DateTime<Utc>, Flag>,
}

impl FlagBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// 플래그를 추가합니다. 같은 극점 시각이 이미 있으면 `false`를 반환하고 기존 것을 유지합니다.
    pub fn insert(&mut self, flag: Flag) -> bool {
        if self.flags.contains_key(&flag.unique_point) {
            debug!(unique_point = %flag.unique_point, "Flag already known");
            return false;
        }
        self.flags.insert(flag.unique_point, flag);
        true
    }

    pub fn get(&self, unique_point: &DateTime<Utc>) -> Option<&Flag> {
        self.flags.get(unique_point)
    }

    pub fn remove(&mut self, unique_point: &DateTime<Utc>) -> Option<Flag> {
        self.flags.remove(unique_point)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// 시각 순서로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.values()
    }

    /// 아직 모르는 극점 시각의 플래그만 골라냅니다. 장부는 바꾸지 않습니다.
    pub fn unseen(&self, detected: impl IntoIterator<Item = Flag>) -> Vec<Flag> {
        let mut fresh: Vec<Flag> = Vec::new();
        for flag in detected {
            let known = self.flags.contains_key(&flag.unique_point)
                || fresh.iter().any(|f| f.unique_point == flag.unique_point);
            if !known {
                fresh.push(flag);
            }
        }
        fresh
    }

    /// `cutoff`보다 이른 극점의 플래그를 버리고, 버린 개수를 반환합니다.
    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let kept = self.flags.split_off(&cutoff);
        let dropped = self.flags.len();
        self.flags = kept;
        if dropped > 0 {
            debug!(dropped, %cutoff, "Pruned flags older than the series window");
        }
        dropped
    }

    /// 새로 탐지된 플래그를 병합하고, 처음 본 플래그만 반환합니다.
    pub fn merge(&mut self, detected: impl IntoIterator<Item = Flag>) -> Vec<Flag> {
        let mut fresh = Vec::new();
        for flag in detected {
            if self.insert(flag.clone()) {
                fresh.push(flag);
            }
        }
        if !fresh.is_empty() {
            info!(new_flags = fresh.len(), total = self.flags.len(), "Flag book updated");
        }
        fresh
    }
}
