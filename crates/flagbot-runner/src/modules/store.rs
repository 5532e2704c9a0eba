//! 플래그/DP 저장소.
//!
//! 플래그와 DP의 기하 필드는 생성 후 변경되지 않습니다. 이후에는 가중치와
//! 결과(`backtest_reward`)만 갱신됩니다.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use async_trait::async_trait;
use flagbot_core::{
    BacktestLabel, DecisionPoint, Flag, FlagError, FlagResult, PositionRecord, Timeframe,
    WeightUpdate,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// 사이클이 사용하는 저장소 인터페이스.
#[async_trait]
pub trait FlagRepository: Send + Sync {
    /// 플래그를 저장합니다. 이미 있는 플래그는 건너뛰며, 새로 저장한 수를 반환합니다.
    async fn save_flags(&self, timeframe: Timeframe, flags: &[Flag]) -> FlagResult<usize>;

    /// 가중치 변경을 적용하고, 실제로 바뀐 DP 수를 반환합니다.
    async fn apply_weight_updates(
        &self,
        timeframe: Timeframe,
        updates: &[WeightUpdate],
    ) -> FlagResult<usize>;

    /// 결과 라벨을 저장합니다. 같은 DP의 라벨이 이미 있으면 건너뜁니다.
    async fn save_labels(&self, timeframe: Timeframe, labels: &[BacktestLabel]) -> FlagResult<usize>;

    /// 가중치가 0보다 큰 DP 목록.
    async fn active_dps(&self, timeframe: Timeframe) -> FlagResult<Vec<DecisionPoint>>;

    /// 주문한 DP 식별자.
    async fn traded_dp_ids(&self) -> FlagResult<BTreeSet<String>>;

    /// 포지션 기록을 추가합니다.
    async fn record_position(&self, record: &PositionRecord) -> FlagResult<()>;

    /// 확률 오라클용 전체 결과 라벨.
    async fn labels(&self) -> FlagResult<Vec<BacktestLabel>>;
}

/// 저장소 스냅샷 (JSON 직렬화 단위).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    /// 타임프레임별, 극점 시각(RFC3339)별 플래그
    pub flags: BTreeMap<String, BTreeMap<String, Flag>>,
    /// DP 식별자별 결과 라벨
    pub labels: BTreeMap<String, BacktestLabel>,
    /// 포지션 기록
    pub positions: Vec<PositionRecord>,
}

impl RepositorySnapshot {
    fn flags_mut(&mut self, timeframe: Timeframe) -> &mut BTreeMap<String, Flag> {
        self.flags.entry(timeframe.as_str().to_string()).or_default()
    }

    fn dps_mut(&mut self, timeframe: Timeframe) -> impl Iterator<Item = &mut DecisionPoint> {
        self.flags_mut(timeframe)
            .values_mut()
            .flat_map(|f| [&mut f.ftc, &mut f.el, &mut f.mpl])
    }
}

/// 메모리 저장소. 경로가 주어지면 변경마다 JSON 스냅샷을 기록합니다.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    snapshot: RwLock<RepositorySnapshot>,
    path: Option<PathBuf>,
    /// 남은 강제 실패 횟수 (테스트용)
    failures: RwLock<u32>,
}

impl InMemoryRepository {
    /// 파일 기록 없이 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 스냅샷 파일을 열어 생성합니다. 파일이 없으면 빈 저장소로 시작합니다.
    pub async fn open(path: impl Into<PathBuf>) -> FlagResult<Self> {
        let path = path.into();
        let snapshot = match tokio::fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RepositorySnapshot::default(),
            Err(e) => return Err(FlagError::Persistence(format!("{}: {e}", path.display()))),
        };
        info!(
            path = %path.display(),
            timeframes = snapshot.flags.len(),
            labels = snapshot.labels.len(),
            positions = snapshot.positions.len(),
            "Repository snapshot loaded"
        );
        Ok(Self {
            snapshot: RwLock::new(snapshot),
            path: Some(path),
            failures: RwLock::new(0),
        })
    }

    /// 다음 `count`번의 쓰기를 저장소 에러로 실패시킵니다.
    pub async fn fail_next(&self, count: u32) {
        *self.failures.write().await = count;
    }

    /// 현재 스냅샷 사본.
    pub async fn snapshot(&self) -> RepositorySnapshot {
        self.snapshot.read().await.clone()
    }

    async fn check_failure(&self) -> FlagResult<()> {
        let mut failures = self.failures.write().await;
        if *failures > 0 {
            *failures -= 1;
            return Err(FlagError::Persistence("injected failure".to_string()));
        }
        Ok(())
    }

    async fn persist(&self, snapshot: &RepositorySnapshot) -> FlagResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FlagError::Persistence(format!("{}: {e}", parent.display())))?;
        }
        let raw = serde_json::to_vec_pretty(snapshot)?;
        tokio::fs::write(path, raw)
            .await
            .map_err(|e| FlagError::Persistence(format!("{}: {e}", path.display())))
    }
}

#[async_trait]
impl FlagRepository for InMemoryRepository {
    async fn save_flags(&self, timeframe: Timeframe, flags: &[Flag]) -> FlagResult<usize> {
        self.check_failure().await?;
        let mut snapshot = self.snapshot.write().await;
        let book = snapshot.flags_mut(timeframe);

        let mut inserted = 0;
        for flag in flags {
            let key = flag.unique_point.to_rfc3339();
            if !book.contains_key(&key) {
                book.insert(key, flag.clone());
                inserted += 1;
            }
        }

        if inserted > 0 {
            self.persist(&snapshot).await?;
        }
        debug!(%timeframe, offered = flags.len(), inserted, "Flags saved");
        Ok(inserted)
    }

    async fn apply_weight_updates(
        &self,
        timeframe: Timeframe,
        updates: &[WeightUpdate],
    ) -> FlagResult<usize> {
        self.check_failure().await?;
        if updates.is_empty() {
            return Ok(0);
        }
        let mut snapshot = self.snapshot.write().await;
        let targets: BTreeMap<&str, u8> = updates
            .iter()
            .map(|u| (u.dp_id.as_str(), u.weight))
            .collect();

        let mut changed = 0;
        for dp in snapshot.dps_mut(timeframe) {
            let Some(id) = dp.id() else { continue };
            if let Some(&weight) = targets.get(id.as_str()) {
                if dp.weight != weight {
                    dp.weight = weight;
                    changed += 1;
                }
            }
        }

        if changed > 0 {
            self.persist(&snapshot).await?;
        }
        debug!(%timeframe, updates = updates.len(), changed, "Weight updates applied");
        Ok(changed)
    }

    async fn save_labels(&self, timeframe: Timeframe, labels: &[BacktestLabel]) -> FlagResult<usize> {
        self.check_failure().await?;
        if labels.is_empty() {
            return Ok(0);
        }
        let mut snapshot = self.snapshot.write().await;
        let rewards: BTreeMap<&str, f64> = labels
            .iter()
            .map(|l| (l.dp_id.as_str(), l.reward))
            .collect();
        for dp in snapshot.dps_mut(timeframe) {
            let Some(id) = dp.id() else { continue };
            if let Some(&reward) = rewards.get(id.as_str()) {
                dp.backtest_reward.get_or_insert(reward);
            }
        }

        let mut inserted = 0;
        for label in labels {
            if !snapshot.labels.contains_key(&label.dp_id) {
                snapshot.labels.insert(label.dp_id.clone(), label.clone());
                inserted += 1;
            }
        }

        self.persist(&snapshot).await?;
        debug!(%timeframe, inserted, "Labels saved");
        Ok(inserted)
    }

    async fn active_dps(&self, timeframe: Timeframe) -> FlagResult<Vec<DecisionPoint>> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot
            .flags
            .get(timeframe.as_str())
            .into_iter()
            .flat_map(|book| book.values())
            .flat_map(|f| f.decision_points())
            .filter(|dp| dp.is_active() && dp.id().is_some())
            .cloned()
            .collect())
    }

    async fn traded_dp_ids(&self) -> FlagResult<BTreeSet<String>> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot
            .positions
            .iter()
            .map(|p| p.traded_dp.clone())
            .collect())
    }

    async fn record_position(&self, record: &PositionRecord) -> FlagResult<()> {
        self.check_failure().await?;
        let mut snapshot = self.snapshot.write().await;
        snapshot.positions.push(record.clone());
        self.persist(&snapshot).await?;
        info!(dp_id = %record.traded_dp, order_id = %record.order_id, "Position recorded");
        Ok(())
    }

    async fn labels(&self) -> FlagResult<Vec<BacktestLabel>> {
        Ok(self.snapshot.read().await.labels.values().cloned().collect())
    }
}
