//! 타임프레임 하나의 트레이딩 사이클.
//!
//! `Fetch → Detect → Validate → Size/Decide → Persist/Execute` 순서로 진행하며,
//! 각 단계 사이에서 종료 신호를 확인합니다. 외부 I/O는 모두 재시도 정책을
//! 거칩니다. 탐지/검증/사이징은 한 사이클 동안 고정된 시리즈 스냅샷 위의
//! 동기 계산입니다.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use flagbot_backtest::{validate_dp, ValidationFaultRecord, ValidationReport};
use flagbot_core::{
    cycle_span, AppConfig, DecisionPoint, DpKind, FlagError, PriceSeries, Timeframe,
};
use flagbot_detector::{FlagBook, FlagDetector};
use flagbot_execution::{ExecutionOutcome, OrderExecutor};
use flagbot_notification::NotificationManager;
use flagbot_risk::{select_reward_ratio, ProbabilityOracle};
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use super::retry::{with_retry, RetryPolicy};
use super::session::TradingSession;
use super::source::MarketDataSource;
use super::state::CycleState;
use super::store::FlagRepository;
use crate::error::{RunnerError, RunnerResult};
use crate::stats::CycleStats;

/// 사이클이 사용하는 외부 협력자.
#[derive(Clone)]
pub struct CycleDeps {
    pub source: Arc<dyn MarketDataSource>,
    pub repository: Arc<dyn FlagRepository>,
    pub oracle: Arc<dyn ProbabilityOracle>,
    pub executor: Arc<OrderExecutor>,
    pub notifier: Arc<NotificationManager>,
}

/// 타임프레임별로 사이클 사이에 유지되는 데이터.
#[derive(Debug, Clone)]
pub struct TimeframeState {
    pub timeframe: Timeframe,
    pub series: PriceSeries,
    pub book: FlagBook,
}

impl TimeframeState {
    pub fn new(timeframe: Timeframe, series: PriceSeries) -> Self {
        Self {
            timeframe,
            series,
            book: FlagBook::new(),
        }
    }
}

/// 단일 타임프레임 사이클 실행기.
pub struct TradingCycle {
    deps: CycleDeps,
    config: Arc<AppConfig>,
    detector: FlagDetector,
    retry: RetryPolicy,
    session: TradingSession,
}

impl TradingCycle {
    pub fn new(deps: CycleDeps, config: Arc<AppConfig>) -> Self {
        Self {
            detector: FlagDetector::new(config.detection.clone()),
            retry: RetryPolicy::from_config(&config.runtime),
            session: TradingSession::from_config(&config.runtime.trading_hours),
            deps,
            config,
        }
    }

    /// 거래 시간대를 바꿉니다.
    pub fn with_session(mut self, session: TradingSession) -> Self {
        self.session = session;
        self
    }

    /// 재시도 정책을 바꿉니다.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn deps(&self) -> &CycleDeps {
        &self.deps
    }

    /// 사이클 한 번을 실행합니다.
    ///
    /// `state`는 사이클 시작 시점의 스냅샷이며, 이번 사이클에서 생긴 변경분은
    /// 사이클이 실패해도 함께 반환됩니다. 호출자는 변경분을 항상 병합해야 합니다.
    pub async fn run(
        &self,
        frame: &mut TimeframeState,
        state: &CycleState,
        token: &CancellationToken,
    ) -> (RunnerResult<CycleStats>, CycleState) {
        let timeframe = frame.timeframe;
        let span = cycle_span!(timeframe);
        async move {
            let started = Instant::now();
            let mut stats = CycleStats::new(timeframe);
            let mut delta = CycleState::default();

            let result = self
                .run_stages(frame, state, token, &mut stats, &mut delta)
                .await;
            stats.elapsed = started.elapsed();

            let result = match result {
                Ok(()) => Ok(stats),
                Err(e) if e.is_skip() => {
                    debug!(reason = %e, "Cycle skipped");
                    stats.decision_skipped.get_or_insert_with(|| e.to_string());
                    Ok(stats)
                }
                Err(RunnerError::RetriesExhausted { stage, attempts, source }) => {
                    self.deps
                        .notifier
                        .notify_retries_exhausted(stage, timeframe.as_str(), attempts, &source.to_string())
                        .await;
                    Err(RunnerError::RetriesExhausted { stage, attempts, source })
                }
                Err(e) => Err(e),
            };

            (result, delta)
        }
        .instrument(span)
        .await
    }

    async fn run_stages(
        &self,
        frame: &mut TimeframeState,
        state: &CycleState,
        token: &CancellationToken,
        stats: &mut CycleStats,
        delta: &mut CycleState,
    ) -> RunnerResult<()> {
        let timeframe = frame.timeframe;

        // Fetch
        self.fetch(frame, token, stats).await?;
        ensure_running(token)?;

        // Detect
        self.detect(frame, token, stats).await?;
        ensure_running(token)?;

        // Validate
        let snapshot = Arc::new(frame.series.clone());
        let active = with_retry(self.retry, token, "load", || {
            self.deps.repository.active_dps(timeframe)
        })
        .await?;
        let report = validate_concurrently(&active, snapshot).await;
        stats.validated = active.len();
        stats.tradeable = report.tradeable.len();
        stats.invalidated = report.weight_updates.len();
        stats.faults = report.faults.len();
        self.persist_report(timeframe, &report, token).await?;
        ensure_running(token)?;

        // Size/Decide → Persist/Execute
        let now = Utc::now();
        if !self.session.is_open(now) {
            debug!(%now, "Outside trading hours, skipping decisions");
            stats.decision_skipped = Some("outside trading hours".to_string());
            return Ok(());
        }

        let by_id: HashMap<String, &DecisionPoint> = active
            .iter()
            .filter_map(|dp| dp.id().map(|id| (id, dp)))
            .collect();

        for dp_id in &report.tradeable {
            let Some(dp) = by_id.get(dp_id).copied() else {
                continue;
            };
            if dp.kind != DpKind::Ftc || state.is_traded(dp_id) || delta.is_traded(dp_id) {
                continue;
            }
            ensure_running(token)?;

            match self.decide_and_execute(dp, dp_id, token, delta).await {
                Ok(true) => stats.orders_placed += 1,
                Ok(false) => {}
                Err(RunnerError::Core(FlagError::OracleUnavailable(reason))) => {
                    info!(%reason, "Probability oracle unavailable, skipping decisions");
                    stats.decision_skipped = Some(reason);
                    break;
                }
                Err(RunnerError::Core(FlagError::Sizing(reason))) => {
                    warn!(dp_id = %dp_id, %reason, "Lot sizing failed");
                }
                Err(RunnerError::Core(FlagError::Execution(reason))) => {
                    warn!(dp_id = %dp_id, %reason, "Order rejected");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    async fn fetch(
        &self,
        frame: &mut TimeframeState,
        token: &CancellationToken,
        stats: &mut CycleStats,
    ) -> RunnerResult<()> {
        let asset = self.config.trading.asset.as_str();
        let count = self.config.trading.bars_per_fetch;
        let timeframe = frame.timeframe;

        let batch = with_retry(self.retry, token, "fetch", || {
            self.deps.source.fetch(asset, timeframe, count)
        })
        .await?;

        if frame.series.is_empty() {
            frame.series = PriceSeries::new(batch, self.config.detection.edge_policy)?;
            stats.new_bars = frame.series.len();
        } else {
            stats.new_bars = frame.series.extend(batch);
        }

        if stats.new_bars == 0 {
            return Err(FlagError::NoData(format!("no new {timeframe} bars")).into());
        }

        let dropped = frame.series.retain_last(self.config.detection.max_bars);
        if let Some(first) = frame.series.first_time().filter(|_| dropped > 0) {
            let pruned = frame.book.prune_before(first);
            debug!(dropped, pruned, "Series window trimmed");
        }
        debug!(new_bars = stats.new_bars, total = frame.series.len(), "Bars fetched");
        Ok(())
    }

    async fn detect(
        &self,
        frame: &mut TimeframeState,
        token: &CancellationToken,
        stats: &mut CycleStats,
    ) -> RunnerResult<()> {
        let outcome = self.detector.detect(&frame.series);
        stats.detected_flags = outcome.flags.len();
        stats.rejections = outcome.rejections.len();

        // 장부에는 저장에 성공한 플래그만 올린다
        let fresh = frame.book.unseen(outcome.flags);
        if fresh.is_empty() {
            return Ok(());
        }

        let timeframe = frame.timeframe;
        stats.new_flags = with_retry(self.retry, token, "persist", || {
            self.deps.repository.save_flags(timeframe, &fresh)
        })
        .await?;
        frame.book.merge(fresh);
        info!(new_flags = stats.new_flags, "Flags persisted");
        Ok(())
    }

    async fn persist_report(
        &self,
        timeframe: Timeframe,
        report: &ValidationReport,
        token: &CancellationToken,
    ) -> RunnerResult<()> {
        if !report.weight_updates.is_empty() {
            with_retry(self.retry, token, "persist", || {
                self.deps
                    .repository
                    .apply_weight_updates(timeframe, &report.weight_updates)
            })
            .await?;
        }
        if !report.labels.is_empty() {
            with_retry(self.retry, token, "persist", || {
                self.deps.repository.save_labels(timeframe, &report.labels)
            })
            .await?;
            self.deps.oracle.observe(&report.labels);
        }
        Ok(())
    }

    /// 확률 추정 → RR 선택 → 주문. 주문했으면 `true`.
    ///
    /// 주문이 접수되면 포지션 기록보다 먼저 `delta`에 거래 완료로 표시합니다.
    async fn decide_and_execute(
        &self,
        dp: &DecisionPoint,
        dp_id: &str,
        token: &CancellationToken,
        delta: &mut CycleState,
    ) -> RunnerResult<bool> {
        let risk = &self.config.risk;
        let probabilities = with_retry(self.retry, token, "oracle", || {
            self.deps.oracle.estimate(dp, &risk.rr_levels)
        })
        .await?;

        let decision = match select_reward_ratio(
            &risk.rr_levels,
            &probabilities,
            risk.min_prob,
            risk.monotonic_tolerance,
        ) {
            Ok(decision) => decision,
            Err(rejection) => {
                debug!(dp_id, ?rejection, "Trade candidate rejected");
                return Ok(false);
            }
        };

        let outcome = with_retry(self.retry, token, "execute", || async {
            self.deps
                .executor
                .execute(dp, decision)
                .await
                .map_err(FlagError::from)
        })
        .await?;

        let (intent, record) = match outcome {
            ExecutionOutcome::Placed { intent, record } => (intent, record),
            ExecutionOutcome::NoRisk { .. } => return Ok(false),
        };
        delta.mark_traded(dp_id);

        with_retry(self.retry, token, "persist", || {
            self.deps.repository.record_position(&record)
        })
        .await?;

        self.deps
            .notifier
            .notify_order_placed(&intent, decision.probability)
            .await;
        Ok(true)
    }
}

/// DP마다 독립 태스크로 검증하고, 결과를 태스크 순서대로 병합합니다.
///
/// 모든 태스크는 같은 시리즈 스냅샷을 읽습니다. 패닉한 태스크는 해당 DP의
/// 검증 실패로만 기록됩니다.
pub async fn validate_concurrently(
    dps: &[DecisionPoint],
    snapshot: Arc<PriceSeries>,
) -> ValidationReport {
    let handles = dps.iter().cloned().map(|dp| {
        let series = Arc::clone(&snapshot);
        tokio::spawn(async move { validate_dp(&dp, &series) })
    });
    let results = join_all(handles).await;

    let mut report = ValidationReport::default();
    for (dp, result) in dps.iter().zip(results) {
        match result {
            Ok(outcome) => report.absorb(outcome),
            Err(join_error) => {
                let dp_id = dp.id().unwrap_or_default();
                warn!(%dp_id, error = %join_error, "Validation task failed");
                report.faults.push(ValidationFaultRecord {
                    dp_id,
                    reason: join_error.to_string(),
                });
            }
        }
    }
    report
}

fn ensure_running(token: &CancellationToken) -> RunnerResult<()> {
    if token.is_cancelled() {
        return Err(FlagError::ShutdownRequested.into());
    }
    Ok(())
}
