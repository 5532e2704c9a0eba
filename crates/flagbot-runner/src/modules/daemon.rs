//! 타임프레임별 사이클을 주기적으로 실행하는 데몬.

use std::sync::Arc;
use std::time::Duration;

use flagbot_core::{AppConfig, PriceSeries, Timeframe};
use flagbot_execution::{OrderExecutor, PaperBroker, PaperConfig};
use flagbot_notification::{Notification, NotificationEvent, NotificationManager, TelegramSender};
use flagbot_risk::{EmpiricalOracle, RiskParams};
use futures::future::join_all;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::cycle::{CycleDeps, TimeframeState, TradingCycle};
use super::source::JsonFileSource;
use super::state::CycleState;
use super::store::{FlagRepository, InMemoryRepository};
use crate::error::RunnerResult;
use crate::stats::CycleStats;

/// 사이클 데몬.
///
/// 타임프레임별 사이클을 동시에 실행하고 모두 끝난 뒤 상태 변경분을 병합합니다.
/// 한 타임프레임의 실패는 다른 타임프레임에 영향을 주지 않습니다.
pub struct Daemon {
    cycle: TradingCycle,
    frames: Vec<TimeframeState>,
    state: CycleState,
    interval: Duration,
}

impl Daemon {
    /// 설정으로 기본 협력자(JSON 파일 소스, 스냅샷 저장소, 경험적 오라클,
    /// 모의 브로커, 텔레그램 알림)를 구성합니다.
    pub async fn from_config(config: AppConfig) -> RunnerResult<Self> {
        let config = Arc::new(config);

        let repository = Arc::new(InMemoryRepository::open(&config.storage.snapshot_path).await?);
        let labels = repository.labels().await?;
        let traded = repository.traded_dp_ids().await?;

        let oracle = Arc::new(EmpiricalOracle::new(config.risk.min_samples).with_labels(labels));

        let broker = Arc::new(PaperBroker::new(
            PaperConfig::new(config.account.paper_balance)
                .with_symbol(PaperConfig::fx_symbol(&config.trading.asset)),
        ));
        let executor = Arc::new(OrderExecutor::new(
            broker,
            RiskParams::from_config(&config.risk),
            config.trading.asset.clone(),
        ));

        let mut notifier = NotificationManager::new();
        if config.notifications.enabled {
            notifier.add_sender(TelegramSender::new(config.notifications.telegram.clone()));
        }

        let deps = CycleDeps {
            source: Arc::new(JsonFileSource::new(&config.storage.data_dir)),
            repository,
            oracle,
            executor,
            notifier: Arc::new(notifier),
        };

        Ok(Self::new(
            TradingCycle::new(deps, config),
            CycleState::with_traded(traded),
        ))
    }

    /// 구성된 사이클과 초기 상태로 데몬을 생성합니다.
    pub fn new(cycle: TradingCycle, state: CycleState) -> Self {
        let config = cycle.config();
        let frames = config
            .trading
            .timeframes
            .iter()
            .map(|&tf| TimeframeState::new(tf, PriceSeries::empty(config.detection.edge_policy)))
            .collect();
        let interval = Duration::from_secs(config.runtime.cycle_interval_secs.max(1));

        Self {
            cycle,
            frames,
            state,
            interval,
        }
    }

    pub fn state(&self) -> &CycleState {
        &self.state
    }

    pub fn frames(&self) -> &[TimeframeState] {
        &self.frames
    }

    /// 모든 타임프레임 사이클을 동시에 한 번 실행합니다.
    pub async fn run_once(
        &mut self,
        token: &CancellationToken,
    ) -> Vec<(Timeframe, RunnerResult<CycleStats>)> {
        let snapshot = self.state.clone();
        let cycle = &self.cycle;

        let results = join_all(self.frames.iter_mut().map(|frame| {
            let snapshot = &snapshot;
            async move {
                let timeframe = frame.timeframe;
                (timeframe, cycle.run(frame, snapshot, token).await)
            }
        }))
        .await;

        let mut summary = Vec::with_capacity(results.len());
        for (timeframe, (result, delta)) in results {
            self.state.merge(delta);
            match result {
                Ok(stats) => {
                    stats.log_summary();
                    summary.push((timeframe, Ok(stats)));
                }
                Err(e) if e.is_shutdown() => {
                    info!(%timeframe, "Cycle interrupted by shutdown");
                    summary.push((timeframe, Err(e)));
                }
                Err(e) => {
                    error!(%timeframe, error = %e, "Cycle failed");
                    summary.push((timeframe, Err(e)));
                }
            }
        }

        self.state.cycles += 1;
        summary
    }

    /// 종료 신호까지 주기적으로 사이클을 실행하고 최종 상태를 반환합니다.
    pub async fn run(mut self, token: CancellationToken) -> CycleState {
        let config = self.cycle.config();
        let timeframes: Vec<String> = config
            .trading
            .timeframes
            .iter()
            .map(|tf| tf.to_string())
            .collect();
        info!(
            asset = %config.trading.asset,
            timeframes = ?timeframes,
            interval_secs = self.interval.as_secs(),
            "Daemon started"
        );
        self.cycle
            .deps()
            .notifier
            .notify(&Notification::new(NotificationEvent::BotStarted {
                asset: config.trading.asset.clone(),
                timeframes,
            }))
            .await;

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!("Shutdown signal received, stopping daemon");
                    break;
                }
                _ = interval.tick() => {
                    let results = self.run_once(&token).await;
                    if results.iter().any(|(_, r)| matches!(r, Err(e) if e.is_shutdown())) {
                        break;
                    }
                }
            }
        }

        self.cycle
            .deps()
            .notifier
            .notify(&Notification::new(NotificationEvent::BotStopped {
                reason: "shutdown requested".to_string(),
            }))
            .await;
        info!(cycles = self.state.cycles, traded = self.state.traded.len(), "Daemon stopped");
        self.state
    }
}

/// Ctrl-C를 받으면 토큰을 취소하는 태스크를 띄웁니다.
pub fn shutdown_signal(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, requesting shutdown");
                token.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
        }
    })
}
