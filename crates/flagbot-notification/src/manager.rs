//! 여러 전송기를 관리하는 알림 관리자.

use crate::types::{Notification, NotificationEvent, NotificationPriority, NotificationSender};
use flagbot_core::OrderIntent;
use tracing::{debug, warn};

/// 알림 관리자.
///
/// 전송 실패는 로그로만 남기고 호출자에게 전파하지 않습니다.
pub struct NotificationManager {
    senders: Vec<Box<dyn NotificationSender>>,
}

impl NotificationManager {
    /// 새 알림 관리자를 생성합니다.
    pub fn new() -> Self {
        Self {
            senders: Vec::new(),
        }
    }

    /// 알림 전송기를 추가합니다.
    pub fn add_sender<S: NotificationSender + 'static>(&mut self, sender: S) {
        self.senders.push(Box::new(sender));
    }

    /// 활성화된 전송기 수.
    pub fn enabled_count(&self) -> usize {
        self.senders.iter().filter(|s| s.is_enabled()).count()
    }

    /// 활성화된 모든 전송기로 알림을 전송합니다.
    ///
    /// 전송에 성공한 전송기 수를 반환합니다.
    pub async fn notify(&self, notification: &Notification) -> usize {
        let mut delivered = 0;

        for sender in self.senders.iter().filter(|s| s.is_enabled()) {
            match sender.send(notification).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    sender = sender.name(),
                    error = %e,
                    retryable = e.is_retryable(),
                    "Failed to send notification"
                ),
            }
        }

        debug!(id = %notification.id, delivered, "Notification dispatched");
        delivered
    }

    /// 주문 배치 알림을 전송합니다.
    pub async fn notify_order_placed(&self, intent: &OrderIntent, chance: f64) -> usize {
        let notification = Notification::new(NotificationEvent::OrderPlaced {
            symbol: intent.symbol.clone(),
            side: intent.side,
            price: intent.entry,
            stop_loss: intent.stop_loss,
            take_profit: intent.take_profit,
            volume: intent.volume,
            chance,
        });
        self.notify(&notification).await
    }

    /// 재시도 소진 알림을 전송합니다.
    pub async fn notify_retries_exhausted(
        &self,
        stage: &str,
        timeframe: &str,
        attempts: u32,
        message: &str,
    ) -> usize {
        let notification = Notification::new(NotificationEvent::RetriesExhausted {
            stage: stage.to_string(),
            timeframe: timeframe.to_string(),
            attempts,
            message: message.to_string(),
        })
        .with_priority(NotificationPriority::High);
        self.notify(&notification).await
    }
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NotificationError, NotificationResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSender {
        calls: Arc<AtomicUsize>,
        fail: bool,
        enabled: bool,
    }

    #[async_trait]
    impl NotificationSender for CountingSender {
        async fn send(&self, _notification: &Notification) -> NotificationResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(NotificationError::SendFailed("boom".to_string()))
            } else {
                Ok(())
            }
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut manager = NotificationManager::new();
        manager.add_sender(CountingSender { calls: calls.clone(), fail: true, enabled: true });
        manager.add_sender(CountingSender { calls: calls.clone(), fail: false, enabled: true });
        manager.add_sender(CountingSender { calls: calls.clone(), fail: false, enabled: false });

        let delivered = manager
            .notify_retries_exhausted("fetch", "M15", 3, "timeout")
            .await;

        assert_eq!(delivered, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(manager.enabled_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_manager() {
        let manager = NotificationManager::default();
        let n = Notification::new(NotificationEvent::BotStopped { reason: "test".to_string() });
        assert_eq!(manager.notify(&n).await, 0);
    }
}
