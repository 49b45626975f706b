/// 재시도 스케줄러
/// 데이터 조회 실패 시 지수 백오프(기본 1초, 지터 없음)로 재시도를 예약한다.
/// 자동 연쇄 재시도는 하지 않는다. 한도 내에서 정확히 한 번만 예약하며,
/// 추가 재시도가 필요하면 호출자가 다시 schedule을 호출한다.
// region:    --- Imports
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::info;

// endregion: --- Imports

// region:    --- Backoff

/// 지연 상한에 대응하는 최대 시프트 (약 17분)
const MAX_BACKOFF_SHIFT: u32 = 10;

/// 재시도 지연 계산: 2^retry_count * 1000ms
/// 카운트가 커져도 지연은 2^10 * 1000ms에서 더 늘지 않는다.
pub fn backoff_delay(retry_count: u32) -> Duration {
    Duration::from_millis(1000u64 << retry_count.min(MAX_BACKOFF_SHIFT))
}

// endregion: --- Backoff

// region:    --- Retry Scheduler

/// 예약된 재시도 핸들. 타이머가 울리기 전에 취소할 수 있다.
pub struct RetryHandle {
    delay: Duration,
    task: JoinHandle<()>,
}

impl RetryHandle {
    /// 예약에 적용된 지연
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// 아직 실행되지 않은 재시도를 취소
    pub fn cancel(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// 재시도 카운터와 한도를 보관하는 스케줄러
pub struct RetryScheduler {
    retry_count: AtomicU32,
    max_retries: u32,
}

impl RetryScheduler {
    pub fn new(max_retries: u32) -> Self {
        Self::with_count(0, max_retries)
    }

    pub fn with_count(retry_count: u32, max_retries: u32) -> Self {
        Self {
            retry_count: AtomicU32::new(retry_count),
            max_retries,
        }
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count.load(Ordering::SeqCst)
    }

    /// 재시도 1회 예약
    /// 카운터가 한도 미만이면 지연 후 op를 한 번 실행하고 카운터를 올린다.
    /// 한도에 도달했으면 아무것도 예약하지 않고 None을 반환한다.
    pub fn schedule<F, Fut>(self: &std::sync::Arc<Self>, op: F) -> Option<RetryHandle>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let count = self.retry_count.load(Ordering::SeqCst);
        if count >= self.max_retries {
            info!(
                "{:<12} --> 재시도 한도 도달: count={} max={}",
                "Retry", count, self.max_retries
            );
            return None;
        }

        let delay = backoff_delay(count);
        info!(
            "{:<12} --> 재시도 예약: count={} delay={:?}",
            "Retry", count, delay
        );

        let scheduler = std::sync::Arc::clone(self);
        let task = tokio::spawn(async move {
            sleep(delay).await;
            // 카운터는 타이머가 울린 뒤에 올라간다
            scheduler.retry_count.fetch_add(1, Ordering::SeqCst);
            op().await;
        });

        Some(RetryHandle { delay, task })
    }
}

// endregion: --- Retry Scheduler
