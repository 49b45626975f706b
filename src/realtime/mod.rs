/// 실시간 변경 구독
/// 저장소 쓰기 이후 발행되는 변경 레코드를 구독자에게 푸시한다.
/// 구체 채널 객체 대신 {subscribe -> unsubscribe} 능력 인터페이스로 노출하고,
/// 구현은 인프로세스 브로드캐스트 허브를 쓴다.
// region:    --- Imports
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

// endregion: --- Imports

// region:    --- Change Model

/// 변경 이벤트 종류
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// 테이블 단위 변경 레코드
#[derive(Debug, Serialize, Clone)]
pub struct ChangeRecord {
    pub table: &'static str,
    pub kind: ChangeKind,
    pub row: serde_json::Value,
}

/// 컬럼 동등 비교 구독 필터
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    pub column: String,
    pub value: serde_json::Value,
}

impl ChangeFilter {
    fn matches(&self, row: &serde_json::Value) -> bool {
        row.get(&self.column) == Some(&self.value)
    }
}

// endregion: --- Change Model

// region:    --- Change Feed

pub type ChangeHandler = Box<dyn Fn(ChangeRecord) + Send + Sync>;

/// 실시간 변경 구독 능력
pub trait ChangeFeed: Send + Sync {
    fn subscribe(
        &self,
        table: &'static str,
        filter: Option<ChangeFilter>,
        handler: ChangeHandler,
    ) -> Subscription;
}

/// 구독 핸들. unsubscribe 또는 drop 시 수신 태스크가 중단된다.
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        self.task.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// endregion: --- Change Feed

// region:    --- Broadcast Hub

const HUB_CAPACITY: usize = 256;

/// 인프로세스 브로드캐스트 허브
/// 저장소 구현이 쓰기 이후 publish를 호출한다.
pub struct ChangeHub {
    sender: broadcast::Sender<ChangeRecord>,
}

impl ChangeHub {
    pub fn new() -> Arc<Self> {
        let (sender, _) = broadcast::channel(HUB_CAPACITY);
        Arc::new(Self { sender })
    }

    /// 변경 레코드 발행 (구독자가 없으면 무시)
    pub fn publish(&self, record: ChangeRecord) {
        debug!(
            "{:<12} --> 변경 발행: table={} kind={:?}",
            "Realtime", record.table, record.kind
        );
        let _ = self.sender.send(record);
    }
}

impl ChangeFeed for ChangeHub {
    fn subscribe(
        &self,
        table: &'static str,
        filter: Option<ChangeFilter>,
        handler: ChangeHandler,
    ) -> Subscription {
        let mut receiver = self.sender.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(record) => {
                        if record.table != table {
                            continue;
                        }
                        if let Some(filter) = &filter {
                            if !filter.matches(&record.row) {
                                continue;
                            }
                        }
                        handler(record);
                    }
                    // 수신이 밀려 유실된 경우 다음 레코드부터 계속
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Subscription { task }
    }
}

// endregion: --- Broadcast Hub
