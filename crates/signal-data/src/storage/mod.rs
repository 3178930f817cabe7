//! 시그널 저장소.
//!
//! - `PgSignalStore`: PostgreSQL (`corporate_events`, `sector_news`)
//! - `LogSink`: 저장 없이 로그만 남김 (dry-run)

pub mod postgres;

pub use postgres::{PgSignalStore, StoredSignal};

use async_trait::async_trait;
use tracing::info;

use signal_core::{ClassifiedSignal, EventType};

use crate::error::Result;

/// 시그널이 기록되는 테이블.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkTable {
    /// 종목 단위 이벤트 (공시, 내부자 매매, 보도자료)
    CorporateEvents,
    /// 섹터/시장 단위 이벤트 (섹터 성과, 정책 뉴스, 원자재)
    SectorNews,
}

impl SinkTable {
    /// 이벤트 유형별 대상 테이블.
    pub fn for_event_type(event_type: &EventType) -> Self {
        match event_type {
            EventType::SectorPerformance | EventType::PolicyNews | EventType::CommodityPrice => {
                Self::SectorNews
            }
            _ => Self::CorporateEvents,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CorporateEvents => "corporate_events",
            Self::SectorNews => "sector_news",
        }
    }
}

/// 분류된 시그널을 받는 저장소.
#[async_trait]
pub trait SignalSink: Send + Sync {
    fn name(&self) -> &'static str;

    /// 시그널 하나를 기록합니다.
    async fn insert_signal(&self, signal: &ClassifiedSignal) -> Result<()>;
}

/// 로그 전용 저장소.
#[derive(Debug, Default, Clone)]
pub struct LogSink;

#[async_trait]
impl SignalSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn insert_signal(&self, signal: &ClassifiedSignal) -> Result<()> {
        info!(
            table = SinkTable::for_event_type(&signal.event_type).as_str(),
            entity = %signal.entity,
            event_type = %signal.event_type,
            signal = %signal.signal,
            severity = %signal.severity,
            affected = ?signal.affected_entities,
            "[dry-run] 시그널"
        );
        Ok(())
    }
}
