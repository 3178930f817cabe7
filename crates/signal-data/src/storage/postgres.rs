//! PostgreSQL 시그널 저장소.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use tracing::{debug, info};

use async_trait::async_trait;
use signal_core::ClassifiedSignal;

use super::{SignalSink, SinkTable};
use crate::error::{ProviderError, Result};

/// 저장된 시그널 레코드 (두 테이블 공통 형태).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoredSignal {
    pub source_table: String,
    pub entity: String,
    pub event_type: String,
    pub signal: String,
    pub severity: String,
    pub affected: Vec<String>,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// PostgreSQL 기반 시그널 저장소.
#[derive(Debug, Clone)]
pub struct PgSignalStore {
    pool: PgPool,
}

impl PgSignalStore {
    /// 연결 풀을 생성합니다.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        info!("데이터베이스 연결 중...");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await?;

        info!("데이터베이스 연결 완료");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// `corporate_events`, `sector_news` 테이블을 생성합니다.
    pub async fn init_schema(&self) -> Result<()> {
        info!("시그널 테이블 마이그레이션 실행...");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ProviderError::Storage(e.to_string()))?;

        info!("마이그레이션 완료");
        Ok(())
    }

    /// 종목 또는 섹터의 최근 시그널 (두 테이블 통합, 최신순).
    pub async fn recent_signals(&self, entity: &str, limit: i64) -> Result<Vec<StoredSignal>> {
        let rows = sqlx::query_as::<_, StoredSignal>(
            r#"
            SELECT * FROM (
                SELECT 'corporate_events' AS source_table,
                       symbol AS entity,
                       event_type,
                       signal,
                       severity,
                       affected_symbols AS affected,
                       event_description AS description,
                       occurred_at,
                       created_at
                FROM corporate_events
                WHERE UPPER(symbol) = UPPER($1)
                UNION ALL
                SELECT 'sector_news' AS source_table,
                       sector AS entity,
                       event_type,
                       signal,
                       impact_level AS severity,
                       affected_stocks AS affected,
                       description,
                       occurred_at,
                       created_at
                FROM sector_news
                WHERE UPPER(sector) = UPPER($1)
            ) AS combined
            ORDER BY occurred_at DESC, created_at DESC
            LIMIT $2
            "#,
        )
        .bind(entity.trim())
        .bind(limit.max(1))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl SignalSink for PgSignalStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn insert_signal(&self, signal: &ClassifiedSignal) -> Result<()> {
        let table = SinkTable::for_event_type(&signal.event_type);
        let affected: Vec<String> = signal.affected_entities.iter().cloned().collect();
        let description = signal.description.clone().unwrap_or_default();

        let query = match table {
            SinkTable::CorporateEvents => {
                r#"
                INSERT INTO corporate_events
                    (symbol, event_type, event_description, signal, severity, affected_symbols, occurred_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#
            }
            SinkTable::SectorNews => {
                r#"
                INSERT INTO sector_news
                    (sector, event_type, description, signal, impact_level, affected_stocks, occurred_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#
            }
        };

        sqlx::query(query)
            .bind(&signal.entity)
            .bind(signal.event_type.as_str())
            .bind(&description)
            .bind(signal.signal.as_str())
            .bind(signal.severity.as_str())
            .bind(&affected)
            .bind(signal.occurred_at)
            .execute(&self.pool)
            .await?;

        debug!(
            table = table.as_str(),
            entity = %signal.entity,
            signal = %signal.signal,
            "시그널 저장"
        );
        Ok(())
    }
}
