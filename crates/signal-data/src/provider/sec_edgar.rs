//! SEC EDGAR 공시 어댑터.
//!
//! `GET /submissions/CIK{cik}.json`의 `filings.recent` 병렬 배열에서
//! 조회 기간 내의 8-K, 10-K, 10-Q 공시를 추출합니다.
//!
//! SEC는 연락처가 포함된 User-Agent 헤더를 요구합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use signal_core::{
    EntityKind, EventType, NormalizedEvent, RegulatorIds, SourceKind, TrackedEntity,
    UNKNOWN_FILER_CIK,
};

use super::client::{ClientSettings, ProviderClient};
use super::{AdapterSettings, ProviderAdapter};
use crate::error::{ProviderError, Result};

/// SEC 데이터 API 기본 URL.
pub const SEC_BASE_URL: &str = "https://data.sec.gov";

/// 공시 원문 아카이브 URL.
const SEC_ARCHIVE_URL: &str = "https://www.sec.gov/Archives/edgar/data";

/// 수집 대상 공시 양식.
const TRACKED_FORMS: &[&str] = &["8-K", "10-K", "10-Q"];

/// 대상당 최대 공시 수.
const MAX_FILINGS: usize = 20;

#[derive(Debug, Deserialize)]
struct Submissions {
    filings: Filings,
}

#[derive(Debug, Deserialize)]
struct Filings {
    recent: RecentFilings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RecentFilings {
    form: Vec<String>,
    filing_date: Vec<String>,
    primary_doc_description: Vec<String>,
    accession_number: Vec<String>,
    primary_document: Vec<String>,
}

/// SEC EDGAR 공시 어댑터.
pub struct SecFilingsAdapter {
    client: ProviderClient,
    user_agent: String,
    regulator_ids: Arc<RegulatorIds>,
    settings: AdapterSettings,
}

impl SecFilingsAdapter {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
        regulator_ids: Arc<RegulatorIds>,
        client_settings: &ClientSettings,
        settings: AdapterSettings,
    ) -> Result<Self> {
        Ok(Self {
            client: ProviderClient::new("sec_edgar", base_url, client_settings)?,
            user_agent: user_agent.into(),
            regulator_ids,
            settings,
        })
    }

    fn parse_recent(
        &self,
        symbol: &str,
        cik: &str,
        recent: &RecentFilings,
        since: NaiveDate,
    ) -> Vec<NormalizedEvent> {
        let mut events = Vec::new();

        for (idx, form) in recent.form.iter().enumerate() {
            if !TRACKED_FORMS.contains(&form.as_str()) {
                continue;
            }

            let Some(filed) = recent
                .filing_date
                .get(idx)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            else {
                continue;
            };
            if filed < since {
                continue;
            }

            let doc_description = recent
                .primary_doc_description
                .get(idx)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .unwrap_or(form.as_str());

            let mut event = NormalizedEvent::new(symbol, EventType::Filing)
                .with_title(form.clone())
                .with_description(
                    format!("{}: {}", form, doc_description),
                    self.settings.description_max_chars,
                )
                .with_occurred_at(filed.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()));

            if let (Some(accession), Some(document)) = (
                recent.accession_number.get(idx),
                recent.primary_document.get(idx),
            ) {
                event = event.with_url(archive_url(cik, accession, document));
            }

            events.push(event);
            if events.len() >= MAX_FILINGS {
                break;
            }
        }

        events
    }
}

/// `https://www.sec.gov/Archives/edgar/data/{cik}/{accession}/{document}`
fn archive_url(cik: &str, accession: &str, document: &str) -> String {
    let cik = cik.trim_start_matches('0');
    format!(
        "{}/{}/{}/{}",
        SEC_ARCHIVE_URL,
        cik,
        accession.replace('-', ""),
        document
    )
}

#[async_trait]
impl ProviderAdapter for SecFilingsAdapter {
    fn name(&self) -> &'static str {
        self.client.provider()
    }

    fn source(&self) -> SourceKind {
        SourceKind::Filing
    }

    fn accepts(&self, entity: &TrackedEntity) -> bool {
        entity.kind() == EntityKind::Symbol
    }

    fn is_configured(&self) -> bool {
        !self.user_agent.trim().is_empty()
    }

    fn remaining_budget(&self) -> Option<u32> {
        Some(self.client.budget().remaining())
    }

    fn reset_budget(&self) {
        self.client.budget().reset();
    }

    async fn try_fetch(&self, entity: &TrackedEntity) -> Result<Vec<NormalizedEvent>> {
        if !self.is_configured() {
            return Err(ProviderError::Unconfigured("sec_edgar"));
        }

        let symbol = entity.id();
        let cik = self.regulator_ids.lookup(symbol);
        if cik == UNKNOWN_FILER_CIK {
            tracing::debug!(symbol, "CIK 매핑 없음, SEC 조회 생략");
            return Ok(Vec::new());
        }

        let path = format!("/submissions/CIK{}.json", cik);
        let submissions: Submissions = self
            .client
            .get_json(&path, &[], &[("User-Agent", self.user_agent.as_str())])
            .await?;

        Ok(self.parse_recent(
            symbol,
            cik,
            &submissions.filings.recent,
            self.settings.lookback_start(),
        ))
    }
}
