//! NewsAPI 정책 뉴스 어댑터.
//!
//! 섹터별 정책 검색어로 `GET /v2/everything`을 조회해 최신 기사를
//! `POLICY_NEWS` 이벤트로 변환합니다. 검색어는 `Universe::policy_query`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;

use signal_core::{EntityKind, EventType, NormalizedEvent, SourceKind, TrackedEntity, Universe};

use super::client::{ClientSettings, ProviderClient};
use super::{parse_provider_time, AdapterSettings, ProviderAdapter};
use crate::error::{ProviderError, Result};

/// NewsAPI 기본 URL.
pub const NEWS_API_BASE_URL: &str = "https://newsapi.org";

const PROVIDER: &str = "news_api";

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
}

/// NewsAPI 정책 뉴스 어댑터.
pub struct PolicyNewsAdapter {
    client: ProviderClient,
    api_key: Option<SecretString>,
    universe: Arc<Universe>,
    settings: AdapterSettings,
}

impl PolicyNewsAdapter {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        universe: Arc<Universe>,
        client_settings: &ClientSettings,
        settings: AdapterSettings,
    ) -> Result<Self> {
        Ok(Self {
            client: ProviderClient::new(PROVIDER, base_url, client_settings)?,
            api_key: api_key.filter(|key| !key.expose_secret().trim().is_empty()),
            universe,
            settings,
        })
    }
}

#[async_trait]
impl ProviderAdapter for PolicyNewsAdapter {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn source(&self) -> SourceKind {
        SourceKind::PolicyNews
    }

    fn accepts(&self, entity: &TrackedEntity) -> bool {
        entity.kind() == EntityKind::Sector
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn remaining_budget(&self) -> Option<u32> {
        Some(self.client.budget().remaining())
    }

    fn reset_budget(&self) {
        self.client.budget().reset();
    }

    async fn try_fetch(&self, entity: &TrackedEntity) -> Result<Vec<NormalizedEvent>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(ProviderError::Unconfigured(PROVIDER))?;

        let sector = entity.id();
        let query = self.universe.policy_query(sector);
        let from = self.settings.lookback_start().format("%Y-%m-%d").to_string();

        let response: EverythingResponse = self
            .client
            .get_json(
                "/v2/everything",
                &[
                    ("q", query.as_str()),
                    ("from", from.as_str()),
                    ("sortBy", "publishedAt"),
                    ("language", "en"),
                    ("pageSize", "10"),
                ],
                &[("X-Api-Key", api_key.expose_secret())],
            )
            .await?;

        if response.status != "ok" {
            return Err(ProviderError::parse(
                PROVIDER,
                response.message.unwrap_or(response.status),
            ));
        }

        Ok(response
            .articles
            .into_iter()
            .filter_map(|article| {
                let title = article.title.filter(|t| !t.trim().is_empty())?;
                let body = article
                    .description
                    .filter(|d| !d.trim().is_empty())
                    .or(article.content)
                    .unwrap_or_else(|| title.clone());

                let mut event = NormalizedEvent::new(sector, EventType::PolicyNews)
                    .with_sector(sector)
                    .with_title(title)
                    .with_description(body, self.settings.description_max_chars)
                    .with_occurred_at(
                        article.published_at.as_deref().and_then(parse_provider_time),
                    );
                if let Some(url) = article.url {
                    event = event.with_url(url);
                }
                Some(event)
            })
            .collect())
    }
}
