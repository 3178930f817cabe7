//! 환경변수 기반 설정 모듈.

use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use signal_core::{ClassifierThresholds, Universe, DEFAULT_DESCRIPTION_MAX_CHARS};
use signal_data::{
    AdapterSettings, ClientSettings, RetryPolicy, ALPHA_VANTAGE_BASE_URL, FMP_BASE_URL,
    NEWS_API_BASE_URL, SEC_BASE_URL,
};

use crate::error::CollectorError;
use crate::Result;

/// 유니버스 파일 기본 경로.
const DEFAULT_UNIVERSE_FILE: &str = "config/universe.toml";

/// SEC User-Agent 기본값.
const DEFAULT_SEC_USER_AGENT: &str = "signal-collector admin@example.com";

/// Collector 전체 설정
#[derive(Debug)]
pub struct CollectorConfig {
    /// 데이터베이스 URL (`--dry-run`에서는 선택)
    pub database_url: Option<String>,
    /// Provider 자격증명
    pub credentials: ProviderCredentials,
    /// Provider 기본 URL
    pub endpoints: ProviderEndpoints,
    /// 수집 설정
    pub collect: CollectConfig,
    /// Provider별 실행당 요청 예산
    pub budgets: RequestBudgets,
    /// 분류 임계값
    pub thresholds: ClassifierThresholds,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
    /// 유니버스 설정 파일
    pub universe_file: Option<PathBuf>,
}

/// Provider 자격증명
#[derive(Debug)]
pub struct ProviderCredentials {
    /// FMP (내부자 매매, 보도자료)
    pub fmp_api_key: Option<SecretString>,
    /// Alpha Vantage (원자재)
    pub alpha_vantage_api_key: Option<SecretString>,
    /// NewsAPI (정책 뉴스)
    pub news_api_key: Option<SecretString>,
    /// SEC EDGAR 연락처 User-Agent
    pub sec_user_agent: String,
}

/// Provider 기본 URL
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub sec: String,
    pub fmp: String,
    pub alpha_vantage: String,
    pub news_api: String,
}

/// 수집 설정
#[derive(Debug, Clone)]
pub struct CollectConfig {
    /// 동시 실행 어댑터 호출 수
    pub concurrency: usize,
    /// 요청당 최대 시도 횟수
    pub max_attempts: u32,
    /// 재시도 간 딜레이 (밀리초)
    pub retry_delay_ms: u64,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 조회 기간 (일)
    pub lookback_days: i64,
    /// 설명 필드 최대 문자 수
    pub description_max_chars: usize,
}

/// Provider별 실행당 요청 예산
#[derive(Debug, Clone)]
pub struct RequestBudgets {
    pub sec: u32,
    pub fmp: u32,
    pub alpha_vantage: u32,
    pub yahoo: u32,
    pub news_api: u32,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 수집 주기 (분 단위)
    pub interval_minutes: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            credentials: ProviderCredentials {
                fmp_api_key: None,
                alpha_vantage_api_key: None,
                news_api_key: None,
                sec_user_agent: DEFAULT_SEC_USER_AGENT.to_string(),
            },
            endpoints: ProviderEndpoints {
                sec: SEC_BASE_URL.to_string(),
                fmp: FMP_BASE_URL.to_string(),
                alpha_vantage: ALPHA_VANTAGE_BASE_URL.to_string(),
                news_api: NEWS_API_BASE_URL.to_string(),
            },
            collect: CollectConfig {
                concurrency: 4,
                max_attempts: 3,
                retry_delay_ms: 500,
                request_timeout_secs: 30,
                lookback_days: 30,
                description_max_chars: DEFAULT_DESCRIPTION_MAX_CHARS,
            },
            budgets: RequestBudgets {
                sec: 1000,
                fmp: 250,
                alpha_vantage: 25,
                yahoo: 500,
                news_api: 100,
            },
            thresholds: ClassifierThresholds::default(),
            daemon: DaemonConfig {
                interval_minutes: 60,
            },
            universe_file: None,
        }
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let thresholds = ClassifierThresholds {
            insider_strong_buy_shares: env_var_parse(
                "INSIDER_STRONG_BUY_SHARES",
                defaults.thresholds.insider_strong_buy_shares,
            ),
            semiconductor_rally_pct: env_var_parse(
                "SEMICONDUCTOR_RALLY_PCT",
                defaults.thresholds.semiconductor_rally_pct,
            ),
            energy_surge_pct: env_var_parse("ENERGY_SURGE_PCT", defaults.thresholds.energy_surge_pct),
            tech_selloff_pct: env_var_parse("TECH_SELLOFF_PCT", defaults.thresholds.tech_selloff_pct),
        };

        let config = Self {
            database_url: env_var_opt("DATABASE_URL"),
            credentials: ProviderCredentials {
                fmp_api_key: env_var_secret("FMP_API_KEY"),
                alpha_vantage_api_key: env_var_secret("ALPHA_VANTAGE_API_KEY"),
                news_api_key: env_var_secret("NEWS_API_KEY"),
                sec_user_agent: env_var_opt("SEC_USER_AGENT")
                    .unwrap_or(defaults.credentials.sec_user_agent),
            },
            endpoints: ProviderEndpoints {
                sec: env_var_opt("SEC_BASE_URL").unwrap_or(defaults.endpoints.sec),
                fmp: env_var_opt("FMP_BASE_URL").unwrap_or(defaults.endpoints.fmp),
                alpha_vantage: env_var_opt("ALPHA_VANTAGE_BASE_URL")
                    .unwrap_or(defaults.endpoints.alpha_vantage),
                news_api: env_var_opt("NEWS_API_BASE_URL").unwrap_or(defaults.endpoints.news_api),
            },
            collect: CollectConfig {
                concurrency: env_var_parse("COLLECT_CONCURRENCY", defaults.collect.concurrency),
                max_attempts: env_var_parse("COLLECT_MAX_ATTEMPTS", defaults.collect.max_attempts),
                retry_delay_ms: env_var_parse(
                    "COLLECT_RETRY_DELAY_MS",
                    defaults.collect.retry_delay_ms,
                ),
                request_timeout_secs: env_var_parse(
                    "COLLECT_REQUEST_TIMEOUT_SECS",
                    defaults.collect.request_timeout_secs,
                ),
                lookback_days: env_var_parse("COLLECT_LOOKBACK_DAYS", defaults.collect.lookback_days),
                description_max_chars: env_var_parse(
                    "COLLECT_DESCRIPTION_MAX_CHARS",
                    defaults.collect.description_max_chars,
                ),
            },
            budgets: RequestBudgets {
                sec: env_var_parse("SEC_REQUEST_BUDGET", defaults.budgets.sec),
                fmp: env_var_parse("FMP_REQUEST_BUDGET", defaults.budgets.fmp),
                alpha_vantage: env_var_parse(
                    "ALPHA_VANTAGE_REQUEST_BUDGET",
                    defaults.budgets.alpha_vantage,
                ),
                yahoo: env_var_parse("YAHOO_REQUEST_BUDGET", defaults.budgets.yahoo),
                news_api: env_var_parse("NEWS_API_REQUEST_BUDGET", defaults.budgets.news_api),
            },
            thresholds,
            daemon: DaemonConfig {
                interval_minutes: env_var_parse(
                    "DAEMON_INTERVAL_MINUTES",
                    defaults.daemon.interval_minutes,
                ),
            },
            universe_file: env_var_opt("UNIVERSE_FILE").map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// 설정값 범위를 확인합니다.
    pub fn validate(&self) -> Result<()> {
        if self.collect.concurrency == 0 {
            return Err(CollectorError::Config(
                "COLLECT_CONCURRENCY는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.collect.max_attempts == 0 {
            return Err(CollectorError::Config(
                "COLLECT_MAX_ATTEMPTS는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.daemon.interval_minutes == 0 {
            return Err(CollectorError::Config(
                "DAEMON_INTERVAL_MINUTES는 1 이상이어야 합니다".to_string(),
            ));
        }
        Ok(())
    }

    /// DB 연결이 필요한 명령에서 URL을 요구합니다.
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            CollectorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })
    }

    /// 사용할 유니버스 파일 경로.
    ///
    /// `UNIVERSE_FILE`이 없으면 `config/universe.toml`이 존재할 때만 사용합니다.
    pub fn universe_path(&self) -> Option<PathBuf> {
        self.universe_file.clone().or_else(|| {
            let default = Path::new(DEFAULT_UNIVERSE_FILE);
            default.exists().then(|| default.to_path_buf())
        })
    }

    /// 유니버스를 로드합니다. 파일을 읽지 못하면 설정 에러입니다.
    pub fn load_universe(&self) -> Result<Universe> {
        Ok(Universe::load(self.universe_path().as_deref())?)
    }
}

impl CollectConfig {
    /// 재시도 정책
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    /// 예산이 지정된 HTTP 클라이언트 설정
    pub fn client_settings(&self, request_budget: u32) -> ClientSettings {
        ClientSettings {
            timeout: Duration::from_secs(self.request_timeout_secs),
            retry: self.retry_policy(),
            request_budget,
        }
    }

    /// 어댑터 공통 설정
    pub fn adapter_settings(&self) -> AdapterSettings {
        AdapterSettings {
            lookback_days: self.lookback_days,
            description_max_chars: self.description_max_chars,
        }
    }
}

impl DaemonConfig {
    /// 수집 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

/// 비어 있지 않은 환경변수 값
fn env_var_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 환경변수에서 API 키를 읽습니다.
fn env_var_secret(key: &str) -> Option<SecretString> {
    env_var_opt(key).map(|v| SecretString::new(v.into()))
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// 같은 비밀값을 가진 새 `SecretString`.
pub(crate) fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::new(secret.expose_secret().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CollectorConfig::default();

        assert_eq!(config.collect.concurrency, 4);
        assert_eq!(config.budgets.alpha_vantage, 25);
        assert_eq!(config.daemon.interval(), Duration::from_secs(3600));
        assert!(config.validate().is_ok());
        assert!(config.require_database_url().is_err());
    }

    #[test]
    fn test_missing_universe_file_is_config_error() {
        let config = CollectorConfig {
            universe_file: Some(PathBuf::from("config/does-not-exist.toml")),
            ..CollectorConfig::default()
        };

        assert!(matches!(config.load_universe(), Err(CollectorError::Config(_))));
    }

    #[test]
    fn test_client_settings_carry_budget_and_retry() {
        let config = CollectorConfig::default();
        let settings = config.collect.client_settings(7);

        assert_eq!(settings.request_budget, 7);
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.retry.delay, Duration::from_millis(500));
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = CollectorConfig::default();
        config.collect.concurrency = 0;

        assert!(matches!(config.validate(), Err(CollectorError::Config(_))));
    }

    #[test]
    fn test_env_var_parse_falls_back() {
        std::env::set_var("SIGNAL_TEST_PARSE_BAD", "not-a-number");
        assert_eq!(env_var_parse("SIGNAL_TEST_PARSE_BAD", 42u32), 42);

        std::env::set_var("SIGNAL_TEST_PARSE_OK", " 8 ");
        assert_eq!(env_var_parse("SIGNAL_TEST_PARSE_OK", 1usize), 8);

        assert_eq!(env_var_opt("SIGNAL_TEST_UNSET_VAR"), None);
    }

    #[test]
    fn test_copy_secret() {
        let key = SecretString::new("abc".into());
        assert_eq!(copy_secret(&key).expose_secret(), "abc");
    }
}
