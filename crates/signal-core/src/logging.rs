//! 구조화 로깅 초기화.
//!
//! 수집기 바이너리가 시작할 때 한 번 호출합니다. 출력 형식:
//! - `pretty`: 터미널에서 직접 실행할 때
//! - `json`: 로그 수집기로 보낼 때 (이벤트 필드를 최상위로 평탄화)
//! - `compact`: 크론/데몬 로그 파일용 한 줄 형식

use std::str::FromStr;
use tracing_subscriber::fmt::{self, format::FmtSpan};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::error::CoreError;

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

impl FromStr for LogFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(CoreError::invalid_label("log format", s)),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` 지시어 (예: "info", "signal_data=debug")
    pub level: String,
    pub format: LogFormat,
    /// span 진입/종료 이벤트 출력
    pub spans: bool,
    /// 소스 파일/줄 번호 출력
    pub source_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            spans: false,
            source_location: false,
        }
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_spans(mut self, spans: bool) -> Self {
        self.spans = spans;
        self
    }

    /// `RUST_LOG`, `LOG_FORMAT`, `LOG_SPANS`에서 읽습니다. 잘못된 값은 기본값.
    pub fn from_env() -> Self {
        let env = |key: &str| std::env::var(key).ok();

        Self {
            level: env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            format: env("LOG_FORMAT")
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            spans: env("LOG_SPANS").is_some_and(|v| v == "1" || v == "true"),
            source_location: false,
        }
    }
}

/// 전역 subscriber를 설치합니다.
///
/// `RUST_LOG`가 있으면 `config.level`보다 우선합니다. 두 번째 호출은 에러입니다.
///
/// ```no_run
/// use signal_core::logging::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::new("signal_collector=debug").with_format(LogFormat::Json))
///     .expect("logging");
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let span_events = match config.spans {
        true => FmtSpan::NEW | FmtSpan::CLOSE,
        false => FmtSpan::NONE,
    };

    let base = fmt::layer()
        .with_file(config.source_location)
        .with_line_number(config.source_location)
        .with_span_events(span_events);

    let output = match config.format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Json => base.json().flatten_event(true).boxed(),
        LogFormat::Compact => base.compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()?;

    tracing::debug!(format = ?config.format, filter = %config.level, "로깅 초기화 완료");
    Ok(())
}

/// 수집 컨텍스트(대상, 소스) 필드를 가진 `info` span.
#[macro_export]
macro_rules! collect_span {
    ($name:expr, $entity:expr) => {
        tracing::info_span!($name, entity = %$entity)
    };
    ($name:expr, $entity:expr, $source:expr) => {
        tracing::info_span!($name, entity = %$entity, source = %$source)
    };
}
