//! 에러 타입 정의.

use thiserror::Error;

use signal_core::CoreError;
use signal_data::ProviderError;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 에러 (환경변수, 유니버스 파일)
    #[error("Configuration error: {0}")]
    Config(String),

    /// 데이터 소스 에러 (Provider 생성, 저장소 등)
    #[error("Data source error: {0}")]
    DataSource(#[from] ProviderError),
}

impl From<CoreError> for CollectorError {
    fn from(err: CoreError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
