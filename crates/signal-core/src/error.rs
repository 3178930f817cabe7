//! 핵심 도메인 에러 타입.

use thiserror::Error;

/// 핵심 도메인 에러.
///
/// 분류기 자체는 실패하지 않습니다. 이 타입은 레이블 파싱과
/// 유니버스 설정 로드에서만 발생합니다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 알 수 없는 레이블 (심각도, 시그널, 로그 형식 등)
    #[error("알 수 없는 {kind} 레이블: {value}")]
    InvalidLabel { kind: &'static str, value: String },

    /// 유니버스 설정 에러
    #[error("유니버스 설정 에러: {0}")]
    Universe(String),
}

impl CoreError {
    /// 레이블 파싱 에러를 생성합니다.
    pub fn invalid_label(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidLabel {
            kind,
            value: value.into(),
        }
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Universe(err.to_string())
    }
}

/// 핵심 도메인 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;
