//! Provider/저장소 오류 타입.

use thiserror::Error;

/// Provider 호출 및 저장 관련 오류.
///
/// 어댑터 경계를 넘어 전파되지 않습니다. 오케스트레이터는 이 값을
/// 로그와 RunSummary 집계에만 사용합니다.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 네트워크/타임아웃 등 전송 오류 (재시도 대상)
    #[error("전송 오류 [{provider}]: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    /// 성공이 아닌 HTTP 상태
    #[error("HTTP {status} [{provider}]: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// 예상하지 못한 응답 형태
    #[error("응답 파싱 실패 [{provider}]: {message}")]
    Parse {
        provider: &'static str,
        message: String,
    },

    /// 실행당 요청 예산 소진
    #[error("요청 예산 소진 [{provider}]: 한도 {limit}건")]
    BudgetExhausted { provider: &'static str, limit: u32 },

    /// 자격증명 미설정
    #[error("설정되지 않은 Provider: {0}")]
    Unconfigured(&'static str),

    /// 저장소 오류
    #[error("저장소 오류: {0}")]
    Storage(String),
}

impl ProviderError {
    pub fn parse(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            provider,
            message: message.into(),
        }
    }

    /// 재시도 가능한 오류인지 확인합니다.
    ///
    /// 전송 오류, 5xx, 429만 재시도합니다.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// reqwest 오류를 Provider 오류로 변환합니다.
    pub fn from_reqwest(provider: &'static str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::parse(provider, err.to_string())
        } else {
            Self::Transport {
                provider,
                message: err.to_string(),
            }
        }
    }
}

impl From<sqlx::Error> for ProviderError {
    fn from(err: sqlx::Error) -> Self {
        ProviderError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
