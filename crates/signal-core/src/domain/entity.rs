//! 추적 대상 정의.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 추적 대상의 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// 개별 종목 티커
    Symbol,
    /// 섹터 (ETF/정책 뉴스 기준)
    Sector,
    /// 원자재
    Commodity,
}

/// 파이프라인이 모니터링하는 대상.
///
/// 실행 시작 시 한 번 구성되며 실행 중에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TrackedEntity {
    /// 종목 티커 (예: "NVDA")
    Symbol(String),
    /// 섹터 이름 (예: "Semiconductor")
    Sector(String),
    /// 원자재 심볼 (예: "WTI")
    Commodity(String),
}

impl TrackedEntity {
    /// 종목 대상을 생성합니다. 티커는 대문자로 정규화됩니다.
    pub fn symbol(ticker: impl AsRef<str>) -> Self {
        Self::Symbol(ticker.as_ref().trim().to_uppercase())
    }

    /// 섹터 대상을 생성합니다. 표기는 그대로 유지합니다.
    pub fn sector(name: impl AsRef<str>) -> Self {
        Self::Sector(name.as_ref().trim().to_string())
    }

    /// 원자재 대상을 생성합니다.
    pub fn commodity(symbol: impl AsRef<str>) -> Self {
        Self::Commodity(symbol.as_ref().trim().to_uppercase())
    }

    /// 식별자 문자열.
    pub fn id(&self) -> &str {
        match self {
            Self::Symbol(id) | Self::Sector(id) | Self::Commodity(id) => id,
        }
    }

    /// 대상 종류.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Symbol(_) => EntityKind::Symbol,
            Self::Sector(_) => EntityKind::Sector,
            Self::Commodity(_) => EntityKind::Commodity,
        }
    }
}

impl fmt::Display for TrackedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_normalize() {
        assert_eq!(TrackedEntity::symbol(" nvda "), TrackedEntity::Symbol("NVDA".into()));
        assert_eq!(TrackedEntity::sector("Energy").id(), "Energy");
        assert_eq!(TrackedEntity::commodity("wti").kind(), EntityKind::Commodity);
    }
}
