//! 추적 유니버스와 정적 조회 테이블.
//!
//! 심볼 목록, CIK 매핑, 섹터 구성 종목, 섹터 ETF, 정책 뉴스 검색어를
//! 실행 시작 시 한 번 로드합니다. 로드 후에는 불변이며 `Arc`로 공유됩니다.
//!
//! # 설정 파일 예시
//!
//! ```toml
//! symbols = ["AAPL", "NVDA"]
//! sectors = ["Semiconductor", "Energy"]
//! commodities = ["WTI"]
//!
//! [regulator_ids]
//! AAPL = "0000320193"
//!
//! [sector_constituents]
//! SEMICONDUCTOR = ["NVDA", "AMD", "INTC", "TSM"]
//! ```
//!
//! 생략된 테이블은 내장 기본값을 사용합니다. 목록은 `SIGNAL__SYMBOLS=AAPL,NVDA`
//! 형태의 환경 변수로 덮어쓸 수 있습니다.

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::domain::TrackedEntity;
use crate::error::CoreResult;

/// 매핑에 없는 종목에 쓰이는 "알 수 없는 공시자" CIK.
pub const UNKNOWN_FILER_CIK: &str = "0000000000";

const DEFAULT_SYMBOLS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA", "NFLX", "ADBE", "UBER",
];

const DEFAULT_SECTORS: &[&str] = &[
    "Technology",
    "Energy",
    "Financial",
    "Healthcare",
    "Industrial",
    "Semiconductor",
];

const DEFAULT_COMMODITIES: &[&str] = &["WTI", "BRENT", "COPPER", "NATURAL_GAS"];

const DEFAULT_REGULATOR_IDS: &[(&str, &str)] = &[
    ("AAPL", "0000320193"),
    ("MSFT", "0000789019"),
    ("GOOGL", "0001652044"),
    ("AMZN", "0001018724"),
    ("NVDA", "0001045810"),
];

const DEFAULT_SECTOR_CONSTITUENTS: &[(&str, &[&str])] = &[
    ("SEMICONDUCTOR", &["NVDA", "AMD", "INTC", "TSM"]),
    ("AI", &["NVDA", "MSFT", "GOOGL", "META"]),
    ("CLOUD", &["MSFT", "AMZN", "GOOGL"]),
    ("AUTOMOTIVE", &["TSLA", "GM", "F"]),
    ("ENERGY", &["XOM", "CVX", "OXY"]),
    ("AEROSPACE", &["LMT", "RTX", "GD", "BA"]),
];

const DEFAULT_SECTOR_ETFS: &[(&str, &str)] = &[
    ("XLK", "Technology"),
    ("XLE", "Energy"),
    ("XLF", "Financial"),
    ("XLV", "Healthcare"),
    ("XLI", "Industrial"),
    ("SOXX", "Semiconductor"),
];

const DEFAULT_POLICY_KEYWORDS: &[(&str, &str)] = &[
    ("SEMICONDUCTOR", "\"CHIPS Act\" OR semiconductor export controls"),
    ("ENERGY", "\"Inflation Reduction Act\" energy OR oil sanctions"),
    ("TECHNOLOGY", "AI regulation OR tech antitrust"),
    ("FINANCIAL", "Federal Reserve bank regulation"),
    ("HEALTHCARE", "drug pricing OR Medicare policy"),
    ("INDUSTRIAL", "tariffs OR infrastructure bill"),
    ("AUTOMOTIVE", "EV tax credit"),
];

/// 심볼 → 규제기관 ID(SEC CIK) 매핑.
#[derive(Debug, Clone, Default)]
pub struct RegulatorIds(HashMap<String, String>);

impl RegulatorIds {
    /// 매핑을 생성합니다. 심볼은 대문자, CIK는 10자리로 정규화됩니다.
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self(
            entries
                .into_iter()
                .map(|(symbol, cik)| {
                    (
                        symbol.as_ref().trim().to_uppercase(),
                        format!("{:0>10}", cik.as_ref().trim()),
                    )
                })
                .collect(),
        )
    }

    /// CIK 조회. 매핑에 없으면 `UNKNOWN_FILER_CIK`를 반환합니다.
    pub fn lookup(&self, symbol: &str) -> &str {
        self.0
            .get(&symbol.trim().to_uppercase())
            .map(String::as_str)
            .unwrap_or(UNKNOWN_FILER_CIK)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 섹터 → 구성 종목 매핑. 섹터 키는 대소문자를 구분하지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct SectorConstituents(HashMap<String, BTreeSet<String>>);

impl SectorConstituents {
    pub fn new<I, K, V, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            entries
                .into_iter()
                .map(|(sector, symbols)| {
                    (
                        sector.as_ref().trim().to_uppercase(),
                        symbols
                            .into_iter()
                            .map(|s| s.as_ref().trim().to_uppercase())
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    /// 섹터의 구성 종목. 알 수 없는 섹터는 `None`.
    pub fn get(&self, sector: &str) -> Option<&BTreeSet<String>> {
        self.0.get(&sector.trim().to_uppercase())
    }
}

/// 섹터 ETF 목록 (ETF 심볼, 섹터 이름).
#[derive(Debug, Clone, Default)]
pub struct SectorEtfs(Vec<(String, String)>);

impl SectorEtfs {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut etfs: Vec<(String, String)> = entries
            .into_iter()
            .map(|(etf, sector)| {
                (
                    etf.as_ref().trim().to_uppercase(),
                    sector.as_ref().trim().to_string(),
                )
            })
            .collect();
        etfs.sort();
        Self(etfs)
    }

    /// 섹터를 추종하는 ETF 심볼.
    pub fn etf_for_sector(&self, sector: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, s)| s.eq_ignore_ascii_case(sector.trim()))
            .map(|(etf, _)| etf.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(etf, sector)| (etf.as_str(), sector.as_str()))
    }
}

/// 설정 파일 형태. 생략된 항목은 기본값으로 채웁니다.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UniverseFile {
    symbols: Option<Vec<String>>,
    sectors: Option<Vec<String>>,
    commodities: Option<Vec<String>>,
    regulator_ids: Option<HashMap<String, String>>,
    sector_constituents: Option<HashMap<String, Vec<String>>>,
    sector_etfs: Option<HashMap<String, String>>,
    policy_keywords: Option<HashMap<String, String>>,
}

/// 한 번의 실행에서 추적하는 대상과 정적 테이블.
#[derive(Debug, Clone)]
pub struct Universe {
    /// 추적 종목
    pub symbols: Vec<String>,
    /// 추적 섹터
    pub sectors: Vec<String>,
    /// 추적 원자재
    pub commodities: Vec<String>,
    /// 심볼 → CIK
    pub regulator_ids: RegulatorIds,
    /// 섹터 → 구성 종목
    pub sector_constituents: SectorConstituents,
    /// 섹터 ETF
    pub sector_etfs: SectorEtfs,
    policy_keywords: HashMap<String, String>,
}

impl Default for Universe {
    fn default() -> Self {
        Self::from_file(UniverseFile::default())
    }
}

impl Universe {
    /// 설정 파일(선택)과 `SIGNAL__` 환경 변수에서 유니버스를 로드합니다.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("SIGNAL")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("symbols")
                .with_list_parse_key("sectors")
                .with_list_parse_key("commodities"),
        );

        let file: UniverseFile = builder.build()?.try_deserialize()?;
        let universe = Self::from_file(file);

        tracing::debug!(
            symbols = universe.symbols.len(),
            sectors = universe.sectors.len(),
            commodities = universe.commodities.len(),
            "유니버스 로드 완료"
        );
        Ok(universe)
    }

    fn from_file(file: UniverseFile) -> Self {
        let list = |values: Option<Vec<String>>, default: &[&str]| -> Vec<String> {
            values.unwrap_or_else(|| default.iter().map(|s| s.to_string()).collect())
        };

        let regulator_ids = match file.regulator_ids {
            Some(map) => RegulatorIds::new(map),
            None => RegulatorIds::new(DEFAULT_REGULATOR_IDS.iter().copied()),
        };
        let sector_constituents = match file.sector_constituents {
            Some(map) => SectorConstituents::new(map),
            None => SectorConstituents::new(
                DEFAULT_SECTOR_CONSTITUENTS
                    .iter()
                    .map(|(sector, symbols)| (*sector, symbols.iter().copied())),
            ),
        };
        let sector_etfs = match file.sector_etfs {
            Some(map) => SectorEtfs::new(map),
            None => SectorEtfs::new(DEFAULT_SECTOR_ETFS.iter().copied()),
        };
        let policy_keywords = file
            .policy_keywords
            .unwrap_or_else(|| {
                DEFAULT_POLICY_KEYWORDS
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .into_iter()
            .map(|(sector, query)| (sector.to_uppercase(), query))
            .collect();

        Self {
            symbols: list(file.symbols, DEFAULT_SYMBOLS)
                .into_iter()
                .map(|s| s.trim().to_uppercase())
                .collect(),
            sectors: list(file.sectors, DEFAULT_SECTORS),
            commodities: list(file.commodities, DEFAULT_COMMODITIES)
                .into_iter()
                .map(|s| s.trim().to_uppercase())
                .collect(),
            regulator_ids,
            sector_constituents,
            sector_etfs,
            policy_keywords,
        }
    }

    /// 추적 종목 목록을 교체합니다 (CLI `--symbols`).
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.symbols = symbols
            .into_iter()
            .map(|s| s.as_ref().trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    /// 섹터의 정책 뉴스 검색어. 등록되지 않은 섹터는 `"{sector} policy"`.
    pub fn policy_query(&self, sector: &str) -> String {
        self.policy_keywords
            .get(&sector.trim().to_uppercase())
            .cloned()
            .unwrap_or_else(|| format!("{} policy", sector.trim()))
    }

    /// 실행 대상 전체 (종목 → 섹터 → 원자재 순).
    pub fn tracked_entities(&self) -> Vec<TrackedEntity> {
        self.symbols
            .iter()
            .map(TrackedEntity::symbol)
            .chain(self.sectors.iter().map(TrackedEntity::sector))
            .chain(self.commodities.iter().map(TrackedEntity::commodity))
            .collect()
    }
}
