//! 이름 필터 -- 컨테이너/프로젝트 포함 여부 판정
//!
//! 컨테이너 이름과 compose 프로젝트 이름에 동일한 규칙을 적용합니다.
//! - `only`가 비어있지 않으면 이름이 반드시 포함되어야 합니다.
//! - `exclude`에 이름이 있으면 제외됩니다.
//! - 매칭은 정확한 문자열 비교이며 대소문자를 구분합니다.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// 이름 목록 문자열을 토큰으로 분리합니다.
///
/// 쉼표, 세미콜론, 공백(개행 포함)을 모두 구분자로 취급하며
/// 빈 토큰은 버립니다.
///
/// ```
/// use recast_core::filter::parse_names;
///
/// assert_eq!(parse_names("web, db;cache  worker"), vec!["web", "db", "cache", "worker"]);
/// assert!(parse_names(" ,; ").is_empty());
/// ```
pub fn parse_names(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

/// 이름이 포함 대상인지 판정합니다.
///
/// 두 목록이 모두 비어있으면 모든 이름을 포함합니다.
pub fn include(name: &str, only: &[String], exclude: &[String]) -> bool {
    if !only.is_empty() && !only.iter().any(|n| n == name) {
        return false;
    }
    !exclude.iter().any(|n| n == name)
}

/// 설정 파일/CLI에서 받는 이름 목록
///
/// TOML에서는 `"a,b c"` 같은 문자열과 `["a", "b"]` 배열을 모두 허용합니다.
/// 배열의 각 원소도 다시 토큰으로 분리됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NameList(Vec<String>);

impl NameList {
    /// 토큰 목록으로 생성합니다.
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    /// 구분자가 섞인 문자열에서 생성합니다.
    pub fn parse(raw: &str) -> Self {
        Self(parse_names(raw))
    }

    /// 토큰 슬라이스를 반환합니다.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NameList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

impl<'de> Deserialize<'de> for NameList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            List(Vec<String>),
        }

        let names = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => parse_names(&text),
            Raw::List(items) => items.iter().flat_map(|item| parse_names(item)).collect(),
        };
        Ok(Self(names))
    }
}

/// only/exclude 한 쌍으로 이루어진 필터
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFilter {
    only: Vec<String>,
    exclude: Vec<String>,
}

impl NameFilter {
    /// 필터를 생성합니다.
    pub fn new(only: &NameList, exclude: &NameList) -> Self {
        Self {
            only: only.as_slice().to_vec(),
            exclude: exclude.as_slice().to_vec(),
        }
    }

    /// 이름이 포함 대상인지 판정합니다.
    pub fn includes(&self, name: &str) -> bool {
        include(name, &self.only, &self.exclude)
    }

    /// 아무 조건도 없는 필터인지 확인합니다.
    pub fn is_unrestricted(&self) -> bool {
        self.only.is_empty() && self.exclude.is_empty()
    }
}
