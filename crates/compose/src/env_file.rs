//! 프로젝트 디렉토리의 `.env` 로딩
//!
//! 파일이 없으면 빈 목록입니다. 읽기/파싱 실패는 호출자가 경고 후 무시합니다.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ComposeError;

/// 프로젝트 디렉토리 기준 환경 파일 이름
pub const ENV_FILE_NAME: &str = ".env";

/// `<dir>/.env`를 읽어 변수 목록을 반환합니다.
///
/// # Errors
///
/// 파일이 있지만 읽거나 해석할 수 없으면 `ComposeError::EnvFile`.
pub fn load_env_file(dir: &Path) -> Result<BTreeMap<String, String>, ComposeError> {
    let path = dir.join(ENV_FILE_NAME);
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }

    let failure = |reason: String| ComposeError::EnvFile {
        path: path.clone(),
        reason,
    };

    let mut vars = BTreeMap::new();
    for item in dotenvy::from_path_iter(&path).map_err(|e| failure(e.to_string()))? {
        let (key, value) = item.map_err(|e| failure(e.to_string()))?;
        vars.insert(key, value);
    }
    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_file(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn parses_comments_and_quotes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "# shop settings\nTAG=1.4\nGREETING=\"hello world\"\n\nEMPTY=\n",
        )
        .unwrap();

        let vars = load_env_file(dir.path()).unwrap();
        assert_eq!(vars.get("TAG").map(String::as_str), Some("1.4"));
        assert_eq!(vars.get("GREETING").map(String::as_str), Some("hello world"));
        assert_eq!(vars.get("EMPTY").map(String::as_str), Some(""));
        assert_eq!(vars.len(), 3);
    }

    #[test]
    fn malformed_file_is_env_file_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "GOOD=1\nBAD LINE WITHOUT EQUALS\n").unwrap();

        let err = load_env_file(dir.path()).unwrap_err();
        assert!(matches!(err, ComposeError::EnvFile { .. }));
    }
}
