//! 설정 관리 -- recast.toml 파싱 및 실행 설정
//!
//! [`RecastConfig`]는 한 번의 실행에 필요한 모든 설정을 담는 최상위 구조체입니다.
//! 시작 시 한 번 완성된 뒤 각 컴포넌트에 명시적으로 전달됩니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`RECAST_RUN_DRY_RUN=true` 형식)
//! 3. 설정 파일 (`recast.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), recast_core::error::RecastError> {
//! use recast_core::config::RecastConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드 + 검증
//! let config = RecastConfig::load("/etc/recast/recast.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = RecastConfig::parse("[run]\ndry_run = true")?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, RecastError};
use crate::filter::{NameFilter, NameList};

/// 기본 설정 파일 경로
pub const DEFAULT_CONFIG_PATH: &str = "/etc/recast/recast.toml";

/// 컨테이너 정지 타임아웃 상한 (초)
pub const MAX_STOP_TIMEOUT_SECS: u64 = 3600;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_LOG_FORMATS: [&str; 3] = ["text", "pretty", "json"];

/// recast 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecastConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 컨테이너 런타임 연결 설정
    #[serde(default)]
    pub docker: DockerConfig,
    /// 실행 동작 설정
    #[serde(default)]
    pub run: RunConfig,
    /// 이름 필터
    #[serde(default)]
    pub filters: FilterConfig,
}

impl RecastConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용한 뒤 검증합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RecastError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일을 로드하되, 암묵적 기본 경로에 파일이 없으면 기본값을 사용합니다.
    ///
    /// `explicit`가 true이면 (사용자가 경로를 지정함) 파일 부재는 에러입니다.
    pub async fn load_or_default(
        path: impl AsRef<Path>,
        explicit: bool,
    ) -> Result<Self, RecastError> {
        let path = path.as_ref();
        match Self::from_file(path).await {
            Ok(mut config) => {
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            Err(RecastError::Config(ConfigError::FileNotFound { .. })) if !explicit => {
                debug!(path = %path.display(), "config file not found, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            Err(e) => Err(e),
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, RecastError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RecastError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                RecastError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, RecastError> {
        toml::from_str(toml_str).map_err(|e| {
            RecastError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `RECAST_{SECTION}_{FIELD}`
    /// 예: `RECAST_FILTERS_EXCLUDE_CONTAINERS="db cache"`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "RECAST_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "RECAST_GENERAL_LOG_FORMAT");
        override_opt_path(&mut self.general.log_file, "RECAST_GENERAL_LOG_FILE");
        override_path(&mut self.general.lock_file, "RECAST_GENERAL_LOCK_FILE");
        override_path(&mut self.general.backup_dir, "RECAST_GENERAL_BACKUP_DIR");

        // Docker
        override_opt_string(&mut self.docker.socket, "RECAST_DOCKER_SOCKET");
        override_u64(
            &mut self.docker.api_timeout_secs,
            "RECAST_DOCKER_API_TIMEOUT_SECS",
        );

        // Run
        override_bool(&mut self.run.dry_run, "RECAST_RUN_DRY_RUN");
        override_bool(&mut self.run.prune_images, "RECAST_RUN_PRUNE_IMAGES");
        override_bool(&mut self.run.compose_only, "RECAST_RUN_COMPOSE_ONLY");
        override_bool(&mut self.run.standalone_only, "RECAST_RUN_STANDALONE_ONLY");
        override_u64(
            &mut self.run.stop_timeout_secs,
            "RECAST_RUN_STOP_TIMEOUT_SECS",
        );
        override_bool(
            &mut self.run.pull_all_platforms,
            "RECAST_RUN_PULL_ALL_PLATFORMS",
        );
        override_u64(
            &mut self.run.command_timeout_secs,
            "RECAST_RUN_COMMAND_TIMEOUT_SECS",
        );

        // Filters
        override_names(
            &mut self.filters.only_containers,
            "RECAST_FILTERS_ONLY_CONTAINERS",
        );
        override_names(
            &mut self.filters.exclude_containers,
            "RECAST_FILTERS_EXCLUDE_CONTAINERS",
        );
        override_names(
            &mut self.filters.only_projects,
            "RECAST_FILTERS_ONLY_PROJECTS",
        );
        override_names(
            &mut self.filters.exclude_projects,
            "RECAST_FILTERS_EXCLUDE_PROJECTS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), RecastError> {
        if !VALID_LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", VALID_LOG_LEVELS.join(", ")),
            }
            .into());
        }

        if !VALID_LOG_FORMATS.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", VALID_LOG_FORMATS.join(", ")),
            }
            .into());
        }

        if self.general.lock_file.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "general.lock_file".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.general.backup_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "general.backup_dir".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.docker.api_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "docker.api_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.run.compose_only && self.run.standalone_only {
            return Err(ConfigError::Conflict {
                first: "run.compose_only".to_owned(),
                second: "run.standalone_only".to_owned(),
            }
            .into());
        }

        if self.run.stop_timeout_secs == 0 || self.run.stop_timeout_secs > MAX_STOP_TIMEOUT_SECS {
            return Err(ConfigError::InvalidValue {
                field: "run.stop_timeout_secs".to_owned(),
                reason: format!("must be between 1 and {MAX_STOP_TIMEOUT_SECS}"),
            }
            .into());
        }

        if self.run.command_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "run.command_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (text, pretty, json)
    pub log_format: String,
    /// 로그 파일 경로 (없으면 stderr만 사용)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// 실행 잠금 파일 경로
    pub lock_file: PathBuf,
    /// 백업 기록 디렉토리
    pub backup_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "text".to_owned(),
            log_file: None,
            lock_file: PathBuf::from("/run/recast/recast.lock"),
            backup_dir: PathBuf::from("/var/lib/recast/backups"),
        }
    }
}

/// 컨테이너 런타임 연결 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// 소켓 경로 (없으면 DOCKER_HOST 또는 플랫폼 기본값)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket: Option<String>,
    /// API 요청 타임아웃 (초)
    pub api_timeout_secs: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            socket: None,
            api_timeout_secs: 120,
        }
    }
}

/// 실행 동작 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// 변경 없이 계획된 동작만 기록
    pub dry_run: bool,
    /// 실행 후 dangling 이미지 정리
    pub prune_images: bool,
    /// compose 프로젝트만 처리
    pub compose_only: bool,
    /// 독립 컨테이너만 처리
    pub standalone_only: bool,
    /// 컨테이너 정지 타임아웃 (초)
    pub stop_timeout_secs: u64,
    /// 플랫폼 고정 없이 모든 태그를 pull
    pub pull_all_platforms: bool,
    /// compose 하위 프로세스 타임아웃 (초)
    pub command_timeout_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            prune_images: true,
            compose_only: false,
            standalone_only: false,
            stop_timeout_secs: 30,
            pull_all_platforms: false,
            command_timeout_secs: 600,
        }
    }
}

/// 이름 필터 설정
///
/// 컨테이너 필터와 프로젝트 필터는 서로 독립적으로 적용됩니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// 처리할 컨테이너 이름 (비어있으면 전체)
    pub only_containers: NameList,
    /// 제외할 컨테이너 이름
    pub exclude_containers: NameList,
    /// 처리할 compose 프로젝트 이름 (비어있으면 전체)
    pub only_projects: NameList,
    /// 제외할 compose 프로젝트 이름
    pub exclude_projects: NameList,
}

impl FilterConfig {
    /// 컨테이너 이름 필터
    pub fn containers(&self) -> NameFilter {
        NameFilter::new(&self.only_containers, &self.exclude_containers)
    }

    /// 프로젝트 이름 필터
    pub fn projects(&self) -> NameFilter {
        NameFilter::new(&self.only_projects, &self.exclude_projects)
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_opt_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = if val.is_empty() { None } else { Some(val) };
    }
}

fn override_path(target: &mut PathBuf, env_key: &str) {
    if let Some(val) = std::env::var_os(env_key) {
        *target = PathBuf::from(val);
    }
}

fn override_opt_path(target: &mut Option<PathBuf>, env_key: &str) {
    if let Some(val) = std::env::var_os(env_key) {
        *target = if val.is_empty() {
            None
        } else {
            Some(PathBuf::from(val))
        };
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_names(target: &mut NameList, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = NameList::parse(&val);
    }
}
