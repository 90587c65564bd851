//! 계획된 동작 -- dry-run에서 수행 대신 기록되는 변경 작업
//!
//! [`ActionJournal`]은 실행 하나에 대해 하나만 만들어져 각 컴포넌트에
//! `&mut`로 전달됩니다. 기록된 동작은 그대로 로그에 남고 보고서에 포함됩니다.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

/// 변경을 일으키는 동작 하나
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlannedAction {
    /// 이미지 pull
    Pull {
        /// 이미지 참조
        image: String,
        /// 고정 플랫폼
        platform: Option<String>,
        /// 모든 태그 pull 여부
        all_tags: bool,
    },
    /// 컨테이너 정지
    Stop {
        /// 컨테이너 이름
        container: String,
        /// 정지 타임아웃 (초)
        timeout_secs: u64,
    },
    /// 컨테이너 제거
    Remove {
        /// 컨테이너 이름
        container: String,
    },
    /// 백업 기록 작성
    WriteBackup {
        /// 컨테이너 이름
        container: String,
        /// 백업 디렉토리
        dir: PathBuf,
    },
    /// 컨테이너 생성 및 시작
    Create {
        /// 컨테이너 이름
        container: String,
        /// 동등한 `docker run` 명령
        command_line: String,
    },
    /// compose 명령 실행
    Compose {
        /// 프로젝트 이름
        project: String,
        /// 실행할 명령
        command_line: String,
    },
    /// dangling 이미지 정리
    PruneImages,
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pull {
                image,
                platform,
                all_tags,
            } => {
                write!(f, "docker pull")?;
                if *all_tags {
                    write!(f, " --all-tags")?;
                } else if let Some(platform) = platform {
                    write!(f, " --platform {platform}")?;
                }
                write!(f, " {image}")
            }
            Self::Stop {
                container,
                timeout_secs,
            } => write!(f, "docker stop --time {timeout_secs} {container}"),
            Self::Remove { container } => write!(f, "docker rm {container}"),
            Self::WriteBackup { container, dir } => {
                write!(f, "write backup for {container} into {}", dir.display())
            }
            Self::Create { command_line, .. } => write!(f, "{command_line}"),
            Self::Compose { command_line, .. } => write!(f, "{command_line}"),
            Self::PruneImages => write!(f, "docker image prune --force"),
        }
    }
}

/// 실행 중 기록된 동작 목록
#[derive(Debug, Default)]
pub struct ActionJournal {
    actions: Vec<PlannedAction>,
}

impl ActionJournal {
    /// 빈 기록을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 동작을 로그에 남기고 기록합니다.
    pub fn record(&mut self, action: PlannedAction) {
        info!(action = %action, "dry-run: would execute");
        self.actions.push(action);
    }

    /// 기록된 동작을 반환합니다.
    pub fn actions(&self) -> &[PlannedAction] {
        &self.actions
    }

    /// 기록을 소비해 동작 목록을 반환합니다.
    pub fn into_actions(self) -> Vec<PlannedAction> {
        self.actions
    }
}
