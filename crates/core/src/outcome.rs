//! 실행 결과 -- 엔티티별 결과와 실행 요약
//!
//! 각 엔티티(컨테이너/프로젝트)는 태그된 [`Outcome`]을 반환하고,
//! 드라이버는 이를 [`RunReport`]로 모읍니다. 실패는 전파되지 않습니다.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::action::PlannedAction;
use crate::types::PruneSummary;

/// 엔티티 하나의 처리 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    /// 이미지 변경 없음
    Unchanged,
    /// 새 이미지로 재생성됨 (dry-run이면 backup은 None)
    Recreated {
        /// 기록된 백업 경로
        backup: Option<PathBuf>,
    },
    /// compose 프로젝트가 다시 적용됨
    Updated,
    /// 처리하지 않음
    Skipped(String),
    /// 이 엔티티에 한정된 실패
    Failed(String),
}

impl Outcome {
    /// 결과 이름
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Recreated { .. } => "recreated",
            Self::Updated => "updated",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }

    /// 실패 여부
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recreated {
                backup: Some(path),
            } => write!(f, "recreated (backup: {})", path.display()),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// 엔티티 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// 독립 컨테이너
    Container,
    /// compose 프로젝트
    Project,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container => write!(f, "container"),
            Self::Project => write!(f, "project"),
        }
    }
}

/// 엔티티별 결과 기록
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityReport {
    /// 엔티티 종류
    pub kind: EntityKind,
    /// 컨테이너 또는 프로젝트 이름
    pub name: String,
    /// 결과
    pub outcome: Outcome,
}

/// 한 번의 실행 요약
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// 실행 ID
    pub run_id: String,
    /// dry-run 여부
    pub dry_run: bool,
    /// 엔티티별 결과 (처리 순서)
    pub entities: Vec<EntityReport>,
    /// dry-run에서 수행 대신 기록된 동작
    pub planned_actions: Vec<PlannedAction>,
    /// 이미지 정리 결과 (수행하지 않았으면 None)
    pub pruned: Option<PruneSummary>,
}

/// 결과별 개수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    /// 변경 없음
    pub unchanged: usize,
    /// 재생성
    pub recreated: usize,
    /// 갱신
    pub updated: usize,
    /// 건너뜀
    pub skipped: usize,
    /// 실패
    pub failed: usize,
}

impl RunReport {
    /// 새 보고서를 생성합니다.
    pub fn new(run_id: impl Into<String>, dry_run: bool) -> Self {
        Self {
            run_id: run_id.into(),
            dry_run,
            ..Self::default()
        }
    }

    /// 엔티티 결과를 추가합니다.
    pub fn push(&mut self, kind: EntityKind, name: impl Into<String>, outcome: Outcome) {
        self.entities.push(EntityReport {
            kind,
            name: name.into(),
            outcome,
        });
    }

    /// 결과별 개수를 집계합니다.
    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for entity in &self.entities {
            match entity.outcome {
                Outcome::Unchanged => counts.unchanged += 1,
                Outcome::Recreated { .. } => counts.recreated += 1,
                Outcome::Updated => counts.updated += 1,
                Outcome::Skipped(_) => counts.skipped += 1,
                Outcome::Failed(_) => counts.failed += 1,
            }
        }
        counts
    }

    /// 이름으로 결과를 찾습니다.
    pub fn outcome_of(&self, kind: EntityKind, name: &str) -> Option<&Outcome> {
        self.entities
            .iter()
            .find(|e| e.kind == kind && e.name == name)
            .map(|e| &e.outcome)
    }
}
