//! 프로젝트 작업 디렉토리 복원
//!
//! 기록된 작업 디렉토리가 우선입니다. 없으면 존재하는 첫 번째 절대 경로
//! 설정 파일의 상위 디렉토리를 사용하고, 그것도 없으면 프로젝트를 건너뜁니다.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use recast_core::types::ComposeProject;
use recast_runtime::ComposeInvocation;
use tracing::{debug, warn};

use crate::error::ComposeError;

/// 프로젝트의 작업 디렉토리를 결정합니다.
///
/// # Errors
///
/// 기록된 디렉토리와 설정 파일 모두 사용할 수 없으면 `WorkingDirUnresolved`.
pub fn resolve_working_dir(project: &ComposeProject) -> Result<PathBuf, ComposeError> {
    if let Some(dir) = &project.working_dir {
        if dir.is_dir() {
            return Ok(dir.clone());
        }
        warn!(
            project = %project.name,
            working_dir = %dir.display(),
            "recorded working directory is gone, trying config files"
        );
    }

    let fallback = project
        .config_files
        .iter()
        .filter(|file| file.is_absolute() && file.is_file())
        .find_map(|file| file.parent().map(Path::to_path_buf));

    match fallback {
        Some(dir) => {
            debug!(
                project = %project.name,
                working_dir = %dir.display(),
                "using config file directory"
            );
            Ok(dir)
        }
        None => Err(ComposeError::WorkingDirUnresolved {
            project: project.name.clone(),
            recorded: project
                .working_dir
                .as_ref()
                .map_or_else(|| "<none>".to_owned(), |d| d.display().to_string()),
        }),
    }
}

/// 복원된 디렉토리와 환경변수로 compose 호출 컨텍스트를 만듭니다.
pub fn invocation(
    project: &ComposeProject,
    working_dir: PathBuf,
    env: BTreeMap<String, String>,
) -> ComposeInvocation {
    ComposeInvocation {
        project: project.name.clone(),
        working_dir,
        config_files: project.config_files.clone(),
        env,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(working_dir: Option<&Path>, config_files: Vec<PathBuf>) -> ComposeProject {
        ComposeProject {
            name: "shop".to_owned(),
            working_dir: working_dir.map(Path::to_path_buf),
            config_files,
            members: vec!["01".to_owned()],
        }
    }

    #[test]
    fn recorded_dir_wins_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let compose = other.path().join("compose.yml");
        std::fs::write(&compose, "services: {}\n").unwrap();

        let resolved = resolve_working_dir(&project(Some(dir.path()), vec![compose])).unwrap();
        assert_eq!(resolved, dir.path());
    }

    #[test]
    fn missing_dir_falls_back_to_first_existing_absolute_file() {
        let root = tempfile::tempdir().unwrap();
        let app = root.path().join("app");
        std::fs::create_dir(&app).unwrap();
        let compose = app.join("docker-compose.yml");
        std::fs::write(&compose, "services: {}\n").unwrap();

        let files = vec![
            PathBuf::from("relative/compose.yml"),
            root.path().join("missing/compose.yml"),
            compose,
        ];
        let resolved =
            resolve_working_dir(&project(Some(&root.path().join("gone")), files)).unwrap();
        assert_eq!(resolved, app);
    }

    #[test]
    fn nothing_usable_is_unresolved() {
        let root = tempfile::tempdir().unwrap();
        let err = resolve_working_dir(&project(
            Some(&root.path().join("gone")),
            vec![root.path().join("gone/compose.yml")],
        ))
        .unwrap_err();
        assert!(matches!(err, ComposeError::WorkingDirUnresolved { .. }));
    }

    #[test]
    fn no_recorded_dir_and_no_files_is_unresolved() {
        let err = resolve_working_dir(&project(None, Vec::new())).unwrap_err();
        assert!(err.to_string().contains("<none>"));
    }

    #[test]
    fn invocation_keeps_config_file_order() {
        let files = vec![PathBuf::from("/a/base.yml"), PathBuf::from("/a/override.yml")];
        let inv = invocation(&project(None, files.clone()), PathBuf::from("/a"), BTreeMap::new());
        assert_eq!(inv.config_files, files);
        assert_eq!(inv.project, "shop");
    }
}
