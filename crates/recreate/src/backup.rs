//! 백업 기록 -- 재생성 직전의 실행 명세를 재실행 가능한 셸 스크립트로 저장
//!
//! 파일 이름은 `<컨테이너 이름>_<YYYYMMDD-HHMMSS>.sh`이며,
//! 같은 초에 이름이 겹치면 `-1`, `-2` 접미사를 붙입니다. 기존 기록은 덮어쓰지 않습니다.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use recast_core::launch::LaunchSpec;
use recast_core::types::ContainerDescriptor;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::RecreateError;

/// 같은 초 안에서 시도할 최대 접미사
const MAX_COLLISION_SUFFIX: u32 = 100;

/// 백업 기록 저장소
#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    /// 디렉토리를 지정해 저장소를 생성합니다. 디렉토리는 첫 기록 시 만들어집니다.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 기록 디렉토리
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 실행 명세를 기록하고 파일 경로를 반환합니다.
    pub async fn write(
        &self,
        spec: &LaunchSpec,
        descriptor: &ContainerDescriptor,
        at: DateTime<Local>,
    ) -> Result<PathBuf, RecreateError> {
        let failure = |path: &Path, e: std::io::Error| RecreateError::Backup {
            container: descriptor.name.clone(),
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        create_private_dir(&self.dir)
            .await
            .map_err(|e| failure(&self.dir, e))?;

        let contents = render(spec, descriptor, at);
        let stem = format!("{}_{}", file_safe(&descriptor.name), at.format("%Y%m%d-%H%M%S"));

        for suffix in 0..=MAX_COLLISION_SUFFIX {
            let file_name = if suffix == 0 {
                format!("{stem}.sh")
            } else {
                format!("{stem}-{suffix}.sh")
            };
            let path = self.dir.join(file_name);

            let mut options = tokio::fs::OpenOptions::new();
            options.write(true).create_new(true);
            #[cfg(unix)]
            options.mode(0o700);

            let mut file = match options.open(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "backup name taken, trying next suffix");
                    continue;
                }
                Err(e) => return Err(failure(&path, e)),
            };

            file.write_all(contents.as_bytes())
                .await
                .map_err(|e| failure(&path, e))?;
            file.sync_all().await.map_err(|e| failure(&path, e))?;
            return Ok(path);
        }

        Err(failure(
            &self.dir.join(format!("{stem}.sh")),
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "too many backup records within one second",
            ),
        ))
    }
}

async fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder.create(dir).await
}

/// 파일 이름에 쓸 수 없는 문자를 `_`로 바꿉니다.
fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// 실행 명세를 `docker run` 스크립트로 렌더링합니다.
///
/// 모든 값은 셸 인용을 거치므로 공백, 따옴표, `=`, 개행이 그대로 재현됩니다.
pub fn render(spec: &LaunchSpec, descriptor: &ContainerDescriptor, at: DateTime<Local>) -> String {
    let mut out = String::new();
    out.push_str("#!/bin/sh\n");
    out.push_str("# recast backup record\n");
    out.push_str(&format!("# container: {}\n", one_line(&descriptor.name)));
    out.push_str(&format!("# container id: {}\n", descriptor.id));
    out.push_str(&format!(
        "# image: {} ({})\n",
        one_line(&descriptor.image),
        descriptor.image_id
    ));
    out.push_str(&format!("# written: {}\n", at.to_rfc3339()));
    out.push_str("docker run --detach");

    let mut lines: Vec<String> = spec
        .args
        .iter()
        .map(|arg| shell_words::join(arg.to_args()))
        .collect();
    if let Some(entrypoint) = spec.entrypoint_value() {
        lines.push(shell_words::join(["--entrypoint", entrypoint.as_str()]));
    }
    let mut tail = vec![spec.image.as_str()];
    tail.extend(spec.command.iter().map(String::as_str));
    lines.push(shell_words::join(tail));

    for line in lines {
        out.push_str(" \\\n  ");
        out.push_str(&line);
    }
    out.push('\n');
    out
}

fn one_line(value: &str) -> String {
    value.replace(['\n', '\r'], " ")
}
