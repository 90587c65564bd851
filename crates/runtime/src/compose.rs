//! compose CLI 실행 -- `docker compose` (v2) / `docker-compose` (v1)
//!
//! [`ComposeRunner`] trait은 프로젝트 단위 pull / up 호출을 추상화합니다.
//! 운영 환경에서는 [`CliComposeRunner`]가 하위 프로세스를 실행하고,
//! 테스트에서는 호출을 기록하는 mock을 사용합니다.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::RuntimeError;

/// 사용 가능한 compose 명령 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeCommand {
    /// `docker compose`
    V2,
    /// `docker-compose`
    V1,
}

impl ComposeCommand {
    /// 사용 가능한 compose 명령을 감지합니다. v2를 우선합니다.
    pub async fn detect() -> Option<Self> {
        let v2 = tokio::process::Command::new("docker")
            .args(["compose", "version"])
            .stdin(Stdio::null())
            .output()
            .await;
        if matches!(v2, Ok(ref output) if output.status.success()) {
            return Some(Self::V2);
        }

        let v1 = tokio::process::Command::new("docker-compose")
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await;
        if matches!(v1, Ok(ref output) if output.status.success()) {
            return Some(Self::V1);
        }

        None
    }

    /// 실행 파일과 앞쪽 고정 인자
    pub fn program_and_prefix(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::V2 => ("docker", &["compose"]),
            Self::V1 => ("docker-compose", &[]),
        }
    }
}

/// compose 하위 명령
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeStep {
    /// 이미지 pull
    Pull,
    /// `up -d --remove-orphans`
    Up,
}

impl ComposeStep {
    /// 하위 명령 인자
    pub fn args(&self) -> &'static [&'static str] {
        match self {
            Self::Pull => &["pull"],
            Self::Up => &["up", "-d", "--remove-orphans"],
        }
    }

    /// 하위 명령 이름
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Up => "up",
        }
    }
}

/// 한 프로젝트에 대한 compose 호출 컨텍스트
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeInvocation {
    /// 프로젝트 이름 (`-p`)
    pub project: String,
    /// 작업 디렉토리 (하위 프로세스의 cwd)
    pub working_dir: PathBuf,
    /// 설정 파일 (`-f`, 비어있으면 디렉토리 기본값)
    pub config_files: Vec<PathBuf>,
    /// 하위 프로세스 추가 환경변수
    pub env: BTreeMap<String, String>,
}

impl ComposeInvocation {
    /// compose 프로그램 뒤에 올 인자를 만듭니다.
    pub fn args(&self, step: ComposeStep) -> Vec<String> {
        let mut args = Vec::with_capacity(4 + self.config_files.len() * 2);
        for file in &self.config_files {
            args.push("-f".to_owned());
            args.push(file.display().to_string());
        }
        args.push("-p".to_owned());
        args.push(self.project.clone());
        args.extend(step.args().iter().map(|a| (*a).to_owned()));
        args
    }

    /// 로그/dry-run 표시용 한 줄 명령
    pub fn command_line(&self, command: ComposeCommand, step: ComposeStep) -> String {
        let (program, prefix) = command.program_and_prefix();
        let mut argv: Vec<String> = vec![program.to_owned()];
        argv.extend(prefix.iter().map(|p| (*p).to_owned()));
        argv.extend(self.args(step));
        format!(
            "(cd {} && {})",
            shell_words::quote(&self.working_dir.display().to_string()),
            shell_words::join(argv)
        )
    }
}

/// compose 호출 추상화
pub trait ComposeRunner: Send + Sync + 'static {
    /// 사용 중인 compose 명령
    fn command(&self) -> ComposeCommand;

    /// 하위 명령 하나를 실행합니다.
    ///
    /// # Errors
    ///
    /// 0이 아닌 종료 코드, 실행 실패, 시간 초과 시 `RuntimeError`를 반환합니다.
    fn run(
        &self,
        invocation: &ComposeInvocation,
        step: ComposeStep,
    ) -> impl Future<Output = Result<(), RuntimeError>> + Send;
}

/// 하위 프로세스로 compose를 실행하는 구현
pub struct CliComposeRunner {
    command: ComposeCommand,
    timeout: Duration,
}

impl CliComposeRunner {
    /// 감지된 명령으로 생성합니다.
    pub fn new(command: ComposeCommand, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    /// compose 명령을 감지해 생성합니다.
    ///
    /// # Errors
    ///
    /// 두 명령 모두 없으면 `RuntimeError::ComposeUnavailable`.
    pub async fn detect(timeout: Duration) -> Result<Self, RuntimeError> {
        let command = ComposeCommand::detect()
            .await
            .ok_or(RuntimeError::ComposeUnavailable)?;
        debug!(?command, "compose command detected");
        Ok(Self::new(command, timeout))
    }
}

impl ComposeRunner for CliComposeRunner {
    fn command(&self) -> ComposeCommand {
        self.command
    }

    async fn run(
        &self,
        invocation: &ComposeInvocation,
        step: ComposeStep,
    ) -> Result<(), RuntimeError> {
        let (program, prefix) = self.command.program_and_prefix();
        let mut command = tokio::process::Command::new(program);
        command
            .args(prefix)
            .args(invocation.args(step))
            .current_dir(&invocation.working_dir)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        info!(
            project = %invocation.project,
            command = %invocation.command_line(self.command, step),
            "running compose"
        );

        let failure = |reason: String| RuntimeError::Compose {
            project: invocation.project.clone(),
            command: step.name().to_owned(),
            reason,
        };

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| RuntimeError::Timeout {
                operation: format!("compose {} for '{}'", step.name(), invocation.project),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| failure(e.to_string()))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail = stderr.trim().lines().last().unwrap_or_default();
        Err(failure(format!("{}: {tail}", output.status)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(files: &[&str]) -> ComposeInvocation {
        ComposeInvocation {
            project: "shop".to_owned(),
            working_dir: PathBuf::from("/srv/shop"),
            config_files: files.iter().map(PathBuf::from).collect(),
            env: BTreeMap::new(),
        }
    }

    #[test]
    fn args_scope_every_config_file_and_project() {
        let inv = invocation(&["/srv/shop/compose.yml", "/etc/shop/override.yml"]);
        assert_eq!(
            inv.args(ComposeStep::Pull),
            vec![
                "-f",
                "/srv/shop/compose.yml",
                "-f",
                "/etc/shop/override.yml",
                "-p",
                "shop",
                "pull",
            ]
        );
    }

    #[test]
    fn args_without_config_files_use_directory_default() {
        let inv = invocation(&[]);
        assert_eq!(
            inv.args(ComposeStep::Up),
            vec!["-p", "shop", "up", "-d", "--remove-orphans"]
        );
    }

    #[test]
    fn command_line_v2_and_v1() {
        let inv = invocation(&[]);
        assert_eq!(
            inv.command_line(ComposeCommand::V2, ComposeStep::Pull),
            "(cd /srv/shop && docker compose -p shop pull)"
        );
        assert_eq!(
            inv.command_line(ComposeCommand::V1, ComposeStep::Up),
            "(cd /srv/shop && docker-compose -p shop up -d --remove-orphans)"
        );
    }

    #[test]
    fn command_line_quotes_paths_with_spaces() {
        let mut inv = invocation(&["/srv/my app/compose.yml"]);
        inv.working_dir = PathBuf::from("/srv/my app");
        let line = inv.command_line(ComposeCommand::V2, ComposeStep::Pull);
        assert!(line.starts_with("(cd '/srv/my app' && "));
        assert!(line.contains("-f '/srv/my app/compose.yml'"));
    }

    #[tokio::test]
    async fn missing_working_dir_is_compose_failure() {
        let runner = CliComposeRunner::new(ComposeCommand::V1, Duration::from_secs(5));
        let mut inv = invocation(&[]);
        inv.working_dir = PathBuf::from("/nonexistent/recast/project");
        let err = runner.run(&inv, ComposeStep::Pull).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Compose { .. }));
    }
}
