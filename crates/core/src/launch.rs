//! 실행 명세 -- 컨테이너 재생성 인자의 타입 표현
//!
//! [`LaunchSpec`]은 순서가 있는 타입 인자 목록입니다. 런타임의 create API에
//! 직접 전달되며, 백업 기록은 같은 값을 `docker run` 명령으로 렌더링한 것입니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Device, PortBinding, RestartPolicy};

/// 재생성 인자 하나
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchArg {
    /// `--name`
    Name(String),
    /// `--hostname`
    Hostname(String),
    /// `--user`
    User(String),
    /// `--workdir`
    Workdir(String),
    /// `--network`
    Network(String),
    /// `--restart`
    Restart(RestartPolicy),
    /// `--privileged`
    Privileged,
    /// `--cap-add`
    CapAdd(String),
    /// `--cap-drop`
    CapDrop(String),
    /// `--add-host`
    AddHost(String),
    /// `--device`
    Device(Device),
    /// `--publish`
    Publish(PortBinding),
    /// `--volume` (bind 또는 named volume)
    Volume {
        /// 호스트 경로 또는 볼륨 이름
        source: String,
        /// 컨테이너 경로
        destination: String,
        /// 읽기 전용 여부
        read_only: bool,
    },
    /// `--tmpfs`
    Tmpfs {
        /// 컨테이너 경로
        destination: String,
        /// tmpfs 옵션
        options: Option<String>,
    },
    /// `--shm-size` (바이트)
    ShmSize(i64),
    /// `--env`
    Env(String),
    /// `--label`
    Label {
        /// 라벨 키
        key: String,
        /// 라벨 값
        value: String,
    },
}

impl LaunchArg {
    /// 플래그 이름을 반환합니다.
    pub fn flag(&self) -> &'static str {
        match self {
            Self::Name(_) => "--name",
            Self::Hostname(_) => "--hostname",
            Self::User(_) => "--user",
            Self::Workdir(_) => "--workdir",
            Self::Network(_) => "--network",
            Self::Restart(_) => "--restart",
            Self::Privileged => "--privileged",
            Self::CapAdd(_) => "--cap-add",
            Self::CapDrop(_) => "--cap-drop",
            Self::AddHost(_) => "--add-host",
            Self::Device(_) => "--device",
            Self::Publish(_) => "--publish",
            Self::Volume { .. } => "--volume",
            Self::Tmpfs { .. } => "--tmpfs",
            Self::ShmSize(_) => "--shm-size",
            Self::Env(_) => "--env",
            Self::Label { .. } => "--label",
        }
    }

    /// 플래그 값을 반환합니다. 값이 없는 플래그는 None입니다.
    pub fn value(&self) -> Option<String> {
        let value = match self {
            Self::Privileged => return None,
            Self::Name(v)
            | Self::Hostname(v)
            | Self::User(v)
            | Self::Workdir(v)
            | Self::Network(v)
            | Self::CapAdd(v)
            | Self::CapDrop(v)
            | Self::AddHost(v)
            | Self::Env(v) => v.clone(),
            Self::Restart(policy) => restart_value(policy),
            Self::Device(device) => device_value(device),
            Self::Publish(port) => publish_value(port),
            Self::Volume {
                source,
                destination,
                read_only,
            } => {
                let mut v = if source.is_empty() {
                    destination.clone()
                } else {
                    format!("{source}:{destination}")
                };
                if *read_only {
                    v.push_str(":ro");
                }
                v
            }
            Self::Tmpfs {
                destination,
                options,
            } => match options {
                Some(opts) if !opts.is_empty() => format!("{destination}:{opts}"),
                _ => destination.clone(),
            },
            Self::ShmSize(bytes) => bytes.to_string(),
            Self::Label { key, value } => format!("{key}={value}"),
        };
        Some(value)
    }

    /// `[flag, value]` 형태의 argv 조각을 반환합니다.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![self.flag().to_owned()];
        if let Some(value) = self.value() {
            args.push(value);
        }
        args
    }
}

impl fmt::Display for LaunchArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_words::join(self.to_args()))
    }
}

fn restart_value(policy: &RestartPolicy) -> String {
    if policy.name == "on-failure" && policy.max_retries > 0 {
        format!("on-failure:{}", policy.max_retries)
    } else {
        policy.name.clone()
    }
}

fn device_value(device: &Device) -> String {
    let mut v = format!("{}:{}", device.host_path, device.container_path);
    if !device.permissions.is_empty() {
        v.push(':');
        v.push_str(&device.permissions);
    }
    v
}

fn publish_value(port: &PortBinding) -> String {
    let host_ip = if port.host_ip.contains(':') {
        format!("[{}]", port.host_ip)
    } else {
        port.host_ip.clone()
    };
    match (host_ip.is_empty(), port.host_port.is_empty()) {
        (true, true) => port.container_port.clone(),
        (true, false) => format!("{}:{}", port.host_port, port.container_port),
        (false, true) => format!("{host_ip}::{}", port.container_port),
        (false, false) => format!("{host_ip}:{}:{}", port.host_port, port.container_port),
    }
}

/// 컨테이너 실행 명세
///
/// 인자 순서: 식별/네트워크/재시작, 보안/호스트 연동, 리소스/환경,
/// 그 다음 이미지, entrypoint, 명령 순입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpec {
    /// 플래그 인자 목록
    pub args: Vec<LaunchArg>,
    /// 이미지 참조
    pub image: String,
    /// entrypoint override (비어있으면 이미지 기본값)
    pub entrypoint: Vec<String>,
    /// 명령 인자
    pub command: Vec<String>,
}

impl LaunchSpec {
    /// 컨테이너 이름을 반환합니다.
    pub fn name(&self) -> Option<&str> {
        self.args.iter().find_map(|arg| match arg {
            LaunchArg::Name(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// 재시작 정책 인자를 반환합니다.
    pub fn restart(&self) -> Option<&RestartPolicy> {
        self.args.iter().find_map(|arg| match arg {
            LaunchArg::Restart(policy) => Some(policy),
            _ => None,
        })
    }

    /// `--entrypoint` 값 (공백으로 합친 단일 값)
    pub fn entrypoint_value(&self) -> Option<String> {
        if self.entrypoint.is_empty() {
            None
        } else {
            Some(self.entrypoint.join(" "))
        }
    }

    /// `docker` 뒤에 올 argv를 반환합니다.
    ///
    /// CLI는 이미지 앞의 플래그만 해석하므로 `--entrypoint`는 이미지 앞에 둡니다.
    pub fn to_run_argv(&self) -> Vec<String> {
        let mut argv = vec!["run".to_owned(), "--detach".to_owned()];
        for arg in &self.args {
            argv.extend(arg.to_args());
        }
        if let Some(entrypoint) = self.entrypoint_value() {
            argv.push("--entrypoint".to_owned());
            argv.push(entrypoint);
        }
        argv.push(self.image.clone());
        argv.extend(self.command.iter().cloned());
        argv
    }

    /// 셸에서 그대로 실행 가능한 한 줄 명령을 반환합니다.
    pub fn command_line(&self) -> String {
        let mut argv = vec!["docker".to_owned()];
        argv.extend(self.to_run_argv());
        shell_words::join(argv)
    }
}
