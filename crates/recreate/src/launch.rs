//! 실행 명세 합성 -- 컨테이너 서술자를 재생성 인자로 변환
//!
//! [`synthesize`]는 순수 함수입니다. 같은 서술자에 대해 항상 같은 순서의
//! 같은 인자를 만듭니다.
//!
//! # 인자 순서
//! 1. 식별/네트워크/재시작: name, hostname, network, restart
//! 2. 보안/호스트 연동: user, privileged, cap-add, cap-drop, add-host, device
//! 3. 리소스/환경: workdir, publish, volume/tmpfs, shm-size, env, label
//! 4. 이미지, entrypoint, 명령

use recast_core::launch::{LaunchArg, LaunchSpec};
use recast_core::types::{COMPOSE_LABEL_PREFIX, ContainerDescriptor, MountKind, PortBinding};
use tracing::debug;

/// 런타임 기본 공유 메모리 크기 (64 MiB)
pub const DEFAULT_SHM_SIZE: i64 = 64 * 1024 * 1024;

/// 런타임이 자동으로 부여하는 호스트명 길이 (ID 앞부분)
const DEFAULT_HOSTNAME_LEN: usize = 12;

/// 컨테이너 서술자에서 실행 명세를 합성합니다.
pub fn synthesize(descriptor: &ContainerDescriptor) -> LaunchSpec {
    let mut args = Vec::new();

    // 1. 식별/네트워크/재시작
    args.push(LaunchArg::Name(descriptor.name.clone()));
    if keeps_hostname(descriptor) {
        args.push(LaunchArg::Hostname(descriptor.hostname.clone()));
    }
    if !descriptor.network_mode.is_empty() && descriptor.network_mode != "default" {
        args.push(LaunchArg::Network(descriptor.network_mode.clone()));
    }
    let restart = &descriptor.restart_policy;
    if !restart.name.is_empty() && restart.name != "no" {
        args.push(LaunchArg::Restart(restart.clone()));
    }

    // 2. 보안/호스트 연동
    if !descriptor.user.is_empty() {
        args.push(LaunchArg::User(descriptor.user.clone()));
    }
    if descriptor.privileged {
        args.push(LaunchArg::Privileged);
    }
    args.extend(descriptor.cap_add.iter().cloned().map(LaunchArg::CapAdd));
    args.extend(descriptor.cap_drop.iter().cloned().map(LaunchArg::CapDrop));
    args.extend(descriptor.extra_hosts.iter().cloned().map(LaunchArg::AddHost));
    args.extend(descriptor.devices.iter().cloned().map(LaunchArg::Device));

    // 3. 리소스/환경
    if !descriptor.working_dir.is_empty() {
        args.push(LaunchArg::Workdir(descriptor.working_dir.clone()));
    }
    args.extend(
        published_ports(&descriptor.ports)
            .into_iter()
            .map(LaunchArg::Publish),
    );
    for mount in &descriptor.mounts {
        match &mount.kind {
            MountKind::Bind | MountKind::Volume => args.push(LaunchArg::Volume {
                source: mount.source.clone(),
                destination: mount.destination.clone(),
                read_only: mount.read_only,
            }),
            MountKind::Tmpfs => args.push(LaunchArg::Tmpfs {
                destination: mount.destination.clone(),
                options: mount.tmpfs_options.clone(),
            }),
            MountKind::Other(kind) => debug!(
                container = %descriptor.name,
                kind = kind.as_str(),
                destination = mount.destination.as_str(),
                "dropping unsupported mount"
            ),
        }
    }
    if descriptor.shm_size > 0 && descriptor.shm_size != DEFAULT_SHM_SIZE {
        args.push(LaunchArg::ShmSize(descriptor.shm_size));
    }
    args.extend(descriptor.env.iter().cloned().map(LaunchArg::Env));
    args.extend(
        descriptor
            .labels
            .iter()
            .filter(|(key, _)| !key.starts_with(COMPOSE_LABEL_PREFIX))
            .map(|(key, value)| LaunchArg::Label {
                key: key.clone(),
                value: value.clone(),
            }),
    );

    // 4. 이미지, entrypoint, 명령
    LaunchSpec {
        args,
        image: descriptor.image.clone(),
        entrypoint: descriptor.entrypoint.clone(),
        command: descriptor.cmd.clone(),
    }
}

/// 호스트명이 사용자가 지정한 값인지 판정합니다.
fn keeps_hostname(descriptor: &ContainerDescriptor) -> bool {
    let hostname = descriptor.hostname.as_str();
    if hostname.is_empty() {
        return false;
    }
    let network = descriptor.network_mode.as_str();
    if network == "host" || network.starts_with("container:") {
        return false;
    }
    let default_len = DEFAULT_HOSTNAME_LEN.min(descriptor.id.len());
    descriptor
        .id
        .get(..default_len)
        .is_none_or(|prefix| hostname != prefix)
}

/// 포트 바인딩을 컨테이너 포트 기준으로 정렬하고 IPv6 와일드카드 쌍을 합칩니다.
fn published_ports(ports: &[PortBinding]) -> Vec<PortBinding> {
    let mut sorted: Vec<PortBinding> = ports.to_vec();
    sorted.sort_by(|a, b| a.container_port.cmp(&b.container_port));

    sorted
        .iter()
        .filter(|port| {
            let twin_of_ipv4_wildcard = port.host_ip == "::"
                && sorted.iter().any(|other| {
                    other.container_port == port.container_port
                        && other.host_port == port.host_port
                        && other.host_ip == "0.0.0.0"
                });
            !twin_of_ipv4_wildcard
        })
        .cloned()
        .collect()
}
