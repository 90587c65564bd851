//! 런타임 조회 -- inspect 결과를 컨테이너 서술자로 변환하고 compose 프로젝트를 도출
//!
//! # 원칙
//! - inspect 한 번으로 모든 설정 항목을 얻습니다.
//! - 필수 섹션이 빠진 응답은 [`RuntimeError::ParseFailure`]이며
//!   일부만 채워진 서술자는 절대 반환하지 않습니다.
//! - compose 프로젝트는 실행 중인 컨테이너 라벨에서 매번 새로 도출되며
//!   발견 순서를 유지합니다.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use bollard::models::ContainerInspectResponse;
use recast_core::types::{
    COMPOSE_CONFIG_FILES_LABEL, COMPOSE_WORKING_DIR_LABEL, ComposeProject, ContainerDescriptor,
    ContainerSummary, Device, Mount, MountKind, PortBinding, RestartPolicy,
};
use tracing::debug;

use crate::docker::DockerClient;
use crate::error::RuntimeError;

/// inspect 응답을 컨테이너 서술자로 변환합니다.
///
/// `id`는 에러 메시지에 사용되는 조회 대상 ID입니다.
pub fn descriptor_from_inspect(
    id: &str,
    details: ContainerInspectResponse,
) -> Result<ContainerDescriptor, RuntimeError> {
    let parse_failure = |reason: &str| RuntimeError::ParseFailure {
        id: id.to_owned(),
        reason: reason.to_owned(),
    };

    let container_id = details
        .id
        .filter(|v| !v.is_empty())
        .ok_or_else(|| parse_failure("missing Id"))?;
    let name = details
        .name
        .map(|n| n.trim_start_matches('/').to_owned())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| parse_failure("missing Name"))?;
    let image_id = details
        .image
        .filter(|v| !v.is_empty())
        .ok_or_else(|| parse_failure("missing Image id"))?;
    let config = details.config.ok_or_else(|| parse_failure("missing Config"))?;
    let host = details
        .host_config
        .ok_or_else(|| parse_failure("missing HostConfig"))?;
    let image = config
        .image
        .filter(|v| !v.is_empty())
        .ok_or_else(|| parse_failure("missing Config.Image"))?;

    let restart_policy = host
        .restart_policy
        .map(|policy| RestartPolicy {
            name: policy.name.map(|n| n.to_string()).unwrap_or_default(),
            max_retries: policy.maximum_retry_count.unwrap_or(0),
        })
        .unwrap_or_default();

    let mut ports = Vec::new();
    let port_map: BTreeMap<String, _> = host.port_bindings.unwrap_or_default().into_iter().collect();
    for (container_port, bindings) in port_map {
        for binding in bindings.unwrap_or_default() {
            ports.push(PortBinding {
                host_ip: binding.host_ip.unwrap_or_default(),
                host_port: binding.host_port.unwrap_or_default(),
                container_port: container_port.clone(),
            });
        }
    }

    let mut mounts = Vec::new();
    for point in details.mounts.unwrap_or_default() {
        let kind = match point.typ.map(|t| t.to_string()).as_deref() {
            Some("bind") => MountKind::Bind,
            Some("volume") => MountKind::Volume,
            Some("tmpfs") => MountKind::Tmpfs,
            Some(other) => MountKind::Other(other.to_owned()),
            None => MountKind::Other(String::new()),
        };
        let source = match kind {
            MountKind::Volume => point.name.or(point.source).unwrap_or_default(),
            _ => point.source.unwrap_or_default(),
        };
        let destination = point
            .destination
            .filter(|d| !d.is_empty())
            .ok_or_else(|| parse_failure("mount without Destination"))?;
        mounts.push(Mount {
            kind,
            source,
            destination,
            read_only: !point.rw.unwrap_or(true),
            tmpfs_options: None,
        });
    }

    // HostConfig.Tmpfs 항목은 Mounts에 나타나지 않습니다.
    let tmpfs: BTreeMap<String, String> = host.tmpfs.unwrap_or_default().into_iter().collect();
    for (destination, options) in tmpfs {
        if let Some(existing) = mounts.iter_mut().find(|m| m.destination == destination) {
            if existing.kind == MountKind::Tmpfs && !options.is_empty() {
                existing.tmpfs_options = Some(options);
            }
            continue;
        }
        mounts.push(Mount {
            kind: MountKind::Tmpfs,
            source: String::new(),
            destination,
            read_only: false,
            tmpfs_options: (!options.is_empty()).then_some(options),
        });
    }

    let devices = host
        .devices
        .unwrap_or_default()
        .into_iter()
        .map(|d| Device {
            host_path: d.path_on_host.unwrap_or_default(),
            container_path: d.path_in_container.unwrap_or_default(),
            permissions: d.cgroup_permissions.unwrap_or_default(),
        })
        .collect();

    Ok(ContainerDescriptor {
        id: container_id,
        name,
        image,
        image_id,
        platform: None,
        hostname: config.hostname.unwrap_or_default(),
        user: config.user.unwrap_or_default(),
        working_dir: config.working_dir.unwrap_or_default(),
        network_mode: host.network_mode.unwrap_or_default(),
        restart_policy,
        privileged: host.privileged.unwrap_or(false),
        cap_add: host.cap_add.unwrap_or_default(),
        cap_drop: host.cap_drop.unwrap_or_default(),
        extra_hosts: host.extra_hosts.unwrap_or_default(),
        ports,
        mounts,
        devices,
        shm_size: host.shm_size.unwrap_or(0),
        env: config.env.unwrap_or_default(),
        labels: config.labels.unwrap_or_default().into_iter().collect(),
        entrypoint: config.entrypoint.unwrap_or_default(),
        cmd: config.cmd.unwrap_or_default(),
    })
}

/// 실행 중인 컨테이너를 compose 프로젝트별로 묶습니다.
///
/// 프로젝트 라벨이 없는 컨테이너는 제외됩니다. 작업 디렉토리와 설정 파일 목록은
/// 해당 라벨을 가진 첫 번째 멤버의 값을 사용합니다.
pub fn group_projects(containers: &[ContainerSummary]) -> Vec<ComposeProject> {
    let mut projects: Vec<ComposeProject> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for container in containers {
        let Some(name) = container.compose_project() else {
            continue;
        };
        let slot = *index.entry(name.to_owned()).or_insert_with(|| {
            projects.push(ComposeProject {
                name: name.to_owned(),
                working_dir: None,
                config_files: Vec::new(),
                members: Vec::new(),
            });
            projects.len() - 1
        });
        let project = &mut projects[slot];
        project.members.push(container.id.clone());

        if project.working_dir.is_none() {
            project.working_dir = container
                .labels
                .get(COMPOSE_WORKING_DIR_LABEL)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from);
        }
        if project.config_files.is_empty() {
            if let Some(files) = container.labels.get(COMPOSE_CONFIG_FILES_LABEL) {
                project.config_files = files
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(PathBuf::from)
                    .collect();
            }
        }
    }

    projects
}

/// compose 라벨이 없는 (독립) 컨테이너만 남깁니다.
pub fn standalone(containers: &[ContainerSummary]) -> Vec<ContainerSummary> {
    containers
        .iter()
        .filter(|c| c.compose_project().is_none())
        .cloned()
        .collect()
}

/// 런타임 조회기
///
/// [`DockerClient`] 위에서 서술자 조회와 프로젝트 도출을 제공합니다.
pub struct Introspector<D: DockerClient> {
    docker: Arc<D>,
}

impl<D: DockerClient> Introspector<D> {
    /// 새 조회기를 생성합니다.
    pub fn new(docker: Arc<D>) -> Self {
        Self { docker }
    }

    /// 컨테이너 서술자를 조회합니다.
    ///
    /// 현재 이미지의 플랫폼도 함께 기록합니다. 플랫폼 조회 실패는 에러가 아닙니다.
    pub async fn describe(&self, id: &str) -> Result<ContainerDescriptor, RuntimeError> {
        let mut descriptor = self.docker.inspect_container(id).await?;
        if descriptor.platform.is_none() {
            match self.docker.inspect_image(&descriptor.image_id).await {
                Ok(image) => descriptor.platform = image.platform,
                Err(e) => debug!(
                    container = %descriptor.name,
                    error = %e,
                    "image platform unavailable"
                ),
            }
        }
        Ok(descriptor)
    }

    /// 실행 중인 compose 프로젝트를 발견 순서대로 반환합니다.
    pub async fn list_projects(&self) -> Result<Vec<ComposeProject>, RuntimeError> {
        let containers = self.docker.list_containers().await?;
        Ok(group_projects(&containers))
    }
}
