//! Docker API abstraction for testability.
//!
//! The [`DockerClient`] trait abstracts the bollard Docker API, allowing
//! production code to use [`BollardDockerClient`] while tests use
//! `MockDockerClient` (behind the `test-util` feature).
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐   ┌──────────────────┐
//! │ RecreationExecutor │   │ Reconciliation   │
//! └─────────┬──────────┘   │ driver           │
//!           │              └────────┬─────────┘
//!           ▼                       ▼
//!         ┌──────────────────────────┐
//!         │   DockerClient (trait)   │
//!         └──────────────────────────┘
//!              │               │
//!              ▼               ▼
//!        ┌─────────┐      ┌────────┐
//!        │ Bollard │      │  Mock  │
//!        └────┬────┘      └────────┘
//!             ▼
//!       Docker Daemon
//! ```
//!
//! # Container ID Validation
//!
//! Methods that accept container IDs validate them before touching the API:
//! - Must be 1-64 characters
//! - Must contain only ASCII hex digits ([0-9a-fA-F])
//!
//! # Examples
//!
//! ```ignore
//! use recast_runtime::BollardDockerClient;
//!
//! let client = BollardDockerClient::connect_local(120)?;
//! client.ping().await?;
//! for summary in client.list_containers().await? {
//!     let descriptor = client.inspect_container(&summary.id).await?;
//!     println!("{} -> {}", descriptor.name, descriptor.image_id);
//! }
//! # Ok::<(), recast_runtime::RuntimeError>(())
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bollard::models::{
    DeviceMapping, HostConfig, PortBinding as ApiPortBinding, RestartPolicy as ApiRestartPolicy,
    RestartPolicyNameEnum,
};
use futures_util::TryStreamExt;
use recast_core::launch::{LaunchArg, LaunchSpec};
use recast_core::types::{ContainerDescriptor, ContainerSummary, ImageDetails, PruneSummary};
use tracing::debug;

use crate::error::RuntimeError;
use crate::introspect::descriptor_from_inspect;

/// Validates a container ID before it is interpolated into an API path.
///
/// Docker container IDs are 64-character hex strings (or shorter prefix forms).
pub fn validate_container_id(id: &str) -> Result<(), RuntimeError> {
    if id.is_empty() || id.len() > 64 {
        return Err(RuntimeError::Api(format!(
            "invalid container ID: length {} (must be 1-64)",
            id.len()
        )));
    }
    if !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(RuntimeError::Api(
            "invalid container ID: contains non-hex characters".to_owned(),
        ));
    }
    Ok(())
}

/// How an image pull is scoped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullScope {
    /// Pull the single reference, optionally pinned to a platform (`os/arch[/variant]`).
    Pinned(Option<String>),
    /// Pull every tag of the repository, no platform pin.
    AllTags,
}

/// Trait abstracting Docker API operations.
///
/// All runtime calls go through this trait, enabling testability via mocking.
/// The trait is `Send + Sync + 'static`, allowing the client to be shared behind an `Arc`.
///
/// # Error Handling
///
/// - **404 errors**: Converted to `RuntimeError::NotFound`
/// - **Connection errors**: Wrapped as `RuntimeError::Connection`
/// - **Malformed inspect data**: `RuntimeError::ParseFailure`, never a partial descriptor
/// - **Everything else**: `RuntimeError::Api`
pub trait DockerClient: Send + Sync + 'static {
    /// Checks Docker daemon connectivity.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Connection` if the daemon is unreachable.
    fn ping(&self) -> impl Future<Output = Result<(), RuntimeError>> + Send;

    /// Lists running containers in the order the daemon reports them.
    ///
    /// Stopped/exited containers are never returned.
    fn list_containers(
        &self,
    ) -> impl Future<Output = Result<Vec<ContainerSummary>, RuntimeError>> + Send;

    /// Inspects a container and returns its full runtime configuration.
    ///
    /// # Errors
    ///
    /// - `RuntimeError::NotFound`: container does not exist (404)
    /// - `RuntimeError::ParseFailure`: inspect data is missing required sections
    fn inspect_container(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<ContainerDescriptor, RuntimeError>> + Send;

    /// Resolves an image reference (or id) to its local identity.
    ///
    /// # Errors
    ///
    /// - `RuntimeError::NotFound`: the reference is not present locally
    fn inspect_image(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<ImageDetails, RuntimeError>> + Send;

    /// Pulls an image reference from its registry.
    fn pull_image(
        &self,
        reference: &str,
        scope: &PullScope,
    ) -> impl Future<Output = Result<(), RuntimeError>> + Send;

    /// Stops a container, waiting up to `timeout_secs` before the daemon kills it.
    fn stop_container(
        &self,
        id: &str,
        timeout_secs: u64,
    ) -> impl Future<Output = Result<(), RuntimeError>> + Send;

    /// Removes a stopped container. Volumes are kept.
    fn remove_container(&self, id: &str) -> impl Future<Output = Result<(), RuntimeError>> + Send;

    /// Creates a container from a launch spec and returns the new container ID.
    ///
    /// The container name is taken from the launch spec's `--name` argument.
    fn create_container(
        &self,
        spec: &LaunchSpec,
    ) -> impl Future<Output = Result<String, RuntimeError>> + Send;

    /// Starts a created container.
    fn start_container(&self, id: &str) -> impl Future<Output = Result<(), RuntimeError>> + Send;

    /// Removes dangling images and reports what was reclaimed.
    fn prune_dangling_images(
        &self,
    ) -> impl Future<Output = Result<PruneSummary, RuntimeError>> + Send;
}

/// Production Docker client implementation using `bollard`.
///
/// Communicates with the Docker daemon via a Unix socket or TCP connection.
/// Internally uses `Arc<bollard::Docker>` for cheap cloning.
#[derive(Clone)]
pub struct BollardDockerClient {
    docker: Arc<bollard::Docker>,
    api_timeout: Duration,
}

impl BollardDockerClient {
    /// Connects to Docker using the local defaults (`DOCKER_HOST` or the platform socket).
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Connection` if the client cannot be configured.
    /// Reachability is only checked by [`DockerClient::ping`].
    pub fn connect_local(timeout_secs: u64) -> Result<Self, RuntimeError> {
        let docker = bollard::Docker::connect_with_local_defaults()
            .map_err(|e| RuntimeError::Connection(format!("failed to connect to docker: {e}")))?
            .with_timeout(Duration::from_secs(timeout_secs));
        Ok(Self {
            docker: Arc::new(docker),
            api_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Connects to Docker using a specific socket path.
    pub fn connect_with_socket(socket_path: &str, timeout_secs: u64) -> Result<Self, RuntimeError> {
        let docker = bollard::Docker::connect_with_socket(
            socket_path,
            timeout_secs,
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(|e| {
            RuntimeError::Connection(format!("failed to connect to docker at {socket_path}: {e}"))
        })?;
        Ok(Self {
            docker: Arc::new(docker),
            api_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Connects using an explicit socket when given, otherwise the local defaults.
    pub fn connect(socket: Option<&str>, timeout_secs: u64) -> Result<Self, RuntimeError> {
        match socket {
            Some(path) => Self::connect_with_socket(path, timeout_secs),
            None => Self::connect_local(timeout_secs),
        }
    }
}

/// Client-side deadline for a stop request: the graceful stop window plus the
/// regular API timeout for the kill and the response.
fn stop_request_timeout(stop_timeout_secs: u64, api_timeout: Duration) -> Duration {
    Duration::from_secs(stop_timeout_secs).saturating_add(api_timeout)
}

fn map_api_error(subject: &str, context: &str, err: bollard::errors::Error) -> RuntimeError {
    match err {
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        } => RuntimeError::NotFound(subject.to_owned()),
        other => RuntimeError::Api(format!("{context} failed for '{subject}': {other}")),
    }
}

impl DockerClient for BollardDockerClient {
    async fn ping(&self) -> Result<(), RuntimeError> {
        self.docker
            .ping()
            .await
            .map_err(|e| RuntimeError::Connection(format!("ping failed: {e}")))?;
        Ok(())
    }

    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        use bollard::container::ListContainersOptions;

        let options = ListContainersOptions::<String> {
            all: false,
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| RuntimeError::Api(format!("list containers failed: {e}")))?;

        let mut result = Vec::with_capacity(containers.len());
        for container in containers {
            let Some(id) = container.id else {
                continue;
            };
            let name = container
                .names
                .unwrap_or_default()
                .first()
                .map(|n| n.trim_start_matches('/').to_owned())
                .unwrap_or_default();
            result.push(ContainerSummary {
                id,
                name,
                image: container.image.unwrap_or_default(),
                labels: container.labels.unwrap_or_default().into_iter().collect(),
            });
        }

        Ok(result)
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDescriptor, RuntimeError> {
        validate_container_id(id)?;

        let details = self
            .docker
            .inspect_container(id, None)
            .await
            .map_err(|e| map_api_error(id, "inspect container", e))?;

        descriptor_from_inspect(id, details)
    }

    async fn inspect_image(&self, reference: &str) -> Result<ImageDetails, RuntimeError> {
        let image = self
            .docker
            .inspect_image(reference)
            .await
            .map_err(|e| map_api_error(reference, "inspect image", e))?;

        let id = image.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            RuntimeError::Api(format!("image '{reference}' has no content-addressed id"))
        })?;

        let platform = match (image.os, image.architecture) {
            (Some(os), Some(arch)) if !os.is_empty() && !arch.is_empty() => {
                match image.variant.filter(|v| !v.is_empty()) {
                    Some(variant) => Some(format!("{os}/{arch}/{variant}")),
                    None => Some(format!("{os}/{arch}")),
                }
            }
            _ => None,
        };

        Ok(ImageDetails { id, platform })
    }

    async fn pull_image(&self, reference: &str, scope: &PullScope) -> Result<(), RuntimeError> {
        use bollard::image::CreateImageOptions;

        let (from_image, platform) = match scope {
            PullScope::Pinned(platform) => (reference.to_owned(), platform.clone()),
            PullScope::AllTags => (repository_of(reference).to_owned(), None),
        };

        let options = CreateImageOptions {
            from_image,
            platform: platform.unwrap_or_default(),
            ..Default::default()
        };

        let mut stream = Box::pin(self.docker.create_image(Some(options), None, None));
        while let Some(info) = stream
            .try_next()
            .await
            .map_err(|e| map_api_error(reference, "pull image", e))?
        {
            if let Some(status) = info.status {
                debug!(image = reference, status = status.as_str(), "pull progress");
            }
        }
        Ok(())
    }

    async fn stop_container(&self, id: &str, timeout_secs: u64) -> Result<(), RuntimeError> {
        validate_container_id(id)?;

        use bollard::container::StopContainerOptions;

        // The client must not give up while the daemon is still waiting on the container.
        let t = i64::try_from(timeout_secs).unwrap_or(i64::MAX);
        let docker = (*self.docker)
            .clone()
            .with_timeout(stop_request_timeout(timeout_secs, self.api_timeout));
        docker
            .stop_container(id, Some(StopContainerOptions { t }))
            .await
            .map_err(|e| map_api_error(id, "stop container", e))
    }

    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError> {
        validate_container_id(id)?;

        use bollard::container::RemoveContainerOptions;

        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    v: false,
                    force: false,
                    link: false,
                }),
            )
            .await
            .map_err(|e| map_api_error(id, "remove container", e))
    }

    async fn create_container(&self, spec: &LaunchSpec) -> Result<String, RuntimeError> {
        use bollard::container::CreateContainerOptions;

        let name = spec
            .name()
            .ok_or_else(|| RuntimeError::Api("launch spec has no container name".to_owned()))?
            .to_owned();

        let options = CreateContainerOptions {
            name: name.clone(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), container_config(spec))
            .await
            .map_err(|e| map_api_error(&name, "create container", e))?;

        for warning in &response.warnings {
            debug!(container = %name, warning = warning.as_str(), "create warning");
        }
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
        validate_container_id(id)?;

        use bollard::container::StartContainerOptions;

        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| map_api_error(id, "start container", e))
    }

    async fn prune_dangling_images(&self) -> Result<PruneSummary, RuntimeError> {
        use bollard::image::PruneImagesOptions;

        let mut filters = HashMap::new();
        filters.insert("dangling".to_owned(), vec!["true".to_owned()]);

        let response = self
            .docker
            .prune_images(Some(PruneImagesOptions { filters }))
            .await
            .map_err(|e| RuntimeError::Api(format!("prune images failed: {e}")))?;

        Ok(PruneSummary {
            images_deleted: response.images_deleted.map(|d| d.len()).unwrap_or(0),
            space_reclaimed: response
                .space_reclaimed
                .and_then(|s| u64::try_from(s).ok())
                .unwrap_or(0),
        })
    }
}

/// Strips the tag from an image reference, keeping registry ports intact.
///
/// Digest references are returned unchanged since they name a single manifest.
pub fn repository_of(reference: &str) -> &str {
    if reference.contains('@') {
        return reference;
    }
    let last_slash = reference.rfind('/').map(|i| i + 1).unwrap_or(0);
    match reference[last_slash..].rfind(':') {
        Some(colon) => &reference[..last_slash + colon],
        None => reference,
    }
}

fn restart_policy(name: &str, max_retries: i64) -> ApiRestartPolicy {
    let name = match name {
        "always" => RestartPolicyNameEnum::ALWAYS,
        "unless-stopped" => RestartPolicyNameEnum::UNLESS_STOPPED,
        "on-failure" => RestartPolicyNameEnum::ON_FAILURE,
        "no" => RestartPolicyNameEnum::NO,
        _ => RestartPolicyNameEnum::EMPTY,
    };
    ApiRestartPolicy {
        name: Some(name),
        maximum_retry_count: (max_retries > 0).then_some(max_retries),
    }
}

/// Converts a launch spec into the create-container request body.
///
/// Every typed argument maps onto the matching `Config` / `HostConfig` field,
/// so the created container is what `docker run` with the rendered argv would produce.
pub fn container_config(spec: &LaunchSpec) -> bollard::container::Config<String> {
    let mut host = HostConfig::default();
    let mut hostname = None;
    let mut user = None;
    let mut working_dir = None;
    let mut env = Vec::new();
    let mut labels = HashMap::new();
    let mut binds = Vec::new();
    let mut tmpfs = HashMap::new();
    let mut cap_add = Vec::new();
    let mut cap_drop = Vec::new();
    let mut extra_hosts = Vec::new();
    let mut devices = Vec::new();
    let mut port_bindings: HashMap<String, Option<Vec<ApiPortBinding>>> = HashMap::new();

    for arg in &spec.args {
        match arg {
            LaunchArg::Name(_) => {}
            LaunchArg::Hostname(v) => hostname = Some(v.clone()),
            LaunchArg::User(v) => user = Some(v.clone()),
            LaunchArg::Workdir(v) => working_dir = Some(v.clone()),
            LaunchArg::Network(v) => host.network_mode = Some(v.clone()),
            LaunchArg::Restart(policy) => {
                host.restart_policy = Some(restart_policy(&policy.name, policy.max_retries));
            }
            LaunchArg::Privileged => host.privileged = Some(true),
            LaunchArg::CapAdd(v) => cap_add.push(v.clone()),
            LaunchArg::CapDrop(v) => cap_drop.push(v.clone()),
            LaunchArg::AddHost(v) => extra_hosts.push(v.clone()),
            LaunchArg::Device(device) => devices.push(DeviceMapping {
                path_on_host: Some(device.host_path.clone()),
                path_in_container: Some(device.container_path.clone()),
                cgroup_permissions: Some(if device.permissions.is_empty() {
                    "rwm".to_owned()
                } else {
                    device.permissions.clone()
                }),
            }),
            LaunchArg::Publish(port) => {
                port_bindings
                    .entry(port.container_port.clone())
                    .or_insert_with(|| Some(Vec::new()))
                    .get_or_insert_with(Vec::new)
                    .push(ApiPortBinding {
                        host_ip: Some(port.host_ip.clone()).filter(|ip| !ip.is_empty()),
                        host_port: Some(port.host_port.clone()).filter(|p| !p.is_empty()),
                    });
            }
            LaunchArg::Volume { .. } => {
                if let Some(value) = arg.value() {
                    binds.push(value);
                }
            }
            LaunchArg::Tmpfs {
                destination,
                options,
            } => {
                tmpfs.insert(destination.clone(), options.clone().unwrap_or_default());
            }
            LaunchArg::ShmSize(bytes) => host.shm_size = Some(*bytes),
            LaunchArg::Env(v) => env.push(v.clone()),
            LaunchArg::Label { key, value } => {
                labels.insert(key.clone(), value.clone());
            }
        }
    }

    let exposed_ports: HashMap<String, HashMap<(), ()>> = port_bindings
        .keys()
        .map(|port| (port.clone(), HashMap::new()))
        .collect();

    host.binds = (!binds.is_empty()).then_some(binds);
    host.tmpfs = (!tmpfs.is_empty()).then_some(tmpfs);
    host.cap_add = (!cap_add.is_empty()).then_some(cap_add);
    host.cap_drop = (!cap_drop.is_empty()).then_some(cap_drop);
    host.extra_hosts = (!extra_hosts.is_empty()).then_some(extra_hosts);
    host.devices = (!devices.is_empty()).then_some(devices);
    host.port_bindings = (!port_bindings.is_empty()).then_some(port_bindings);

    bollard::container::Config {
        image: Some(spec.image.clone()),
        hostname,
        user,
        working_dir,
        env: (!env.is_empty()).then_some(env),
        labels: (!labels.is_empty()).then_some(labels),
        exposed_ports: (!exposed_ports.is_empty()).then_some(exposed_ports),
        entrypoint: (!spec.entrypoint.is_empty()).then(|| spec.entrypoint.clone()),
        cmd: (!spec.command.is_empty()).then(|| spec.command.clone()),
        host_config: Some(host),
        ..Default::default()
    }
}
