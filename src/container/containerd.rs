//! containerd container runtime client: container/task/pid enumeration
//! over the containerd gRPC API against the configured UNIX socket, using
//! the `Containers`, `Tasks.list_pids` and `Namespaces` services. Built
//! from `containerd-client`'s own documented service surface, mirroring
//! the connection/probe/enumerate shape of `docker.rs` so the two
//! decorators read as siblings.

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use containerd_client::services::v1::containers_client::ContainersClient;
use containerd_client::services::v1::namespaces_client::NamespacesClient;
use containerd_client::services::v1::tasks_client::TasksClient;
use containerd_client::services::v1::{
    ListContainersRequest, ListNamespacesRequest, ListPidsRequest,
};
use containerd_client::tonic::transport::Channel;
use containerd_client::tonic::Request;
use containerd_client::{connect, with_namespace};
use tracing::debug;

use super::{ContainerMetadata, Decorator, MapDecorator, NotRunningDedupe, RuntimeAvailability};
use crate::config::AgentConfig;
use crate::pidcache::PidsCache;

pub struct ContainerdClient {
    socket_path: String,
    channel: Option<Channel>,
    availability: RuntimeAvailability,
    retry_budget: u32,
    /// Namespace excluded from enumeration to avoid double-counting
    /// containers the Docker decorator already reports.
    docker_shim_namespace: String,
    not_running: NotRunningDedupe,
    pids_cache: PidsCache,
}

impl ContainerdClient {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            socket_path: config.containerd_socket.clone(),
            channel: None,
            availability: RuntimeAvailability::new(),
            retry_budget: config.runtime_retry_budget,
            docker_shim_namespace: config.containerd_docker_namespace.clone(),
            not_running: NotRunningDedupe::new(),
            pids_cache: PidsCache::new(config.pids_cache_ttl),
        }
    }

    /// Probes the containerd socket. A present-but-wrong
    /// file mode (not a socket) is treated the same as absent.
    pub async fn enabled(&mut self) -> bool {
        let reachable = match connect(&self.socket_path).await {
            Ok(channel) => {
                self.channel = Some(channel);
                true
            }
            Err(err) => {
                debug!(socket = %self.socket_path, error = %err, "containerd socket unreachable");
                false
            }
        };
        self.availability.record_probe(reachable, self.retry_budget);
        self.availability.is_enabled()
    }

    pub async fn new_decorator(&mut self) -> Result<Box<dyn Decorator>> {
        let channel = self
            .channel
            .clone()
            .ok_or_else(|| anyhow!("containerd channel not initialized"))?;

        let namespaces = self.list_namespaces(channel.clone()).await?;
        let mut by_pid = HashMap::new();
        let mut container_count = 0usize;

        for ns in namespaces {
            // Exclude the Docker-in-containerd namespace to avoid counting
            // the same containers the Docker decorator already reports.
            if ns == self.docker_shim_namespace {
                continue;
            }

            let mut containers_client = ContainersClient::new(channel.clone());
            let request = with_namespace!(
                ListContainersRequest { filters: vec![] },
                ns
            );
            let response = containers_client
                .list(Request::new(request))
                .await
                .context("listing containerd containers")?
                .into_inner();

            for container in response.containers {
                let (cached_pids, hit) = self.pids_cache.get(&container.id);
                let pids = if hit {
                    cached_pids.unwrap_or_default()
                } else {
                    match self.task_pids(channel.clone(), &ns, &container.id).await {
                        Ok(pids) => {
                            self.pids_cache.put(container.id.clone(), pids.clone());
                            pids
                        }
                        Err(err) => {
                            let message = err.to_string();
                            if is_not_found(&message) {
                                // "no task" — container stopped, not fatal.
                                self.not_running.log_once(&container.id, &message);
                                continue;
                            }
                            return Err(err).context("listing containerd task pids");
                        }
                    }
                };

                let metadata = ContainerMetadata {
                    id: container.id.clone(),
                    name: container.id.clone(),
                    image_id: container.image.clone(),
                    image_name: container.image.clone(),
                    labels: container.labels.clone(),
                };
                for pid in pids {
                    by_pid.insert(pid, metadata.clone());
                }

                container_count += 1;
            }
        }

        self.pids_cache.compact_to(container_count);

        Ok(Box::new(MapDecorator::new(by_pid)))
    }

    async fn list_namespaces(&self, channel: Channel) -> Result<Vec<String>> {
        let mut client = NamespacesClient::new(channel);
        let response = client
            .list(Request::new(ListNamespacesRequest {}))
            .await
            .context("listing containerd namespaces")?
            .into_inner();
        Ok(response.namespaces.into_iter().map(|ns| ns.name).collect())
    }

    async fn task_pids(&self, channel: Channel, ns: &str, container_id: &str) -> Result<Vec<u32>> {
        let mut client = TasksClient::new(channel);
        let request = with_namespace!(
            ListPidsRequest {
                container_id: container_id.to_string(),
            },
            ns
        );
        let response = client
            .list_pids(Request::new(request))
            .await
            .context("containerd task list_pids")?
            .into_inner();
        Ok(response.processes.into_iter().map(|p| p.pid).collect())
    }
}

fn is_not_found(message: &str) -> bool {
    message.contains("not found") || message.contains("NotFound")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_error_message_is_recognized() {
        assert!(is_not_found("rpc error: code = NotFound desc = task not found"));
        assert!(!is_not_found("rpc error: code = Internal desc = boom"));
    }

    #[test]
    fn docker_shim_namespace_is_configurable() {
        let config = crate::config::tests::base_config();
        let client = ContainerdClient::new(&config);
        assert_eq!(client.docker_shim_namespace, "moby");
    }

    #[test]
    fn runtime_availability_starts_in_probing_state() {
        let config = crate::config::tests::base_config();
        let client = ContainerdClient::new(&config);
        assert!(!client.availability.is_enabled());
    }
}
