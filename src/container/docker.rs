//! Docker container runtime client: enumerates every running container on
//! the host via `bollard`, using its `top_processes` call and "locate the
//! PID column by title" parsing to resolve host pids per container.

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use bollard::query_parameters::{InspectContainerOptions, ListContainersOptions};
use bollard::Docker;
use tracing::{debug, warn};

use super::{ContainerMetadata, Decorator, MapDecorator, NotRunningDedupe, RuntimeAvailability};
use crate::config::AgentConfig;
use crate::pidcache::PidsCache;

pub struct DockerClient {
    docker: Option<Docker>,
    availability: RuntimeAvailability,
    retry_budget: u32,
    not_running: NotRunningDedupe,
    pids_cache: PidsCache,
}

impl DockerClient {
    pub fn new(config: &AgentConfig) -> Self {
        let socket_path = config
            .docker_host
            .strip_prefix("unix://")
            .unwrap_or(&config.docker_host);
        let docker = Docker::connect_with_unix(socket_path, 10, bollard::API_DEFAULT_VERSION).ok();
        Self {
            docker,
            availability: RuntimeAvailability::new(),
            retry_budget: config.runtime_retry_budget,
            not_running: NotRunningDedupe::new(),
            pids_cache: PidsCache::new(config.pids_cache_ttl),
        }
    }

    /// Probes the Docker socket. On success the client is marked
    /// `Available`; on failure the retry budget advances and,
    /// once exhausted, the client permanently reports `enabled() == false`.
    pub async fn enabled(&mut self) -> bool {
        let reachable = match &self.docker {
            Some(docker) => docker.ping().await.is_ok(),
            None => false,
        };
        self.availability.record_probe(reachable, self.retry_budget);
        self.availability.is_enabled()
    }

    /// Enumerates every running container and its host pids (via `top`),
    /// building the decorator for this pass.
    pub async fn new_decorator(&mut self) -> Result<Box<dyn Decorator>> {
        let docker = self
            .docker
            .as_ref()
            .ok_or_else(|| anyhow!("docker client not initialized"))?;

        let containers = docker
            .list_containers(Some(ListContainersOptions {
                all: false,
                ..Default::default()
            }))
            .await
            .context("listing docker containers")?;

        let mut by_pid = HashMap::new();
        let mut container_count = 0usize;
        for summary in containers {
            let id = match &summary.id {
                Some(id) => id.clone(),
                None => continue,
            };
            let name = summary
                .names
                .as_ref()
                .and_then(|n| n.first())
                .map(|n| n.trim_start_matches('/').to_string())
                .unwrap_or_else(|| id.clone());

            let (cached_pids, hit) = self.pids_cache.get(&id);
            let pids = if hit {
                cached_pids.unwrap_or_default()
            } else {
                match self.container_pids(docker, &id).await {
                    Ok(pids) => {
                        self.pids_cache.put(id.clone(), pids.clone());
                        pids
                    }
                    Err(err) => {
                        let message = err.to_string();
                        if let Some(container_id) = super::extract_not_running_id(&message) {
                            self.not_running.log_once(&container_id, &message);
                            continue;
                        }
                        return Err(err).context("listing docker container processes");
                    }
                }
            };

            let (image_name, image_id) = self.image_info(docker, &id).await;
            let labels = summary.labels.clone().unwrap_or_default();

            let metadata = ContainerMetadata {
                id: id.clone(),
                name,
                image_id,
                image_name,
                labels,
            };
            for pid in pids {
                by_pid.insert(pid, metadata.clone());
            }

            container_count += 1;
        }

        self.pids_cache.compact_to(container_count);

        Ok(Box::new(MapDecorator::new(by_pid)))
    }

    async fn container_pids(&self, docker: &Docker, id: &str) -> Result<Vec<u32>> {
        let top = docker
            .top_processes(id, None)
            .await
            .context("docker top")?;

        let titles = top.titles.unwrap_or_default();
        let pid_col = titles
            .iter()
            .position(|t| t == "PID")
            .ok_or_else(|| anyhow!("docker top response has no PID column (titles: {titles:?})"))?;

        let processes = top.processes.unwrap_or_default();
        Ok(processes
            .iter()
            .filter_map(|row| row.get(pid_col)?.parse::<u32>().ok())
            .collect())
    }

    async fn image_info(&self, docker: &Docker, id: &str) -> (String, String) {
        match docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
        {
            Ok(detail) => {
                let image_id = detail.image.unwrap_or_default();
                let image_name = detail
                    .config
                    .and_then(|c| c.image)
                    .unwrap_or_else(|| image_id.clone());
                (image_name, image_id)
            }
            Err(err) => {
                debug!(container_id = id, error = %err, "failed to inspect container for image info");
                (String::new(), String::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_not_running_container_id_from_bollard_style_message() {
        let id = super::super::extract_not_running_id("Container 9f8e is not running");
        assert_eq!(id, Some("9f8e".to_string()));
    }

    #[test]
    fn pid_column_lookup_matches_exact_title() {
        let titles = vec!["UID".to_string(), "PID".to_string(), "CMD".to_string()];
        let pos = titles.iter().position(|t| t == "PID");
        assert_eq!(pos, Some(1));
    }

    #[test]
    fn missing_pid_column_is_reported_with_titles() {
        let titles = vec!["UID".to_string(), "CMD".to_string()];
        let pos = titles.iter().position(|t| t == "PID");
        assert!(pos.is_none());
        let err = format!("docker top response has no PID column (titles: {titles:?})");
        assert!(err.contains("UID"));
        assert!(err.contains("CMD"));
    }

    #[test]
    fn runtime_availability_starts_in_probing_state() {
        let config = crate::config::tests::base_config();
        let client = DockerClient::new(&config);
        assert!(!client.availability.is_enabled());
    }
}
