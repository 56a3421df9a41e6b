// This file is part of the terraform-provider-k3d project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Thin client over the `k3d` command line

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::connection::{Connection, ExecutionResult};

mod cluster;
mod kubeconfig;

pub use cluster::ClusterInfo;
pub use kubeconfig::{Credentials, Kubeconfig};

pub const DEFAULT_PROGRAM: &str = "k3d";

#[derive(Debug, Error)]
pub enum K3dError {
    #[error("`{program}` could not be executed: {output}")]
    NotInstalled { program: String, output: String },
    #[error("permission denied: {output}")]
    PermissionDenied { output: String },
    #[error("cluster already exists: {output}")]
    AlreadyExists { output: String },
    #[error("invalid k3d configuration: {output}")]
    SchemaValidation { output: String },
    #[error("k3d failed with status code {status}: {output}")]
    Failed { status: i32, output: String },
    #[error("unable to parse k3d output: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Io(anyhow::Error),
}

impl K3dError {
    fn from_failure(program: &str, res: &ExecutionResult) -> Self {
        let output = res.combined();
        if output.contains("executable file not found") {
            K3dError::NotInstalled {
                program: program.to_owned(),
                output,
            }
        } else if output.contains("permission denied") {
            K3dError::PermissionDenied { output }
        } else if output.contains("already exists") {
            K3dError::AlreadyExists { output }
        } else if output.contains("Schema Validation failed") {
            K3dError::SchemaValidation { output }
        } else {
            K3dError::Failed {
                status: res.status,
                output,
            }
        }
    }

    fn from_spawn(program: &str, err: anyhow::Error) -> Self {
        use std::io::ErrorKind;

        // A `k3d_path` pointing to a non-executable file fails with PermissionDenied
        match err.downcast_ref::<std::io::Error>() {
            Some(io) if matches!(io.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                K3dError::NotInstalled {
                    program: program.to_owned(),
                    output: io.to_string(),
                }
            }
            _ => K3dError::Io(err),
        }
    }
}

/// Runs `k3d` through a connection
///
/// Clones share the program path, so the provider configuration reaches
/// every resource created before it.
#[derive(Debug, Clone)]
pub struct K3d<T: Connection> {
    connect: T,
    program: Arc<RwLock<String>>,
}

impl<T: Connection> Default for K3d<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Connection> K3d<T> {
    pub fn new(connect: T) -> Self {
        Self {
            connect,
            program: Arc::new(RwLock::new(DEFAULT_PROGRAM.to_owned())),
        }
    }

    pub fn connection(&self) -> &T {
        &self.connect
    }

    pub async fn program(&self) -> String {
        self.program.read().await.clone()
    }

    pub async fn set_program(&self, program: impl Into<String>) {
        *self.program.write().await = program.into();
    }

    async fn run(&self, args: &[&str]) -> Result<ExecutionResult, K3dError> {
        let program = self.program().await;
        debug!(connection = T::NAME, "running `{program} {}`", args.join(" "));

        let res = self
            .connect
            .execute(&program, args)
            .await
            .map_err(|err| K3dError::from_spawn(&program, err))?;

        debug!(status = res.status, "`{program} {}` exited", args.join(" "));
        if res.success() {
            Ok(res)
        } else {
            Err(K3dError::from_failure(&program, &res))
        }
    }

    pub async fn create_cluster(&self, name: &str, config_path: &Path) -> Result<(), K3dError> {
        info!("creating k3d cluster `{name}`");
        let config_path = config_path.to_string_lossy();
        self.run(&["cluster", "create", name, "--config", &config_path])
            .await?;
        info!("k3d cluster `{name}` created");
        Ok(())
    }

    pub async fn list_clusters(&self) -> Result<Vec<ClusterInfo>, K3dError> {
        let res = self.run(&["cluster", "list", "--output", "json"]).await?;
        Ok(cluster::parse_cluster_list(&res.stdout)?)
    }

    pub async fn find_cluster(&self, name: &str) -> Result<Option<ClusterInfo>, K3dError> {
        Ok(self
            .list_clusters()
            .await?
            .into_iter()
            .find(|cluster| cluster.name == name))
    }

    /// Raw kubeconfig of the cluster, as YAML
    pub async fn kubeconfig(&self, name: &str) -> Result<String, K3dError> {
        let res = self.run(&["kubeconfig", "get", name]).await?;
        Ok(res.stdout)
    }

    pub async fn delete_cluster(&self, name: &str) -> Result<(), K3dError> {
        info!("deleting k3d cluster `{name}`");
        self.run(&["cluster", "delete", name]).await?;
        info!("k3d cluster `{name}` deleted");
        Ok(())
    }
}
