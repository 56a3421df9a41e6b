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

use std::path::PathBuf;

use crypto::{digest::Digest, md5::Md5};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use tf_provider::{AttributePath, Diagnostics};

use crate::k3d::K3dError;

mod data_source;
mod read;
mod resource;
mod state;
mod validate;

pub use data_source::K3dClusterDataSource;
pub use resource::K3dClusterResource;

/// Hex MD5 of the k3d configuration, used as resource id
///
/// The configuration is hashed in its quoted form (`"apiVersion: ...\n"`),
/// which keeps the ids of clusters created by earlier releases.
fn checksum(config: &str) -> String {
    let quoted = serde_json::Value::from(config).to_string();
    let mut md5 = Md5::new();
    md5.input_str(&quoted);
    md5.result_str()
}

/// Temporary file receiving the configuration for `k3d cluster create`
///
/// The random suffix keeps concurrent creations with the same configuration apart.
fn temp_config_path(checksum: &str) -> PathBuf {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    std::env::temp_dir().join(format!("k3d-config-{checksum}-{suffix}.yaml"))
}

fn report_k3d_error(diags: &mut Diagnostics, action: &str, name: &str, err: &K3dError) {
    match err {
        K3dError::NotInstalled { program, output } => diags.root_error(
            "k3d is not installed",
            format!(
                "`{program}` could not be executed to {action} the cluster `{name}`: {output}\nInstall k3d (https://k3d.io) and Docker, or set the `k3d_path` attribute of the provider."
            ),
        ),
        K3dError::PermissionDenied { output } => diags.root_error(
            "k3d cannot access Docker",
            format!(
                "Permission denied while trying to {action} the cluster `{name}`. Check that the user running Terraform can use Docker.\n{output}"
            ),
        ),
        K3dError::AlreadyExists { output } => diags.error(
            "k3d cluster already exists",
            format!(
                "A k3d cluster named `{name}` already exists. Import it with `terraform import` or delete it with `k3d cluster delete {name}`.\n{output}"
            ),
            AttributePath::new("name"),
        ),
        K3dError::SchemaValidation { output } => diags.error(
            "Invalid k3d configuration",
            output.clone(),
            AttributePath::new("k3d_config"),
        ),
        K3dError::Failed { status, output } => diags.root_error(
            format!("Failed to {action} k3d cluster"),
            format!("k3d exited with status code {status} for the cluster `{name}`:\n{output}"),
        ),
        K3dError::Parse(err) => diags.root_error(
            "Unable to parse k3d output",
            format!("Failed to {action} the cluster `{name}`: {err}"),
        ),
        K3dError::Io(err) => diags.root_error(
            format!("Failed to {action} k3d cluster"),
            format!("{err:#}"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"apiVersion: k3d.io/v1alpha4
kind: Simple

# Expose ports 80 via 8080 and 443 via 8443.
ports:
  - port: 3080:80
    nodeFilters:
      - loadbalancer
  - port: 3443:443
    nodeFilters:
      - loadbalancer

registries:
  create:
    name: dev
    hostPort: "5000"
"#;

    #[test]
    fn checksum_of_quoted_config() {
        assert_eq!(checksum(CONFIG), "42f6391d7823ace7eb7d2d71ea5fb771");

        let id = checksum("apiVersion: k3d.io/v1alpha4\nkind: Simple\n");
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, checksum(CONFIG));
    }

    #[test]
    fn temp_config_paths_differ() {
        let a = temp_config_path("abc");
        let b = temp_config_path("abc");
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(std::env::temp_dir().as_path()));
        let file_name = a.file_name().unwrap().to_str().unwrap();
        assert!(file_name.starts_with("k3d-config-abc-"));
        assert!(file_name.ends_with(".yaml"));
    }

    #[test]
    fn k3d_errors_are_attached_to_attributes() {
        let mut diags = Diagnostics::default();
        report_k3d_error(
            &mut diags,
            "create",
            "dev",
            &K3dError::SchemaValidation {
                output: "Schema Validation failed".into(),
            },
        );
        report_k3d_error(
            &mut diags,
            "create",
            "dev",
            &K3dError::Failed {
                status: 2,
                output: "boom".into(),
            },
        );
        assert_eq!(diags.errors.len(), 2);
        assert!(diags.warnings.is_empty());
    }
}
