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

use tf_provider::Diagnostics;
use tracing::warn;

use crate::connection::Connection;
use crate::k3d::{ClusterInfo, Credentials, K3d, Kubeconfig};

use super::report_k3d_error;

pub(super) enum Refreshed {
    Missing,
    Found {
        cluster: ClusterInfo,
        /// None when the kubeconfig could not be fetched or decoded
        kubeconfig: Option<(String, Credentials)>,
    },
}

/// Look the cluster up and fetch its kubeconfig
///
/// Listing failures are errors. Kubeconfig failures are only warnings, the
/// caller decides what to keep.
pub(super) async fn refresh<T: Connection>(
    diags: &mut Diagnostics,
    k3d: &K3d<T>,
    name: &str,
) -> Option<Refreshed> {
    // Both are independent invocations, the kubeconfig is dropped if the cluster is gone
    let (cluster, kubeconfig) = futures::join!(k3d.find_cluster(name), k3d.kubeconfig(name));

    let cluster = match cluster {
        Ok(Some(cluster)) => cluster,
        Ok(None) => return Some(Refreshed::Missing),
        Err(err) => {
            report_k3d_error(diags, "read", name, &err);
            return None;
        }
    };

    if !cluster.is_running() {
        warn!(
            "k3d cluster `{name}` has {}/{} servers and {}/{} agents running",
            cluster.servers_running,
            cluster.servers_count,
            cluster.agents_running,
            cluster.agents_count
        );
        diags.root_warning(
            "k3d cluster is not running",
            format!(
                "Only {} of the {} servers of the cluster `{name}` are running.\nStart it with `k3d cluster start {name}`.",
                cluster.servers_running, cluster.servers_count
            ),
        );
    }

    let kubeconfig = match kubeconfig {
        Ok(raw) => match Kubeconfig::parse(&raw).and_then(|config| config.credentials()) {
            Ok(credentials) => Some((raw, credentials)),
            Err(err) => {
                diags.root_warning(
                    "Unable to decode the kubeconfig",
                    format!("The kubeconfig of the k3d cluster `{name}` is unusable: {err}"),
                );
                None
            }
        },
        Err(err) => {
            diags.root_warning(
                "Unable to get the kubeconfig",
                format!("`k3d kubeconfig get {name}` failed: {err}"),
            );
            None
        }
    };

    Some(Refreshed::Found {
        cluster,
        kubeconfig,
    })
}
