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

use serde::Deserialize;

/// One entry of `k3d cluster list --output json`
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInfo {
    pub name: String,
    #[serde(default)]
    pub servers_count: i64,
    #[serde(default)]
    pub servers_running: i64,
    #[serde(default)]
    pub agents_count: i64,
    #[serde(default)]
    pub agents_running: i64,
}

impl ClusterInfo {
    pub fn is_running(&self) -> bool {
        self.servers_running >= self.servers_count
    }
}

pub(crate) fn parse_cluster_list(stdout: &str) -> Result<Vec<ClusterInfo>, serde_json::Error> {
    let stdout = stdout.trim();
    if stdout.is_empty() || stdout == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(stdout)
}
