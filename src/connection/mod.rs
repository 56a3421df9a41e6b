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

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

pub mod local;
#[cfg(test)]
pub(crate) mod mock;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionResult {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// stdout followed by stderr, as a terminal would show them
    pub fn combined(&self) -> String {
        match (self.stdout.trim_end(), self.stderr.trim_end()) {
            ("", err) => err.to_owned(),
            (out, "") => out.to_owned(),
            (out, err) => format!("{out}\n{err}"),
        }
    }
}

#[async_trait]
pub trait Connection: Send + Sync + 'static + Default {
    const NAME: &'static str;

    /// execute a program until completion, capturing its outputs
    ///
    /// An error is returned only when the program could not be run at all.
    /// A non-zero exit status is reported through the `ExecutionResult`.
    async fn execute(&self, program: &str, args: &[&str]) -> Result<ExecutionResult>;

    /// Write a file, replacing any previous content
    async fn write(&self, path: &Path, content: &[u8], mode: u32) -> Result<()>;

    /// Delete a file
    async fn delete(&self, path: &Path) -> Result<()>;
}
