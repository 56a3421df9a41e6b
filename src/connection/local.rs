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
use std::process::Stdio;

use anyhow::Result;
use async_process::Command;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::{Connection, ExecutionResult};

#[derive(Clone, Debug, Default)]
pub struct ConnectionLocal {}

#[async_trait]
impl Connection for ConnectionLocal {
    const NAME: &'static str = "local";

    async fn execute(&self, program: &str, args: &[&str]) -> Result<ExecutionResult> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await?;

        Ok(ExecutionResult {
            // Killed by a signal
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn write(&self, path: &Path, content: &[u8], mode: u32) -> Result<()> {
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(mode);
        #[cfg(not(unix))]
        let _ = mode;

        let mut file = options.open(path).await?;
        file.write_all(content).await?;
        file.flush().await?;
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_file(path).await?;
        Ok(())
    }
}
