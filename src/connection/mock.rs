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

//! In-memory connection replaying canned outputs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{Connection, ExecutionResult};

#[derive(Debug, Clone)]
enum Response {
    Output(ExecutionResult),
    Missing,
}

#[derive(Debug, Default)]
struct Inner {
    responses: Vec<(Vec<String>, Response)>,
    calls: Vec<Vec<String>>,
    files: BTreeMap<PathBuf, (Vec<u8>, u32)>,
    written: Vec<PathBuf>,
    fail_delete: bool,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct MockConnection {
    inner: Arc<Mutex<Inner>>,
}

impl MockConnection {
    /// Answer every invocation whose arguments start with `args`.
    /// Later registrations take precedence.
    pub(crate) fn respond(&self, args: &[&str], status: i32, stdout: &str, stderr: &str) -> &Self {
        self.inner.lock().unwrap().responses.push((
            args.iter().map(ToString::to_string).collect(),
            Response::Output(ExecutionResult {
                status,
                stdout: stdout.to_owned(),
                stderr: stderr.to_owned(),
            }),
        ));
        self
    }

    /// Behave as if the program did not exist
    pub(crate) fn missing_program(&self) -> &Self {
        self.inner
            .lock()
            .unwrap()
            .responses
            .push((Vec::new(), Response::Missing));
        self
    }

    pub(crate) fn fail_delete(&self) -> &Self {
        self.inner.lock().unwrap().fail_delete = true;
        self
    }

    /// Every invocation so far, program first
    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Files currently present
    pub(crate) fn files(&self) -> BTreeMap<PathBuf, (Vec<u8>, u32)> {
        self.inner.lock().unwrap().files.clone()
    }

    /// Every path ever written
    pub(crate) fn written(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().written.clone()
    }
}

#[async_trait]
impl Connection for MockConnection {
    const NAME: &'static str = "mock";

    async fn execute(&self, program: &str, args: &[&str]) -> Result<ExecutionResult> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(
            std::iter::once(program)
                .chain(args.iter().copied())
                .map(ToString::to_string)
                .collect(),
        );

        let response = inner
            .responses
            .iter()
            .rev()
            .find(|(prefix, _)| {
                prefix.len() <= args.len() && prefix.iter().zip(args).all(|(p, a)| p == a)
            })
            .map(|(_, response)| response.clone());

        match response {
            Some(Response::Output(res)) => Ok(res),
            Some(Response::Missing) => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{program}: not found"),
            )
            .into()),
            None => Ok(ExecutionResult {
                status: 1,
                stdout: String::new(),
                stderr: format!("unexpected command: {}", args.join(" ")),
            }),
        }
    }

    async fn write(&self, path: &Path, content: &[u8], mode: u32) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .files
            .insert(path.to_owned(), (content.to_owned(), mode));
        inner.written.push(path.to_owned());
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_delete {
            return Err(anyhow!("{}: permission denied", path.display()));
        }
        match inner.files.remove(path) {
            Some(_) => Ok(()),
            None => Err(anyhow!("{}: no such file", path.display())),
        }
    }
}
