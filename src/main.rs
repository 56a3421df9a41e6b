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

use anyhow::Result;
use tf_provider::serve;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::k3d_provider::K3dProvider;

mod cluster;
mod connection;
mod k3d;
mod k3d_provider;
mod utils;

/// Log filter, in `RUST_LOG` syntax
const LOG_ENV: &str = "TF_PROVIDER_K3D_LOG";

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    serve("k3d", K3dProvider::default()).await?;
    Ok(())
}

// stdout carries the plugin handshake, Terraform collects stderr
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false),
        )
        .with(filter)
        .init();
}
