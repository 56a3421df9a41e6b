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

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType};
use tf_provider::value::ValueString;
use tf_provider::schema::{Block, Description, Schema};
use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{map, AttributePath, Provider};

use crate::{
    cluster::{K3dClusterDataSource, K3dClusterResource},
    connection::local::ConnectionLocal,
    k3d::{K3d, DEFAULT_PROGRAM},
};

#[derive(Debug, Default, Clone)]
pub struct K3dProvider {
    k3d: K3d<ConnectionLocal>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig<'a> {
    #[serde(borrow = "'a")]
    pub k3d_path: ValueString<'a>,
}

#[async_trait]
impl Provider for K3dProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut tf_provider::Diagnostics) -> Option<tf_provider::schema::Schema> {
        Some(Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "k3d_path" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::markdown(format!(
                            "Path of the k3d executable. Defaults to `{DEFAULT_PROGRAM}`, looked up in `PATH`"
                        )),
                        constraint: AttributeConstraint::Optional,
                        sensitive: false,
                        deprecated: false,
                    },
                },
                description: Description::markdown(
                    "Manages development Kubernetes clusters in Docker with [k3d](https://k3d.io)",
                ),
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(
        &self,
        diags: &mut tf_provider::Diagnostics,
        config: Self::Config<'a>,
    ) -> Option<()> {
        if let Value::Value(path) = &config.k3d_path {
            if path.is_empty() {
                diags.error_short(
                    "`k3d_path` should not be empty",
                    AttributePath::new("k3d_path"),
                );
                return None;
            }
        }
        Some(())
    }

    async fn configure<'a>(
        &self,
        _diags: &mut tf_provider::Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let program = match config.k3d_path {
            Value::Value(path) => path.into_owned(),
            _ => DEFAULT_PROGRAM.to_owned(),
        };
        info!("configuring k3d provider for Terraform {terraform_version}, using `{program}`");
        self.k3d.set_program(program).await;
        Some(())
    }

    fn get_resources(
        &self,
        _diags: &mut tf_provider::Diagnostics,
    ) -> Option<std::collections::HashMap<String, Box<dyn tf_provider::DynamicResource>>>
    {
        Some(map! {
            "cluster" => K3dClusterResource::new(self.k3d.clone()),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut tf_provider::Diagnostics,
    ) -> Option<
        std::collections::HashMap<String, Box<dyn tf_provider::DynamicDataSource>>,
    > {
        Some(map! {
            "cluster" => K3dClusterDataSource::new(self.k3d.clone()),
        })
    }
}
