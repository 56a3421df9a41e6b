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

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{Value, ValueNumber, ValueString};
use tf_provider::{map, Diagnostics};

use crate::k3d::{ClusterInfo, Credentials};
use crate::utils::{WithNormalize, WithSchema};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub name: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub k3d_config: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub kubeconfig: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub host: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub client_certificate: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub client_key: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub cluster_ca_certificate: ValueString<'a>,
    pub servers_count: ValueNumber,
    pub agents_count: ValueNumber,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub name: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub kubeconfig: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub host: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub client_certificate: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub client_key: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub cluster_ca_certificate: ValueString<'a>,
    pub servers_count: ValueNumber,
    pub agents_count: ValueNumber,
}

/// Accessors for the attributes filled from k3d, shared by the resource and
/// the data source
macro_rules! impl_outputs {
    ($($state:ident)+) => {$(
        impl<'a> $state<'a> {
            pub(super) fn set_cluster(&mut self, cluster: &ClusterInfo) {
                self.servers_count = Value::Value(cluster.servers_count);
                self.agents_count = Value::Value(cluster.agents_count);
            }

            /// Store the kubeconfig and its credentials
            ///
            /// Without a kubeconfig, known values are kept and unknown ones become null.
            pub(super) fn set_kubeconfig(&mut self, kubeconfig: Option<(String, Credentials)>) {
                match kubeconfig {
                    Some((raw, credentials)) => {
                        self.kubeconfig = Value::Value(Cow::Owned(raw));
                        self.host = Value::Value(Cow::Owned(credentials.host));
                        self.client_certificate =
                            Value::Value(Cow::Owned(credentials.client_certificate));
                        self.client_key = Value::Value(Cow::Owned(credentials.client_key));
                        self.cluster_ca_certificate =
                            Value::Value(Cow::Owned(credentials.cluster_ca_certificate));
                    }
                    None => {
                        for value in [
                            &mut self.kubeconfig,
                            &mut self.host,
                            &mut self.client_certificate,
                            &mut self.client_key,
                            &mut self.cluster_ca_certificate,
                        ] {
                            if value.is_unknown() {
                                *value = Value::Null;
                            }
                        }
                    }
                }
                if self.servers_count.is_unknown() {
                    self.servers_count = Value::Null;
                }
                if self.agents_count.is_unknown() {
                    self.agents_count = Value::Null;
                }
            }

            pub(super) fn mark_outputs_unknown(&mut self) {
                self.kubeconfig = Value::Unknown;
                self.host = Value::Unknown;
                self.client_certificate = Value::Unknown;
                self.client_key = Value::Unknown;
                self.cluster_ca_certificate = Value::Unknown;
                self.servers_count = Value::Unknown;
                self.agents_count = Value::Unknown;
            }
        }
    )+};
}

impl_outputs!(ResourceState DataSourceState);

impl<'a> WithNormalize for ResourceState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        for value in [
            &mut self.id,
            &mut self.kubeconfig,
            &mut self.host,
            &mut self.client_certificate,
            &mut self.client_key,
            &mut self.cluster_ca_certificate,
        ] {
            if value.is_null() {
                *value = Value::Unknown;
            }
        }
        for value in [&mut self.servers_count, &mut self.agents_count] {
            if value.is_null() {
                *value = Value::Unknown;
            }
        }
    }
}

fn computed(attr_type: AttributeType, description: &str, sensitive: bool) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint: AttributeConstraint::Computed,
        sensitive,
        deprecated: false,
    }
}

fn output_attributes() -> HashMap<String, Attribute> {
    map! {
        "kubeconfig" => computed(
            AttributeType::String,
            "Kubeconfig of the cluster, as returned by `k3d kubeconfig get`",
            true,
        ),
        "host" => computed(
            AttributeType::String,
            "URL of the Kubernetes API server",
            false,
        ),
        "client_certificate" => computed(
            AttributeType::String,
            "PEM-encoded client certificate to authenticate against the cluster",
            true,
        ),
        "client_key" => computed(
            AttributeType::String,
            "PEM-encoded private key of the client certificate",
            true,
        ),
        "cluster_ca_certificate" => computed(
            AttributeType::String,
            "PEM-encoded certificate authority of the API server",
            true,
        ),
        "servers_count" => computed(
            AttributeType::Number,
            "Number of server nodes in the cluster",
            false,
        ),
        "agents_count" => computed(
            AttributeType::Number,
            "Number of agent nodes in the cluster",
            false,
        ),
    }
}

impl<'a> WithSchema for ResourceState<'a> {
    fn schema() -> Schema {
        let mut attributes = output_attributes();
        let inputs: HashMap<String, Attribute> = map! {
            "id" => computed(
                AttributeType::String,
                "Checksum of the k3d configuration",
                false,
            ),
            "name" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Name of the cluster. Changing it recreates the cluster"),
                constraint: AttributeConstraint::Required,
                sensitive: false,
                deprecated: false,
            },
            "k3d_config" => Attribute {
                attr_type: AttributeType::String,
                description: Description::markdown(
                    "Content of the k3d configuration file (`kind: Simple`). Changing it recreates the cluster",
                ),
                constraint: AttributeConstraint::Required,
                sensitive: false,
                deprecated: false,
            },
        };
        attributes.extend(inputs);

        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes,
                description: Description::markdown(
                    "Local Kubernetes cluster running in Docker, managed with `k3d`",
                ),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithSchema for DataSourceState<'a> {
    fn schema() -> Schema {
        let mut attributes = output_attributes();
        let inputs: HashMap<String, Attribute> = map! {
            "id" => computed(AttributeType::String, "Name of the cluster", false),
            "name" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Name of the existing k3d cluster"),
                constraint: AttributeConstraint::Required,
                sensitive: false,
                deprecated: false,
            },
        };
        attributes.extend(inputs);

        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes,
                description: Description::markdown("Existing k3d cluster"),
                ..Default::default()
            },
        }
    }
}
