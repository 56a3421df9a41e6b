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

use std::fmt::Debug;

use async_trait::async_trait;

use tf_provider::schema::Schema;
use tf_provider::value::ValueEmpty;
use tf_provider::{DataSource, Diagnostics};

use crate::connection::Connection;
use crate::k3d::K3d;
use crate::utils::{WithSchema, WithValidate};

use super::read::{refresh, Refreshed};
use super::state::DataSourceState;

#[derive(Debug, Default)]
pub struct K3dClusterDataSource<T: Connection> {
    pub(super) k3d: K3d<T>,
}

impl<T: Connection> K3dClusterDataSource<T> {
    pub fn new(k3d: K3d<T>) -> Self {
        Self { k3d }
    }
}

#[async_trait]
impl<T> DataSource for K3dClusterDataSource<T>
where
    T: Connection,
    T: Debug,
    T: Clone,
{
    type State<'a> = DataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(DataSourceState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        config.validate(diags);

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let mut state = config;
        let name = state.name.as_str().to_owned();

        // Force the read of every output
        state.mark_outputs_unknown();

        match refresh(diags, &self.k3d, &name).await? {
            Refreshed::Missing => {
                diags.root_error(
                    "k3d cluster not found",
                    format!("There is no k3d cluster named `{name}`."),
                );
                None
            }
            Refreshed::Found {
                cluster,
                kubeconfig,
            } => {
                state.set_cluster(&cluster);
                state.set_kubeconfig(kubeconfig);
                state.id = state.name.clone();
                Some(state)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::mock::MockConnection;
    use tf_provider::value::Value;

    fn data_source() -> (K3dClusterDataSource<MockConnection>, MockConnection) {
        let connect = MockConnection::default();
        (K3dClusterDataSource::new(K3d::new(connect.clone())), connect)
    }

    fn config() -> DataSourceState<'static> {
        DataSourceState {
            name: Value::Value("dev".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn read_existing() {
        let (data_source, connect) = data_source();
        connect
            .respond(
                &["cluster", "list"],
                0,
                r#"[{"name":"dev","serversCount":3,"serversRunning":3,"agentsCount":1}]"#,
                "",
            )
            .respond(
                &["kubeconfig", "get", "dev"],
                0,
                r#"
clusters:
- name: k3d-dev
  cluster:
    server: https://0.0.0.0:6443
    certificate-authority-data: Y2E=
users:
- name: admin@k3d-dev
  user:
    client-certificate-data: Y2VydA==
    client-key-data: a2V5
"#,
                "",
            );

        let mut diags = Diagnostics::default();
        let state = data_source
            .read(&mut diags, config(), ValueEmpty::default())
            .await
            .unwrap();

        assert!(diags.errors.is_empty());
        assert_eq!(state.id, Value::Value("dev".into()));
        assert_eq!(state.host, Value::Value("https://0.0.0.0:6443".into()));
        assert_eq!(state.cluster_ca_certificate, Value::Value("ca".into()));
        assert_eq!(state.client_certificate, Value::Value("cert".into()));
        assert_eq!(state.client_key, Value::Value("key".into()));
        assert_eq!(state.servers_count, Value::Value(3));
        assert_eq!(state.agents_count, Value::Value(1));
    }

    #[tokio::test]
    async fn read_missing() {
        let (data_source, connect) = data_source();
        connect.respond(&["cluster", "list"], 0, "null", "");

        let mut diags = Diagnostics::default();
        assert!(data_source
            .read(&mut diags, config(), ValueEmpty::default())
            .await
            .is_none());
        assert_eq!(diags.errors.len(), 1);
    }

    #[tokio::test]
    async fn validate_name() {
        let (data_source, _) = data_source();

        let mut diags = Diagnostics::default();
        let config = DataSourceState {
            name: Value::Value("-dev".into()),
            ..Default::default()
        };
        assert!(DataSource::validate(&data_source, &mut diags, config)
            .await
            .is_none());
        assert_eq!(diags.errors.len(), 1);
    }
}
