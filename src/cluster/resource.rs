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
use std::fmt::Debug;

use async_trait::async_trait;
use tracing::{info, warn};

use tf_provider::value::{Value, ValueEmpty, ValueNumber};
use tf_provider::{schema::Schema, AttributePath, Diagnostics, Resource};

use crate::connection::Connection;
use crate::k3d::K3d;
use crate::utils::{WithNormalize, WithSchema, WithValidate};

use super::read::{refresh, Refreshed};
use super::state::ResourceState;
use super::validate::validate_name;
use super::{checksum, report_k3d_error, temp_config_path};

/// Private state of a cluster created or adopted by Terraform.
/// An unknown private state marks a freshly imported cluster.
const MANAGED: i64 = 1;

#[derive(Debug, Default)]
pub struct K3dClusterResource<T: Connection> {
    pub(super) k3d: K3d<T>,
}

impl<T: Connection> K3dClusterResource<T> {
    pub fn new(k3d: K3d<T>) -> Self {
        Self { k3d }
    }
}

#[async_trait]
impl<T> Resource for K3dClusterResource<T>
where
    T: Connection,
    T: Debug,
    T: Clone,
{
    type State<'a> = ResourceState<'a>;
    type PrivateState<'a> = ValueNumber;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ResourceState::schema())
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
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = state;
        let name = state.name.as_str().to_owned();

        match refresh(diags, &self.k3d, &name).await? {
            Refreshed::Missing => {
                warn!("k3d cluster `{name}` disappeared");
                diags.root_warning(
                    "k3d cluster not found",
                    format!("The k3d cluster `{name}` does not exist anymore. It has been removed from the state and will be created again on the next apply."),
                );
                // No state: Terraform forgets the resource
                None
            }
            Refreshed::Found {
                cluster,
                kubeconfig,
            } => {
                state.set_cluster(&cluster);
                state.set_kubeconfig(kubeconfig);
                Some((state, private_state))
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        state.id = match &state.k3d_config {
            Value::Value(config) => Value::Value(Cow::Owned(checksum(config))),
            _ => Value::Unknown,
        };
        state.mark_outputs_unknown();
        state.normalize(diags);

        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(
        Self::State<'a>,
        Self::PrivateState<'a>,
        Vec<tf_provider::AttributePath>,
    )> {
        let mut state = proposed_state;
        let mut trigger_replace = Vec::new();

        if state.name != prior_state.name {
            trigger_replace.push(AttributePath::new("name"));
        }
        // Resource has been imported, but not yet updated.
        // The configuration cannot be read back from k3d, so the planned one is adopted.
        if !prior_private_state.is_unknown() && state.k3d_config != prior_state.k3d_config {
            trigger_replace.push(AttributePath::new("k3d_config"));
        }

        if !trigger_replace.is_empty() {
            state.mark_outputs_unknown();
        }
        state.id = match &state.k3d_config {
            Value::Value(config) => Value::Value(Cow::Owned(checksum(config))),
            _ => Value::Unknown,
        };

        Some((state, prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = planned_state;
        let name = state.name.as_str().to_owned();
        let config = state.k3d_config.as_str().to_owned();
        let id = checksum(&config);

        let connect = self.k3d.connection();
        let config_path = temp_config_path(&id);
        if let Err(err) = connect.write(&config_path, config.as_bytes(), 0o600).await {
            diags.error(
                "Failed writing temporary k3d config",
                format!("{}: {err:#}", config_path.display()),
                AttributePath::new("k3d_config"),
            );
            return None;
        }

        let created = self.k3d.create_cluster(&name, &config_path).await;

        // The cluster does not depend on the file anymore, whatever the outcome
        if let Err(err) = connect.delete(&config_path).await {
            warn!("could not remove {}: {err:#}", config_path.display());
            diags.root_warning(
                "Failed removing temporary k3d config",
                format!("{}: {err:#}", config_path.display()),
            );
        }

        if let Err(err) = created {
            report_k3d_error(diags, "create", &name, &err);
            return None;
        }

        // The cluster exists from now on: the state must be returned even if the
        // refresh fails, so refresh errors are downgraded to warnings
        let mut refresh_diags = Diagnostics::default();
        let refreshed = refresh(&mut refresh_diags, &self.k3d, &name).await;
        diags.warnings.append(&mut refresh_diags.errors);
        diags.warnings.append(&mut refresh_diags.warnings);

        match refreshed {
            Some(Refreshed::Found {
                cluster,
                kubeconfig,
            }) => {
                state.set_cluster(&cluster);
                state.set_kubeconfig(kubeconfig);
            }
            Some(Refreshed::Missing) => {
                warn!("k3d cluster `{name}` is not listed after its creation");
                diags.root_warning(
                    "k3d cluster not found after creation",
                    format!("`k3d cluster create {name}` succeeded, but the cluster is not listed by `k3d cluster list`."),
                );
                state.set_kubeconfig(None);
            }
            None => state.set_kubeconfig(None),
        }

        state.id = Value::Value(Cow::Owned(id));
        info!("k3d cluster `{name}` is ready");

        Some((state, Value::Value(MANAGED)))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        // Every input forces a replacement: only an imported cluster adopting
        // its configuration gets here
        let mut state = planned_state;
        let name = state.name.as_str().to_owned();

        match refresh(diags, &self.k3d, &name).await? {
            Refreshed::Missing => {
                diags.root_error(
                    "k3d cluster not found",
                    format!("The k3d cluster `{name}` does not exist anymore."),
                );
                return None;
            }
            Refreshed::Found {
                cluster,
                kubeconfig,
            } => {
                state.set_cluster(&cluster);
                state.set_kubeconfig(kubeconfig);
            }
        }
        if state.id.is_unknown() {
            state.id = Value::Value(Cow::Owned(checksum(state.k3d_config.as_str())));
        }

        Some((state, Value::Value(MANAGED)))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let name = state.name.as_str();

        if let Err(err) = self.k3d.delete_cluster(name).await {
            report_k3d_error(diags, "delete", name, &err);
            return None;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let name = id.trim().to_owned();
        let name_value = Value::Value(Cow::Owned(name.clone()));

        validate_name(diags, &name_value);
        if !diags.errors.is_empty() {
            return None;
        }

        let cluster = match self.k3d.find_cluster(&name).await {
            Ok(Some(cluster)) => cluster,
            Ok(None) => {
                diags.root_error(
                    "Cannot import non-existent k3d cluster",
                    format!("There is no k3d cluster named `{name}`. The import id should be the name of the cluster."),
                );
                return None;
            }
            Err(err) => {
                report_k3d_error(diags, "import", &name, &err);
                return None;
            }
        };

        let mut state = Self::State {
            id: name_value.clone(),
            name: name_value,
            k3d_config: Value::Null,
            ..Default::default()
        };
        state.set_cluster(&cluster);

        Some((state, Value::Unknown))
    }
}
