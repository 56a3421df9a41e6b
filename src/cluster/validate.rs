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

use tf_provider::value::{Value, ValueString};
use tf_provider::{AttributePath, Diagnostics};

use crate::utils::WithValidate;

use super::state::{DataSourceState, ResourceState};

/// k3d derives container and network names from the cluster name
const MAX_NAME_LENGTH: usize = 32;

impl<'a> WithValidate for ResourceState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_name(diags, &self.name);
        validate_k3d_config(diags, &self.k3d_config, &self.name);
    }
}

impl<'a> WithValidate for DataSourceState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_name(diags, &self.name);
    }
}

pub(super) fn validate_name(diags: &mut Diagnostics, name: &ValueString) {
    let Value::Value(name) = name else {
        return;
    };
    let attr_path = AttributePath::new("name");

    if name.is_empty() {
        diags.error_short("`name` should not be empty", attr_path);
    } else if name.len() > MAX_NAME_LENGTH {
        diags.error(
            "`name` is too long",
            format!("`{name}` has {} characters, k3d accepts at most {MAX_NAME_LENGTH}.", name.len()),
            attr_path,
        );
    } else if !name
        .bytes()
        .all(|c| c.is_ascii_alphanumeric() || c == b'-')
        || name.starts_with('-')
        || name.ends_with('-')
    {
        diags.error(
            "`name` is not a valid k3d cluster name",
            format!("`{name}` should only contain letters, digits and `-`, and should neither start nor end with `-`."),
            attr_path,
        );
    }
}

fn validate_k3d_config(diags: &mut Diagnostics, config: &ValueString, name: &ValueString) {
    let Value::Value(config) = config else {
        return;
    };
    let attr_path = AttributePath::new("k3d_config");

    let config: serde_yaml::Value = match serde_yaml::from_str(config) {
        Ok(config) => config,
        Err(err) => {
            diags.error("`k3d_config` is not valid YAML", err.to_string(), attr_path);
            return;
        }
    };
    if !config.is_mapping() {
        diags.error_short("`k3d_config` should be a YAML mapping", attr_path);
        return;
    }

    match config.get("apiVersion").and_then(serde_yaml::Value::as_str) {
        Some(api_version) if api_version.starts_with("k3d.io/") => (),
        Some(api_version) => diags.error(
            "Unsupported k3d configuration",
            format!("`apiVersion` should be a k3d.io version, found `{api_version}`."),
            attr_path.clone(),
        ),
        None => diags.error_short("`k3d_config` has no `apiVersion`", attr_path.clone()),
    }

    match config.get("kind").and_then(serde_yaml::Value::as_str) {
        Some("Simple") => (),
        Some(kind) => diags.error(
            "Unsupported k3d configuration",
            format!("`kind` should be `Simple`, found `{kind}`."),
            attr_path.clone(),
        ),
        None => diags.error_short("`k3d_config` has no `kind`", attr_path.clone()),
    }

    let config_name = config
        .get("metadata")
        .and_then(|metadata| metadata.get("name"))
        .and_then(serde_yaml::Value::as_str);
    if let (Some(config_name), Value::Value(name)) = (config_name, name) {
        if config_name != &**name {
            diags.warning(
                "Cluster name mismatch",
                format!("`metadata.name` is `{config_name}` in `k3d_config`, the cluster will be named `{name}`."),
                attr_path,
            );
        }
    }
}
