// This file is part of the terraform-provider-scalr project
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
use tracing::debug;

use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{schema::Schema, AttributePath, Diagnostics, Resource};

use crate::client::variables::Category;
use crate::client::{ScalrClient, SharedClient};
use crate::utils::{replace_on_change, WithDefaults, WithSchema, WithValidate};
use crate::workspace::{split_child_id, WorkspaceId};

use super::state::VariableState;

#[derive(Debug, Default, Clone)]
pub struct VariableResource {
    client: SharedClient,
}

impl VariableResource {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }

    async fn read_state<'a>(
        &self,
        diags: &mut Diagnostics,
        client: &ScalrClient,
        mut state: VariableState<'a>,
    ) -> Option<Value<VariableState<'a>>> {
        let id = state.id.as_str().to_string();

        debug!("Read variable: {id}");
        match client.read_variable(&id).await {
            Ok(variable) => {
                state.refresh(variable);
                Some(Value::Value(state))
            }
            Err(err) if err.is_not_found() => {
                debug!("Variable {id} does no longer exist");
                Some(Value::Null)
            }
            Err(err) => {
                diags.root_error(format!("Error reading variable {id}"), err.to_string());
                None
            }
        }
    }
}

#[async_trait]
impl Resource for VariableResource {
    type State<'a> = Value<VariableState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(VariableState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        config.validate(diags, Default::default());

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
        let client = self.client.get(diags)?;
        let Value::Value(state) = state else {
            return Some((state, private_state));
        };
        let state = self.read_state(diags, client, state).await?;
        Some((state, private_state))
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = match proposed_state {
            Value::Value(state) => state,
            other => return Some((other, Default::default())),
        };
        if let Value::Value(config) = &config_state {
            state.apply_defaults(config);
        }
        state.id = Value::Unknown;

        Some((Value::Value(state), Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(
        Self::State<'a>,
        Self::PrivateState<'a>,
        Vec<tf_provider::AttributePath>,
    )> {
        let (Value::Value(prior), Value::Value(mut state)) = (prior_state, proposed_state) else {
            return Some((Value::Unknown, prior_private_state, vec![]));
        };
        if let Value::Value(config) = &config_state {
            state.apply_defaults(config);
        }

        let mut trigger_replace = Vec::new();
        replace_on_change(
            &mut trigger_replace,
            "category",
            &prior.category,
            &state.category,
        );
        replace_on_change(
            &mut trigger_replace,
            "workspace_id",
            &prior.workspace_id,
            &state.workspace_id,
        );

        Some((Value::Value(state), prior_private_state, trigger_replace))
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
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.client.get(diags)?;
        let Value::Value(mut state) = planned_state else {
            diags.root_error_short("Cannot create a variable from an empty plan");
            return None;
        };

        let key = state.key.as_str().to_string();
        let category = match state.category.as_str().parse::<Category>() {
            Ok(category) => category,
            Err(err) => {
                diags.error(
                    "Invalid category",
                    err.to_string(),
                    AttributePath::new("category"),
                );
                return None;
            }
        };
        let workspace_id = match state.workspace_id.as_str().parse::<WorkspaceId>() {
            Ok(id) => id,
            Err(err) => {
                diags.error(
                    "Error unpacking workspace ID",
                    err.to_string(),
                    AttributePath::new("workspace_id"),
                );
                return None;
            }
        };

        let workspace = match client
            .read_workspace(&workspace_id.organization, &workspace_id.name)
            .await
        {
            Ok(workspace) => workspace,
            Err(err) => {
                diags.error(
                    format!(
                        "Error retrieving workspace {} from organization {}",
                        workspace_id.name, workspace_id.organization
                    ),
                    err.to_string(),
                    AttributePath::new("workspace_id"),
                );
                return None;
            }
        };

        debug!("Create {category} variable: {key}");
        match client
            .create_variable(&workspace.id, state.options(Some(category)))
            .await
        {
            Ok(variable) => state.id = variable.id.into(),
            Err(err) => {
                diags.root_error(
                    format!("Error creating {category} variable {key}"),
                    err.to_string(),
                );
                return None;
            }
        }

        let state = self.read_state(diags, client, state).await?;
        Some((state, private_state))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.client.get(diags)?;
        let (Value::Value(prior), Value::Value(mut state)) = (prior_state, planned_state) else {
            diags.root_error_short("Cannot update a variable without prior state");
            return None;
        };
        state.id = prior.id;
        let id = state.id.as_str().to_string();

        debug!("Update variable: {id}");
        if let Err(err) = client.update_variable(&id, state.options(None)).await {
            diags.root_error(format!("Error updating variable {id}"), err.to_string());
            return None;
        }

        let state = self.read_state(diags, client, state).await?;
        Some((state, private_state))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let client = self.client.get(diags)?;
        let id = state.as_ref_option().map_or("", |state| state.id.as_str());

        debug!("Delete variable: {id}");
        match client.delete_variable(id).await {
            Ok(()) => Some(()),
            Err(err) if err.is_not_found() => Some(()),
            Err(err) => {
                diags.root_error(format!("Error deleting variable {id}"), err.to_string());
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        match split_child_id(&id, "variable") {
            Ok((workspace_id, variable_id)) => Some((
                Value::Value(VariableState {
                    id: variable_id.to_string().into(),
                    workspace_id: workspace_id.into(),
                    ..Default::default()
                }),
                Default::default(),
            )),
            Err(err) => {
                diags.root_error("Invalid import ID", err.to_string());
                None
            }
        }
    }
}
