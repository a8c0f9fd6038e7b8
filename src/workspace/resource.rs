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

use crate::client::{ScalrClient, SharedClient};
use crate::utils::{has_changed, replace_on_change, WithDefaults, WithSchema};

use super::id::WorkspaceId;
use super::read::{find_workspace, workspace_state};
use super::state::WorkspaceState;

#[derive(Debug, Default, Clone)]
pub struct WorkspaceResource {
    client: SharedClient,
}

impl WorkspaceResource {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }

    /// Read the workspace back from the API, a null state meaning it is gone
    async fn read_state<'a>(
        &self,
        diags: &mut Diagnostics,
        client: &ScalrClient,
        state: WorkspaceState<'a>,
    ) -> Option<Value<WorkspaceState<'a>>> {
        let id = match state.id.as_str().parse::<WorkspaceId>() {
            Ok(id) => id,
            Err(err) => {
                diags.error(
                    "Error unpacking workspace ID",
                    err.to_string(),
                    AttributePath::new("id"),
                );
                return None;
            }
        };

        debug!("Read configuration of workspace: {}", id.name);
        match find_workspace(client, &id, state.external_id.as_str()).await {
            Ok(Some(workspace)) => match workspace_state(&workspace, &state) {
                Ok(state) => Some(Value::Value(state)),
                Err(err) => {
                    diags.root_error(
                        format!("Error reading workspace {}", id.name),
                        err.to_string(),
                    );
                    None
                }
            },
            Ok(None) => {
                debug!("Workspace {} does no longer exist", id.name);
                Some(Value::Null)
            }
            Err(err) => {
                diags.root_error(
                    format!("Error reading configuration of workspace {}", id.name),
                    err.to_string(),
                );
                None
            }
        }
    }
}

#[async_trait]
impl Resource for WorkspaceResource {
    type State<'a> = Value<WorkspaceState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(WorkspaceState::schema())
    }

    async fn validate<'a>(&self, _diags: &mut Diagnostics, _config: Self::State<'a>) -> Option<()> {
        Some(())
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
        state.external_id = Value::Unknown;
        state.created_by = Value::Unknown;
        if state.terraform_version.is_null() {
            state.terraform_version = Value::Unknown;
        }
        if state.working_directory.is_null() {
            state.working_directory = Value::Unknown;
        }

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
            "organization",
            &prior.organization,
            &state.organization,
        );
        if has_changed(&prior.name, &state.name) {
            state.id = Value::Unknown;
        }

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
            diags.root_error_short("Cannot create a workspace from an empty plan");
            return None;
        };

        let organization = state.organization.as_str().to_string();
        let name = state.name.as_str().to_string();

        debug!("Create workspace {name} for organization: {organization}");
        let workspace = match client
            .create_workspace(&organization, state.options(false))
            .await
        {
            Ok(workspace) => workspace,
            Err(err) => {
                diags.root_error(
                    format!("Error creating workspace {name} for organization {organization}"),
                    err.to_string(),
                );
                return None;
            }
        };

        match WorkspaceId::from_workspace(&workspace) {
            Ok(id) => state.id = id.to_string().into(),
            Err(err) => {
                diags.root_error(
                    format!("Error creating ID for workspace {name}"),
                    err.to_string(),
                );
                return None;
            }
        }
        state.external_id = workspace.id.clone().into();

        let ssh_key_id = state.ssh_key_id.as_str();
        if !ssh_key_id.is_empty() {
            debug!("Assign SSH key {ssh_key_id} to workspace: {name}");
            // The workspace exists: keep reading it so it lands tainted in the state
            if let Err(err) = client.assign_ssh_key(&workspace.id, ssh_key_id).await {
                diags.error(
                    format!("Error assigning SSH key to workspace {name}"),
                    err.to_string(),
                    AttributePath::new("ssh_key_id"),
                );
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
            diags.root_error_short("Cannot update a workspace without prior state");
            return None;
        };

        let id = match prior.id.as_str().parse::<WorkspaceId>() {
            Ok(id) => id,
            Err(err) => {
                diags.error(
                    "Error unpacking workspace ID",
                    err.to_string(),
                    AttributePath::new("id"),
                );
                return None;
            }
        };
        state.id = prior.id.clone();
        state.external_id = prior.external_id.clone();

        let modified = has_changed(&prior.name, &state.name)
            || has_changed(&prior.auto_apply, &state.auto_apply)
            || has_changed(&prior.queue_all_runs, &state.queue_all_runs)
            || has_changed(&prior.terraform_version, &state.terraform_version)
            || has_changed(&prior.working_directory, &state.working_directory)
            || has_changed(&prior.vcs_repo, &state.vcs_repo)
            || has_changed(&prior.operations, &state.operations);

        if modified {
            debug!(
                "Update workspace {} for organization: {}",
                id.name, id.organization
            );
            let updated = client
                .update_workspace(&id.organization, &id.name, state.options(true))
                .await
                .and_then(|workspace| WorkspaceId::from_workspace(&workspace));
            match updated {
                Ok(new_id) => state.id = new_id.to_string().into(),
                Err(err) => {
                    diags.root_error(
                        format!(
                            "Error updating workspace {} for organization {}",
                            id.name, id.organization
                        ),
                        err.to_string(),
                    );
                    return None;
                }
            }
        }

        if has_changed(&prior.ssh_key_id, &state.ssh_key_id) {
            let external_id = prior.external_id.as_str();
            let ssh_key_id = state.ssh_key_id.as_str();
            let (result, action) = if ssh_key_id.is_empty() {
                debug!("Unassign SSH key from workspace: {}", id.name);
                (
                    client.unassign_ssh_key(external_id).await,
                    "unassigning SSH key from",
                )
            } else {
                debug!("Assign SSH key {ssh_key_id} to workspace: {}", id.name);
                (
                    client.assign_ssh_key(external_id, ssh_key_id).await,
                    "assigning SSH key to",
                )
            };
            if let Err(err) = result {
                diags.error(
                    format!("Error {action} workspace {}", id.name),
                    err.to_string(),
                    AttributePath::new("ssh_key_id"),
                );
            }
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
        let Value::Value(state) = state else {
            return Some(());
        };
        let id = match state.id.as_str().parse::<WorkspaceId>() {
            Ok(id) => id,
            Err(err) => {
                diags.error(
                    "Error unpacking workspace ID",
                    err.to_string(),
                    AttributePath::new("id"),
                );
                return None;
            }
        };

        debug!(
            "Delete workspace {} from organization: {}",
            id.name, id.organization
        );
        match client.delete_workspace(&id.organization, &id.name).await {
            Ok(()) => Some(()),
            Err(err) if err.is_not_found() => Some(()),
            Err(err) => {
                diags.root_error(
                    format!(
                        "Error deleting workspace {} from organization {}",
                        id.name, id.organization
                    ),
                    err.to_string(),
                );
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        _diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        Some((
            Value::Value(WorkspaceState {
                id: id.into(),
                ..Default::default()
            }),
            Default::default(),
        ))
    }
}
