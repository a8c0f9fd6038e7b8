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

use tf_provider::value::{Value, ValueString};
use tracing::debug;

use crate::client::workspaces::Workspace;
use crate::client::{Result, ScalrClient};

use super::id::WorkspaceId;
use super::state::{CreatedByState, VcsRepoState, WorkspaceState};

/// Find a workspace by its Terraform ID, following renames through its external ID
///
/// A workspace renamed outside of Terraform is no longer reachable by name: the
/// organization's workspaces are then scanned for `external_id`.
/// `None` means the workspace is gone.
pub(super) async fn find_workspace(
    client: &ScalrClient,
    id: &WorkspaceId,
    external_id: &str,
) -> Result<Option<Workspace>> {
    match client.read_workspace(&id.organization, &id.name).await {
        Ok(workspace) => Ok(Some(workspace)),
        Err(err) if err.is_not_found() => {
            if external_id.is_empty() {
                return Ok(None);
            }
            debug!(
                "Workspace {} not found by name, looking for {external_id}",
                id.name
            );
            let workspace = client
                .find_workspace_by_id(&id.organization, external_id)
                .await?;
            if let Some(workspace) = &workspace {
                debug!("Workspace {external_id} has been renamed to {}", workspace.name());
            }
            Ok(workspace)
        }
        Err(err) => Err(err),
    }
}

/// State of a workspace as seen by the API
///
/// The ID is re-packed from the response, which also migrates the legacy format.
pub(super) fn workspace_state<'a>(
    workspace: &Workspace,
    prior: &WorkspaceState<'a>,
) -> Result<WorkspaceState<'a>> {
    let id = WorkspaceId::from_workspace(workspace)?;
    let attributes = &workspace.attributes;

    let no_branch = ValueString::Null;
    let prior_branch = prior
        .vcs_repo
        .as_ref_option()
        .map_or(&no_branch, |vcs_repo| &vcs_repo.branch);

    Ok(WorkspaceState {
        id: id.to_string().into(),
        name: attributes.name.clone().into(),
        organization: id.organization.into(),
        auto_apply: Value::Value(attributes.auto_apply),
        operations: Value::Value(attributes.operations),
        queue_all_runs: Value::Value(attributes.queue_all_runs),
        ssh_key_id: workspace.ssh_key_id().unwrap_or_default().to_string().into(),
        terraform_version: attributes.terraform_version.clone().into(),
        working_directory: attributes.working_directory.clone().into(),
        vcs_repo: attributes
            .vcs_repo
            .as_ref()
            .map(|vcs_repo| VcsRepoState::from_api(vcs_repo, prior_branch))
            .into(),
        created_by: Value::Value(
            attributes
                .created_by
                .iter()
                .map(|created_by| Value::Value(CreatedByState::from(created_by)))
                .collect(),
        ),
        external_id: workspace.id.clone().into(),
    })
}
