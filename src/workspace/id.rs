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

use std::fmt::Display;
use std::str::FromStr;

use crate::client::workspaces::Workspace;
use crate::client::ScalrError;

/// Terraform-side identifier of a workspace: `<organization>/<workspace>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceId {
    pub organization: String,
    pub name: String,
}

impl WorkspaceId {
    pub fn new(organization: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            name: name.into(),
        }
    }

    /// Build the ID from an API response
    pub fn from_workspace(workspace: &Workspace) -> Result<Self, ScalrError> {
        let organization = workspace.organization().ok_or_else(|| {
            ScalrError::InvalidId("no organization in workspace response".to_string())
        })?;
        Ok(Self::new(organization, workspace.name()))
    }
}

impl FromStr for WorkspaceId {
    type Err = ScalrError;

    /// Also accepts the legacy `<workspace>|<organization>` form
    fn from_str(id: &str) -> Result<Self, Self::Err> {
        if let Some((name, organization)) = id.split_once('|') {
            return Ok(Self::new(organization, name));
        }
        match id.split_once('/') {
            Some((organization, name)) => Ok(Self::new(organization, name)),
            None => Err(ScalrError::InvalidId(format!(
                "invalid workspace ID format: {id} (expected <ORGANIZATION>/<WORKSPACE>)"
            ))),
        }
    }
}

impl Display for WorkspaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.organization, self.name)
    }
}

/// Split an import ID `<organization>/<workspace>/<id>` into the workspace ID and the child ID
pub fn split_child_id<'a>(id: &'a str, child: &str) -> Result<(String, &'a str), ScalrError> {
    let mut parts = id.splitn(3, '/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(organization), Some(workspace), Some(child_id)) => {
            Ok((format!("{organization}/{workspace}"), child_id))
        }
        _ => Err(ScalrError::InvalidId(format!(
            "invalid {child} import format: {id} (expected <ORGANIZATION>/<WORKSPACE>/<{} ID>)",
            child.to_uppercase()
        ))),
    }
}
