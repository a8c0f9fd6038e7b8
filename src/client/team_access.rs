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

//! Team access grants on workspaces

use std::fmt::Display;
use std::str::FromStr;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::models::{Document, Relationship, ResourceObject};
use super::{segment, Result, ScalrClient, ScalrError};

/// Access level granted to a team
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Admin,
    #[default]
    Read,
    Plan,
    Write,
}

impl Access {
    pub const ALL: [Access; 4] = [Access::Admin, Access::Read, Access::Plan, Access::Write];

    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Admin => "admin",
            Access::Read => "read",
            Access::Plan => "plan",
            Access::Write => "write",
        }
    }
}

impl Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Access {
    type Err = ScalrError;

    fn from_str(s: &str) -> Result<Self> {
        Access::ALL
            .into_iter()
            .find(|access| access.as_str() == s)
            .ok_or_else(|| ScalrError::InvalidId(format!("invalid access level: {s}")))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamAccess {
    pub id: String,
    #[serde(default)]
    pub attributes: TeamAccessAttributes,
    #[serde(default)]
    pub relationships: TeamAccessRelationships,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TeamAccessAttributes {
    pub access: Access,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TeamAccessRelationships {
    pub team: Relationship,
    pub workspace: Relationship,
}

impl TeamAccess {
    pub fn team_id(&self) -> Option<&str> {
        self.relationships.team.id()
    }
}

#[derive(Debug, Clone, Serialize)]
struct TeamAccessOptions {
    access: Access,
}

#[derive(Debug, Clone, Serialize)]
struct TeamAccessLinks {
    team: Relationship,
    workspace: Relationship,
}

impl ScalrClient {
    pub async fn add_team_access(
        &self,
        access: Access,
        team_id: &str,
        workspace_id: &str,
    ) -> Result<TeamAccess> {
        let doc: Document<TeamAccess> = self
            .send(
                Method::POST,
                "team-workspaces",
                &Document {
                    data: ResourceObject::with_relationships(
                        "team-workspaces",
                        TeamAccessOptions { access },
                        TeamAccessLinks {
                            team: Relationship::to("teams", team_id),
                            workspace: Relationship::to("workspaces", workspace_id),
                        },
                    ),
                },
                &format!("giving team {team_id} {access} access to workspace {workspace_id}"),
            )
            .await?;
        Ok(doc.data)
    }

    pub async fn read_team_access(&self, id: &str) -> Result<TeamAccess> {
        let doc: Document<TeamAccess> = self
            .get(
                &format!("team-workspaces/{}", segment(id)),
                &format!("reading configuration of team access {id}"),
            )
            .await?;
        Ok(doc.data)
    }

    pub async fn remove_team_access(&self, id: &str) -> Result<()> {
        self.delete(
            &format!("team-workspaces/{}", segment(id)),
            &format!("deleting team access {id}"),
        )
        .await
    }
}
