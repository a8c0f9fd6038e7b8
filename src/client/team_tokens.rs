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

//! Team authentication tokens

use serde::Deserialize;

use super::models::Document;
use super::{segment, Result, ScalrClient};

#[derive(Debug, Clone, Deserialize)]
pub struct TeamToken {
    #[serde(default)]
    pub attributes: TeamTokenAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TeamTokenAttributes {
    /// Only present in the response to a generation request
    pub token: Option<String>,
}

fn token_path(team_id: &str) -> String {
    format!("teams/{}/authentication-token", segment(team_id))
}

impl ScalrClient {
    /// Generate a new token, replacing any existing one
    pub async fn generate_team_token(&self, team_id: &str) -> Result<TeamToken> {
        let doc: Document<TeamToken> = self
            .post_empty(
                &token_path(team_id),
                &format!("generating token for team {team_id}"),
            )
            .await?;
        Ok(doc.data)
    }

    pub async fn read_team_token(&self, team_id: &str) -> Result<TeamToken> {
        let doc: Document<TeamToken> = self
            .get(
                &token_path(team_id),
                &format!("reading token for team {team_id}"),
            )
            .await?;
        Ok(doc.data)
    }

    pub async fn delete_team_token(&self, team_id: &str) -> Result<()> {
        self.delete(
            &token_path(team_id),
            &format!("deleting token for team {team_id}"),
        )
        .await
    }
}
