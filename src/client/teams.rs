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

//! Team endpoints, both organization teams and IAM teams

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::models::{Document, Relationship, RelationshipList, ResourceObject};
use super::{segment, Result, ScalrClient};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Team {
    pub id: String,
    #[serde(default)]
    pub attributes: TeamAttributes,
    #[serde(default)]
    pub relationships: TeamRelationships,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TeamAttributes {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TeamRelationships {
    pub organization: Relationship,
    pub account: Relationship,
    pub identity_provider: Relationship,
    pub users: RelationshipList,
}

impl Team {
    pub fn name(&self) -> &str {
        &self.attributes.name
    }

    pub fn organization(&self) -> Option<&str> {
        self.relationships.organization.id()
    }

    pub fn account_id(&self) -> Option<&str> {
        self.relationships.account.id()
    }

    pub fn identity_provider_id(&self) -> Option<&str> {
        self.relationships.identity_provider.id()
    }

    pub fn user_ids(&self) -> impl Iterator<Item = &str> {
        self.relationships.users.ids()
    }
}

#[derive(Debug, Clone, Serialize)]
struct TeamOptions<'a> {
    name: &'a str,
}

impl ScalrClient {
    pub async fn create_team(&self, organization: &str, name: &str) -> Result<Team> {
        let doc: Document<Team> = self
            .send(
                Method::POST,
                &format!("organizations/{}/teams", segment(organization)),
                &Document {
                    data: ResourceObject::new("teams", TeamOptions { name }),
                },
                &format!("creating team {name} for organization {organization}"),
            )
            .await?;
        Ok(doc.data)
    }

    pub async fn read_team(&self, id: &str) -> Result<Team> {
        let doc: Document<Team> = self
            .get(
                &format!("teams/{}", segment(id)),
                &format!("reading team {id}"),
            )
            .await?;
        Ok(doc.data)
    }

    pub async fn delete_team(&self, id: &str) -> Result<()> {
        self.delete(
            &format!("teams/{}", segment(id)),
            &format!("deleting team {id}"),
        )
        .await
    }

    /// IAM teams named exactly `name`, optionally restricted to an account
    pub async fn list_iam_teams(&self, name: &str, account: Option<&str>) -> Result<Vec<Team>> {
        let mut query = format!("filter[name]={}", urlencoding::encode(name));
        if let Some(account) = account {
            query.push_str("&filter[account]=");
            query.push_str(&urlencoding::encode(account));
        }
        self.collect_pages("iam/teams", &query, "retrieving iam team", |team: &Team| {
            team.name() == name
        })
        .await
    }
}
