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

//! Agent pool access tokens

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::models::{Document, ResourceObject};
use super::{segment, Result, ScalrClient};

#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub id: String,
    #[serde(default)]
    pub attributes: AccessTokenAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccessTokenAttributes {
    pub description: String,
    /// Only present in the response to a creation request
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct AccessTokenOptions<'a> {
    description: &'a str,
}

impl ScalrClient {
    pub async fn create_agent_pool_token(
        &self,
        pool_id: &str,
        description: &str,
    ) -> Result<AccessToken> {
        let doc: Document<AccessToken> = self
            .send(
                Method::POST,
                &format!("agent-pools/{}/access-tokens", segment(pool_id)),
                &Document {
                    data: ResourceObject::new("access-tokens", AccessTokenOptions { description }),
                },
                &format!("creating token for agent pool {pool_id}"),
            )
            .await?;
        Ok(doc.data)
    }

    /// Look a token up in the pool's token list
    pub async fn find_agent_pool_token(
        &self,
        pool_id: &str,
        id: &str,
    ) -> Result<Option<AccessToken>> {
        debug!("Looking up token {id} in agent pool {pool_id}");
        self.find_in_pages(
            &format!("agent-pools/{}/access-tokens", segment(pool_id)),
            "",
            &format!("reading configuration of agent pool token {id}"),
            |token: &AccessToken| token.id == id,
        )
        .await
    }

    pub async fn update_access_token(&self, id: &str, description: &str) -> Result<AccessToken> {
        let doc: Document<AccessToken> = self
            .send(
                Method::PATCH,
                &format!("access-tokens/{}", segment(id)),
                &Document {
                    data: ResourceObject::new("access-tokens", AccessTokenOptions { description })
                        .with_id(id),
                },
                &format!("updating agent pool token {id}"),
            )
            .await?;
        Ok(doc.data)
    }

    pub async fn delete_access_token(&self, id: &str) -> Result<()> {
        self.delete(
            &format!("access-tokens/{}", segment(id)),
            &format!("deleting agent pool token {id}"),
        )
        .await
    }
}
