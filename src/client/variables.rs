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

//! Workspace variable endpoints

use std::fmt::Display;
use std::str::FromStr;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::models::{Document, Relationship, ResourceObject};
use super::{segment, Result, ScalrClient, ScalrError};

/// Kind of a variable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Terraform,
    Env,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Terraform, Category::Env];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Terraform => "terraform",
            Category::Env => "env",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ScalrError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ScalrError::InvalidId(format!("invalid variable category: {s}")))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Variable {
    pub id: String,
    #[serde(default)]
    pub attributes: VariableAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VariableAttributes {
    pub key: String,
    pub value: Option<String>,
    pub category: Category,
    pub hcl: bool,
    pub sensitive: bool,
}

/// Attributes sent when creating or updating a variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableOptions {
    pub key: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub hcl: bool,
    pub sensitive: bool,
}

#[derive(Debug, Clone, Serialize)]
struct VariableRelationships {
    workspace: Relationship,
}

impl ScalrClient {
    pub async fn create_variable(
        &self,
        workspace_id: &str,
        options: VariableOptions,
    ) -> Result<Variable> {
        let context = format!(
            "creating {} variable {}",
            options.category.unwrap_or_default(),
            options.key
        );
        let doc: Document<Variable> = self
            .send(
                Method::POST,
                "vars",
                &Document {
                    data: ResourceObject::with_relationships(
                        "vars",
                        options,
                        VariableRelationships {
                            workspace: Relationship::to("workspaces", workspace_id),
                        },
                    ),
                },
                &context,
            )
            .await?;
        Ok(doc.data)
    }

    pub async fn read_variable(&self, id: &str) -> Result<Variable> {
        let doc: Document<Variable> = self
            .get(
                &format!("vars/{}", segment(id)),
                &format!("reading variable {id}"),
            )
            .await?;
        Ok(doc.data)
    }

    pub async fn update_variable(&self, id: &str, options: VariableOptions) -> Result<Variable> {
        let doc: Document<Variable> = self
            .send(
                Method::PATCH,
                &format!("vars/{}", segment(id)),
                &Document {
                    data: ResourceObject::new("vars", options).with_id(id),
                },
                &format!("updating variable {id}"),
            )
            .await?;
        Ok(doc.data)
    }

    pub async fn delete_variable(&self, id: &str) -> Result<()> {
        self.delete(
            &format!("vars/{}", segment(id)),
            &format!("deleting variable {id}"),
        )
        .await
    }
}
