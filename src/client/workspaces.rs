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

//! Workspace endpoints

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::models::{Document, Relationship, ResourceObject};
use super::{segment, Result, ScalrClient};

/// Workspace as returned by the API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Workspace {
    pub id: String,
    #[serde(default)]
    pub attributes: WorkspaceAttributes,
    #[serde(default)]
    pub relationships: WorkspaceRelationships,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WorkspaceAttributes {
    pub name: String,
    pub auto_apply: bool,
    pub operations: bool,
    pub queue_all_runs: bool,
    pub terraform_version: String,
    pub working_directory: String,
    pub vcs_repo: Option<VcsRepo>,
    pub created_by: Option<CreatedBy>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct VcsRepo {
    pub identifier: String,
    pub branch: String,
    pub ingress_submodules: bool,
    pub oauth_token_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CreatedBy {
    pub username: String,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WorkspaceRelationships {
    pub organization: Relationship,
    pub ssh_key: Relationship,
}

impl Workspace {
    pub fn name(&self) -> &str {
        &self.attributes.name
    }

    /// Name of the owning organization, when the API returned it
    pub fn organization(&self) -> Option<&str> {
        self.relationships.organization.id()
    }

    pub fn ssh_key_id(&self) -> Option<&str> {
        self.relationships.ssh_key.id()
    }
}

/// Attributes sent when creating or updating a workspace
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorkspaceOptions {
    pub name: String,
    pub auto_apply: bool,
    pub operations: bool,
    pub queue_all_runs: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terraform_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_repo: Option<VcsRepoOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct VcsRepoOptions {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub ingress_submodules: bool,
    pub oauth_token_id: String,
}

fn workspace_path(organization: &str, name: &str) -> String {
    format!(
        "organizations/{}/workspaces/{}",
        segment(organization),
        segment(name)
    )
}

impl ScalrClient {
    pub async fn read_workspace(&self, organization: &str, name: &str) -> Result<Workspace> {
        let doc: Document<Workspace> = self
            .get(
                &workspace_path(organization, name),
                &format!("reading workspace {name}"),
            )
            .await?;
        Ok(doc.data)
    }

    /// Scan the organization's workspaces for the one with the given ID
    pub async fn find_workspace_by_id(
        &self,
        organization: &str,
        external_id: &str,
    ) -> Result<Option<Workspace>> {
        debug!("Looking up workspace {external_id} in organization {organization}");
        self.find_in_pages(
            &format!("organizations/{}/workspaces", segment(organization)),
            "",
            "retrieving workspaces",
            |workspace: &Workspace| workspace.id == external_id,
        )
        .await
    }

    /// Every workspace of the organization accepted by `filter`
    pub async fn list_workspaces<P>(&self, organization: &str, filter: P) -> Result<Vec<Workspace>>
    where
        P: FnMut(&Workspace) -> bool,
    {
        self.collect_pages(
            &format!("organizations/{}/workspaces", segment(organization)),
            "",
            "retrieving workspaces",
            filter,
        )
        .await
    }

    pub async fn create_workspace(
        &self,
        organization: &str,
        options: WorkspaceOptions,
    ) -> Result<Workspace> {
        let context = format!(
            "creating workspace {} for organization {organization}",
            options.name
        );
        let doc: Document<Workspace> = self
            .send(
                Method::POST,
                &format!("organizations/{}/workspaces", segment(organization)),
                &Document {
                    data: ResourceObject::new("workspaces", options),
                },
                &context,
            )
            .await?;
        Ok(doc.data)
    }

    pub async fn update_workspace(
        &self,
        organization: &str,
        name: &str,
        options: WorkspaceOptions,
    ) -> Result<Workspace> {
        let doc: Document<Workspace> = self
            .send(
                Method::PATCH,
                &workspace_path(organization, name),
                &Document {
                    data: ResourceObject::new("workspaces", options),
                },
                &format!("updating workspace {name} for organization {organization}"),
            )
            .await?;
        Ok(doc.data)
    }

    pub async fn delete_workspace(&self, organization: &str, name: &str) -> Result<()> {
        self.delete(
            &workspace_path(organization, name),
            &format!("deleting workspace {name} from organization {organization}"),
        )
        .await
    }

    pub async fn assign_ssh_key(&self, workspace_id: &str, ssh_key_id: &str) -> Result<()> {
        self.send_empty(
            Method::PATCH,
            &format!("workspaces/{}/relationships/ssh-key", segment(workspace_id)),
            &Document {
                data: Relationship::to("ssh-keys", ssh_key_id).data,
            },
            &format!("assigning SSH key to workspace {workspace_id}"),
        )
        .await
    }

    pub async fn unassign_ssh_key(&self, workspace_id: &str) -> Result<()> {
        self.send_empty(
            Method::PATCH,
            &format!("workspaces/{}/relationships/ssh-key", segment(workspace_id)),
            &Document {
                data: Relationship::default().data,
            },
            &format!("unassigning SSH key from workspace {workspace_id}"),
        )
        .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn workspace_json(id: &str, organization: &str, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "type": "workspaces",
            "attributes": {
                "name": name,
                "auto-apply": false,
                "operations": true,
                "queue-all-runs": true,
                "terraform-version": "0.12.19",
                "working-directory": "",
                "vcs-repo": null,
                "created-by": {
                    "username": "admin",
                    "email": "admin@example.com",
                    "full-name": "Admin"
                }
            },
            "relationships": {
                "organization": {"data": {"type": "organizations", "id": organization}},
                "ssh-key": {"data": null}
            }
        })
    }

    #[test]
    fn test_options_skip_unset_fields() {
        let options = WorkspaceOptions {
            name: "ws".to_string(),
            auto_apply: true,
            operations: true,
            queue_all_runs: false,
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(options).unwrap(),
            json!({
                "name": "ws",
                "auto-apply": true,
                "operations": true,
                "queue-all-runs": false
            })
        );
    }

    #[test]
    fn test_workspace_relationships() {
        let workspace: Workspace =
            serde_json::from_value(workspace_json("ws-1", "org-1", "prod")).unwrap();
        assert_eq!(workspace.name(), "prod");
        assert_eq!(workspace.organization(), Some("org-1"));
        assert_eq!(workspace.ssh_key_id(), None);
        assert_eq!(workspace.attributes.created_by.unwrap().username, "admin");
    }

    #[tokio::test]
    async fn test_read_workspace_encodes_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/org-1/workspaces/my%20ws"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": workspace_json("ws-1", "org-1", "my ws")})),
            )
            .mount(&server)
            .await;

        let client = ScalrClient::test_client(&server.uri());
        let workspace = client.read_workspace("org-1", "my ws").await.unwrap();
        assert_eq!(workspace.id, "ws-1");
    }

    #[tokio::test]
    async fn test_find_workspace_by_id_on_second_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/org-1/workspaces"))
            .and(query_param("page[number]", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [workspace_json("ws-1", "org-1", "a")],
                "meta": {"pagination": {"current-page": 1, "next-page": 2, "total-pages": 2, "total-count": 2}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/organizations/org-1/workspaces"))
            .and(query_param("page[number]", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [workspace_json("ws-2", "org-1", "renamed")],
                "meta": {"pagination": {"current-page": 2, "next-page": null, "total-pages": 2, "total-count": 2}}
            })))
            .mount(&server)
            .await;

        let client = ScalrClient::test_client(&server.uri());
        let workspace = client
            .find_workspace_by_id("org-1", "ws-2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(workspace.name(), "renamed");
    }

    #[tokio::test]
    async fn test_unassign_ssh_key_sends_null() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/workspaces/ws-1/relationships/ssh-key"))
            .and(body_json(json!({"data": null})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = ScalrClient::test_client(&server.uri());
        client.unassign_ssh_key("ws-1").await.unwrap();
    }
}
