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

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use crypto::{digest::Digest, sha1::Sha1};
use serde::{Deserialize, Serialize};
use tracing::debug;

use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{Value, ValueEmpty, ValueList, ValueMap, ValueString};
use tf_provider::{map, DataSource, Diagnostics};

use crate::client::SharedClient;
use crate::utils::WithSchema;

/// Selects every workspace of the organization
const WILDCARD: &str = "*";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkspaceIdsState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub names: ValueList<ValueString<'a>>,
    pub organization: ValueString<'a>,
    pub ids: ValueMap<'a, ValueString<'a>>,
    pub external_ids: ValueMap<'a, ValueString<'a>>,
}

impl<'a> WithSchema for WorkspaceIdsState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Identifier of the lookup"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "names" => Attribute {
                        attr_type: AttributeType::List(AttributeType::String.into()),
                        description: Description::plain("Names of the workspaces to look up, `*` for all of them"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "organization" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Organization owning the workspaces"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "ids" => Attribute {
                        attr_type: AttributeType::Map(AttributeType::String.into()),
                        description: Description::plain("Terraform IDs (`<ORGANIZATION>/<WORKSPACE>`) by workspace name"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "external_ids" => Attribute {
                        attr_type: AttributeType::Map(AttributeType::String.into()),
                        description: Description::plain("Scalr IDs by workspace name"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                },
                description: Description::plain("IDs of the workspaces of an organization"),
                ..Default::default()
            },
        }
    }
}

/// ID of a lookup: the organization and a digest of the requested names
fn lookup_id<'n>(organization: &str, names: impl Iterator<Item = &'n str>) -> String {
    let mut digest = Sha1::new();
    for name in names {
        digest.input_str(name);
    }
    format!("{organization}/{}", digest.result_str())
}

#[derive(Debug, Default, Clone)]
pub struct WorkspaceIdsDataSource {
    client: SharedClient,
}

impl WorkspaceIdsDataSource {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for WorkspaceIdsDataSource {
    type State<'a> = WorkspaceIdsState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(WorkspaceIdsState::schema())
    }

    async fn validate<'a>(&self, _diags: &mut Diagnostics, _config: Self::State<'a>) -> Option<()> {
        Some(())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.client.get(diags)?;
        let organization = config.organization.as_str().to_string();
        let requested: Vec<&str> = config
            .names
            .iter()
            .flatten()
            .map(|name| name.as_str())
            .collect();
        let names: HashSet<&str> = requested.iter().copied().collect();
        let all = names.contains(WILDCARD);

        debug!("Read workspace IDs of organization: {organization}");
        let workspaces = match client
            .list_workspaces(&organization, |workspace| {
                all || names.contains(workspace.name())
            })
            .await
        {
            Ok(workspaces) => workspaces,
            Err(err) => {
                diags.root_error("Error retrieving workspaces", err.to_string());
                return None;
            }
        };

        let mut ids = BTreeMap::new();
        let mut external_ids = BTreeMap::new();
        for workspace in workspaces {
            let name = workspace.attributes.name;
            ids.insert(
                name.clone().into(),
                Value::Value(format!("{organization}/{name}").into()),
            );
            external_ids.insert(name.into(), Value::Value(workspace.id.into()));
        }

        let id = lookup_id(&organization, requested.into_iter());
        let mut state = config.clone();
        state.id = id.into();
        state.ids = Value::Value(ids);
        state.external_ids = Value::Value(external_ids);
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::workspaces::tests::workspace_json;
    use crate::client::ScalrClient;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_workspaces(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/organizations/org-1/workspaces"))
            .and(query_param("page[number]", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [workspace_json("ws-1", "org-1", "prod"), workspace_json("ws-2", "org-1", "staging")],
                "meta": {"pagination": {"current-page": 1, "next-page": 2, "total-pages": 2, "total-count": 3}}
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/organizations/org-1/workspaces"))
            .and(query_param("page[number]", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [workspace_json("ws-3", "org-1", "dev")],
                "meta": {"pagination": {"current-page": 2, "total-pages": 2, "total-count": 3}}
            })))
            .mount(server)
            .await;
    }

    fn config<'a>(names: &[&'a str]) -> WorkspaceIdsState<'a> {
        WorkspaceIdsState {
            names: Value::Value(names.iter().map(|name| Value::Value((*name).into())).collect()),
            organization: "org-1".into(),
            ..Default::default()
        }
    }

    fn data_source(server: &MockServer) -> WorkspaceIdsDataSource {
        WorkspaceIdsDataSource::new(SharedClient::configured(ScalrClient::test_client(
            &server.uri(),
        )))
    }

    #[test]
    fn test_lookup_id_is_stable() {
        let a = lookup_id("org", ["prod", "dev"].into_iter());
        assert_eq!(a, lookup_id("org", ["prod", "dev"].into_iter()));
        assert_ne!(a, lookup_id("org", ["dev", "prod"].into_iter()));
        assert!(a.starts_with("org/"));
    }

    #[tokio::test]
    async fn test_selected_names_across_pages() {
        let server = MockServer::start().await;
        mount_workspaces(&server).await;

        let mut diags = Diagnostics::default();
        let state = data_source(&server)
            .read(&mut diags, config(&["prod", "dev", "missing"]), Default::default())
            .await
            .unwrap();

        let ids = state.ids.as_ref_option().unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids["prod"].as_str(), "org-1/prod");
        assert_eq!(ids["dev"].as_str(), "org-1/dev");
        let external_ids = state.external_ids.as_ref_option().unwrap();
        assert_eq!(external_ids["dev"].as_str(), "ws-3");
        assert!(state.id.as_str().starts_with("org-1/"));
    }

    #[tokio::test]
    async fn test_wildcard_selects_everything() {
        let server = MockServer::start().await;
        mount_workspaces(&server).await;

        let mut diags = Diagnostics::default();
        let state = data_source(&server)
            .read(&mut diags, config(&["*"]), Default::default())
            .await
            .unwrap();
        assert_eq!(state.ids.as_ref_option().unwrap().len(), 3);
    }
}
