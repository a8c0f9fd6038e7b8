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
use serde::{Deserialize, Serialize};
use tracing::debug;

use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{Value, ValueEmpty, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Resource};

use crate::client::team_access::Access;
use crate::client::{ScalrClient, SharedClient};
use crate::utils::{replace_on_change, validate_one_of, WithSchema, WithValidate};
use crate::workspace::{split_child_id, WorkspaceId, WORKSPACE_ID_ATTRIBUTE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TeamAccessState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub access: ValueString<'a>,
    pub team_id: ValueString<'a>,
    pub workspace_id: ValueString<'a>,
}

impl<'a> WithSchema for TeamAccessState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("ID of the team access"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "access" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Access level: `admin`, `read`, `plan` or `write`"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "team_id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("ID of the team"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "workspace_id" => WORKSPACE_ID_ATTRIBUTE.clone(),
                },
                description: Description::plain("Access of a team to a workspace"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for TeamAccessState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        let allowed = Access::ALL.map(|access| access.as_str());
        validate_one_of(diags, &self.access, &allowed, attr_path.attribute("access"));
    }
}

#[derive(Debug, Default, Clone)]
pub struct TeamAccessResource {
    client: SharedClient,
}

impl TeamAccessResource {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }

    async fn read_state<'a>(
        &self,
        diags: &mut Diagnostics,
        client: &ScalrClient,
        mut state: TeamAccessState<'a>,
    ) -> Option<Value<TeamAccessState<'a>>> {
        let id = state.id.as_str().to_string();

        debug!("Read configuration of team access: {id}");
        match client.read_team_access(&id).await {
            Ok(team_access) => {
                state.access = team_access.attributes.access.as_str().into();
                state.team_id = team_access.team_id().unwrap_or_default().to_string().into();
                Some(Value::Value(state))
            }
            Err(err) if err.is_not_found() => {
                debug!("Team access {id} does no longer exist");
                Some(Value::Null)
            }
            Err(err) => {
                diags.root_error(
                    format!("Error reading configuration of team access {id}"),
                    err.to_string(),
                );
                None
            }
        }
    }
}

#[async_trait]
impl Resource for TeamAccessResource {
    type State<'a> = Value<TeamAccessState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(TeamAccessState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        config.validate(diags, Default::default());

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
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
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = match proposed_state {
            Value::Value(state) => state,
            other => return Some((other, Default::default())),
        };
        state.id = Value::Unknown;
        Some((Value::Value(state), Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(
        Self::State<'a>,
        Self::PrivateState<'a>,
        Vec<tf_provider::AttributePath>,
    )> {
        let (Value::Value(prior), Value::Value(state)) = (prior_state, proposed_state) else {
            return Some((Value::Unknown, prior_private_state, vec![]));
        };

        let mut trigger_replace = Vec::new();
        replace_on_change(&mut trigger_replace, "access", &prior.access, &state.access);
        replace_on_change(&mut trigger_replace, "team_id", &prior.team_id, &state.team_id);
        replace_on_change(
            &mut trigger_replace,
            "workspace_id",
            &prior.workspace_id,
            &state.workspace_id,
        );

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
            diags.root_error_short("Cannot create a team access from an empty plan");
            return None;
        };

        let access = match state.access.as_str().parse::<Access>() {
            Ok(access) => access,
            Err(err) => {
                diags.error(
                    "Invalid access level",
                    err.to_string(),
                    AttributePath::new("access"),
                );
                return None;
            }
        };
        let workspace_id = match state.workspace_id.as_str().parse::<WorkspaceId>() {
            Ok(id) => id,
            Err(err) => {
                diags.error(
                    "Error unpacking workspace ID",
                    err.to_string(),
                    AttributePath::new("workspace_id"),
                );
                return None;
            }
        };
        let team_id = state.team_id.as_str().to_string();

        let (workspace, team) = futures::join!(
            client.read_workspace(&workspace_id.organization, &workspace_id.name),
            client.read_team(&team_id),
        );
        let workspace = match workspace {
            Ok(workspace) => workspace,
            Err(err) => {
                diags.error(
                    format!(
                        "Error retrieving workspace {} from organization {}",
                        workspace_id.name, workspace_id.organization
                    ),
                    err.to_string(),
                    AttributePath::new("workspace_id"),
                );
                return None;
            }
        };
        let team = match team {
            Ok(team) => team,
            Err(err) => {
                diags.error(
                    format!("Error retrieving team {team_id}"),
                    err.to_string(),
                    AttributePath::new("team_id"),
                );
                return None;
            }
        };

        debug!("Give team {} {access} access to workspace: {}", team.id, workspace.id);
        match client.add_team_access(access, &team.id, &workspace.id).await {
            Ok(team_access) => state.id = team_access.id.into(),
            Err(err) => {
                diags.root_error(
                    format!(
                        "Error giving team {} {access} access to workspace {}",
                        team.id, workspace.id
                    ),
                    err.to_string(),
                );
                return None;
            }
        }

        let state = self.read_state(diags, client, state).await?;
        Some((state, private_state))
    }

    async fn update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        // Every attribute forces a replacement
        let state = match (prior_state, planned_state) {
            (Value::Value(prior), Value::Value(planned)) => Value::Value(TeamAccessState {
                id: prior.id,
                ..planned
            }),
            (_, planned) => planned,
        };
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
        let id = state.as_ref_option().map_or("", |state| state.id.as_str());

        debug!("Delete team access: {id}");
        match client.remove_team_access(id).await {
            Ok(()) => Some(()),
            Err(err) if err.is_not_found() => Some(()),
            Err(err) => {
                diags.root_error(format!("Error deleting team access {id}"), err.to_string());
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        match split_child_id(&id, "team access") {
            Ok((workspace_id, team_access_id)) => Some((
                Value::Value(TeamAccessState {
                    id: team_access_id.to_string().into(),
                    workspace_id: workspace_id.into(),
                    ..Default::default()
                }),
                Default::default(),
            )),
            Err(err) => {
                diags.root_error("Invalid import ID", err.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::workspaces::tests::workspace_json;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resource(server: &MockServer) -> TeamAccessResource {
        TeamAccessResource::new(SharedClient::configured(ScalrClient::test_client(
            &server.uri(),
        )))
    }

    fn planned<'a>() -> TeamAccessState<'a> {
        TeamAccessState {
            access: "write".into(),
            team_id: "team-1".into(),
            workspace_id: "org-1/prod".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_validate_access() {
        let mut diags = Diagnostics::default();
        assert!(TeamAccessResource::default()
            .validate(&mut diags, Value::Value(planned()))
            .await
            .is_some());

        let config = TeamAccessState {
            access: "owner".into(),
            ..planned()
        };
        assert!(TeamAccessResource::default()
            .validate(&mut diags, Value::Value(config))
            .await
            .is_none());
        assert_eq!(diags.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_create() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/org-1/workspaces/prod"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": workspace_json("ws-1", "org-1", "prod")})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/teams/team-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": "team-1", "type": "teams", "attributes": {"name": "ops"}}
            })))
            .mount(&server)
            .await;
        let team_access = json!({
            "data": {
                "id": "tws-1",
                "type": "team-workspaces",
                "attributes": {"access": "write"},
                "relationships": {
                    "team": {"data": {"type": "teams", "id": "team-1"}},
                    "workspace": {"data": {"type": "workspaces", "id": "ws-1"}}
                }
            }
        });
        Mock::given(method("POST"))
            .and(path("/team-workspaces"))
            .and(body_partial_json(json!({
                "data": {
                    "attributes": {"access": "write"},
                    "relationships": {
                        "team": {"data": {"id": "team-1"}},
                        "workspace": {"data": {"id": "ws-1"}}
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(team_access.clone()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/team-workspaces/tws-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(team_access))
            .mount(&server)
            .await;

        let mut diags = Diagnostics::default();
        let (state, _) = resource(&server)
            .create(
                &mut diags,
                Value::Value(planned()),
                Value::Value(planned()),
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();
        let state = state.as_ref_option().unwrap();
        assert_eq!(state.id.as_str(), "tws-1");
        assert_eq!(state.team_id.as_str(), "team-1");
        assert_eq!(state.workspace_id.as_str(), "org-1/prod");
    }

    #[tokio::test]
    async fn test_create_reports_missing_team() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/org-1/workspaces/prod"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": workspace_json("ws-1", "org-1", "prod")})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/teams/team-1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/team-workspaces"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let mut diags = Diagnostics::default();
        let result = resource(&server)
            .create(
                &mut diags,
                Value::Value(planned()),
                Value::Value(planned()),
                Default::default(),
                Default::default(),
            )
            .await;
        assert!(result.is_none());
        assert_eq!(diags.errors[0].summary, "Error retrieving team team-1");
    }

    #[tokio::test]
    async fn test_read_without_team_relationship() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/team-workspaces/tws-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": "tws-1", "type": "team-workspaces", "attributes": {"access": "admin"}}
            })))
            .mount(&server)
            .await;

        let mut diags = Diagnostics::default();
        let (state, _) = resource(&server)
            .read(
                &mut diags,
                Value::Value(TeamAccessState {
                    id: "tws-1".into(),
                    ..planned()
                }),
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();
        let state = state.as_ref_option().unwrap();
        assert_eq!(state.access.as_str(), "admin");
        assert_eq!(state.team_id.as_str(), "");
    }

    #[tokio::test]
    async fn test_import() {
        let mut diags = Diagnostics::default();
        let (state, _) = TeamAccessResource::default()
            .import(&mut diags, "org-1/prod/tws-1".to_string())
            .await
            .unwrap();
        let state = state.as_ref_option().unwrap();
        assert_eq!(state.id.as_str(), "tws-1");
        assert_eq!(state.workspace_id.as_str(), "org-1/prod");
    }

    #[tokio::test]
    async fn test_destroy() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/team-workspaces/tws-1"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/team-workspaces/tws-2"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let state = |id: &'static str| {
            Value::Value(TeamAccessState {
                id: id.into(),
                ..planned()
            })
        };
        let mut diags = Diagnostics::default();
        let result = resource(&server)
            .destroy(&mut diags, state("tws-1"), Default::default(), Default::default())
            .await;
        assert_eq!(result, Some(()));
        assert!(diags.errors.is_empty());

        let result = resource(&server)
            .destroy(&mut diags, state("tws-2"), Default::default(), Default::default())
            .await;
        assert!(result.is_none());
        assert_eq!(diags.errors[0].summary, "Error deleting team access tws-2");
    }
}
