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
use tf_provider::value::{Value, ValueBool, ValueEmpty, ValueString};
use tf_provider::{map, Diagnostics, Resource};

use crate::client::SharedClient;
use crate::utils::{or_default, replace_on_change, WithDefaults, WithSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TeamTokenState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub team_id: ValueString<'a>,
    pub force_regenerate: ValueBool,
    pub token: ValueString<'a>,
}

impl<'a> WithSchema for TeamTokenState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("ID of the team owning the token"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "team_id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("ID of the team"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "force_regenerate" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Replace the token of the team if one already exists (default: false)"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "token" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Generated token"),
                        constraint: AttributeConstraint::Computed,
                        sensitive: true,
                        ..Default::default()
                    },
                },
                description: Description::plain("Authentication token of a team"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithDefaults for TeamTokenState<'a> {
    fn apply_defaults(&mut self, config: &Self) {
        self.force_regenerate = or_default(&config.force_regenerate, false);
    }
}

#[derive(Debug, Default, Clone)]
pub struct TeamTokenResource {
    client: SharedClient,
}

impl TeamTokenResource {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for TeamTokenResource {
    type State<'a> = Value<TeamTokenState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(TeamTokenState::schema())
    }

    async fn validate<'a>(&self, _diags: &mut Diagnostics, _config: Self::State<'a>) -> Option<()> {
        Some(())
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
        let id = state.id.as_str().to_string();

        // The token is only returned when generated: the stored one is kept
        debug!("Read token of team: {id}");
        match client.read_team_token(&id).await {
            Ok(_) => Some((Value::Value(state), private_state)),
            Err(err) if err.is_not_found() => {
                debug!("Token of team {id} does no longer exist");
                Some((Value::Null, private_state))
            }
            Err(err) => {
                diags.root_error(format!("Error reading token for team {id}"), err.to_string());
                None
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = match proposed_state {
            Value::Value(state) => state,
            other => return Some((other, Default::default())),
        };
        if let Value::Value(config) = &config_state {
            state.apply_defaults(config);
        }
        state.id = Value::Unknown;
        state.token = Value::Unknown;
        Some((Value::Value(state), Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(
        Self::State<'a>,
        Self::PrivateState<'a>,
        Vec<tf_provider::AttributePath>,
    )> {
        let (Value::Value(prior), Value::Value(mut state)) = (prior_state, proposed_state) else {
            return Some((Value::Unknown, prior_private_state, vec![]));
        };
        if let Value::Value(config) = &config_state {
            state.apply_defaults(config);
        }

        let mut trigger_replace = Vec::new();
        replace_on_change(&mut trigger_replace, "team_id", &prior.team_id, &state.team_id);
        replace_on_change(
            &mut trigger_replace,
            "force_regenerate",
            &prior.force_regenerate,
            &state.force_regenerate,
        );
        if !trigger_replace.is_empty() {
            state.id = Value::Unknown;
            state.token = Value::Unknown;
        }

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
            diags.root_error_short("Cannot create a team token from an empty plan");
            return None;
        };
        let team_id = state.team_id.as_str().to_string();

        if !state.force_regenerate.unwrap_or(false) {
            match client.read_team_token(&team_id).await {
                Ok(_) => {
                    diags.root_error_short(format!("A token already exists for team: {team_id}"));
                    return None;
                }
                Err(err) if err.is_not_found() => (),
                Err(err) => {
                    diags.root_error(
                        format!("Error checking if a token exists for team {team_id}"),
                        err.to_string(),
                    );
                    return None;
                }
            }
        }

        debug!("Generate token for team: {team_id}");
        match client.generate_team_token(&team_id).await {
            Ok(token) => {
                state.token = token.attributes.token.unwrap_or_default().into();
                state.id = team_id.into();
                Some((Value::Value(state), private_state))
            }
            Err(err) => {
                diags.root_error(
                    format!("Error generating token for team {team_id}"),
                    err.to_string(),
                );
                None
            }
        }
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
            (Value::Value(prior), Value::Value(planned)) => Value::Value(TeamTokenState {
                id: prior.id,
                token: prior.token,
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

        debug!("Delete token of team: {id}");
        match client.delete_team_token(id).await {
            Ok(()) => Some(()),
            Err(err) if err.is_not_found() => Some(()),
            Err(err) => {
                diags.root_error(format!("Error deleting token for team {id}"), err.to_string());
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        _diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        Some((
            Value::Value(TeamTokenState {
                id: id.clone().into(),
                team_id: id.into(),
                force_regenerate: Value::Value(false),
                ..Default::default()
            }),
            Default::default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ScalrClient;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN_PATH: &str = "/teams/team-1/authentication-token";

    fn resource(server: &MockServer) -> TeamTokenResource {
        TeamTokenResource::new(SharedClient::configured(ScalrClient::test_client(
            &server.uri(),
        )))
    }

    fn planned<'a>(force_regenerate: bool) -> TeamTokenState<'a> {
        TeamTokenState {
            team_id: "team-1".into(),
            force_regenerate: Value::Value(force_regenerate),
            ..Default::default()
        }
    }

    fn token_json(token: Option<&str>) -> serde_json::Value {
        json!({"data": {"id": "at-1", "type": "access-tokens", "attributes": {"token": token}}})
    }

    async fn create(
        server: &MockServer,
        diags: &mut Diagnostics,
        force_regenerate: bool,
    ) -> Option<Value<TeamTokenState<'static>>> {
        resource(server)
            .create(
                diags,
                Value::Value(planned(force_regenerate)),
                Value::Value(planned(force_regenerate)),
                Default::default(),
                Default::default(),
            )
            .await
            .map(|(state, _)| state)
    }

    #[tokio::test]
    async fn test_create() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(token_json(Some("secret"))))
            .expect(1)
            .mount(&server)
            .await;

        let mut diags = Diagnostics::default();
        let state = create(&server, &mut diags, false).await.unwrap();
        let state = state.as_ref_option().unwrap();
        assert_eq!(state.id.as_str(), "team-1");
        assert_eq!(state.token.as_str(), "secret");
    }

    #[tokio::test]
    async fn test_create_refuses_existing_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_json(None)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(token_json(Some("secret"))))
            .expect(0)
            .mount(&server)
            .await;

        let mut diags = Diagnostics::default();
        assert!(create(&server, &mut diags, false).await.is_none());
        assert_eq!(
            diags.errors[0].summary,
            "A token already exists for team: team-1"
        );
    }

    #[tokio::test]
    async fn test_create_reports_check_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut diags = Diagnostics::default();
        assert!(create(&server, &mut diags, false).await.is_none());
        assert_eq!(
            diags.errors[0].summary,
            "Error checking if a token exists for team team-1"
        );
    }

    #[tokio::test]
    async fn test_force_regenerate_skips_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_json(None)))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(token_json(Some("fresh"))))
            .expect(1)
            .mount(&server)
            .await;

        let mut diags = Diagnostics::default();
        let state = create(&server, &mut diags, true).await.unwrap();
        assert_eq!(state.as_ref_option().unwrap().token.as_str(), "fresh");
    }

    #[tokio::test]
    async fn test_read_keeps_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_json(None)))
            .mount(&server)
            .await;

        let state = TeamTokenState {
            id: "team-1".into(),
            token: "secret".into(),
            ..planned(false)
        };
        let mut diags = Diagnostics::default();
        let (state, _) = resource(&server)
            .read(
                &mut diags,
                Value::Value(state),
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();
        assert_eq!(state.as_ref_option().unwrap().token.as_str(), "secret");
    }

    #[tokio::test]
    async fn test_import() {
        let mut diags = Diagnostics::default();
        let (state, _) = TeamTokenResource::default()
            .import(&mut diags, "team-1".to_string())
            .await
            .unwrap();
        let state = state.as_ref_option().unwrap();
        assert_eq!(state.team_id.as_str(), "team-1");
        assert_eq!(state.force_regenerate, Value::Value(false));
    }
}
