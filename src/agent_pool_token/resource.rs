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
use tf_provider::{map, Diagnostics, Resource};

use crate::client::{ScalrClient, SharedClient};
use crate::utils::{has_changed, replace_on_change, WithSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AgentPoolTokenState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub description: ValueString<'a>,
    pub agent_pool_id: ValueString<'a>,
    pub token: ValueString<'a>,
}

impl<'a> WithSchema for AgentPoolTokenState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("ID of the token"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "description" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Description of the token"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "agent_pool_id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("ID of the agent pool"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "token" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Token, only known after creation"),
                        constraint: AttributeConstraint::Computed,
                        sensitive: true,
                        ..Default::default()
                    },
                },
                description: Description::plain("Access token of a Scalr agent pool"),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct AgentPoolTokenResource {
    client: SharedClient,
}

impl AgentPoolTokenResource {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }

    async fn read_state<'a>(
        &self,
        diags: &mut Diagnostics,
        client: &ScalrClient,
        mut state: AgentPoolTokenState<'a>,
    ) -> Option<Value<AgentPoolTokenState<'a>>> {
        let id = state.id.as_str().to_string();
        let pool_id = state.agent_pool_id.as_str().to_string();
        if pool_id.is_empty() {
            diags.root_error_short("This resource does not support import");
            return None;
        }

        debug!("Read configuration of agent pool token: {id}");
        match client.find_agent_pool_token(&pool_id, &id).await {
            Ok(Some(token)) => {
                state.description = token.attributes.description.into();
                Some(Value::Value(state))
            }
            Ok(None) => {
                debug!("Token {id} does no longer exist in agent pool {pool_id}");
                Some(Value::Null)
            }
            Err(err) if err.is_not_found() => {
                debug!("Agent pool {pool_id} does no longer exist");
                Some(Value::Null)
            }
            Err(err) => {
                diags.root_error(
                    format!("Error reading configuration of agent pool token {id}"),
                    err.to_string(),
                );
                None
            }
        }
    }
}

#[async_trait]
impl Resource for AgentPoolTokenResource {
    type State<'a> = Value<AgentPoolTokenState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(AgentPoolTokenState::schema())
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
        state.token = Value::Unknown;
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
        let (Value::Value(prior), Value::Value(mut state)) = (prior_state, proposed_state) else {
            return Some((Value::Unknown, prior_private_state, vec![]));
        };

        let mut trigger_replace = Vec::new();
        replace_on_change(
            &mut trigger_replace,
            "agent_pool_id",
            &prior.agent_pool_id,
            &state.agent_pool_id,
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
            diags.root_error_short("Cannot create an agent pool token from an empty plan");
            return None;
        };
        let pool_id = state.agent_pool_id.as_str().to_string();

        debug!("Create token for agent pool: {pool_id}");
        match client
            .create_agent_pool_token(&pool_id, state.description.as_str())
            .await
        {
            Ok(token) => {
                state.id = token.id.into();
                state.token = token.attributes.token.unwrap_or_default().into();
            }
            Err(err) => {
                diags.root_error(
                    format!("Error creating access token for agent pool {pool_id}"),
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
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.client.get(diags)?;
        let (Value::Value(prior), Value::Value(mut state)) = (prior_state, planned_state) else {
            diags.root_error_short("Cannot update an agent pool token without prior state");
            return None;
        };
        state.id = prior.id;
        state.token = prior.token;

        if has_changed(&prior.description, &state.description) {
            let id = state.id.as_str().to_string();
            debug!("Update agent pool token: {id}");
            if let Err(err) = client
                .update_access_token(&id, state.description.as_str())
                .await
            {
                diags.root_error(format!("Error updating agent pool token {id}"), err.to_string());
                return None;
            }
        }

        let state = self.read_state(diags, client, state).await?;
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

        debug!("Delete agent pool token: {id}");
        match client.delete_access_token(id).await {
            Ok(()) => Some(()),
            Err(err) if err.is_not_found() => Some(()),
            Err(err) => {
                diags.root_error(format!("Error deleting agent pool token {id}"), err.to_string());
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        _diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        // The pool is unknown here, the following read rejects the import
        Some((
            Value::Value(AgentPoolTokenState {
                id: id.into(),
                ..Default::default()
            }),
            Default::default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resource(server: &MockServer) -> AgentPoolTokenResource {
        AgentPoolTokenResource::new(SharedClient::configured(ScalrClient::test_client(
            &server.uri(),
        )))
    }

    fn stored<'a>() -> AgentPoolTokenState<'a> {
        AgentPoolTokenState {
            id: "at-2".into(),
            description: "old".into(),
            agent_pool_id: "apool-1".into(),
            token: "secret".into(),
        }
    }

    async fn mount_listing(server: &MockServer, tokens: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/agent-pools/apool-1/access-tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": tokens,
                "meta": {"pagination": {"current-page": 1, "total-pages": 1}}
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn read(
        server: &MockServer,
        diags: &mut Diagnostics,
        state: AgentPoolTokenState<'static>,
    ) -> Option<Value<AgentPoolTokenState<'static>>> {
        resource(server)
            .read(diags, Value::Value(state), Default::default(), Default::default())
            .await
            .map(|(state, _)| state)
    }

    #[tokio::test]
    async fn test_create() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/agent-pools/apool-1/access-tokens"))
            .and(body_partial_json(json!({
                "data": {"type": "access-tokens", "attributes": {"description": "ci"}}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {"id": "at-1", "type": "access-tokens", "attributes": {"description": "ci", "token": "secret"}}
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_listing(&server, json!([
            {"id": "at-1", "type": "access-tokens", "attributes": {"description": "ci"}}
        ]))
        .await;

        let planned = AgentPoolTokenState {
            description: "ci".into(),
            agent_pool_id: "apool-1".into(),
            ..Default::default()
        };
        let mut diags = Diagnostics::default();
        let (state, _) = resource(&server)
            .create(
                &mut diags,
                Value::Value(planned.clone()),
                Value::Value(planned),
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();
        let state = state.as_ref_option().unwrap();
        assert_eq!(state.id.as_str(), "at-1");
        assert_eq!(state.token.as_str(), "secret");
    }

    #[tokio::test]
    async fn test_read_across_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/agent-pools/apool-1/access-tokens"))
            .and(query_param("page[number]", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "at-1", "type": "access-tokens", "attributes": {"description": "other"}}],
                "meta": {"pagination": {"current-page": 1, "next-page": 2, "total-pages": 2, "total-count": 2}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/agent-pools/apool-1/access-tokens"))
            .and(query_param("page[number]", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "at-2", "type": "access-tokens", "attributes": {"description": "renamed"}}],
                "meta": {"pagination": {"current-page": 2, "total-pages": 2, "total-count": 2}}
            })))
            .mount(&server)
            .await;

        let mut diags = Diagnostics::default();
        let state = read(&server, &mut diags, stored()).await.unwrap();
        let state = state.as_ref_option().unwrap();
        assert_eq!(state.description.as_str(), "renamed");
        assert_eq!(state.token.as_str(), "secret");
    }

    #[tokio::test]
    async fn test_read_gone_pool() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/agent-pools/apool-1/access-tokens"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut diags = Diagnostics::default();
        let state = read(&server, &mut diags, stored()).await.unwrap();
        assert!(state.is_null());
    }

    #[tokio::test]
    async fn test_read_after_import_fails() {
        let server = MockServer::start().await;
        let mut diags = Diagnostics::default();
        let (state, _) = resource(&server)
            .import(&mut diags, "at-2".to_string())
            .await
            .unwrap();
        let result = resource(&server)
            .read(&mut diags, state, Default::default(), Default::default())
            .await;
        assert!(result.is_none());
        assert_eq!(diags.errors[0].summary, "This resource does not support import");
    }

    #[tokio::test]
    async fn test_update_description() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/access-tokens/at-2"))
            .and(body_partial_json(json!({"data": {"id": "at-2", "attributes": {"description": "new"}}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": "at-2", "type": "access-tokens", "attributes": {"description": "new"}}
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_listing(&server, json!([
            {"id": "at-2", "type": "access-tokens", "attributes": {"description": "new"}}
        ]))
        .await;

        let planned = AgentPoolTokenState {
            id: Value::Unknown,
            description: "new".into(),
            token: Value::Unknown,
            ..stored()
        };
        let mut diags = Diagnostics::default();
        let (state, _) = resource(&server)
            .update(
                &mut diags,
                Value::Value(stored()),
                Value::Value(planned.clone()),
                Value::Value(planned),
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();
        let state = state.as_ref_option().unwrap();
        assert_eq!(state.id.as_str(), "at-2");
        assert_eq!(state.token.as_str(), "secret");
        assert_eq!(state.description.as_str(), "new");
    }

    #[tokio::test]
    async fn test_create_token_missing_from_pool() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/agent-pools/apool-1/access-tokens"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {"id": "at-1", "type": "access-tokens", "attributes": {"description": "ci", "token": "secret"}}
            })))
            .mount(&server)
            .await;
        mount_listing(&server, json!([])).await;

        let planned = AgentPoolTokenState {
            description: "ci".into(),
            agent_pool_id: "apool-1".into(),
            ..Default::default()
        };
        let mut diags = Diagnostics::default();
        let (state, _) = resource(&server)
            .create(
                &mut diags,
                Value::Value(planned.clone()),
                Value::Value(planned),
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();
        assert!(state.is_null());
    }

    #[tokio::test]
    async fn test_update_read_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/agent-pools/apool-1/access-tokens"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let mut diags = Diagnostics::default();
        let result = resource(&server)
            .update(
                &mut diags,
                Value::Value(stored()),
                Value::Value(stored()),
                Value::Value(stored()),
                Default::default(),
                Default::default(),
            )
            .await;
        assert!(result.is_none());
        assert_eq!(
            diags.errors[0].summary,
            "Error reading configuration of agent pool token at-2"
        );
    }
}
