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
use tf_provider::value::{Value, ValueEmpty, ValueList, ValueString};
use tf_provider::{map, DataSource, Diagnostics};

use crate::client::SharedClient;
use crate::utils::WithSchema;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IamTeamState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub account_id: ValueString<'a>,
    pub identity_provider_id: ValueString<'a>,
    pub users: ValueList<ValueString<'a>>,
}

impl<'a> WithSchema for IamTeamState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("ID of the team"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Exact name of the team"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "description" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Description of the team"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "account_id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Account owning the team"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "identity_provider_id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Identity provider the team comes from"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "users" => Attribute {
                        attr_type: AttributeType::List(AttributeType::String.into()),
                        description: Description::plain("IDs of the members of the team"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                },
                description: Description::plain("Look up an IAM team by name"),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct IamTeamDataSource {
    client: SharedClient,
}

impl IamTeamDataSource {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for IamTeamDataSource {
    type State<'a> = IamTeamState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(IamTeamState::schema())
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
        let name = config.name.as_str();
        let account = Some(config.account_id.as_str()).filter(|account| !account.is_empty());

        debug!("Read iam team: {name}");
        let mut teams = match client.list_iam_teams(name, account).await {
            Ok(teams) => teams,
            Err(err) => {
                diags.root_error("Error retrieving iam team", err.to_string());
                return None;
            }
        };

        let team = match teams.len() {
            0 => {
                diags.root_error_short(format!(
                    "Could not find iam team with name \"{name}\", account_id: \"{}\"",
                    account.unwrap_or_default()
                ));
                return None;
            }
            1 => teams.remove(0),
            _ => {
                diags.root_error_short(
                    "Your query returned more than one result. Please try a more specific search criteria.",
                );
                return None;
            }
        };

        let mut state = config.clone();
        state.id = team.id.clone().into();
        state.description = team.attributes.description.clone().into();
        state.account_id = team.account_id().unwrap_or_default().to_string().into();
        state.identity_provider_id = team
            .identity_provider_id()
            .unwrap_or_default()
            .to_string()
            .into();
        state.users = Value::Value(
            team.user_ids()
                .map(|user| Value::Value(user.to_string().into()))
                .collect(),
        );
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    use crate::client::ScalrClient;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn team(id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "type": "teams",
            "attributes": {"name": name, "description": "Platform"},
            "relationships": {
                "account": {"data": {"type": "accounts", "id": "acc-1"}},
                "users": {"data": [{"type": "users", "id": "user-1"}]}
            }
        })
    }

    async fn mount_teams(server: &MockServer, teams: Vec<serde_json::Value>) {
        Mock::given(method("GET"))
            .and(path("/iam/teams"))
            .and(query_param("filter[name]", "platform"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": teams,
                "meta": {"pagination": {"current-page": 1, "total-pages": 1, "total-count": 1}}
            })))
            .mount(server)
            .await;
    }

    fn data_source(server: &MockServer) -> IamTeamDataSource {
        IamTeamDataSource::new(SharedClient::configured(ScalrClient::test_client(
            &server.uri(),
        )))
    }

    fn config<'a>(account: Option<&'a str>) -> IamTeamState<'a> {
        IamTeamState {
            name: "platform".into(),
            account_id: account.map(Cow::Borrowed).into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_single_match() {
        let server = MockServer::start().await;
        mount_teams(&server, vec![team("team-1", "platform")]).await;

        let mut diags = Diagnostics::default();
        let state = data_source(&server)
            .read(&mut diags, config(None), Default::default())
            .await
            .unwrap();
        assert_eq!(state.id.as_str(), "team-1");
        assert_eq!(state.description.as_str(), "Platform");
        assert_eq!(state.account_id.as_str(), "acc-1");
        assert_eq!(state.identity_provider_id.as_str(), "");
        let users = state.users.as_ref_option().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].as_str(), "user-1");
    }

    #[tokio::test]
    async fn test_no_match_names_account() {
        let server = MockServer::start().await;
        mount_teams(&server, vec![team("team-1", "platform-legacy")]).await;

        let mut diags = Diagnostics::default();
        let state = data_source(&server)
            .read(&mut diags, config(Some("acc-9")), Default::default())
            .await;
        assert!(state.is_none());
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(
            diags.errors[0].summary,
            "Could not find iam team with name \"platform\", account_id: \"acc-9\""
        );
    }

    #[tokio::test]
    async fn test_ambiguous_match() {
        let server = MockServer::start().await;
        mount_teams(
            &server,
            vec![team("team-1", "platform"), team("team-2", "platform")],
        )
        .await;

        let mut diags = Diagnostics::default();
        let state = data_source(&server)
            .read(&mut diags, config(None), Default::default())
            .await;
        assert!(state.is_none());
        assert!(diags.errors[0].summary.starts_with("Your query returned more than one result"));
    }
}
