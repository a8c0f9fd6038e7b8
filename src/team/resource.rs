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

use crate::client::{ScalrClient, ScalrError, SharedClient};
use crate::utils::{replace_on_change, WithSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TeamState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub organization: ValueString<'a>,
}

impl<'a> WithSchema for TeamState<'a> {
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
                        description: Description::plain("Name of the team"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "organization" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Organization owning the team"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                },
                description: Description::plain("Team of a Scalr organization"),
                ..Default::default()
            },
        }
    }
}

/// Split a `<ORGANIZATION>/<TEAM ID>` import ID
fn split_import_id(id: &str) -> Result<(&str, &str), ScalrError> {
    match id.split_once('/') {
        Some((organization, team_id))
            if !organization.is_empty() && !team_id.is_empty() && !team_id.contains('/') =>
        {
            Ok((organization, team_id))
        }
        _ => Err(ScalrError::InvalidId(format!(
            "invalid team import format: {id} (expected <ORGANIZATION>/<TEAM ID>)"
        ))),
    }
}

#[derive(Debug, Default, Clone)]
pub struct TeamResource {
    client: SharedClient,
}

impl TeamResource {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }

    async fn read_state<'a>(
        &self,
        diags: &mut Diagnostics,
        client: &ScalrClient,
        mut state: TeamState<'a>,
    ) -> Option<Value<TeamState<'a>>> {
        let id = state.id.as_str().to_string();

        debug!("Read configuration of team: {id}");
        match client.read_team(&id).await {
            Ok(team) => {
                state.name = team.name().to_string().into();
                if let Some(organization) = team.organization() {
                    state.organization = organization.to_string().into();
                }
                Some(Value::Value(state))
            }
            Err(err) if err.is_not_found() => {
                debug!("Team {id} does no longer exist");
                Some(Value::Null)
            }
            Err(err) => {
                diags.root_error(
                    format!("Error reading configuration of team {id}"),
                    err.to_string(),
                );
                None
            }
        }
    }
}

#[async_trait]
impl Resource for TeamResource {
    type State<'a> = Value<TeamState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(TeamState::schema())
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
        replace_on_change(&mut trigger_replace, "name", &prior.name, &state.name);
        replace_on_change(
            &mut trigger_replace,
            "organization",
            &prior.organization,
            &state.organization,
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
            diags.root_error_short("Cannot create a team from an empty plan");
            return None;
        };
        let name = state.name.as_str().to_string();
        let organization = state.organization.as_str().to_string();

        debug!("Create team {name} for organization: {organization}");
        match client.create_team(&organization, &name).await {
            Ok(team) => state.id = team.id.into(),
            Err(err) => {
                diags.root_error(
                    format!("Error creating team {name} for organization {organization}"),
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
            (Value::Value(prior), Value::Value(planned)) => Value::Value(TeamState {
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

        debug!("Delete team: {id}");
        match client.delete_team(id).await {
            Ok(()) => Some(()),
            Err(err) if err.is_not_found() => Some(()),
            Err(err) => {
                diags.root_error(format!("Error deleting team {id}"), err.to_string());
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        match split_import_id(&id) {
            Ok((organization, team_id)) => Some((
                Value::Value(TeamState {
                    id: team_id.to_string().into(),
                    organization: organization.to_string().into(),
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
