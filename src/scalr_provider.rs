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
use tracing::{debug, warn};

use tf_provider::schema::Schema;
use tf_provider::value::ValueEmpty;
use tf_provider::{map, Diagnostics, DynamicDataSource, DynamicResource, Provider};

use crate::{
    agent_pool_token::AgentPoolTokenResource,
    client::{ScalrClient, SharedClient},
    config::{ClientConfig, ProviderConfig},
    team::{IamTeamDataSource, TeamResource},
    team_access::TeamAccessResource,
    team_token::TeamTokenResource,
    utils::{WithSchema, WithValidate},
    variable::VariableResource,
    workspace::{WorkspaceIdsDataSource, WorkspaceResource},
};

#[derive(Debug, Default, Clone)]
pub struct ScalrProvider {
    client: SharedClient,
}

#[async_trait]
impl Provider for ScalrProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ProviderConfig::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        config.validate(diags, Default::default());

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let config = ClientConfig::resolve(&config, diags)?;
        debug!(
            "Configure provider for {} (terraform {terraform_version})",
            config.hostname
        );

        let client = match ScalrClient::new(&config) {
            Ok(client) => client,
            Err(err) => {
                diags.root_error("Error configuring the Scalr client", err.to_string());
                return None;
            }
        };
        if !self.client.set(client) {
            warn!("Provider already configured, keeping the first client");
        }
        Some(())
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<std::collections::HashMap<String, Box<dyn DynamicResource>>>
    {
        let client = &self.client;
        Some(map! {
            "workspace"        => WorkspaceResource::new(client.clone()),
            "variable"         => VariableResource::new(client.clone()),
            "team"             => TeamResource::new(client.clone()),
            "team_access"      => TeamAccessResource::new(client.clone()),
            "team_token"       => TeamTokenResource::new(client.clone()),
            "agent_pool_token" => AgentPoolTokenResource::new(client.clone()),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<
        std::collections::HashMap<String, Box<dyn DynamicDataSource>>,
    > {
        let client = &self.client;
        Some(map! {
            "workspace_ids" => WorkspaceIdsDataSource::new(client.clone()),
            "iam_team"      => IamTeamDataSource::new(client.clone()),
        })
    }
}
