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

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use tf_provider::map;
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema,
};
use tf_provider::value::{self, Value, ValueBool, ValueList, ValueString};

use crate::client::workspaces::{CreatedBy, VcsRepo, VcsRepoOptions, WorkspaceOptions};
use crate::utils::{or_default, WithDefaults, WithSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WorkspaceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub organization: ValueString<'a>,
    pub auto_apply: ValueBool,
    pub operations: ValueBool,
    pub queue_all_runs: ValueBool,
    pub ssh_key_id: ValueString<'a>,
    pub terraform_version: ValueString<'a>,
    pub working_directory: ValueString<'a>,
    #[serde(with = "value::serde_as_vec")]
    pub vcs_repo: Value<VcsRepoState<'a>>,
    pub created_by: ValueList<Value<CreatedByState<'a>>>,
    pub external_id: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VcsRepoState<'a> {
    #[serde(borrow = "'a")]
    pub identifier: ValueString<'a>,
    pub branch: ValueString<'a>,
    pub ingress_submodules: ValueBool,
    pub oauth_token_id: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CreatedByState<'a> {
    #[serde(borrow = "'a")]
    pub username: ValueString<'a>,
    pub email: ValueString<'a>,
    pub full_name: ValueString<'a>,
}

lazy_static! {
    /// `workspace_id` of the resources attached to a workspace
    pub static ref WORKSPACE_ID_ATTRIBUTE: Attribute = Attribute {
        attr_type: AttributeType::String,
        description: Description::plain(
            "ID of the workspace, in the form `<ORGANIZATION>/<WORKSPACE>`"
        ),
        constraint: AttributeConstraint::Required,
        ..Default::default()
    };
    static ref CREATED_BY_TYPE: AttributeType = AttributeType::Object(map! {
        "username" => AttributeType::String,
        "email" => AttributeType::String,
        "full_name" => AttributeType::String,
    });
}

impl<'a> WithSchema for WorkspaceState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("ID of the workspace, in the form `<ORGANIZATION>/<WORKSPACE>`"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the workspace"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "organization" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Organization owning the workspace"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "auto_apply" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether successful plans are applied automatically (default: false)"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "operations" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether runs are executed remotely (default: true)"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "queue_all_runs" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether runs are queued as soon as the workspace is created (default: true)"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "ssh_key_id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("SSH key assigned to the workspace, empty for none"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "terraform_version" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Terraform version used by the workspace"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "working_directory" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Directory, relative to the repository root, where runs are executed"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "created_by" => Attribute {
                        attr_type: AttributeType::List(CREATED_BY_TYPE.clone().into()),
                        description: Description::plain("User who created the workspace"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "external_id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Scalr ID of the workspace"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                },
                blocks: map! {
                    "vcs_repo" => NestedBlock::Optional(Block {
                        attributes: map! {
                            "identifier" => Attribute {
                                attr_type: AttributeType::String,
                                description: Description::plain("Repository identifier, `<owner>/<repository>`"),
                                constraint: AttributeConstraint::Required,
                                ..Default::default()
                            },
                            "branch" => Attribute {
                                attr_type: AttributeType::String,
                                description: Description::plain("Branch to track, the repository default when empty"),
                                constraint: AttributeConstraint::Optional,
                                ..Default::default()
                            },
                            "ingress_submodules" => Attribute {
                                attr_type: AttributeType::Bool,
                                description: Description::plain("Whether submodules are fetched (default: false)"),
                                constraint: AttributeConstraint::OptionalComputed,
                                ..Default::default()
                            },
                            "oauth_token_id" => Attribute {
                                attr_type: AttributeType::String,
                                description: Description::plain("OAuth token used to access the repository"),
                                constraint: AttributeConstraint::Required,
                                ..Default::default()
                            },
                        },
                        description: Description::plain("Repository the workspace configuration is taken from"),
                        ..Default::default()
                    }),
                },
                description: Description::plain("Scalr workspace"),
                deprecated: false,
            },
        }
    }
}

impl<'a> WithDefaults for WorkspaceState<'a> {
    fn apply_defaults(&mut self, config: &Self) {
        self.auto_apply = or_default(&config.auto_apply, false);
        self.operations = or_default(&config.operations, true);
        self.queue_all_runs = or_default(&config.queue_all_runs, true);
        self.ssh_key_id = or_default(&config.ssh_key_id, "".into());
        if let (Value::Value(vcs_repo), Value::Value(vcs_config)) =
            (&mut self.vcs_repo, &config.vcs_repo)
        {
            vcs_repo.ingress_submodules = or_default(&vcs_config.ingress_submodules, false);
        }
    }
}

impl<'a> WorkspaceState<'a> {
    /// Options of a create or update request
    ///
    /// `terraform_version` and `working_directory` are only sent when set, as is a
    /// non-empty `branch` on create.
    pub fn options(&self, keep_empty_branch: bool) -> WorkspaceOptions {
        WorkspaceOptions {
            name: self.name.as_str().to_string(),
            auto_apply: self.auto_apply.unwrap_or(false),
            operations: self.operations.unwrap_or(true),
            queue_all_runs: self.queue_all_runs.unwrap_or(true),
            terraform_version: non_empty(&self.terraform_version),
            working_directory: non_empty(&self.working_directory),
            vcs_repo: self.vcs_repo.as_ref_option().map(|vcs_repo| VcsRepoOptions {
                identifier: vcs_repo.identifier.as_str().to_string(),
                branch: if keep_empty_branch {
                    Some(vcs_repo.branch.as_str().to_string())
                } else {
                    non_empty(&vcs_repo.branch)
                },
                ingress_submodules: vcs_repo.ingress_submodules.unwrap_or(false),
                oauth_token_id: vcs_repo.oauth_token_id.as_str().to_string(),
            }),
        }
    }
}

fn non_empty(value: &ValueString) -> Option<String> {
    match value.as_str() {
        "" => None,
        value => Some(value.to_string()),
    }
}

impl<'a> VcsRepoState<'a> {
    /// State of the repository block, `branch` only kept when `prior_branch` is set
    pub fn from_api(vcs_repo: &VcsRepo, prior_branch: &ValueString) -> Self {
        Self {
            identifier: vcs_repo.identifier.clone().into(),
            branch: if prior_branch.as_str().is_empty() {
                prior_branch.clone().extend()
            } else {
                vcs_repo.branch.clone().into()
            },
            ingress_submodules: Value::Value(vcs_repo.ingress_submodules),
            oauth_token_id: vcs_repo.oauth_token_id.clone().into(),
        }
    }
}

impl<'a> From<&CreatedBy> for CreatedByState<'a> {
    fn from(created_by: &CreatedBy) -> Self {
        Self {
            username: created_by.username.clone().into(),
            email: created_by.email.clone().into(),
            full_name: created_by.full_name.clone().into(),
        }
    }
}
