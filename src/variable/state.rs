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

use serde::{Deserialize, Serialize};

use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{ValueBool, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::client::variables::{Category, Variable, VariableOptions};
use crate::utils::{or_default, validate_one_of, WithDefaults, WithSchema, WithValidate};
use crate::workspace::WORKSPACE_ID_ATTRIBUTE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VariableState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub key: ValueString<'a>,
    pub value: ValueString<'a>,
    pub category: ValueString<'a>,
    pub hcl: ValueBool,
    pub sensitive: ValueBool,
    pub workspace_id: ValueString<'a>,
}

impl<'a> WithSchema for VariableState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("ID of the variable"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "key" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the variable"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "value" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Value of the variable (default: empty)"),
                        constraint: AttributeConstraint::OptionalComputed,
                        sensitive: true,
                        ..Default::default()
                    },
                    "category" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Whether this is a Terraform (`terraform`) or an environment (`env`) variable"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "hcl" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether the value is parsed as HCL (default: false)"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "sensitive" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether the value is write-only (default: false)"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "workspace_id" => WORKSPACE_ID_ATTRIBUTE.clone(),
                },
                description: Description::plain("Variable of a Scalr workspace"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for VariableState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        let allowed = Category::ALL.map(|category| category.as_str());
        validate_one_of(
            diags,
            &self.category,
            &allowed,
            attr_path.attribute("category"),
        );
    }
}

impl<'a> WithDefaults for VariableState<'a> {
    fn apply_defaults(&mut self, config: &Self) {
        self.value = or_default(&config.value, "".into());
        self.hcl = or_default(&config.hcl, false);
        self.sensitive = or_default(&config.sensitive, false);
    }
}

impl<'a> VariableState<'a> {
    pub fn options(&self, category: Option<Category>) -> VariableOptions {
        VariableOptions {
            key: self.key.as_str().to_string(),
            value: self.value.as_str().to_string(),
            category,
            hcl: self.hcl.unwrap_or(false),
            sensitive: self.sensitive.unwrap_or(false),
        }
    }

    /// Write the API view back; the value of a sensitive variable is never returned
    pub fn refresh(&mut self, variable: Variable) {
        let attributes = variable.attributes;
        self.id = variable.id.into();
        self.key = attributes.key.into();
        self.category = attributes.category.as_str().into();
        self.hcl = attributes.hcl.into();
        self.sensitive = attributes.sensitive.into();
        if !attributes.sensitive {
            self.value = attributes.value.unwrap_or_default().into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::variables::VariableAttributes;
    use tf_provider::value::Value;

    fn variable(sensitive: bool) -> Variable {
        Variable {
            id: "var-1".to_string(),
            attributes: VariableAttributes {
                key: "region".to_string(),
                value: if sensitive { None } else { Some("eu".to_string()) },
                category: Category::Env,
                hcl: false,
                sensitive,
            },
        }
    }

    #[test]
    fn test_validate_category() {
        let mut diags = Diagnostics::default();
        let state = VariableState {
            category: "env".into(),
            ..Default::default()
        };
        state.validate(&mut diags, AttributePath::default());
        assert!(diags.errors.is_empty());

        let state = VariableState {
            category: "secret".into(),
            ..Default::default()
        };
        state.validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn test_refresh_keeps_sensitive_value() {
        let mut state = VariableState {
            value: "hunter2".into(),
            ..Default::default()
        };
        state.refresh(variable(true));
        assert_eq!(state.value.as_str(), "hunter2");
        assert_eq!(state.sensitive, Value::Value(true));

        state.refresh(variable(false));
        assert_eq!(state.value.as_str(), "eu");
        assert_eq!(state.category.as_str(), "env");
    }
}
