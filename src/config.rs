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
use tf_provider::value::{Value, ValueBool, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::utils::{WithSchema, WithValidate};

pub const DEFAULT_HOSTNAME: &str = "my.scalr.com";
pub const HOSTNAME_ENV: &str = "SCALR_HOSTNAME";
pub const TOKEN_ENV: &str = "SCALR_TOKEN";
pub const SSL_SKIP_VERIFY_ENV: &str = "SCALR_SSL_SKIP_VERIFY";

/// Provider block
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig<'a> {
    #[serde(borrow = "'a")]
    pub hostname: ValueString<'a>,
    pub token: ValueString<'a>,
    pub ssl_skip_verify: ValueBool,
}

impl<'a> WithSchema for ProviderConfig<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "hostname" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(format!(
                            "The Scalr hostname to connect to. Defaults to `{DEFAULT_HOSTNAME}`, can be set with `{HOSTNAME_ENV}`."
                        )),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "token" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(format!(
                            "The token used to authenticate with Scalr, can be set with `{TOKEN_ENV}`."
                        )),
                        constraint: AttributeConstraint::Optional,
                        sensitive: true,
                        ..Default::default()
                    },
                    "ssl_skip_verify" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain(format!(
                            "Whether or not to skip certificate verifications, can be set with `{SSL_SKIP_VERIFY_ENV}`."
                        )),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                },
                description: Description::plain("Scalr infrastructure management"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for ProviderConfig<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let Value::Value(hostname) = &self.hostname {
            if let Err(err) = validate_hostname(hostname) {
                diags.error(
                    "Invalid hostname",
                    err,
                    attr_path.clone().attribute("hostname"),
                );
            }
        }
    }
}

/// A hostname is a bare host, optionally with a port
pub fn validate_hostname(hostname: &str) -> Result<(), String> {
    if hostname.trim().is_empty() {
        return Err("The hostname must not be empty".to_string());
    }
    if hostname.contains("://") {
        return Err(format!(
            "`{hostname}` must not contain a URL scheme, use the bare host name"
        ));
    }
    if hostname.contains('/') {
        return Err(format!("`{hostname}` must not contain a path"));
    }
    Ok(())
}

/// Fully resolved connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub hostname: String,
    pub token: String,
    pub ssl_skip_verify: bool,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("hostname", &self.hostname)
            .field("ssl_skip_verify", &self.ssl_skip_verify)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// Resolve the provider block against the process environment
    pub fn resolve(config: &ProviderConfig, diags: &mut Diagnostics) -> Option<Self> {
        Self::resolve_with(config, diags, |name| std::env::var(name).ok())
    }

    /// Resolve the provider block: configuration first, then `lookup`, then defaults
    pub fn resolve_with<F>(
        config: &ProviderConfig,
        diags: &mut Diagnostics,
        lookup: F,
    ) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (name, unknown) in [
            ("hostname", config.hostname.is_unknown()),
            ("token", config.token.is_unknown()),
            ("ssl_skip_verify", config.ssl_skip_verify.is_unknown()),
        ] {
            if unknown {
                diags.error(
                    "Unknown provider configuration",
                    format!("`{name}` must be known when the provider is configured"),
                    AttributePath::new(name),
                );
            }
        }
        if !diags.errors.is_empty() {
            return None;
        }

        let hostname = config
            .hostname
            .as_ref_option()
            .map(|hostname| hostname.to_string())
            .or_else(|| lookup(HOSTNAME_ENV).filter(|hostname| !hostname.is_empty()))
            .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string());
        if let Err(err) = validate_hostname(&hostname) {
            diags.error("Invalid hostname", err, AttributePath::new("hostname"));
            return None;
        }

        let Some(token) = config
            .token
            .as_ref_option()
            .map(|token| token.to_string())
            .or_else(|| lookup(TOKEN_ENV))
            .filter(|token| !token.is_empty())
        else {
            diags.root_error(
                "Missing API token",
                format!(
                    "The Scalr API token must be set in the provider block or in the `{TOKEN_ENV}` environment variable"
                ),
            );
            return None;
        };

        let ssl_skip_verify = match config.ssl_skip_verify {
            Value::Value(skip) => skip,
            _ => lookup(SSL_SKIP_VERIFY_ENV)
                .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true"))
                .unwrap_or(false),
        };

        Some(Self {
            hostname,
            token,
            ssl_skip_verify,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_from_environment() {
        let mut diags = Diagnostics::default();
        let config = ClientConfig::resolve_with(
            &ProviderConfig::default(),
            &mut diags,
            env(&[(TOKEN_ENV, "env-token"), (SSL_SKIP_VERIFY_ENV, "TRUE")]),
        )
        .unwrap();
        assert_eq!(config.hostname, DEFAULT_HOSTNAME);
        assert_eq!(config.token, "env-token");
        assert!(config.ssl_skip_verify);
    }

    #[test]
    fn test_configuration_wins_over_environment() {
        let provider = ProviderConfig {
            hostname: "scalr.example.com".into(),
            token: "config-token".into(),
            ssl_skip_verify: Value::Value(false),
        };
        let mut diags = Diagnostics::default();
        let config = ClientConfig::resolve_with(
            &provider,
            &mut diags,
            env(&[
                (HOSTNAME_ENV, "other.example.com"),
                (TOKEN_ENV, "env-token"),
                (SSL_SKIP_VERIFY_ENV, "1"),
            ]),
        )
        .unwrap();
        assert_eq!(config.hostname, "scalr.example.com");
        assert_eq!(config.token, "config-token");
        assert!(!config.ssl_skip_verify);
    }

    #[test]
    fn test_missing_token() {
        let mut diags = Diagnostics::default();
        let config = ClientConfig::resolve_with(&ProviderConfig::default(), &mut diags, env(&[]));
        assert!(config.is_none());
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn test_unknown_values_are_rejected() {
        let provider = ProviderConfig {
            token: Value::Unknown,
            ..Default::default()
        };
        let mut diags = Diagnostics::default();
        let config = ClientConfig::resolve_with(&provider, &mut diags, env(&[(TOKEN_ENV, "t")]));
        assert!(config.is_none());
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn test_validate_hostname() {
        assert!(validate_hostname("my.scalr.com").is_ok());
        assert!(validate_hostname("localhost:8443").is_ok());
        assert!(validate_hostname("").is_err());
        assert!(validate_hostname("https://my.scalr.com").is_err());
        assert!(validate_hostname("my.scalr.com/api").is_err());
    }

    #[test]
    fn test_debug_hides_token() {
        let config = ClientConfig {
            hostname: "h".to_string(),
            token: "secret".to_string(),
            ssl_skip_verify: false,
        };
        assert!(!format!("{config:?}").contains("secret"));
    }
}
