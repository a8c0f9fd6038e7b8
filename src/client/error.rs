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

use serde::Deserialize;
use thiserror::Error;

use crate::utils::DisplayJoinable;

/// Error returned by the Scalr API client
#[derive(Debug, Error)]
pub enum ScalrError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The API answered with 404
    #[error("resource not found")]
    NotFound,
    /// The API answered with any other error status
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A composite identifier could not be parsed or built
    #[error("{0}")]
    InvalidId(String),
    /// Provider configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl ScalrError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScalrError::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, ScalrError>;

#[derive(Debug, Default, Deserialize)]
struct ErrorDocument {
    #[serde(default)]
    errors: Vec<ErrorObject>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorObject {
    title: Option<String>,
    detail: Option<String>,
}

/// Build a readable message from a JSON:API error body
///
/// Falls back to the raw body when it is not a JSON:API error document.
pub(crate) fn api_error_message(context: &str, body: &str) -> String {
    let details = serde_json::from_str::<ErrorDocument>(body)
        .map(|doc| {
            doc.errors
                .into_iter()
                .filter_map(|err| err.detail.filter(|d| !d.is_empty()).or(err.title))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if !details.is_empty() {
        format!("{context}: {}", details.iter().join_with("; "))
    } else if !body.trim().is_empty() {
        format!("{context}: {}", body.trim())
    } else {
        context.to_owned()
    }
}
