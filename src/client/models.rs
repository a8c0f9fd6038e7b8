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

//! JSON:API envelopes shared by every Scalr endpoint

use serde::{Deserialize, Serialize};

/// Top-level document holding a single primary resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document<T> {
    pub data: T,
}

/// Top-level document holding a page of resources
#[derive(Debug, Clone, Deserialize)]
pub struct ListDocument<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: Option<ListMeta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMeta {
    pub pagination: Option<Pagination>,
}

/// Pagination metadata of a list response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Pagination {
    #[serde(default)]
    pub current_page: u32,
    pub next_page: Option<u32>,
    #[serde(default)]
    pub total_pages: u32,
}

/// Resource identifier object (`{"type": ..., "id": ...}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

/// To-one relationship
///
/// `data` is serialized as `null` when empty, which is how a relationship is cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub data: Option<ResourceRef>,
}

impl Relationship {
    pub fn to(kind: &str, id: &str) -> Self {
        Self {
            data: Some(ResourceRef {
                kind: kind.to_owned(),
                id: id.to_owned(),
            }),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.data.as_ref().map(|data| data.id.as_str())
    }
}

/// To-many relationship
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationshipList {
    #[serde(default)]
    pub data: Vec<ResourceRef>,
}

impl RelationshipList {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.data.iter().map(|data| data.id.as_str())
    }
}

/// Resource object sent in create and update requests
#[derive(Debug, Clone, Serialize)]
pub struct ResourceObject<A, R = ()> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub attributes: A,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<R>,
}

impl<A> ResourceObject<A> {
    pub fn new(kind: &'static str, attributes: A) -> Self {
        Self {
            kind,
            id: None,
            attributes,
            relationships: None,
        }
    }
}

impl<A, R> ResourceObject<A, R> {
    pub fn with_relationships(kind: &'static str, attributes: A, relationships: R) -> Self {
        Self {
            kind,
            id: None,
            attributes,
            relationships: Some(relationships),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_owned());
        self
    }
}
