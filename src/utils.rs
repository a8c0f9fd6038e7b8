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

use std::cell::RefCell;

use tf_provider::schema::Schema;
use tf_provider::value::Value;
use tf_provider::{AttributePath, Diagnostics};

pub(crate) trait WithSchema {
    fn schema() -> Schema;
}

pub(crate) trait WithValidate {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath);
}

impl<T: WithValidate> WithValidate for Value<T> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let Value::Value(value) = self {
            value.validate(diags, attr_path);
        }
    }
}

/// Fill attributes left out of the configuration with their default
pub(crate) trait WithDefaults {
    fn apply_defaults(&mut self, config: &Self);
}

/// Default of an optional attribute, taken when the configuration leaves it null
///
/// Unknown configuration values stay unknown.
pub(crate) fn or_default<T: Clone>(config: &Value<T>, default: T) -> Value<T> {
    config.clone().or(Value::Value(default))
}

/// Whether an attribute will change, an unknown proposed value counting as a change
pub(crate) fn has_changed<T: PartialEq>(prior: &Value<T>, proposed: &Value<T>) -> bool {
    proposed.is_unknown() || prior != proposed
}

/// Record a replacement trigger for a ForceNew attribute
pub(crate) fn replace_on_change<T: PartialEq>(
    triggers: &mut Vec<AttributePath>,
    name: &'static str,
    prior: &Value<T>,
    proposed: &Value<T>,
) {
    if has_changed(prior, proposed) {
        triggers.push(AttributePath::new(name));
    }
}

/// Check that a value is one of `allowed`
pub(crate) fn validate_one_of(
    diags: &mut Diagnostics,
    value: &Value<impl AsRef<str>>,
    allowed: &[&str],
    attr_path: AttributePath,
) {
    if let Value::Value(value) = value {
        let value = value.as_ref();
        if !allowed.contains(&value) {
            diags.error(
                format!("Invalid value `{value}`"),
                format!(
                    "Expected one of: {}",
                    allowed.iter().map(|a| format!("`{a}`")).join_with(", ")
                ),
                attr_path,
            );
        }
    }
}

pub struct DisplayJoiner<'a, T, I>
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    iter: RefCell<T>,
    sep: &'a str,
}

pub trait DisplayJoinable {
    type Joiner<'a>;
    fn join_with(self, sep: &str) -> Self::Joiner<'_>;
}

impl<T, I> DisplayJoinable for T
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    type Joiner<'a> = DisplayJoiner<'a, T, I>;

    fn join_with(self, sep: &str) -> Self::Joiner<'_> {
        DisplayJoiner {
            iter: RefCell::new(self),
            sep,
        }
    }
}

impl<'a, T, I> std::fmt::Display for DisplayJoiner<'a, T, I>
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut sep = "";
        let mut iter = self.iter.try_borrow_mut().or(Err(std::fmt::Error))?;
        for elt in iter.by_ref() {
            f.write_str(sep)?;
            f.write_fmt(format_args!("{elt}"))?;
            sep = self.sep;
        }
        Ok(())
    }
}
