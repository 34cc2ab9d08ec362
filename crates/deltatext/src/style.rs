// Copyright 2026 The Matrix.org Foundation C.I.C.
//
// Licensed under the Apache License, Version 2.0 (the "License");
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

//! Immutable attribute sets.
//!
//! A [`Style`] maps attribute keys to [`Attribute`]s. Every mutator
//! returns a new style; equality is structural. At most one line-scoped
//! attribute may be *set* in a style at a time — applying a second one
//! silently unsets the first, which is what keeps `header`, `list`,
//! `blockquote` and `code-block` mutually exclusive on a single line.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::attributes::{Attribute, AttributeRegistry};
use crate::error::Result;

/// An immutable set of attributes keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    attributes: BTreeMap<String, Attribute>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// A style holding a single attribute.
    pub fn single(attribute: Attribute) -> Self {
        Style::new().put(attribute)
    }

    /// Parse a raw JSON attribute map, resolving scopes via the registry.
    ///
    /// `null` values decode as unset markers; they are kept so that
    /// transient change styles round-trip.
    pub fn from_raw(
        map: &Map<String, Value>,
        registry: &AttributeRegistry,
    ) -> Result<Style> {
        let mut style = Style::new();
        for (key, value) in map {
            let attribute = registry.resolve(key, value)?;
            style.attributes.insert(key.clone(), attribute);
        }
        Ok(style)
    }

    /// The raw `key → value` map, or `None` when the style is empty.
    pub fn to_map(&self) -> Option<Map<String, Value>> {
        if self.is_empty() {
            return None;
        }
        let mut map = Map::new();
        for attribute in self.attributes.values() {
            map.insert(attribute.key().to_string(), attribute.value().clone());
        }
        Some(map)
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Whether this style contains an attribute equal to `attribute` in
    /// key, scope and value.
    pub fn contains_same(&self, attribute: &Attribute) -> bool {
        self.attributes.get(attribute.key()) == Some(attribute)
    }

    pub fn get(&self, key: &str) -> Option<&Attribute> {
        self.attributes.get(key)
    }

    pub fn values(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// The unique *set* line-scoped attribute, or `None`.
    pub fn line_style(&self) -> Option<&Attribute> {
        self.attributes
            .values()
            .find(|a| a.is_line() && !a.is_unset())
    }

    /// Whether every attribute in this style is inline-scoped.
    pub fn is_inline(&self) -> bool {
        self.attributes.values().all(Attribute::is_inline)
    }

    /// The inline-scoped subset of this style.
    pub fn inline_only(&self) -> Style {
        self.filtered(Attribute::is_inline)
    }

    /// The line-scoped subset of this style.
    pub fn line_only(&self) -> Style {
        self.filtered(Attribute::is_line)
    }

    fn filtered(&self, keep: impl Fn(&Attribute) -> bool) -> Style {
        Style {
            attributes: self
                .attributes
                .iter()
                .filter(|(_, a)| keep(a))
                .map(|(k, a)| (k.clone(), a.clone()))
                .collect(),
        }
    }

    /// Insert `attribute`, replacing any attribute under the same key.
    ///
    /// When the incoming attribute is a *set* line-scoped attribute, any
    /// other set line-scoped attributes are removed first. Unset markers
    /// coexist, so a transient style such as
    /// `{list: null, blockquote: true}` is representable.
    pub fn put(&self, attribute: Attribute) -> Style {
        let mut attributes = self.attributes.clone();
        if attribute.is_line() && !attribute.is_unset() {
            attributes.retain(|_, a| a.is_inline() || a.is_unset());
        }
        attributes.insert(attribute.key().to_string(), attribute);
        Style { attributes }
    }

    /// Same as [`put`](Self::put), but unset markers compact to removal.
    pub fn merge(&self, attribute: Attribute) -> Style {
        if attribute.is_unset() {
            let mut attributes = self.attributes.clone();
            attributes.remove(attribute.key());
            Style { attributes }
        } else {
            self.put(attribute)
        }
    }

    /// Merge every attribute of `other` into this style.
    pub fn merge_all(&self, other: &Style) -> Style {
        other
            .attributes
            .values()
            .fold(self.clone(), |style, attribute| {
                style.merge(attribute.clone())
            })
    }

    /// Remove every attribute whose key appears in `attributes`.
    pub fn remove_all<'a>(
        &self,
        attributes: impl IntoIterator<Item = &'a Attribute>,
    ) -> Style {
        let mut result = self.attributes.clone();
        for attribute in attributes {
            result.remove(attribute.key());
        }
        Style { attributes: result }
    }

    /// Raw overlay used by delta composition: `other` wins on conflict
    /// and unset markers are dropped unless `keep_null` is set.
    ///
    /// Unlike [`put`](Self::put) this does not enforce line-attribute
    /// exclusivity — composed change attributes carry explicit unset
    /// markers instead.
    pub(crate) fn compose(&self, other: &Style, keep_null: bool) -> Style {
        let mut attributes = self.attributes.clone();
        for (key, attribute) in &other.attributes {
            attributes.insert(key.clone(), attribute.clone());
        }
        if !keep_null {
            attributes.retain(|_, a| !a.is_unset());
        }
        Style { attributes }
    }

    /// Attributes present with an equal value in both styles.
    pub(crate) fn intersect(&self, other: &Style) -> Style {
        Style {
            attributes: self
                .attributes
                .iter()
                .filter(|(_, a)| other.contains_same(a))
                .map(|(k, a)| (k.clone(), a.clone()))
                .collect(),
        }
    }
}

impl FromIterator<Attribute> for Style {
    fn from_iter<T: IntoIterator<Item = Attribute>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Style::new(), |style, attribute| style.put(attribute))
    }
}
