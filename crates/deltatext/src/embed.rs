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

//! Typed embeds and the embed registry.
//!
//! An embed is a non-textual leaf of length 1. Its [`EmbedPlacement`]
//! decides whether it sits alongside text (`Inline`) or must be the only
//! leaf of its line (`Line`). The fallback registry recognises `hr` and
//! `image`, both line-placed.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::error::{DocumentError, Result};

/// Placeholder code point standing in for one embed in the character
/// model and in plain-text output (Object Replacement Character).
pub const EMBED_PLACEHOLDER: char = '\u{FFFC}';

/// Where an embed may sit relative to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedPlacement {
    /// The embed sits alongside text within a line.
    Inline,
    /// The embed is the only leaf of its line.
    Line,
}

/// Plain-text surrogate for an embed value, used by host-visible
/// rendering (not by `to_plain_text`, which uses [`EMBED_PLACEHOLDER`]).
pub type StringifyEmbed = fn(&Value) -> String;

fn placeholder_stringify(_value: &Value) -> String {
    EMBED_PLACEHOLDER.to_string()
}

/// A registered embed kind: key, placement and plain-text surrogate.
#[derive(Clone)]
pub struct EmbedType {
    key: String,
    placement: EmbedPlacement,
    stringify: StringifyEmbed,
}

impl EmbedType {
    pub fn new(key: impl Into<String>, placement: EmbedPlacement) -> Self {
        Self {
            key: key.into(),
            placement,
            stringify: placeholder_stringify,
        }
    }

    pub fn with_stringify(mut self, stringify: StringifyEmbed) -> Self {
        self.stringify = stringify;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn placement(&self) -> EmbedPlacement {
        self.placement
    }

    pub fn stringify(&self, value: &Value) -> String {
        (self.stringify)(value)
    }
}

impl fmt::Debug for EmbedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedType")
            .field("key", &self.key)
            .field("placement", &self.placement)
            .finish_non_exhaustive()
    }
}

// The stringify function is presentation-only and excluded from equality.
impl PartialEq for EmbedType {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.placement == other.placement
    }
}

impl Eq for EmbedType {}

/// Policy invoked when an embed key is not registered.
pub type CreateMissingEmbed = fn(&str, &Value) -> Result<EmbedType>;

fn synthesize_line_embed(key: &str, _value: &Value) -> Result<EmbedType> {
    Ok(EmbedType::new(key, EmbedPlacement::Line))
}

/// Maps embed keys to their [`EmbedType`].
///
/// Read-only after document construction; share across documents behind
/// an `Arc`. The fallback policy synthesizes a line-placed embed for
/// unknown keys; UI-layer registries may instead install a policy that
/// fails and render an error card.
#[derive(Debug, Clone)]
pub struct EmbedRegistry {
    types: HashMap<String, EmbedType>,
    create_missing: Option<CreateMissingEmbed>,
}

impl EmbedRegistry {
    /// A registry with no recognised keys and no missing-key policy.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
            create_missing: None,
        }
    }

    /// The standard embed set: `hr` and `image`, both line-placed.
    pub fn fallback() -> Self {
        let mut registry = Self::empty();
        registry.register(EmbedType::new("hr", EmbedPlacement::Line));
        registry.register(EmbedType::new("image", EmbedPlacement::Line));
        registry.create_missing = Some(synthesize_line_embed);
        registry
    }

    pub fn register(&mut self, embed: EmbedType) {
        self.types.insert(embed.key.clone(), embed);
    }

    pub fn set_create_missing(&mut self, policy: CreateMissingEmbed) {
        self.create_missing = Some(policy);
    }

    /// Look up the [`EmbedType`] for `key`, consulting `create_missing`
    /// for unregistered keys.
    pub fn get(&self, key: &str, value: &Value) -> Result<EmbedType> {
        if let Some(embed) = self.types.get(key) {
            return Ok(embed.clone());
        }
        match self.create_missing {
            Some(policy) => policy(key, value),
            None => Err(DocumentError::UnknownEmbed(key.to_string())),
        }
    }
}

impl Default for EmbedRegistry {
    fn default() -> Self {
        Self::fallback()
    }
}
