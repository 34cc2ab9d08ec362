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

//! Leaf nodes: text runs and embeds.

use serde_json::Value;

use crate::embed::EmbedType;
use crate::style::Style;

/// A leaf of a line: a styled text run or a single embed.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    Text { text: String, style: Style },
    Embed {
        embed: EmbedType,
        value: Value,
        style: Style,
    },
}

impl Leaf {
    pub fn text(text: impl Into<String>, style: Style) -> Leaf {
        Leaf::Text {
            text: text.into(),
            style,
        }
    }

    pub fn embed(embed: EmbedType, value: Value, style: Style) -> Leaf {
        Leaf::Embed {
            embed,
            value,
            style,
        }
    }

    /// Length in characters; an embed counts as one.
    pub fn len(&self) -> usize {
        match self {
            Leaf::Text { text, .. } => text.chars().count(),
            Leaf::Embed { .. } => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Leaf::Text { .. })
    }

    pub fn is_embed(&self) -> bool {
        matches!(self, Leaf::Embed { .. })
    }

    /// The inline style of this leaf.
    pub fn style(&self) -> &Style {
        match self {
            Leaf::Text { style, .. } | Leaf::Embed { style, .. } => style,
        }
    }

    pub(crate) fn set_style(&mut self, new_style: Style) {
        match self {
            Leaf::Text { style, .. } | Leaf::Embed { style, .. } => {
                *style = new_style;
            }
        }
    }
}
