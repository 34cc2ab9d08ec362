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

//! Error types for the document engine.

use thiserror::Error;

/// Result type alias for document engine operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Error type for document engine operations.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// An index does not address a position inside the document.
    #[error("index {index} out of range for document of length {length}")]
    IndexOutOfRange { index: usize, length: usize },

    /// A range extends past the end of the document.
    #[error("range {index}..{end} out of range for document of length {length}")]
    RangeOutOfRange {
        index: usize,
        end: usize,
        length: usize,
    },

    /// `insert` was called with empty text.
    #[error("inserted text must not be empty")]
    EmptyText,

    /// `insert_object` was called with an embed whose key is empty.
    #[error("embed key must not be empty")]
    EmptyEmbedKey,

    /// An edit was attempted on a closed document.
    #[error("document is closed")]
    Closed,

    /// `compose` was called with a change that trims to nothing.
    #[error("cannot compose an empty change")]
    EmptyChange,

    /// A change retains or deletes more characters than the document holds.
    #[error("change affects {affected} characters but the document holds {length}")]
    ChangeTooLong { affected: usize, length: usize },

    /// A delta loaded as a document is not a well-formed document delta.
    #[error("not a document delta: {reason}")]
    InvalidDocument { reason: String },

    /// A JSON operation object could not be decoded.
    #[error("malformed delta operation: {0}")]
    MalformedOp(String),

    /// No rule in a pipeline produced a result.
    #[error("no {pipeline} rule produced a result; the rule set is missing a catch-all")]
    RulesExhausted { pipeline: &'static str },

    /// An edit was issued from inside a change listener.
    #[error("edit issued from inside a change listener")]
    ReentrantEdit,

    /// The document tree no longer matches the composed delta.
    #[error("document tree diverged from the composed delta after a {stage} change: {change}")]
    TreeDivergence { stage: &'static str, change: String },

    /// An attribute key is not present in the registry and the registry has
    /// no `create_missing` policy.
    #[error("unknown attribute key `{0}`")]
    UnknownAttribute(String),

    /// An embed key is not present in the registry and the registry has no
    /// `create_missing` policy.
    #[error("unknown embed key `{0}`")]
    UnknownEmbed(String),

    /// JSON parse failure while decoding a delta.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
