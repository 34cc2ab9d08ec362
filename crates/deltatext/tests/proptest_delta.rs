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

//! Property tests for the delta algebra and the document engine.

use deltatext::{Attribute, Delta, Document, Style};
use proptest::prelude::*;

/// Short document bodies over a small alphabet with embedded newlines.
fn body() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            3 => prop::char::range('a', 'e'),
            1 => Just('\n'),
            1 => Just(' '),
        ],
        0..24,
    )
    .prop_map(|chars| {
        let mut text: String = chars.into_iter().collect();
        text.push('\n');
        text
    })
}

#[derive(Debug, Clone)]
enum Step {
    Retain(usize),
    RetainBold(usize),
    RetainBullet(usize),
    Delete(usize),
    Insert(String),
}

fn steps() -> impl Strategy<Value = Vec<Step>> {
    proptest::collection::vec(
        prop_oneof![
            (1..4usize).prop_map(Step::Retain),
            (1..4usize).prop_map(Step::RetainBold),
            (1..3usize).prop_map(Step::RetainBullet),
            (1..4usize).prop_map(Step::Delete),
            "[a-c\n]{1,4}".prop_map(Step::Insert),
        ],
        0..8,
    )
}

/// Build a change valid against a document of length `len`: retains and
/// deletes are clamped to the remaining base.
fn change_for(len: usize, steps: &[Step]) -> Delta {
    let mut change = Delta::new();
    let mut remaining = len;
    for step in steps {
        match step {
            Step::Retain(n) => {
                let n = *n.min(&remaining);
                change.retain(n);
                remaining -= n;
            }
            Step::RetainBold(n) => {
                let n = *n.min(&remaining);
                change.retain_with(n, Style::single(Attribute::bold()));
                remaining -= n;
            }
            Step::RetainBullet(n) => {
                let n = *n.min(&remaining);
                change.retain_with(n, Style::single(Attribute::bullet_list()));
                remaining -= n;
            }
            Step::Delete(n) => {
                let n = *n.min(&remaining);
                change.delete(n);
                remaining -= n;
            }
            Step::Insert(text) => {
                change.insert(text.clone());
            }
        }
    }
    change
}

proptest! {
    #[test]
    fn compose_is_associative(
        text in body(),
        first in steps(),
        second in steps(),
    ) {
        let mut doc = Delta::new();
        doc.insert(text);
        let a = change_for(doc.len(), &first);
        let intermediate = doc.compose(&a);
        let b = change_for(intermediate.len(), &second);
        prop_assert_eq!(
            intermediate.compose(&b),
            doc.compose(&a.compose(&b))
        );
    }

    #[test]
    fn compose_length_accounting(text in body(), steps in steps()) {
        let mut doc = Delta::new();
        doc.insert(text);
        let change = change_for(doc.len(), &steps);
        let composed = doc.compose(&change);
        let inserted: usize = change
            .ops()
            .iter()
            .filter(|op| op.is_insert())
            .map(|op| op.len())
            .sum();
        let deleted: usize = change
            .ops()
            .iter()
            .filter(|op| op.is_delete())
            .map(|op| op.len())
            .sum();
        prop_assert_eq!(composed.len(), doc.len() + inserted - deleted);
    }

    #[test]
    fn json_round_trips(text in body(), steps in steps()) {
        let registry = deltatext::AttributeRegistry::fallback();
        let mut doc = Delta::new();
        doc.insert(text);
        // Decorate the document with some formatting first.
        let doc = doc.compose(&change_for(doc.len(), &steps));
        let decoded = Delta::from_json(&doc.to_json(), &registry).unwrap();
        prop_assert_eq!(decoded, doc);
    }

    #[test]
    fn random_edits_keep_tree_and_delta_in_lockstep(
        text in body(),
        edits in proptest::collection::vec(
            (0..4u8, 0..64usize, 0..6usize, "[a-c\n ]{1,5}"),
            1..12,
        ),
    ) {
        let mut delta = Delta::new();
        delta.insert(text);
        let mut document = Document::from_delta(delta).unwrap();
        for (kind, position, span, insertion) in edits {
            let len = document.len();
            let index = position % len;
            match kind {
                0 => {
                    document.insert(index, &insertion).unwrap();
                }
                1 => {
                    let span = span.min(len - index);
                    document.delete(index, span).unwrap();
                }
                2 => {
                    let span = span.min(len - index);
                    document.format(index, span, &Attribute::bold()).unwrap();
                }
                _ => {
                    document
                        .format(index, 0, &Attribute::bullet_list())
                        .unwrap();
                }
            }
            prop_assert_eq!(&document.root().to_delta(), document.delta());
            prop_assert!(document.to_plain_text().ends_with('\n'));
            prop_assert!(document.delta().is_document());
        }
    }
}
