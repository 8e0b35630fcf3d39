// SPDX-License-Identifier: MIT

//! Branch conditions for workflow transitions
//!
//! Conditions are structured `{left, op, right}` triples, e.g.
//! - `{"left": "$out.approved", "op": "==", "right": true}`
//! - `{"left": "$in.submit.days", "op": ">", "right": 3}`
//! - `{"left": "$out.title", "op": "like", "right": "urgent%"}`

mod ast;
mod bind;
mod evaluator;

pub use ast::{CompareOp, Condition};
pub use bind::{bind, bind_value};
pub use evaluator::{evaluate, like_match, when};
