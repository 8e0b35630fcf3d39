// SPDX-License-Identifier: MIT

pub mod condition;
pub mod context;
pub mod engine;
pub mod loader;
pub mod merge;
pub mod registry;
pub mod resolver;
pub mod types;
