// SPDX-License-Identifier: MIT

pub mod config;
pub mod process;
pub mod store;
pub mod workflow;
