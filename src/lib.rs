// SPDX-License-Identifier: MIT

//! Declarative workflow engine: named, ordered node sequences with
//! conditional branching, and per-record instances tracked through them.

pub mod kit;
pub mod waypoint;
