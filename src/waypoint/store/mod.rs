// SPDX-License-Identifier: MIT

//! Instance repository implementations

mod memory;

pub use memory::MemoryRepository;
