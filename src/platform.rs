//! Concrete DOM implementations.

#[cfg(target_arch = "wasm32")]
pub mod browser;

#[cfg(any(test, feature = "memory"))]
pub mod memory;
