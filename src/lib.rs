#![allow(clippy::single_component_path_imports)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! `swiff-rs` decodes SWF movies into a definition library and frame timeline, and
//! plays them back through a playhead driven by the embedding application.
//!
pub use swiff_internal::*;

#[cfg(all(feature = "dynamic_linking", not(target_family = "wasm")))]
#[allow(unused_imports)]
use swiff_dylib;
