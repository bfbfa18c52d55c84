//! Forces dynamic linking of `swiff_internal` for faster incremental builds.

#![allow(clippy::single_component_path_imports)]

#[allow(unused_imports)]
use swiff_internal;
