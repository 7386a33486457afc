// SPDX-License-Identifier: GPL-3.0-or-later
pub mod bundle;
pub mod pattern_registry;

pub use bundle::{load_bundle, parse_bundle, BundleError, FormatBundle};
pub use pattern_registry::RegexPatternRegistry;
