//! Parse configuration for movie decoding.
//!
//! The configuration is a plain value handed to [`crate::swf::Movie::from_bytes_with_config`];
//! nothing in the decoder reads process-wide state.

use encoding_rs::{Encoding, WINDOWS_1252};

/// Configuration for decoding a movie.
///
/// # Presets
///
/// - `default()`: Windows-1252 legacy strings, edge bounds, frame count checks
/// - `lenient()`: same encoding, no frame count checks
/// - `strict()`: default checks, and any recovered problem fails the decode
///
/// # Examples
///
/// ```
/// use swiff_types::swf::ParseConfig;
///
/// let config = ParseConfig::default();
/// assert!(config.compute_edge_bounds);
///
/// let japanese = ParseConfig::with_legacy_encoding_label("shift_jis").unwrap();
/// assert_eq!(japanese.legacy_encoding.name(), "Shift_JIS");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
	/// Encoding of STRING fields in movies older than version 6
	pub legacy_encoding: &'static Encoding,
	/// Compute edge-derived bounds for shapes that do not declare them
	pub compute_edge_bounds: bool,
	/// Record a diagnostic when ShowFrame counts disagree with declared frame counts
	pub verify_frame_counts: bool,
	/// Fail the decode with the first diagnostic instead of returning a partial movie
	pub reject_diagnostics: bool,
}

impl Default for ParseConfig {
	fn default() -> Self {
		Self {
			legacy_encoding: WINDOWS_1252,
			compute_edge_bounds: true,
			verify_frame_counts: true,
			reject_diagnostics: false,
		}
	}
}

impl ParseConfig {
	/// Create a configuration with a custom legacy encoding.
	///
	/// # Arguments
	/// * `legacy_encoding` - Encoding for pre-version-6 strings
	pub fn new(legacy_encoding: &'static Encoding) -> Self {
		Self {
			legacy_encoding,
			..Self::default()
		}
	}

	/// Resolve a WHATWG encoding label such as `"shift_jis"` or `"gbk"`.
	///
	/// Returns `None` for unknown labels.
	pub fn with_legacy_encoding_label(label: &str) -> Option<Self> {
		Encoding::for_label(label.as_bytes()).map(Self::new)
	}

	/// Create a lenient configuration that skips frame count checks.
	pub fn lenient() -> Self {
		Self {
			verify_frame_counts: false,
			..Self::default()
		}
	}

	/// Create a strict configuration.
	///
	/// Every check is enabled and the first recorded diagnostic becomes the decode error.
	pub fn strict() -> Self {
		Self {
			verify_frame_counts: true,
			reject_diagnostics: true,
			..Self::default()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_presets_differ() {
		let default = ParseConfig::default();
		assert!(!default.reject_diagnostics);
		assert!(!ParseConfig::lenient().verify_frame_counts);

		let strict = ParseConfig::strict();
		assert_ne!(strict, default);
		assert!(strict.reject_diagnostics);
		assert!(strict.verify_frame_counts);
	}
}
