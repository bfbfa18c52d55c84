//! Error types for SWF decoding and playback.
//!
//! Errors fall into two groups. Terminal errors ([`ErrorKind::Truncated`],
//! [`ErrorKind::MalformedTag`] and the container-level failures) abort a parse and
//! surface to the caller with the byte offset where they were detected. Local errors
//! ([`ErrorKind::MalformedRecord`], [`ErrorKind::UnresolvedReference`]) drop a single
//! definition or placement; the movie keeps them as [`Diagnostic`] entries.

use std::fmt::Display;

use thiserror::Error;

use super::{header::Compression, tag::TagCode};

/// Coarse classification of a [`SwfError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ErrorKind {
	/// Buffer exhausted mid-read.
	Truncated,
	/// Tag framing is inconsistent with the buffer.
	MalformedTag,
	/// A record inside one definition violates a structural rule.
	MalformedRecord,
	/// A library ID could not be found.
	UnresolvedReference,
	/// A playhead target does not exist.
	UnresolvedSeek,
	/// The compressed body could not be inflated.
	Decompression,
	/// The container itself is not a supported SWF.
	InvalidContainer,
	/// Underlying I/O failure.
	Io,
}

impl ErrorKind {
	/// Returns `true` for kinds that abort the whole parse.
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			ErrorKind::Truncated |
				ErrorKind::MalformedTag |
				ErrorKind::Decompression |
				ErrorKind::InvalidContainer |
				ErrorKind::Io
		)
	}
}

impl Display for ErrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ErrorKind::Truncated => write!(f, "Truncated"),
			ErrorKind::MalformedTag => write!(f, "MalformedTag"),
			ErrorKind::MalformedRecord => write!(f, "MalformedRecord"),
			ErrorKind::UnresolvedReference => write!(f, "UnresolvedReference"),
			ErrorKind::UnresolvedSeek => write!(f, "UnresolvedSeek"),
			ErrorKind::Decompression => write!(f, "Decompression"),
			ErrorKind::InvalidContainer => write!(f, "InvalidContainer"),
			ErrorKind::Io => write!(f, "Io"),
		}
	}
}

/// Errors produced while decoding a SWF stream or driving a playhead.
#[derive(Debug, Error)]
pub enum SwfError {
	/// Not enough data for the requested read
	#[error("Truncated data at offset {offset}: {needed} more bytes needed")]
	Truncated {
		/// Byte offset where the read started
		offset: usize,
		/// Number of bytes that were missing
		needed: usize,
	},

	/// Tag header or tag length inconsistent with the enclosing buffer
	#[error("Malformed tag at offset {offset}: {message}")]
	MalformedTag {
		/// Byte offset of the tag header
		offset: usize,
		/// Description of the inconsistency
		message: String,
	},

	/// A record field is outside its legal range
	#[error("Malformed record at offset {offset}: {message}")]
	MalformedRecord {
		/// Byte offset where the problem was detected
		offset: usize,
		/// Description of the problem
		message: String,
	},

	/// A library ID is not present in the library
	#[error("Unresolved reference to library id {library_id}: {message}")]
	UnresolvedReference {
		/// The missing library ID
		library_id: u16,
		/// Context of the reference
		message: String,
	},

	/// A seek target could not be resolved
	#[error("Unresolved seek target: {target}")]
	UnresolvedSeek {
		/// Human-readable description of the target
		target: String,
	},

	/// Unknown file signature
	#[error("Invalid signature: {0:02X?}")]
	InvalidSignature([u8; 3]),

	/// Recognized but unsupported compression scheme
	#[error("Unsupported compression: {0}")]
	UnsupportedCompression(Compression),

	/// The zlib body failed to inflate
	#[error("Decompression failed: {message}")]
	Decompression {
		/// Message reported by the inflater
		message: String,
	},

	/// IO error
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

impl SwfError {
	/// Returns the coarse kind of this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			SwfError::Truncated {
				..
			} => ErrorKind::Truncated,
			SwfError::MalformedTag {
				..
			} => ErrorKind::MalformedTag,
			SwfError::MalformedRecord {
				..
			} => ErrorKind::MalformedRecord,
			SwfError::UnresolvedReference {
				..
			} => ErrorKind::UnresolvedReference,
			SwfError::UnresolvedSeek {
				..
			} => ErrorKind::UnresolvedSeek,
			SwfError::Decompression {
				..
			} => ErrorKind::Decompression,
			SwfError::InvalidSignature(_) | SwfError::UnsupportedCompression(_) => {
				ErrorKind::InvalidContainer
			}
			SwfError::Io(_) => ErrorKind::Io,
		}
	}

	/// Byte offset attached to the error, if any.
	pub fn offset(&self) -> Option<usize> {
		match self {
			SwfError::Truncated {
				offset,
				..
			} |
			SwfError::MalformedTag {
				offset,
				..
			} |
			SwfError::MalformedRecord {
				offset,
				..
			} => Some(*offset),
			_ => None,
		}
	}

	/// Shorthand for a [`SwfError::MalformedRecord`].
	pub fn malformed_record(offset: usize, message: impl Into<String>) -> Self {
		SwfError::MalformedRecord {
			offset,
			message: message.into(),
		}
	}

	/// Shorthand for a [`SwfError::MalformedTag`].
	pub fn malformed_tag(offset: usize, message: impl Into<String>) -> Self {
		SwfError::MalformedTag {
			offset,
			message: message.into(),
		}
	}
}

/// A problem that was recovered from during decoding.
///
/// Truncation inside a tag body is reported as [`ErrorKind::MalformedRecord`]: the
/// tag framing was valid, only the record inside it was short.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Diagnostic {
	/// What went wrong
	pub kind: ErrorKind,
	/// Byte offset where it was detected
	pub offset: Option<usize>,
	/// The tag being decoded, if any
	pub tag: Option<TagCode>,
	/// The definition or placement that was dropped
	pub library_id: Option<u16>,
	/// Full error message
	pub message: String,
}

impl Diagnostic {
	/// Builds a diagnostic from a locally recovered error.
	pub fn from_error(error: &SwfError, tag: Option<TagCode>, library_id: Option<u16>) -> Self {
		let kind = match error.kind() {
			ErrorKind::Truncated => ErrorKind::MalformedRecord,
			other => other,
		};
		Self {
			kind,
			offset: error.offset(),
			tag,
			library_id,
			message: error.to_string(),
		}
	}
}

impl From<&Diagnostic> for SwfError {
	fn from(diagnostic: &Diagnostic) -> Self {
		match (diagnostic.kind, diagnostic.library_id) {
			(ErrorKind::UnresolvedReference, Some(library_id)) => SwfError::UnresolvedReference {
				library_id,
				message: diagnostic.message.clone(),
			},
			_ => SwfError::malformed_record(diagnostic.offset.unwrap_or(0), diagnostic.to_string()),
		}
	}
}

impl Display for Diagnostic {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "[{}]", self.kind)?;
		if let Some(tag) = self.tag {
			write!(f, " {tag}")?;
		}
		if let Some(id) = self.library_id {
			write!(f, " id={id}")?;
		}
		write!(f, " {}", self.message)
	}
}

/// Downgrades a local failure to a [`Diagnostic`], or hands a terminal one back.
///
/// Truncation inside a framed body and record-level errors are recorded; framing and
/// container errors propagate.
pub(crate) fn recover(
	error: SwfError,
	tag: Option<TagCode>,
	library_id: Option<u16>,
	diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), SwfError> {
	match error.kind() {
		ErrorKind::Truncated | ErrorKind::MalformedRecord | ErrorKind::UnresolvedReference => {
			let diagnostic = Diagnostic::from_error(&error, tag, library_id);
			log::warn!("{diagnostic}");
			diagnostics.push(diagnostic);
			Ok(())
		}
		_ => Err(error),
	}
}
