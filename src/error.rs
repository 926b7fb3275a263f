use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a bundling run.
///
/// Everything recoverable (a missing minifier, a stylesheet that isn't there)
/// is logged and worked around instead of showing up here.
#[derive(Debug, Error)]
pub enum BundleError {
	/// A file the run has to read does not exist
	#[error("Invalid path: {0}")]
	InvalidPath(String),
	/// A file that exists could not be read, e.g. no permission or not utf-8
	#[error("Could not read {0}: {1}")]
	FileReadError(String, #[source] std::io::Error),
	/// The bundled document could not be written
	#[error("Could not write {}: {}", .0.display(), .1)]
	OutputError(PathBuf, #[source] std::io::Error),
	/// A remote script answered with something other than 200, or not at all
	#[error("Failed to fetch {url}: {reason}")]
	RemoteFetch { url: String, reason: String },
}

impl BundleError {
	pub(crate) fn from_elem(e: std::io::Error, elem: &str) -> Self {
		match e.kind() {
			IoErrorKind::NotFound => BundleError::InvalidPath(format!("File not found: {}", elem)),
			_ => BundleError::FileReadError(elem.to_owned(), e),
		}
	}
}

impl From<std::io::Error> for BundleError {
	fn from(e: std::io::Error) -> Self {
		BundleError::from_elem(e, "N/A")
	}
}

/// Why an external minifier did not produce anything usable.
///
/// Never fatal: callers fall back to the original content.
#[derive(Debug, Error)]
pub enum ToolError {
	#[error("{0} is not installed")]
	Unavailable(String),
	#[error("{tool} exited with {status:?}: {stderr}")]
	Failed {
		tool: String,
		status: Option<i32>,
		stderr: String,
	},
	#[error("could not run {tool}: {source}")]
	Io {
		tool: String,
		#[source]
		source: std::io::Error,
	},
	#[error("{0} produced no usable output")]
	NoOutput(String),
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use std::io::{Error, ErrorKind};

	#[test]
	fn read_errors_name_the_file() {
		let missing = BundleError::from_elem(Error::from(ErrorKind::NotFound), "js/app.js");
		assert_eq!(missing.to_string(), "Invalid path: File not found: js/app.js");

		let denied = BundleError::from_elem(Error::new(ErrorKind::PermissionDenied, "denied"), "index.html");
		assert!(matches!(denied, BundleError::FileReadError(ref path, _) if path == "index.html"));
		assert_eq!(denied.to_string(), "Could not read index.html: denied");
	}
}
