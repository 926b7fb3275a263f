//! Running external minifiers over scripts and whole documents.
//!
//! Nothing in here is fatal. When a tool is missing or fails the caller gets
//! a [`ToolError`] from the `try_` functions, or the original content back from
//! the plain ones, and the decision is logged.

use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;

use crate::error::ToolError;
use crate::size::{bytes_string, SizeLedger};
use crate::tools;

/// Returns the `name.min.ext` sibling of `name.ext`.
pub fn minified_sibling<P: AsRef<Path>>(path: P) -> PathBuf {
	let path = path.as_ref();
	let stem = path.file_stem().map(OsStr::to_string_lossy).unwrap_or_default();
	let name = match path.extension() {
		Some(ext) => format!("{}.min.{}", stem, ext.to_string_lossy()),
		None => format!("{}.min", stem),
	};
	path.with_file_name(name)
}

/// True if the file name follows the `.min.<ext>` convention for already minified files.
pub fn looks_minified(reference: &str, ext: &str) -> bool {
	reference.ends_with(&format!(".min.{}", ext))
}

/// A script minifier reached through its command line, `terser` style:
/// `<tool> -c` as a stdin to stdout filter, or `<tool> -c -o <output> <input>`.
#[derive(Debug, Clone)]
pub struct ScriptCompressor {
	name: String,
	program: Option<PathBuf>,
}

impl ScriptCompressor {
	/// Looks the tool up once. A tool that isn't found makes every call a no-op.
	pub fn new(name: &str) -> ScriptCompressor {
		let program = tools::locate(name);
		match &program {
			Some(path) => log::debug!("Using {} at {}", name, path.display()),
			None => log::debug!("{} not found, scripts will not be compressed", name),
		}
		ScriptCompressor { name: name.to_owned(), program }
	}

	/// A compressor that never finds its tool.
	pub fn disabled(name: &str) -> ScriptCompressor {
		ScriptCompressor { name: name.to_owned(), program: None }
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn is_available(&self) -> bool {
		self.program.is_some()
	}

	fn program(&self) -> Result<&Path, ToolError> {
		self.program
			.as_deref()
			.ok_or_else(|| ToolError::Unavailable(self.name.clone()))
	}

	/// Pipes `script` through the tool and returns what it printed.
	///
	/// The tool is started directly with an argument list, never through a
	/// shell, so the script text can contain anything.
	pub fn try_compress_str(&self, script: &str) -> Result<String, ToolError> {
		let program = self.program()?;
		let output = pipe_through(program, &["-c"], script.as_bytes().to_vec())
			.map_err(|source| ToolError::Io { tool: self.name.clone(), source })?;
		check_status(&self.name, &output)?;
		let compressed = String::from_utf8(output.stdout)
			.map_err(|_| ToolError::NoOutput(self.name.clone()))?;
		if compressed.trim().is_empty() && !script.trim().is_empty() {
			return Err(ToolError::NoOutput(self.name.clone()));
		}
		Ok(compressed)
	}

	/// Compresses a script, or hands back the original text if that isn't possible.
	///
	/// The ledger only moves when the result differs from the input.
	pub fn compress_str(&self, script: &str, ledger: &mut SizeLedger) -> String {
		match self.try_compress_str(script) {
			Ok(compressed) => {
				if compressed != script {
					ledger.record(script.len() as u64, compressed.len() as u64);
				}
				compressed
			}
			Err(ToolError::Unavailable(name)) => {
				log::debug!("{} is not installed, leaving script as is", name);
				script.to_owned()
			}
			Err(e) => {
				log::warn!("{} error: {}", self.name, e);
				script.to_owned()
			}
		}
	}

	/// Writes a minified copy of `path` next to it and returns the copy's path.
	pub fn try_compress_file<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf, ToolError> {
		let path = path.as_ref();
		let program = self.program()?;
		let output_path = minified_sibling(path);
		let output = Command::new(program)
			.arg("-c")
			.arg("-o")
			.arg(&output_path)
			.arg(path)
			.stdin(Stdio::null())
			.output()
			.map_err(|source| ToolError::Io { tool: self.name.clone(), source })?;
		check_status(&self.name, &output)?;
		if !output_path.is_file() {
			return Err(ToolError::NoOutput(self.name.clone()));
		}
		Ok(output_path)
	}

	/// Compresses a script file, returning the minified copy's path, or
	/// `None` if no copy was made and the original should be used.
	pub fn compress_file<P: AsRef<Path>>(&self, path: P, ledger: &mut SizeLedger) -> Option<PathBuf> {
		let path = path.as_ref();
		match self.try_compress_file(path) {
			Ok(output_path) => {
				let before = file_size(path);
				let after = file_size(&output_path);
				ledger.record(before, after);
				log::info!(
					"Compressed {} {} to {} {}",
					path.display(),
					bytes_string(before),
					output_path.display(),
					bytes_string(after)
				);
				Some(output_path)
			}
			Err(ToolError::Unavailable(name)) => {
				log::debug!("{} is not installed, using {} as is", name, path.display());
				None
			}
			Err(e) => {
				log::warn!("Failed to compress {}: {}", path.display(), e);
				None
			}
		}
	}
}

/// Sizes of a document before and after the whole-document minifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalPassReport {
	pub output: PathBuf,
	pub before: u64,
	pub after: u64,
}

/// Runs an `html-minifier` compatible tool over a finished document,
/// writing `name.min.html` next to it. The input file is left alone.
pub fn final_pass<P: AsRef<Path>>(tool: &str, input: P) -> Result<FinalPassReport, ToolError> {
	let input = input.as_ref();
	let program = tools::locate(tool).ok_or_else(|| ToolError::Unavailable(tool.to_owned()))?;
	let output_path = minified_sibling(input);
	log::info!("Running final pass with {}...", tool);
	let output = Command::new(program)
		.args([
			"--collapse-whitespace",
			"--remove-comments",
			"--minify-css",
			"true",
			"--minify-js",
			"true",
		])
		.arg(input)
		.arg("-o")
		.arg(&output_path)
		.stdin(Stdio::null())
		.output()
		.map_err(|source| ToolError::Io { tool: tool.to_owned(), source })?;
	check_status(tool, &output)?;
	if !output_path.is_file() {
		return Err(ToolError::NoOutput(tool.to_owned()));
	}
	let report = FinalPassReport {
		before: file_size(input),
		after: file_size(&output_path),
		output: output_path,
	};
	log::info!(
		"Final pass done ({} -> {})",
		bytes_string(report.before),
		bytes_string(report.after)
	);
	Ok(report)
}

/// Feeds `input` to the program's stdin from a separate thread so a tool that
/// starts printing before it has read everything can't deadlock us.
fn pipe_through(program: &Path, args: &[&str], input: Vec<u8>) -> std::io::Result<Output> {
	let mut child = Command::new(program)
		.args(args)
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()?;

	let writer = child.stdin.take().map(|mut stdin| {
		thread::spawn(move || {
			// A tool that exits early closes the pipe; its status tells the story.
			let _ = stdin.write_all(&input);
		})
	});
	let output = child.wait_with_output()?;
	if let Some(writer) = writer {
		let _ = writer.join();
	}
	Ok(output)
}

fn check_status(tool: &str, output: &Output) -> Result<(), ToolError> {
	if output.status.success() {
		return Ok(());
	}
	Err(ToolError::Failed {
		tool: tool.to_owned(),
		status: output.status.code(),
		stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
	})
}

fn file_size(path: &Path) -> u64 {
	fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
