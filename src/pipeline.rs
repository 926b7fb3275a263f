//! The bundling run: inline scripts, stylesheets, external scripts, final pass.

use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use crate::compress::{self, looks_minified, minified_sibling, FinalPassReport, ScriptCompressor};
use crate::css;
use crate::error::{BundleError, ToolError};
use crate::favicon;
use crate::fetch::{is_remote, Fetch};
use crate::scripts::extract_inline_scripts;
use crate::size::{bytes_string, humanize_bytes, SizeLedger};
use crate::tools;
use crate::{Config, FetchFailurePolicy};

lazy_static! {
	/// A whole `<script src="..."></script>` element at the start of a line.
	static ref SCRIPT_SRC_RE: Regex = Regex::new(r#"^\s*<script\s+src="(.*)"\s*>\s*</script>"#).unwrap();
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleReport {
	pub output: PathBuf,
	pub output_size: u64,
	pub ledger: SizeLedger,
	pub final_pass: Option<FinalPassReport>,
	/// Remote scripts that could not be fetched and kept their tag, see [`FetchFailurePolicy::Skip`].
	pub failed_fetches: Vec<String>,
}

/// One bundling run over the documents of a single directory.
///
/// The size ledger lives here, so every run starts counting from zero.
pub struct Bundler<'a> {
	config: &'a Config,
	root_path: PathBuf,
	compressor: ScriptCompressor,
	fetcher: &'a dyn Fetch,
	ledger: SizeLedger,
}

impl<'a> Bundler<'a> {
	/// ## Arguments
	/// * `config` - Which steps to run and which tools to use.
	/// * `root_path` - The directory every relative path in the document is resolved against.
	/// * `fetcher` - Fetches remote scripts.
	pub fn new<P: AsRef<Path>>(config: &'a Config, root_path: P, fetcher: &'a dyn Fetch) -> Bundler<'a> {
		let compressor = if config.compress_scripts {
			ScriptCompressor::new(&config.script_minifier)
		} else {
			ScriptCompressor::disabled(&config.script_minifier)
		};
		Bundler {
			config,
			root_path: root_path.as_ref().to_owned(),
			compressor,
			fetcher,
			ledger: SizeLedger::new(),
		}
	}

	/// Swaps in a different script compressor.
	pub fn with_compressor(mut self, compressor: ScriptCompressor) -> Bundler<'a> {
		self.compressor = compressor;
		self
	}

	pub fn ledger(&self) -> SizeLedger {
		self.ledger
	}

	/// Compresses the body of every inline script.
	///
	/// Each compressed body replaces the first place its original text shows
	/// up in the document. If the same text also appears earlier, outside the
	/// script, that earlier copy is the one replaced.
	pub fn compress_inline_scripts(&mut self, html: &str) -> String {
		let mut html = html.to_owned();
		let scripts = extract_inline_scripts(&html);
		for (i, script) in scripts.iter().enumerate() {
			if script.trim().is_empty() {
				continue;
			}
			if !html.contains(script.as_str()) {
				log::warn!("Inline script {} not found verbatim, leaving it uncompressed", i + 1);
				continue;
			}
			let compressed = self.compressor.compress_str(script, &mut self.ledger);
			if compressed != *script {
				log::info!(
					"Compressed inline script {} from {} to {}",
					i + 1,
					bytes_string(script.len() as u64),
					bytes_string(compressed.len() as u64)
				);
				html = html.replacen(script.as_str(), &compressed, 1);
			}
		}
		html
	}

	/// Replaces each line holding a `<script src="..."></script>` element with
	/// an inline script, writing the result to `out`.
	///
	/// Remote scripts are fetched. Local scripts are compressed first unless
	/// their name already ends in `.min.js`. Whatever follows `</script>` on a
	/// replaced line is kept after the new block. Any other line is copied as
	/// is, line ending included.
	///
	/// With [`FetchFailurePolicy::Abort`] a failed fetch stops the scan: the
	/// lines after it never reach `out` and the error is returned. Returns the
	/// urls that were skipped under [`FetchFailurePolicy::Skip`].
	pub fn inline_external_scripts(&mut self, html: &str, out: &mut String) -> Result<Vec<String>, BundleError> {
		let mut failed = Vec::new();
		for line in html.split_inclusive('\n') {
			let content = line.trim_end_matches(&['\n', '\r'][..]);
			let (src, rest) = match SCRIPT_SRC_RE.captures(content) {
				Some(caps) => (caps[1].to_owned(), &line[caps[0].len()..]),
				None => {
					out.push_str(line);
					continue;
				}
			};

			if is_remote(&src) {
				match self.fetch(&src) {
					Ok(body) => {
						log::info!("Adding external script: {} {}", src, bytes_string(body.len() as u64));
						out.push_str(&script_block("Fetched from", &src, &body, rest));
					}
					Err(e) => {
						log::error!("{}", e);
						match self.config.on_fetch_failure {
							FetchFailurePolicy::Abort => return Err(e),
							FetchFailurePolicy::Skip => {
								out.push_str(line);
								failed.push(src);
							}
						}
					}
				}
			} else {
				let (label, path) = self.local_script(&src);
				let data = fs::read_to_string(&path)
					.map_err(|e| BundleError::from_elem(e, &path.to_string_lossy()))?;
				log::info!("Adding local script: {} {}", label, bytes_string(data.len() as u64));
				out.push_str(&script_block("Read from", &label, &data, rest));
			}
		}
		Ok(failed)
	}

	fn fetch(&self, url: &str) -> Result<String, BundleError> {
		let fail = |reason: String| BundleError::RemoteFetch { url: url.to_owned(), reason };
		let response = self.fetcher.get(url).map_err(fail)?;
		if response.status != 200 {
			return Err(fail(format!("HTTP {}", response.status)));
		}
		Ok(response.body)
	}

	/// The reference to print and the file to read for a local script,
	/// swapping in the minified copy when one gets made.
	fn local_script(&mut self, src: &str) -> (String, PathBuf) {
		let path = self.root_path.join(src);
		if looks_minified(src, "js") {
			return (src.to_owned(), path);
		}
		match self.compressor.compress_file(&path, &mut self.ledger) {
			Some(compressed) => (minified_sibling(src).to_string_lossy().into_owned(), compressed),
			None => (src.to_owned(), path),
		}
	}
}

/// `rest` is the remainder of the replaced line, line ending included.
fn script_block(origin: &str, reference: &str, body: &str, rest: &str) -> String {
	format!("<script>\n// {}: {}\n{}\n</script>{}", origin, reference, body, rest)
}

/// Bundles the html file at `input` into a single self-contained file at `output`.
///
/// ## Arguments
/// * `input` - The entry html file. Relative paths inside it are resolved against its directory.
/// * `output` - Where the bundled document goes.
/// * `config` - Pass a config to select what features to enable. Use `Default::default()` to enable everything.
/// * `fetcher` - Fetches remote scripts, usually an [`HttpFetcher`](crate::HttpFetcher).
///
/// The output is written even when a failed fetch cuts the run short; it then
/// holds everything up to the failing line and the fetch error is returned.
pub fn bundle_file<P: AsRef<Path>, Q: AsRef<Path>>(
	input: P,
	output: Q,
	config: &Config,
	fetcher: &dyn Fetch,
) -> Result<BundleReport, BundleError> {
	let input = input.as_ref();
	let output = output.as_ref();
	let root_path = input.parent().unwrap_or_else(|| Path::new("."));

	let mut html = fs::read_to_string(input)
		.map_err(|e| BundleError::from_elem(e, &input.to_string_lossy()))?;
	let mut bundler = Bundler::new(config, root_path, fetcher);
	advise_missing_tools(config, &bundler.compressor);

	if config.embed_favicon {
		if let Some(embedded) = favicon::embed_favicon(&html, root_path) {
			html = favicon::remove_other_favicons(&embedded);
		}
	}
	if config.compress_scripts {
		html = bundler.compress_inline_scripts(&html);
	}
	if config.inline_css {
		html = css::inline_css(&html, root_path, config.inline_fonts);
	}

	let mut out = String::with_capacity(html.len());
	let scanned = bundler.inline_external_scripts(&html, &mut out);
	fs::write(output, &out).map_err(|e| BundleError::OutputError(output.to_owned(), e))?;
	let failed_fetches = scanned?;

	let output_size = fs::metadata(output)
		.map(|m| m.len())
		.unwrap_or(out.len() as u64);
	log::info!(
		"Standalone HTML file created as {} {}",
		output.display(),
		bytes_string(output_size)
	);
	let ledger = bundler.ledger();
	if !ledger.is_empty() {
		log::info!(
			"Total size reduction: {} bytes ({}) from {} bytes ({}), compression ratio: {:.2}%",
			ledger.compressed,
			humanize_bytes(ledger.compressed),
			ledger.original,
			humanize_bytes(ledger.original),
			ledger.ratio()
		);
	}

	let final_pass = if config.final_pass {
		match compress::final_pass(&config.html_minifier, output) {
			Ok(report) => Some(report),
			Err(ToolError::Unavailable(tool)) => {
				log::debug!("{} not installed, skipping final pass", tool);
				None
			}
			Err(e) => {
				log::warn!("Final pass failed: {}", e);
				None
			}
		}
	} else {
		None
	};

	Ok(BundleReport {
		output: output.to_owned(),
		output_size,
		ledger,
		final_pass,
		failed_fetches,
	})
}

fn advise_missing_tools(config: &Config, compressor: &ScriptCompressor) {
	if !config.compress_scripts && !config.final_pass {
		return;
	}
	if !compressor.is_available() && !tools::exists(&config.html_minifier) {
		log::warn!(
			"Install {} and {} to compress the output (npm install {} {}); continuing without compression",
			config.script_minifier,
			config.html_minifier,
			config.script_minifier,
			config.html_minifier
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fetch::FetchResponse;
	use pretty_assertions::assert_eq;

	struct NoNetwork;

	impl Fetch for NoNetwork {
		fn get(&self, url: &str) -> Result<FetchResponse, String> {
			Err(format!("no network for {}", url))
		}
	}

	fn offline_config() -> Config {
		Config {
			script_minifier: "html-standalone-no-such-minifier".to_owned(),
			html_minifier: "html-standalone-no-such-html-minifier".to_owned(),
			..Default::default()
		}
	}

	#[test]
	fn matches_single_line_script_src() {
		let caps = SCRIPT_SRC_RE.captures(r#"    <script src="js/app.js" ></script>"#).unwrap();
		assert_eq!(&caps[1], "js/app.js");
		assert!(SCRIPT_SRC_RE.captures(r#"<script defer src="a.js"></script>"#).is_none());
		assert!(SCRIPT_SRC_RE.captures(r#"<SCRIPT src="a.js"></SCRIPT>"#).is_none());
		assert!(SCRIPT_SRC_RE.captures(r#"<script src="a.js">"#).is_none());
	}

	#[test]
	fn other_lines_are_copied_exactly() {
		let config = offline_config();
		let mut bundler = Bundler::new(&config, ".", &NoNetwork);
		let html = "  <div>\r\n\t<p>text</p>\n<script>inline()</script>\n   trailing";
		let mut out = String::new();
		assert_eq!(bundler.inline_external_scripts(html, &mut out).unwrap(), Vec::<String>::new());
		assert_eq!(out, html);
	}

	#[test]
	fn nothing_to_compress_without_tool() {
		let config = offline_config();
		let mut bundler = Bundler::new(&config, ".", &NoNetwork);
		let html = "<html><script>alert( 1 )</script></html>";
		assert_eq!(bundler.compress_inline_scripts(html), html);
		assert!(bundler.ledger().is_empty());
	}

	#[test]
	fn failed_fetch_can_be_skipped() {
		let config = Config {
			on_fetch_failure: FetchFailurePolicy::Skip,
			..offline_config()
		};
		let mut bundler = Bundler::new(&config, ".", &NoNetwork);
		let html = "<p>a</p>\n<script src=\"https://example.com/a.js\"></script>\n<p>b</p>\n";
		let mut out = String::new();
		let failed = bundler.inline_external_scripts(html, &mut out).unwrap();
		assert_eq!(failed, vec!["https://example.com/a.js".to_owned()]);
		assert_eq!(out, html);
	}

	#[test]
	fn failed_fetch_aborts_by_default() {
		let config = offline_config();
		let mut bundler = Bundler::new(&config, ".", &NoNetwork);
		let html = "<p>a</p>\n<script src=\"http://example.com/a.js\"></script>\n<p>b</p>\n";
		let mut out = String::new();
		let err = bundler.inline_external_scripts(html, &mut out).unwrap_err();
		assert!(matches!(err, BundleError::RemoteFetch { .. }));
		assert_eq!(out, "<p>a</p>\n");
	}

	#[test]
	fn missing_local_script_is_fatal() {
		let dir = tempfile::tempdir().unwrap();
		let config = offline_config();
		let mut bundler = Bundler::new(&config, dir.path(), &NoNetwork);
		let mut out = String::new();
		let err = bundler
			.inline_external_scripts("<script src=\"gone.js\"></script>\n", &mut out)
			.unwrap_err();
		assert!(matches!(err, BundleError::InvalidPath(_)));
	}

	#[test]
	fn minified_scripts_are_read_as_is() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("lib.min.js"), "x()").unwrap();
		let config = offline_config();
		let mut bundler = Bundler::new(&config, dir.path(), &NoNetwork);
		let mut out = String::new();
		bundler
			.inline_external_scripts("<script src=\"lib.min.js\"></script>", &mut out)
			.unwrap();
		assert_eq!(out, "<script>\n// Read from: lib.min.js\nx()\n</script>");
	}

	#[test]
	fn text_after_the_script_tag_is_kept() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("a.min.js"), "a()").unwrap();
		let config = offline_config();
		let mut bundler = Bundler::new(&config, dir.path(), &NoNetwork);
		let mut out = String::new();
		bundler
			.inline_external_scripts("<script src=\"a.min.js\"></script><!-- keep -->\r\n<p>b</p>\n", &mut out)
			.unwrap();
		assert_eq!(
			out,
			"<script>\n// Read from: a.min.js\na()\n</script><!-- keep -->\r\n<p>b</p>\n"
		);
	}
}
