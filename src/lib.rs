//! Bundles an html entry point together with the scripts, stylesheets and
//! fonts it references into one self-contained html file.
//!
//! A run goes through these steps, each working on the output of the one before:
//! 1. the `.ico` favicon is embedded as a `data:` URI,
//! 2. inline `<script>` bodies go through an external minifier (`terser`),
//! 3. local `<link rel="stylesheet">` tags become `<style>` blocks, with the
//!    fonts they reference embedded as base64,
//! 4. single-line `<script src="..."></script>` tags are replaced by the
//!    fetched or read (and minified) script,
//! 5. the finished file optionally goes through a whole-document minifier
//!    (`html-minifier-next`), which writes a separate `.min.html` copy.
//!
//! Missing minifiers only cost compression, never the bundle. A remote script
//! that can't be fetched stops the run unless told otherwise, see [`FetchFailurePolicy`].
//!
//! ```no_run
//! use html_standalone::{bundle_file, Config, HttpFetcher};
//!
//! let report = bundle_file("index.html", "standalone.html", &Config::default(), &HttpFetcher::new()).unwrap();
//! println!("{} bytes", report.output_size);
//! ```

extern crate base64;
extern crate regex;
#[macro_use]
extern crate html5ever;

pub mod compress;
pub mod css;
mod error;
pub mod favicon;
pub mod fetch;
pub mod fonts;
mod pipeline;
pub mod scripts;
pub mod size;
pub mod tools;


pub use error::{BundleError, ToolError};
pub use fetch::{Fetch, FetchResponse, HttpFetcher};
pub use pipeline::{bundle_file, BundleReport, Bundler};
pub use size::SizeLedger;

/// Script minifier looked up when none is configured.
pub const DEFAULT_SCRIPT_MINIFIER: &str = "terser";
/// Whole-document minifier looked up when none is configured.
pub const DEFAULT_HTML_MINIFIER: &str = "html-minifier-next";

/// What to do when a remote script can't be fetched.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FetchFailurePolicy {
	/// Stop scanning. Lines after the failing one never make it into the output.
	Abort,
	/// Keep the `<script src>` line as it was and carry on.
	Skip,
}

/// Config struct that is passed to `bundle_file()` and `Bundler::new()`
///
/// Default enables everything
#[derive(Debug, Clone)]
pub struct Config {
	/// Whether or not to inline fonts in the css as base64.
	pub inline_fonts: bool,
	/// Whether or not to replace local stylesheet links with `<style>` blocks.
	pub inline_css: bool,
	/// Run inline and external scripts through the script minifier.
	pub compress_scripts: bool,
	/// Embed the `.ico` favicon and drop the png and apple-touch icon links.
	pub embed_favicon: bool,
	/// Run the whole-document minifier over the finished file.
	pub final_pass: bool,
	/// Name or path of the `terser` compatible script minifier.
	pub script_minifier: String,
	/// Name or path of the `html-minifier` compatible whole-document minifier.
	pub html_minifier: String,
	/// What to do with a `<script src>` tag whose remote script can't be fetched.
	pub on_fetch_failure: FetchFailurePolicy,
}

impl Default for Config {
	/// Enables everything
	fn default() -> Config {
		Config {
			inline_fonts: true,
			inline_css: true,
			compress_scripts: true,
			embed_favicon: true,
			final_pass: true,
			script_minifier: DEFAULT_SCRIPT_MINIFIER.to_owned(),
			html_minifier: DEFAULT_HTML_MINIFIER.to_owned(),
			on_fetch_failure: FetchFailurePolicy::Abort,
		}
	}
}
