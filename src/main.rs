use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::LevelFilter;

use html_standalone::size::humanize_bytes;
use html_standalone::{
	bundle_file, Config, FetchFailurePolicy, HttpFetcher, DEFAULT_HTML_MINIFIER, DEFAULT_SCRIPT_MINIFIER,
};

#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Cli {
	/// The html entry point.
	#[clap(default_value = "index.html")]
	pub input: PathBuf,
	/// The bundled file, `standalone.html` next to the input by default.
	#[clap(short, long)]
	pub output: Option<PathBuf>,
	/// Leave fonts referenced from stylesheets as they are.
	#[clap(long)]
	pub no_fonts: bool,
	/// Leave stylesheet links as they are.
	#[clap(long)]
	pub no_css: bool,
	/// Don't run scripts through the script minifier.
	#[clap(long)]
	pub no_compress: bool,
	/// Leave favicon links as they are.
	#[clap(long)]
	pub no_favicon: bool,
	/// Skip the whole-document minifier.
	#[clap(long)]
	pub no_final_pass: bool,
	/// `terser` compatible script minifier to use.
	#[clap(long, default_value = DEFAULT_SCRIPT_MINIFIER)]
	pub script_minifier: String,
	/// `html-minifier` compatible document minifier to use.
	#[clap(long, default_value = DEFAULT_HTML_MINIFIER)]
	pub html_minifier: String,
	/// Keep the tag of a remote script that can't be fetched and carry on, instead of stopping.
	#[clap(long)]
	pub skip_failed_fetches: bool,
	/// Print every step.
	#[clap(short, long, conflicts_with = "quiet")]
	pub verbose: bool,
	/// Only print warnings and errors.
	#[clap(short, long)]
	pub quiet: bool,
}

impl Cli {
	fn config(&self) -> Config {
		Config {
			inline_fonts: !self.no_fonts,
			inline_css: !self.no_css,
			compress_scripts: !self.no_compress,
			embed_favicon: !self.no_favicon,
			final_pass: !self.no_final_pass,
			script_minifier: self.script_minifier.clone(),
			html_minifier: self.html_minifier.clone(),
			on_fetch_failure: if self.skip_failed_fetches {
				FetchFailurePolicy::Skip
			} else {
				FetchFailurePolicy::Abort
			},
		}
	}

	fn level(&self) -> LevelFilter {
		if self.verbose {
			LevelFilter::Debug
		} else if self.quiet {
			LevelFilter::Warn
		} else {
			LevelFilter::Info
		}
	}
}

pub fn main() -> Result<()> {
	let cli = Cli::parse();
	env_logger::Builder::new()
		.filter_level(cli.level())
		.parse_default_env()
		.format_timestamp(None)
		.init();

	let output = cli.output.clone().unwrap_or_else(|| {
		cli.input
			.parent()
			.map(|dir| dir.join("standalone.html"))
			.unwrap_or_else(|| PathBuf::from("standalone.html"))
	});
	let report = bundle_file(&cli.input, &output, &cli.config(), &HttpFetcher::new())
		.with_context(|| format!("bundling {}", cli.input.display()))?;

	let ledger = report.ledger;
	println!(
		"Total size reduction: {} bytes ({}) from {} bytes ({})",
		ledger.compressed,
		humanize_bytes(ledger.compressed),
		ledger.original,
		humanize_bytes(ledger.original)
	);
	println!("Compression ratio: {:.2}%", ledger.ratio());

	if !report.failed_fetches.is_empty() {
		bail!(
			"{} remote script(s) could not be fetched and were left as links: {}",
			report.failed_fetches.len(),
			report.failed_fetches.join(", ")
		);
	}
	Ok(())
}
