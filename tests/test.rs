extern crate html_standalone;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use html_standalone::{bundle_file, BundleError, Config, Fetch, FetchFailurePolicy, FetchResponse};

/// Answers from a fixed table; anything else is a 404.
#[derive(Default)]
struct StubFetcher {
	pages: HashMap<String, String>,
}

impl StubFetcher {
	fn with(url: &str, body: &str) -> StubFetcher {
		let mut pages = HashMap::new();
		pages.insert(url.to_owned(), body.to_owned());
		StubFetcher { pages }
	}
}

impl Fetch for StubFetcher {
	fn get(&self, url: &str) -> Result<FetchResponse, String> {
		Ok(match self.pages.get(url) {
			Some(body) => FetchResponse { status: 200, body: body.clone() },
			None => FetchResponse { status: 404, body: "Not Found".to_owned() },
		})
	}
}

/// Everything on, but with minifiers that can't be found.
fn config() -> Config {
	Config {
		script_minifier: "html-standalone-test-no-terser".to_owned(),
		html_minifier: "html-standalone-test-no-html-minifier".to_owned(),
		..Default::default()
	}
}

fn site(files: &[(&str, &str)]) -> TempDir {
	let dir = tempfile::tempdir().unwrap();
	for (name, content) in files {
		let path = dir.path().join(name);
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).unwrap();
		}
		fs::write(path, content).unwrap();
	}
	dir
}

fn bundle(dir: &Path, fetcher: &dyn Fetch) -> (Result<html_standalone::BundleReport, BundleError>, String) {
	let output = dir.join("standalone.html");
	let result = bundle_file(dir.join("index.html"), &output, &config(), fetcher);
	let text = fs::read_to_string(&output).unwrap_or_default();
	(result, text)
}

#[test]
fn inline_script_only_is_unchanged() {
	let html = "<html><script>alert(1)</script></html>";
	let dir = site(&[("index.html", html)]);
	let (result, output) = bundle(dir.path(), &StubFetcher::default());
	let report = result.unwrap();
	assert_eq!(output, html);
	assert_eq!(report.output_size, html.len() as u64);
	assert!(report.ledger.is_empty());
	assert_eq!(report.ledger.ratio(), 0.0);
	assert_eq!(report.final_pass, None);
}

#[test]
fn local_script_is_inlined() {
	let dir = site(&[
		("index.html", "<html>\n<body>\n<script src=\"lib.js\"></script>\n</body>\n</html>\n"),
		("lib.js", "console.log(1);"),
	]);
	let (result, output) = bundle(dir.path(), &StubFetcher::default());
	result.unwrap();
	assert_eq!(
		output,
		"<html>\n<body>\n<script>\n// Read from: lib.js\nconsole.log(1);\n</script>\n</body>\n</html>\n"
	);
	assert!(!dir.path().join("lib.min.js").exists());
}

#[test]
fn stylesheet_without_urls_is_inlined_verbatim() {
	let css = "body { color: red; }\n";
	let dir = site(&[
		("index.html", "<head>\n  <link rel=\"stylesheet\" href=\"style.css\">\n</head>\n"),
		("style.css", css),
	]);
	let (result, output) = bundle(dir.path(), &StubFetcher::default());
	result.unwrap();
	assert_eq!(
		output,
		format!("<head>\n  <style>\n/* Content from style.css */\n {}\n</style>\n</head>\n", css)
	);
	assert!(!dir.path().join("style.min.css").exists());
}

#[test]
fn stylesheet_fonts_are_embedded() {
	let dir = site(&[
		("index.html", "<link href=\"css/site.css\" rel=\"stylesheet\">"),
		("css/site.css", "@font-face { src: url('../fonts/a.woff') }"),
		("fonts/a.woff", "woff"),
	]);
	let (result, output) = bundle(dir.path(), &StubFetcher::default());
	result.unwrap();
	assert_eq!(
		output,
		"<style>\n/* Content from css/site.css */\n @font-face { src: url('data:font/woff;base64,d29mZg==') }\n</style>"
	);
	assert!(dir.path().join("css/site.min.css").is_file());
}

#[test]
fn failed_fetch_truncates_output() {
	let dir = site(&[(
		"index.html",
		"<html>\n<script src=\"https://example.com/a.js\"></script>\n<p>after</p>\n</html>\n",
	)]);
	let (result, output) = bundle(dir.path(), &StubFetcher::default());
	match result {
		Err(BundleError::RemoteFetch { url, reason }) => {
			assert_eq!(url, "https://example.com/a.js");
			assert_eq!(reason, "HTTP 404");
		}
		other => panic!("expected a fetch failure, got {:?}", other),
	}
	assert_eq!(output, "<html>\n");
}

#[test]
fn failed_fetch_can_be_skipped() {
	let html = "<html>\n<script src=\"https://example.com/a.js\"></script>\n<p>after</p>\n</html>\n";
	let dir = site(&[("index.html", html)]);
	let output = dir.path().join("standalone.html");
	let config = Config {
		on_fetch_failure: FetchFailurePolicy::Skip,
		..config()
	};
	let report = bundle_file(dir.path().join("index.html"), &output, &config, &StubFetcher::default()).unwrap();
	assert_eq!(report.failed_fetches, vec!["https://example.com/a.js".to_owned()]);
	assert_eq!(fs::read_to_string(output).unwrap(), html);
}

#[test]
fn remote_script_is_fetched() {
	let dir = site(&[("index.html", "  <script src=\"https://cdn.example.com/lib.js\"></script>\r\n<p>x</p>")]);
	let fetcher = StubFetcher::with("https://cdn.example.com/lib.js", "window.lib = {};");
	let (result, output) = bundle(dir.path(), &fetcher);
	result.unwrap();
	assert_eq!(
		output,
		"<script>\n// Fetched from: https://cdn.example.com/lib.js\nwindow.lib = {};\n</script>\r\n<p>x</p>"
	);
}

#[test]
fn src_scripts_with_stray_text_are_not_touched_as_inline() {
	let html = "<script src=\"a.js\">stray()</script>\n<script>real()</script>\n";
	let dir = site(&[("index.html", html), ("a.js", "a()")]);
	let (result, output) = bundle(dir.path(), &StubFetcher::default());
	result.unwrap();
	assert_eq!(output, html);
}

#[test]
fn missing_local_script_fails_the_run() {
	let dir = site(&[("index.html", "<p>x</p>\n<script src=\"nope.js\"></script>\n<p>y</p>\n")]);
	let (result, output) = bundle(dir.path(), &StubFetcher::default());
	assert!(matches!(result, Err(BundleError::InvalidPath(_))));
	assert_eq!(output, "<p>x</p>\n");
}

#[test]
fn missing_entry_file() {
	let dir = tempfile::tempdir().unwrap();
	let result = bundle_file(
		dir.path().join("index.html"),
		dir.path().join("standalone.html"),
		&config(),
		&StubFetcher::default(),
	);
	assert!(matches!(result, Err(BundleError::InvalidPath(_))));
	assert!(!dir.path().join("standalone.html").exists());
}

#[test]
fn favicon_is_embedded() {
	let dir = site(&[
		(
			"index.html",
			"<head>\n<link rel=\"icon\" href=\"favicon.ico\">\n<link rel=\"icon\" type=\"image/png\" href=\"icon.png\">\n</head>\n",
		),
		("favicon.ico", "ico"),
	]);
	let (result, output) = bundle(dir.path(), &StubFetcher::default());
	result.unwrap();
	assert_eq!(
		output,
		"<head>\n<link rel=\"icon\" href=\"data:image/x-icon;base64,aWNv\">\n</head>\n"
	);
}

#[test]
fn runs_do_not_share_totals() {
	let dir = site(&[("index.html", "<p>x</p>")]);
	let (first, _) = bundle(dir.path(), &StubFetcher::default());
	let (second, _) = bundle(dir.path(), &StubFetcher::default());
	assert_eq!(first.unwrap().ledger, second.unwrap().ledger);
}
