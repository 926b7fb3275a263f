//! Embedding the fonts a stylesheet references as base64 `data:` URIs.

use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};

use crate::error::BundleError;

lazy_static! {
	static ref URL_RE: Regex = Regex::new(r"url\(([^)]+)\)").unwrap();
}

/// MIME type for a font file extension; unknown extensions get `application/octet-stream`.
pub fn font_mime(ext: &str) -> &'static str {
	match ext.to_ascii_lowercase().as_str() {
		"woff2" => "font/woff2",
		"woff" => "font/woff",
		"ttf" => "font/ttf",
		"otf" => "font/otf",
		"eot" => "application/vnd.ms-fontobject",
		"svg" => "image/svg+xml",
		_ => "application/octet-stream",
	}
}

/// True if the css has at least one `url(...)` token.
pub fn has_urls(css: &str) -> bool {
	URL_RE.is_match(css)
}

/// Replaces every `url(...)` in `css` that points at a local file with a
/// base64 `data:` URI of that file's bytes.
///
/// ## Arguments
/// * `css` - The stylesheet text.
/// * `base_dir` - The directory relative urls are resolved against, usually the one the css file is in.
///
/// Urls that are already `data:` URIs, remote urls and urls whose file can't
/// be found are left exactly as they were.
pub fn embed_fonts<P: AsRef<Path>>(css: &str, base_dir: P) -> String {
	let base_dir = base_dir.as_ref();
	URL_RE
		.replace_all(css, |caps: &Captures| {
			embed_url(&caps[1], base_dir).unwrap_or_else(|| caps[0].to_owned())
		})
		.into_owned()
}

fn embed_url(raw: &str, base_dir: &Path) -> Option<String> {
	let url = raw.trim().trim_matches(&['\'', '"'][..]);
	if url.starts_with("data:") {
		return None;
	}
	if url.contains("://") {
		log::debug!("Leaving remote font {} alone", url);
		return None;
	}
	let url = url.split('?').next().unwrap_or(url);
	let decoded = percent_decode_str(url).decode_utf8_lossy();
	let font_path = base_dir.join(decoded.as_ref());
	let font_path = font_path.canonicalize().unwrap_or(font_path);
	if !font_path.is_file() {
		log::warn!("Font file not found: {}", font_path.display());
		return None;
	}

	let ext = font_path
		.extension()
		.map(|ext| ext.to_string_lossy().into_owned())
		.unwrap_or_default();
	let mime = font_mime(&ext);
	let bytes = match fs::read(&font_path) {
		Ok(bytes) => bytes,
		Err(e) => {
			log::warn!("Could not read font {}: {}", font_path.display(), e);
			return None;
		}
	};
	log::info!(
		"Embedding font: {} ({})",
		font_path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
		mime
	);
	Some(format!("url('data:{};base64,{}')", mime, base64::encode(&bytes)))
}

/// Embeds the fonts of the css file at `css_path` and writes the result to `output_path`.
///
/// Urls are resolved against the directory `css_path` is in.
pub fn embed_fonts_in_file<P: AsRef<Path>, Q: AsRef<Path>>(
	css_path: P,
	output_path: Q,
) -> Result<(), BundleError> {
	let css_path = css_path.as_ref();
	let output_path = output_path.as_ref();
	let css = fs::read_to_string(css_path)
		.map_err(|e| BundleError::from_elem(e, &css_path.to_string_lossy()))?;
	let base_dir = css_path.parent().unwrap_or_else(|| Path::new("."));
	let embedded = embed_fonts(&css, base_dir);
	fs::write(output_path, embedded)
		.map_err(|e| BundleError::OutputError(output_path.to_owned(), e))?;
	log::info!("Embedded fonts written to: {}", output_path.display());
	Ok(())
}
