//! Replacing local stylesheet `<link>` tags with inline `<style>` blocks.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::compress::minified_sibling;
use crate::error::BundleError;
use crate::fetch::is_remote;
use crate::fonts;
use crate::size::bytes_string;

lazy_static! {
	static ref LINK_RE: Regex = Regex::new(r"(?i)<link\b[^>]*>").unwrap();
	static ref REL_RE: Regex = Regex::new(r#"(?i)\srel\s*=\s*"stylesheet""#).unwrap();
	static ref HREF_RE: Regex = Regex::new(r#"(?i)\shref\s*=\s*"([^"]+)""#).unwrap();
}

/// Returns the href of a `<link rel="stylesheet">` tag, whatever order its attributes are in.
pub fn stylesheet_href(tag: &str) -> Option<&str> {
	if !REL_RE.is_match(tag) {
		return None;
	}
	HREF_RE.captures(tag).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

/// Wraps css in the `<style>` block that replaces its `<link>` tag.
pub fn style_block(href: &str, css: &str) -> String {
	format!("<style>\n/* Content from {} */\n {}\n</style>", href, css)
}

/// Inlines every local stylesheet linked from `html`.
///
/// ## Arguments
/// * `html` - The html string.
/// * `root_path` - The directory hrefs are resolved against, usually the one the html file is in.
/// * `inline_fonts` - Embed the fonts referenced by `url(...)` in each stylesheet before inlining it.
///
/// Remote stylesheets and stylesheets that can't be read keep their `<link>` tag.
/// Nothing outside the matched `<link ...>` tags is touched.
pub fn inline_css<P: AsRef<Path>>(html: &str, root_path: P, inline_fonts: bool) -> String {
	let root_path = root_path.as_ref();
	let mut loaded: HashMap<String, Option<String>> = HashMap::new();

	LINK_RE
		.replace_all(html, |caps: &Captures| {
			let tag = &caps[0];
			let href = match stylesheet_href(tag) {
				Some(href) if !is_remote(href) => href,
				_ => return tag.to_owned(),
			};
			let css = loaded
				.entry(href.to_owned())
				.or_insert_with(|| load_css(root_path, href, inline_fonts));
			match css {
				Some(css) => {
					let block = style_block(href, css);
					log::info!(
						"Replaced {} with inline style tag, {} -> {}",
						href,
						bytes_string(tag.len() as u64),
						bytes_string(block.len() as u64)
					);
					block
				}
				None => tag.to_owned(),
			}
		})
		.into_owned()
}

fn load_css(root_path: &Path, href: &str, inline_fonts: bool) -> Option<String> {
	let css_path = root_path.join(href);
	let css = match fs::read_to_string(&css_path) {
		Ok(css) => css,
		Err(e) => {
			log::warn!("CSS file not found: {} ({})", css_path.display(), e);
			return None;
		}
	};
	if !inline_fonts || !fonts::has_urls(&css) {
		return Some(css);
	}

	log::info!("Embedding fonts in CSS file: {}", href);
	let embedded_path = minified_sibling(&css_path);
	let embedded = fonts::embed_fonts_in_file(&css_path, &embedded_path)
		.and_then(|_| {
			fs::read_to_string(&embedded_path)
				.map_err(|e| BundleError::from_elem(e, &embedded_path.to_string_lossy()))
		});
	match embedded {
		Ok(css) => Some(css),
		Err(e) => {
			log::warn!("{}, embedding fonts in memory instead", e);
			let base_dir = css_path.parent().unwrap_or(root_path);
			Some(fonts::embed_fonts(&css, base_dir))
		}
	}
}
