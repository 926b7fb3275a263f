//! Embedding the `.ico` favicon and dropping the other icon links.

use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use regex::{NoExpand, Regex};

lazy_static! {
	static ref ICO_RE: Regex = Regex::new(r#"(?i)href="([^"]+\.ico)""#).unwrap();
	static ref OTHER_ICON_RE: Regex =
		Regex::new(r#"(?i)\s*<link\s+rel="(?:icon"\s+type="image/png|apple-touch-icon)"#).unwrap();
}

/// Replaces the `.ico` favicon href with a base64 `data:` URI.
///
/// The first `.ico` href found is read relative to `root_path`; every `.ico`
/// href in the document then points at that icon's data. Returns `None` when
/// there is no `.ico` href or the file can't be read, in which case the
/// document should be used as it was.
pub fn embed_favicon<P: AsRef<Path>>(html: &str, root_path: P) -> Option<String> {
	let href = match ICO_RE.captures(html) {
		Some(caps) => caps[1].to_owned(),
		None => {
			log::debug!("No .ico favicon referenced");
			return None;
		}
	};
	let ico_path = root_path.as_ref().join(&href);
	let bytes = match fs::read(&ico_path) {
		Ok(bytes) => bytes,
		Err(e) => {
			log::warn!("Favicon file not found: {} ({})", ico_path.display(), e);
			return None;
		}
	};
	log::info!("Embedding favicon {}", href);
	let replacement = format!(r#"href="data:image/x-icon;base64,{}""#, base64::encode(&bytes));
	Some(ICO_RE.replace_all(html, NoExpand(&replacement)).into_owned())
}

/// Drops every line that declares a png or apple-touch icon link.
///
/// Only whole lines go; the rest keep their line endings.
pub fn remove_other_favicons(html: &str) -> String {
	html.split_inclusive('\n')
		.filter(|line| !OTHER_ICON_RE.is_match(line))
		.collect()
}
