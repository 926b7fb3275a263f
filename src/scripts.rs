//! Pulls the bodies of inline `<script>` elements out of a document.
//!
//! This drives html5ever's tokenizer directly, without building a tree. When
//! a script start tag is seen the tokenizer is switched to script-data mode,
//! the same thing the tree builder would do, so the body arrives as raw text.
//! The tokenizer still rewrites a few characters on the way in (line endings,
//! NUL), so each body is looked up again in the source and handed back as it
//! appears there.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
	BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
	Idle,
	/// Inside a script without `src`
	Collecting,
	/// Inside a script with `src`, whose body is thrown away
	Ignoring,
}

struct ScriptSink {
	state: State,
	buffer: String,
	scripts: Vec<String>,
}

impl ScriptSink {
	fn new() -> ScriptSink {
		ScriptSink {
			state: State::Idle,
			buffer: String::new(),
			scripts: Vec::new(),
		}
	}

	fn tag(&mut self, tag: Tag) -> TokenSinkResult<()> {
		if tag.name != local_name!("script") {
			return TokenSinkResult::Continue;
		}
		match tag.kind {
			TagKind::StartTag => {
				let has_src = tag.attrs.iter().any(|attr| attr.name.local == local_name!("src"));
				self.buffer.clear();
				self.state = if has_src { State::Ignoring } else { State::Collecting };
				TokenSinkResult::RawData(RawKind::ScriptData)
			}
			TagKind::EndTag => {
				if self.state == State::Collecting {
					self.scripts.push(std::mem::take(&mut self.buffer));
				}
				self.buffer.clear();
				self.state = State::Idle;
				TokenSinkResult::Continue
			}
		}
	}
}

impl TokenSink for ScriptSink {
	type Handle = ();

	fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
		match token {
			Token::TagToken(tag) => return self.tag(tag),
			Token::CharacterTokens(text) if self.state == State::Collecting => {
				self.buffer.push_str(&text)
			}
			// Only reachable if the tokenizer ever leaves script-data mode mid-script
			Token::CommentToken(text) if self.state == State::Collecting => {
				self.buffer.push_str("<!--");
				self.buffer.push_str(&text);
				self.buffer.push_str("-->");
			}
			_ => {}
		}
		TokenSinkResult::Continue
	}
}

/// Returns the text of every `<script>` element without a `src` attribute, in document order.
///
/// Scripts with a `src` attribute are skipped entirely, including any stray
/// text between their tags. A script left open at the end of the document is
/// not returned.
///
/// Script bodies are raw text in html, so comments and character references
/// inside them are returned as written. So are `\r\n` and lone `\r` line
/// endings and NUL characters, which the tokenizer turns into `\n` and
/// U+FFFD; each body is cut back out of `html` itself.
pub fn extract_inline_scripts(html: &str) -> Vec<String> {
	let mut input = BufferQueue::new();
	input.push_back(StrTendril::from_slice(html));

	let mut tokenizer = Tokenizer::new(ScriptSink::new(), TokenizerOpts::default());
	let _ = tokenizer.feed(&mut input);
	tokenizer.end();
	let scripts = tokenizer.sink.scripts;
	if !html.contains(&['\r', '\0'][..]) {
		return scripts;
	}
	source_text(html, scripts)
}

/// The document the way the tokenizer hands it out, with the source offset of every byte.
struct Preprocessed {
	text: String,
	/// `origin[i]` is where byte `i` of `text` starts in the source, plus one
	/// entry for the end of the source.
	origin: Vec<usize>,
}

impl Preprocessed {
	fn new(source: &str) -> Preprocessed {
		let mut text = String::with_capacity(source.len());
		let mut origin = Vec::with_capacity(source.len() + 1);
		let mut chars = source.char_indices().peekable();
		while let Some((at, c)) = chars.next() {
			let c = match c {
				'\r' => {
					if let Some(&(_, '\n')) = chars.peek() {
						chars.next();
					}
					'\n'
				}
				'\0' => '\u{FFFD}',
				c => c,
			};
			origin.extend(std::iter::repeat(at).take(c.len_utf8()));
			text.push(c);
		}
		origin.push(source.len());
		Preprocessed { text, origin }
	}
}

/// Swaps each tokenized body for the stretch of `html` it came from.
///
/// Bodies are looked up in document order, each one after the previous.
fn source_text(html: &str, bodies: Vec<String>) -> Vec<String> {
	let pre = Preprocessed::new(html);
	let mut cursor = 0;
	bodies
		.into_iter()
		.map(|body| match pre.text[cursor..].find(body.as_str()) {
			Some(found) => {
				let start = cursor + found;
				let end = start + body.len();
				cursor = end;
				html[pre.origin[start]..pre.origin[end]].to_owned()
			}
			None => {
				log::warn!("Could not find an inline script in the source, using the tokenized text");
				body
			}
		})
		.collect()
}
