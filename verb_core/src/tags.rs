//! Asynchronous tags resolved after template rendering.
//!
//! A tag is an HTML comment of the form `<!-- {>name:arg:arg} -->`. The
//! comment survives minijinja untouched, and [`resolve_tags`] replaces it
//! with the output of the [`Tag`] registered under `name`. Arguments are
//! quoted strings, numbers, or `true`/`false`.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::ops::Range;
use std::path::Path;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use logos::Logos;
use markdown::ParseOptions;
use markdown::mdast::Html;
use markdown::mdast::Node;
use markdown::to_mdast;
use snailquote::unescape;

use crate::VerbError;
use crate::VerbResult;
use crate::context::Context;
use crate::front_matter::parse_page;

/// Raw tokens for the inside of an HTML node.
#[derive(Logos, Debug, PartialEq)]
enum RawToken {
	#[token("<!--")]
	CommentOpen,
	#[token("-->")]
	CommentClose,
	#[token("{>")]
	TagOpen,
	#[token("}")]
	TagClose,
	#[token(":")]
	ArgumentDelimiter,
	#[regex(r"[ \t\r\n]+")]
	Whitespace,
	#[token("true")]
	True,
	#[token("false")]
	False,
	#[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
	Ident,
	#[regex(r#""([^"\\]|\\.)*""#)]
	DoubleQuotedString,
	#[regex(r"'([^'\\]|\\.)*'")]
	SingleQuotedString,
	#[regex(r"-?[0-9]+(\.[0-9]+)?")]
	Number,
}

/// A tag argument.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Argument {
	String(String),
	Number(f64),
	Boolean(bool),
}

impl fmt::Display for Argument {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::String(s) => write!(f, "{s}"),
			Self::Number(n) => write!(f, "{n}"),
			Self::Boolean(b) => write!(f, "{b}"),
		}
	}
}

/// A tag found in rendered content.
#[derive(Debug, Clone, PartialEq)]
pub struct TagCall {
	pub name: String,
	pub args: Vec<Argument>,
	/// Byte range of the whole comment in the content.
	pub range: Range<usize>,
}

/// What a tag can see while resolving.
#[derive(Debug, Clone)]
pub struct TagScope {
	/// Base directory for relative paths.
	pub cwd: PathBuf,
	/// The context the page was rendered with.
	pub context: Context,
}

pub type TagFuture<'a> = Pin<Box<dyn Future<Output = VerbResult<String>> + Send + 'a>>;

/// A custom tag resolved after rendering.
pub trait Tag: Send + Sync {
	/// Name used inside `{>name}`.
	fn name(&self) -> &str;

	/// Produce the replacement for one occurrence of the tag.
	fn resolve<'a>(&'a self, args: &'a [Argument], scope: &'a TagScope) -> TagFuture<'a>;
}

/// Tags available to the resolver, keyed by name.
#[derive(Clone, Default)]
pub struct TagRegistry {
	tags: BTreeMap<String, Arc<dyn Tag>>,
}

impl fmt::Debug for TagRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.tags.keys()).finish()
	}
}

impl TagRegistry {
	/// An empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// A registry holding the `include` and `docs` tags.
	pub fn with_builtins() -> Self {
		let mut registry = Self::new();
		registry.register(IncludeTag);
		registry.register(DocsTag);
		registry
	}

	/// Register `tag`, replacing any tag with the same name.
	pub fn register(&mut self, tag: impl Tag + 'static) {
		self.tags.insert(tag.name().to_string(), Arc::new(tag));
	}

	pub fn get(&self, name: &str) -> Option<&Arc<dyn Tag>> {
		self.tags.get(name)
	}

	pub fn names(&self) -> Vec<String> {
		self.tags.keys().cloned().collect()
	}

	pub fn is_empty(&self) -> bool {
		self.tags.is_empty()
	}
}

/// Resolve every registered tag in `content`. Unknown tag names are left
/// in place. The first failing tag aborts resolution with its error.
pub async fn resolve_tags(
	content: &str,
	registry: &TagRegistry,
	scope: &TagScope,
) -> VerbResult<String> {
	if registry.is_empty() || !content.contains("{>") {
		return Ok(content.to_string());
	}

	let mut replacements = Vec::new();
	for call in find_tags(content)? {
		let Some(tag) = registry.get(&call.name) else {
			tracing::debug!(name = %call.name, "leaving unknown tag in place");
			continue;
		};

		tracing::debug!(name = %call.name, args = call.args.len(), "resolving tag");
		let output = tag.resolve(&call.args, scope).await?;
		replacements.push((call.range, output));
	}

	// Replace from the end so earlier ranges stay valid.
	replacements.sort_by(|a, b| b.0.start.cmp(&a.0.start));
	let mut result = content.to_string();
	for (range, output) in replacements {
		result.replace_range(range, &output);
	}

	Ok(result)
}

/// Find every tag in the HTML nodes of `content`. Comments inside code
/// blocks and inline code are not HTML nodes and are never matched.
pub fn find_tags(content: &str) -> VerbResult<Vec<TagCall>> {
	let mdast =
		to_mdast(content, &ParseOptions::gfm()).map_err(|e| VerbError::Markdown(e.to_string()))?;
	let mut html_nodes = Vec::new();
	collect_html(&mdast, &mut html_nodes);

	let mut calls = Vec::new();
	for node in html_nodes {
		let node_start = node.position.as_ref().map_or(0, |pos| pos.start.offset);

		for (name, args, span) in parse_node(&node.value) {
			let text = &node.value[span];
			// Container prefixes (`> ` in blockquotes) can make the node value
			// differ from the source, so locate the tag text itself.
			let search_from = calls
				.last()
				.map_or(node_start, |call: &TagCall| call.range.end.max(node_start));
			let Some(found) = content.get(search_from..).and_then(|rest| rest.find(text)) else {
				continue;
			};
			let start = search_from + found;

			calls.push(TagCall {
				name,
				args,
				range: start..start + text.len(),
			});
		}
	}

	Ok(calls)
}

pub(crate) fn collect_html(node: &Node, nodes: &mut Vec<Html>) {
	match node {
		Node::Html(html) => nodes.push(html.clone()),
		_ => {
			if let Some(children) = node.children() {
				for child in children {
					collect_html(child, nodes);
				}
			}
		}
	}
}

type Spanned = (Result<RawToken, ()>, Range<usize>);

/// Parse every `<!-- {>name:args} -->` comment in an HTML node value.
fn parse_node(source: &str) -> Vec<(String, Vec<Argument>, Range<usize>)> {
	let tokens: Vec<Spanned> = RawToken::lexer(source).spanned().collect();
	let mut found = Vec::new();
	let mut cursor = 0;

	while cursor < tokens.len() {
		if tokens[cursor].0 == Ok(RawToken::CommentOpen) {
			if let Some((name, args, end)) = parse_comment(source, &tokens, cursor) {
				let span = tokens[cursor].1.start..tokens[end].1.end;
				found.push((name, args, span));
				cursor = end + 1;
				continue;
			}
		}
		cursor += 1;
	}

	found
}

/// Parse a tag comment starting at the `<!--` token at `start`. Returns the
/// name, arguments, and the index of the closing `-->` token.
fn parse_comment(
	source: &str,
	tokens: &[Spanned],
	start: usize,
) -> Option<(String, Vec<Argument>, usize)> {
	let mut cursor = start + 1;
	let skip_whitespace = |cursor: &mut usize| {
		while tokens.get(*cursor).is_some_and(|t| t.0 == Ok(RawToken::Whitespace)) {
			*cursor += 1;
		}
	};

	skip_whitespace(&mut cursor);
	if tokens.get(cursor)?.0 != Ok(RawToken::TagOpen) {
		return None;
	}
	cursor += 1;

	let (token, span) = tokens.get(cursor)?;
	if *token != Ok(RawToken::Ident) {
		return None;
	}
	let name = source[span.clone()].to_string();
	cursor += 1;

	let mut args = Vec::new();
	loop {
		skip_whitespace(&mut cursor);
		let (token, _) = tokens.get(cursor)?;
		match token {
			Ok(RawToken::ArgumentDelimiter) => {
				cursor += 1;
				skip_whitespace(&mut cursor);
				let (token, span) = tokens.get(cursor)?;
				args.push(parse_argument(token.as_ref().ok()?, &source[span.clone()])?);
				cursor += 1;
			}
			Ok(RawToken::TagClose) => {
				cursor += 1;
				break;
			}
			_ => return None,
		}
	}

	skip_whitespace(&mut cursor);
	if tokens.get(cursor)?.0 != Ok(RawToken::CommentClose) {
		return None;
	}

	Some((name, args, cursor))
}

fn parse_argument(token: &RawToken, slice: &str) -> Option<Argument> {
	match token {
		RawToken::DoubleQuotedString | RawToken::SingleQuotedString => {
			unescape(slice).ok().map(Argument::String)
		}
		RawToken::Number => slice.parse().ok().map(Argument::Number),
		RawToken::True => Some(Argument::Boolean(true)),
		RawToken::False => Some(Argument::Boolean(false)),
		_ => None,
	}
}

/// Require exactly one argument and return it as a string.
fn single_argument<'a>(name: &str, args: &'a [Argument]) -> VerbResult<&'a str> {
	match args {
		[Argument::String(value)] => Ok(value),
		_ => {
			Err(VerbError::InvalidTagArgs {
				name: name.to_string(),
				expected: "1 string".to_string(),
				got: args.len(),
			})
		}
	}
}

/// Read a file for inclusion, dropping its front matter and trailing
/// newlines.
async fn read_included(name: &str, path: &Path) -> VerbResult<String> {
	let source = tokio::fs::read_to_string(path).await.map_err(|e| {
		VerbError::TagResolve {
			name: name.to_string(),
			reason: format!("{}: {e}", path.display()),
		}
	})?;
	let page = parse_page(&source)?;

	Ok(page.content.trim_end_matches('\n').to_string())
}

/// `{>include:"path/to/file.md"}` inserts a file relative to the working
/// directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeTag;

impl Tag for IncludeTag {
	fn name(&self) -> &str {
		"include"
	}

	fn resolve<'a>(&'a self, args: &'a [Argument], scope: &'a TagScope) -> TagFuture<'a> {
		Box::pin(async move {
			let file = single_argument(self.name(), args)?;
			read_included(self.name(), &scope.cwd.join(file)).await
		})
	}
}

/// `{>docs:"usage"}` inserts `docs/usage.md`. The `.md` extension is added
/// when the name has none.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocsTag;

impl Tag for DocsTag {
	fn name(&self) -> &str {
		"docs"
	}

	fn resolve<'a>(&'a self, args: &'a [Argument], scope: &'a TagScope) -> TagFuture<'a> {
		Box::pin(async move {
			let doc = single_argument(self.name(), args)?;
			let mut path = scope.cwd.join("docs").join(doc);
			if path.extension().is_none() {
				path.set_extension("md");
			}
			read_included(self.name(), &path).await
		})
	}
}
