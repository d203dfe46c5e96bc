use std::collections::HashMap;
use std::ops::Range;

use markdown::ParseOptions;
use markdown::mdast::Node;
use markdown::to_mdast;

use crate::VerbError;
use crate::VerbResult;
use crate::options::TocOptions;
use crate::tags::collect_html;

/// Marker replaced by the generated table of contents.
pub const TOC_MARKER: &str = "<!-- toc -->";

/// A heading listed in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
	pub depth: u8,
	pub text: String,
	/// Anchor without the leading `#`.
	pub slug: String,
}

/// Collect the headings of `content` that belong in the table of contents.
/// Headings inside code blocks and HTML are not headings in the markdown
/// AST, so they are never listed.
pub fn toc_entries(content: &str, options: &TocOptions) -> VerbResult<Vec<TocEntry>> {
	let mdast =
		to_mdast(content, &ParseOptions::gfm()).map_err(|e| VerbError::Markdown(e.to_string()))?;

	let mut headings = Vec::new();
	collect_headings(&mdast, &mut headings);

	let mut seen: HashMap<String, usize> = HashMap::new();
	let mut skipped_title = options.first_h1;
	let mut entries = Vec::new();

	for (depth, text) in headings {
		// Slugs are assigned to every heading so anchors match the rendered
		// document even when a heading is not listed.
		let slug = unique_slug(&slugify(&text), &mut seen);

		if depth == 1 && !skipped_title {
			skipped_title = true;
			continue;
		}

		if depth > options.max_depth {
			continue;
		}

		entries.push(TocEntry { depth, text, slug });
	}

	Ok(entries)
}

/// Render the table of contents for `content` as a markdown list.
pub fn generate_toc(content: &str, options: &TocOptions) -> VerbResult<String> {
	let entries = toc_entries(content, options)?;
	let Some(min_depth) = entries.iter().map(|entry| entry.depth).min() else {
		return Ok(String::new());
	};

	let lines: Vec<String> = entries
		.iter()
		.map(|entry| {
			let indent = "  ".repeat(usize::from(entry.depth - min_depth));
			format!("{indent}{} [{}](#{})", options.bullet, entry.text, entry.slug)
		})
		.collect();

	Ok(lines.join("\n"))
}

/// Replace the first [`TOC_MARKER`] with the generated table of contents.
/// Any further markers are removed so exactly one table is produced.
/// Only markers that are HTML in the markdown AST count; a marker shown in
/// inline code or a fenced block is left alone. Content without a marker is
/// returned unchanged.
pub fn insert_toc(content: &str, options: &TocOptions) -> VerbResult<String> {
	if !content.contains(TOC_MARKER) {
		return Ok(content.to_string());
	}

	let markers = find_markers(content)?;
	if markers.is_empty() {
		return Ok(content.to_string());
	}

	let toc = generate_toc(content, options)?;
	tracing::debug!(
		lines = toc.lines().count(),
		markers = markers.len(),
		"inserting table of contents"
	);

	let mut result = content.to_string();
	for (index, range) in markers.into_iter().enumerate().rev() {
		let replacement = if index == 0 { toc.as_str() } else { "" };
		result.replace_range(range, replacement);
	}

	Ok(result)
}

/// Byte ranges of every [`TOC_MARKER`] inside an HTML node of `content`.
fn find_markers(content: &str) -> VerbResult<Vec<Range<usize>>> {
	let mdast =
		to_mdast(content, &ParseOptions::gfm()).map_err(|e| VerbError::Markdown(e.to_string()))?;
	let mut html_nodes = Vec::new();
	collect_html(&mdast, &mut html_nodes);

	let mut markers = Vec::new();
	for node in html_nodes {
		let Some(position) = node.position else {
			continue;
		};
		let Some(source) = content.get(position.start.offset..position.end.offset) else {
			continue;
		};

		for (offset, _) in source.match_indices(TOC_MARKER) {
			let start = position.start.offset + offset;
			markers.push(start..start + TOC_MARKER.len());
		}
	}

	markers.sort_by_key(|range| range.start);
	markers.dedup();
	Ok(markers)
}

fn collect_headings(node: &Node, headings: &mut Vec<(u8, String)>) {
	if let Node::Heading(heading) = node {
		let mut text = String::new();
		for child in &heading.children {
			collect_text(child, &mut text);
		}
		headings.push((heading.depth, text.trim().to_string()));
		return;
	}

	if let Some(children) = node.children() {
		for child in children {
			collect_headings(child, headings);
		}
	}
}

fn collect_text(node: &Node, text: &mut String) {
	match node {
		Node::Text(t) => text.push_str(&t.value),
		Node::InlineCode(code) => text.push_str(&code.value),
		_ => {
			if let Some(children) = node.children() {
				for child in children {
					collect_text(child, text);
				}
			}
		}
	}
}

/// GitHub-style anchor: lowercase, spaces become `-`, and punctuation other
/// than `-` and `_` is dropped.
pub fn slugify(text: &str) -> String {
	text.trim()
		.to_lowercase()
		.chars()
		.filter_map(|c| {
			if c.is_alphanumeric() || c == '-' || c == '_' {
				Some(c)
			} else if c == ' ' {
				Some('-')
			} else {
				None
			}
		})
		.collect()
}

fn unique_slug(slug: &str, seen: &mut HashMap<String, usize>) -> String {
	let count = seen.entry(slug.to_string()).or_insert(0);
	let unique = if *count == 0 {
		slug.to_string()
	} else {
		format!("{slug}-{count}")
	};
	*count += 1;
	unique
}
