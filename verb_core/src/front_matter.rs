use serde_json::Map;
use serde_json::Value;

use crate::VerbError;
use crate::VerbResult;

/// A source split into its front-matter values and template body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
	/// Parsed front-matter key/values.
	pub context: Map<String, Value>,
	/// Everything after the front matter.
	pub content: String,
}

/// Split `source` into a [`Page`].
///
/// Front matter is a YAML mapping between a leading `---` line and the next
/// `---` (or `...`) line. Sources without an opening delimiter, or whose
/// delimiter is never closed, are returned as content unchanged.
pub fn parse_page(source: &str) -> VerbResult<Page> {
	let source = source.strip_prefix('\u{feff}').unwrap_or(source);
	let mut lines = source.split_inclusive('\n');

	let Some(first) = lines.next() else {
		return Ok(Page::default());
	};

	if first.trim_end() != "---" {
		return Ok(Page {
			context: Map::new(),
			content: source.to_string(),
		});
	}

	let mut offset = first.len();
	let mut yaml_end = None;
	for line in lines {
		let trimmed = line.trim_end();
		if trimmed == "---" || trimmed == "..." {
			yaml_end = Some((offset, offset + line.len()));
			break;
		}
		offset += line.len();
	}

	let Some((yaml_end, body_start)) = yaml_end else {
		return Ok(Page {
			context: Map::new(),
			content: source.to_string(),
		});
	};

	let yaml = &source[first.len()..yaml_end];
	let context = parse_front_matter(yaml)?;

	Ok(Page {
		context,
		content: source[body_start..].to_string(),
	})
}

fn parse_front_matter(yaml: &str) -> VerbResult<Map<String, Value>> {
	if yaml.trim().is_empty() {
		return Ok(Map::new());
	}

	let value: Value =
		serde_yaml_ng::from_str(yaml).map_err(|e| VerbError::FrontMatter(e.to_string()))?;

	match value {
		Value::Null => Ok(Map::new()),
		Value::Object(map) => Ok(map),
		other => {
			Err(VerbError::FrontMatter(format!(
				"expected a mapping, found `{other}`"
			)))
		}
	}
}
