/// Normalize CRLF and lone CR line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

/// Clean up artifacts left by template rendering:
///
/// - line endings become `\n`
/// - whitespace-only lines become empty
/// - runs of blank lines collapse to one, except inside fenced code
/// - leading and trailing blank lines are dropped
/// - non-empty output ends with exactly one newline
pub fn postprocess(content: &str) -> String {
	let content = normalize_line_endings(content);
	let mut lines: Vec<&str> = Vec::new();
	let mut fence: Option<&str> = None;

	for line in content.lines() {
		let trimmed = line.trim_start();

		if let Some(marker) = fence {
			if trimmed.starts_with(marker) {
				fence = None;
			}
			lines.push(line);
			continue;
		}

		if trimmed.starts_with("```") {
			fence = Some("```");
		} else if trimmed.starts_with("~~~") {
			fence = Some("~~~");
		}

		if line.trim().is_empty() {
			if lines.last().is_some_and(|last| !last.is_empty()) {
				lines.push("");
			}
			continue;
		}

		lines.push(line);
	}

	while lines.last().is_some_and(|last| last.trim().is_empty()) {
		lines.pop();
	}

	if lines.is_empty() {
		return String::new();
	}

	let mut result = lines.join("\n");
	result.push('\n');
	result
}
