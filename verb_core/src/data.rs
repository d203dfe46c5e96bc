use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use git2::Repository;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;

use crate::VerbError;
use crate::VerbResult;
use crate::options::GlobOptions;

/// Data source entry for a `[data]` namespace in the runtime config.
///
/// Plain string entries name a file whose format comes from its extension:
///
/// ```toml
/// [data]
/// pkg = "package.json"
/// ```
///
/// Typed entries provide an explicit format:
///
/// ```toml
/// [data]
/// release = { path = "release-info", format = "json" }
/// ```
///
/// Script entries run a shell command and parse its stdout:
///
/// ```toml
/// [data]
/// version = { command = "git describe --tags", format = "text" }
/// ```
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
#[non_exhaustive]
pub enum DataSource {
	Path(PathBuf),
	Typed(TypedDataSource),
	Script(ScriptDataSource),
}

#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct TypedDataSource {
	pub path: PathBuf,
	pub format: String,
}

#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct ScriptDataSource {
	pub command: String,
	#[serde(default)]
	pub format: Option<String>,
}

/// Load every namespace in `sources`, resolving paths against `root`.
/// Namespaces are loaded in sorted order so failures are reported
/// deterministically.
pub fn load_data_sources(
	sources: &BTreeMap<String, DataSource>,
	root: &Path,
) -> VerbResult<Map<String, Value>> {
	let mut data = Map::new();

	for (namespace, source) in sources {
		let value = match source {
			DataSource::Path(rel_path) => {
				let format = format_from_extension(rel_path);
				load_data_file(root, rel_path, &format)?
			}
			DataSource::Typed(typed) => {
				let format = typed.format.trim().to_ascii_lowercase();
				load_data_file(root, &typed.path, &format)?
			}
			DataSource::Script(script) => {
				let format = script
					.format
					.as_deref()
					.map(str::trim)
					.filter(|value| !value.is_empty())
					.map_or_else(|| "text".to_string(), str::to_ascii_lowercase);
				let stdout = execute_script(root, namespace, &script.command)?;
				parse_data(&stdout, &format, namespace)?
			}
		};

		tracing::debug!(namespace, "loaded data source");
		data.insert(namespace.clone(), value);
	}

	Ok(data)
}

/// Load the files matched by `patterns` (relative to `root`), each stored
/// under its file stem. Later files win when two share a stem.
pub fn load_data_globs(
	patterns: &[String],
	root: &Path,
	glob: &GlobOptions,
) -> VerbResult<Map<String, Value>> {
	let mut data = Map::new();
	if patterns.is_empty() {
		return Ok(data);
	}

	for path in crate::expand::glob_files(root, patterns, glob)? {
		let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
			continue;
		};
		let format = format_from_extension(&path);
		let value = load_data_file(root, &path, &format)?;
		data.insert(stem.to_string(), value);
	}

	Ok(data)
}

/// Read `path` (relative to `root` unless absolute) and parse it as
/// `format`.
pub fn load_data_file(root: &Path, path: &Path, format: &str) -> VerbResult<Value> {
	let abs_path = crate::paths::resolve(root, path);
	let content = std::fs::read_to_string(&abs_path).map_err(|e| {
		VerbError::DataFile {
			path: path.display().to_string(),
			reason: e.to_string(),
		}
	})?;

	parse_data(&content, format, &path.display().to_string())
}

/// The lowercase extension of `path`, or an empty string.
pub fn format_from_extension(path: &Path) -> String {
	path.extension()
		.and_then(|e| e.to_str())
		.unwrap_or("")
		.to_ascii_lowercase()
}

fn execute_script(root: &Path, namespace: &str, command: &str) -> VerbResult<String> {
	let output = if cfg!(windows) {
		Command::new("cmd")
			.arg("/C")
			.arg(command)
			.current_dir(root)
			.output()?
	} else {
		Command::new("sh")
			.arg("-c")
			.arg(command)
			.current_dir(root)
			.output()?
	};

	if !output.status.success() {
		let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
		let reason = if stderr.is_empty() {
			format!(
				"command exited with status {}",
				output
					.status
					.code()
					.map_or_else(|| "unknown".to_string(), |code| code.to_string())
			)
		} else {
			stderr
		};

		return Err(VerbError::DataScript {
			namespace: namespace.to_string(),
			reason,
		});
	}

	Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Parse `content` into a JSON value according to `format`.
pub fn parse_data(content: &str, format: &str, path_display: &str) -> VerbResult<Value> {
	let data_error = |reason: String| {
		VerbError::DataFile {
			path: path_display.to_string(),
			reason,
		}
	};

	match format {
		"text" | "string" | "raw" | "txt" => Ok(Value::String(content.to_string())),
		"json" => serde_json::from_str(content).map_err(|e| data_error(e.to_string())),
		"toml" => {
			let toml_value: toml::Value =
				toml::from_str(content).map_err(|e| data_error(e.to_string()))?;
			toml_to_json(toml_value, path_display)
		}
		"yaml" | "yml" => serde_yaml_ng::from_str(content).map_err(|e| data_error(e.to_string())),
		"kdl" => {
			let doc: kdl::KdlDocument = content
				.parse()
				.map_err(|e: kdl::KdlError| data_error(e.to_string()))?;
			kdl_document_to_value(&doc, path_display)
		}
		"ini" => serde_ini::from_str(content).map_err(|e| data_error(e.to_string())),
		other => Err(VerbError::UnsupportedDataFormat(other.to_string())),
	}
}

fn float_to_json(f: f64, path_display: &str) -> VerbResult<Value> {
	serde_json::Number::from_f64(f)
		.map(Value::Number)
		.ok_or_else(|| {
			VerbError::UnconvertibleFloat {
				path: path_display.to_string(),
				value: f.to_string(),
			}
		})
}

pub(crate) fn toml_to_json(value: toml::Value, path_display: &str) -> VerbResult<Value> {
	let json = match value {
		toml::Value::String(s) => Value::String(s),
		toml::Value::Integer(i) => Value::from(i),
		toml::Value::Float(f) => float_to_json(f, path_display)?,
		toml::Value::Boolean(b) => Value::Bool(b),
		toml::Value::Datetime(dt) => Value::String(dt.to_string()),
		toml::Value::Array(arr) => {
			let items: VerbResult<Vec<Value>> = arr
				.into_iter()
				.map(|v| toml_to_json(v, path_display))
				.collect();
			Value::Array(items?)
		}
		toml::Value::Table(table) => {
			let mut map = Map::new();
			for (k, v) in table {
				map.insert(k, toml_to_json(v, path_display)?);
			}
			Value::Object(map)
		}
	};

	Ok(json)
}

fn kdl_document_to_value(doc: &kdl::KdlDocument, path_display: &str) -> VerbResult<Value> {
	let mut map = Map::new();

	for node in doc.nodes() {
		let name = node.name().to_string();
		let value = kdl_node_to_value(node, path_display)?;
		map.insert(name, value);
	}

	Ok(Value::Object(map))
}

fn kdl_node_to_value(node: &kdl::KdlNode, path_display: &str) -> VerbResult<Value> {
	if let Some(children) = node.children() {
		return kdl_document_to_value(children, path_display);
	}

	let entries: Vec<&kdl::KdlEntry> = node.entries().iter().collect();

	match entries.as_slice() {
		[] => Ok(Value::Null),
		[single] if single.name().is_none() => kdl_value_to_json(single.value(), path_display),
		_ if entries.iter().all(|e| e.name().is_some()) => {
			let mut map = Map::new();
			for entry in &entries {
				if let Some(name) = entry.name() {
					map.insert(
						name.to_string(),
						kdl_value_to_json(entry.value(), path_display)?,
					);
				}
			}
			Ok(Value::Object(map))
		}
		_ => {
			let values: VerbResult<Vec<Value>> = entries
				.iter()
				.map(|e| kdl_value_to_json(e.value(), path_display))
				.collect();
			Ok(Value::Array(values?))
		}
	}
}

fn kdl_value_to_json(value: &kdl::KdlValue, path_display: &str) -> VerbResult<Value> {
	match value {
		kdl::KdlValue::String(s) => Ok(Value::String(s.clone())),
		kdl::KdlValue::Integer(i) => {
			match i64::try_from(*i) {
				Ok(small) => Ok(Value::from(small)),
				Err(_) => float_to_json(*i as f64, path_display),
			}
		}
		kdl::KdlValue::Float(f) => float_to_json(*f, path_display),
		kdl::KdlValue::Bool(b) => Ok(Value::Bool(*b)),
		kdl::KdlValue::Null => Ok(Value::Null),
	}
}

/// Read the branch and `origin` remote of the git repository containing
/// `root`. Worktrees and submodules resolve to their own repository. A
/// detached `HEAD` reports its `commit` instead of a branch. Returns `None`
/// outside a repository.
pub fn git_info(root: &Path) -> Option<Value> {
	let repo = Repository::discover(root).ok()?;
	let mut info = Map::new();

	match repo.head() {
		Ok(head) if head.is_branch() => {
			if let Some(branch) = head.shorthand() {
				info.insert("branch".into(), Value::String(branch.to_string()));
			}
		}
		Ok(head) => {
			if let Some(oid) = head.target() {
				info.insert("commit".into(), Value::String(oid.to_string()));
			}
		}
		// Unborn branch: `HEAD` names a branch without commits.
		Err(_) => {
			let branch = repo.find_reference("HEAD").ok().and_then(|head| {
				head.symbolic_target()
					.and_then(|target| target.strip_prefix("refs/heads/"))
					.map(ToString::to_string)
			});
			if let Some(branch) = branch {
				info.insert("branch".into(), Value::String(branch));
			}
		}
	}

	let remote = repo
		.find_remote("origin")
		.ok()
		.and_then(|remote| remote.url().map(ToString::to_string));
	if let Some(url) = remote {
		info.insert("remote".into(), Value::String(url));
	}

	tracing::debug!(path = %repo.path().display(), "read git metadata");
	Some(Value::Object(info))
}
