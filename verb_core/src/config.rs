use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;

use crate::VerbError;
use crate::VerbResult;
use crate::data::DataSource;
use crate::data::format_from_extension;
use crate::data::parse_data;
use crate::options::ConfigSource;
use crate::options::Options;

/// Runtime config file locations in discovery order (highest precedence
/// first).
pub const VERBRC_CANDIDATES: [&str; 5] = [
	".verbrc.toml",
	".verbrc.json",
	".verbrc.yaml",
	".verbrc.yml",
	".verbrc",
];

/// Project manifests searched for when no `config` option is given.
pub const MANIFEST_CANDIDATES: [&str; 2] = ["package.json", "Cargo.toml"];

/// Runtime configuration loaded from a `.verbrc` file.
///
/// ```toml
/// author = "Jon Doe"
///
/// [data]
/// pkg = "package.json"
/// changelog = { path = "CHANGES", format = "text" }
/// version = { command = "git describe --tags" }
/// ```
///
/// Every key except `data` is merged into the template context as-is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeConfig {
	/// Namespaced data sources loaded into the context.
	#[serde(default)]
	pub data: BTreeMap<String, DataSource>,
	/// Values merged into the context.
	#[serde(flatten)]
	pub context: Map<String, Value>,
}

impl RuntimeConfig {
	/// Resolve the runtime config path from the discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		VERBRC_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the runtime config named by `options.verbrc`, or the first one
	/// discovered in the working directory. An explicit path that cannot be
	/// read is an error; a missing discovered file yields an empty config.
	pub fn load(options: &Options) -> VerbResult<Self> {
		let root = options.cwd();
		let path = match &options.verbrc {
			Some(path) => crate::paths::resolve(&root, path),
			None => {
				let Some(path) = Self::resolve_path(&root) else {
					return Ok(Self::default());
				};
				path
			}
		};

		Self::load_from(&path)
	}

	/// Load the runtime config at `path`. Files without an extension are
	/// read as YAML, which also accepts JSON.
	pub fn load_from(path: &Path) -> VerbResult<Self> {
		let path_display = path.display().to_string();
		let config_error = |reason: String| {
			VerbError::ConfigParse {
				path: path_display.clone(),
				reason,
			}
		};

		let content = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
		let format = match format_from_extension(path).as_str() {
			"" => "yaml".to_string(),
			other => other.to_string(),
		};
		let value =
			parse_data(&content, &format, &path_display).map_err(|e| config_error(e.to_string()))?;

		let value = match value {
			Value::Null => return Ok(Self::default()),
			Value::Object(_) => value,
			_ => return Err(config_error("expected a table of values".to_string())),
		};

		let config: Self = serde_json::from_value(value).map_err(|e| config_error(e.to_string()))?;
		tracing::debug!(path = %path_display, "loaded runtime config");

		Ok(config)
	}
}

/// Load the project config: the inline `config` option, the manifest it
/// names, or the first manifest discovered in the working directory.
pub fn load_project_config(options: &Options) -> VerbResult<Map<String, Value>> {
	let root = options.cwd();

	match &options.config {
		Some(ConfigSource::Inline(map)) => Ok(map.clone()),
		Some(ConfigSource::Path(path)) => load_manifest(&crate::paths::resolve(&root, path)),
		None => {
			let discovered = MANIFEST_CANDIDATES
				.iter()
				.map(|candidate| root.join(candidate))
				.find(|path| path.is_file());

			match discovered {
				Some(path) => load_manifest(&path),
				None => Ok(Map::new()),
			}
		}
	}
}

/// Load a manifest file into a flat map. For `Cargo.toml` the `[package]`
/// table is used.
pub fn load_manifest(path: &Path) -> VerbResult<Map<String, Value>> {
	let path_display = path.display().to_string();
	let content = std::fs::read_to_string(path).map_err(|e| {
		VerbError::ConfigParse {
			path: path_display.clone(),
			reason: e.to_string(),
		}
	})?;
	let value = parse_data(&content, &format_from_extension(path), &path_display)?;

	let is_cargo = path.file_name().and_then(|n| n.to_str()) == Some("Cargo.toml");
	let value = match value {
		Value::Object(mut map) if is_cargo => {
			match map.remove("package") {
				Some(package @ Value::Object(_)) => package,
				_ => Value::Object(map),
			}
		}
		other => other,
	};

	match value {
		Value::Object(map) => {
			tracing::debug!(path = %path_display, keys = map.len(), "loaded project config");
			Ok(map)
		}
		_ => {
			Err(VerbError::ConfigParse {
				path: path_display,
				reason: "expected a table of values".to_string(),
			})
		}
	}
}
