use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Default heading depth included in a generated table of contents.
pub const DEFAULT_TOC_MAX_DEPTH: u8 = 2;

/// Default time allowed for the asynchronous tag pass.
pub const DEFAULT_TAG_TIMEOUT_MS: u64 = 30_000;

/// Options threaded through every stage of the pipeline.
///
/// Every field has a default, so callers usually write
/// `Options { cwd: Some(dir), ..Options::default() }`. Fields that verb does
/// not recognize are kept in [`Options::extra`] and merged into the template
/// context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
	/// Log every pipeline step.
	pub verbose: bool,
	/// Table of contents generation.
	pub toc: TocOptions,
	/// Explicit runtime config file. When absent `.verbrc*` is discovered in
	/// the working directory.
	pub verbrc: Option<PathBuf>,
	/// Values merged into the context after the project config, so they win
	/// over package data.
	pub metadata: Map<String, Value>,
	/// Renderer settings.
	pub settings: RenderSettings,
	/// Project config: an inline object or a manifest path. When absent
	/// `package.json` or `Cargo.toml` is discovered in the working directory.
	pub config: Option<ConfigSource>,
	/// Join every rendered source into a single destination. `None` falls
	/// back to checking whether the destination has a file extension.
	pub concat: Option<bool>,
	/// Separator placed between concatenated outputs.
	pub sep: String,
	/// Base directory for sources, data files, and relative destinations.
	pub cwd: Option<PathBuf>,
	/// Replacement extension for expanded destinations (`md` or `.md`).
	pub ext: Option<String>,
	/// Directory expanded destinations are placed under. Defaults to the
	/// `dest` argument.
	pub dest_base: Option<PathBuf>,
	/// Directory glob patterns are matched from. Defaults to `cwd`.
	pub src_base: Option<PathBuf>,
	/// Drop directory structure from expanded destinations.
	pub flatten: bool,
	/// Options for the glob walker.
	pub glob: GlobOptions,
	/// Glob patterns of data files loaded into the context, each under its
	/// file stem.
	pub data: Vec<String>,
	/// Extra context keys removed before rendering.
	pub omit: Vec<String>,
	/// Milliseconds allowed for the asynchronous tag pass.
	pub tag_timeout_ms: u64,
	/// Unrecognized fields.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			verbose: false,
			toc: TocOptions::default(),
			verbrc: None,
			metadata: Map::new(),
			settings: RenderSettings::default(),
			config: None,
			concat: None,
			sep: "\n".to_string(),
			cwd: None,
			ext: None,
			dest_base: None,
			src_base: None,
			flatten: false,
			glob: GlobOptions::default(),
			data: Vec::new(),
			omit: Vec::new(),
			tag_timeout_ms: DEFAULT_TAG_TIMEOUT_MS,
			extra: Map::new(),
		}
	}
}

impl Options {
	/// The base directory: `cwd` when set, otherwise the process working
	/// directory.
	pub fn cwd(&self) -> PathBuf {
		self.cwd.clone().unwrap_or_else(|| {
			std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
		})
	}

	/// Resolve `path` against [`Options::cwd`].
	pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
		crate::paths::resolve(&self.cwd(), path.as_ref())
	}

	pub fn tag_timeout(&self) -> Duration {
		Duration::from_millis(self.tag_timeout_ms)
	}
}

/// Controls the generated table of contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TocOptions {
	/// Deepest heading level listed.
	pub max_depth: u8,
	/// List the first level-one heading. It is usually the document title, so
	/// it is skipped by default.
	pub first_h1: bool,
	/// Bullet used for every entry.
	pub bullet: String,
}

impl Default for TocOptions {
	fn default() -> Self {
		Self {
			max_depth: DEFAULT_TOC_MAX_DEPTH,
			first_h1: false,
			bullet: "-".to_string(),
		}
	}
}

/// How the renderer treats variables missing from the context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum UndefinedMode {
	/// Missing values render as empty strings.
	#[default]
	Lenient,
	/// Missing values are an error.
	Strict,
	/// Attribute access on missing values is allowed and renders empty.
	Chainable,
}

impl From<UndefinedMode> for minijinja::UndefinedBehavior {
	fn from(value: UndefinedMode) -> Self {
		match value {
			UndefinedMode::Lenient => Self::Lenient,
			UndefinedMode::Strict => Self::Strict,
			UndefinedMode::Chainable => Self::Chainable,
		}
	}
}

/// Settings passed to the template renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct RenderSettings {
	pub undefined: UndefinedMode,
	pub trim_blocks: bool,
	pub lstrip_blocks: bool,
	pub keep_trailing_newline: bool,
}

impl Default for RenderSettings {
	fn default() -> Self {
		Self {
			undefined: UndefinedMode::default(),
			trim_blocks: false,
			lstrip_blocks: false,
			keep_trailing_newline: true,
		}
	}
}

/// Options for the glob walker used by batch expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlobOptions {
	/// Match files and directories whose names start with `.`.
	pub dot: bool,
	/// Skip files ignored by `.gitignore`.
	pub gitignore: bool,
	/// Match case-insensitively.
	pub case_insensitive: bool,
}

impl Default for GlobOptions {
	fn default() -> Self {
		Self {
			dot: false,
			gitignore: true,
			case_insensitive: false,
		}
	}
}

/// Where the project config comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum ConfigSource {
	/// Values supplied directly by the caller.
	Inline(Map<String, Value>),
	/// A manifest file (`package.json`, `Cargo.toml`, or any supported data
	/// format), relative to `cwd`.
	Path(PathBuf),
}
