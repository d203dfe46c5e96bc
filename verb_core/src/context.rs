use std::collections::BTreeMap;

use derive_more::Deref;
use derive_more::DerefMut;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::VerbResult;
use crate::config::RuntimeConfig;
use crate::config::load_project_config;
use crate::data::git_info;
use crate::data::load_data_globs;
use crate::data::load_data_sources;
use crate::front_matter::Page;
use crate::options::Options;
use crate::toc::TOC_MARKER;

/// Reserved key holding the [`Runner`] identity.
pub const RUNNER_KEY: &str = "runner";

/// Transient key holding the project config while it is merged.
pub const CONFIG_KEY: &str = "config";

/// Keys always removed by [`MergeStep::Exclusion`]. These are option names
/// that leak into the context through runtime config or metadata and have no
/// meaning inside templates.
pub const DEFAULT_OMIT: [&str; 14] = [
	CONFIG_KEY,
	"verbose",
	"verbrc",
	"settings",
	"concat",
	"sep",
	"cwd",
	"ext",
	"destBase",
	"srcBase",
	"flatten",
	"glob",
	"omit",
	"tagTimeoutMs",
];

/// Identity of the tool rendering the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Runner {
	pub name: &'static str,
	pub url: &'static str,
}

/// The runner identity injected into every context.
pub const RUNNER: Runner = Runner {
	name: "verb",
	url: "https://github.com/verbose/verb",
};

impl Runner {
	fn to_value(self) -> Value {
		let mut map = Map::new();
		map.insert("name".into(), Value::String(self.name.to_string()));
		map.insert("url".into(), Value::String(self.url.to_string()));
		Value::Object(map)
	}
}

/// The flat key/value mapping templates are rendered against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deref, DerefMut)]
#[serde(transparent)]
pub struct Context(Map<String, Value>);

impl Context {
	pub fn new() -> Self {
		Self::default()
	}

	/// Merge `layer` over the current values. Top-level keys in `layer`
	/// replace existing ones.
	pub fn merge(&mut self, layer: Map<String, Value>) {
		for (key, value) in layer {
			self.0.insert(key, value);
		}
	}

	pub fn into_inner(self) -> Map<String, Value> {
		self.0
	}
}

impl From<Map<String, Value>> for Context {
	fn from(value: Map<String, Value>) -> Self {
		Self(value)
	}
}

/// One stage of context assembly. Stages run in [`MERGE_ORDER`] and later
/// stages win on key collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[non_exhaustive]
pub enum MergeStep {
	/// Values from the `.verbrc` runtime config.
	RuntimeConfig,
	/// The project manifest (or inline `config` option).
	ProjectConfig,
	/// Unrecognized option fields, then `metadata`.
	Options,
	/// Runtime config `[data]` namespaces and the `git` namespace.
	DataSources,
	/// Values templates need in scope (`toc`, `helpers`).
	Helpers,
	/// Files matched by the `data` option.
	DataOption,
	/// The page's front matter.
	FrontMatter,
	/// Removal of [`DEFAULT_OMIT`] and `omit` keys.
	Exclusion,
	/// The [`RUNNER`] identity.
	Runner,
}

/// Context assembly order.
pub const MERGE_ORDER: [MergeStep; 9] = [
	MergeStep::RuntimeConfig,
	MergeStep::ProjectConfig,
	MergeStep::Options,
	MergeStep::DataSources,
	MergeStep::Helpers,
	MergeStep::DataOption,
	MergeStep::FrontMatter,
	MergeStep::Exclusion,
	MergeStep::Runner,
];

/// Names of the tags and filters available to templates, exposed under the
/// `helpers` key.
#[derive(Debug, Clone, Default)]
pub struct HelperNames {
	pub tags: Vec<String>,
	pub filters: Vec<String>,
}

impl HelperNames {
	fn to_layer(&self) -> Map<String, Value> {
		let list = |names: &[String]| {
			Value::Array(names.iter().cloned().map(Value::String).collect())
		};

		let mut helpers = Map::new();
		helpers.insert("tags".into(), list(&self.tags));
		helpers.insert("filters".into(), list(&self.filters));

		let mut layer = Map::new();
		layer.insert("toc".into(), Value::String(TOC_MARKER.to_string()));
		layer.insert("helpers".into(), Value::Object(helpers));
		layer
	}
}

/// Builds a [`Context`] for one page by running every [`MergeStep`].
pub struct ContextBuilder<'a> {
	options: &'a Options,
	page: &'a Page,
	helpers: &'a HelperNames,
	runtime: RuntimeConfig,
	context: Context,
	trace: BTreeMap<String, MergeStep>,
}

impl<'a> ContextBuilder<'a> {
	pub fn new(options: &'a Options, page: &'a Page, helpers: &'a HelperNames) -> Self {
		Self {
			options,
			page,
			helpers,
			runtime: RuntimeConfig::default(),
			context: Context::new(),
			trace: BTreeMap::new(),
		}
	}

	/// Run every step and return the context.
	pub fn build(self) -> VerbResult<Context> {
		self.build_with_trace().map(|(context, _)| context)
	}

	/// Run every step and return the context together with the step that
	/// supplied each surviving key.
	pub fn build_with_trace(mut self) -> VerbResult<(Context, BTreeMap<String, MergeStep>)> {
		for step in MERGE_ORDER {
			self.apply(step)?;
		}

		Ok((self.context, self.trace))
	}

	fn apply(&mut self, step: MergeStep) -> VerbResult<()> {
		let root = self.options.cwd();

		match step {
			MergeStep::RuntimeConfig => {
				self.runtime = RuntimeConfig::load(self.options)?;
				let layer = self.runtime.context.clone();
				self.layer(step, layer);
			}
			MergeStep::ProjectConfig => {
				// The project config becomes the basis of the context and the
				// `config` key itself never survives.
				let project = load_project_config(self.options)?;
				self.layer(step, project);
				self.context.remove(CONFIG_KEY);
				self.trace.remove(CONFIG_KEY);
			}
			MergeStep::Options => {
				self.layer(step, self.options.extra.clone());
				self.layer(step, self.options.metadata.clone());
			}
			MergeStep::DataSources => {
				let mut layer = Map::new();
				if let Some(git) = git_info(&root) {
					layer.insert("git".into(), git);
				}
				layer.extend(load_data_sources(&self.runtime.data, &root)?);
				self.layer(step, layer);
			}
			MergeStep::Helpers => {
				self.layer(step, self.helpers.to_layer());
			}
			MergeStep::DataOption => {
				let layer = load_data_globs(&self.options.data, &root, &self.options.glob)?;
				self.layer(step, layer);
			}
			MergeStep::FrontMatter => {
				self.layer(step, self.page.context.clone());
			}
			MergeStep::Exclusion => {
				let omitted = DEFAULT_OMIT
					.iter()
					.map(|key| (*key).to_string())
					.chain(self.options.omit.iter().cloned());

				for key in omitted {
					self.context.remove(&key);
					self.trace.remove(&key);
				}
			}
			MergeStep::Runner => {
				let mut layer = Map::new();
				layer.insert(RUNNER_KEY.into(), RUNNER.to_value());
				self.layer(step, layer);
			}
		}

		Ok(())
	}

	fn layer(&mut self, step: MergeStep, layer: Map<String, Value>) {
		if layer.is_empty() {
			return;
		}

		tracing::debug!(?step, keys = layer.len(), "merging context layer");
		for key in layer.keys() {
			self.trace.insert(key.clone(), step);
		}
		self.context.merge(layer);
	}
}
