use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum VerbError {
	#[error(transparent)]
	#[diagnostic(code(verb::io_error))]
	Io(#[from] std::io::Error),

	#[error("source file not found: `{path}`")]
	#[diagnostic(
		code(verb::file_not_found),
		help("check the path is correct relative to the working directory")
	)]
	FileNotFound { path: String },

	#[error("failure to load markdown: {0}")]
	#[diagnostic(code(verb::markdown))]
	Markdown(String),

	#[error("failed to parse config file `{path}`: {reason}")]
	#[diagnostic(
		code(verb::config_parse),
		help("runtime config files may be written in TOML, JSON, or YAML")
	)]
	ConfigParse { path: String, reason: String },

	#[error("failed to parse front matter: {0}")]
	#[diagnostic(
		code(verb::front_matter),
		help("front matter must be a YAML mapping between two `---` lines")
	)]
	FrontMatter(String),

	#[error("failed to load data file `{path}`: {reason}")]
	#[diagnostic(code(verb::data_file))]
	DataFile { path: String, reason: String },

	#[error("failed to execute data script for `{namespace}`: {reason}")]
	#[diagnostic(code(verb::data_script))]
	DataScript { namespace: String, reason: String },

	#[error("unsupported data file format: `{0}`")]
	#[diagnostic(
		code(verb::unsupported_format),
		help("supported formats: text, json, toml, yaml, yml, kdl, ini")
	)]
	UnsupportedDataFormat(String),

	#[error("unconvertible float value in data file `{path}`: {value}")]
	#[diagnostic(
		code(verb::unconvertible_float),
		help("NaN and Infinity are not valid JSON numbers")
	)]
	UnconvertibleFloat { path: String, value: String },

	#[error("template rendering failed: {0}")]
	#[diagnostic(code(verb::template_render))]
	TemplateRender(String),

	#[error("tag `{name}` failed: {reason}")]
	#[diagnostic(code(verb::tag_resolve))]
	TagResolve { name: String, reason: String },

	#[error("tag `{name}` expects {expected} argument(s), got {got}")]
	#[diagnostic(code(verb::invalid_tag_args))]
	InvalidTagArgs {
		name: String,
		expected: String,
		got: usize,
	},

	#[error("tag resolution did not finish within {0:?}")]
	#[diagnostic(
		code(verb::tag_timeout),
		help("raise `tag_timeout` or check that custom tags complete")
	)]
	TagTimeout(Duration),

	#[error("context assembly did not complete: {0}")]
	#[diagnostic(code(verb::context_task))]
	ContextTask(String),

	#[error("invalid glob pattern `{pattern}`: {reason}")]
	#[diagnostic(code(verb::invalid_glob))]
	InvalidGlob { pattern: String, reason: String },

	#[error("failed to walk `{path}`: {reason}")]
	#[diagnostic(code(verb::walk))]
	Walk { path: String, reason: String },
}

pub type VerbResult<T> = Result<T, VerbError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
