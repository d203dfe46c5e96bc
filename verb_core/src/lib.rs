//! `verb_core` is the core library for [verb](https://github.com/verbose/verb), a documentation generator that turns markdown templates into finished documents such as READMEs. Project metadata, runtime config, data files, and front matter are merged into one context; the template is rendered against it with [`minijinja`](https://docs.rs/minijinja), asynchronous tags are resolved, and the result is cleaned up and given a table of contents.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Source text
//!   -> Front matter (split YAML header from body)
//!   -> Context (runtime config, project config, options, data, helpers, front matter, exclusions, runner)
//!   -> Renderer (minijinja with verb filters and mixins)
//!   -> Tags (<!-- {>include:"file.md"} --> resolved asynchronously)
//!   -> Post-processing (line endings, blank line collapsing)
//!   -> Table of contents (<!-- toc --> replaced with a heading list)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: `.verbrc` runtime config and project manifest discovery.
//! - [`context`]: context assembly in a fixed merge order.
//! - [`data`]: data files in text, JSON, TOML, YAML, KDL, and INI, plus script output and git metadata.
//! - [`expand`]: glob expansion into source/destination mappings.
//! - [`tags`]: the tag syntax, the [`Tag`] trait, and the `include` and `docs` tags.
//! - [`toc`]: heading extraction, slugs, and table of contents insertion.
//! - [`blocking`]: synchronous wrappers for callers without an async runtime.
//!
//! ## Key Types
//!
//! - [`Verb`]: the pipeline. Holds a [`Renderer`] and a [`TagRegistry`].
//! - [`Options`]: everything a single run can be configured with.
//! - [`Context`]: the flat mapping templates are rendered against.
//! - [`Processed`]: rendered content together with the context used.
//! - [`ExpandResult`]: what a batch expansion wrote and skipped.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use verb_core::Options;
//! use verb_core::blocking;
//!
//! let options = Options::default();
//! let readme = blocking::read(".verb.md", &options).unwrap();
//! println!("{readme}");
//!
//! blocking::expand(&["docs/*.md".to_string()], "dist", &options).unwrap();
//! ```

pub use config::RuntimeConfig;
pub use context::Context;
pub use context::ContextBuilder;
pub use context::MERGE_ORDER;
pub use context::MergeStep;
pub use data::DataSource;
pub use engine::*;
pub use error::*;
pub use expand::ExpandResult;
pub use expand::FileMapping;
pub use front_matter::Page;
pub use init::InitOptions;
pub use init::InitState;
pub use init::init;
pub use options::*;
pub use render::Mixin;
pub use render::Renderer;
pub use tags::Argument;
pub use tags::Tag;
pub use tags::TagFuture;
pub use tags::TagRegistry;
pub use tags::TagScope;

pub mod blocking;
pub mod config;
pub mod context;
pub mod data;
mod engine;
#[allow(unused_assignments)]
mod error;
pub mod expand;
pub mod front_matter;
pub mod init;
mod options;
pub mod paths;
pub mod postprocess;
pub mod render;
pub mod tags;
pub mod toc;
