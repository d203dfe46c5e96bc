use std::path::Path;

use crate::VerbError;
use crate::VerbResult;
use crate::context::Context;
use crate::context::ContextBuilder;
use crate::context::HelperNames;
use crate::expand::ExpandResult;
use crate::expand::expand_mapping;
use crate::expand::is_concat;
use crate::front_matter::Page;
use crate::front_matter::parse_page;
use crate::init;
use crate::options::Options;
use crate::paths;
use crate::postprocess::postprocess;
use crate::render::Renderer;
use crate::tags::Tag;
use crate::tags::TagRegistry;
use crate::tags::TagScope;
use crate::tags::resolve_tags;
use crate::toc::insert_toc;

/// The result of running one source through the pipeline.
#[derive(Debug, Clone)]
pub struct Processed {
	/// Final rendered content.
	pub content: String,
	/// The context the content was rendered with.
	pub context: Context,
	/// The source as given.
	pub original: String,
	/// The options the pipeline ran with.
	pub options: Options,
}

/// The documentation pipeline: renderer plus registered tags.
///
/// A `Verb` holds no per-build state, so one value can process any number of
/// sources, concurrently or not.
#[derive(Debug, Clone)]
pub struct Verb {
	renderer: Renderer,
	tags: TagRegistry,
}

impl Default for Verb {
	fn default() -> Self {
		Self::new()
	}
}

impl Verb {
	/// A pipeline with the built-in tags and the mixins installed by
	/// [`init`](crate::init()).
	pub fn new() -> Self {
		let mixins = init::state()
			.map(|state| state.mixins.clone())
			.unwrap_or_default();

		Self {
			renderer: Renderer::new(mixins),
			tags: TagRegistry::with_builtins(),
		}
	}

	/// Replace the tag registry.
	#[must_use]
	pub fn with_tags(mut self, tags: TagRegistry) -> Self {
		self.tags = tags;
		self
	}

	/// Replace the renderer.
	#[must_use]
	pub fn with_renderer(mut self, renderer: Renderer) -> Self {
		self.renderer = renderer;
		self
	}

	/// Register an additional tag.
	pub fn register_tag(&mut self, tag: impl Tag + 'static) {
		self.tags.register(tag);
	}

	pub fn tags(&self) -> &TagRegistry {
		&self.tags
	}

	pub fn renderer(&self) -> &Renderer {
		&self.renderer
	}

	fn helper_names(&self) -> HelperNames {
		HelperNames {
			tags: self.tags.names(),
			filters: self.renderer.filter_names(),
		}
	}

	/// Run `src` through the pipeline: context, render, tags, cleanup, and
	/// table of contents.
	pub async fn process(&self, src: &str, options: &Options) -> VerbResult<Processed> {
		let verbose = options.verbose || init::state().is_some_and(|state| state.verbose);

		let page = parse_page(src)?;
		let context = self.build_context(options, &page).await?;
		if verbose {
			tracing::info!(keys = context.len(), "built context");
		}

		let rendered = self
			.renderer
			.render(&page.content, &context, &options.settings)?;

		let scope = TagScope {
			cwd: options.cwd(),
			context: context.clone(),
		};
		let timeout = options.tag_timeout();
		let resolved = tokio::time::timeout(timeout, resolve_tags(&rendered, &self.tags, &scope))
			.await
			.map_err(|_| VerbError::TagTimeout(timeout))??;
		if verbose {
			tracing::info!("resolved tags");
		}

		let cleaned = postprocess(&resolved);
		let content = insert_toc(&cleaned, &options.toc)?;

		Ok(Processed {
			content,
			context,
			original: src.to_string(),
			options: options.clone(),
		})
	}

	/// Assemble the context on the blocking pool. Config and data files are
	/// read with `std::fs` and data scripts run to completion, so none of it
	/// may stall the async runtime. Scripts are not bounded by a timeout.
	async fn build_context(&self, options: &Options, page: &Page) -> VerbResult<Context> {
		let options = options.clone();
		let page = page.clone();
		let helpers = self.helper_names();

		tokio::task::spawn_blocking(move || ContextBuilder::new(&options, &page, &helpers).build())
			.await
			.map_err(|e| VerbError::ContextTask(e.to_string()))?
	}

	/// Read `src` (relative to `cwd`) and return its rendered content.
	pub async fn read(&self, src: impl AsRef<Path>, options: &Options) -> VerbResult<String> {
		let path = options.resolve(src);
		let source = match tokio::fs::read_to_string(&path).await {
			Ok(source) => source,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(VerbError::FileNotFound {
					path: paths::relative([&path]),
				});
			}
			Err(e) => return Err(e.into()),
		};

		tracing::debug!(src = %paths::relative_to(&path, &options.cwd()), "processing");
		Ok(self.process(&source, options).await?.content)
	}

	/// Render `src` and write the result to `dest`, creating parent
	/// directories as needed. Both paths are relative to `cwd`.
	pub async fn copy(
		&self,
		src: impl AsRef<Path>,
		dest: impl AsRef<Path>,
		options: &Options,
	) -> VerbResult<()> {
		let content = self.read(&src, options).await?;
		let dest = options.resolve(dest);
		write_file(&dest, &content).await?;

		let cwd = options.cwd();
		tracing::info!(
			src = %paths::relative_to(&options.resolve(src), &cwd),
			dest = %paths::relative_to(&dest, &cwd),
			"wrote"
		);

		Ok(())
	}

	/// Expand `patterns` into source/destination mappings and render each
	/// one. Missing sources are skipped with a warning. In concat mode every
	/// output is joined with `options.sep` and written once to `dest`.
	///
	/// The first failing source aborts the batch; files already written are
	/// left in place.
	pub async fn expand(
		&self,
		patterns: &[String],
		dest: impl AsRef<Path>,
		options: &Options,
	) -> VerbResult<ExpandResult> {
		let dest = dest.as_ref();
		let cwd = options.cwd();
		let concat = is_concat(dest, options);
		let mappings = expand_mapping(patterns, dest, options)?;

		let mut result = ExpandResult {
			concatenated: concat,
			..ExpandResult::default()
		};
		let mut deferred = Vec::new();

		for mapping in &mappings {
			for src in &mapping.src {
				if !src.is_file() {
					tracing::warn!(src = %paths::relative_to(src, &cwd), "source file not found, skipping");
					result.missing.push(src.clone());
					continue;
				}

				if concat {
					deferred.push(src.clone());
				} else {
					self.copy(src, &mapping.dest, options).await?;
					result.written.push(options.resolve(&mapping.dest));
				}
			}
		}

		if concat {
			if deferred.is_empty() {
				tracing::warn!(dest = %paths::relative_to(dest, &cwd), "no sources to concatenate");
				return Ok(result);
			}

			let mut outputs = Vec::with_capacity(deferred.len());
			for src in &deferred {
				outputs.push(self.read(src, options).await?);
			}

			let dest = options.resolve(dest);
			write_file(&dest, &outputs.join(&options.sep)).await?;
			tracing::info!(
				sources = deferred.len(),
				dest = %paths::relative_to(&dest, &cwd),
				"wrote concatenated output"
			);
			result.written.push(dest);
		}

		Ok(result)
	}
}

async fn write_file(path: &Path, content: &str) -> VerbResult<()> {
	if let Some(parent) = path.parent() {
		tokio::fs::create_dir_all(parent).await?;
	}
	tokio::fs::write(path, content).await?;

	Ok(())
}
