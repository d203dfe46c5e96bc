//! Synchronous entry points for callers without an async runtime.
//!
//! Each function builds a current-thread tokio runtime, runs the matching
//! [`Verb`] method with a pipeline from [`Verb::new`], and waits for it.
//! These functions panic if called from inside a tokio runtime; async callers
//! should use [`Verb`] directly.

use std::future::Future;
use std::path::Path;

use crate::ExpandResult;
use crate::Options;
use crate::Processed;
use crate::Verb;
use crate::VerbResult;

fn block_on<F: Future>(future: F) -> VerbResult<F::Output> {
	let runtime = tokio::runtime::Builder::new_current_thread()
		.enable_all()
		.build()?;

	Ok(runtime.block_on(future))
}

/// Run `src` through the pipeline.
pub fn process(src: &str, options: &Options) -> VerbResult<Processed> {
	block_on(Verb::new().process(src, options))?
}

/// Read and render `src`.
pub fn read(src: impl AsRef<Path>, options: &Options) -> VerbResult<String> {
	block_on(Verb::new().read(src, options))?
}

/// Render `src` into `dest`.
pub fn copy(src: impl AsRef<Path>, dest: impl AsRef<Path>, options: &Options) -> VerbResult<()> {
	block_on(Verb::new().copy(src, dest, options))?
}

/// Expand `patterns` and render every match.
pub fn expand(
	patterns: &[String],
	dest: impl AsRef<Path>,
	options: &Options,
) -> VerbResult<ExpandResult> {
	block_on(Verb::new().expand(patterns, dest, options))?
}
