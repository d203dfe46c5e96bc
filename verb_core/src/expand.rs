use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::hash_map::Entry;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobBuilder;
use globset::GlobMatcher;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::WalkBuilder;

use crate::VerbError;
use crate::VerbResult;
use crate::options::GlobOptions;
use crate::options::Options;

/// Sources rendered into one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMapping {
	/// Source files in discovery order. Literal patterns are kept even when
	/// the file does not exist so the caller can report them.
	pub src: Vec<PathBuf>,
	/// Destination, relative to `cwd` unless absolute.
	pub dest: PathBuf,
}

/// Outcome of a batch expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandResult {
	/// Absolute paths of every file written, in write order.
	pub written: Vec<PathBuf>,
	/// Sources that did not exist and were skipped.
	pub missing: Vec<PathBuf>,
	/// Whether the outputs were joined into a single destination.
	pub concatenated: bool,
}

/// Whether `dest` receives every source joined together. An explicit
/// `concat` option always wins; otherwise a destination with a file
/// extension is treated as a single file.
pub fn is_concat(dest: &Path, options: &Options) -> bool {
	options.concat.unwrap_or_else(|| dest.extension().is_some())
}

/// Check whether a pattern contains glob syntax.
pub fn has_glob_syntax(pattern: &str) -> bool {
	pattern.contains(['*', '?', '[', '{'])
}

/// Expand `patterns` into mappings, in discovery order.
///
/// Sources are resolved against `src_base` (default `cwd`). Outside concat
/// mode each source maps to `dest_base` (default `dest`) joined with its
/// path relative to the source base, or only its file name when `flatten`
/// is set or the source lies outside the base, with the extension replaced
/// by `ext` when given. Sources that
/// map to the same destination share one mapping.
pub fn expand_mapping(
	patterns: &[String],
	dest: &Path,
	options: &Options,
) -> VerbResult<Vec<FileMapping>> {
	let cwd = options.cwd();
	let src_base = options
		.src_base
		.as_ref()
		.map_or_else(|| cwd.clone(), |base| crate::paths::resolve(&cwd, base));
	let dest_base = options
		.dest_base
		.clone()
		.unwrap_or_else(|| dest.to_path_buf());
	let concat = is_concat(dest, options);

	let mut mappings: Vec<FileMapping> = Vec::new();
	let mut by_dest: HashMap<PathBuf, usize> = HashMap::new();

	for src in glob_sources(&src_base, patterns, &options.glob)? {
		let target = if concat {
			dest.to_path_buf()
		} else {
			// Sources outside the base keep only their file name so the
			// target can never be the source itself.
			let rel = match src.strip_prefix(&src_base) {
				Ok(rel) if !options.flatten => rel,
				_ => {
					let Some(name) = src.file_name() else {
						continue;
					};
					Path::new(name)
				}
			};
			let mut target = dest_base.join(rel);
			if let Some(ext) = &options.ext {
				target.set_extension(ext.trim_start_matches('.'));
			}
			target
		};

		match by_dest.get(&target) {
			Some(&index) => mappings[index].src.push(src),
			None => {
				by_dest.insert(target.clone(), mappings.len());
				mappings.push(FileMapping {
					src: vec![src],
					dest: target,
				});
			}
		}
	}

	tracing::debug!(mappings = mappings.len(), concat, "expanded sources");
	Ok(mappings)
}

/// Existing files under `base` matched by `patterns`, in discovery order.
pub fn glob_files(
	base: &Path,
	patterns: &[String],
	glob: &GlobOptions,
) -> VerbResult<Vec<PathBuf>> {
	let mut files = glob_sources(base, patterns, glob)?;
	files.retain(|path| path.is_file());
	Ok(files)
}

/// Resolve `patterns` against `base`.
///
/// Patterns are processed in order. A literal pattern yields its path even if
/// it does not exist. A glob pattern yields every matching file, sorted by
/// path. Patterns starting with `!` exclude matches of any other pattern.
/// Each path is yielded at most once.
pub fn glob_sources(
	base: &Path,
	patterns: &[String],
	glob: &GlobOptions,
) -> VerbResult<Vec<PathBuf>> {
	let (negated, positive): (Vec<&String>, Vec<&String>) =
		patterns.iter().partition(|pattern| pattern.starts_with('!'));

	let mut exclude_builder = GlobSetBuilder::new();
	for pattern in negated {
		exclude_builder.add(build_glob(pattern[1..].trim_start_matches("./"), glob)?);
	}
	let exclude = exclude_builder.build().map_err(|e| {
		VerbError::InvalidGlob {
			pattern: "exclude patterns".to_string(),
			reason: e.to_string(),
		}
	})?;

	let mut walked: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
	let mut seen = HashSet::new();
	let mut sources = Vec::new();

	for pattern in positive {
		if !has_glob_syntax(pattern) {
			let path = crate::paths::resolve(base, Path::new(pattern));
			if !is_excluded(&exclude, base, &path) && seen.insert(path.clone()) {
				sources.push(path);
			}
			continue;
		}

		let (root, rest) = split_glob_root(base, pattern);
		if !root.is_dir() {
			tracing::debug!(pattern = %pattern, root = %root.display(), "glob root does not exist");
			continue;
		}

		let matcher: GlobMatcher = build_glob(&rest, glob)?.compile_matcher();
		let files = match walked.entry(root.clone()) {
			Entry::Occupied(entry) => entry.into_mut(),
			Entry::Vacant(entry) => entry.insert(walk_files(&root, glob)?),
		};

		for path in &*files {
			let Ok(rel) = path.strip_prefix(&root) else {
				continue;
			};
			if matcher.is_match(rel)
				&& !is_excluded(&exclude, base, path)
				&& seen.insert(path.clone())
			{
				sources.push(path.clone());
			}
		}
	}

	Ok(sources)
}

/// Split a glob into the directory named by its leading literal segments,
/// resolved against `base`, and the remaining pattern matched below it.
/// `./docs/*.md` walks `base/docs` for `*.md`, and `../shared/*.md` walks
/// the sibling `shared` directory.
fn split_glob_root(base: &Path, pattern: &str) -> (PathBuf, String) {
	let segments: Vec<&str> = pattern.split('/').collect();
	let literal = segments
		.iter()
		.take_while(|segment| !has_glob_syntax(segment))
		.count()
		.min(segments.len().saturating_sub(1));

	let prefix = segments[..literal].join("/");
	let rest = segments[literal..].join("/");
	let root = if prefix.is_empty() && !pattern.starts_with('/') {
		base.to_path_buf()
	} else if prefix.is_empty() {
		PathBuf::from("/")
	} else {
		crate::paths::resolve(base, Path::new(&prefix))
	};

	(root, rest)
}

fn build_glob(pattern: &str, options: &GlobOptions) -> VerbResult<Glob> {
	GlobBuilder::new(pattern)
		.literal_separator(true)
		.case_insensitive(options.case_insensitive)
		.build()
		.map_err(|e| {
			VerbError::InvalidGlob {
				pattern: pattern.to_string(),
				reason: e.to_string(),
			}
		})
}

fn is_excluded(exclude: &GlobSet, base: &Path, path: &Path) -> bool {
	!exclude.is_empty() && exclude.is_match(path.strip_prefix(base).unwrap_or(path))
}

fn is_ignored_directory_name(name: &str) -> bool {
	name == "node_modules" || name == "target" || name == ".git"
}

/// Every file under `base`, sorted by path.
fn walk_files(base: &Path, glob: &GlobOptions) -> VerbResult<Vec<PathBuf>> {
	let walker = WalkBuilder::new(base)
		.hidden(!glob.dot)
		.git_ignore(glob.gitignore)
		.git_exclude(glob.gitignore)
		.git_global(false)
		.ignore(false)
		.parents(glob.gitignore)
		.sort_by_file_name(|a, b| a.cmp(b))
		.filter_entry(|entry| {
			entry
				.file_name()
				.to_str()
				.is_none_or(|name| !is_ignored_directory_name(name))
		})
		.build();

	let mut files = Vec::new();
	for entry in walker {
		let entry = entry.map_err(|e| {
			VerbError::Walk {
				path: base.display().to_string(),
				reason: e.to_string(),
			}
		})?;

		if entry.file_type().is_some_and(|file_type| file_type.is_file()) {
			files.push(entry.into_path());
		}
	}

	Ok(files)
}
