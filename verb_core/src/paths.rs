//! Path helpers that produce stable, forward-slash output regardless of
//! platform.

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Join `segments` into one path and express it relative to the current
/// working directory, using `/` separators.
///
/// Paths outside the working directory (or when the working directory cannot
/// be read) are returned as given, only with their separators normalized.
pub fn relative<I, P>(segments: I) -> String
where
	I: IntoIterator<Item = P>,
	P: AsRef<Path>,
{
	let joined: PathBuf = segments.into_iter().fold(PathBuf::new(), |mut acc, s| {
		acc.push(s);
		acc
	});

	match std::env::current_dir() {
		Ok(cwd) => relative_to(&joined, &cwd),
		Err(_) => normalize_slashes(&joined),
	}
}

/// Express `path` relative to `base`, using `/` separators.
pub fn relative_to(path: &Path, base: &Path) -> String {
	let path = lexical_clean(path);
	let base = lexical_clean(base);

	match path.strip_prefix(&base) {
		Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
		Ok(rel) => normalize_slashes(rel),
		Err(_) => normalize_slashes(&path),
	}
}

/// Replace every `\` separator with `/`.
pub fn normalize_slashes(path: &Path) -> String {
	path.to_string_lossy().replace('\\', "/")
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
	if path.is_absolute() {
		path.to_path_buf()
	} else {
		lexical_clean(&base.join(path))
	}
}

/// Drop `.` components and fold `..` into its parent without touching the
/// filesystem.
fn lexical_clean(path: &Path) -> PathBuf {
	let mut cleaned = PathBuf::new();

	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				match cleaned.components().next_back() {
					None | Some(Component::ParentDir) => cleaned.push(".."),
					Some(_) => {
						cleaned.pop();
					}
				}
			}
			other => cleaned.push(other.as_os_str()),
		}
	}

	cleaned
}
