use similar_asserts::assert_eq;
use verb_core::AnyEmptyResult;
use verb_core::InitOptions;
use verb_core::Mixin;
use verb_core::Options;
use verb_core::Verb;
use verb_core::blocking;
use verb_core::init;

fn shout(value: &str) -> String {
	value.to_uppercase()
}

fn whisper(value: &str) -> String {
	value.to_lowercase()
}

// Initialization is process-wide, so everything that depends on it lives in
// a single test in its own binary.
#[test]
fn init_only_applies_first_call() -> AnyEmptyResult {
	assert!(verb_core::init::state().is_none());

	let first = init(InitOptions {
		verbose: false,
		mixins: vec![Mixin {
			name: "shout",
			filter: shout,
		}],
	});
	let second = init(InitOptions {
		verbose: true,
		mixins: vec![Mixin {
			name: "whisper",
			filter: whisper,
		}],
	});

	assert!(std::ptr::eq(first, second));
	assert!(!second.verbose);
	assert_eq!(second.mixins.len(), 1);

	let filters = Verb::new().renderer().filter_names();
	assert!(filters.contains(&"shout".to_string()));
	assert!(!filters.contains(&"whisper".to_string()));

	let tmp = tempfile::tempdir()?;
	let mut options = Options {
		cwd: Some(tmp.path().to_path_buf()),
		..Options::default()
	};
	options.metadata.insert("name".to_string(), "verb".into());

	let processed = blocking::process("{{ name | shout }}", &options)?;
	assert_eq!(processed.content, "VERB\n");

	Ok(())
}
