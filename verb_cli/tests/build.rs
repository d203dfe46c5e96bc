mod common;

use clap::Parser;
use predicates::prelude::PredicateBooleanExt;
use rstest::rstest;
use similar_asserts::assert_eq;
use verb_cli::Commands;
use verb_cli::VerbCli;
use verb_core::AnyEmptyResult;

#[test]
fn build_renders_readme_from_package() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("package.json"),
		r#"{"name": "widget", "version": "1.0.0", "description": "Makes widgets."}"#,
	)?;
	std::fs::write(
		tmp.path().join(".verb.md"),
		"# {{ name }}\n\n> {{ description }}\n\nVersion {{ version }}\n",
	)?;

	common::verb_cmd()
		.arg("build")
		.arg(".verb.md")
		.arg("--cwd")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("wrote README.md"));

	let readme = std::fs::read_to_string(tmp.path().join("README.md"))?;
	assert_eq!(readme, "# widget\n\n> Makes widgets.\n\nVersion 1.0.0\n");

	Ok(())
}

#[test]
fn build_expands_into_directory() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("templates/guide"))?;
	std::fs::write(tmp.path().join("templates/intro.md"), "Intro {{ who }}\n")?;
	std::fs::write(tmp.path().join("templates/guide/setup.md"), "Setup\n")?;

	common::verb_cmd()
		.args(["build", "templates/**/*.md", "--dest", "site", "--flatten"])
		.args(["--set", "who=everyone"])
		.arg("--cwd")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(
			predicates::str::contains("wrote site/intro.md")
				.and(predicates::str::contains("wrote site/setup.md")),
		);

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("site/intro.md"))?,
		"Intro everyone\n"
	);
	assert!(tmp.path().join("site/setup.md").exists());

	Ok(())
}

#[test]
fn build_concatenates_sources() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("a.md"), "# A\n")?;
	std::fs::write(tmp.path().join("b.md"), "# B\n")?;

	common::verb_cmd()
		.args(["build", "a.md", "b.md", "--dest", "ALL.md"])
		.arg("--cwd")
		.arg(tmp.path())
		.assert()
		.success();

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("ALL.md"))?,
		"# A\n\n# B\n"
	);

	Ok(())
}

#[test]
fn build_warns_about_missing_sources() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::verb_cmd()
		.args(["build", "missing.md", "--dest", "out"])
		.arg("--cwd")
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("source not found: missing.md"))
		.stdout(predicates::str::contains("Nothing to write."));

	Ok(())
}

#[test]
fn render_prints_to_stdout() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("docs"))?;
	std::fs::write(tmp.path().join("docs/usage.md"), "Run it.\n")?;
	std::fs::write(
		tmp.path().join("page.md"),
		"---\ntitle: Guide\n---\n# {{ title }}\n\n<!-- {>docs:\"usage\"} -->\n",
	)?;

	common::verb_cmd()
		.args(["render", "page.md"])
		.arg("--cwd")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("# Guide\n\nRun it.\n");

	Ok(())
}

#[test]
fn render_missing_file_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::verb_cmd()
		.args(["render", "nope.md"])
		.arg("--cwd")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("source file not found"));

	Ok(())
}

#[test]
fn render_template_error_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("bad.md"), "{% if %}\n")?;

	common::verb_cmd()
		.args(["render", "bad.md"])
		.arg("--cwd")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("template rendering failed"));

	Ok(())
}

#[rstest]
#[case::defaults(&["verb", "build", ".verb.md"], "README.md", false)]
#[case::dest(&["verb", "build", "a.md", "--dest", "docs"], "docs", false)]
#[case::concat(&["verb", "build", "a.md", "-d", "book", "--concat"], "book", true)]
fn parses_build_arguments(
	#[case] argv: &[&str],
	#[case] expected_dest: &str,
	#[case] expected_concat: bool,
) {
	let cli = VerbCli::try_parse_from(argv).unwrap_or_else(|e| panic!("parse: {e}"));

	match cli.command {
		Some(Commands::Build { dest, concat, .. }) => {
			assert_eq!(dest, std::path::PathBuf::from(expected_dest));
			assert_eq!(concat, expected_concat);
		}
		_ => panic!("expected build command"),
	}
}
