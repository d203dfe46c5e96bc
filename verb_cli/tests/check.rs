mod common;

use verb_core::AnyEmptyResult;

fn project() -> Result<tempfile::TempDir, std::io::Error> {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join(".verbrc.toml"), "name = \"gizmo\"\n")?;
	std::fs::write(tmp.path().join(".verb.md"), "# {{ name }}\n")?;
	Ok(tmp)
}

#[test]
fn check_passes_when_up_to_date() -> AnyEmptyResult {
	let tmp = project()?;
	std::fs::write(tmp.path().join("README.md"), "# gizmo\n")?;

	common::verb_cmd()
		.args(["check", ".verb.md", "README.md"])
		.arg("--cwd")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("README.md is up to date."));

	Ok(())
}

#[test]
fn check_fails_when_stale() -> AnyEmptyResult {
	let tmp = project()?;
	std::fs::write(tmp.path().join("README.md"), "# old name\n")?;

	common::verb_cmd()
		.args(["check", ".verb.md", "README.md", "--diff"])
		.arg("--cwd")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("README.md is out of date"))
		.stderr(predicates::str::contains("-# old name"))
		.stderr(predicates::str::contains("+# gizmo"));

	Ok(())
}

#[test]
fn check_fails_when_destination_missing() -> AnyEmptyResult {
	let tmp = project()?;

	common::verb_cmd()
		.args(["check", ".verb.md", "README.md"])
		.arg("--cwd")
		.arg(tmp.path())
		.assert()
		.code(1);

	Ok(())
}

#[test]
fn explicit_verbrc_overrides_discovery() -> AnyEmptyResult {
	let tmp = project()?;
	std::fs::write(tmp.path().join("other.yaml"), "name: sprocket\n")?;
	std::fs::write(tmp.path().join("README.md"), "# sprocket\n")?;

	common::verb_cmd()
		.args(["check", ".verb.md", "README.md", "--verbrc", "other.yaml"])
		.arg("--cwd")
		.arg(tmp.path())
		.assert()
		.success();

	Ok(())
}
