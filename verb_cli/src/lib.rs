use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Generate documentation from markdown templates and project data.",
	long_about = "verb renders markdown templates into finished documents such as READMEs.\n\nProject \
	              metadata (package.json or Cargo.toml), a `.verbrc` runtime config, data files, \
	              and front matter are merged into one context. Templates use minijinja syntax, \
	              `<!-- {>include:\"file.md\"} -->` tags pull in other files, and `<!-- toc -->` \
	              becomes a table of contents.\n\nQuick start:\n  verb init                  \
	              Create a .verb.md template\n  verb build .verb.md        Render it into \
	              README.md\n  verb check .verb.md README.md  Verify README.md is up to date"
)]
pub struct VerbCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Working directory that sources, data files, and destinations are
	/// resolved against.
	#[arg(long, global = true)]
	pub cwd: Option<PathBuf>,

	/// Runtime config file. Defaults to the first `.verbrc*` file found in
	/// the working directory.
	#[arg(long, global = true)]
	pub verbrc: Option<PathBuf>,

	/// Extra context values as `key=value`. Values that parse as JSON are
	/// used as JSON, everything else as a string.
	#[arg(long = "set", short = 's', global = true, value_name = "KEY=VALUE")]
	pub set: Vec<String>,

	/// Glob patterns of data files loaded into the context under their file
	/// stem.
	#[arg(long, global = true)]
	pub data: Vec<String>,

	/// Deepest heading level listed in the table of contents.
	#[arg(long, global = true)]
	pub toc_depth: Option<u8>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Create a sample `.verb.md` template in the working directory.
	///
	/// If the file already exists, this command is a no-op and exits
	/// successfully.
	Init,
	/// Render templates and write the results.
	///
	/// Each source may be a path or a glob pattern; patterns starting with
	/// `!` exclude matches. When the destination has a file extension every
	/// source is rendered and joined into that one file. Otherwise each
	/// source is written below the destination directory, keeping its path
	/// relative to the working directory.
	Build {
		/// Template files or glob patterns.
		#[arg(required = true)]
		src: Vec<String>,

		/// Destination file or directory.
		#[arg(long, short, default_value = "README.md")]
		dest: PathBuf,

		/// Join every rendered source into the destination even when it has
		/// no extension.
		#[arg(long, default_value_t = false)]
		concat: bool,

		/// Separator placed between joined sources.
		#[arg(long, default_value = "\n")]
		sep: String,

		/// Replace the extension of every written file.
		#[arg(long)]
		ext: Option<String>,

		/// Write every file directly into the destination directory.
		#[arg(long, default_value_t = false)]
		flatten: bool,
	},
	/// Render a template and print the result to stdout.
	Render {
		/// Template file.
		src: PathBuf,
	},
	/// Check that a rendered file is up to date with its template.
	///
	/// Renders the template and compares the output with the destination
	/// file. Exits with status 1 when they differ. Ideal for CI pipelines.
	Check {
		/// Template file.
		src: PathBuf,

		/// The previously rendered file.
		dest: PathBuf,

		/// Show a unified diff between the current and expected content.
		#[arg(long, default_value_t = false)]
		diff: bool,
	},
}
