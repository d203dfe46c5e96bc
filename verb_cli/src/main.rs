use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use serde_json::Map;
use serde_json::Value;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use verb_cli::Commands;
use verb_cli::VerbCli;
use verb_core::InitOptions;
use verb_core::Options;
use verb_core::TocOptions;
use verb_core::Verb;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
}

const SAMPLE_TEMPLATE: &str = "---\ntitle: My Project\n---\n# {{ name | default(title) }}\n\n{{ \
                               description }}\n\n{{ toc }}\n\n## Install\n\n```sh\nnpm install {{ \
                               name }}\n```\n\n## Usage\n\nDescribe how to use the project \
                               here.\n\n## License\n\n{{ license }}\n";

/// A failed `check`. Exits with status 1 without an error report.
#[derive(Debug)]
struct Stale;

impl std::fmt::Display for Stale {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "output is out of date")
	}
}

impl std::error::Error for Stale {}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
	let args = VerbCli::parse();

	// Respect NO_COLOR env var, --no-color flag, and terminal support.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stderr).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);
	verb_core::init(InitOptions {
		verbose: args.verbose,
		mixins: Vec::new(),
	});

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Build {
			src,
			dest,
			concat,
			sep,
			ext,
			flatten,
		}) => {
			let build = BuildArgs {
				src,
				dest,
				concat: *concat,
				sep,
				ext: ext.as_deref(),
				flatten: *flatten,
			};
			run_build(&args, &build)
		}
		Some(Commands::Render { src }) => run_render(&args, src),
		Some(Commands::Check { src, dest, diff }) => run_check(&args, src, dest, *diff),
		None => {
			eprintln!("No subcommand specified. Run `verb --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		if e.is::<Stale>() {
			process::exit(1);
		}

		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<verb_core::VerbError>() {
			Ok(verb_err) => {
				let report: miette::Report = (*verb_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| format!("verb_core={default_level},verb={default_level}").into()),
		)
		.with(
			tracing_subscriber::fmt::layer()
				.with_writer(std::io::stderr)
				.with_ansi(use_color)
				.with_target(false),
		)
		.init();
}

fn resolve_root(args: &VerbCli) -> PathBuf {
	let current = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
	match &args.cwd {
		Some(cwd) => verb_core::paths::resolve(&current, cwd),
		None => current,
	}
}

/// Parse `key=value` pairs. Values that are valid JSON keep their type.
fn parse_assignments(pairs: &[String]) -> Result<Map<String, Value>, String> {
	let mut map = Map::new();

	for pair in pairs {
		let Some((key, raw)) = pair.split_once('=') else {
			return Err(format!("expected `key=value`, got `{pair}`"));
		};
		let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
		map.insert(key.trim().to_string(), value);
	}

	Ok(map)
}

fn base_options(args: &VerbCli) -> Result<Options, Box<dyn std::error::Error>> {
	let mut toc = TocOptions::default();
	if let Some(depth) = args.toc_depth {
		toc.max_depth = depth;
	}

	Ok(Options {
		verbose: args.verbose,
		cwd: Some(resolve_root(args)),
		verbrc: args.verbrc.clone(),
		metadata: parse_assignments(&args.set)?,
		data: args.data.clone(),
		toc,
		..Options::default()
	})
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	verb_core::paths::relative_to(path, root)
}

fn run_init(args: &VerbCli) -> CliResult {
	let root = resolve_root(args);
	let template_path = root.join(".verb.md");

	if template_path.exists() {
		println!("Template file already exists: {}", template_path.display());
		return Ok(());
	}

	std::fs::write(&template_path, SAMPLE_TEMPLATE)?;
	println!("Created template file: {}", template_path.display());
	println!();
	println!("Next steps:");
	println!(
		"  1. Edit {} to describe your project",
		template_path.display()
	);
	println!("  2. Run `verb build .verb.md` to write README.md");

	Ok(())
}

struct BuildArgs<'a> {
	src: &'a [String],
	dest: &'a Path,
	concat: bool,
	sep: &'a str,
	ext: Option<&'a str>,
	flatten: bool,
}

fn run_build(args: &VerbCli, build: &BuildArgs<'_>) -> CliResult {
	let options = Options {
		concat: build.concat.then_some(true),
		sep: build.sep.to_string(),
		ext: build.ext.map(ToString::to_string),
		flatten: build.flatten,
		..base_options(args)?
	};
	let root = options.cwd();
	tracing::debug!(root = %root.display(), sources = build.src.len(), "building");

	let rt = tokio::runtime::Runtime::new()?;
	let result = rt.block_on(Verb::new().expand(build.src, build.dest, &options))?;

	for missing in &result.missing {
		eprintln!(
			"{} source not found: {}",
			colored!("warning:", yellow),
			make_relative(missing, &root)
		);
	}

	for written in &result.written {
		println!(
			"{} {}",
			colored!("wrote", green),
			make_relative(written, &root)
		);
	}

	if result.written.is_empty() {
		println!("Nothing to write.");
	}

	Ok(())
}

fn run_render(args: &VerbCli, src: &Path) -> CliResult {
	let options = base_options(args)?;

	let rt = tokio::runtime::Runtime::new()?;
	let content = rt.block_on(Verb::new().read(src, &options))?;
	print!("{content}");

	Ok(())
}

fn run_check(args: &VerbCli, src: &Path, dest: &Path, diff: bool) -> CliResult {
	let options = base_options(args)?;
	let root = options.cwd();
	let dest_path = options.resolve(dest);

	let rt = tokio::runtime::Runtime::new()?;
	let expected = rt.block_on(Verb::new().read(src, &options))?;
	let current = match std::fs::read_to_string(&dest_path) {
		Ok(current) => current,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
		Err(e) => return Err(e.into()),
	};

	let rel = make_relative(&dest_path, &root);
	if current == expected {
		println!("{rel} is up to date.");
		return Ok(());
	}

	eprintln!(
		"{} {rel} is out of date. Run `verb build {} --dest {rel}` to update it.",
		colored!("stale:", red),
		make_relative(&options.resolve(src), &root)
	);
	if diff {
		print_diff(&current, &expected);
	}

	Err(Box::new(Stale))
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}
