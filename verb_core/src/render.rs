use crate::VerbError;
use crate::VerbResult;
use crate::context::Context;
use crate::options::RenderSettings;

/// A string filter installed into every renderer by [`crate::init`].
#[derive(Debug, Clone, Copy)]
pub struct Mixin {
	pub name: &'static str,
	pub filter: fn(&str) -> String,
}

/// Filters verb adds on top of the minijinja builtins.
pub const VERB_FILTERS: [&str; 9] = [
	"trimStart",
	"trimEnd",
	"prefix",
	"suffix",
	"wrap",
	"code",
	"codeBlock",
	"linePrefix",
	"lineSuffix",
];

const TEMPLATE_NAME: &str = "__page__";

/// Renders page content against a [`Context`] with minijinja.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
	mixins: Vec<Mixin>,
}

impl Renderer {
	pub fn new(mixins: Vec<Mixin>) -> Self {
		Self { mixins }
	}

	/// Names of every filter this renderer adds, verb filters first.
	pub fn filter_names(&self) -> Vec<String> {
		VERB_FILTERS
			.iter()
			.copied()
			.chain(self.mixins.iter().map(|mixin| mixin.name))
			.map(ToString::to_string)
			.collect()
	}

	/// Render `content` with `context`. Content without template syntax is
	/// returned unchanged.
	pub fn render(
		&self,
		content: &str,
		context: &Context,
		settings: &RenderSettings,
	) -> VerbResult<String> {
		if !has_template_syntax(content) {
			return Ok(content.to_string());
		}

		let mut env = minijinja::Environment::new();
		env.set_keep_trailing_newline(settings.keep_trailing_newline);
		env.set_trim_blocks(settings.trim_blocks);
		env.set_lstrip_blocks(settings.lstrip_blocks);
		env.set_undefined_behavior(settings.undefined.into());
		self.install_filters(&mut env);

		env.add_template(TEMPLATE_NAME, content)
			.map_err(|e| VerbError::TemplateRender(e.to_string()))?;
		let template = env
			.get_template(TEMPLATE_NAME)
			.map_err(|e| VerbError::TemplateRender(e.to_string()))?;

		let ctx = minijinja::Value::from_serialize(context);
		template
			.render(ctx)
			.map_err(|e| VerbError::TemplateRender(e.to_string()))
	}

	fn install_filters(&self, env: &mut minijinja::Environment<'_>) {
		env.add_filter("trimStart", |value: String| value.trim_start().to_string());
		env.add_filter("trimEnd", |value: String| value.trim_end().to_string());
		env.add_filter("prefix", |value: String, prefix: Option<String>| {
			format!("{}{value}", prefix.unwrap_or_default())
		});
		env.add_filter("suffix", |value: String, suffix: Option<String>| {
			format!("{value}{}", suffix.unwrap_or_default())
		});
		env.add_filter("wrap", |value: String, wrapper: Option<String>| {
			let wrapper = wrapper.unwrap_or_default();
			format!("{wrapper}{value}{wrapper}")
		});
		env.add_filter("code", |value: String| format!("`{value}`"));
		env.add_filter("codeBlock", |value: String, lang: Option<String>| {
			code_block(&value, &lang.unwrap_or_default())
		});
		env.add_filter(
			"linePrefix",
			|value: String, prefix: Option<String>, include_empty: Option<bool>| {
				line_prefix(
					&value,
					&prefix.unwrap_or_default(),
					include_empty.unwrap_or(false),
				)
			},
		);
		env.add_filter(
			"lineSuffix",
			|value: String, suffix: Option<String>, include_empty: Option<bool>| {
				line_suffix(
					&value,
					&suffix.unwrap_or_default(),
					include_empty.unwrap_or(false),
				)
			},
		);

		for mixin in &self.mixins {
			let filter = mixin.filter;
			env.add_filter(mixin.name, move |value: String| filter(&value));
		}
	}
}

/// Check whether content contains minijinja template syntax.
pub fn has_template_syntax(content: &str) -> bool {
	content.contains("{{") || content.contains("{%") || content.contains("{#")
}

/// Wrap `content` in a fenced code block.
pub fn code_block(content: &str, lang: &str) -> String {
	format!("```{lang}\n{content}\n```")
}

/// Prefix every line of `content`. Empty lines stay empty unless
/// `include_empty` is set, in which case they receive the prefix without its
/// trailing whitespace.
pub fn line_prefix(content: &str, prefix: &str, include_empty: bool) -> String {
	content
		.lines()
		.map(|line| {
			if line.is_empty() && !include_empty {
				String::new()
			} else if line.is_empty() {
				prefix.trim_end().to_string()
			} else {
				format!("{prefix}{line}")
			}
		})
		.collect::<Vec<_>>()
		.join("\n")
}

/// Suffix every line of `content`, with the same empty-line rules as
/// [`line_prefix`].
pub fn line_suffix(content: &str, suffix: &str, include_empty: bool) -> String {
	content
		.lines()
		.map(|line| {
			if line.is_empty() && !include_empty {
				String::new()
			} else if line.is_empty() {
				suffix.trim_start().to_string()
			} else {
				format!("{line}{suffix}")
			}
		})
		.collect::<Vec<_>>()
		.join("\n")
}
