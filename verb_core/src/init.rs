use std::sync::OnceLock;

use crate::render::Mixin;

static STATE: OnceLock<InitState> = OnceLock::new();

/// Options accepted by [`init`].
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
	/// Log pipeline progress at `info` level.
	pub verbose: bool,
	/// Filters installed into every renderer created by
	/// [`Verb::new`](crate::Verb::new).
	pub mixins: Vec<Mixin>,
}

/// Process-wide settings fixed by the first call to [`init`].
#[derive(Debug, Clone)]
pub struct InitState {
	pub verbose: bool,
	pub mixins: Vec<Mixin>,
}

/// Initialize verb for this process. Only the first call takes effect; every
/// later call returns the state created by the first one and ignores its
/// options.
pub fn init(options: InitOptions) -> &'static InitState {
	let mut first = false;
	let state = STATE.get_or_init(|| {
		first = true;
		InitState {
			verbose: options.verbose,
			mixins: options.mixins,
		}
	});

	if first {
		tracing::debug!(
			verbose = state.verbose,
			mixins = state.mixins.len(),
			"initialized"
		);
	} else {
		tracing::debug!("already initialized, ignoring options");
	}

	state
}

/// The state created by [`init`], if it has run.
pub fn state() -> Option<&'static InitState> {
	STATE.get()
}
