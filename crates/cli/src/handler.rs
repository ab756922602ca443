//! Error reporting for the `tally` binary.

use eyre::EyreHandler;
use std::{error::Error, fmt};
use tally_common::{
    ControllerError,
    errors::{dedup_chain, find_controller_error},
};
use yansi::Paint;

/// Reports the outermost message, then each distinct cause, then a hint when the chain carries a
/// [`ControllerError`] the user can act on.
///
/// With `TALLY_DEBUG` set, `Debug` output is delegated to `color-eyre` instead.
pub struct Handler {
    verbose: Option<Box<dyn EyreHandler>>,
}

impl Handler {
    pub fn new(verbose: Option<Box<dyn EyreHandler>>) -> Self {
        Self { verbose }
    }
}

impl EyreHandler for Handler {
    fn display(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&dedup_chain(error).join("; "))
    }

    fn debug(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(verbose) = &self.verbose {
            return verbose.debug(error, f);
        }
        if f.alternate() {
            return fmt::Debug::fmt(error, f);
        }

        let mut messages = dedup_chain(error).into_iter();
        if let Some(message) = messages.next() {
            f.write_str(&message)?;
        }
        for cause in messages {
            write!(f, "\n  {} {cause}", "caused by:".dim())?;
        }
        if let Some(hint) = find_controller_error(error).and_then(ControllerError::hint) {
            write!(f, "\n\n{} {hint}", "hint:".yellow().bold())?;
        }
        Ok(())
    }

    fn track_caller(&mut self, location: &'static std::panic::Location<'static>) {
        if let Some(verbose) = &mut self.verbose {
            verbose.track_caller(location);
        }
    }
}

/// Installs the panic hook and the [`Handler`] as the global `eyre` hook.
///
/// Must run first thing in `main`, before other threads exist.
pub fn install() {
    let verbose = std::env::var_os("TALLY_DEBUG").is_some();
    if verbose && std::env::var_os("RUST_BACKTRACE").is_none() {
        // SAFETY: single-threaded at this point.
        unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
    }

    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .panic_section("This is a bug in tally. Please report it along with the command you ran.")
        .into_hooks();
    panic_hook.install();
    let eyre_hook = eyre_hook.into_eyre_hook();
    let installed = eyre::set_hook(Box::new(move |err| {
        Box::new(Handler::new(verbose.then(|| eyre_hook(err))))
    }));
    if let Err(err) = installed {
        debug!(%err, "eyre hook already installed");
    }
}
