//! Error types shared across the workspace, and helpers to report them.

mod controller;
pub use controller::ControllerError;

mod descriptor;
pub use descriptor::DescriptorError;

use std::{error::Error, iter};

/// The messages of `error` and its sources, outermost first.
///
/// A source is skipped when the message kept before it already contains it, which is what
/// `#[error("...: {0}")]` wrappers produce.
pub fn dedup_chain(error: &(dyn Error + 'static)) -> Vec<String> {
    let mut messages = Vec::<String>::new();
    for cause in sources(error) {
        let message = cause.to_string();
        let message = message.trim();
        if messages.last().is_some_and(|kept| kept.contains(message)) {
            continue;
        }
        messages.push(message.to_string());
    }
    messages
}

/// [`dedup_chain`] on a single line.
pub fn display_chain(error: &(dyn Error + 'static)) -> String {
    dedup_chain(error).join("; ")
}

/// The first [`ControllerError`] in the chain of `error`.
pub fn find_controller_error<'a>(error: &'a (dyn Error + 'static)) -> Option<&'a ControllerError> {
    sources(error).find_map(|cause| cause.downcast_ref::<ControllerError>())
}

fn sources<'a>(error: &'a (dyn Error + 'static)) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    iter::successors(Some(error), |&err| err.source())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("abi file unusable: {0}")]
    struct Quoting(#[source] ControllerError);

    #[test]
    fn drops_sources_already_quoted() {
        let err = Quoting(ControllerError::InvalidInput("bad".to_string()));
        assert_eq!(dedup_chain(&err), ["abi file unusable: invalid input: bad"]);
    }

    #[test]
    fn keeps_distinct_causes() {
        let report =
            eyre::Report::from(ControllerError::NoActiveSession).wrap_err("increment failed");
        assert_eq!(display_chain(report.as_ref()), "increment failed; no active wallet session");
    }

    #[test]
    fn finds_the_controller_error_under_context() {
        let report = eyre::Report::from(ControllerError::OperationInProgress)
            .wrap_err("set failed")
            .wrap_err("console");
        assert_eq!(
            find_controller_error(report.as_ref()),
            Some(&ControllerError::OperationInProgress)
        );

        let report = eyre::eyre!("plain");
        assert_eq!(find_controller_error(report.as_ref()), None);
    }
}
