//! Diagnostic logging to stderr.
//!
//! stdout is reserved for command output, so `siteconf resolve --format json`
//! can be piped while debug events still reach the terminal.

use tracing_subscriber::EnvFilter;

use crate::constants::ENV_LOG;
use crate::env::Env;

/// Filter used when `SITECONF_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn";

/// Filter used with `-v`.
pub const VERBOSE_FILTER: &str = "siteconf=debug";

/// Pick the filter directive: `SITECONF_LOG` wins, then `-v`, then the default.
pub fn filter_directive(env: &Env, verbose: bool) -> String {
    match env.var(ENV_LOG) {
        Ok(directive) if !directive.trim().is_empty() => directive,
        _ if verbose => VERBOSE_FILTER.to_string(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(env: &Env, verbose: bool) {
    let directive = filter_directive(env, verbose);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_warn() {
        let env = Env::mock(Vec::<(&str, &str)>::new());
        assert_eq!(filter_directive(&env, false), "warn");
    }

    #[test]
    fn verbose_enables_debug() {
        let env = Env::mock(Vec::<(&str, &str)>::new());
        assert_eq!(filter_directive(&env, true), "siteconf=debug");
    }

    #[test]
    fn env_var_wins_over_verbose() {
        let env = Env::mock([("SITECONF_LOG", "trace")]);
        assert_eq!(filter_directive(&env, true), "trace");
        let blank = Env::mock([("SITECONF_LOG", "  ")]);
        assert_eq!(filter_directive(&blank, false), "warn");
    }

    #[test]
    fn init_twice_does_not_panic() {
        let env = Env::mock([("SITECONF_LOG", "not a [valid filter")]);
        init(&env, false);
        init(&env, true);
    }
}
