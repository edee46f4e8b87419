use tracing::{debug, info};

use crate::{Filter, GitConfig, SetupError};

/// Configuration section holding every managed filter key.
pub const FILTER_SECTION: &str = "filter.lfs";

/// Returns `true` for values that may be replaced without `force`: unset
/// values and those left behind by the `git-media` predecessor.
fn should_reset(current: &str) -> bool {
    if current.is_empty() {
        return true;
    }
    current
        .strip_prefix("git")
        .and_then(|rest| rest.strip_prefix(|c: char| c == '-' || c.is_whitespace()))
        .is_some_and(|rest| rest.starts_with("media"))
}

fn install(filter: &Filter, config: &mut dyn GitConfig, force: bool) -> Result<(), SetupError> {
    let key = filter.key();
    let current = config.find(&key)?;

    if current == filter.value {
        debug!(%key, "Filter already configured");
        return Ok(());
    }
    if force || should_reset(&current) {
        config.unset_global(&key)?;
        config.set_global(&key, &filter.value)?;
        info!(%key, value = %filter.value, "Filter configured");
        return Ok(());
    }
    Err(SetupError::FilterMismatch {
        key,
        expected: filter.value.clone(),
        actual: current,
    })
}

/// Installs every filter in `filters`, stopping at the first failure.
///
/// A filter that is unset, already correct, or holds a legacy `git-media`
/// value is (re)written. Any other existing value is an error unless `force`
/// is set.
pub fn setup_filters(
    filters: &[Filter],
    config: &mut dyn GitConfig,
    force: bool,
) -> Result<(), SetupError> {
    for filter in filters {
        install(filter, config, force)?;
    }
    Ok(())
}

/// Removes the whole [`FILTER_SECTION`] from the global configuration.
pub fn teardown_filters(config: &mut dyn GitConfig) -> Result<(), SetupError> {
    config.unset_global_section(FILTER_SECTION)?;
    info!(section = FILTER_SECTION, "Filters removed");
    Ok(())
}
