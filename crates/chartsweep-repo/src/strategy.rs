//! Update strategy evaluation
//!
//! Pure selection of at most one proposed version from the available
//! entries, honoring the configured strategy and ignore rules.

use semver::Version;

use chartsweep_core::{IgnoreRule, UpdateStrategy, UpdateType};

use crate::index::ChartVersionInfo;

/// Classify a candidate's bump type relative to the current version
pub fn classify(current: &Version, candidate: &Version) -> UpdateType {
    if candidate.major != current.major {
        UpdateType::Major
    } else if candidate.minor != current.minor {
        UpdateType::Minor
    } else {
        UpdateType::Patch
    }
}

/// Select the update to propose for one chart, if any.
///
/// Entries that are not valid semver, not strictly greater than the
/// current version, or pre-releases (unless `allow_prerelease`) are never
/// candidates. Among candidates surviving the strategy and ignore-rule
/// filters, the semantically highest wins. Pure function of its inputs.
pub fn select_update(
    name: &str,
    current: &str,
    available: &[ChartVersionInfo],
    strategy: UpdateStrategy,
    ignore: &[IgnoreRule],
    allow_prerelease: bool,
) -> Option<Version> {
    let current = Version::parse(current).ok()?;

    available
        .iter()
        .filter_map(|info| info.parsed_version())
        .filter(|candidate| *candidate > current)
        .filter(|candidate| allow_prerelease || candidate.pre.is_empty())
        .filter(|candidate| {
            let update_type = classify(&current, candidate);
            strategy.permits(update_type)
                && !ignore.iter().any(|rule| rule.suppresses(name, update_type))
        })
        .max()
}
