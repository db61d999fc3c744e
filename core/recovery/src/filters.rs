//! Cluster filters gating which clusters may auto-recover.
use regex::Regex;

use replimend_models::AnalysisEntry;

const ALIAS_EXACT: &str = "alias=";
const ALIAS_REGEX: &str = "alias~=";

/// Check whether any cluster filter allows recovering this analysis entry.
///
/// Filter forms:
///
/// - `alias=name` compares the cluster alias for exact equality.
/// - `alias~=pattern` matches the cluster alias against a regex.
/// - any other non-empty string matches the cluster name against a regex.
///
/// Empty filters never match and invalid regexes match nothing, so a
/// misconfigured list degrades to "do not recover" rather than failing.
/// With `skip_filters` the entry is always allowed.
pub fn filters_match(entry: &AnalysisEntry, filters: &[String], skip_filters: bool) -> bool {
    if skip_filters {
        return true;
    }
    filters.iter().any(|filter| filter_matches(entry, filter))
}

fn filter_matches(entry: &AnalysisEntry, filter: &str) -> bool {
    if filter.is_empty() {
        return false;
    }
    if let Some(alias) = filter.strip_prefix(ALIAS_REGEX) {
        return regex_matches(alias, &entry.cluster_alias);
    }
    if let Some(alias) = filter.strip_prefix(ALIAS_EXACT) {
        return alias == entry.cluster_alias;
    }
    regex_matches(filter, &entry.cluster_name)
}

fn regex_matches(pattern: &str, value: &str) -> bool {
    match Regex::new(pattern) {
        Ok(regex) => regex.is_match(value),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use replimend_models::AnalysisEntry;
    use replimend_models::AnalysisVerdict;
    use replimend_models::InstanceKey;

    use super::filters_match;

    fn entry(cluster_name: &str, cluster_alias: &str) -> AnalysisEntry {
        AnalysisEntry {
            verdict: AnalysisVerdict::DeadPrimary,
            analyzed_key: InstanceKey::new("p", 3306),
            analyzed_upstream_key: None,
            cluster_name: cluster_name.into(),
            cluster_alias: cluster_alias.into(),
            count_replicas: 0,
            replica_hosts: Vec::new(),
            description: "p is dead".into(),
            downtimed: false,
        }
    }

    fn filters(filters: &[&str]) -> Vec<String> {
        filters.iter().map(|filter| filter.to_string()).collect()
    }

    #[test]
    fn skip_filters_always_matches() {
        assert!(filters_match(&entry("c1", "main"), &[], true));
        assert!(filters_match(&entry("c1", "main"), &filters(&["nope"]), true));
    }

    #[test]
    fn empty_filter_list_never_matches() {
        assert!(!filters_match(&entry("c1", "main"), &[], false));
    }

    #[test]
    fn empty_filter_string_never_matches() {
        assert!(!filters_match(&entry("c1", "main"), &filters(&[""]), false));
    }

    #[test]
    fn alias_filters_compare_exactly() {
        let list = filters(&["alias=main"]);
        assert!(filters_match(&entry("c1", "main"), &list, false));
        assert!(!filters_match(&entry("c1", "main-eu"), &list, false));
    }

    #[test]
    fn alias_regex_filters_match_the_alias() {
        let list = filters(&["alias~=^main-..$"]);
        assert!(filters_match(&entry("c1", "main-eu"), &list, false));
        assert!(!filters_match(&entry("c1", "main"), &list, false));
    }

    #[test]
    fn bare_filters_match_the_cluster_name() {
        let list = filters(&["^shard-[0-9]+$"]);
        assert!(filters_match(&entry("shard-42", "irrelevant"), &list, false));
        assert!(!filters_match(&entry("shard-x", "irrelevant"), &list, false));
    }

    #[test]
    fn invalid_regexes_match_nothing() {
        let list = filters(&["shard-[", "alias~=(unclosed"]);
        assert!(!filters_match(&entry("shard-42", "main"), &list, false));
    }

    #[test]
    fn any_matching_filter_allows_recovery() {
        let list = filters(&["alias=other", "^c1$"]);
        assert!(filters_match(&entry("c1", "main"), &list, false));
    }
}
