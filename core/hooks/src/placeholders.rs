//! Expansion of `{placeholder}` markers in hook command strings.
use replimend_models::AnalysisEntry;
use replimend_models::Instance;

/// Expand every placeholder occurrence in a hook command string.
///
/// The placeholder spellings are a long-standing operator compatibility
/// surface and keep their legacy names. Expansion is plain text substitution:
/// values are not quoted or escaped for the shell, so hook commands see the
/// analysis content verbatim. Commands built from untrusted hostnames or
/// descriptions are the operator's risk to manage.
///
/// Successor placeholders are left untouched until a successor is known, and
/// expanding an already expanded command changes nothing.
pub fn expand_placeholders(
    command: &str,
    entry: &AnalysisEntry,
    successor: Option<&Instance>,
) -> String {
    let replica_hosts = entry
        .replica_hosts
        .iter()
        .map(|key| key.to_string())
        .collect::<Vec<_>>()
        .join(",");

    let mut expanded = command.replace("{failureType}", entry.verdict.as_str());
    expanded = expanded.replace("{failureDescription}", &entry.description);
    expanded = expanded.replace("{failedHost}", &entry.analyzed_key.hostname);
    expanded = expanded.replace("{failedPort}", &entry.analyzed_key.port.to_string());
    expanded = expanded.replace("{failureCluster}", &entry.cluster_name);
    expanded = expanded.replace("{failureClusterAlias}", &entry.cluster_alias);
    expanded = expanded.replace("{countSlaves}", &entry.count_replicas.to_string());
    expanded = expanded.replace("{slaveHosts}", &replica_hosts);
    if let Some(successor) = successor {
        expanded = expanded.replace("{successorHost}", &successor.key.hostname);
        expanded = expanded.replace("{successorPort}", &successor.key.port.to_string());
    }
    expanded
}
