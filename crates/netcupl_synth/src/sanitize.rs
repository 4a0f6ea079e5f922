//! Pin and pin-node name scrubbing.

use netcupl_graph::Graph;

/// Replaces every character that is not a letter or digit with `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Renames every pin and pin node to its sanitized name. A connection
/// named after its node is renamed with it.
pub(crate) fn fix_pin_names(graph: &mut Graph) {
    let nodes: Vec<_> = graph.pins().iter().chain(graph.pin_nodes()).copied().collect();
    for node in nodes {
        let old = graph.node(node).name;
        let name = graph.resolve(old);
        let clean = sanitize_name(name);
        if clean == name {
            continue;
        }
        log::debug!("renaming {name} to {clean}");
        graph.rename_node(node, &clean);
        let new = graph.node(node).name;
        for conn in graph.node(node).connections.clone() {
            if graph.conn(conn).name == old {
                graph.rename_conn(conn, new);
            }
        }
    }
}
