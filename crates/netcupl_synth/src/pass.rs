//! Rewrite pass trait.

use netcupl_common::CuplResult;
use netcupl_graph::Graph;

/// A single graph rewrite.
///
/// Each pass mutates the graph in place and leaves it with a rebuilt top
/// list that passes [`Graph::check_all`]. It returns `true` if anything
/// changed.
pub(crate) trait Pass {
    /// Short name for log lines.
    fn name(&self) -> &'static str;

    /// Runs the pass on the graph.
    fn run(&self, graph: &mut Graph) -> CuplResult<bool>;
}

/// Runs a pass and logs whether it changed the graph.
pub(crate) fn run_pass(pass: &dyn Pass, graph: &mut Graph) -> CuplResult<bool> {
    let changed = pass.run(graph)?;
    log::info!(
        "{}: {} ({} pins, {} pin nodes, {} equations)",
        pass.name(),
        if changed { "changed" } else { "unchanged" },
        graph.pins().len(),
        graph.pin_nodes().len(),
        graph.top().len()
    );
    Ok(changed)
}
