//! List command - show which nodes a run would compile

use super::{build_filter, load_config, node_origin, NodeOrigin, SelectArgs};
use anyhow::Result;
use catalog_check::select_nodes;

/// Print the selected node names, one per line
pub fn run(select: SelectArgs) -> Result<()> {
    let config = load_config(&select)?;
    let settings = &config.settings;
    let filter = build_filter(&select, settings)?;

    let nodes = match node_origin(&select, settings)? {
        NodeOrigin::Directory(source) => select_nodes(&source, &filter)?,
        NodeOrigin::Scenario(scenario) => select_nodes(&scenario, &filter)?,
    };

    for node in nodes {
        println!("{}", node);
    }
    Ok(())
}
