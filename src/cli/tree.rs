//! Tree command - prints category or storage location hierarchies.

use super::{CliContext, to_json};
use crate::{
    core::structural::{self, TreeNode},
    errors::Result,
};
use clap::ValueEnum;
use std::fmt::Write;

/// Which structural tree to print
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKind {
    Categories,
    StorageLocations,
}

fn render(nodes: &[TreeNode], depth: usize, output: &mut String) {
    for node in nodes {
        let _ = writeln!(output, "{}{} (#{})", "  ".repeat(depth), node.name, node.id);
        render(&node.children, depth + 1, output);
    }
}

/// Prints the tree of the given kind.
pub async fn show(ctx: &CliContext, kind: TreeKind) -> Result<String> {
    let tree = match kind {
        TreeKind::Categories => structural::build_tree(&structural::get_all_categories(&ctx.database).await?),
        TreeKind::StorageLocations => {
            structural::build_tree(&structural::get_all_storage_locations(&ctx.database).await?)
        }
    };

    if ctx.json {
        return to_json(&tree);
    }
    let mut output = String::new();
    render(&tree, 0, &mut output);
    Ok(output)
}
