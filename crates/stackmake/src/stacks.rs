//! Stack resolution: decide which software nodes are compiled together
//! into one executable image, and in what order.
//!
//! A root is a software node no other node depends on. Every root starts
//! one stack: its mapped hardware node first, then the root, then each
//! provider reachable over dependency edges, each node consumed at most
//! once across the whole pass. Cycles with no root never surface as a
//! stack.

use std::collections::BTreeSet;

use tracing::debug;

use crate::model::{Design, HwId, SwId};

/// One executable image: a hardware anchor plus the software nodes
/// linked into it, root first, then traversal order.
#[derive(Debug, Clone)]
pub struct Stack {
    pub name: String,
    pub hardware: HwId,
    pub software: Vec<SwId>,
}

/// Resolves all stacks of a design. Roots are taken in declaration order,
/// which makes the output deterministic for a given design.
pub fn resolve(design: &Design) -> Vec<Stack> {
    let in_deg = design.in_degrees();

    // Shared across roots: once any traversal has consumed a node, no
    // later traversal may pick it up again.
    let mut visited: BTreeSet<SwId> = BTreeSet::new();
    let mut stacks = Vec::new();

    for (idx, node) in design.software.iter().enumerate() {
        let root = SwId(idx);
        if in_deg[idx] > 0 || visited.contains(&root) {
            continue;
        }

        let Some(hw_id) = node.hardware else {
            debug!(instance = %node.instance, "root has no hardware mapping, skipping");
            continue;
        };
        if design.hw(hw_id).view.is_none() {
            debug!(
                instance = %node.instance,
                hardware = %design.hw(hw_id).instance,
                "mapped hardware has no build view, skipping stack"
            );
            continue;
        }

        let software = traverse(design, root, &mut visited);
        if software.is_empty() {
            continue;
        }

        debug!(
            root = %node.instance,
            members = software.len(),
            "resolved stack"
        );
        stacks.push(Stack {
            name: node.instance.clone(),
            hardware: hw_id,
            software,
        });
    }

    stacks
}

/// Iterative depth-first walk over outgoing dependency edges. An already
/// visited node ends the descent silently; this is what makes cycles
/// below a valid root harmless.
fn traverse(design: &Design, root: SwId, visited: &mut BTreeSet<SwId>) -> Vec<SwId> {
    let mut members = Vec::new();
    let mut work = vec![root];

    while let Some(id) = work.pop() {
        if !visited.insert(id) {
            continue;
        }
        members.push(id);

        // Children pushed in reverse so the first declared edge is
        // walked first, matching recursive discovery order.
        let providers = design.providers_of(id);
        for &p in providers.iter().rev() {
            if !visited.contains(&p) {
                work.push(p);
            }
        }
    }

    members
}
