//! Build-plan construction: walk every file reachable from a stack,
//! resolve the effective compiler and flags through the four-scope
//! override ladder, merge duplicate paths and collect conflicts.
//!
//! Ladder order, most specific first: file override, file set default
//! builder, software view command, hardware view command. The first
//! scope with a non-empty command supplies the compiler; flags accumulate
//! across defining scopes until one marked replace ends the walk.

use std::collections::BTreeMap;

use tracing::debug;

use crate::model::{BuildCommand, Design, FileRecord, FileSet, ViewBuild};
use crate::stacks::Stack;

/// One file after full override resolution, ready for generation.
#[derive(Debug, Clone)]
pub struct ObjectUnit {
    pub path: String,
    pub file_name: String,
    pub compiler: String,
    pub flags: String,
    pub include: bool,
}

/// Same-path units whose resolved settings disagree. Never fatal; kept
/// for the caller to report.
#[derive(Debug, Clone)]
pub struct ConflictGroup {
    pub path: String,
    pub units: Vec<ObjectUnit>,
}

/// The resolved build of one stack.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub name: String,
    /// Deduplicated units in discovery order: hardware files first, then
    /// each software node in stack order, file order within a set.
    pub objects: Vec<ObjectUnit>,
    /// The hardware view's own command, used to link the executable.
    pub linker: String,
    pub link_flags: String,
    /// Flag strings of every software view that declares a builder for
    /// some planned file's type, first-use order, deduplicated. They
    /// reach the link line even when a more specific replace keeps them
    /// off the file's own compile rule.
    pub sw_view_flags: Vec<String>,
    pub conflicts: Vec<ConflictGroup>,
}

/// The command is taken from the first scope whose command string is
/// non-empty; scopes with no builder are skipped.
fn resolve_command(scopes: &[Option<&BuildCommand>; 4]) -> String {
    scopes
        .iter()
        .flatten()
        .find(|b| b.has_command())
        .map(|b| b.command.trim().to_string())
        .unwrap_or_default()
}

/// Folds flag strings over the ladder into one whitespace-normalized
/// accumulator; a scope marked replace ends the walk after contributing.
fn fold_flags(scopes: &[Option<&BuildCommand>; 4]) -> String {
    let mut acc: Vec<&str> = Vec::new();
    for scope in scopes.iter().flatten() {
        acc.extend(scope.flags.split_whitespace());
        if scope.replace {
            break;
        }
    }
    acc.join(" ")
}

fn normalize_flags(flags: &str) -> String {
    flags.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Order-insensitive flag comparison: `-lrt -pthread` and
/// `-pthread -lrt` are the same settings.
fn same_settings(a: &ObjectUnit, b: &ObjectUnit) -> bool {
    a.compiler == b.compiler && a.include == b.include && flag_tokens(&a.flags) == flag_tokens(&b.flags)
}

fn flag_tokens(flags: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = flags.split_whitespace().collect();
    tokens.sort_unstable();
    tokens
}

fn resolve_unit(
    file: &FileRecord,
    set: &FileSet,
    sw_view: Option<&ViewBuild>,
    hw_view: Option<&ViewBuild>,
    force_include: bool,
    sw_view_flags: &mut Vec<String>,
) -> Option<ObjectUnit> {
    let sw_build = sw_view.and_then(|v| v.builder_for(&file.file_type));
    let scopes: [Option<&BuildCommand>; 4] = [
        file.build.as_ref(),
        set.builder_for(&file.file_type),
        sw_build,
        hw_view.and_then(|v| v.builder_for(&file.file_type)),
    ];

    let include = file.include || force_include;
    let compiler = resolve_command(&scopes);
    if compiler.is_empty() && !include {
        debug!(path = %file.path, file_type = %file.file_type, "no compiler resolves, dropping file");
        return None;
    }

    // The view's flags belong to the executable whenever the view speaks
    // for this file's type, even if a more specific replace keeps them
    // out of the per-file fold.
    if let Some(build) = sw_build {
        let used = normalize_flags(&build.flags);
        if !used.is_empty() && !sw_view_flags.contains(&used) {
            sw_view_flags.push(used);
        }
    }

    let flags = fold_flags(&scopes);

    Some(ObjectUnit {
        path: file.path.clone(),
        file_name: file.file_name().to_string(),
        compiler,
        flags,
        include,
    })
}

/// Resolves one stack into a build plan. Returns `None` when the stack
/// yields no units at all; such a stack produces no output location.
pub fn build_plan(design: &Design, stack: &Stack) -> Option<BuildPlan> {
    let hw = design.hw(stack.hardware);
    let hw_view = hw.view.as_ref();

    let mut discovered: Vec<ObjectUnit> = Vec::new();
    let mut sw_view_flags: Vec<String> = Vec::new();

    // Stack node order puts the hardware anchor first, so its own files
    // are discovered before any software node's.
    for set in &hw.filesets {
        for file in &set.files {
            if let Some(unit) = resolve_unit(file, set, None, hw_view, false, &mut sw_view_flags) {
                discovered.push(unit);
            }
        }
    }
    for set in &hw.header_sets {
        for file in &set.files {
            if let Some(unit) = resolve_unit(file, set, None, hw_view, true, &mut sw_view_flags) {
                discovered.push(unit);
            }
        }
    }
    for &sw_id in &stack.software {
        let node = design.sw(sw_id);
        for set in &node.filesets {
            for file in &set.files {
                if let Some(unit) =
                    resolve_unit(file, set, node.view.as_ref(), hw_view, false, &mut sw_view_flags)
                {
                    discovered.push(unit);
                }
            }
        }
    }

    if discovered.is_empty() {
        debug!(stack = %stack.name, "stack yields no units, skipping");
        return None;
    }

    // Group by path, keeping the first discovery of each path as the
    // representative so generation stays deterministic.
    let mut order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, Vec<ObjectUnit>> = BTreeMap::new();
    for unit in discovered {
        if !groups.contains_key(&unit.path) {
            order.push(unit.path.clone());
        }
        groups.entry(unit.path.clone()).or_default().push(unit);
    }

    let mut objects = Vec::new();
    let mut conflicts = Vec::new();
    for path in order {
        let units = groups.remove(&path).expect("grouped above");
        let first = units[0].clone();
        if units.len() > 1 && units.iter().any(|u| !same_settings(u, &first)) {
            conflicts.push(ConflictGroup { path, units });
        }
        objects.push(first);
    }

    let link = hw_view
        .and_then(|v| v.builders.first())
        .map(|b| b.build.clone())
        .unwrap_or_default();

    Some(BuildPlan {
        name: stack.name.clone(),
        objects,
        linker: link.command.trim().to_string(),
        link_flags: normalize_flags(&link.flags),
        sw_view_flags,
        conflicts,
    })
}

/// Resolves every stack, dropping those with nothing to build.
pub fn build_plans(design: &Design, stacks: &[Stack]) -> Vec<BuildPlan> {
    stacks
        .iter()
        .filter_map(|stack| build_plan(design, stack))
        .collect()
}
