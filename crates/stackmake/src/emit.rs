//! Makefile emission: renders resolved build plans into build-script
//! text. Pure rendering; every resolution decision was already made by
//! the planner.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::plan::{BuildPlan, ObjectUnit};
use crate::util;

/// Fixed, tool-recognized file name inside each stack directory.
pub const MAKEFILE_NAME: &str = "Makefile";

/// Framework flags every executable and object gets before any resolved
/// flags.
const FIXED_FLAGS: &str = "$(INCLUDES) $(DEBUG_FLAGS) $(PROFILE_FLAGS)";

/// One generated build script, addressed relative to the output base.
#[derive(Debug, Clone)]
pub struct MakefileDoc {
    pub stack: String,
    pub rel_path: PathBuf,
    pub text: String,
}

fn object_name(unit: &ObjectUnit) -> String {
    format!("{}.o", unit.file_name)
}

fn include_dir(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir,
        _ => ".",
    }
}

/// Renders one build plan. Include-file units contribute only include
/// directories; they never appear in the object list.
pub fn render(plan: &BuildPlan) -> String {
    let compiled: Vec<&ObjectUnit> = plan.objects.iter().filter(|u| !u.include).collect();

    let mut out = String::new();

    let names: Vec<String> = compiled.iter().map(|u| object_name(u)).collect();
    out.push_str(&format!("_OBJ= {}\n", names.join(" ")));
    out.push_str("OBJ= $(patsubst %,$(ODIR)/%,$(_OBJ))\n");
    out.push_str("ODIR= obj\n");
    out.push_str(&format!("ENAME= {}\n", plan.name));

    let mut dirs: Vec<&str> = Vec::new();
    for unit in plan.objects.iter().filter(|u| u.include) {
        let dir = include_dir(&unit.path);
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    if dirs.is_empty() {
        out.push_str("INCLUDES=\n");
    } else {
        let incs: Vec<String> = dirs.iter().map(|d| format!("-I{d}")).collect();
        out.push_str(&format!("INCLUDES= {}\n", incs.join(" ")));
    }

    let mut eflags = String::from(FIXED_FLAGS);
    if !plan.link_flags.is_empty() {
        eflags.push(' ');
        eflags.push_str(&plan.link_flags);
    }
    for flags in &plan.sw_view_flags {
        eflags.push(' ');
        eflags.push_str(flags);
    }
    out.push_str(&format!("EFLAGS= {eflags}\n"));
    out.push_str(&format!("EBUILDER= {}\n", plan.linker));

    out.push('\n');
    out.push_str("$(ENAME): $(OBJ)\n");
    out.push_str("\t$(EBUILDER) -o $(ENAME) $(OBJ) $(EFLAGS)\n");

    for unit in compiled {
        let obj = object_name(unit);
        out.push('\n');
        out.push_str(&format!("$(ODIR)/{obj}: {}\n", unit.path));
        let mut rule = format!(
            "\t{} -c -o $(ODIR)/{obj} {} {FIXED_FLAGS}",
            unit.compiler, unit.path
        );
        if !unit.flags.is_empty() {
            rule.push(' ');
            rule.push_str(&unit.flags);
        }
        out.push_str(&rule);
        out.push('\n');
    }

    out
}

/// Renders every plan to its per-stack output location,
/// `sw_<qualifier>/<stack>/Makefile` relative to the output base.
pub fn emit_all(plans: &[BuildPlan], qualifier: &str) -> Vec<MakefileDoc> {
    plans
        .iter()
        .map(|plan| MakefileDoc {
            stack: plan.name.clone(),
            rel_path: PathBuf::from(format!("sw_{qualifier}"))
                .join(&plan.name)
                .join(MAKEFILE_NAME),
            text: render(plan),
        })
        .collect()
}

/// Writes rendered documents under the output base directory.
pub fn write_all(base: &Path, docs: &[MakefileDoc]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(docs.len());
    for doc in docs {
        let path = base.join(&doc.rel_path);
        util::write_text(&path, &doc.text)?;
        info!(stack = %doc.stack, path = %path.display(), "wrote makefile");
        written.push(path);
    }
    Ok(written)
}
