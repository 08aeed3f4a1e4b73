//! `hast members`: lists the members of a design with their resolved
//! invocation configuration.

use std::fmt::Write;
use std::path::Path;

use hast_common::Interner;
use hast_config::{resolve_member, ProjectConfig};
use hast_ir::Design;

use crate::pipeline::{load_design, load_project_config};
use crate::{GlobalArgs, MembersArgs};

/// Runs the `hast members` command.
pub fn run(args: &MembersArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_project_config(global)?;
    let (design, interner) = load_design(Path::new(&args.design))?;
    print!("{}", member_table(&design, &config, &interner));
    if !global.quiet {
        eprintln!("   {} member(s)", design.methods.len());
    }
    Ok(0)
}

fn member_table(design: &Design, config: &ProjectConfig, interner: &Interner) -> String {
    let mut out = String::new();
    for method in design.methods.values() {
        let name = interner.resolve(method.name);
        let resolved = resolve_member(config, name);
        let _ = write!(
            out,
            "{name} ({} parameter(s)) parallelism {} recursion {} instances {}",
            method.params.len(),
            resolved.max_degree_of_parallelism,
            resolved.max_recursion_depth,
            resolved.max_invocation_instance_count()
        );
        if let Some(prefix) = &resolved.matched_prefix {
            let _ = write!(out, " [members.\"{prefix}\"]");
        }
        out.push('\n');
        for target in design.invoked_members(method) {
            let _ = writeln!(out, "    invokes {}", interner.resolve(target));
        }
    }
    out
}
