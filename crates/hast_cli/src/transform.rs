//! `hast transform`: lowers every selected member of a design file and
//! reports the generated state machines.

use std::fmt::Write;
use std::path::Path;

use hast_common::Interner;
use hast_config::OutputFormat;
use hast_diagnostics::{Diagnostic, DiagnosticSink};
use hast_fsm::{transform_design, Printer, TransformedDesign, TransformedMember};

use crate::pipeline::{count_by_severity, load_design, load_project_config, render_diagnostics};
use crate::{GlobalArgs, ReportFormat, TransformArgs};

/// Runs the `hast transform` command.
///
/// Returns exit code 0 if no errors, 1 if there are errors.
pub fn run(args: &TransformArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_project_config(global)?;
    let (design, interner) = load_design(Path::new(&args.design))?;
    let format = args.format.unwrap_or(match config.output.format {
        OutputFormat::Text => ReportFormat::Text,
        OutputFormat::Json => ReportFormat::Json,
    });

    if !global.quiet && format != ReportFormat::Json {
        eprintln!(
            "   Transforming {} v{} ({} members)",
            config.project.name,
            config.project.version,
            design.methods.len()
        );
    }

    let sink = DiagnosticSink::new();
    let result = transform_design(&design, &config, &interner, &sink);
    let selected = select(&result, args.member.as_deref(), &interner);
    let diagnostics = sink.diagnostics();

    match format {
        ReportFormat::Text => {
            print!("{}", listing(&selected, &interner));
            render_diagnostics(&diagnostics, false, global.color);
        }
        ReportFormat::Summary => {
            print!("{}", summary(&selected, &result, &interner));
            render_diagnostics(&diagnostics, false, global.color);
        }
        ReportFormat::Json => {
            let report = json_report(&selected, &result, &interner, &diagnostics);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    let (errors, warnings) = count_by_severity(&diagnostics);
    if !global.quiet && format != ReportFormat::Json {
        eprintln!("   Result: {errors} error(s), {warnings} warning(s)");
    }

    if sink.has_errors() {
        Ok(1)
    } else {
        Ok(0)
    }
}

/// Transformed members whose name starts with `prefix`, or all of them.
fn select<'r>(
    result: &'r TransformedDesign,
    prefix: Option<&str>,
    interner: &Interner,
) -> Vec<&'r TransformedMember> {
    result
        .members
        .iter()
        .filter(|m| prefix.map_or(true, |p| interner.resolve(m.name).starts_with(p)))
        .collect()
}

fn estimated_cycles(member: &TransformedMember) -> f64 {
    member
        .machine
        .states()
        .iter()
        .map(|s| s.required_clock_cycles)
        .sum()
}

fn listing(members: &[&TransformedMember], interner: &Interner) -> String {
    let printer = Printer::new(interner);
    let mut out = String::new();
    for member in members {
        out.push_str(&printer.print_machine(&member.machine));
        out.push('\n');
    }
    out
}

fn summary(members: &[&TransformedMember], result: &TransformedDesign, interner: &Interner) -> String {
    let mut out = String::new();
    for member in members {
        let _ = writeln!(
            out,
            "{}: {} states, ~{:.1} cycles of logic",
            interner.resolve(member.name),
            member.machine.state_count(),
            estimated_cycles(member)
        );
        for (target, count) in result.graph.targets_of(member.name) {
            let _ = writeln!(out, "    invokes {} x{count}", interner.resolve(target));
        }
        let required = result.graph.required_instance_count(member.name);
        if required > 0 {
            let _ = writeln!(out, "    instances required: {required}");
        }
    }
    out
}

fn json_report(
    members: &[&TransformedMember],
    result: &TransformedDesign,
    interner: &Interner,
    diagnostics: &[Diagnostic],
) -> serde_json::Value {
    let members: Vec<serde_json::Value> = members
        .iter()
        .map(|member| {
            let invokes: Vec<serde_json::Value> = result
                .graph
                .targets_of(member.name)
                .into_iter()
                .map(|(target, count)| {
                    serde_json::json!({
                        "target": interner.resolve(target),
                        "instances": count,
                    })
                })
                .collect();
            serde_json::json!({
                "name": interner.resolve(member.name),
                "states": member.machine.state_count(),
                "clock_cycles": estimated_cycles(member),
                "invokes": invokes,
                "required_instances": result.graph.required_instance_count(member.name),
            })
        })
        .collect();
    serde_json::json!({
        "members": members,
        "diagnostics": diagnostics,
    })
}
