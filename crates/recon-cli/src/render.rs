//! Plain-text rendering of diffs and plans

use recon_core::{ChangePlan, ReconcileConfig};
use recon_diff::{diff_fields, TypeDiff};
use std::fmt::Write;

pub(crate) fn render_diff(diff: &TypeDiff<'_>) -> String {
    let mut out = String::new();

    for pair in &diff.mutual {
        let Some((old, new)) = pair.both() else {
            continue;
        };
        let fields = diff_fields(old, new);
        let flips: Vec<_> = fields
            .mutual
            .iter()
            .filter_map(|f| f.both())
            .filter_map(|(from, to)| match (from.has_index(), to.has_index()) {
                (true, false) => Some((to, "index dropped")),
                (false, true) => Some((to, "index added")),
                _ => None,
            })
            .collect();
        if flips.is_empty() && fields.added.is_empty() && fields.removed.is_empty() {
            continue;
        }

        let _ = writeln!(out, "~ {}", pair.name());
        for (f, note) in flips {
            let _ = writeln!(out, "    = {}: {} ({note})", f.name(), f.field_type());
        }
        for f in fields.added.iter().filter_map(|p| p.new()) {
            let _ = writeln!(out, "    + {}: {}", f.name(), f.field_type());
        }
        for f in fields.removed.iter().filter_map(|p| p.old()) {
            let _ = writeln!(out, "    - {}: {}", f.name(), f.field_type());
        }
    }
    for name in diff.added_names() {
        let _ = writeln!(out, "+ {name}");
    }
    for name in diff.removed_names() {
        let _ = writeln!(out, "- {name}");
    }

    if out.is_empty() {
        out.push_str("no changes\n");
    }
    out
}

pub(crate) fn render_plan(plan: &ChangePlan, config: &ReconcileConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "concurrency limit {}, dry run {}",
        config.concurrency_limit, config.dry_run
    );
    for phase in plan.phases() {
        let _ = writeln!(out, "[{}] {} operation(s)", phase.phase(), phase.len());
        for unit in phase.units() {
            let _ = writeln!(out, "  {}", unit.collection());
            for op in unit.operations() {
                let _ = writeln!(out, "    {op}");
            }
        }
    }
    out
}
