// report.rs - Tablas de texto plano para resultados y verificación.
use crate::algorithm::parsing::minutes_to_12h;
use crate::algorithm::stats::SearchStatistics;
use crate::algorithm::verify::{VerificationReport, VerificationStatus};
use crate::models::{Constraints, GeneratedSchedule};

fn yes_no(b: bool) -> &'static str {
    if b { "Yes" } else { "No" }
}

/// Resumen de una búsqueda: tamaño, soluciones, tiempo y contadores.
pub fn format_results_summary(
    results: &[GeneratedSchedule],
    stats: &SearchStatistics,
    problem_size: usize,
) -> String {
    let mut lines = Vec::new();
    lines.push(String::new());
    lines.push("=".repeat(60));
    lines.push("RESULTS SUMMARY".to_string());
    lines.push("=".repeat(60));
    lines.push(format!("{:<30} {} courses", "Problem Size", problem_size));
    lines.push(format!("{:<30} {}", "Solutions Found", results.len()));
    lines.push(format!("{:<30} {:.2} ms", "Runtime", stats.duration_ms()));
    lines.push(format!("{:<30} {}", "Nodes Visited", stats.nodes_visited));
    lines.push(format!(
        "{:<30} {} conflict / {} viability / {} full limit",
        "Pruned", stats.pruned_by_conflict, stats.pruned_by_viability, stats.pruned_by_full_limit
    ));
    if !results.is_empty() {
        let total: usize = results.iter().map(|r| r.selections.len()).sum();
        lines.push(format!("{:<30} {:.1}", "Avg Courses/Schedule", total as f64 / results.len() as f64));
    }
    lines.push("=".repeat(60));
    lines.push(String::new());
    lines.join("\n")
}

/// Tabla con los primeros `max_display` horarios.
pub fn format_solution_table(results: &[GeneratedSchedule], max_display: usize) -> String {
    if results.is_empty() {
        return "No solutions found".to_string();
    }
    let shown = results.len().min(max_display);
    let mut lines = Vec::new();
    lines.push(String::new());
    lines.push("=".repeat(80));
    lines.push(format!("SOLUTIONS (showing {} of {})", shown, results.len()));
    lines.push("=".repeat(80));
    lines.push(format!(
        "{:<12} {:<10} {:<15} {:<15} {:<15}",
        "Schedule #", "Courses", "Full Sections", "Ends By Pref", "Latest End"
    ));
    lines.push("-".repeat(80));
    for (i, sched) in results.iter().take(max_display).enumerate() {
        let latest = if sched.selections.is_empty() {
            "-".to_string()
        } else {
            minutes_to_12h(sched.meta.latest_end_minute)
        };
        lines.push(format!(
            "{:<12} {:<10} {:<15} {:<15} {:<15}",
            i + 1,
            sched.selections.len(),
            sched.meta.full_count,
            yes_no(sched.meta.ends_by_preferred),
            latest
        ));
        let groups: Vec<String> = sched
            .selections
            .iter()
            .map(|s| format!("G{} {}", s.group(), s.schedule()))
            .collect();
        if !groups.is_empty() {
            lines.push(format!("{:<12} {}", "", groups.join(" | ")));
        }
    }
    lines.push("=".repeat(80));
    lines.push(String::new());
    lines.join("\n")
}

fn status_label(status: VerificationStatus) -> &'static str {
    match status {
        VerificationStatus::Feasible => "FEASIBLE",
        VerificationStatus::Infeasible => "INFEASIBLE",
        VerificationStatus::Unknown => "UNKNOWN",
    }
}

/// Compara lo que encontró el backtracking con el veredicto del verificador.
pub fn format_verification_comparison(
    results: &[GeneratedSchedule],
    stats: &SearchStatistics,
    report: &VerificationReport,
    constraints: &Constraints,
) -> String {
    let bt_feasible = !results.is_empty();
    let bt_status = if bt_feasible { "FEASIBLE" } else { "INFEASIBLE" };
    let marker = match report.agrees_with_search(bt_feasible, constraints) {
        Some(true) => "OK",
        Some(false) => "MISMATCH",
        None => "?",
    };

    let mut lines = Vec::new();
    lines.push(String::new());
    lines.push("=".repeat(80));
    lines.push("ALGORITHM VERIFICATION COMPARISON".to_string());
    lines.push("=".repeat(80));
    lines.push(format!("{:<25} {:<25} {:<25}", "Metric", "Backtracking", "Verifier"));
    lines.push("-".repeat(80));
    lines.push(format!(
        "{:<25} {:<25} {:<25}",
        "Runtime",
        format!("{:.2} ms", stats.duration_ms()),
        format!("{:.2} ms", report.runtime_ms)
    ));
    lines.push(format!(
        "{:<25} {:<25} {:<25} {}",
        "Feasible",
        yes_no(bt_feasible),
        yes_no(report.feasible),
        marker
    ));
    lines.push(format!(
        "{:<25} {:<25} {:<25}",
        "Solutions Found",
        results.len(),
        if report.feasible { 1 } else { 0 }
    ));
    lines.push(format!("{:<25} {:<25} {:<25}", "Status", bt_status, status_label(report.status)));
    lines.push("=".repeat(80));
    lines.push(String::new());
    lines.join("\n")
}
