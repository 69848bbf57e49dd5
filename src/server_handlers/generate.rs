use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;

use crate::datafiles::synthetic::{ProblemConfig, generate_problem, problem_stats, validate_problem};

#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    pub config: Option<String>,
    pub seed: Option<u64>,
}

/// GET /generate?config=small_loose&seed=42
/// Devuelve el problema sintético junto con su resumen y validación.
pub async fn generate_handler(query: web::Query<GenerateQuery>) -> impl Responder {
    let q = query.into_inner();
    let spec = match q.config.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => return HttpResponse::BadRequest().json(json!({"error": "config query parameter is required (e.g. small_loose)"})),
    };
    let config: ProblemConfig = match spec.parse() {
        Ok(c) => c,
        Err(e) => return HttpResponse::BadRequest().json(json!({"error": format!("{}", e)})),
    };

    let problem = generate_problem(config, q.seed);
    let stats = problem_stats(&problem.courses);
    let issues = validate_problem(&problem.courses);
    HttpResponse::Ok().json(json!({
        "problem": problem,
        "stats": stats,
        "issues": issues,
    }))
}
