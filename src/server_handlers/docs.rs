use actix_web::{HttpResponse, Responder};
use serde_json::json;

use crate::api_json::{ConstraintsInput, CourseInput, SolveRequest};
use crate::models::SectionRecord;

fn section(group: u32, schedule: &str, enrolled: &str, status: &str) -> SectionRecord {
    SectionRecord {
        group,
        schedule: schedule.to_string(),
        enrolled: enrolled.to_string(),
        status: status.to_string(),
    }
}

pub async fn help_handler() -> impl Responder {
    let example = SolveRequest {
        courses: vec![
            CourseInput {
                code: "MATH101".to_string(),
                name: Some("Calculus I".to_string()),
                sections: vec![
                    section(1, "MW 09:00 AM - 10:30 AM", "25/30", "OK"),
                    section(2, "TTh 01:00 PM - 02:30 PM", "30/30", "FULL"),
                ],
            },
            CourseInput {
                code: "PHYS201".to_string(),
                name: None,
                sections: vec![section(1, "MW 10:30 AM - 12:00 PM", "12/40", "OK")],
            },
        ],
        constraints: Some(ConstraintsInput {
            earliest_start: Some("08:00".to_string()),
            latest_end: Some("18:00".to_string()),
            allow_full: Some(false),
            allow_at_risk: Some(true),
            max_schedules: Some(10),
            max_full_per_schedule: Some(0),
        }),
        trace: false,
        verify: true,
        ..Default::default()
    };

    let help = json!({
        "description": "API para generar horarios sin topes. POST /solve acepta ramos en línea (ver 'post_example'), un 'dataset' del directorio de datafiles o un problema sintético 'generate'. GET /solve acepta los mismos parámetros simples en query.",
        "post_example": example,
        "get_example_query": "/solve?generate=small_loose&seed=42&max_schedules=5&verify=true&report=true",
        "generate_example_query": "/generate?config=medium_tight&seed=7",
        "schedule_format": "<días> HH:MM AM - HH:MM PM, días en {M,T,W,Th,F,S,Su} (ej. 'TTh 01:00 PM - 03:00 PM')",
        "note": "Las secciones contiguas (una termina cuando la otra empieza) no cuentan como tope. Los campos ausentes de 'constraints' toman los valores por defecto del servidor. Una búsqueda que supera QUICKSLOT_SEARCH_TIMEOUT_MS se cancela y responde 504.",
        "endpoints": ["POST /solve", "GET /solve", "GET /generate", "GET /datafiles", "GET /help"]
    });

    HttpResponse::Ok().json(help)
}
