use actix_web::{HttpResponse, Responder};
use serde_json::json;

use crate::datafiles::{datafiles_dir, list_datafiles_in};

/// GET /datafiles
/// Lista los archivos de oferta disponibles y su formato detectado.
pub async fn datafiles_list_handler() -> impl Responder {
    let dir = datafiles_dir();
    if !dir.is_dir() {
        return HttpResponse::Ok().json(json!({"dir": dir.to_string_lossy(), "files": []}));
    }
    let listing = {
        let dir = dir.clone();
        tokio::task::spawn_blocking(move || list_datafiles_in(&dir)).await
    };
    match listing {
        Ok(Ok(files)) => HttpResponse::Ok().json(json!({"dir": dir.to_string_lossy(), "files": files})),
        Ok(Err(e)) => HttpResponse::InternalServerError().json(json!({"error": format!("failed to list datafiles: {}", e)})),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("task join error: {}", e)})),
    }
}
