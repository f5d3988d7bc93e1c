use actix_web::{web, HttpResponse};
use scratchdb::{Engine, ScratchDbError};

/// Configure all routes. The fixed paths must be registered before the
/// generic `{collection}` routes so they are not captured as
/// collection names.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/collections", web::get().to(list_collections))
        .route("/api/update-database", web::post().to(merge_structure))
        .route("/{collection}", web::get().to(get_all))
        .route("/{collection}", web::post().to(create))
        .route("/{collection}/{id}", web::get().to(get_one))
        .route("/{collection}/{id}", web::put().to(update))
        .route("/{collection}/{id}", web::delete().to(delete));
}

// ── Helpers ─────────────────────────────────────────────────────────

fn ok_json(value: impl serde::Serialize) -> HttpResponse {
    HttpResponse::Ok().json(value)
}

fn created_json(value: impl serde::Serialize) -> HttpResponse {
    HttpResponse::Created().json(value)
}

/// Map the error taxonomy onto the status-code contract: 400 for bad
/// bodies, 404 for unknown collections/items, 409 for id conflicts,
/// 500 for everything else. Every body carries the machine-readable
/// category plus a human-readable message.
fn err_response(e: ScratchDbError) -> HttpResponse {
    let body = serde_json::json!({
        "error": e.category(),
        "message": e.to_string(),
    });
    match &e {
        ScratchDbError::InvalidBody(_) => HttpResponse::BadRequest().json(body),
        ScratchDbError::CollectionNotFound { .. } | ScratchDbError::ItemNotFound { .. } => {
            HttpResponse::NotFound().json(body)
        }
        ScratchDbError::IdConflict { .. } => HttpResponse::Conflict().json(body),
        _ => {
            log::error!("Internal error: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": e.category(),
                "message": "Internal server error",
            }))
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

async fn health() -> HttpResponse {
    ok_json(serde_json::json!({ "status": "ok" }))
}

async fn list_collections(engine: web::Data<Engine>) -> HttpResponse {
    match engine.list_collections() {
        Ok(summaries) => ok_json(summaries),
        Err(e) => err_response(e),
    }
}

async fn get_all(engine: web::Data<Engine>, path: web::Path<String>) -> HttpResponse {
    match engine.get_all(&path) {
        Ok(contents) => ok_json(contents),
        Err(e) => err_response(e),
    }
}

async fn get_one(
    engine: web::Data<Engine>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (collection, id) = path.into_inner();
    match engine.get_one(&collection, &id) {
        Ok(item) => ok_json(item),
        Err(e) => err_response(e),
    }
}

async fn create(
    engine: web::Data<Engine>,
    path: web::Path<String>,
    body: web::Json<serde_json::Value>,
) -> HttpResponse {
    match engine.create(&path, body.into_inner()) {
        Ok(item) => created_json(item),
        Err(e) => err_response(e),
    }
}

async fn update(
    engine: web::Data<Engine>,
    path: web::Path<(String, String)>,
    body: web::Json<serde_json::Value>,
) -> HttpResponse {
    let (collection, id) = path.into_inner();
    match engine.update(&collection, &id, body.into_inner()) {
        Ok(item) => ok_json(item),
        Err(e) => err_response(e),
    }
}

async fn delete(
    engine: web::Data<Engine>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (collection, id) = path.into_inner();
    match engine.delete(&collection, &id) {
        Ok(receipt) => ok_json(receipt),
        Err(e) => err_response(e),
    }
}

async fn merge_structure(
    engine: web::Data<Engine>,
    body: web::Json<serde_json::Value>,
) -> HttpResponse {
    match engine.merge_structure(body.into_inner()) {
        Ok(report) => ok_json(report),
        Err(e) => err_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use tempfile::TempDir;

    fn setup() -> (TempDir, web::Data<Engine>) {
        let tmp = TempDir::new().unwrap();
        let engine = web::Data::new(Engine::open(tmp.path().join("db.json")));
        (tmp, engine)
    }

    macro_rules! test_app {
        ($engine:expr) => {
            test::init_service(App::new().app_data($engine.clone()).configure(configure)).await
        };
    }

    #[actix_web::test]
    async fn test_create_returns_201_with_item() {
        let (_tmp, engine) = setup();
        let app = test_app!(engine);

        let req = test::TestRequest::post()
            .uri("/widgets")
            .set_json(serde_json::json!({"name": "A"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["id"], 1);
        assert_eq!(body["name"], "A");
        assert!(body["createdAt"].is_string());
    }

    #[actix_web::test]
    async fn test_get_all_auto_creates() {
        let (_tmp, engine) = setup();
        let app = test_app!(engine);

        let req = test::TestRequest::get().uri("/widgets").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["collection"], "widgets");
        assert_eq!(body["count"], 0);
    }

    #[actix_web::test]
    async fn test_missing_item_is_404_with_category() {
        let (_tmp, engine) = setup();
        let app = test_app!(engine);

        let req = test::TestRequest::get().uri("/widgets").to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/widgets/9").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "ItemNotFound");
        assert!(body["message"].is_string());
    }

    #[actix_web::test]
    async fn test_missing_collection_is_404() {
        let (_tmp, engine) = setup();
        let app = test_app!(engine);

        let req = test::TestRequest::get().uri("/widgets/1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "CollectionNotFound");
    }

    #[actix_web::test]
    async fn test_invalid_body_is_400() {
        let (_tmp, engine) = setup();
        let app = test_app!(engine);

        let req = test::TestRequest::post()
            .uri("/widgets")
            .set_json(serde_json::json!(["not", "an", "object"]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "InvalidBody");
    }

    #[actix_web::test]
    async fn test_id_conflict_is_409() {
        let (_tmp, engine) = setup();
        let app = test_app!(engine);

        let req = test::TestRequest::post()
            .uri("/widgets")
            .set_json(serde_json::json!({"id": 5}))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/widgets")
            .set_json(serde_json::json!({"id": 5}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 409);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "IdConflict");
    }

    #[actix_web::test]
    async fn test_update_delete_flow() {
        let (_tmp, engine) = setup();
        let app = test_app!(engine);

        let req = test::TestRequest::post()
            .uri("/widgets")
            .set_json(serde_json::json!({"name": "A"}))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::put()
            .uri("/widgets/1")
            .set_json(serde_json::json!({"name": "B"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["name"], "B");

        let req = test::TestRequest::delete().uri("/widgets/1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["deletedId"], 1);
    }

    #[actix_web::test]
    async fn test_merge_structure_route() {
        let (_tmp, engine) = setup();
        let app = test_app!(engine);

        let req = test::TestRequest::post()
            .uri("/api/update-database")
            .set_json(serde_json::json!({"orders": []}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["added"], serde_json::json!(["orders"]));
    }

    #[actix_web::test]
    async fn test_collections_listing() {
        let (_tmp, engine) = setup();
        let app = test_app!(engine);

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(serde_json::json!({"name": "Alice"}))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/collections").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, serde_json::json!([{"name": "users", "count": 1}]));
    }

    #[actix_web::test]
    async fn test_health() {
        let (_tmp, engine) = setup();
        let app = test_app!(engine);
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }
}
