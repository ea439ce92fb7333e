/**
 * Content Routes
 * Shared handlers for services, slider and works: public reads, multipart writes for admins
 */
use axum::{extract::State, http::StatusCode, response::Response, Json};

use crate::auth::AdminSession;
use crate::db::models::Record;
use crate::error::Result;
use crate::routes::extract::{FormData, PathParam, QueryParams};
use crate::routes::{read_form, respond, respond_deleted, IdQuery};
use crate::services::content;
use crate::state::AppState;

pub async fn list<R: Record>(State(state): State<AppState>) -> Result<Json<Vec<R>>> {
    Ok(Json(content::list::<R>(&state).await?))
}

pub async fn get_one<R: Record>(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> Result<Json<R>> {
    Ok(Json(content::get::<R>(&state, id).await?))
}

pub async fn create<R: Record>(
    State(state): State<AppState>,
    AdminSession(actor): AdminSession,
    FormData(multipart): FormData,
) -> Result<Response> {
    let input = read_form(multipart, state.uploads.max_bytes()).await?;
    let outcome = content::create::<R>(&state, &actor, input).await?;
    Ok(respond(StatusCode::CREATED, outcome))
}

pub async fn update<R: Record>(
    State(state): State<AppState>,
    AdminSession(actor): AdminSession,
    QueryParams(query): QueryParams<IdQuery>,
    FormData(multipart): FormData,
) -> Result<Response> {
    let id = query.require()?;
    let input = read_form(multipart, state.uploads.max_bytes()).await?;
    let outcome = content::update::<R>(&state, &actor, id, input).await?;
    Ok(respond(StatusCode::OK, outcome))
}

pub async fn delete<R: Record>(
    State(state): State<AppState>,
    AdminSession(actor): AdminSession,
    QueryParams(query): QueryParams<IdQuery>,
) -> Result<Response> {
    let id = query.require()?;
    let outcome = content::delete::<R>(&state, &actor, id).await?;
    Ok(respond_deleted(outcome))
}

#[cfg(test)]
mod tests {
    use crate::auth::Identity;
    use crate::routes::test_helpers::{delete, get, json, multipart, send};
    use crate::state::test_support::{jpeg, multipart_body, seed_admin, seed_user, test_state};
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    fn service_form(title: &str, image: Option<&[u8]>) -> Vec<u8> {
        multipart_body(
            &[
                ("title", title),
                ("description", "Bina içi temiz ve pis su tesisatı"),
                ("icon", "fa-faucet"),
            ],
            image.map(|bytes| ("su.jpg", "image/jpeg", bytes)),
        )
    }

    #[tokio::test]
    async fn test_create_service_then_list_newest_first() {
        let (state, _temp) = test_state().await;
        let (_, token) = seed_admin(&state).await;
        let app = crate::create_app(state);
        let photo = jpeg(2 * 1024 * 1024);

        let older = send(
            app.clone(),
            multipart("POST", "/admin/services", Some(token.as_str()), service_form("Kombi", Some(photo.as_slice()))),
        )
        .await;
        assert_eq!(older.status, StatusCode::CREATED);

        let res = send(
            app.clone(),
            multipart(
                "POST",
                "/admin/services",
                Some(token.as_str()),
                service_form("Su Tesisatı", Some(photo.as_slice())),
            ),
        )
        .await;
        assert_eq!(res.status, StatusCode::CREATED);
        assert_eq!(res.body["title"], "Su Tesisatı");
        assert_eq!(res.body["icon"], "fa-faucet");
        assert!(res.body["image"].as_str().unwrap().starts_with("/uploads/"));
        assert!(res.body["createdAt"].is_string());
        let id = res.body["id"].as_i64().unwrap();

        let listed = send(app.clone(), get("/admin/services", None)).await;
        assert_eq!(listed.status, StatusCode::OK);
        assert_eq!(listed.body[0]["id"].as_i64(), Some(id));
        assert_eq!(listed.body.as_array().unwrap().len(), 2);

        let one = send(app, get(&format!("/admin/services/{id}"), None)).await;
        assert_eq!(one.status, StatusCode::OK);
        assert_eq!(one.body, res.body);
    }

    #[tokio::test]
    async fn test_create_requires_session() {
        let (state, _temp) = test_state().await;
        let app = crate::create_app(state);

        let res = send(
            app.clone(),
            multipart("POST", "/admin/services", None, service_form("x", Some(jpeg(16).as_slice()))),
        )
        .await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["error"], "Authorization required");

        let listed = send(app, get("/admin/services", None)).await;
        assert_eq!(listed.body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_deleted_admin_token_cannot_write() {
        let (state, _temp) = test_state().await;
        let (_, token) = seed_admin(&state).await;
        let kalfa = seed_user(&state, "Kalfa", "kalfa@example.com").await;
        let kalfa_token = state.tokens.issue(&Identity::from(&kalfa)).unwrap();
        let app = crate::create_app(state);

        let removed = send(
            app.clone(),
            delete(&format!("/admin/users?id={}", kalfa.id), Some(token.as_str())),
        )
        .await;
        assert_eq!(removed.status, StatusCode::OK);

        let body = multipart_body(&[], Some(("a.jpg", "image/jpeg", jpeg(16).as_slice())));
        let res = send(app.clone(), multipart("POST", "/admin/works", Some(kalfa_token.as_str()), body)).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["error"], "Authorization required");

        let listed = send(app, get("/admin/works", None)).await;
        assert_eq!(listed.body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_malformed_requests_get_error_bodies() {
        let (state, _temp) = test_state().await;
        let (_, token) = seed_admin(&state).await;
        let app = crate::create_app(state);

        let bad_path = send(app.clone(), get("/admin/services/abc", None)).await;
        assert_eq!(bad_path.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad_path.body["error"], "Missing or invalid fields");
        assert!(bad_path.body["details"].as_str().unwrap().starts_with("path:"));

        let bad_id = send(app.clone(), delete("/admin/services?id=abc", Some(token.as_str()))).await;
        assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
        assert!(bad_id.body["details"].as_str().unwrap().starts_with("query:"));

        let not_a_form = send(
            app,
            json("POST", "/admin/services", Some(token.as_str()), &json!({"title": "Su"})),
        )
        .await;
        assert_eq!(not_a_form.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            not_a_form.body["error"],
            "Unsupported media type: expected multipart/form-data"
        );
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected_without_row() {
        let (state, _temp) = test_state().await;
        let (_, token) = seed_admin(&state).await;
        let app = crate::create_app(state);

        let body = multipart_body(&[], Some(("buyuk.jpg", "image/jpeg", jpeg(6 * 1024 * 1024).as_slice())));
        let res = send(app.clone(), multipart("POST", "/admin/works", Some(token.as_str()), body)).await;
        assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);

        let listed = send(app, get("/admin/works", None)).await;
        assert_eq!(listed.body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_text_upload_is_unsupported() {
        let (state, _temp) = test_state().await;
        let (_, token) = seed_admin(&state).await;
        let app = crate::create_app(state);

        let body = multipart_body(&[], Some(("notlar.txt", "text/plain", &b"merhaba"[..])));
        let res = send(app, multipart("POST", "/admin/works", Some(token.as_str()), body)).await;
        assert_eq!(res.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_missing_fields_are_listed() {
        let (state, _temp) = test_state().await;
        let (_, token) = seed_admin(&state).await;
        let app = crate::create_app(state);

        let body = multipart_body(&[("title", "Kampanya")], None);
        let res = send(app, multipart("POST", "/admin/slider", Some(token.as_str()), body)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        let details = res.body["details"].as_str().unwrap();
        assert!(details.contains("description"));
        assert!(details.contains("file"));
    }

    #[tokio::test]
    async fn test_update_and_delete_by_query_id() {
        let (state, _temp) = test_state().await;
        let (_, token) = seed_admin(&state).await;
        let app = crate::create_app(state);

        let created = send(
            app.clone(),
            multipart(
                "POST",
                "/admin/slider",
                Some(token.as_str()),
                multipart_body(
                    &[("title", "Yaz"), ("description", "Klima")],
                    Some(("yaz.png", "image/png", jpeg(32).as_slice())),
                ),
            ),
        )
        .await;
        let id = created.body["id"].as_i64().unwrap();

        let updated = send(
            app.clone(),
            multipart(
                "PUT",
                &format!("/admin/slider?id={id}"),
                Some(token.as_str()),
                multipart_body(&[("title", "Kış"), ("description", "Kombi")], None),
            ),
        )
        .await;
        assert_eq!(updated.status, StatusCode::OK);
        assert_eq!(updated.body["title"], "Kış");
        assert_eq!(updated.body["image"], created.body["image"]);

        let missing_id = send(app.clone(), delete("/admin/slider", Some(token.as_str()))).await;
        assert_eq!(missing_id.status, StatusCode::BAD_REQUEST);

        let deleted = send(app.clone(), delete(&format!("/admin/slider?id={id}"), Some(token.as_str()))).await;
        assert_eq!(deleted.status, StatusCode::OK);
        assert_eq!(deleted.body["success"], true);

        let gone = send(app, get(&format!("/admin/slider/{id}"), None)).await;
        assert_eq!(gone.status, StatusCode::NOT_FOUND);
        assert_eq!(gone.body["error"], "Slide not found");
    }

    #[tokio::test]
    async fn test_delete_work_with_missing_blob_succeeds() {
        let (state, _temp) = test_state().await;
        let (_, token) = seed_admin(&state).await;
        let uploads = state.uploads.root().to_path_buf();
        let app = crate::create_app(state);

        let created = send(
            app.clone(),
            multipart(
                "POST",
                "/admin/works",
                Some(token.as_str()),
                multipart_body(&[], Some(("is.jpg", "image/jpeg", jpeg(64).as_slice()))),
            ),
        )
        .await;
        assert_eq!(created.status, StatusCode::CREATED);
        let id = created.body["id"].as_i64().unwrap();
        let url = created.body["image"].as_str().unwrap();
        std::fs::remove_file(uploads.join(url.trim_start_matches("/uploads/"))).unwrap();

        let res = send(app.clone(), delete(&format!("/admin/works?id={id}"), Some(token.as_str()))).await;
        assert_eq!(res.status, StatusCode::OK);

        let gone = send(app, get(&format!("/admin/works/{id}"), None)).await;
        assert_eq!(gone.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_uploaded_image_is_served() {
        let (state, _temp) = test_state().await;
        let (_, token) = seed_admin(&state).await;
        let app = crate::create_app(state);

        let created = send(
            app.clone(),
            multipart(
                "POST",
                "/admin/works",
                Some(token.as_str()),
                multipart_body(&[], Some(("is.jpg", "image/jpeg", jpeg(64).as_slice()))),
            ),
        )
        .await;
        let url = created.body["image"].as_str().unwrap().to_string();

        let res = app.oneshot(get(&url, None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
