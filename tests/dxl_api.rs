mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};

use common::{setup, setup_with, signed_token, token, TestApp};
use entities::royalty;

async fn create_song(app: &TestApp, token: &str, title: &str) -> String {
    let (status, body) = app
        .dxl(
            Method::POST,
            "songs.create",
            Some(token),
            Some(json!({
                "type": "album",
                "title": title,
                "artist_id": "artist-1",
                "genre": "jazz",
                "tracks": [
                    { "title": "Second", "track_number": 2 },
                    { "title": "First", "track_number": 1, "explicit": "yes" },
                ],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn seed_royalty(app: &TestApp, id: &str, period: &str, user: &str, gross: f64, net: f64) {
    let now = Utc::now();
    royalty::ActiveModel {
        id: Set(id.to_string()),
        period: Set(period.to_string()),
        period_type: Set("monthly".to_string()),
        upc: Set(None),
        isrc: Set(Some("USRC17607839".to_string())),
        track_name: Set("First".to_string()),
        song_title: Set("Notes".to_string()),
        artist_name: Set("Artist".to_string()),
        record_label: Set(None),
        gross_amount_usd: Set(gross),
        deductions_percent: Set(15.0),
        deductions_usd: Set(gross - net),
        net_amount_usd: Set(net),
        user_id: Set(user.to_string()),
        song_id: Set(None),
        track_id: Set(None),
        artist_id: Set(Some("artist-1".to_string())),
        match_status: Set("matched".to_string()),
        payment_status: Set("pending".to_string()),
        paid_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&app.state.connection)
    .await
    .unwrap();
}

#[tokio::test]
async fn missing_action_is_a_system_bad_request() {
    let app = setup().await;
    let response = app
        .send(
            Request::builder()
                .uri("/api/dxl/v3")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.headers["x-api-version"], "3.0.0");
    let body = response.json();
    assert_eq!(body["status"], false);
    assert_eq!(body["info"]["response_module"], "system");
    assert_eq!(body["info"]["module_version"], "3.0.0");
    assert!(body["info"]["request_id"]
        .as_str()
        .unwrap()
        .starts_with("req_"));
    assert_eq!(body["error_details"]["code"], 400);
    assert_eq!(body["error_details"]["type"], "BadRequest");
    assert_eq!(body["vendor"]["name"], "iMediaPORT Limited");
}

#[tokio::test]
async fn malformed_and_unknown_actions() {
    let app = setup().await;

    let (status, body) = app.dxl(Method::GET, "songs", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_details"]["details"]["received"], "songs");

    let (status, body) = app.dxl(Method::GET, "royalties.list", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let modules = body["error_details"]["details"]["available_modules"]
        .as_array()
        .unwrap();
    assert!(modules.contains(&json!("auth")));

    let (status, body) = app.dxl(Method::GET, "songs.explode", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid operation");
    assert_eq!(body["info"]["action_requested"], "songs.explode");
}

#[tokio::test]
async fn song_lifecycle_for_its_owner() {
    let app = setup().await;
    app.seed_user("artist-1", "artist").await;
    let owner = token("artist-1", "artist", None);
    let song_id = create_song(&app, &owner, "Notes").await;

    let (status, body) = app
        .dxl(Method::GET, &format!("songs.get&id={song_id}"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "new");
    assert_eq!(body["data"]["language"], "en");
    assert_eq!(body["data"]["artistName"], "Artist artist-1");
    let tracks = body["data"]["tracks"].as_array().unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0]["title"], "First");
    assert_eq!(tracks[0]["explicit"], "yes");
    assert_eq!(tracks[1]["explicit"], "no");

    let (status, body) = app
        .dxl(
            Method::POST,
            "songs.update",
            Some(&owner),
            Some(json!({ "id": song_id, "title": "Renamed", "record_label": "Analytical" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Renamed");

    let (_, body) = app.dxl(Method::GET, "songs.list", Some(&owner), None).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["has_next"], false);
    assert!(body["data"].get("total").is_none());

    let (status, body) = app
        .dxl(
            Method::DELETE,
            &format!("songs.delete&id={song_id}"),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "deleted");

    let (_, body) = app.dxl(Method::GET, "songs.list", Some(&owner), None).await;
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
    let (status, body) = app
        .dxl(Method::GET, &format!("songs.get&id={song_id}"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_details"]["details"]["resource"], "song");
}

#[tokio::test]
async fn songs_are_guarded() {
    let app = setup().await;
    app.seed_user("artist-1", "artist").await;
    let owner = token("artist-1", "artist", None);
    let stranger = token("artist-2", "artist", None);
    let song_id = create_song(&app, &owner, "Notes").await;

    let (status, _) = app
        .dxl(Method::POST, "songs.create", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .dxl(
            Method::POST,
            "songs.create",
            Some(&owner),
            Some(json!({ "title": "No tracks", "type": "single", "artist_id": "artist-1" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_details"]["type"], "ValidationError");
    assert_eq!(
        body["error_details"]["details"]["required"],
        json!(["type", "title", "artist_id", "tracks"])
    );

    let (status, body) = app
        .dxl(
            Method::POST,
            "songs.create",
            Some(&owner),
            Some(json!({ "title": "Ghost", "type": "single", "artist_id": "nobody", "tracks": [{}] })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_details"]["details"]["field"], "artist_id");

    let (status, _) = app
        .dxl(Method::GET, &format!("songs.get&id={song_id}"), Some(&stranger), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.dxl(Method::GET, "songs.get", Some(&owner), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_details"]["details"]["field"], "id");

    let (status, _) = app
        .dxl(Method::GET, "songs.list&status=published", Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn privileged_listing_includes_total() {
    let app = setup().await;
    app.seed_user("artist-1", "artist").await;
    let owner = token("artist-1", "artist", None);
    create_song(&app, &owner, "Notes").await;
    create_song(&app, &owner, "More Notes").await;

    let partner = token("artist-1", "artist", Some(20));
    let (_, body) = app
        .dxl(Method::GET, "songs.list&limit=1&search=More", Some(&partner), None)
        .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "More Notes");
    assert_eq!(body["data"]["has_next"], true);

    let admin = token("admin-1", "admin", None);
    let (_, body) = app.dxl(Method::GET, "songs.list", Some(&admin), None).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn admin_operations_require_admin() {
    let app = setup().await;
    let artist = token("artist-1", "artist", None);
    let (status, body) = app
        .dxl(Method::GET, "admin.dashboard.stats", Some(&artist), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin access required");
    assert_eq!(body["info"]["action_requested"], "admin.dashboard.stats");

    let (status, _) = app
        .dxl(Method::GET, "admin.approvals", None, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn songs_create_accepts_tracks_with_mixed_optional_fields() {
    let app = setup().await;
    app.seed_user("artist-1", "artist").await;
    let owner = token("artist-1", "artist", None);

    let (status, body) = app
        .dxl(
            Method::POST,
            "songs.create",
            Some(&owner),
            Some(json!({
                "type": "album",
                "title": "Notes",
                "artist_id": "artist-1",
                "tracks": [
                    { "title": "One", "isrc": "USRC1", "lyrics": "la" },
                    { "title": "Two", "producer": "Ada" },
                ],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let song_id = body["data"]["id"].as_str().unwrap().to_string();

    let tracks = queries::songs::get_tracks(&app.state.connection, &song_id)
        .await
        .unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].isrc.as_deref(), Some("USRC1"));
    assert_eq!(tracks[0].producer, None);
    assert_eq!(tracks[1].isrc, None);
    assert_eq!(tracks[1].producer.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn tokens_are_ignored_without_a_secret() {
    let app = setup_with(|config| config.jwt_secret = String::new()).await;
    let forged = signed_token("", "mallory", "admin", Some(50));

    let (status, body) = app
        .dxl(Method::GET, "admin.dashboard.stats", Some(&forged), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], false);
}

#[tokio::test]
async fn moderation_flow() {
    let app = setup().await;
    app.seed_user("artist-1", "artist").await;
    let admin = token("admin-1", "staff", Some(50));

    for title in ["Pending", "Suspicious"] {
        let response = app
            .post_json(
                "/api/upload/publish",
                json!({
                    "userId": "artist-1",
                    "title": title,
                    "artistId": "artist-1",
                    "copyrightAcknowledged": true,
                    "tracks": [{ "title": "Only", "duration": 180 }],
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let (status, body) = app.dxl(Method::GET, "admin.approvals", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    let pending = body["data"]["pending"].as_array().unwrap().to_owned();
    let id_of = |title: &str| -> String {
        pending
            .iter()
            .find(|song| song["title"] == title)
            .and_then(|song| song["id"].as_str())
            .unwrap()
            .to_string()
    };

    let (status, body) = app
        .dxl(
            Method::POST,
            "admin.approve",
            Some(&admin),
            Some(json!({ "song_id": id_of("Pending"), "status": "approved", "note": "clean" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "approved");
    assert!(body["data"]["approved_at"].is_string());

    let (status, body) = app
        .dxl(
            Method::POST,
            "admin.flag",
            Some(&admin),
            Some(json!({
                "song_id": id_of("Suspicious"),
                "flag_type": "copyright",
                "reason": "Sample not cleared",
                "details": { "source": "report" },
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "flagged");
    assert_eq!(body["data"]["flag_type"], "copyright");

    let (_, body) = app.dxl(Method::GET, "admin.alerts.list", Some(&admin), None).await;
    assert_eq!(body["data"]["total"], 1);
    let alert = &body["data"]["items"][0];
    assert_eq!(alert["title"], "Song flagged: Suspicious");
    assert_eq!(alert["severity"], "warning");
    assert_eq!(alert["metadata"]["source"], "report");

    let (_, body) = app
        .dxl(Method::GET, "admin.dashboard.stats", Some(&admin), None)
        .await;
    assert_eq!(body["data"]["songs"]["total"], 2);
    assert_eq!(body["data"]["songs"]["pending"], 0);
    assert_eq!(body["data"]["songs"]["approved"], 1);
    assert_eq!(body["data"]["songs"]["flagged"], 1);
    assert_eq!(body["data"]["alerts"]["active"], 1);
    assert_eq!(body["data"]["alerts"]["critical"], 0);

    let (status, _) = app
        .dxl(
            Method::POST,
            "admin.approve",
            Some(&admin),
            Some(json!({ "song_id": "missing", "status": "approved" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .dxl(Method::POST, "admin.flag", Some(&admin), Some(json!({ "song_id": "x" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["error_details"]["details"]["required"],
        json!(["song_id", "flag_type", "reason"])
    );
}

#[tokio::test]
async fn admin_tasks() {
    let app = setup().await;
    let admin = token("admin-1", "admin", None);

    let (status, body) = app
        .dxl(Method::POST, "admin.tasks.create", Some(&admin), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Task title is required");

    let (status, body) = app
        .dxl(
            Method::POST,
            "admin.tasks.create",
            Some(&admin),
            Some(json!({ "title": "Review backlog", "due_date": "2030-01-31" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["priority"], "medium");
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["createdBy"], "admin-1");

    let (_, body) = app
        .dxl(Method::GET, "admin.tasks.list&page=1&limit=10", Some(&admin), None)
        .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["limit"], 10);
    assert_eq!(body["data"]["items"][0]["title"], "Review backlog");
}

#[tokio::test]
async fn royalty_reports() {
    let app = setup().await;
    let admin = token("admin-1", "admin", None);
    seed_royalty(&app, "r1", "2024-01", "artist-1", 10.25, 8.5).await;
    seed_royalty(&app, "r2", "2024-02", "artist-1", 5.5, 4.75).await;
    seed_royalty(&app, "r3", "2024-02", "artist-2", 100.0, 85.0).await;

    let (status, body) = app
        .dxl(Method::GET, "admin.royalty.user_inflow", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "One of user_id, artist_id, or song_id is required");

    let (status, body) = app
        .dxl(
            Method::GET,
            "admin.royalty.user_inflow&user_id=artist-1",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_records"], 2);
    assert_eq!(body["data"]["total_gross_usd"], "15.75");
    assert_eq!(body["data"]["total_net_usd"], "13.25");
    assert_eq!(body["data"]["records"][0]["period"], "2024-02");

    let (_, body) = app
        .dxl(Method::GET, "admin.royalty.list&period=2024-02", Some(&admin), None)
        .await;
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn registration_and_availability() {
    let app = setup().await;

    let (status, body) = app
        .dxl(
            Method::POST,
            "auth.register",
            None,
            Some(json!({
                "email": "Ada@Example.com",
                "password": "correct horse",
                "firstname": "Ada",
                "lastname": "Lovelace",
                "username": "ada_l",
                "gender": "female",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["email"], "ada@example.com");
    let user_id = body["data"]["user_id"].as_str().unwrap().to_string();

    let user = queries::users::find_user(&app.state.connection, &user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(user.tenant.as_deref(), Some("acme"));
    assert!(user.email_verified);
    assert!(user.password_hash.starts_with("$argon2"));

    let (_, body) = app
        .dxl(Method::GET, "auth.check.email&email=ADA@example.com", None, None)
        .await;
    assert_eq!(body["data"]["available"], false);
    let (_, body) = app
        .dxl(Method::GET, "auth.check.email.verified&email=ada@example.com", None, None)
        .await;
    assert_eq!(body["data"]["exists"], true);
    assert_eq!(body["data"]["verified"], true);
    let (_, body) = app
        .dxl(Method::GET, "auth.check.username&username=ADA_L", None, None)
        .await;
    assert_eq!(body["data"]["available"], false);

    let (status, body) = app
        .dxl(Method::GET, "auth.check.username&username=a!", None, None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_details"]["details"]["field"], "username");

    let (status, body) = app
        .dxl(
            Method::POST,
            "auth.register",
            None,
            Some(json!({
                "email": "ada@example.com",
                "password": "x",
                "firstname": "A",
                "lastname": "L",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_details"]["details"]["field"], "email");

    let (status, _) = app
        .dxl(Method::POST, "auth.verify_email", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn chunk_request(token: &str, upload_id: &str, number: u32, data: &'static [u8]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/dxl/v3?@=uploads.chunk")
        .header("authorization", format!("Bearer {token}"))
        .header("Upload-ID", upload_id)
        .header("Chunk-Number", number.to_string())
        .body(Body::from(data))
        .unwrap()
}

async fn start_upload(app: &TestApp, token: &str) -> Value {
    let (status, body) = app
        .dxl(
            Method::POST,
            "uploads.start",
            Some(token),
            Some(json!({
                "filename": "my song.mp3",
                "size": 2 * 1024 * 1024,
                "mime_type": "audio/mpeg",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"].to_owned()
}

#[tokio::test]
async fn chunked_upload_round_trip() {
    let app = setup().await;
    app.seed_user("artist-1", "artist").await;
    let owner = token("artist-1", "artist", None);

    let started = start_upload(&app, &owner).await;
    assert_eq!(started["total_chunks"], 2);
    assert_eq!(started["chunk_size"], 1024 * 1024);
    assert_eq!(started["status"], "loading");
    assert!(started["filename"].as_str().unwrap().ends_with("_my_song.mp3"));
    let upload_id = started["upload_id"].as_str().unwrap().to_string();

    let response = app.send(chunk_request(&owner, &upload_id, 1, b"ab")).await;
    assert_eq!(response.json()["data"]["progress"], 50);
    let response = app.send(chunk_request(&owner, &upload_id, 2, b"c")).await;
    assert_eq!(response.json()["data"]["progress"], 100);

    let (_, body) = app
        .dxl(Method::GET, &format!("uploads.status&id={upload_id}"), Some(&owner), None)
        .await;
    assert_eq!(body["data"]["filename"], "my song.mp3");
    assert_eq!(body["data"]["status"], "loading");

    let (status, body) = app
        .dxl(
            Method::POST,
            "uploads.complete",
            Some(&owner),
            Some(json!({ "upload_id": upload_id, "checksum": "900150983CD24FB0D6963F7D28E17F72" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "complete");
    assert_eq!(body["data"]["checksum"], "900150983cd24fb0d6963f7d28e17f72");
    let url = body["data"]["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/artist-1/chunked/"));

    let served = app
        .send(Request::builder().uri(&url).body(Body::empty()).unwrap())
        .await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.body, b"abc");

    let response = app.send(chunk_request(&owner, &upload_id, 3, b"d")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chunked_upload_is_checked() {
    let app = setup().await;
    app.seed_user("artist-1", "artist").await;
    let owner = token("artist-1", "artist", None);
    let stranger = token("artist-2", "artist", None);
    let upload_id = start_upload(&app, &owner).await["upload_id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, body) = app
        .dxl(Method::POST, "uploads.complete", Some(&owner), Some(json!({ "upload_id": upload_id })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No chunks have been uploaded");

    let response = app.send(chunk_request(&stranger, &upload_id, 1, b"ab")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.send(chunk_request(&owner, &upload_id, 0, b"ab")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["message"], "Missing upload ID or chunk number");

    app.send(chunk_request(&owner, &upload_id, 1, b"ab")).await;
    let (status, body) = app
        .dxl(
            Method::POST,
            "uploads.complete",
            Some(&owner),
            Some(json!({ "upload_id": upload_id, "checksum": "0000" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_details"]["details"]["actual"], common_md5_ab());

    let (status, body) = app
        .dxl(
            Method::POST,
            "uploads.start",
            Some(&owner),
            Some(json!({ "filename": "x.mp3" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["error_details"]["details"]["required"],
        json!(["filename", "size", "mime_type"])
    );
}

fn common_md5_ab() -> &'static str {
    "187ef4436122d1cc2f40dc2b92f0eba0"
}
