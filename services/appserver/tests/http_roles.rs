mod common;

use appserver::routes::{
    CHECKS_OK, IAMS_LIST, PROFILE_GET, PUBLIC_ACCESS, ROLES_GET, ROLES_LIST, ROLES_UPDATE,
};
use axum::http::StatusCode;
use common::{ADMIN_TOKEN, USER_TOKEN, app, read_json, state};
use http_helpers::{json_request, request, with_token};
use tower::ServiceExt;

fn keys(body: &serde_json::Value) -> Vec<String> {
    body["permissions"]
        .as_array()
        .expect("permissions")
        .iter()
        .map(|key| key.as_str().expect("key").to_string())
        .collect()
}

#[tokio::test]
async fn role_edit_changes_access() {
    let app = app(state());

    let response = app
        .clone()
        .oneshot(request("GET", "/api/roles", Some(USER_TOKEN)))
        .await
        .expect("before");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let update = with_token(
        json_request(
            "PUT",
            "/api/roles/user",
            serde_json::json!({ "permissions": [PUBLIC_ACCESS, PROFILE_GET, ROLES_LIST] }),
        ),
        ADMIN_TOKEN,
    );
    let response = app.clone().oneshot(update).await.expect("update");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(keys(&body).contains(&ROLES_LIST.to_string()));

    let response = app
        .clone()
        .oneshot(request("GET", "/api/roles", Some(USER_TOKEN)))
        .await
        .expect("after");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request("GET", "/api/roles/guest", Some(USER_TOKEN)))
        .await
        .expect("sibling");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn non_affectable_permissions_are_dropped_from_edits() {
    let update = with_token(
        json_request(
            "PUT",
            "/api/roles/guest",
            serde_json::json!({ "iams": [PUBLIC_ACCESS, CHECKS_OK] }),
        ),
        ADMIN_TOKEN,
    );
    let response = app(state()).oneshot(update).await.expect("update");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(keys(&body), vec![PUBLIC_ACCESS.to_string()]);
}

#[tokio::test]
async fn role_details_depend_on_listing_grant() {
    let app = app(state());

    let response = app
        .clone()
        .oneshot(request("GET", "/api/roles/admin", Some(ADMIN_TOKEN)))
        .await
        .expect("admin view");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body["iams"].as_array().is_some_and(|items| !items.is_empty()));

    let update = with_token(
        json_request(
            "PUT",
            "/api/roles/user",
            serde_json::json!({ "permissions": [PUBLIC_ACCESS, PROFILE_GET, ROLES_GET] }),
        ),
        ADMIN_TOKEN,
    );
    let response = app.clone().oneshot(update).await.expect("update");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request("GET", "/api/roles/admin", Some(USER_TOKEN)))
        .await
        .expect("user view");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["name"], "admin");
    assert!(body.get("iams").is_none());
}

#[tokio::test]
async fn unknown_role_is_not_found() {
    let app = app(state());
    let response = app
        .clone()
        .oneshot(request("GET", "/api/roles/ghost", Some(ADMIN_TOKEN)))
        .await
        .expect("get");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let update = with_token(
        json_request("PUT", "/api/roles/ghost", serde_json::json!({ "permissions": [] })),
        ADMIN_TOKEN,
    );
    let response = app.oneshot(update).await.expect("put");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await["message"], "role not found");
}

#[tokio::test]
async fn permission_listing_shows_children() {
    let response = app(state())
        .oneshot(request("GET", "/api/iams", Some(ADMIN_TOKEN)))
        .await
        .expect("iams");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let public = body["items"]
        .as_array()
        .expect("items")
        .iter()
        .find(|item| item["key"] == PUBLIC_ACCESS)
        .expect("public")
        .clone();
    assert_eq!(public["children"], serde_json::json!([CHECKS_OK]));
    assert_eq!(public["resource"], serde_json::Value::Null);
}

#[tokio::test]
async fn title_only_edit_keeps_permissions() {
    let update = with_token(
        json_request("PUT", "/api/roles/user", serde_json::json!({ "title": "Members" })),
        ADMIN_TOKEN,
    );
    let response = app(state()).oneshot(update).await.expect("update");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["title"], "Members");
    assert_eq!(body["description"], "Default role of signed-in users.");
    let granted = keys(&body);
    assert_eq!(granted.len(), 2);
    assert!(granted.contains(&PUBLIC_ACCESS.to_string()));
    assert!(granted.contains(&PROFILE_GET.to_string()));
}

#[tokio::test]
async fn roles_are_created_once() {
    let app = app(state());
    let create = || {
        with_token(
            json_request(
                "POST",
                "/api/roles",
                serde_json::json!({
                    "name": "Editor",
                    "title": "Editors",
                    "permissions": [PUBLIC_ACCESS, CHECKS_OK],
                }),
            ),
            ADMIN_TOKEN,
        )
    };

    let response = app.clone().oneshot(create()).await.expect("create");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["name"], "editor");
    assert_eq!(body["title"], "Editors");
    assert_eq!(body["protected"], false);
    assert_eq!(keys(&body), vec![PUBLIC_ACCESS.to_string()]);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/roles/editor", Some(ADMIN_TOKEN)))
        .await
        .expect("get");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(create()).await.expect("duplicate");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(read_json(response).await["code"], "role_already_exists");

    let blank = with_token(
        json_request("POST", "/api/roles", serde_json::json!({ "name": "  " })),
        ADMIN_TOKEN,
    );
    let response = app.clone().oneshot(blank).await.expect("blank");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/roles",
            serde_json::json!({ "name": "intruder" }),
        ))
        .await
        .expect("guest");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn permission_edits_require_listing_grant() {
    let app = app(state());

    let grant = with_token(
        json_request(
            "PUT",
            "/api/roles/user",
            serde_json::json!({ "permissions": [PUBLIC_ACCESS, PROFILE_GET, ROLES_UPDATE] }),
        ),
        ADMIN_TOKEN,
    );
    let response = app.clone().oneshot(grant).await.expect("grant");
    assert_eq!(response.status(), StatusCode::OK);

    let rename = with_token(
        json_request("PUT", "/api/roles/guest", serde_json::json!({ "title": "Visitors" })),
        USER_TOKEN,
    );
    let response = app.clone().oneshot(rename).await.expect("title");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["title"], "Visitors");

    let escalate = with_token(
        json_request(
            "PUT",
            "/api/roles/user",
            serde_json::json!({ "permissions": [PUBLIC_ACCESS, PROFILE_GET, ROLES_LIST] }),
        ),
        USER_TOKEN,
    );
    let response = app.clone().oneshot(escalate).await.expect("permissions");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json(response).await;
    assert!(body["message"].as_str().is_some_and(|m| m.contains(IAMS_LIST)));

    let response = app
        .oneshot(request("GET", "/api/roles", Some(USER_TOKEN)))
        .await
        .expect("unchanged");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
