//! Integration tests for the Taskboard API
//!
//! These tests drive the full router against a real database:
//! - Access gate redirects and public pages
//! - Registration, login and logout
//! - Self-only account changes and author-only task deletion
//! - Guarded deletes of referenced users, statuses and labels
//! - Task filtering and pagination
//!
//! Requires `DATABASE_URL` (defaults to a local `taskboard_test` database).

mod common;

use axum::http::StatusCode;
use common::{body_json, location, notice_texts, set_cookie, unique, TestContext, PASSWORD};
use serde_json::json;
use taskboard_shared::models::{label::Label, status::Status, task::Task, user::User};

fn ids(page: &serde_json::Value) -> Vec<i64> {
    page["data"]["tasks"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_anonymous_request_redirected_to_login() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.get("/tasks/?status=1", None).await;

    assert_eq!(location(&response), "/login/?next=/tasks/%3Fstatus%3D1");
    assert_eq!(notice_texts(&response), vec!["You are not logged in! Please log in."]);
}

#[tokio::test]
async fn test_public_pages_reachable_anonymously() {
    let ctx = TestContext::new().await.unwrap();

    for path in ["/", "/users/", "/login/", "/health"] {
        let response = ctx.get(path, None).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {}", path);
    }

    let home = body_json(ctx.get("/", None).await).await;
    assert_eq!(home["data"]["principal"]["kind"], "anonymous");
}

#[tokio::test]
async fn test_unknown_host_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let request = axum::http::Request::builder()
        .uri("/")
        .header("host", "evil.example")
        .body(axum::body::Body::empty())
        .unwrap();

    assert_eq!(ctx.send(request).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_registration_does_not_sign_in() {
    let ctx = TestContext::new().await.unwrap();
    let username = unique("newcomer");

    let response = ctx
        .post(
            "/users/create/",
            None,
            json!({
                "username": username,
                "first_name": "New",
                "last_name": "Comer",
                "password1": PASSWORD,
                "password2": PASSWORD,
            }),
        )
        .await;

    assert_eq!(location(&response), "/login/");
    assert_eq!(
        notice_texts(&response),
        vec!["User registered successfully. Please sign in."]
    );
    assert!(set_cookie(&response, "session").is_none());

    let user = User::find_by_username(&ctx.db, &username).await.unwrap().unwrap();
    assert_ne!(user.password_hash, PASSWORD);
}

#[tokio::test]
async fn test_registration_password_mismatch() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .post(
            "/users/create/",
            None,
            json!({
                "username": unique("mismatch"),
                "password1": "abc123",
                "password2": "abc124",
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["details"][0]["field"], "password2");
}

#[tokio::test]
async fn test_login_and_logout() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user("login").await;

    let wrong = ctx
        .post("/login/", None, json!({ "username": user.username, "password": "nope" }))
        .await;
    assert_eq!(wrong.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = ctx
        .post(
            "/login/?next=/tasks/",
            None,
            json!({ "username": user.username, "password": PASSWORD }),
        )
        .await;

    assert_eq!(location(&response), "/tasks/");
    assert_eq!(notice_texts(&response), vec!["You are logged in"]);

    let token = set_cookie(&response, "session").unwrap();
    assert!(!token.is_empty());
    let cookie = format!("session={}", token);

    assert_eq!(ctx.get("/tasks/", Some(&cookie)).await.status(), StatusCode::OK);

    // Logout only accepts POST
    assert_eq!(
        ctx.get("/logout/", Some(&cookie)).await.status(),
        StatusCode::METHOD_NOT_ALLOWED
    );

    let response = ctx.post("/logout/", Some(&cookie), json!({})).await;
    assert_eq!(location(&response), "/");
    assert_eq!(notice_texts(&response), vec!["You are logged out"]);
    assert_eq!(set_cookie(&response, "session").as_deref(), Some(""));
}

#[tokio::test]
async fn test_login_ignores_offsite_next() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user("offsite").await;

    let response = ctx
        .post(
            "/login/",
            None,
            json!({ "username": user.username, "password": PASSWORD, "next": "//evil.example/" }),
        )
        .await;

    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_users_can_only_change_themselves() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.create_user("alice").await;
    let bob = ctx.create_user("bob").await;
    let cookie = ctx.session_for(&alice);

    let update = json!({ "username": unique("renamed"), "first_name": "A", "last_name": "B" });

    let response = ctx
        .post(&format!("/users/{}/update/", bob.id), Some(&cookie), update.clone())
        .await;
    assert_eq!(location(&response), "/users/");
    assert_eq!(notice_texts(&response), vec!["You can modify only your own account."]);

    let unchanged = User::find_by_id(&ctx.db, bob.id).await.unwrap().unwrap();
    assert_eq!(unchanged.username, bob.username);

    let response = ctx
        .post(&format!("/users/{}/delete/", bob.id), Some(&cookie), json!({}))
        .await;
    assert_eq!(notice_texts(&response), vec!["You can modify only your own account."]);
    assert!(User::find_by_id(&ctx.db, bob.id).await.unwrap().is_some());

    let response = ctx
        .post(&format!("/users/{}/update/", alice.id), Some(&cookie), update.clone())
        .await;
    assert_eq!(location(&response), "/users/");
    assert_eq!(notice_texts(&response), vec!["User updated successfully."]);

    let renamed = User::find_by_id(&ctx.db, alice.id).await.unwrap().unwrap();
    assert_eq!(json!(renamed.username), update["username"]);
}

#[tokio::test]
async fn test_referenced_user_cannot_be_deleted() {
    let ctx = TestContext::new().await.unwrap();
    let author = ctx.create_user("author").await;
    let status = ctx.create_status("status").await;
    ctx.create_task(&status, &author, None, &[]).await;

    let response = ctx
        .post(
            &format!("/users/{}/delete/", author.id),
            Some(&ctx.session_for(&author)),
            json!({}),
        )
        .await;

    assert_eq!(location(&response), "/users/");
    assert_eq!(notice_texts(&response), vec!["Cannot delete user because it is in use"]);
    assert!(User::find_by_id(&ctx.db, author.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_deleting_own_account_signs_out() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user("leaver").await;

    let response = ctx
        .post(
            &format!("/users/{}/delete/", user.id),
            Some(&ctx.session_for(&user)),
            json!({}),
        )
        .await;

    assert_eq!(location(&response), "/users/");
    assert_eq!(notice_texts(&response), vec!["User deleted successfully"]);
    assert_eq!(set_cookie(&response, "session").as_deref(), Some(""));
    assert!(User::find_by_id(&ctx.db, user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_session_of_deleted_account_is_anonymous() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user("gone").await;
    let cookie = ctx.session_for(&user);

    let response = ctx
        .post(&format!("/users/{}/delete/", user.id), Some(&cookie), json!({}))
        .await;
    assert_eq!(notice_texts(&response), vec!["User deleted successfully"]);

    // A copy of the token kept elsewhere no longer signs anyone in
    let response = ctx.get("/tasks/", Some(&cookie)).await;
    assert_eq!(location(&response), "/login/?next=/tasks/");

    let name = unique("orphan");
    let response = ctx
        .post("/statuses/create/", Some(&cookie), json!({ "name": name }))
        .await;
    assert_eq!(location(&response), "/login/?next=/statuses/create/");

    let created = Status::list(&ctx.db)
        .await
        .unwrap()
        .into_iter()
        .any(|s| s.name == name);
    assert!(!created);

    let home = body_json(ctx.get("/", Some(&cookie)).await).await;
    assert_eq!(home["data"]["principal"]["kind"], "anonymous");
}

#[tokio::test]
async fn test_status_crud_and_guarded_delete() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user("statuses").await;
    let cookie = ctx.session_for(&user);
    let name = unique("new");

    let response = ctx
        .post("/statuses/create/", Some(&cookie), json!({ "name": name }))
        .await;
    assert_eq!(location(&response), "/statuses/");
    assert_eq!(notice_texts(&response), vec!["Status created successfully"]);

    // Duplicate names are a field error
    let response = ctx
        .post("/statuses/create/", Some(&cookie), json!({ "name": name }))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["details"][0]["field"], "name");

    let in_use = ctx.create_status("in-use").await;
    ctx.create_task(&in_use, &user, None, &[]).await;

    let response = ctx
        .post(&format!("/statuses/{}/delete/", in_use.id), Some(&cookie), json!({}))
        .await;
    assert_eq!(location(&response), "/statuses/");
    assert_eq!(notice_texts(&response), vec!["Cannot delete status because it is in use"]);
    assert!(Status::find_by_id(&ctx.db, in_use.id).await.unwrap().is_some());

    let unused = ctx.create_status("unused").await;
    let response = ctx
        .post(&format!("/statuses/{}/delete/", unused.id), Some(&cookie), json!({}))
        .await;
    assert_eq!(notice_texts(&response), vec!["Status deleted successfully"]);
    assert!(Status::find_by_id(&ctx.db, unused.id).await.unwrap().is_none());

    let response = ctx
        .post(&format!("/statuses/{}/delete/", unused.id), Some(&cookie), json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_label_guarded_delete() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user("labels").await;
    let cookie = ctx.session_for(&user);
    let status = ctx.create_status("status").await;
    let label = ctx.create_label("bug").await;
    ctx.create_task(&status, &user, None, &[&label]).await;

    let response = ctx
        .post(&format!("/labels/{}/delete/", label.id), Some(&cookie), json!({}))
        .await;

    assert_eq!(location(&response), "/labels/");
    assert_eq!(notice_texts(&response), vec!["Cannot delete label because it is in use"]);
    assert!(Label::find_by_id(&ctx.db, label.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_task_author_comes_from_session() {
    let ctx = TestContext::new().await.unwrap();
    let author = ctx.create_user("author").await;
    let other = ctx.create_user("other").await;
    let status = ctx.create_status("status").await;
    let label = ctx.create_label("label").await;

    let response = ctx
        .post(
            "/tasks/create/",
            Some(&ctx.session_for(&author)),
            json!({
                "name": unique("task"),
                "status": status.id,
                "executor": other.id,
                "labels": [label.id],
                "author": other.id,
            }),
        )
        .await;
    assert_eq!(location(&response), "/tasks/");
    assert_eq!(notice_texts(&response), vec!["Task created successfully"]);

    let page = body_json(
        ctx.get(&format!("/tasks/?status={}", status.id), Some(&ctx.session_for(&author)))
            .await,
    )
    .await;
    let task = &page["data"]["tasks"]["items"][0];
    assert_eq!(task["author_id"], json!(author.id));
    assert_eq!(task["executor_id"], json!(other.id));
    assert_eq!(task["labels"][0]["id"], json!(label.id));
}

#[tokio::test]
async fn test_task_with_unknown_status_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user("unknown").await;

    let response = ctx
        .post(
            "/tasks/create/",
            Some(&ctx.session_for(&user)),
            json!({ "name": unique("task"), "status": i64::MAX }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["details"][0]["field"], "status");
}

#[tokio::test]
async fn test_blank_task_name_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user("blank").await;
    let status = ctx.create_status("status").await;
    let cookie = ctx.session_for(&user);

    let response = ctx
        .post("/tasks/create/", Some(&cookie), json!({ "name": "   ", "status": status.id }))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["details"][0]["field"], "name");

    let task = ctx.create_task(&status, &user, None, &[]).await;
    let response = ctx
        .post(
            &format!("/tasks/{}/update/", task.id),
            Some(&cookie),
            json!({ "name": " \t ", "status": status.id }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let unchanged = Task::find_by_id(&ctx.db, task.id).await.unwrap().unwrap();
    assert_eq!(unchanged.name, task.name);

    // Surrounding whitespace is trimmed
    ctx.post("/tasks/create/", Some(&cookie), json!({ "name": "  padded  ", "status": status.id }))
        .await;
    let page = body_json(ctx.get(&format!("/tasks/?status={}&ordering=-id", status.id), Some(&cookie)).await).await;
    assert_eq!(page["data"]["tasks"]["items"][0]["name"], "padded");
}

#[tokio::test]
async fn test_only_author_deletes_task() {
    let ctx = TestContext::new().await.unwrap();
    let author = ctx.create_user("author").await;
    let other = ctx.create_user("other").await;
    let status = ctx.create_status("status").await;
    let task = ctx.create_task(&status, &author, Some(&other), &[]).await;
    let path = format!("/tasks/{}/delete/", task.id);

    let response = ctx.post(&path, Some(&ctx.session_for(&other)), json!({})).await;
    assert_eq!(location(&response), "/tasks/");
    assert_eq!(notice_texts(&response), vec!["You can delete only your own task."]);
    assert!(Task::find_by_id(&ctx.db, task.id).await.unwrap().is_some());

    // Anyone signed in may edit it
    let response = ctx
        .post(
            &format!("/tasks/{}/update/", task.id),
            Some(&ctx.session_for(&other)),
            json!({ "name": "renamed", "status": status.id }),
        )
        .await;
    assert_eq!(notice_texts(&response), vec!["Task updated successfully"]);

    let updated = Task::find_by_id(&ctx.db, task.id).await.unwrap().unwrap();
    assert_eq!(updated.name, "renamed");
    assert_eq!(updated.author_id, author.id);
    assert_eq!(updated.executor_id, None);

    let response = ctx.post(&path, Some(&ctx.session_for(&author)), json!({})).await;
    assert_eq!(notice_texts(&response), vec!["Task deleted successfully"]);
    assert!(Task::find_by_id(&ctx.db, task.id).await.unwrap().is_none());

    let response = ctx.get(&format!("/tasks/{}/", task.id), Some(&ctx.session_for(&author))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_filters_combine() {
    let ctx = TestContext::new().await.unwrap();
    let u1 = ctx.create_user("u1").await;
    let u2 = ctx.create_user("u2").await;
    let s1 = ctx.create_status("s1").await;
    let s2 = ctx.create_status("s2").await;
    let label = ctx.create_label("l").await;

    let t1 = ctx.create_task(&s1, &u1, Some(&u2), &[&label]).await;
    let t2 = ctx.create_task(&s2, &u2, Some(&u1), &[]).await;
    let t3 = ctx.create_task(&s1, &u2, None, &[]).await;

    let cookie = ctx.session_for(&u2);
    let list = |query: String| {
        let cookie = cookie.clone();
        let ctx = &ctx;
        async move { body_json(ctx.get(&format!("/tasks/?{}", query), Some(&cookie)).await).await }
    };

    let page = list(format!("status={}&ordering=id", s1.id)).await;
    assert_eq!(ids(&page), vec![t1.id, t3.id]);

    let page = list(format!("status={}&label={}", s1.id, label.id)).await;
    assert_eq!(ids(&page), vec![t1.id]);

    let page = list(format!("executor={}&status=", u1.id)).await;
    assert_eq!(ids(&page), vec![t2.id]);

    let page = list(format!("status={}&self_tasks=on", s1.id)).await;
    assert_eq!(ids(&page), vec![t3.id]);
    assert_eq!(page["data"]["filter"]["self_tasks"], json!(true));

    let response = ctx.get("/tasks/?status=abc", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_task_list_pages() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user("pager").await;
    let status = ctx.create_status("paged").await;
    for _ in 0..3 {
        ctx.create_task(&status, &user, None, &[]).await;
    }
    let cookie = ctx.session_for(&user);

    // Page size is 2 in the test configuration
    for (page, expected_page, expected_len) in [("1", 1, 2), ("last", 2, 1), ("99", 2, 1), ("abc", 1, 2)] {
        let body = body_json(
            ctx.get(&format!("/tasks/?status={}&page={}", status.id, page), Some(&cookie))
                .await,
        )
        .await;

        assert_eq!(body["data"]["tasks"]["page"], json!(expected_page), "page={}", page);
        assert_eq!(ids(&body).len(), expected_len, "page={}", page);
        assert_eq!(body["data"]["tasks"]["num_pages"], json!(2));
        assert_eq!(body["data"]["tasks"]["total"], json!(3));
    }
}

#[tokio::test]
async fn test_notices_shown_once_after_redirect() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user("notices").await;

    let response = ctx
        .post(
            "/statuses/create/",
            Some(&ctx.session_for(&user)),
            json!({ "name": unique("noticed") }),
        )
        .await;
    let messages = set_cookie(&response, "messages").unwrap();

    let cookie = format!("{}; messages={}", ctx.session_for(&user), messages);
    let response = ctx.get("/statuses/", Some(&cookie)).await;

    assert_eq!(set_cookie(&response, "messages").as_deref(), Some(""));
    let body = body_json(response).await;
    assert_eq!(body["messages"][0]["message"], "Status created successfully");
    assert_eq!(body["messages"][0]["level"], "success");
}
