#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};

use common::{context, context_with, user};
use school_portal_server::auth::Role;
use school_portal_server::config::AppConfig;
use school_portal_server::generation::prompts::CREATIVE_IMPROVEMENT_TIPS;
use school_portal_server::records::FOLLOW_UP_SEPARATOR;

fn creative_request() -> Value {
    json!({
        "genre": "Adventure",
        "tone": "Hopeful",
        "level": "JSS3",
        "location": "Bo",
        "theme": "Friendship",
        "plot": "A lost goat",
        "idea": "Market day",
        "title": "The Goat of Bo"
    })
}

#[actix_web::test]
async fn test_create_returns_improvement_tips() {
    let ctx = context();
    ctx.generator.reply("Once upon a time in **Bo**.");
    let app = test_app!(ctx);
    let teacher = user(Role::Teacher);

    let req = test::TestRequest::post()
        .uri("/api/creative-writing")
        .insert_header(("Authorization", teacher.auth.as_str()))
        .set_json(creative_request())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["improvement_tips"], CREATIVE_IMPROVEMENT_TIPS);
    assert_eq!(body["record"]["subject"]["kind"], "creative_writing");
    assert_eq!(body["record"]["subject"]["title"], "The Goat of Bo");
    assert!(body["record"]["content"]
        .as_str()
        .unwrap()
        .contains("<strong>Bo</strong>"));

    let prompt = ctx.generator.last_prompt().unwrap();
    assert!(prompt.contains("The Goat of Bo"));
    assert!(prompt.contains("Adventure"));
}

#[actix_web::test]
async fn test_follow_up_appends_without_separator() {
    let ctx = context();
    ctx.generator.reply("Once upon a time");
    ctx.generator.reply("The goat returned");
    let app = test_app!(ctx);
    let teacher = user(Role::Teacher);

    let req = test::TestRequest::post()
        .uri("/api/creative-writing")
        .insert_header(("Authorization", teacher.auth.as_str()))
        .set_json(creative_request())
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["record"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/creative-writing/{id}/follow-ups"))
        .insert_header(("Authorization", teacher.auth.as_str()))
        .set_json(json!({"follow_up_request": "make it funnier"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let content = body["record"]["content"].as_str().unwrap();
    assert!(content.starts_with(created["record"]["content"].as_str().unwrap()));
    assert!(content.ends_with("<p>The goat returned</p>\n"));
    assert!(!content.contains(FOLLOW_UP_SEPARATOR));
    assert_eq!(body["record"]["follow_up_count"], 1);

    let prompt = ctx.generator.last_prompt().unwrap();
    assert!(prompt.contains("make it funnier"));
    assert!(prompt.contains("A lost goat"));
}

#[actix_web::test]
async fn test_separator_can_be_enabled_for_creative_writing() {
    let mut config = AppConfig::for_tests();
    config.creative_follow_up_separator = true;
    let ctx = context_with(config);
    let app = test_app!(ctx);
    let teacher = user(Role::Teacher);

    let req = test::TestRequest::post()
        .uri("/api/creative-writing")
        .insert_header(("Authorization", teacher.auth.as_str()))
        .set_json(creative_request())
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["record"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/creative-writing/{id}/follow-ups"))
        .insert_header(("Authorization", teacher.auth.as_str()))
        .set_json(json!({"follow_up_request": "add a twist"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["record"]["content"]
        .as_str()
        .unwrap()
        .contains(FOLLOW_UP_SEPARATOR));
}

#[actix_web::test]
async fn test_every_creative_field_is_required() {
    let ctx = context();
    let app = test_app!(ctx);
    let teacher = user(Role::Teacher);

    let mut request = creative_request();
    request["plot"] = json!("");
    request.as_object_mut().unwrap().remove("title");

    let req = test::TestRequest::post()
        .uri("/api/creative-writing")
        .insert_header(("Authorization", teacher.auth.as_str()))
        .set_json(request)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields.len(), 2);
    assert!(fields.contains(&"plot"));
    assert!(fields.contains(&"title"));
    assert_eq!(ctx.store.record_count(), 0);
}

#[actix_web::test]
async fn test_lesson_plan_id_is_not_a_creative_record() {
    let ctx = context();
    let app = test_app!(ctx);
    let teacher = user(Role::Teacher);

    let req = test::TestRequest::post()
        .uri("/api/lesson-plans")
        .insert_header(("Authorization", teacher.auth.as_str()))
        .set_json(json!({"topic": "Fractions"}))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["record"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/creative-writing/{id}"))
        .insert_header(("Authorization", teacher.auth.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
