use std::sync::atomic::Ordering;
use std::sync::Arc;

use http::Method;
use serde_json::{json, Value};
use specrouter::{ChainError, HandlerResponse, RequestContext};

mod common;
use common::{counting_handler, widget_builder, RecordingDiagnostics};

#[test]
fn test_dispatch_matches_route_under_base_path() {
    let router = widget_builder().build().unwrap();
    let mut ctx = RequestContext::new(Method::GET, "/v1/widgets");
    let res = router.dispatch(&mut ctx).unwrap().unwrap();
    assert_eq!(res.status, 200);
}

#[test]
fn test_dispatch_falls_through_when_nothing_matches() {
    let router = widget_builder().build().unwrap();
    // Not mounted without the /v1 prefix.
    let mut ctx = RequestContext::new(Method::GET, "/widgets");
    assert!(router.dispatch(&mut ctx).unwrap().is_none());
}

#[test]
fn test_context_tagging_exposes_document_and_operation() {
    let router = widget_builder()
        .operation("list_widgets", |ctx: &mut RequestContext| {
            let tagged = ctx.openapi.as_ref().expect("context tagged");
            assert_eq!(tagged.document["info"]["title"], "Widget Store");
            assert_eq!(tagged.operation["operationId"], "list_widgets");
            HandlerResponse::json(200, json!([]))
        })
        .build()
        .unwrap();
    let mut ctx = RequestContext::new(Method::GET, "/v1/widgets");
    let res = router.dispatch(&mut ctx).unwrap().unwrap();
    assert_eq!(res.status, 200);
}

#[test]
fn test_path_param_is_coerced_before_the_handler_runs() {
    let router = widget_builder()
        .operation("get_widget", |ctx: &mut RequestContext| {
            assert_eq!(ctx.request.get_param("id"), Some(&json!(7)));
            HandlerResponse::json(200, json!({ "name": "w" }))
        })
        .build()
        .unwrap();
    let mut ctx = RequestContext::new(Method::GET, "/v1/widgets/7");
    let res = router.dispatch(&mut ctx).unwrap().unwrap();
    assert_eq!(res.status, 200);
}

#[test]
fn test_query_default_applies_then_coercion_retypes_supplied_values() {
    let router = widget_builder()
        .operation("list_widgets", |ctx: &mut RequestContext| {
            let limit = ctx.request.get_query("limit").cloned();
            HandlerResponse::json(200, json!([{ "name": "w", "limit": limit }]))
        })
        .build()
        .unwrap();

    // Absent: the schema default lands in the view untouched by coercion.
    let mut ctx = RequestContext::new(Method::GET, "/v1/widgets");
    let res = router.dispatch(&mut ctx).unwrap().unwrap();
    assert_eq!(res.body[0]["limit"], json!(20));

    // Supplied as a string: coerced to the declared integer type.
    let mut ctx = RequestContext::new(Method::GET, "/v1/widgets?limit=5");
    let res = router.dispatch(&mut ctx).unwrap().unwrap();
    assert_eq!(res.body[0]["limit"], json!(5));
}

#[test]
fn test_request_validation_failure_aborts_before_the_handler() {
    let (count, handler) = counting_handler(201, json!({ "name": "w" }));
    let router = widget_builder()
        .operation("create_widget", handler)
        .build()
        .unwrap();

    // Body missing the required `name` property.
    let mut ctx = RequestContext::new(Method::POST, "/v1/widgets").with_body(json!({ "tag": "x" }));
    let err = router.dispatch(&mut ctx).unwrap_err();
    match err {
        ChainError::Validation { status, errors } => {
            assert_eq!(status, 400);
            assert!(!errors["errors"].as_array().unwrap().is_empty());
        }
        other => panic!("expected validation abort, got {other:?}"),
    }
    assert_eq!(count.load(Ordering::SeqCst), 0);

    // A valid body reaches the handler.
    let mut ctx = RequestContext::new(Method::POST, "/v1/widgets").with_body(json!({ "name": "w" }));
    let res = router.dispatch(&mut ctx).unwrap().unwrap();
    assert_eq!(res.status, 201);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_missing_required_body_is_a_validation_failure() {
    let router = widget_builder().build().unwrap();
    let mut ctx = RequestContext::new(Method::POST, "/v1/widgets");
    let err = router.dispatch(&mut ctx).unwrap_err();
    assert_eq!(err.status(), 400);
}

#[test]
fn test_response_validation_failure_overwrites_the_response() {
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let router = widget_builder()
        .operation("get_widget", |_ctx: &mut RequestContext| {
            // Violates the Widget schema: `name` is required.
            HandlerResponse::json(200, json!({ "id": 7 }))
        })
        .diagnostics(diagnostics.clone())
        .build()
        .unwrap();

    let mut ctx = RequestContext::new(Method::GET, "/v1/widgets/7");
    let res = router.dispatch(&mut ctx).unwrap().unwrap();
    assert_eq!(res.status, 500);
    assert_eq!(res.body, Value::Null);

    let reports = diagnostics.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].0, "get_widget");
    assert_eq!(reports[0].1, 200);
}

#[test]
fn test_undeclared_response_status_is_also_overwritten() {
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let router = widget_builder()
        .operation("get_widget", |_ctx: &mut RequestContext| {
            HandlerResponse::json(418, json!({ "name": "w" }))
        })
        .diagnostics(diagnostics.clone())
        .build()
        .unwrap();

    let mut ctx = RequestContext::new(Method::GET, "/v1/widgets/7");
    let res = router.dispatch(&mut ctx).unwrap().unwrap();
    assert_eq!(res.status, 500);
    assert_eq!(res.body, Value::Null);
    assert!(diagnostics.reports.lock().unwrap()[0].2.contains("418"));
}

#[test]
fn test_valid_response_passes_through_untouched() {
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let router = widget_builder()
        .diagnostics(diagnostics.clone())
        .build()
        .unwrap();
    let mut ctx = RequestContext::new(Method::GET, "/v1/widgets/7");
    let res = router.dispatch(&mut ctx).unwrap().unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.body, json!({ "name": "w" }));
    assert!(diagnostics.reports.lock().unwrap().is_empty());
}
