#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use specrouter::diagnostics::Diagnostics;
use specrouter::{HandlerResponse, RequestContext, RouterBuilder};

/// A small widget-store API mounted under `/v1` via its `servers` entry.
pub fn widget_doc() -> Value {
    let yaml = r##"
openapi: 3.1.0
info:
  title: Widget Store
  version: "1.0.0"
servers:
  - url: https://api.example.com/v1
paths:
  /widgets:
    get:
      operationId: list_widgets
      parameters:
        - name: limit
          in: query
          required: false
          schema:
            type: integer
            default: 20
      responses:
        "200":
          description: OK
          content:
            application/json:
              schema:
                type: array
                items:
                  $ref: "#/components/schemas/Widget"
    post:
      operationId: create_widget
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: "#/components/schemas/Widget"
          application/xml: {}
      responses:
        "201":
          description: Created
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Widget"
  /widgets/{id}:
    get:
      operationId: get_widget
      parameters:
        - name: id
          in: path
          required: true
          schema:
            type: integer
      responses:
        "200":
          description: OK
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Widget"
components:
  schemas:
    Widget:
      type: object
      required: [name]
      properties:
        name:
          type: string
        tag:
          type: string
          default: none
"##;
    serde_yaml::from_str(yaml).expect("widget fixture parses")
}

/// Builder preloaded with the widget document and plain handlers for its
/// three operations.
pub fn widget_builder() -> RouterBuilder {
    RouterBuilder::new()
        .api_doc(widget_doc())
        .operation("list_widgets", |_ctx: &mut RequestContext| {
            HandlerResponse::json(200, json!([{ "name": "w" }]))
        })
        .operation("create_widget", |_ctx: &mut RequestContext| {
            HandlerResponse::json(201, json!({ "name": "w" }))
        })
        .operation("get_widget", |_ctx: &mut RequestContext| {
            HandlerResponse::json(200, json!({ "name": "w" }))
        })
}

/// Handler that counts invocations, for asserting the chain aborted (or not)
/// before reaching it.
pub fn counting_handler(
    status: u16,
    body: Value,
) -> (
    Arc<AtomicUsize>,
    impl Fn(&mut RequestContext) -> HandlerResponse + Send + Sync,
) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    let handler = move |_ctx: &mut RequestContext| {
        seen.fetch_add(1, Ordering::SeqCst);
        HandlerResponse::json(status, body.clone())
    };
    (count, handler)
}

/// Diagnostics sink that records every report, shared with the test body.
#[derive(Default)]
pub struct RecordingDiagnostics {
    pub reports: Mutex<Vec<(String, u16, String)>>,
}

impl Diagnostics for RecordingDiagnostics {
    fn response_validation_failed(&self, operation: &str, status: u16, message: &str) {
        self.reports
            .lock()
            .expect("diagnostics lock")
            .push((operation.to_string(), status, message.to_string()));
    }
}
