//! HTTP API: the Twilio WhatsApp webhook and a health check.
//!
//! Every webhook call is answered synchronously with a TwiML envelope.

use crate::gateway::Gateway;
use crate::reply::{render_envelope, ENVELOPE_CONTENT_TYPE, GENERIC_ERROR};
use aide_core::{config::ApiConfig, message::IncomingMessage};
use anyhow::Context as _;
use axum::{
    extract::{rejection::FormRejection, Form, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    gateway: Arc<Gateway>,
    uptime: Instant,
}

/// Form fields Twilio posts for an inbound WhatsApp message.
#[derive(Debug, Deserialize)]
struct InboundForm {
    #[serde(rename = "Body", default)]
    body: String,
    #[serde(rename = "From", default)]
    from: String,
}

/// `GET /api/health`
async fn health(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime_secs": state.uptime.elapsed().as_secs(),
    }))
}

/// `POST /whatsapp_webhook`
async fn whatsapp_webhook(
    State(state): State<ApiState>,
    form: Result<Form<InboundForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            warn!("webhook: rejected body: {rejection}");
            return xml_response(StatusCode::BAD_REQUEST, GENERIC_ERROR);
        }
    };

    let incoming = IncomingMessage::whatsapp(&form.from, &form.body);
    let now = chrono::Local::now().naive_local();
    let started = Instant::now();
    let gateway = state.gateway.clone();
    let message = incoming.clone();

    // A panic inside the pipeline surfaces here as a JoinError.
    let handled = tokio::spawn(async move { gateway.handle_message(&message, now).await }).await;
    let reply = match handled {
        Ok(reply) => reply,
        Err(e) => {
            error!("webhook: message handler aborted: {e}");
            state.gateway.record_aborted(&incoming, started).await;
            GENERIC_ERROR.to_string()
        }
    };

    xml_response(StatusCode::OK, &reply)
}

fn xml_response(status: StatusCode, reply: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, ENVELOPE_CONTENT_TYPE)],
        render_envelope(reply),
    )
        .into_response()
}

/// Build the axum router with shared state.
fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/whatsapp_webhook", post(whatsapp_webhook))
        .route("/api/health", get(health))
        .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
        .with_state(state)
}

/// Serve the API until `shutdown` resolves.
pub async fn serve<F>(config: &ApiConfig, gateway: Arc<Gateway>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = ApiState {
        gateway,
        uptime: Instant::now(),
    };
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("API server failed to bind to {addr}"))?;

    info!("API server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server error")?;

    info!("API server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn router_with(script: Vec<Scripted>) -> (Router, Arc<ScriptedProvider>) {
        let (app, provider, _) = router_and_gateway(script).await;
        (app, provider)
    }

    async fn router_and_gateway(
        script: Vec<Scripted>,
    ) -> (Router, Arc<ScriptedProvider>, Arc<Gateway>) {
        let provider = ScriptedProvider::new(script);
        let gateway = Arc::new(test_gateway(provider.clone()).await);
        let state = ApiState {
            gateway: gateway.clone(),
            uptime: Instant::now(),
        };
        (build_router(state), provider, gateway)
    }

    fn form_request(body: &str) -> Request<Body> {
        Request::post("/whatsapp_webhook")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = router_with(vec![]).await;
        let req = Request::get("/api/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json: Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["uptime_secs"].is_u64());
    }

    #[tokio::test]
    async fn test_webhook_replies_with_envelope() {
        let (app, provider) = router_with(vec![]).await;
        let req = form_request("Body=%2Fhelp&From=whatsapp%3A%2B15550001111");
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            ENVELOPE_CONTENT_TYPE
        );
        let body = body_text(resp).await;
        assert!(body.starts_with(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>"
        ));
        assert!(body.ends_with("</Message></Response>"));
        assert!(body.contains("/notes"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_webhook_escapes_reply() {
        let (app, _) = router_with(vec![
            text("NO_REMINDER"),
            text(r#"{"action": "save_note", "content": "salt & <pepper>"}"#),
        ])
        .await;
        let req = form_request("Body=note+salt+%26+%3Cpepper%3E&From=whatsapp%3A%2B1555");
        let resp = app.oneshot(req).await.unwrap();

        let body = body_text(resp).await;
        assert!(
            body.contains("Note saved: salt &amp; &lt;pepper&gt;"),
            "{body}"
        );
    }

    #[tokio::test]
    async fn test_webhook_missing_fields_are_empty() {
        let (app, provider) = router_with(vec![]).await;
        let resp = app.oneshot(form_request("")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_text(resp).await;
        assert!(body.contains("<Message>"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_webhook_non_form_body_is_rejected() {
        let (app, _) = router_with(vec![]).await;
        let req = Request::post("/whatsapp_webhook")
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"Body":"hi"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_text(resp).await;
        assert!(body.contains("Something went wrong"));
    }

    #[tokio::test]
    async fn test_webhook_panic_is_contained() {
        let (app, _, gateway) = router_and_gateway(vec![Scripted::Panic]).await;
        let req = form_request("Body=hello&From=whatsapp%3A%2B15550001111");
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_text(resp).await;
        assert!(body.contains("Something went wrong"), "{body}");

        let audited = gateway
            .audit
            .count_for_sender("whatsapp:+15550001111")
            .await
            .unwrap();
        assert_eq!(audited, 1);
    }
}
