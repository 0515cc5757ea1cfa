//! REST endpoints for driving an intake session over HTTP.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::eligibility::Offer;
use crate::intake::{BotMessage, Input, IntakeAgent, Language, Session, SessionId, Stage};

/// Shared state for intake routes.
#[derive(Clone)]
pub struct IntakeRouteState {
    pub agent: Arc<IntakeAgent>,
}

/// Public view of a session. Identity document numbers are left out.
#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub session_id: SessionId,
    pub stage: Stage,
    pub language: Language,
    pub user_name: String,
    pub loan_category: String,
    pub eligibility_score: Option<u32>,
    pub offers: Vec<Offer>,
    pub selected_offer: Option<Offer>,
    pub verification_attempts: u32,
    pub kyc_verified: bool,
    pub otp_confirmed: bool,
    pub awaiting_verification: bool,
    /// Whether the presentation should keep its text box enabled.
    pub accepts_free_text: bool,
    /// Rejected or locked: only a restart moves the session on.
    pub restart_required: bool,
}

impl From<Session> for SessionStatus {
    fn from(session: Session) -> Self {
        Self {
            session_id: session.id,
            stage: session.stage,
            language: session.language,
            kyc_verified: session.kyc.as_ref().is_some_and(|k| k.verified),
            awaiting_verification: session.pending.is_some(),
            accepts_free_text: session.stage.accepts_free_text(),
            restart_required: session.stage.is_terminal(),
            user_name: session.user_name,
            loan_category: session.loan_category,
            eligibility_score: session.eligibility_score,
            offers: session.offers,
            selected_offer: session.selected_offer,
            verification_attempts: session.verification_attempts,
            otp_confirmed: session.otp_confirmed,
        }
    }
}

#[derive(Debug, Serialize)]
struct EventResponse {
    stage: Stage,
    messages: Vec<BotMessage>,
}

/// GET /api/intake/status
async fn get_status(State(state): State<IntakeRouteState>) -> impl IntoResponse {
    Json(SessionStatus::from(state.agent.snapshot().await))
}

/// POST /api/intake/events
///
/// Accepts any applicant input. Completion events are produced by the server
/// itself and are refused here.
async fn post_event(
    State(state): State<IntakeRouteState>,
    Json(input): Json<Input>,
) -> impl IntoResponse {
    if input.is_completion() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Completion events cannot be submitted"})),
        )
            .into_response();
    }
    let messages = state.agent.handle(input).await;
    let stage = state.agent.snapshot().await.stage;
    Json(EventResponse { stage, messages }).into_response()
}

/// GET /api/intake/sanction
///
/// Returns the sanction letter and its Markdown rendering, or 409 before the
/// applicant has been sanctioned.
async fn get_sanction(State(state): State<IntakeRouteState>) -> impl IntoResponse {
    match state.agent.sanction_letter().await {
        Ok(letter) => {
            let markdown = letter.to_markdown();
            Json(serde_json::json!({"letter": letter, "markdown": markdown})).into_response()
        }
        Err(e) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// Build the intake REST routes.
pub fn intake_routes(state: IntakeRouteState) -> Router {
    Router::new()
        .route("/api/intake/status", get(get_status))
        .route("/api/intake/events", post(post_event))
        .route("/api/intake/sanction", get(get_sanction))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::config::IntakeConfig;
    use crate::reply::StaticReplyGenerator;
    use crate::verification::MockVerificationBackend;

    fn app() -> Router {
        let agent = IntakeAgent::new(
            IntakeConfig::default(),
            Arc::new(MockVerificationBackend::instant()),
            Arc::new(StaticReplyGenerator::default()),
        );
        intake_routes(IntakeRouteState {
            agent: Arc::new(agent),
        })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn event(json: serde_json::Value) -> Request<Body> {
        Request::post("/api/intake/events")
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn status_of_fresh_session() {
        let response = app()
            .oneshot(Request::get("/api/intake/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["stage"], "GREETING");
        assert_eq!(json["language"], "en");
        assert_eq!(json["kyc_verified"], false);
        assert_eq!(json["accepts_free_text"], true);
        assert_eq!(json["restart_required"], false);
    }

    #[tokio::test]
    async fn free_text_event_advances() {
        let response = app()
            .oneshot(event(serde_json::json!({"type": "free_text", "text": "yes"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["stage"], "NAME_COLLECTION");
        assert_eq!(json["messages"][0]["kind"], "text");
    }

    #[tokio::test]
    async fn completion_events_are_refused() {
        let response = app()
            .oneshot(event(serde_json::json!({
                "type": "otp_checked",
                "session_id": SessionId::new(),
                "confirmed": true
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_event_is_a_client_error() {
        let response = app()
            .oneshot(event(serde_json::json!({"type": "teleport"})))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn sanction_before_completion_conflicts() {
        let response = app()
            .oneshot(Request::get("/api/intake/sanction").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("GREETING"));
    }
}
