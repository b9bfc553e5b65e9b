use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tessera_core::model::{Event, Section};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}/availability", get(event_availability))
        .route("/events/{id}/lock", post(lock_seat))
        .route("/events/{id}/purchase", post(purchase_tickets))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateEventRequest {
    #[serde(default)]
    name: String,
    date: Option<DateTime<Utc>>,
    #[serde(default)]
    sections: Vec<Section>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockSeatRequest {
    #[serde(default)]
    section_name: String,
    #[serde(default)]
    row_name: String,
    #[serde(default)]
    session_id: String,
    #[serde(default)]
    seat_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PurchaseRequest {
    #[serde(default)]
    section_name: String,
    #[serde(default)]
    row_name: String,
    #[serde(default)]
    session_id: String,
    #[serde(default)]
    number_of_tickets: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    message: String,
    data: Vec<Event>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventResponse {
    message: String,
    data: Event,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LockSeatResponse {
    message: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PurchaseResponse {
    message: String,
    data: Event,
    group_discount: bool,
}

async fn list_events(State(state): State<AppState>) -> Result<Json<EventListResponse>, AppError> {
    let events = state.service.list_events().await?;
    Ok(Json(EventListResponse {
        message: "Events fetched successfully".to_string(),
        data: events,
    }))
}

async fn event_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventResponse>, AppError> {
    let event = state.service.get_event(id).await?;
    Ok(Json(EventResponse {
        message: "Event details fetched successfully".to_string(),
        data: event,
    }))
}

async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    let event = state
        .service
        .create_event(&req.name, req.date, req.sections)
        .await?;
    Ok(Json(EventResponse {
        message: "Event created successfully".to_string(),
        data: event,
    }))
}

async fn lock_seat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LockSeatRequest>,
) -> Result<Json<LockSeatResponse>, AppError> {
    let expires_at = state
        .service
        .lock_seat(
            id,
            &req.section_name,
            &req.row_name,
            &req.session_id,
            &req.seat_id,
        )
        .await?;
    Ok(Json(LockSeatResponse {
        message: "Seat locked successfully".to_string(),
        expires_at,
    }))
}

async fn purchase_tickets(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>, AppError> {
    let outcome = state
        .service
        .purchase(
            id,
            &req.section_name,
            &req.row_name,
            &req.session_id,
            req.number_of_tickets,
        )
        .await?;

    let message = if outcome.group_discount {
        "Ticket purchased successfully and group discount has applied"
    } else {
        "Tickets purchased successfully"
    };

    Ok(Json(PurchaseResponse {
        message: message.to_string(),
        data: outcome.event,
        group_discount: outcome.group_discount,
    }))
}
