use axum::{
    extract::{ws::WebSocketUpgrade, State as AxumState},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::Simulator;

#[derive(Debug, Serialize)]
struct DropResponse {
    accepted: bool,
}

pub struct Api {
    simulator: Arc<Simulator>,
}

impl Api {
    pub fn new(simulator: Arc<Simulator>) -> Self {
        Self { simulator }
    }

    pub fn router(&self) -> Router {
        // Configure CORS
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);

        Router::new()
            .route("/drop", post(request_drop))
            .route("/state", get(query_state))
            .route("/balls", get(query_balls))
            .route("/board", get(query_board))
            .route("/metrics", get(query_metrics))
            .route("/updates", get(updates_ws))
            .layer(cors)
            .with_state(self.simulator.clone())
    }
}

async fn request_drop(AxumState(simulator): AxumState<Arc<Simulator>>) -> impl IntoResponse {
    let accepted = simulator.request_drop();
    Json(DropResponse { accepted })
}

async fn query_state(AxumState(simulator): AxumState<Arc<Simulator>>) -> impl IntoResponse {
    match simulator.snapshot() {
        Some(snapshot) => Json(snapshot).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn query_balls(AxumState(simulator): AxumState<Arc<Simulator>>) -> impl IntoResponse {
    match simulator.balls() {
        Some(balls) => Json(balls).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn query_board(AxumState(simulator): AxumState<Arc<Simulator>>) -> impl IntoResponse {
    Json(simulator.board().clone())
}

async fn query_metrics(AxumState(simulator): AxumState<Arc<Simulator>>) -> impl IntoResponse {
    match simulator.encode_metrics() {
        Some(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn updates_ws(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_updates_ws(socket, simulator))
}

async fn handle_updates_ws(socket: axum::extract::ws::WebSocket, simulator: Arc<Simulator>) {
    tracing::info!("Updates WebSocket connected");
    let (mut sender, mut receiver) = socket.split();
    let mut updates = simulator.update_subscriber();

    loop {
        tokio::select! {
            // Handle incoming WebSocket messages (ping/pong/close)
            msg = receiver.next() => {
                match msg {
                    Some(Ok(axum::extract::ws::Message::Close(_))) => {
                        tracing::info!("Client closed WebSocket connection");
                        break;
                    }
                    Some(Ok(axum::extract::ws::Message::Ping(data))) => {
                        if sender.send(axum::extract::ws::Message::Pong(data)).await.is_err() {
                            tracing::warn!("Failed to send pong, client disconnected");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket error: {:?}", e);
                        break;
                    }
                    None => {
                        tracing::info!("WebSocket stream ended");
                        break;
                    }
                    _ => {}
                }
            }
            update_result = updates.recv() => {
                match update_result {
                    Ok(update) => {
                        let text = match serde_json::to_string(&update) {
                            Ok(text) => text,
                            Err(e) => {
                                tracing::error!("Failed to serialize update: {}", e);
                                continue;
                            }
                        };
                        if sender
                            .send(axum::extract::ws::Message::Text(text))
                            .await
                            .is_err()
                        {
                            tracing::warn!("Failed to send update, client disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // The next update carries a full snapshot, so the client recovers
                        tracing::warn!(
                            "WebSocket client lagged behind, skipped {} updates",
                            skipped
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Broadcast channel closed");
                        break;
                    }
                }
            }
        }
    }
    tracing::info!("Updates WebSocket handler exiting");
    let _ = sender.close().await;
}
