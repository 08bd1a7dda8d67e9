//! Live feed of generated batches over WebSocket.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tracing::{debug, warn};

use crate::{controller::AppState, domain::Batch};

/// GET /api/v1/readings/live - pushes every new batch as a JSON array
pub async fn live_readings(ws: WebSocketUpgrade, State(st): State<AppState>) -> impl IntoResponse {
    let rx = st.live.subscribe();
    ws.on_upgrade(move |socket| stream_batches(socket, rx))
}

async fn stream_batches(mut socket: WebSocket, mut rx: Receiver<Batch>) {
    debug!("live client connected");
    while let Some(text) = next_frame(&mut rx).await {
        if socket.send(Message::Text(text)).await.is_err() {
            break;
        }
    }
    debug!("live client disconnected");
}

/// Next batch encoded as a JSON array. Lagging receivers skip ahead to the
/// oldest batch still buffered; `None` once the channel is closed.
async fn next_frame(rx: &mut Receiver<Batch>) -> Option<String> {
    loop {
        let batch = match rx.recv().await {
            Ok(batch) => batch,
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "live client lagging, dropped batches");
                continue;
            }
            Err(RecvError::Closed) => return None,
        };

        match serde_json::to_string(&*batch) {
            Ok(text) => return Some(text),
            Err(e) => warn!(error = %e, "failed to encode batch for live client"),
        }
    }
}
