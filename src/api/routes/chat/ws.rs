//! Streams chat replies over a WebSocket. Each inbound text frame is
//! one user message and each outbound text frame is one fragment of
//! the reply.

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{CloseFrame, Message as WsMessage, Utf8Bytes, WebSocket, close_code},
    },
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::ai::chat::{RelayError, SharedSession, chat_stream};
use crate::api::state::SharedState;
use crate::api::utils::{new_session_id, session_id};
use crate::openai::OpenAiClient;

/// WebSocket upgrade handler.
///
/// GET /ws
pub async fn ws_handler(
    State(state): State<SharedState>,
    jar: CookieJar,
    ws: WebSocketUpgrade,
) -> Response {
    // Browsers send the session cookie with the upgrade request. Other
    // clients get a session scoped to the connection.
    let session_id = session_id(&jar).unwrap_or_else(new_session_id);
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state, session_id))
}

async fn handle_ws_connection(socket: WebSocket, state: SharedState, session_id: String) {
    let session = match state.sessions.get_or_create(&session_id) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to open chat session {}: {}", session_id, e);
            return;
        }
    };
    tracing::info!("WebSocket connection opened for session {}", session_id);

    let (mut sender, mut receiver) = socket.split();
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();
    let (fragment_tx, fragment_rx) = mpsc::unbounded_channel::<String>();
    let cancel = CancellationToken::new();

    // Forward reply fragments to the client. Hands the sink back once
    // there is nothing left to send so a close frame can follow.
    let writer_cancel = cancel.clone();
    let send_task = tokio::spawn(async move {
        let mut fragments = UnboundedReceiverStream::new(fragment_rx);
        while let Some(fragment) = fragments.next().await {
            if sender.send(WsMessage::Text(fragment.into())).await.is_err() {
                writer_cancel.cancel();
                break;
            }
        }
        sender
    });

    let turn_task = tokio::spawn(run_turns(
        state.client.clone(),
        session,
        input_rx,
        fragment_tx,
        cancel.clone(),
    ));

    // Messages sent while a reply is still streaming are queued and
    // answered in order
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break,
            msg = receiver.next() => msg,
        };
        match msg {
            Some(Ok(WsMessage::Text(text))) => {
                if input_tx.send(text.to_string()).is_err() {
                    break;
                }
            }
            Some(Ok(WsMessage::Close(_))) | None => {
                tracing::info!("Client closed WebSocket for session {}", session_id);
                break;
            }
            Some(Ok(_)) => {
                // Binary, ping and pong frames carry no chat input
            }
            Some(Err(e)) => {
                tracing::warn!("WebSocket error for session {}: {}", session_id, e);
                break;
            }
        }
    }

    // Stops any reply still in flight
    cancel.cancel();
    drop(input_tx);

    let close_frame = match turn_task.await {
        Ok(Err(RelayError::Upstream(e))) => {
            tracing::error!("Chat stream failed for session {}: {}", session_id, e);
            Some(CloseFrame {
                code: close_code::ERROR,
                reason: Utf8Bytes::from_static("Chat completion failed"),
            })
        }
        Ok(_) => None,
        Err(e) => {
            tracing::error!("Chat turn task for session {} panicked: {}", session_id, e);
            Some(CloseFrame {
                code: close_code::ERROR,
                reason: Utf8Bytes::from_static("Internal error"),
            })
        }
    };

    if let Ok(mut sender) = send_task.await {
        if let Some(frame) = close_frame {
            // The client may already be gone
            let _ = sender.send(WsMessage::Close(Some(frame))).await;
        }
        let _ = sender.close().await;
    }

    tracing::info!("WebSocket connection closed for session {}", session_id);
}

/// Answer each queued user message in turn. Returns when the input
/// is exhausted, the client disconnects, or a reply fails.
async fn run_turns(
    client: OpenAiClient,
    session: SharedSession,
    mut input_rx: mpsc::UnboundedReceiver<String>,
    fragment_tx: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
) -> Result<(), RelayError> {
    loop {
        let user_input = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            input = input_rx.recv() => match input {
                Some(input) => input,
                None => return Ok(()),
            },
        };

        // Another connection on the same session may be mid turn
        let mut turn = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            turn = session.lock() => turn,
        };
        match chat_stream(&client, &mut turn, &user_input, &fragment_tx, &cancel).await {
            Ok(_) => {}
            Err(RelayError::Disconnected) => return Ok(()),
            Err(e) => {
                // Wakes the reader so the connection gets closed
                cancel.cancel();
                return Err(e);
            }
        }
    }
}
