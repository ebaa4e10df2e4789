use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::HeaderMap,
    response::Response,
};
use futures::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use gamehub_app::domain::{
    MatchId, TeamId, TournamentId, UserId,
    event::Room,
};
use serde::{Deserialize, Serialize};
use tokio::{
    select,
    sync::mpsc::{UnboundedReceiver, UnboundedSender},
};
use tokio_util::sync::CancellationToken;

use crate::{
    AppState,
    error::ServiceError,
    rooms::{ConnectionId, parse_room},
};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    token: Option<String>,
}

/// Authenticates before upgrading; a missing or rejected token never reaches the socket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    State(app): State<AppState>,
) -> Result<Response, ServiceError> {
    let token = params
        .token
        .or_else(|| bearer_token(&headers))
        .ok_or_else(|| ServiceError::Unauthorized("Authentication error".to_string()))?;
    let user = app
        .app
        .account_authenticate_use_case
        .authenticate(&token)
        .await
        .map_err(|_| ServiceError::Unauthorized("Authentication error".to_string()))?;

    Ok(ws.on_upgrade(move |socket| async move {
        let (ws_sender, ws_receiver) = socket.split();
        let cancellation_token = CancellationToken::new();
        let conn_id = ConnectionId::new();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        app.realtime.connect(
            conn_id,
            user.id,
            user.username.clone(),
            tx.clone(),
            cancellation_token.clone(),
        );
        log::info!("User {} connected on {}", user.username, conn_id);

        let receive_task = tokio::spawn(receive_ws(
            app.clone(),
            ws_receiver,
            cancellation_token.clone(),
            conn_id,
            tx,
        ));
        let send_task = tokio::spawn(send_ws(ws_sender, rx, cancellation_token.clone()));

        let (receive_res, send_res) = tokio::join!(receive_task, send_task);
        if let Err(e) = receive_res {
            log::error!("WebSocket receive task failed: {}", e);
        }
        if let Err(e) = send_res {
            log::error!("WebSocket send task failed: {}", e);
        }

        app.realtime.disconnect(conn_id);
        log::info!("User {} disconnected from {}", user.username, conn_id);
    }))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

async fn receive_ws(
    app: AppState,
    mut ws_receiver: SplitStream<WebSocket>,
    cancellation_token: CancellationToken,
    conn_id: ConnectionId,
    sender: UnboundedSender<String>,
) {
    while let Some(msg) = select! {
        _ = cancellation_token.cancelled() => None,
        msg = ws_receiver.next() => msg,
    } {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    log::debug!("Received WS event from {}: {:?}", conn_id, event);
                    if let Err(e) = handle_client_event(&app, conn_id, event) {
                        let _ = sender.send(ServerFrame::error(&e.to_string()).encode());
                    }
                }
                Err(e) => {
                    log::warn!("Failed to parse WS message from {}: {}", conn_id, e);
                    let _ = sender.send(ServerFrame::error("Invalid message format").encode());
                }
            },
            Ok(Message::Close(frame)) => {
                log::debug!("WS connection {} closed: {:?}", conn_id, frame);
                break;
            }
            Err(e) => {
                log::warn!("WS error on {}: {}", conn_id, e);
                break;
            }
            _ => {}
        }
    }
    cancellation_token.cancel();
}

async fn send_ws(
    mut ws_sender: SplitSink<WebSocket, Message>,
    mut channel: UnboundedReceiver<String>,
    cancellation_token: CancellationToken,
) {
    while let Some(frame) = select! {
        _ = cancellation_token.cancelled() => None,
        frame = channel.recv() => frame,
    } {
        if let Err(e) = ws_sender.send(Message::Text(frame.into())).await {
            log::debug!("Failed to send WS message: {}", e);
            break;
        }
    }
    cancellation_token.cancel();
}

fn handle_client_event(
    app: &AppState,
    conn_id: ConnectionId,
    event: ClientEvent,
) -> Result<(), ServiceError> {
    let hub = &app.realtime;
    match event {
        ClientEvent::JoinTournament(id) => hub.join(conn_id, Room::Tournament(id)),
        ClientEvent::LeaveTournament(id) => {
            hub.leave(conn_id, &Room::Tournament(id));
        }
        ClientEvent::JoinTeam(id) => hub.join(conn_id, Room::Team(id)),
        ClientEvent::LeaveTeam(id) => {
            hub.leave(conn_id, &Room::Team(id));
        }
        ClientEvent::JoinMatch(id) => hub.join(conn_id, Room::Match(id)),
        ClientEvent::LeaveMatch(id) => {
            hub.leave(conn_id, &Room::Match(id));
        }
        ClientEvent::SendMessage(chat) => {
            let (room, (user_id, username)) = chat_target(app, conn_id, &chat.room)?;
            let frame = ServerFrame::NewMessage {
                id: uuid::Uuid::new_v4().to_string(),
                user_id,
                username,
                message: chat.message,
                timestamp: chrono::Utc::now().to_rfc3339(),
                kind: chat.kind,
            };
            hub.broadcast(&room, &frame.encode(), None);
        }
        ClientEvent::TypingStart(typing) => {
            let (room, (user_id, username)) = chat_target(app, conn_id, &typing.room)?;
            let frame = ServerFrame::UserTyping { user_id, username };
            hub.broadcast(&room, &frame.encode(), Some(conn_id));
        }
        ClientEvent::TypingStop(typing) => {
            let (room, (user_id, username)) = chat_target(app, conn_id, &typing.room)?;
            let frame = ServerFrame::UserStoppedTyping { user_id, username };
            hub.broadcast(&room, &frame.encode(), Some(conn_id));
        }
    }
    Ok(())
}

/// Chat goes only to rooms the sender has joined.
fn chat_target(
    app: &AppState,
    conn_id: ConnectionId,
    room: &str,
) -> Result<(Room, (UserId, String)), ServiceError> {
    let room = parse_room(room)
        .ok_or_else(|| ServiceError::BadRequest(format!("Unknown room {}", room)))?;
    if !app.realtime.is_joined(conn_id, &room) {
        return Err(ServiceError::Forbidden(format!("Not joined to {}", room)));
    }
    let identity = app
        .realtime
        .identity(conn_id)
        .ok_or_else(|| ServiceError::Unauthorized("Connection closed".to_string()))?;
    Ok((room, identity))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinTournament(TournamentId),
    LeaveTournament(TournamentId),
    JoinTeam(TeamId),
    LeaveTeam(TeamId),
    JoinMatch(MatchId),
    LeaveMatch(MatchId),
    SendMessage(ChatMessage),
    TypingStart(Typing),
    TypingStop(Typing),
}

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    room: String,
    message: String,
    #[serde(rename = "type", default = "default_chat_kind")]
    kind: String,
}

#[derive(Debug, Deserialize)]
pub struct Typing {
    room: String,
}

fn default_chat_kind() -> String {
    "general".to_string()
}

#[derive(Debug, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
enum ServerFrame {
    NewMessage {
        id: String,
        user_id: UserId,
        username: String,
        message: String,
        timestamp: String,
        #[serde(rename = "type")]
        kind: String,
    },
    UserTyping {
        user_id: UserId,
        username: String,
    },
    UserStoppedTyping {
        user_id: UserId,
        username: String,
    },
    Error {
        message: String,
    },
}

impl ServerFrame {
    fn error(message: &str) -> Self {
        ServerFrame::Error {
            message: message.to_string(),
        }
    }

    fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            log::error!("Failed to serialize WS frame: {}", e);
            r#"{"event":"error","data":{"message":"Internal server error"}}"#.to_string()
        })
    }
}
