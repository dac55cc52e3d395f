//! WebSocket transport for SimChess.
//!
//! Implements the event set the game core is driven through: clients send
//! `join` and `submit_move` commands, the server pushes `joined`,
//! `player_joined`, `move_submitted`, `moves_processed` and `error` events
//! back. One `WsSession` actor per connection; a `GameBroadcaster` actor
//! fans events out to every session subscribed to a game.
//!
//! There is no REST surface, no archive/replay, no i18n — this adapter
//! exists only to carry moves into [`crate::game::Game`] and broadcast the
//! resulting state back out.

use actix::prelude::*;
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::board::Color;
use crate::game::{GameId, GameRegistry};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Broadcaster messages (actor mailbox protocol)
// ---------------------------------------------------------------------------

#[derive(Message)]
#[rtype(result = "()")]
struct Connect {
    addr: Addr<WsSession>,
    session_id: Uuid,
}

#[derive(Message)]
#[rtype(result = "()")]
struct Disconnect {
    session_id: Uuid,
}

#[derive(Message)]
#[rtype(result = "()")]
struct Subscribe {
    session_id: Uuid,
    game_id: GameId,
}

/// Pushed to every session subscribed to a game, except `exclude` (used for
/// `player_joined`, which goes to the other seat but not the joiner).
#[derive(Message)]
#[rtype(result = "()")]
struct BroadcastToGame {
    game_id: GameId,
    exclude: Option<Uuid>,
    payload: String,
}

#[derive(Message)]
#[rtype(result = "()")]
struct WsText(String);

// ---------------------------------------------------------------------------
// GameBroadcaster — fans events out to subscribed sessions
// ---------------------------------------------------------------------------

#[derive(Default)]
struct GameBroadcaster {
    sessions: HashMap<Uuid, Addr<WsSession>>,
    subscriptions: HashMap<GameId, HashSet<Uuid>>,
}

impl Actor for GameBroadcaster {
    type Context = Context<Self>;
}

impl Handler<Connect> for GameBroadcaster {
    type Result = ();
    fn handle(&mut self, msg: Connect, _ctx: &mut Context<Self>) {
        self.sessions.insert(msg.session_id, msg.addr);
    }
}

impl Handler<Disconnect> for GameBroadcaster {
    type Result = ();
    fn handle(&mut self, msg: Disconnect, _ctx: &mut Context<Self>) {
        self.sessions.remove(&msg.session_id);
        for subscribers in self.subscriptions.values_mut() {
            subscribers.remove(&msg.session_id);
        }
        self.subscriptions.retain(|_, subs| !subs.is_empty());
    }
}

impl Handler<Subscribe> for GameBroadcaster {
    type Result = ();
    fn handle(&mut self, msg: Subscribe, _ctx: &mut Context<Self>) {
        self.subscriptions.entry(msg.game_id).or_default().insert(msg.session_id);
    }
}

impl Handler<BroadcastToGame> for GameBroadcaster {
    type Result = ();
    fn handle(&mut self, msg: BroadcastToGame, _ctx: &mut Context<Self>) {
        let Some(subscribers) = self.subscriptions.get(&msg.game_id) else { return };
        for session_id in subscribers {
            if Some(*session_id) == msg.exclude {
                continue;
            }
            if let Some(addr) = self.sessions.get(session_id) {
                addr.do_send(WsText(msg.payload.clone()));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Client → server commands
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ClientCommand {
    Join { game_id: String },
    SubmitMove { game_id: String, #[serde(rename = "move")] move_text: String },
}

// ---------------------------------------------------------------------------
// Server → client event helpers
// ---------------------------------------------------------------------------

fn event_json(event: &str, fields: serde_json::Value) -> String {
    let mut obj = serde_json::json!({ "event": event });
    if let (Some(obj_map), Some(fields_map)) = (obj.as_object_mut(), fields.as_object()) {
        for (k, v) in fields_map {
            obj_map.insert(k.clone(), v.clone());
        }
    }
    obj.to_string()
}

fn error_event(message: &str) -> String {
    event_json("error", serde_json::json!({ "message": message }))
}

// ---------------------------------------------------------------------------
// WsSession — per-connection actor
// ---------------------------------------------------------------------------

pub struct WsSession {
    id: Uuid,
    last_heartbeat: Instant,
    registry: web::Data<GameRegistry>,
    broadcaster: Addr<GameBroadcaster>,
    game_id: Option<GameId>,
    color: Option<Color>,
}

impl WsSession {
    fn new(registry: web::Data<GameRegistry>, broadcaster: Addr<GameBroadcaster>) -> Self {
        Self {
            id: Uuid::new_v4(),
            last_heartbeat: Instant::now(),
            registry,
            broadcaster,
            game_id: None,
            color: None,
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > CLIENT_TIMEOUT {
                log::warn!("session {} heartbeat timeout, disconnecting", act.id);
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn handle_message(&mut self, text: &str, ctx: &mut ws::WebsocketContext<Self>) {
        let command: ClientCommand = match serde_json::from_str(text) {
            Ok(c) => c,
            Err(e) => {
                ctx.text(error_event(&format!("Invalid message: {}", e)));
                return;
            }
        };

        match command {
            ClientCommand::Join { game_id } => self.handle_join(&game_id, ctx),
            ClientCommand::SubmitMove { game_id, move_text } => {
                self.handle_submit_move(&game_id, &move_text, ctx)
            }
        }
    }

    fn handle_join(&mut self, game_id: &str, ctx: &mut ws::WebsocketContext<Self>) {
        let game_id = match Uuid::parse_str(game_id) {
            Ok(id) => id,
            Err(_) => {
                ctx.text(error_event(&format!("Invalid game_id: {}", game_id)));
                return;
            }
        };
        let Some(game) = self.registry.get_game(game_id) else {
            ctx.text(error_event("Game not found"));
            return;
        };

        let color = {
            let mut game = game.lock().expect("game mutex poisoned");
            match game.assign_player(self.id.to_string()) {
                Some(color) => color,
                None => {
                    ctx.text(error_event("Game is full"));
                    return;
                }
            }
        };

        self.game_id = Some(game_id);
        self.color = Some(color);
        self.broadcaster.do_send(Subscribe { session_id: self.id, game_id });

        let snapshot = game.lock().expect("game mutex poisoned").snapshot();
        log::info!("session {}: joined game {} as {}", self.id, game_id, color);

        ctx.text(event_json(
            "joined",
            serde_json::json!({ "color": color, "game_state": snapshot }),
        ));

        self.broadcaster.do_send(BroadcastToGame {
            game_id,
            exclude: Some(self.id),
            payload: event_json(
                "player_joined",
                serde_json::json!({ "color": color, "game_state": snapshot }),
            ),
        });
    }

    fn handle_submit_move(&mut self, game_id: &str, move_text: &str, ctx: &mut ws::WebsocketContext<Self>) {
        let Some(color) = self.color else {
            ctx.text(error_event("Join a game before submitting a move"));
            return;
        };
        let Some(expected_game_id) = self.game_id else {
            ctx.text(error_event("Join a game before submitting a move"));
            return;
        };
        if Uuid::parse_str(game_id).ok() != Some(expected_game_id) {
            ctx.text(error_event("Move submitted for a different game than joined"));
            return;
        };
        let Some(game) = self.registry.get_game(expected_game_id) else {
            ctx.text(error_event("Game not found"));
            return;
        };

        let (resolve_outcome, snapshot) = {
            let mut game = game.lock().expect("game mutex poisoned");
            let outcome = match game.submit_move(color, move_text) {
                Ok(outcome) => outcome,
                Err(e) => {
                    ctx.text(error_event(&e));
                    return;
                }
            };
            (outcome, game.snapshot())
        };

        self.broadcaster.do_send(BroadcastToGame {
            game_id: expected_game_id,
            exclude: None,
            payload: event_json(
                "move_submitted",
                serde_json::json!({ "color": color, "game_state": snapshot }),
            ),
        });

        if let Some(result) = resolve_outcome {
            self.broadcaster.do_send(BroadcastToGame {
                game_id: expected_game_id,
                exclude: None,
                payload: event_json(
                    "moves_processed",
                    serde_json::json!({ "result": result, "game_state": snapshot }),
                ),
            });
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        log::info!("session {} started", self.id);
        self.start_heartbeat(ctx);
        self.broadcaster.do_send(Connect { addr: ctx.address(), session_id: self.id });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        log::info!("session {} stopped", self.id);
        self.broadcaster.do_send(Disconnect { session_id: self.id });
    }
}

impl actix::StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => self.handle_message(&text, ctx),
            Ok(ws::Message::Binary(_)) => {
                ctx.text(error_event("Binary messages are not supported"));
            }
            Ok(ws::Message::Ping(data)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&data);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                log::error!("session protocol error: {}", e);
                ctx.stop();
            }
        }
    }
}

impl Handler<WsText> for WsSession {
    type Result = ();
    fn handle(&mut self, msg: WsText, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

// ---------------------------------------------------------------------------
// HTTP → WebSocket upgrade handler + shared broadcaster state
// ---------------------------------------------------------------------------

/// Shared state the `/ws` route needs: the game registry and the singleton
/// broadcaster actor. Constructed once in `main` and cloned into each route.
#[derive(Clone)]
pub struct TransportState {
    registry: web::Data<GameRegistry>,
    broadcaster: Addr<GameBroadcaster>,
}

impl TransportState {
    pub fn new(registry: web::Data<GameRegistry>) -> Self {
        Self { registry, broadcaster: GameBroadcaster::default().start() }
    }
}

pub async fn ws_connect(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<TransportState>,
) -> Result<HttpResponse, actix_web::Error> {
    let session = WsSession::new(state.registry.clone(), state.broadcaster.clone());
    log::info!("new websocket connection from {:?}", req.peer_addr());
    ws::start(session, &req, stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_event_has_message_field() {
        let json = error_event("Game not found");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["event"], "error");
        assert_eq!(value["message"], "Game not found");
    }

    #[test]
    fn join_command_parses_from_json() {
        let command: ClientCommand =
            serde_json::from_str(r#"{"action":"join","game_id":"abc"}"#).unwrap();
        assert!(matches!(command, ClientCommand::Join { game_id } if game_id == "abc"));
    }

    #[test]
    fn submit_move_command_parses_move_field() {
        let command: ClientCommand = serde_json::from_str(
            r#"{"action":"submit_move","game_id":"abc","move":"e2e4"}"#,
        )
        .unwrap();
        match command {
            ClientCommand::SubmitMove { game_id, move_text } => {
                assert_eq!(game_id, "abc");
                assert_eq!(move_text, "e2e4");
            }
            _ => panic!("expected SubmitMove"),
        }
    }
}
