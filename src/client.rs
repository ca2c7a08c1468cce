//! Message client: one duplex WebSocket channel to the computation backend.
//!
//! The socket lives on a background thread running a small tokio runtime. The
//! UI thread never blocks: [`MessageClient::send`] only queues text for the
//! I/O thread and [`MessageClient::poll`] drains whatever arrived since the
//! last frame.
//!
//! Replies are matched to requests by action. At most one request per action
//! is in flight; a further request with the same action waits in a single
//! deferred slot (latest wins) and is written as soon as the in-flight reply
//! arrives. Requests also carry a correlation id, and replies that echo a
//! different id than the one in flight are dropped as stale.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::tungstenite::Message;

use crate::protocol::{
    decode_incoming, sniff_action, Action, Incoming, ProtocolError, Reply, Request, RequestId,
};

/// What the I/O thread reports to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Opened,
    Text(String),
    /// The channel closed or could not be opened. Terminal.
    Closed(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Disconnected { reason: Option<String> },
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("backend channel is disconnected")]
    Disconnected,
    #[error("backend channel is not open yet")]
    NotOpen,
    #[error("could not encode request: {0}")]
    Encode(#[from] ProtocolError),
}

/// What happened to a request handed to [`MessageClient::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Written to the channel with this id.
    Sent(RequestId),
    /// Waiting for the in-flight request of the same action. `replaced` is
    /// `true` when an older deferred request was superseded.
    Deferred { replaced: bool },
}

/// Things the orchestrator must react to, in arrival order.
#[derive(Debug)]
pub enum ClientNotice {
    Opened,
    /// A deferred request was written after its predecessor's reply.
    Sent { action: Action, id: RequestId },
    /// `id` is the request this reply answered, or the echoed id of an
    /// unsolicited reply.
    Reply { id: Option<RequestId>, reply: Reply },
    /// A reply could not be decoded. `action` is known when the envelope was readable.
    DecodeFailed {
        action: Option<Action>,
        error: ProtocolError,
    },
    Disconnected { reason: Option<String> },
}

pub struct MessageClient {
    outgoing: UnboundedSender<String>,
    incoming: Receiver<ChannelEvent>,
    state: ConnectionState,
    in_flight: HashMap<Action, RequestId>,
    deferred: HashMap<Action, Request>,
    next_id: RequestId,
}

impl MessageClient {
    /// Open a WebSocket to `url` on a background thread.
    ///
    /// `repaint` is poked on every arrival so an idle UI wakes up to process it.
    pub fn connect(url: &str, repaint: Option<egui::Context>) -> Self {
        let (outgoing, out_rx) = unbounded_channel();
        let (in_tx, incoming) = std::sync::mpsc::channel();
        let url = url.to_string();
        let spawned = std::thread::Builder::new()
            .name("linkplot-ws".into())
            .spawn({
                let in_tx = in_tx.clone();
                move || run_io_thread(url, out_rx, in_tx, repaint)
            });
        if let Err(e) = spawned {
            log::error!("failed to spawn websocket thread: {e}");
            let _ = in_tx.send(ChannelEvent::Closed(Some(e.to_string())));
        }
        Self::from_channels(outgoing, incoming)
    }

    /// Build a client over raw channels. The other ends play the role of the I/O thread.
    pub fn from_channels(outgoing: UnboundedSender<String>, incoming: Receiver<ChannelEvent>) -> Self {
        Self {
            outgoing,
            incoming,
            state: ConnectionState::Connecting,
            in_flight: HashMap::new(),
            deferred: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Id of the request currently awaiting a reply for `action`.
    pub fn in_flight(&self, action: Action) -> Option<RequestId> {
        self.in_flight.get(&action).copied()
    }

    pub fn has_deferred(&self, action: Action) -> bool {
        self.deferred.contains_key(&action)
    }

    /// Send `request`, or defer it behind an in-flight request of the same action.
    pub fn send(&mut self, request: Request) -> Result<SendOutcome, ClientError> {
        match self.state {
            ConnectionState::Open => {}
            ConnectionState::Connecting => return Err(ClientError::NotOpen),
            ConnectionState::Disconnected { .. } => return Err(ClientError::Disconnected),
        }
        let action = request.action();
        if self.in_flight.contains_key(&action) {
            let replaced = self.deferred.insert(action, request).is_some();
            log::debug!("{action} already in flight, deferring (replaced: {replaced})");
            return Ok(SendOutcome::Deferred { replaced });
        }
        self.write(request).map(SendOutcome::Sent)
    }

    fn write(&mut self, request: Request) -> Result<RequestId, ClientError> {
        let action = request.action();
        let id = self.next_id;
        let text = request.encode(id)?;
        if self.outgoing.send(text).is_err() {
            self.mark_disconnected(Some("I/O thread stopped".to_string()));
            return Err(ClientError::Disconnected);
        }
        self.next_id += 1;
        self.in_flight.insert(action, id);
        log::debug!("sent {action} (id {id})");
        Ok(id)
    }

    /// Drain everything that arrived since the last call.
    pub fn poll(&mut self) -> Vec<ClientNotice> {
        let mut notices = Vec::new();
        loop {
            match self.incoming.try_recv() {
                Ok(ChannelEvent::Opened) => {
                    if matches!(self.state, ConnectionState::Connecting) {
                        log::info!("backend channel open");
                        self.state = ConnectionState::Open;
                        notices.push(ClientNotice::Opened);
                    }
                }
                Ok(ChannelEvent::Text(text)) => self.handle_text(&text, &mut notices),
                Ok(ChannelEvent::Closed(reason)) => {
                    if self.mark_disconnected(reason.clone()) {
                        notices.push(ClientNotice::Disconnected { reason });
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    let reason = Some("I/O thread stopped".to_string());
                    if self.mark_disconnected(reason.clone()) {
                        notices.push(ClientNotice::Disconnected { reason });
                    }
                    break;
                }
            }
        }
        notices
    }

    fn handle_text(&mut self, text: &str, notices: &mut Vec<ClientNotice>) {
        if !self.state.is_open() {
            return;
        }
        let incoming = match decode_incoming(text) {
            Ok(inc) => inc,
            // Still answers the in-flight request when the action can be read.
            Err(error) => match sniff_action(text) {
                Some(action) => Incoming {
                    action,
                    id: None,
                    body: Err(error),
                },
                None => {
                    log::warn!("undecodable message from backend: {error}");
                    notices.push(ClientNotice::DecodeFailed {
                        action: None,
                        error,
                    });
                    return;
                }
            },
        };
        let action = incoming.action;
        let answered = match (self.in_flight.get(&action).copied(), incoming.id) {
            (Some(expected), Some(got)) if expected != got => {
                log::warn!("dropping stale {action} reply (id {got}, waiting for {expected})");
                return;
            }
            (Some(expected), _) => {
                self.in_flight.remove(&action);
                Some(expected)
            }
            (None, got) => {
                log::debug!("unsolicited {action} reply");
                got
            }
        };

        match incoming.body {
            Ok(reply) => notices.push(ClientNotice::Reply {
                id: answered,
                reply,
            }),
            Err(error) => {
                log::warn!("invalid {action} reply: {error}");
                notices.push(ClientNotice::DecodeFailed {
                    action: Some(action),
                    error,
                });
            }
        }

        if let Some(next) = self.deferred.remove(&action) {
            match self.write(next) {
                Ok(id) => notices.push(ClientNotice::Sent { action, id }),
                Err(ClientError::Disconnected) => notices.push(ClientNotice::Disconnected {
                    reason: Some("I/O thread stopped".to_string()),
                }),
                Err(e) => log::error!("deferred {action} request failed: {e}"),
            }
        }
    }

    /// Returns `true` when this call changed the state.
    fn mark_disconnected(&mut self, reason: Option<String>) -> bool {
        if matches!(self.state, ConnectionState::Disconnected { .. }) {
            return false;
        }
        match &reason {
            Some(r) => log::warn!("backend channel closed: {r}"),
            None => log::warn!("backend channel closed"),
        }
        self.state = ConnectionState::Disconnected { reason };
        self.in_flight.clear();
        self.deferred.clear();
        true
    }
}

fn run_io_thread(
    url: String,
    out_rx: UnboundedReceiver<String>,
    in_tx: Sender<ChannelEvent>,
    repaint: Option<egui::Context>,
) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("failed to start tokio runtime: {e}");
            let _ = in_tx.send(ChannelEvent::Closed(Some(e.to_string())));
            return;
        }
    };
    rt.block_on(run_connection(url, out_rx, in_tx, repaint));
}

async fn run_connection(
    url: String,
    mut out_rx: UnboundedReceiver<String>,
    in_tx: Sender<ChannelEvent>,
    repaint: Option<egui::Context>,
) {
    let notify = |event: ChannelEvent| {
        let delivered = in_tx.send(event).is_ok();
        if let Some(ctx) = &repaint {
            ctx.request_repaint();
        }
        delivered
    };

    let ws = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            log::error!("failed to connect to {url}: {e}");
            notify(ChannelEvent::Closed(Some(e.to_string())));
            return;
        }
    };
    log::info!("connected to {url}");
    if !notify(ChannelEvent::Opened) {
        return;
    }

    let (mut sink, mut stream) = ws.split();
    let reason = loop {
        tokio::select! {
            outgoing = out_rx.recv() => match outgoing {
                Some(text) => {
                    if let Err(e) = sink.send(Message::text(text)).await {
                        break Some(e.to_string());
                    }
                }
                // Client dropped: close politely and stop.
                None => {
                    let _ = sink.close().await;
                    return;
                }
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if !notify(ChannelEvent::Text(text.as_str().to_owned())) {
                        let _ = sink.close().await;
                        return;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    break frame.map(|f| f.reason.as_str().to_owned()).filter(|r| !r.is_empty());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => break Some(e.to_string()),
                None => break None,
            },
        }
    };
    notify(ChannelEvent::Closed(reason));
}
