// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live change streaming over WebSocket.
//!
//! Each connection opens one change feed subscription and forwards every
//! matching committed change as a JSON text frame, carrying the full
//! record. Nothing is executed over the socket; writes go through the
//! HTTP routes.
//!
//! # Protocol
//!
//! 1. The client connects to `/live?collection=zones` or
//!    `/live?collection=bookings[&user_id=...]`.
//! 2. The server sends `{"type":"connected", ...}`.
//! 3. Every change follows as a `zone_upserted`, `zone_deleted`,
//!    `booking_upserted` or `booking_deleted` message.
//!
//! Closing the socket closes the subscription.

use axum::{
    extract::{
        Query, State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use parkwise_api::{FeedFilter, Subscription, SubscriptionId};
use parkwise_persistence::DocumentStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::actor::RequestActor;
use crate::{AppState, HttpError};

/// Which collection a live connection follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveCollection {
    Zones,
    Bookings,
}

/// Query string of the `/live` route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveQuery {
    pub collection: LiveCollection,
    /// Only for bookings. Citizens are always scoped to themselves.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl LiveQuery {
    #[must_use]
    pub fn filter(&self) -> FeedFilter {
        match self.collection {
            LiveCollection::Zones => FeedFilter::Zones,
            LiveCollection::Bookings => FeedFilter::Bookings {
                user_id: self.user_id.clone(),
            },
        }
    }
}

/// Messages the server sends besides change events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveControl {
    /// Sent once, right after the upgrade.
    Connected {
        /// Server timestamp (RFC 3339).
        timestamp: String,
        subscription: SubscriptionId,
    },
}

/// Upgrades the connection and streams changes to it.
///
/// The subscription is opened before the upgrade, so an unauthorized
/// filter is refused with a normal HTTP error and no change committed
/// after the response is missed.
///
/// # Errors
///
/// Returns 403 when a citizen asks for another user's bookings.
pub async fn live_events_handler<S: DocumentStore>(
    ws: WebSocketUpgrade,
    AxumState(app_state): AxumState<AppState<S>>,
    RequestActor(actor): RequestActor,
    Query(query): Query<LiveQuery>,
) -> Result<Response, HttpError> {
    let subscription: Subscription = app_state
        .service
        .subscribe_changes(&actor, query.filter())?;
    info!(
        actor_id = %actor.id,
        subscription = subscription.id(),
        ?query,
        "Opening live change stream"
    );
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, subscription)))
}

fn connected_message(subscription: &Subscription) -> LiveControl {
    LiveControl::Connected {
        timestamp: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| String::from("unknown")),
        subscription: subscription.id(),
    }
}

/// Forwards events until the client goes away or the feed closes.
async fn handle_socket(socket: WebSocket, mut subscription: Subscription) {
    let (mut sender, mut receiver) = socket.split();
    let id: SubscriptionId = subscription.id();

    let connected: LiveControl = connected_message(&subscription);
    if let Ok(json) = serde_json::to_string(&connected)
        && sender.send(Message::Text(json.into())).await.is_err()
    {
        warn!(subscription = id, "Failed to send connection confirmation");
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!(?e, "Failed to serialize change event");
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    warn!("Received unexpected message from client, ignoring");
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    // Aborting the send task drops the subscription, which deregisters it.
    tokio::select! {
        _ = &mut send_task => {
            debug!("Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("Receive task completed");
            send_task.abort();
        }
    }

    info!(subscription = id, "Client disconnected from live change stream");
}
