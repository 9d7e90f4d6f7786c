//! Webhook events delivered by the identity agent.
//!
//! The agent notifies the platform of asynchronous protocol progress with
//! `(topic, payload)` pairs. [`WebhookEvent`] turns that string-keyed shape
//! into a tagged union over the topics the engine reacts to, with an explicit
//! [`WebhookEvent::Unrecognized`] variant so unknown topics flow through as
//! no-ops instead of errors.

use serde::Deserialize;
use serde_json::Value;

use crate::models::ConnectionState;

/// Topic carrying connection protocol progress.
pub const TOPIC_CONNECTIONS: &str = "connections";
/// Topic carrying endorsement transaction progress.
pub const TOPIC_ENDORSE_TRANSACTION: &str = "endorse_transaction";

/// Payload of a `connections` webhook.
///
/// The agent sends more fields than these; everything beyond the connection
/// identity and its new state is irrelevant to onboarding and ignored.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ConnectionsPayload {
    pub connection_id: String,
    pub state: ConnectionState,
}

/// A webhook notification, decoded per topic.
#[derive(Clone, Debug, PartialEq)]
pub enum WebhookEvent {
    /// Connection protocol progress for the endorser connection.
    Connections(ConnectionsPayload),
    /// Endorsement transaction progress. The payload is agent-defined and
    /// passed through unexamined until endorsement acknowledgments are
    /// handled.
    EndorseTransaction(Value),
    /// Any topic the engine has no handler for.
    Unrecognized { topic: String, payload: Value },
}

impl WebhookEvent {
    /// Decode a raw `(topic, payload)` delivery.
    ///
    /// A `connections` payload that does not parse (missing fields, a state
    /// string the protocol enum does not know) degrades to
    /// [`WebhookEvent::Unrecognized`] rather than erroring; webhook
    /// deliveries are advisory and must never fail the receiving endpoint.
    #[must_use]
    pub fn from_parts(topic: &str, payload: Value) -> Self {
        match topic {
            TOPIC_CONNECTIONS => match serde_json::from_value::<ConnectionsPayload>(payload.clone())
            {
                Ok(parsed) => WebhookEvent::Connections(parsed),
                Err(error) => {
                    tracing::warn!(topic, %error, "malformed connections payload");
                    WebhookEvent::Unrecognized {
                        topic: topic.to_string(),
                        payload,
                    }
                }
            },
            TOPIC_ENDORSE_TRANSACTION => WebhookEvent::EndorseTransaction(payload),
            other => WebhookEvent::Unrecognized {
                topic: other.to_string(),
                payload,
            },
        }
    }

    /// The delivery topic this event arrived under.
    #[must_use]
    pub fn topic(&self) -> &str {
        match self {
            WebhookEvent::Connections(_) => TOPIC_CONNECTIONS,
            WebhookEvent::EndorseTransaction(_) => TOPIC_ENDORSE_TRANSACTION,
            WebhookEvent::Unrecognized { topic, .. } => topic,
        }
    }
}
