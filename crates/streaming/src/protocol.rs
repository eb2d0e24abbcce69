//! Focus sync wire format between clients and the relay.
//!
//! Every frame is a JSON text message `{"event": <name>, "data": <payload>}`:
//! - client → relay: `updateFocus`, `resetView`, `startCounting`
//! - relay → client: `focusUpdated`, `resetView`, `startCounting`
//!
//! The relay does not sequence messages; receivers apply whatever arrives last.

use foundation::EntityKey;
use foundation::math::Vec3;
use scene::EntityRef;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("non-finite position for entity {0}")]
    NonFinitePosition(EntityKey),
}

/// Minimal focus snapshot on the wire. Derived fields are never sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusPayload {
    pub id: EntityKey,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl FocusPayload {
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if !(self.x.is_finite() && self.y.is_finite() && self.z.is_finite()) {
            return Err(ProtocolError::NonFinitePosition(self.id.clone()));
        }
        Ok(())
    }
}

impl From<&EntityRef> for FocusPayload {
    fn from(r: &EntityRef) -> Self {
        Self {
            id: r.id.clone(),
            x: r.position.x,
            y: r.position.y,
            z: r.position.z,
            weight: r.weight,
        }
    }
}

impl From<FocusPayload> for EntityRef {
    fn from(p: FocusPayload) -> Self {
        EntityRef {
            id: p.id,
            position: Vec3::new(p.x, p.y, p.z),
            weight: p.weight,
        }
    }
}

/// Session-level signals that share the focus channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    ResetView,
    StartCounting,
}

/// Message from client to relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    UpdateFocus(FocusPayload),
    ResetView,
    StartCounting,
}

/// Message from relay to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    FocusUpdated(FocusPayload),
    ResetView,
    StartCounting,
}

impl ClientMessage {
    /// What the relay forwards to the other clients.
    pub fn into_broadcast(self) -> ServerMessage {
        match self {
            ClientMessage::UpdateFocus(p) => ServerMessage::FocusUpdated(p),
            ClientMessage::ResetView => ServerMessage::ResetView,
            ClientMessage::StartCounting => ServerMessage::StartCounting,
        }
    }
}

impl From<ControlEvent> for ClientMessage {
    fn from(ev: ControlEvent) -> Self {
        match ev {
            ControlEvent::ResetView => ClientMessage::ResetView,
            ControlEvent::StartCounting => ClientMessage::StartCounting,
        }
    }
}

impl ServerMessage {
    pub fn control(&self) -> Option<ControlEvent> {
        match self {
            ServerMessage::FocusUpdated(_) => None,
            ServerMessage::ResetView => Some(ControlEvent::ResetView),
            ServerMessage::StartCounting => Some(ControlEvent::StartCounting),
        }
    }
}

pub fn encode<M: Serialize>(msg: &M) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(msg)?)
}

pub fn decode_client(text: &str) -> Result<ClientMessage, ProtocolError> {
    let msg: ClientMessage = serde_json::from_str(text)?;
    if let ClientMessage::UpdateFocus(p) = &msg {
        p.validate()?;
    }
    Ok(msg)
}

pub fn decode_server(text: &str) -> Result<ServerMessage, ProtocolError> {
    let msg: ServerMessage = serde_json::from_str(text)?;
    if let ServerMessage::FocusUpdated(p) = &msg {
        p.validate()?;
    }
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn update_focus_wire_shape() {
        let msg = ClientMessage::UpdateFocus(FocusPayload {
            id: EntityKey::Int(12),
            x: 1.0,
            y: -2.5,
            z: 3.0,
            weight: None,
        });
        let v: serde_json::Value = serde_json::from_str(&encode(&msg).unwrap()).unwrap();
        assert_eq!(
            v,
            json!({"event": "updateFocus", "data": {"id": 12, "x": 1.0, "y": -2.5, "z": 3.0}})
        );
    }

    #[test]
    fn control_events_carry_no_data() {
        let v: serde_json::Value =
            serde_json::from_str(&encode(&ClientMessage::ResetView).unwrap()).unwrap();
        assert_eq!(v, json!({"event": "resetView"}));
        assert_eq!(
            decode_server(r#"{"event":"startCounting"}"#).unwrap().control(),
            Some(ControlEvent::StartCounting)
        );
    }

    #[test]
    fn entity_ref_survives_relay_hop() {
        let sent = EntityRef {
            id: EntityKey::from("post-77"),
            position: Vec3::new(0.1, 1.0e6, -3.25),
            weight: Some(4.0),
        };
        let outbound = encode(&ClientMessage::UpdateFocus(FocusPayload::from(&sent))).unwrap();
        let relayed = encode(&decode_client(&outbound).unwrap().into_broadcast()).unwrap();

        let ServerMessage::FocusUpdated(payload) = decode_server(&relayed).unwrap() else {
            panic!("expected focusUpdated");
        };
        let got = EntityRef::from(payload);
        assert_eq!(got.id, sent.id);
        assert!(got.position.distance(sent.position) < 1e-9);
        assert_eq!(got.weight, Some(4.0));
    }

    #[test]
    fn incomplete_payloads_are_rejected() {
        for text in [
            r#"{"event":"focusUpdated","data":{"x":1,"y":2,"z":3}}"#,
            r#"{"event":"focusUpdated","data":{"id":1,"x":1,"y":2}}"#,
            r#"{"event":"focusUpdated","data":{"id":1,"x":"a","y":2,"z":3}}"#,
            r#"{"event":"focusUpdated"}"#,
            r#"{"event":"somethingElse","data":{}}"#,
            "not json",
        ] {
            assert!(decode_server(text).is_err(), "accepted {text}");
        }
    }

    #[test]
    fn relay_rewrites_event_names() {
        assert_eq!(
            ClientMessage::StartCounting.into_broadcast(),
            ServerMessage::StartCounting
        );
        assert_eq!(
            ClientMessage::from(ControlEvent::ResetView),
            ClientMessage::ResetView
        );
    }
}
