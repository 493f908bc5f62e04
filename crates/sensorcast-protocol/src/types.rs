//! Event types for Sensorcast's wire format.
//!
//! Client and server exchange *named events*. Each variant below maps to
//! one event name; its payload (if any) rides in the `data` field.
//!
//! `#[serde(tag = "event", content = "data")]` makes these enums
//! "adjacently tagged", which is what browser socket clients expect:
//!
//! ```text
//! ClientEvent::SelectRole(Role::Audience)
//!     → { "event": "select_role", "data": "audience" }
//! ServerEvent::ClearChart
//!     → { "event": "clear_chart" }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use sensorcast_transport::ConnectionId;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// A role a connection can ask for.
///
/// Only `Presenter` is arbitrated. `Audience` is a confirmation with no
/// server-side state behind it.
///
/// Decoding is lenient: anything other than the exact string `"presenter"`
/// reads as `Audience`, so every role request gets an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Presenter,
    Audience,
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Requested {
            Name(String),
            Other(#[allow(dead_code)] serde::de::IgnoredAny),
        }

        Ok(match Requested::deserialize(deserializer)? {
            Requested::Name(name) if name == "presenter" => Self::Presenter,
            _ => Self::Audience,
        })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presenter => write!(f, "presenter"),
            Self::Audience => write!(f, "audience"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sample
// ---------------------------------------------------------------------------

/// One motion-sensor reading: acceleration on the three device axes.
///
/// Never stored. A sample exists only while it is being relayed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// `select_role`: ask for the presenter or audience role.
    SelectRole(Role),

    /// `sensor_data`: a reading from the presenter's device. Relayed to
    /// every other connection as [`ServerEvent::GraphUpdate`].
    SensorData(Sample),

    /// `clear_chart`: the presenter wiped their chart. Relayed to every
    /// other connection as [`ServerEvent::ClearChart`].
    ClearChart,
}

impl ClientEvent {
    /// The wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectRole(_) => "select_role",
            Self::SensorData(_) => "sensor_data",
            Self::ClearChart => "clear_chart",
        }
    }
}

/// Events the relay sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// `role_assigned`: the requested role was granted.
    RoleAssigned(Role),

    /// `role_assign_failure`: the request was denied. Carries a
    /// human-readable reason the client can show as-is.
    RoleAssignFailure(String),

    /// `graph_update`: a sample from the presenter.
    GraphUpdate(Sample),

    /// `clear_chart`: the presenter cleared the chart.
    ClearChart,
}

impl ServerEvent {
    /// The wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoleAssigned(_) => "role_assigned",
            Self::RoleAssignFailure(_) => "role_assign_failure",
            Self::GraphUpdate(_) => "graph_update",
            Self::ClearChart => "clear_chart",
        }
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who should receive a server event.
///
/// Handlers return `(Recipient, ServerEvent)` pairs and the relay resolves
/// them against whoever is connected at delivery time. There is no
/// audience list: "everyone but the sender" is the whole audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Only this connection (replies to role requests).
    Connection(ConnectionId),

    /// Every connected connection except this one.
    AllExcept(ConnectionId),
}

impl Recipient {
    /// Returns `true` if a connection with this id should get the event.
    pub fn includes(&self, id: ConnectionId) -> bool {
        match *self {
            Self::Connection(target) => target == id,
            Self::AllExcept(excluded) => excluded != id,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The browser client matches on these exact JSON shapes, so the tests
    //! pin the serde attributes down.

    use super::*;
    use serde_json::json;

    // =====================================================================
    // Role
    // =====================================================================

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::Presenter).unwrap(), json!("presenter"));
        assert_eq!(serde_json::to_value(Role::Audience).unwrap(), json!("audience"));
    }

    #[test]
    fn test_role_decodes_known_names() {
        assert_eq!(serde_json::from_value::<Role>(json!("presenter")).unwrap(), Role::Presenter);
        assert_eq!(serde_json::from_value::<Role>(json!("audience")).unwrap(), Role::Audience);
    }

    #[test]
    fn test_unknown_role_name_decodes_as_audience() {
        for value in [json!("moderator"), json!("Presenter"), json!(""), json!(3), json!(null)] {
            let role: Role = serde_json::from_value(value.clone()).unwrap();
            assert_eq!(role, Role::Audience, "{value}");
        }
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Presenter.to_string(), "presenter");
        assert_eq!(Role::Audience.to_string(), "audience");
    }

    // =====================================================================
    // ClientEvent
    // =====================================================================

    #[test]
    fn test_select_role_json_format() {
        let event: ClientEvent =
            serde_json::from_value(json!({ "event": "select_role", "data": "audience" })).unwrap();
        assert_eq!(event, ClientEvent::SelectRole(Role::Audience));
    }

    #[test]
    fn test_select_role_with_unknown_role_is_an_audience_request() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"select_role","data":"viewer"}"#).unwrap();
        assert_eq!(event, ClientEvent::SelectRole(Role::Audience));
    }

    #[test]
    fn test_sensor_data_accepts_integer_axes() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "sensor_data",
            "data": { "x": 1, "y": 2, "z": 3 }
        }))
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::SensorData(Sample { x: 1.0, y: 2.0, z: 3.0 })
        );
    }

    #[test]
    fn test_sensor_data_missing_axis_is_rejected() {
        let result: Result<ClientEvent, _> = serde_json::from_value(json!({
            "event": "sensor_data",
            "data": { "x": 1, "y": 2 }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_clear_chart_needs_no_payload() {
        let event: ClientEvent = serde_json::from_value(json!({ "event": "clear_chart" })).unwrap();
        assert_eq!(event, ClientEvent::ClearChart);
    }

    #[test]
    fn test_client_event_names() {
        assert_eq!(ClientEvent::SelectRole(Role::Presenter).name(), "select_role");
        assert_eq!(ClientEvent::SensorData(Sample::default()).name(), "sensor_data");
        assert_eq!(ClientEvent::ClearChart.name(), "clear_chart");
    }

    // =====================================================================
    // ServerEvent
    // =====================================================================

    #[test]
    fn test_role_assigned_json_format() {
        let json = serde_json::to_value(ServerEvent::RoleAssigned(Role::Presenter)).unwrap();
        assert_eq!(json, json!({ "event": "role_assigned", "data": "presenter" }));
    }

    #[test]
    fn test_role_assign_failure_carries_reason() {
        let json = serde_json::to_value(ServerEvent::RoleAssignFailure(
            "a presenter is already active".into(),
        ))
        .unwrap();
        assert_eq!(json["event"], "role_assign_failure");
        assert_eq!(json["data"], "a presenter is already active");
    }

    #[test]
    fn test_graph_update_json_format() {
        let json = serde_json::to_value(ServerEvent::GraphUpdate(Sample {
            x: 0.5,
            y: -9.81,
            z: 0.25,
        }))
        .unwrap();
        assert_eq!(json["event"], "graph_update");
        assert_eq!(json["data"]["x"], 0.5);
        assert_eq!(json["data"]["y"], -9.81);
        assert_eq!(json["data"]["z"], 0.25);
    }

    #[test]
    fn test_server_clear_chart_has_no_data_field() {
        let json = serde_json::to_value(ServerEvent::ClearChart).unwrap();
        assert_eq!(json, json!({ "event": "clear_chart" }));
    }

    #[test]
    fn test_server_event_names_match_wire_tags() {
        let events = [
            ServerEvent::RoleAssigned(Role::Audience),
            ServerEvent::RoleAssignFailure("no".into()),
            ServerEvent::GraphUpdate(Sample::default()),
            ServerEvent::ClearChart,
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["event"], event.name());
        }
    }

    // =====================================================================
    // Recipient
    // =====================================================================

    #[test]
    fn test_recipient_connection_targets_one() {
        let a = ConnectionId::new(1);
        let b = ConnectionId::new(2);
        let r = Recipient::Connection(a);
        assert!(r.includes(a));
        assert!(!r.includes(b));
    }

    #[test]
    fn test_recipient_all_except_skips_sender() {
        let a = ConnectionId::new(1);
        let b = ConnectionId::new(2);
        let c = ConnectionId::new(3);
        let r = Recipient::AllExcept(a);
        assert!(!r.includes(a));
        assert!(r.includes(b));
        assert!(r.includes(c));
    }
}
