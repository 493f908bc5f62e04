//! Event handlers: the relay's behavior, minus the plumbing.
//!
//! Every handler is a function of (presenter slot, sender, payload) that
//! may update the slot and returns the events to send, each paired with a
//! [`Recipient`]. Nothing here touches a connection, so the whole table
//! can be unit-tested without a transport.
//!
//! | event | who may send it | outbound |
//! |---|---|---|
//! | `select_role` | anyone | `role_assigned` / `role_assign_failure` to the sender |
//! | `sensor_data` | presenter | `graph_update` to everyone else |
//! | `clear_chart` | presenter | `clear_chart` to everyone else |
//!
//! Samples and clear signals from anyone but the presenter are dropped
//! without a reply. Non-presenters never learn whether a presenter exists.

use sensorcast_protocol::{ClientEvent, Recipient, Role, Sample, ServerEvent};
use sensorcast_transport::ConnectionId;

use crate::{Claim, PresenterSlot};

/// Events produced by one handler call, in send order.
pub type Outbound = Vec<(Recipient, ServerEvent)>;

/// Routes a client event to its handler.
pub fn dispatch(slot: &mut PresenterSlot, from: ConnectionId, event: ClientEvent) -> Outbound {
    match event {
        ClientEvent::SelectRole(role) => request_role(slot, from, role),
        ClientEvent::SensorData(sample) => submit_sample(slot, from, sample),
        ClientEvent::ClearChart => request_clear(slot, from),
    }
}

/// Handles `select_role`. Always exactly one reply, to the requester.
pub fn request_role(slot: &mut PresenterSlot, from: ConnectionId, role: Role) -> Outbound {
    let reply = match role {
        Role::Presenter => match slot.claim(from) {
            Ok(Claim::Acquired) => {
                tracing::info!(conn_id = %from, "presenter role assigned");
                ServerEvent::RoleAssigned(Role::Presenter)
            }
            Ok(Claim::AlreadyHeld) => {
                tracing::debug!(conn_id = %from, "presenter re-requested role");
                ServerEvent::RoleAssigned(Role::Presenter)
            }
            Err(e) => {
                tracing::debug!(conn_id = %from, error = ?e, "presenter request denied");
                ServerEvent::RoleAssignFailure(e.to_string())
            }
        },
        Role::Audience => {
            tracing::info!(conn_id = %from, "audience role assigned");
            ServerEvent::RoleAssigned(Role::Audience)
        }
    };

    vec![(Recipient::Connection(from), reply)]
}

/// Handles `sensor_data`. Rebroadcast as `graph_update` or dropped.
pub fn submit_sample(slot: &PresenterSlot, from: ConnectionId, sample: Sample) -> Outbound {
    if let Err(e) = slot.authorize(from) {
        tracing::trace!(error = %e, "dropping sample");
        return Vec::new();
    }
    vec![(Recipient::AllExcept(from), ServerEvent::GraphUpdate(sample))]
}

/// Handles `clear_chart`. Same gate as [`submit_sample`].
pub fn request_clear(slot: &PresenterSlot, from: ConnectionId) -> Outbound {
    if let Err(e) = slot.authorize(from) {
        tracing::trace!(error = %e, "dropping clear signal");
        return Vec::new();
    }
    tracing::debug!(conn_id = %from, "presenter cleared chart");
    vec![(Recipient::AllExcept(from), ServerEvent::ClearChart)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PRESENTER_ALREADY_ACTIVE;

    const A: ConnectionId = ConnectionId::new(1);
    const B: ConnectionId = ConnectionId::new(2);

    fn sample() -> Sample {
        Sample { x: 1.0, y: 2.0, z: 3.0 }
    }

    #[test]
    fn test_presenter_request_on_free_slot_is_granted() {
        let mut slot = PresenterSlot::Unheld;
        let out = request_role(&mut slot, A, Role::Presenter);
        assert_eq!(
            out,
            vec![(Recipient::Connection(A), ServerEvent::RoleAssigned(Role::Presenter))]
        );
        assert_eq!(slot, PresenterSlot::HeldBy(A));
    }

    #[test]
    fn test_presenter_request_while_held_is_denied() {
        let mut slot = PresenterSlot::HeldBy(A);
        let out = request_role(&mut slot, B, Role::Presenter);
        assert_eq!(
            out,
            vec![(
                Recipient::Connection(B),
                ServerEvent::RoleAssignFailure(PRESENTER_ALREADY_ACTIVE.into())
            )]
        );
        assert_eq!(slot, PresenterSlot::HeldBy(A));
    }

    #[test]
    fn test_presenter_rerequest_is_granted_again() {
        let mut slot = PresenterSlot::HeldBy(A);
        let out = request_role(&mut slot, A, Role::Presenter);
        assert_eq!(out[0].1, ServerEvent::RoleAssigned(Role::Presenter));
        assert_eq!(slot, PresenterSlot::HeldBy(A));
    }

    #[test]
    fn test_audience_request_always_granted_without_state() {
        for start in [PresenterSlot::Unheld, PresenterSlot::HeldBy(A)] {
            let mut slot = start;
            let out = request_role(&mut slot, B, Role::Audience);
            assert_eq!(
                out,
                vec![(Recipient::Connection(B), ServerEvent::RoleAssigned(Role::Audience))]
            );
            assert_eq!(slot, start);
        }
    }

    #[test]
    fn test_presenter_holding_slot_may_request_audience_and_keeps_slot() {
        let mut slot = PresenterSlot::HeldBy(A);
        request_role(&mut slot, A, Role::Audience);
        assert_eq!(slot, PresenterSlot::HeldBy(A));
    }

    #[test]
    fn test_sample_from_presenter_goes_to_everyone_else() {
        let slot = PresenterSlot::HeldBy(A);
        let out = submit_sample(&slot, A, sample());
        assert_eq!(
            out,
            vec![(Recipient::AllExcept(A), ServerEvent::GraphUpdate(sample()))]
        );
    }

    #[test]
    fn test_sample_from_non_presenter_is_dropped() {
        assert!(submit_sample(&PresenterSlot::HeldBy(A), B, sample()).is_empty());
        assert!(submit_sample(&PresenterSlot::Unheld, B, sample()).is_empty());
    }

    #[test]
    fn test_clear_is_gated_like_samples() {
        assert_eq!(
            request_clear(&PresenterSlot::HeldBy(A), A),
            vec![(Recipient::AllExcept(A), ServerEvent::ClearChart)]
        );
        assert!(request_clear(&PresenterSlot::HeldBy(A), B).is_empty());
        assert!(request_clear(&PresenterSlot::Unheld, A).is_empty());
    }

    #[test]
    fn test_dispatch_routes_by_event_name() {
        let mut slot = PresenterSlot::Unheld;
        let granted = dispatch(&mut slot, A, ClientEvent::SelectRole(Role::Presenter));
        assert_eq!(granted.len(), 1);

        let relayed = dispatch(&mut slot, A, ClientEvent::SensorData(sample()));
        assert_eq!(relayed[0].1, ServerEvent::GraphUpdate(sample()));

        let cleared = dispatch(&mut slot, A, ClientEvent::ClearChart);
        assert_eq!(cleared[0].1, ServerEvent::ClearChart);

        assert!(dispatch(&mut slot, B, ClientEvent::ClearChart).is_empty());
    }
}
