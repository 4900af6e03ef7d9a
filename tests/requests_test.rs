//! Service request drafts and the request feed.

mod common;

use concierge::ConciergeError;
use concierge::models::{RequestKind, RequestStatus, ServiceRequest};
use concierge::realtime::{Packet, RequestEvent, parse_packet};
use concierge::requests::{RequestFeed, ServiceRequestDraft};

use common::{FakeSubmitter, session};

const REQUESTS_JSON: &str = include_str!("fixtures/requests.json");
const CREATED_FRAME: &str = include_str!("fixtures/request_created.frame");
const UPDATED_FRAME: &str = include_str!("fixtures/request_updated.frame");

fn pushed(frame: &str) -> RequestEvent {
    match parse_packet(frame).expect("Failed to parse event frame") {
        Packet::Event(event) => event,
        other => panic!("expected event packet, got {other:?}"),
    }
}

fn loaded_feed() -> RequestFeed {
    let requests: Vec<ServiceRequest> =
        serde_json::from_str(REQUESTS_JSON).expect("Failed to parse requests fixture");
    let mut feed = RequestFeed::new(session());
    feed.load(requests);
    feed
}

#[test]
fn test_load_keeps_only_own_requests() {
    let feed = loaded_feed();
    let ids: Vec<&str> = feed.visible(true).iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r3", "r2", "r0"]);
    assert!(feed.get("r1").is_none());
}

#[test]
fn test_settled_requests_hidden_by_default() {
    let feed = loaded_feed();
    let ids: Vec<&str> = feed.visible(false).iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r3"]);
}

#[test]
fn test_created_event_is_prepended_once() {
    let mut feed = loaded_feed();
    let event = pushed(CREATED_FRAME);

    assert!(feed.apply(event.clone()));
    assert!(!feed.apply(event));

    let visible = feed.visible(false);
    assert_eq!(visible[0].id, "r4");
    assert_eq!(visible[0].kind, RequestKind::Emergency);
    assert_eq!(visible.iter().filter(|r| r.id == "r4").count(), 1);
}

#[test]
fn test_updated_event_replaces_by_id() {
    let mut feed = loaded_feed();
    let event = pushed(UPDATED_FRAME);

    assert!(feed.apply(event));

    let r3 = feed.get("r3").expect("r3 should exist");
    assert_eq!(r3.status, RequestStatus::Reviewed);
    assert_eq!(
        r3.reviewed_message.as_deref(),
        Some("Su movilidad está confirmada")
    );
    assert_eq!(feed.visible(true).len(), 3);
}

#[test]
fn test_events_for_other_guests_are_ignored() {
    let mut feed = loaded_feed();
    let RequestEvent::Created(mut request) = pushed(CREATED_FRAME) else {
        panic!("expected created event");
    };
    request.property = "Casa VB 40".to_string();

    assert!(!feed.apply(RequestEvent::Created(request)));
    assert!(feed.get("r4").is_none());
}

#[test]
fn test_update_for_unknown_request_is_ignored() {
    let mut feed = RequestFeed::new(session());
    let event = pushed(UPDATED_FRAME);
    assert!(!feed.apply(event));
    assert!(feed.visible(true).is_empty());
}

#[test]
fn test_cancel_and_rate() {
    let mut feed = loaded_feed();

    feed.cancel("r3").expect("sent request is cancellable");
    assert_eq!(feed.get("r3").map(|r| r.status), Some(RequestStatus::Cancelled));
    assert!(matches!(
        feed.cancel("r2"),
        Err(ConciergeError::InvalidRequest(_))
    ));

    assert!(feed.rate("r2", 6).is_err());
    assert!(feed.rate("r3", 4).is_err());
    feed.rate("r2", 4).expect("attended request can be rated");
    let r2 = feed.get("r2").expect("r2 should exist");
    assert_eq!(r2.rating, Some(4));
    assert_eq!(r2.rating_attempts, 2);
}

#[tokio::test]
async fn test_amenities_draft_is_submitted_for_guest() {
    let mut draft = ServiceRequestDraft::new(RequestKind::Amenities).with_notes("Para dos");
    draft.toggle("Toallas");
    draft.toggle("Jabón");
    let submitter = FakeSubmitter::default();

    draft
        .submit(&session(), &submitter)
        .await
        .expect("draft should be sent");

    let sent = submitter.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, RequestKind::Amenities);
    assert_eq!(sent[0].items, vec!["Toallas".to_string(), "Jabón".to_string()]);
    assert_eq!(sent[0].notes.as_deref(), Some("Para dos"));
    assert_eq!(sent[0].property, "Casa YV 19");

    let value = serde_json::to_value(&sent[0]).expect("Failed to serialize payload");
    assert_eq!(value["tipo"], "Amenidades");
    assert_eq!(value["observaciones"], "Para dos");
    assert!(value.get("meta").is_none());
}

#[tokio::test]
async fn test_invalid_draft_is_not_submitted() {
    let draft = ServiceRequestDraft::new(RequestKind::Transport);
    let submitter = FakeSubmitter::default();

    assert!(draft.submit(&session(), &submitter).await.is_err());
    assert!(submitter.sent().is_empty());
}
