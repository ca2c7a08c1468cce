use std::sync::mpsc::Sender;

use linkplot::client::{ChannelEvent, ClientError, ClientNotice, MessageClient, SendOutcome};
use linkplot::protocol::{Action, Reply, Request};
use serde_json::{json, Value};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

fn open_client() -> (MessageClient, UnboundedReceiver<String>, Sender<ChannelEvent>) {
    let (out_tx, out_rx) = unbounded_channel();
    let (in_tx, in_rx) = std::sync::mpsc::channel();
    let mut client = MessageClient::from_channels(out_tx, in_rx);
    in_tx.send(ChannelEvent::Opened).unwrap();
    client.poll();
    (client, out_rx, in_tx)
}

fn written(out: &mut UnboundedReceiver<String>) -> Vec<Value> {
    let mut v = Vec::new();
    while let Ok(text) = out.try_recv() {
        v.push(serde_json::from_str(&text).unwrap());
    }
    v
}

fn means_reply(action: u8, id: u64) -> ChannelEvent {
    ChannelEvent::Text(json!({"action": action, "id": id, "means": [0.5], "count": 2}).to_string())
}

#[test]
fn second_request_waits_and_latest_wins() {
    let (mut client, mut out, inbox) = open_client();

    let first = client
        .send(Request::SelectionMeans { indices: vec![0] })
        .unwrap();
    let SendOutcome::Sent(first_id) = first else {
        panic!("first request should go out immediately");
    };
    assert_eq!(
        client.send(Request::SelectionMeans { indices: vec![1] }).unwrap(),
        SendOutcome::Deferred { replaced: false }
    );
    assert_eq!(
        client.send(Request::SelectionMeans { indices: vec![2] }).unwrap(),
        SendOutcome::Deferred { replaced: true }
    );
    assert_eq!(written(&mut out).len(), 1);

    inbox.send(means_reply(1, first_id)).unwrap();
    let notices = client.poll();
    assert_eq!(notices.len(), 2);
    assert!(matches!(&notices[0], ClientNotice::Reply { reply: Reply::SelectionMeans(_), .. }));
    let ClientNotice::Sent { action, id } = &notices[1] else {
        panic!("deferred request should be written after the reply");
    };
    assert_eq!(*action, Action::PassSelectionMeans);
    assert_eq!(client.in_flight(Action::PassSelectionMeans), Some(*id));

    let sent = written(&mut out);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["content"]["indices"], json!([2]));
    assert!(!client.has_deferred(Action::PassSelectionMeans));
}

#[test]
fn different_actions_do_not_block_each_other() {
    let (mut client, mut out, _inbox) = open_client();
    assert!(matches!(client.send(Request::OverallMeans), Ok(SendOutcome::Sent(_))));
    assert!(matches!(
        client.send(Request::SelectionMeans { indices: vec![3] }),
        Ok(SendOutcome::Sent(_))
    ));
    let sent = written(&mut out);
    assert_eq!(sent.len(), 2);
    assert_ne!(sent[0]["id"], sent[1]["id"]);
}

#[test]
fn reply_with_other_id_is_dropped_as_stale() {
    let (mut client, _out, inbox) = open_client();
    let Ok(SendOutcome::Sent(id)) = client.send(Request::OverallMeans) else {
        panic!("expected immediate send");
    };

    inbox.send(means_reply(2, id + 100)).unwrap();
    assert!(client.poll().is_empty());
    assert_eq!(client.in_flight(Action::PassOverallMeans), Some(id));

    inbox.send(means_reply(2, id)).unwrap();
    assert!(matches!(
        client.poll().as_slice(),
        [ClientNotice::Reply { id: Some(got), .. }] if *got == id
    ));
}

#[test]
fn reply_without_id_answers_the_in_flight_request() {
    let (mut client, _out, inbox) = open_client();
    let Ok(SendOutcome::Sent(id)) = client.send(Request::OverallMeans) else {
        panic!("expected immediate send");
    };
    inbox
        .send(ChannelEvent::Text(r#"{"action": 2, "means": [1.0], "count": 5}"#.into()))
        .unwrap();
    assert!(matches!(
        client.poll().as_slice(),
        [ClientNotice::Reply { id: Some(got), reply: Reply::OverallMeans(m) }]
            if *got == id && m.count == 5
    ));
    assert_eq!(client.in_flight(Action::PassOverallMeans), None);
}

#[test]
fn garbage_is_reported_without_an_action() {
    let (mut client, _out, inbox) = open_client();
    inbox.send(ChannelEvent::Text("{not json".into())).unwrap();
    assert!(matches!(
        client.poll().as_slice(),
        [ClientNotice::DecodeFailed { action: None, .. }]
    ));
}

#[test]
fn bad_payload_frees_the_slot_and_flushes_deferred() {
    let (mut client, mut out, inbox) = open_client();
    let Ok(SendOutcome::Sent(id)) = client.send(Request::OverallMeans) else {
        panic!("expected immediate send");
    };
    client.send(Request::OverallMeans).unwrap();
    let _ = written(&mut out);

    inbox
        .send(ChannelEvent::Text(json!({"action": 2, "id": id}).to_string()))
        .unwrap();
    let notices = client.poll();
    assert!(matches!(
        &notices[0],
        ClientNotice::DecodeFailed { action: Some(Action::PassOverallMeans), .. }
    ));
    assert!(matches!(&notices[1], ClientNotice::Sent { .. }));
    assert_eq!(written(&mut out).len(), 1);
}

#[test]
fn unparseable_reply_still_frees_its_slot() {
    let (mut client, mut out, inbox) = open_client();
    client
        .send(Request::SelectionMeans { indices: vec![0] })
        .unwrap();
    let _ = written(&mut out);

    inbox
        .send(ChannelEvent::Text(r#"{"action": 1, "means": [0.5, 0.5], "count": 1,"#.into()))
        .unwrap();
    assert!(matches!(
        client.poll().as_slice(),
        [ClientNotice::DecodeFailed { action: Some(Action::PassSelectionMeans), .. }]
    ));
    assert_eq!(client.in_flight(Action::PassSelectionMeans), None);

    assert!(matches!(
        client.send(Request::SelectionMeans { indices: vec![1] }),
        Ok(SendOutcome::Sent(_))
    ));
    assert_eq!(written(&mut out)[0]["content"]["indices"], json!([1]));
}

#[test]
fn nan_means_from_a_python_backend_are_accepted() {
    let (mut client, mut out, inbox) = open_client();
    let Ok(SendOutcome::Sent(id)) = client.send(Request::SelectionMeans { indices: vec![0] }) else {
        panic!("expected immediate send");
    };
    client
        .send(Request::SelectionMeans { indices: vec![1] })
        .unwrap();
    let _ = written(&mut out);

    inbox
        .send(ChannelEvent::Text(format!(
            r#"{{"action": 1, "id": {id}, "means": [NaN, 0.5], "count": 1}}"#
        )))
        .unwrap();
    let notices = client.poll();
    assert!(matches!(
        &notices[0],
        ClientNotice::Reply { reply: Reply::SelectionMeans(m), .. } if m.means == vec![0.0, 0.5]
    ));
    assert!(matches!(&notices[1], ClientNotice::Sent { .. }));
    assert_eq!(written(&mut out)[0]["content"]["indices"], json!([1]));
}

#[test]
fn sends_fail_after_disconnect() {
    let (mut client, _out, inbox) = open_client();
    client.send(Request::OverallMeans).unwrap();
    client.send(Request::OverallMeans).unwrap();
    inbox.send(ChannelEvent::Closed(None)).unwrap();
    assert!(matches!(
        client.poll().as_slice(),
        [ClientNotice::Disconnected { reason: None }]
    ));
    assert!(!client.has_deferred(Action::PassOverallMeans));
    assert!(matches!(
        client.send(Request::Data { name: None }),
        Err(ClientError::Disconnected)
    ));
}

#[test]
fn io_side_dropping_the_socket_counts_as_disconnect() {
    let (mut client, out, _inbox) = open_client();
    drop(out);
    assert!(matches!(
        client.send(Request::OverallMeans),
        Err(ClientError::Disconnected)
    ));
    assert!(!client.state().is_open());
}
