use std::io;
use std::time::Duration;

use futures::channel::mpsc as transport;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tungstenite::protocol::Message as WsMessage;

use super::{ConnectionHandle, Disconnect, EnqueueError, read_pump, teardown, write_pump};
use crate::hub::message::{Message, Target};
use crate::hub::registry::ConnectionRegistry;

type Frames = Result<WsMessage, io::Error>;

async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

fn registered(
    registry: &ConnectionRegistry,
    user_id: i64,
) -> (ConnectionHandle, mpsc::Receiver<WsMessage>) {
    let (handle, rx) = ConnectionHandle::new(user_id, 4);
    registry.register(handle.clone()).unwrap();
    (handle, rx)
}

#[test]
fn test_enqueue_full_and_closed() {
    let (handle, _rx) = ConnectionHandle::new(1, 1);
    handle.enqueue(WsMessage::text("a")).unwrap();
    assert_eq!(handle.enqueue(WsMessage::text("b")), Err(EnqueueError::Full));

    handle.close();
    assert_eq!(handle.enqueue(WsMessage::text("c")), Err(EnqueueError::Closed));
}

#[test]
fn test_close_transitions_once() {
    let (handle, _rx) = ConnectionHandle::new(1, 1);
    let clone = handle.clone();
    assert!(!handle.is_closed());
    assert!(clone.close());
    assert!(!handle.close());
    assert!(handle.is_closed());
}

#[test]
fn test_teardown_is_idempotent() {
    let registry = ConnectionRegistry::new();
    let (handle, _rx) = registered(&registry, 1);

    teardown(&registry, &handle, Disconnect::ReadFailed);
    assert!(registry.is_empty());
    assert!(handle.is_closed());

    // A newer registration survives a late second teardown of the old one.
    let (newer, _rx2) = registered(&registry, 1);
    teardown(&registry, &handle, Disconnect::WriteFailed);
    assert_eq!(registry.get(1).unwrap().id(), newer.id());
}

#[tokio::test]
async fn test_read_pump_forwards_valid_and_skips_malformed() {
    let registry = ConnectionRegistry::new();
    let (handle, _outbound) = registered(&registry, 1);
    let (mut frames_tx, frames_rx) = transport::unbounded::<Frames>();
    let (inbound_tx, mut inbound_rx) = mpsc::channel(8);

    tokio::spawn(read_pump(
        handle.clone(),
        frames_rx,
        inbound_tx,
        registry.clone(),
        1024,
    ));

    let frames = [
        WsMessage::text("garbage"),
        WsMessage::text(json!({ "recipient_id": 2, "room_id": 5, "content": "both" }).to_string()),
        WsMessage::text(json!({ "sender_id": 42, "room_id": 5, "content": "hi" }).to_string()),
    ];
    for frame in frames {
        frames_tx.send(Ok(frame)).await.unwrap();
    }

    let forwarded = timeout(Duration::from_secs(2), inbound_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        forwarded,
        Message {
            sender_id: 1,
            target: Target::Room(5),
            content: "hi".to_string(),
        }
    );
    assert!(inbound_rx.try_recv().is_err());
    assert!(registry.contains(1));
    assert!(!handle.is_closed());
}

#[tokio::test]
async fn test_read_pump_error_tears_down() {
    let registry = ConnectionRegistry::new();
    let (handle, _outbound) = registered(&registry, 1);
    let (mut frames_tx, frames_rx) = transport::unbounded::<Frames>();
    let (inbound_tx, _inbound_rx) = mpsc::channel(8);

    let pump = tokio::spawn(read_pump(
        handle.clone(),
        frames_rx,
        inbound_tx,
        registry.clone(),
        1024,
    ));
    frames_tx
        .send(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")))
        .await
        .unwrap();

    timeout(Duration::from_secs(2), pump).await.unwrap().unwrap();
    assert!(registry.is_empty());
    assert!(handle.is_closed());
}

#[tokio::test]
async fn test_read_pump_clean_close_tears_down() {
    let registry = ConnectionRegistry::new();
    let (handle, _outbound) = registered(&registry, 1);
    let (mut frames_tx, frames_rx) = transport::unbounded::<Frames>();
    let (inbound_tx, _inbound_rx) = mpsc::channel(8);

    let pump = tokio::spawn(read_pump(
        handle.clone(),
        frames_rx,
        inbound_tx,
        registry.clone(),
        1024,
    ));
    frames_tx.send(Ok(WsMessage::Close(None))).await.unwrap();

    timeout(Duration::from_secs(2), pump).await.unwrap().unwrap();
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_write_pump_delivers_in_order() {
    let registry = ConnectionRegistry::new();
    let (handle, outbound) = registered(&registry, 1);
    let (sink, mut written) = transport::unbounded::<WsMessage>();

    tokio::spawn(write_pump(handle.clone(), outbound, sink, registry.clone()));
    for content in ["one", "two", "three"] {
        handle.enqueue(WsMessage::text(content)).unwrap();
    }

    for content in ["one", "two", "three"] {
        let frame = timeout(Duration::from_secs(2), written.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(frame, WsMessage::text(content));
    }
}

#[tokio::test]
async fn test_write_failure_stops_both_pumps() {
    let registry = ConnectionRegistry::new();
    let (handle, outbound) = registered(&registry, 1);
    let (sink, written) = transport::unbounded::<WsMessage>();
    let (frames_tx, frames_rx) = transport::unbounded::<Frames>();
    let (inbound_tx, _inbound_rx) = mpsc::channel(8);
    drop(written);

    let writer = tokio::spawn(write_pump(handle.clone(), outbound, sink, registry.clone()));
    let reader = tokio::spawn(read_pump(
        handle.clone(),
        frames_rx,
        inbound_tx,
        registry.clone(),
        1024,
    ));

    handle.enqueue(WsMessage::text("lost")).unwrap();

    timeout(Duration::from_secs(2), writer).await.unwrap().unwrap();
    timeout(Duration::from_secs(2), reader).await.unwrap().unwrap();
    assert!(registry.is_empty());
    eventually(|| frames_tx.is_closed()).await;
}

#[tokio::test]
async fn test_close_stops_pumps_and_closes_transport() {
    let registry = ConnectionRegistry::new();
    let (handle, outbound) = registered(&registry, 1);
    let (sink, mut written) = transport::unbounded::<WsMessage>();
    let (_frames_tx, frames_rx) = transport::unbounded::<Frames>();
    let (inbound_tx, _inbound_rx) = mpsc::channel(8);

    let writer = tokio::spawn(write_pump(handle.clone(), outbound, sink, registry.clone()));
    let reader = tokio::spawn(read_pump(
        handle.clone(),
        frames_rx,
        inbound_tx,
        registry.clone(),
        1024,
    ));

    teardown(&registry, &handle, Disconnect::Closed);

    timeout(Duration::from_secs(2), writer).await.unwrap().unwrap();
    timeout(Duration::from_secs(2), reader).await.unwrap().unwrap();
    // The sink was closed, so the peer sees end of stream.
    assert!(written.next().await.is_none());
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_close_stops_write_pump_blocked_on_stalled_peer() {
    let registry = ConnectionRegistry::new();
    let (handle, outbound) = registered(&registry, 1);
    // Zero buffer and a receiver that is never polled: the second send blocks.
    let (sink, _unread) = transport::channel::<WsMessage>(0);

    for content in ["a", "b", "c"] {
        handle.enqueue(WsMessage::text(content)).unwrap();
    }
    let writer = tokio::spawn(write_pump(handle.clone(), outbound, sink, registry.clone()));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!writer.is_finished());

    teardown(&registry, &handle, Disconnect::Closed);

    timeout(Duration::from_secs(2), writer).await.unwrap().unwrap();
    assert!(registry.is_empty());
}
