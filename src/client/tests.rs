use std::net::SocketAddr;
use std::str::FromStr;

use chrono::Utc;
use tokio::time::{Duration, timeout};

use super::{Publisher, Subscriber};
use crate::broker::topic::Topic;
use crate::transport::message::{self, Header};
use crate::transport::udp::{MAX_DATAGRAM_LEN, UdpEndpoint};
use crate::utils::error::Error;

fn compile(pattern: &str) -> Topic {
    Topic::from_str(pattern).unwrap()
}

async fn fake_broker() -> UdpEndpoint {
    UdpEndpoint::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap()
}

async fn recv_datagram(endpoint: &UdpEndpoint) -> (Vec<u8>, SocketAddr) {
    let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
    let (len, from) = timeout(Duration::from_secs(1), endpoint.recv_from(&mut buf))
        .await
        .expect("timed out waiting for a datagram")
        .unwrap();
    buf.truncate(len);
    (buf, from)
}

/// Drives one poll and drains the heartbeat + subscribe it sends, handing
/// back the subscriber's address as the broker observes it.
async fn drain_first_poll(subscriber: &mut Subscriber, broker: &UdpEndpoint) -> SocketAddr {
    assert_eq!(subscriber.poll().await.unwrap(), None);
    let (_, from) = recv_datagram(broker).await;
    let _ = recv_datagram(broker).await;
    from
}

/// Loopback delivery is instant, but the subscriber's non-blocking read
/// only observes a datagram after the runtime has parked once, so give it
/// a scheduler turn.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

#[tokio::test]
async fn test_publisher_sends_one_publish_datagram() {
    let broker = fake_broker().await;
    let publisher = Publisher::new(broker.local_addr().unwrap()).await.unwrap();

    let topic = compile("a.b");
    publisher.publish(topic, b"reading").await.unwrap();

    let (datagram, _) = recv_datagram(&broker).await;
    assert_eq!(
        Header::decode(&datagram).unwrap().unwrap(),
        Header::Publish { topic },
    );
    assert_eq!(message::payload(&datagram).unwrap(), b"reading");
}

#[tokio::test]
async fn test_first_poll_sends_heartbeat_then_subscribe() {
    let broker = fake_broker().await;
    let mut subscriber = Subscriber::new(broker.local_addr().unwrap(), compile("a.b"))
        .await
        .unwrap();
    assert!(!subscriber.connected());
    assert!(!subscriber.subscribed());

    assert_eq!(subscriber.poll().await.unwrap(), None);

    let (heartbeat, _) = recv_datagram(&broker).await;
    match Header::decode(&heartbeat).unwrap().unwrap() {
        Header::Heartbeat { timestamp_ms } => {
            assert!(timestamp_ms <= Utc::now().timestamp_millis());
        }
        other => panic!("expected a heartbeat, got {other:?}"),
    }

    let (subscribe, _) = recv_datagram(&broker).await;
    assert_eq!(
        Header::decode(&subscribe).unwrap().unwrap(),
        Header::Subscribe {
            topic: compile("a.b"),
        },
    );
}

#[tokio::test]
async fn test_nothing_is_resent_within_the_heartbeat_interval() {
    let broker = fake_broker().await;
    let mut subscriber = Subscriber::new(broker.local_addr().unwrap(), compile("a"))
        .await
        .unwrap();

    subscriber.poll().await.unwrap();
    subscriber.poll().await.unwrap();
    subscriber.poll().await.unwrap();

    recv_datagram(&broker).await; // heartbeat
    recv_datagram(&broker).await; // subscribe
    let mut buf = [0u8; 64];
    assert!(broker.try_recv_from(&mut buf).unwrap().is_none());
}

#[tokio::test]
async fn test_matching_ack_confirms_the_subscription() {
    let broker = fake_broker().await;
    let topic = compile("a.b");
    let mut subscriber = Subscriber::new(broker.local_addr().unwrap(), topic)
        .await
        .unwrap();
    let sub_addr = drain_first_poll(&mut subscriber, &broker).await;

    let ack = Header::Heartbeat {
        timestamp_ms: Utc::now().timestamp_millis(),
    }
    .encode(topic.as_bytes());
    broker.send_to(&ack, sub_addr).await.unwrap();
    settle().await;

    assert_eq!(subscriber.poll().await.unwrap(), None);
    assert!(subscriber.connected());
    assert!(subscriber.subscribed());
}

#[tokio::test]
async fn test_mismatched_ack_topic_leaves_the_subscription_unconfirmed() {
    let broker = fake_broker().await;
    let mut subscriber = Subscriber::new(broker.local_addr().unwrap(), compile("a.b"))
        .await
        .unwrap();
    let sub_addr = drain_first_poll(&mut subscriber, &broker).await;

    // The all-zero topic is what a freshly restarted broker reports.
    let ack = Header::Heartbeat {
        timestamp_ms: Utc::now().timestamp_millis(),
    }
    .encode(Topic::default().as_bytes());
    broker.send_to(&ack, sub_addr).await.unwrap();
    settle().await;

    assert_eq!(subscriber.poll().await.unwrap(), None);
    assert!(subscriber.connected());
    assert!(!subscriber.subscribed());
}

#[tokio::test]
async fn test_subscription_expires_once_acks_go_stale() {
    let broker = fake_broker().await;
    let topic = compile("a.b");
    let mut subscriber = Subscriber::new(broker.local_addr().unwrap(), topic)
        .await
        .unwrap();
    let sub_addr = drain_first_poll(&mut subscriber, &broker).await;

    let ack = Header::Heartbeat {
        timestamp_ms: Utc::now().timestamp_millis() - 20_000,
    }
    .encode(topic.as_bytes());
    broker.send_to(&ack, sub_addr).await.unwrap();
    settle().await;

    assert_eq!(subscriber.poll().await.unwrap(), None);
    assert!(!subscriber.connected());
    assert!(!subscriber.subscribed());
}

#[tokio::test]
async fn test_matching_publish_is_returned_to_the_caller() {
    let broker = fake_broker().await;
    let topic = compile("a.b");
    let mut subscriber = Subscriber::new(broker.local_addr().unwrap(), topic)
        .await
        .unwrap();
    let sub_addr = drain_first_poll(&mut subscriber, &broker).await;

    broker
        .send_to(&Header::Publish { topic }.encode(b"event"), sub_addr)
        .await
        .unwrap();
    settle().await;

    let received = subscriber.poll().await.unwrap();
    assert_eq!(received.as_deref(), Some(&b"event"[..]));
}

#[tokio::test]
async fn test_non_matching_publish_is_filtered_out() {
    let broker = fake_broker().await;
    let mut subscriber = Subscriber::new(broker.local_addr().unwrap(), compile("a.b"))
        .await
        .unwrap();
    let sub_addr = drain_first_poll(&mut subscriber, &broker).await;

    broker
        .send_to(
            &Header::Publish {
                topic: compile("c.d"),
            }
            .encode(b"event"),
            sub_addr,
        )
        .await
        .unwrap();
    settle().await;

    assert_eq!(subscriber.poll().await.unwrap(), None);
}

#[tokio::test]
async fn test_datagram_from_an_unexpected_sender_fails_the_poll() {
    let broker = fake_broker().await;
    let stranger = UdpEndpoint::ephemeral().await.unwrap();
    let mut subscriber = Subscriber::new(broker.local_addr().unwrap(), compile("a"))
        .await
        .unwrap();
    let sub_addr = drain_first_poll(&mut subscriber, &broker).await;

    stranger
        .send_to(&Header::Error.encode(&[]), sub_addr)
        .await
        .unwrap();
    settle().await;

    match subscriber.poll().await.unwrap_err() {
        Error::UnexpectedSender { expected, actual } => {
            assert_eq!(expected, broker.local_addr().unwrap());
            assert_eq!(actual.port(), stranger.local_addr().unwrap().port());
        }
        other => panic!("expected UnexpectedSender, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ack_with_a_short_payload_is_malformed() {
    let broker = fake_broker().await;
    let mut subscriber = Subscriber::new(broker.local_addr().unwrap(), compile("a"))
        .await
        .unwrap();
    let sub_addr = drain_first_poll(&mut subscriber, &broker).await;

    let ack = Header::Heartbeat {
        timestamp_ms: Utc::now().timestamp_millis(),
    }
    .encode(b"abc");
    broker.send_to(&ack, sub_addr).await.unwrap();
    settle().await;

    let err = subscriber.poll().await.unwrap_err();
    assert!(matches!(err, Error::MalformedHeartbeat(3)));
    assert!(!subscriber.connected());
}
