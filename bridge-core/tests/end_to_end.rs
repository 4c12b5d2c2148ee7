//! End-to-end scenarios over the in-memory brokers: each test stands up a
//! full supervisor with one or two connectors and drives real messages
//! through it.

mod support;

use async_trait::async_trait;
use bridge_core::config::ConnectorKind;
use bridge_core::connectors::ConnectorState;
use bridge_core::mq::MqMessageDescriptor;
use bridge_core::nats::{
    NatsMessage, NatsMessageHandler, StanMessage, StanMessageHandler, StanSubscriptionOptions,
};
use bridge_message::BridgeMessage;
use bridge_test_utils::TestFixture;
use std::sync::Arc;
use std::time::Duration;
use support::connector;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

struct StanRecorder {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

#[async_trait]
impl StanMessageHandler for StanRecorder {
    async fn on_message(&self, msg: StanMessage) {
        let _ = self.tx.send(msg.payload);
    }
}

struct NatsRecorder {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

#[async_trait]
impl NatsMessageHandler for NatsRecorder {
    async fn on_message(&self, msg: NatsMessage) {
        let _ = self.tx.send(msg.payload);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn topic_to_stan_passes_the_raw_payload_through() {
    support::init_logging();
    let fixture = TestFixture::start(vec![{
        let mut config = connector(ConnectorKind::Topic2Stan);
        config.channel = "test".to_string();
        config.topic = "dev/".to_string();
        config.exclude_headers = true;
        config
    }])
    .await
    .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let sub = fixture
        .stan()
        .await
        .subscribe(
            "test",
            StanSubscriptionOptions::default(),
            Arc::new(StanRecorder { tx }),
        )
        .await
        .unwrap();

    fixture
        .put_message_on_topic("dev/", MqMessageDescriptor::default(), b"hello world")
        .await;

    let received = timeout(Duration::from_secs(3), rx.recv())
        .await
        .expect("message should arrive within three seconds")
        .unwrap();
    assert_eq!(received, b"hello world");

    sub.unsubscribe().await.unwrap();
    fixture.close().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn topic_to_stan_wraps_the_descriptor_when_headers_are_kept() {
    let start = chrono::Utc::now();
    sleep(Duration::from_millis(25)).await;

    let fixture = TestFixture::start(vec![{
        let mut config = connector(ConnectorKind::Topic2Stan);
        config.channel = "test".to_string();
        config.topic = "dev/".to_string();
        config
    }])
    .await
    .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let sub = fixture
        .stan()
        .await
        .subscribe(
            "test",
            StanSubscriptionOptions::default(),
            Arc::new(StanRecorder { tx }),
        )
        .await
        .unwrap();

    fixture
        .put_message_on_topic("dev/", MqMessageDescriptor::default(), b"hello world")
        .await;

    let received = timeout(Duration::from_secs(3), rx.recv())
        .await
        .expect("message should arrive within three seconds")
        .unwrap();
    assert!(!received.is_empty());

    let bridge_msg = BridgeMessage::decode(&received).unwrap();
    assert_eq!(bridge_msg.body, b"hello world");
    assert_eq!(
        bridge_msg.header.put_date,
        start.format("%Y%m%d").to_string()
    );
    assert!(bridge_msg.header.put_time > start.format("%H%M%S00").to_string());

    sub.unsubscribe().await.unwrap();
    fixture.close().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn nats_to_queue_delivers_with_a_default_descriptor() {
    let fixture = TestFixture::start(vec![{
        let mut config = connector(ConnectorKind::Nats2Queue);
        config.subject = "dev".to_string();
        config.queue = "DEV.QUEUE".to_string();
        config.exclude_headers = true;
        config
    }])
    .await
    .unwrap();

    fixture.nats().await.publish("dev", b"hello").await.unwrap();

    let mut messages = Vec::new();
    for _ in 0..300 {
        messages = fixture.browse_queue("DEV.QUEUE").await;
        if !messages.is_empty() {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].payload, b"hello");

    let defaults = MqMessageDescriptor::default();
    assert_eq!(messages[0].descriptor.version, defaults.version);
    assert_eq!(messages[0].descriptor.format, defaults.format);

    fixture.close().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn queue_to_nats_carries_the_envelope() {
    let fixture = TestFixture::start(vec![{
        let mut config = connector(ConnectorKind::Queue2Nats);
        config.queue = "DEV.QUEUE".to_string();
        config.subject = "dev".to_string();
        config
    }])
    .await
    .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let sub = fixture
        .nats()
        .await
        .subscribe("dev", Arc::new(NatsRecorder { tx }))
        .await
        .unwrap();

    fixture
        .put_message_on_queue("DEV.QUEUE", MqMessageDescriptor::default(), b"hello world")
        .await;

    let received = timeout(Duration::from_secs(3), rx.recv())
        .await
        .expect("message should arrive within three seconds")
        .unwrap();
    let bridge_msg = BridgeMessage::decode(&received).unwrap();
    assert_eq!(bridge_msg.body, b"hello world");

    sub.unsubscribe().await.unwrap();
    fixture.close().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn queue_to_stan_backs_out_and_retries_until_stan_recovers() {
    let fixture = TestFixture::start(vec![{
        let mut config = connector(ConnectorKind::Queue2Stan);
        config.queue = "DEV.QUEUE".to_string();
        config.channel = "test".to_string();
        config.exclude_headers = true;
        config
    }])
    .await
    .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let sub = fixture
        .stan()
        .await
        .subscribe(
            "test",
            StanSubscriptionOptions::default(),
            Arc::new(StanRecorder { tx }),
        )
        .await
        .unwrap();

    fixture.set_stan_available(false);
    fixture
        .put_message_on_queue("DEV.QUEUE", MqMessageDescriptor::default(), b"hello world")
        .await;

    // The publish fails and the get is backed out; nothing reaches the
    // subscriber while the outage lasts.
    sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err());

    fixture.set_stan_available(true);
    let received = timeout(Duration::from_secs(3), rx.recv())
        .await
        .expect("message should arrive after stan recovers")
        .unwrap();
    assert_eq!(received, b"hello world");

    // Exactly once: the retry that succeeded was committed, so the message
    // neither redelivers nor remains on the queue.
    sleep(Duration::from_millis(150)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(fixture.mq.queue_depth("DEV.QUEUE").await, 0);

    sub.unsubscribe().await.unwrap();
    fixture.close().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn nats_connection_loss_stops_the_bridge_without_deadlock() {
    let fixture = TestFixture::start(vec![
        {
            let mut config = connector(ConnectorKind::Topic2Stan);
            config.channel = "test".to_string();
            config.topic = "dev/".to_string();
            config
        },
        {
            let mut config = connector(ConnectorKind::Nats2Queue);
            config.subject = "dev".to_string();
            config.queue = "DEV.QUEUE".to_string();
            config
        },
    ])
    .await
    .unwrap();

    assert!(fixture.bridge.is_running());
    fixture.simulate_nats_connection_loss().await;

    let mut all_stopped = false;
    for _ in 0..300 {
        let connectors = fixture.bridge.connectors().await;
        let mut stopped = !fixture.bridge.is_running();
        for connector in &connectors {
            stopped &= connector.state().await == ConnectorState::Stopped;
        }
        if stopped {
            all_stopped = true;
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert!(all_stopped, "bridge should stop and leave every connector Stopped");
}

#[tokio::test(flavor = "multi_thread")]
async fn double_shutdown_succeeds_and_closes_the_queue_once() {
    let fixture = TestFixture::start(vec![{
        let mut config = connector(ConnectorKind::Nats2Queue);
        config.subject = "dev".to_string();
        config.queue = "DEV.QUEUE".to_string();
        config
    }])
    .await
    .unwrap();

    let connectors = fixture.bridge.connectors().await;
    assert_eq!(connectors.len(), 1);
    let connector = &connectors[0];

    assert!(connector.shutdown().await.is_ok());
    assert!(connector.shutdown().await.is_ok());
    assert_eq!(connector.state().await, ConnectorState::Stopped);
    assert_eq!(fixture.mq.object_close_count("DEV.QUEUE").await, 1);

    fixture.close().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn queue_to_stan_requires_stan_at_start() {
    let stan_less = {
        let mut config = connector(ConnectorKind::Queue2Stan);
        config.queue = "DEV.QUEUE".to_string();
        config.channel = "test".to_string();
        config
    };

    // The fixture's STAN server refuses connections while unavailable, so
    // the supervisor's own connect fails first.
    let mq = bridge_test_utils::MemoryMqServer::new();
    let nats_server = bridge_test_utils::MemoryNatsServer::new();
    let stan_server = bridge_test_utils::MemoryStanServer::new();
    stan_server.set_available(false);

    let bridge = bridge_core::Bridge::new(
        TestFixture::config_for(vec![stan_less]),
        mq,
        nats_server,
        stan_server,
    );
    assert!(bridge.start().await.is_err());
}
