use bridge_core::config::{ConnectorConfig, ConnectorKind, MqConfig};

/// A connector configuration with every endpoint blank; tests fill in the
/// fields the scenario needs.
pub fn connector(kind: ConnectorKind) -> ConnectorConfig {
    ConnectorConfig {
        kind,
        id: String::new(),
        subject: String::new(),
        channel: String::new(),
        queue: String::new(),
        topic: String::new(),
        exclude_headers: false,
        durable_name: String::new(),
        start_at_sequence: None,
        deliver_all_available: false,
        mq: MqConfig::default(),
    }
}

#[allow(dead_code)]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
