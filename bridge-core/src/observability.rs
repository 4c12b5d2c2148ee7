//! Canonical structured event names used across `bridge-core`.

// Connector lifecycle events.
pub const CONNECTOR_START: &str = "connector_start";
pub const CONNECTOR_START_OK: &str = "connector_start_ok";
pub const CONNECTOR_START_FAILED: &str = "connector_start_failed";
pub const CONNECTOR_SHUTDOWN: &str = "connector_shutdown";
pub const CONNECTOR_SHUTDOWN_STEP_FAILED: &str = "connector_shutdown_step_failed";

// Message-path events.
pub const MESSAGE_RECEIVED: &str = "message_received";
pub const CONVERT_FAILED: &str = "convert_failed";
pub const PUBLISH_OK: &str = "publish_ok";
pub const PUBLISH_FAILED: &str = "publish_failed";
pub const MQ_PUT_FAILED: &str = "mq_put_failed";
pub const BACKOUT_FAILED: &str = "backout_failed";

// MQ callback dispatcher events.
pub const MQ_CALLBACK_HEARTBEAT: &str = "mq_callback_heartbeat";
pub const MQ_CALLBACK_ERROR: &str = "mq_callback_error";

// Supervisor events.
pub const BRIDGE_START: &str = "bridge_start";
pub const BRIDGE_START_OK: &str = "bridge_start_ok";
pub const BRIDGE_STOP: &str = "bridge_stop";
pub const BRIDGE_STOP_OK: &str = "bridge_stop_ok";
pub const NATS_CONNECTED: &str = "nats_connected";
pub const NATS_DISCONNECTED: &str = "nats_disconnected";
pub const NATS_RECONNECTED: &str = "nats_reconnected";
pub const NATS_CLOSED: &str = "nats_closed";
pub const STAN_CONNECTED: &str = "stan_connected";
pub const CONNECTOR_ERROR: &str = "connector_error";
