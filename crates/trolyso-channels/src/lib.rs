//! # TroLySo Channels
//! Facebook Messenger: outbound Send API with bounded retries, inbound
//! webhook payload parsing and the subscription handshake.

pub mod messenger;
pub mod webhook;

pub use messenger::MessengerChannel;
pub use webhook::{WebhookQuery, parse_webhook, verify_subscription};
