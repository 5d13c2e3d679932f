//! # JetStream Channels
//! Outbound integrations: the Telegram notification channel and the
//! AppsFlyer S2S delivery transport.

pub mod appsflyer;
pub mod telegram;

pub use appsflyer::AppsFlyerClient;
pub use telegram::TelegramNotifier;
