//! Registered payment channels

use crate::types::ChannelId;
use debt_core::config::{ChannelConfig, PaymentConfig};
use serde::{Deserialize, Serialize};

/// Payment gateway offered in the channel selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentChannel {
    /// Channel ID
    pub id: ChannelId,

    /// Display name
    pub name: String,

    /// Display icon
    pub icon: String,
}

impl From<&ChannelConfig> for PaymentChannel {
    fn from(config: &ChannelConfig) -> Self {
        Self {
            id: ChannelId::new(config.id.clone()),
            name: config.name.clone(),
            icon: config.icon.clone(),
        }
    }
}

/// Set of channels a payment may use
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    channels: Vec<PaymentChannel>,
}

impl ChannelRegistry {
    /// Create registry from channel list
    pub fn new(channels: Vec<PaymentChannel>) -> Self {
        Self { channels }
    }

    /// Registry from config entries
    pub fn from_config(configs: &[ChannelConfig]) -> Self {
        Self::new(configs.iter().map(PaymentChannel::from).collect())
    }

    /// Look up a channel by id
    pub fn get(&self, id: &str) -> Option<&PaymentChannel> {
        self.channels.iter().find(|c| c.id.as_str() == id)
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Display name for `id`, if registered
    pub fn display_name(&self, id: &ChannelId) -> Option<&str> {
        self.get(id.as_str()).map(|c| c.name.as_str())
    }

    /// Channels in selector order
    pub fn iter(&self) -> impl Iterator<Item = &PaymentChannel> {
        self.channels.iter()
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::from_config(&PaymentConfig::default().channels)
    }
}
