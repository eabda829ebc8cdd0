//! Publish/subscribe event bus
//!
//! The bus only records subscriptions and computes deliveries; `App::publish`
//! dispatches them to the subscribed components.

use std::collections::HashMap;

use serde_json::Value;

use crate::component::InstanceId;
use crate::{UiError, UiResult};

/// Payload handed to `Component::notify`
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub name: String,
    pub data: Value,
}

/// One notification addressed to one subscriber
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub subscriber: InstanceId,
    pub notification: Notification,
}

/// Event name → ordered subscribers
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    channels: HashMap<String, Vec<InstanceId>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber; the channel is created on first use
    pub fn subscribe(&mut self, name: &str, subscriber: InstanceId) -> UiResult<()> {
        validate_name(name)?;
        self.channels
            .entry(name.to_string())
            .or_default()
            .push(subscriber);
        tracing::debug!("{} subscribed to {:?}", subscriber, name);
        Ok(())
    }

    /// Deliveries for one publication, in subscription order
    ///
    /// A channel that was never created is an error; a channel whose
    /// subscribers all left yields no deliveries.
    pub fn publish(&self, name: &str, data: Value) -> UiResult<Vec<Delivery>> {
        let subscribers = self
            .channels
            .get(name)
            .ok_or_else(|| UiError::NoSuchEvent(name.to_string()))?;
        Ok(subscribers
            .iter()
            .map(|&subscriber| Delivery {
                subscriber,
                notification: Notification {
                    name: name.to_string(),
                    data: data.clone(),
                },
            })
            .collect())
    }

    /// Remove every subscription of `subscriber` to `name`
    pub fn unsubscribe(&mut self, name: &str, subscriber: InstanceId) {
        if let Some(subscribers) = self.channels.get_mut(name) {
            subscribers.retain(|&s| s != subscriber);
        }
    }

    /// Remove a subscriber from every channel
    pub fn unsubscribe_all(&mut self, subscriber: InstanceId) {
        for subscribers in self.channels.values_mut() {
            subscribers.retain(|&s| s != subscriber);
        }
    }

    /// Subscribers of a channel
    pub fn subscribers(&self, name: &str) -> &[InstanceId] {
        self.channels.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a channel exists
    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }
}

/// Event names must be non-empty and must not read as a number
fn validate_name(name: &str) -> UiResult<()> {
    let trimmed = name.trim();
    let numeric = trimmed.parse::<f64>().is_ok_and(f64::is_finite);
    if trimmed.is_empty() || numeric {
        return Err(UiError::InvalidEventName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(n: u32) -> Vec<InstanceId> {
        (0..n).map(|i| InstanceId::new(i, 0)).collect()
    }

    #[test]
    fn test_publish_unknown_channel() {
        let bus = EventBus::new();
        assert_eq!(
            bus.publish("nope", json!({})),
            Err(UiError::NoSuchEvent("nope".to_string()))
        );
    }

    #[test]
    fn test_publish_in_subscription_order() {
        let ids = ids(2);
        let mut bus = EventBus::new();
        bus.subscribe("saved", ids[1]).unwrap();
        bus.subscribe("saved", ids[0]).unwrap();

        let deliveries = bus.publish("saved", json!({"id": 7})).unwrap();
        let order: Vec<_> = deliveries.iter().map(|d| d.subscriber).collect();
        assert_eq!(order, vec![ids[1], ids[0]]);
        assert_eq!(deliveries[0].notification.name, "saved");
        assert_eq!(deliveries[0].notification.data, json!({"id": 7}));
    }

    #[test]
    fn test_invalid_names() {
        let ids = ids(1);
        let mut bus = EventBus::new();
        for name in ["", "   ", "42", " 3.5 ", "-1e3"] {
            assert!(
                matches!(bus.subscribe(name, ids[0]), Err(UiError::InvalidEventName(_))),
                "{name:?} should be rejected"
            );
        }
        assert!(bus.subscribe("NaN", ids[0]).is_ok());
        assert!(bus.subscribe("1st-place", ids[0]).is_ok());
    }

    #[test]
    fn test_unsubscribe_removes_all_matches() {
        let ids = ids(2);
        let mut bus = EventBus::new();
        bus.subscribe("tick", ids[0]).unwrap();
        bus.subscribe("tick", ids[1]).unwrap();
        bus.subscribe("tick", ids[0]).unwrap();

        bus.unsubscribe("tick", ids[0]);
        assert_eq!(bus.subscribers("tick"), &[ids[1]]);

        // Unknown channel is a no-op
        bus.unsubscribe("other", ids[0]);
        assert!(!bus.has_channel("other"));
    }

    #[test]
    fn test_emptied_channel_still_exists() {
        let ids = ids(1);
        let mut bus = EventBus::new();
        bus.subscribe("tick", ids[0]).unwrap();
        bus.unsubscribe_all(ids[0]);
        assert_eq!(bus.publish("tick", Value::Null), Ok(Vec::new()));
    }
}
