//! Subscriber category preferences.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::models::{JobCategory, SubscriberId};

/// At most one category preference per subscriber.
#[derive(Default)]
pub struct SubscriptionRegistry {
    preferences: RwLock<HashMap<SubscriberId, JobCategory>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace a preference. Returns the previous one.
    pub async fn set_preference(
        &self,
        subscriber: &SubscriberId,
        category: JobCategory,
    ) -> Option<JobCategory> {
        let previous = self
            .preferences
            .write()
            .await
            .insert(subscriber.clone(), category);
        log::info!("{} now follows {} updates", subscriber, category);
        previous
    }

    /// Remove a preference. Returns what was removed.
    pub async fn clear_preference(&self, subscriber: &SubscriberId) -> Option<JobCategory> {
        let removed = self.preferences.write().await.remove(subscriber);
        if removed.is_some() {
            log::info!("{} cleared their preference", subscriber);
        }
        removed
    }

    pub async fn get_preference(&self, subscriber: &SubscriberId) -> Option<JobCategory> {
        self.preferences.read().await.get(subscriber).copied()
    }

    /// Subscribers whose preference equals `category`, sorted by id.
    pub async fn subscribers_for(&self, category: JobCategory) -> Vec<SubscriberId> {
        let mut matching: Vec<SubscriberId> = self
            .preferences
            .read()
            .await
            .iter()
            .filter(|&(_, &c)| c == category)
            .map(|(id, _)| id.clone())
            .collect();
        matching.sort();
        matching
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_clear() {
        let registry = SubscriptionRegistry::new();
        let alice = SubscriberId::from("alice");

        assert_eq!(registry.get_preference(&alice).await, None);
        assert_eq!(registry.set_preference(&alice, JobCategory::Swe).await, None);
        assert_eq!(
            registry.set_preference(&alice, JobCategory::Finance).await,
            Some(JobCategory::Swe)
        );
        assert_eq!(registry.get_preference(&alice).await, Some(JobCategory::Finance));

        assert_eq!(
            registry.clear_preference(&alice).await,
            Some(JobCategory::Finance)
        );
        assert_eq!(registry.get_preference(&alice).await, None);
        assert_eq!(registry.clear_preference(&alice).await, None);
    }

    #[tokio::test]
    async fn test_subscribers_for() {
        let registry = SubscriptionRegistry::new();
        registry.set_preference(&"carol".into(), JobCategory::Swe).await;
        registry.set_preference(&"alice".into(), JobCategory::Swe).await;
        registry.set_preference(&"bob".into(), JobCategory::Finance).await;

        assert_eq!(
            registry.subscribers_for(JobCategory::Swe).await,
            vec![SubscriberId::from("alice"), SubscriberId::from("carol")]
        );
        assert_eq!(
            registry.subscribers_for(JobCategory::Finance).await,
            vec![SubscriberId::from("bob")]
        );
    }
}
