//! # Access Control Adapter
//!
//! Capability-to-account-set mapping held in memory.

use crate::domain::entities::Capability;
use crate::domain::value_objects::Address;
use crate::ports::outbound::AccessControl;
use std::collections::{HashMap, HashSet};

/// In-memory capability registry.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccessControl {
    holders: HashMap<Capability, HashSet<Address>>,
}

impl InMemoryAccessControl {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry where `admin` holds every capability.
    #[must_use]
    pub fn with_admin(admin: Address) -> Self {
        let mut registry = Self::new();
        for capability in Capability::ALL {
            registry.grant(capability, admin);
        }
        registry
    }

    /// Accounts currently holding `capability`.
    #[must_use]
    pub fn holders(&self, capability: Capability) -> Vec<Address> {
        let mut holders: Vec<Address> = self
            .holders
            .get(&capability)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        holders.sort();
        holders
    }
}

impl AccessControl for InMemoryAccessControl {
    fn has_capability(&self, account: &Address, capability: Capability) -> bool {
        self.holders
            .get(&capability)
            .is_some_and(|set| set.contains(account))
    }

    fn grant(&mut self, capability: Capability, account: Address) -> bool {
        self.holders.entry(capability).or_default().insert(account)
    }

    fn revoke(&mut self, capability: Capability, account: Address) -> bool {
        self.holders
            .get_mut(&capability)
            .is_some_and(|set| set.remove(&account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_admin_grants_everything() {
        let admin = Address::from_low_u8(1);
        let access = InMemoryAccessControl::with_admin(admin);
        for capability in Capability::ALL {
            assert!(access.has_capability(&admin, capability));
            assert_eq!(access.holders(capability), vec![admin]);
        }
    }

    #[test]
    fn test_grant_and_revoke_report_change() {
        let mut access = InMemoryAccessControl::new();
        let account = Address::from_low_u8(2);
        assert!(access.grant(Capability::BurnControl, account));
        assert!(!access.grant(Capability::BurnControl, account));
        assert!(!access.has_capability(&account, Capability::Admin));
        assert!(access.revoke(Capability::BurnControl, account));
        assert!(!access.revoke(Capability::BurnControl, account));
        assert!(!access.has_capability(&account, Capability::BurnControl));
    }
}
