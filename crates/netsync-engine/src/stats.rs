//! Engine statistics.

use serde::Serialize;

/// Counters accumulated across apply calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub passes: u64,
    pub failures: u64,
    pub routers_created: u64,
    pub routers_updated: u64,
    pub routers_deleted: u64,
    pub chains_created: u64,
    pub chains_deleted: u64,
    pub rules_created: u64,
    pub rules_deleted: u64,
    pub routes_created: u64,
    pub routes_deleted: u64,
    pub ports_created: u64,
    pub ports_linked: u64,
    pub ports_deleted: u64,
}

impl SyncStats {
    /// Total number of controller objects created, deleted or linked.
    pub fn mutations(&self) -> u64 {
        self.routers_created
            .saturating_add(self.routers_updated)
            .saturating_add(self.routers_deleted)
            .saturating_add(self.chains_created)
            .saturating_add(self.chains_deleted)
            .saturating_add(self.rules_created)
            .saturating_add(self.rules_deleted)
            .saturating_add(self.routes_created)
            .saturating_add(self.routes_deleted)
            .saturating_add(self.ports_created)
            .saturating_add(self.ports_linked)
            .saturating_add(self.ports_deleted)
    }

    pub fn record_pass(&mut self) {
        self.passes = self.passes.saturating_add(1);
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }

    pub fn record_router_created(&mut self) {
        self.routers_created = self.routers_created.saturating_add(1);
    }

    pub fn record_router_updated(&mut self) {
        self.routers_updated = self.routers_updated.saturating_add(1);
    }

    pub fn record_router_deleted(&mut self) {
        self.routers_deleted = self.routers_deleted.saturating_add(1);
    }

    pub fn record_chain_created(&mut self) {
        self.chains_created = self.chains_created.saturating_add(1);
    }

    pub fn record_chain_deleted(&mut self) {
        self.chains_deleted = self.chains_deleted.saturating_add(1);
    }

    pub fn record_rule_created(&mut self) {
        self.rules_created = self.rules_created.saturating_add(1);
    }

    pub fn record_rule_deleted(&mut self) {
        self.rules_deleted = self.rules_deleted.saturating_add(1);
    }

    pub fn record_route_created(&mut self) {
        self.routes_created = self.routes_created.saturating_add(1);
    }

    pub fn record_route_deleted(&mut self) {
        self.routes_deleted = self.routes_deleted.saturating_add(1);
    }

    pub fn record_port_created(&mut self) {
        self.ports_created = self.ports_created.saturating_add(1);
    }

    pub fn record_port_linked(&mut self) {
        self.ports_linked = self.ports_linked.saturating_add(1);
    }

    pub fn record_port_deleted(&mut self) {
        self.ports_deleted = self.ports_deleted.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutations_exclude_pass_counters() {
        let mut stats = SyncStats::default();
        stats.record_pass();
        stats.record_failure();
        assert_eq!(stats.mutations(), 0);

        stats.record_rule_created();
        stats.record_route_created();
        stats.record_port_linked();
        assert_eq!(stats.mutations(), 3);
    }

    #[test]
    fn test_saturating() {
        let mut stats = SyncStats {
            rules_created: u64::MAX,
            ..Default::default()
        };
        stats.record_rule_created();
        assert_eq!(stats.rules_created, u64::MAX);
    }
}
