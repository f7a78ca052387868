//! Cloud Information Service: a privileged entity that registers on engine
//! startup and holds the data-center directory (`spec.md` §2, component C8).
//!
//! `spec.md` §9 ("Global/singleton engine") calls for this to be an ordinary
//! entity constructed during engine init rather than process-wide mutable
//! state — it has no special engine hooks, it is simply the first entity
//! conventionally registered, and other entities discover data centers by
//! sending it `SEND` messages the way they would any other entity.

use std::collections::HashMap;

use crate::engine::EngineContext;
use crate::entity::{Entity, EntityId};

/// Tag used by entities to register a data center with the directory.
pub const TAG_REGISTER_DATACENTER: i64 = 1;
/// Tag used by entities to request the full data-center list.
pub const TAG_LIST_DATACENTERS: i64 = 2;

/// The data-center directory. Holds `(name -> entity id)` pairs registered
/// by data-center entities during their own `start()`.
#[derive(Default)]
pub struct CloudInformationService {
    datacenters: HashMap<String, EntityId>,
}

impl CloudInformationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, id: EntityId) {
        self.datacenters.insert(name.into(), id);
    }

    pub fn lookup(&self, name: &str) -> Option<EntityId> {
        self.datacenters.get(name).copied()
    }

    pub fn datacenter_ids(&self) -> Vec<EntityId> {
        self.datacenters.values().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.datacenters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datacenters.is_empty()
    }
}

impl Entity for CloudInformationService {
    fn start(&mut self, _ctx: &mut EngineContext<'_>) {}

    fn run(&mut self, ctx: &mut EngineContext<'_>) {
        if let Some(event) = ctx.take_event() {
            if event.tag == TAG_REGISTER_DATACENTER {
                if let Some(&id) = event.payload.downcast_ref::<EntityId>() {
                    self.register(format!("dc-{id}"), id);
                }
            }
        }
        ctx.wait(None);
    }

    fn shutdown(&mut self, _ctx: &mut EngineContext<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_and_looks_up_datacenters() {
        let mut cis = CloudInformationService::new();
        assert!(cis.is_empty());
        cis.register("dc0", 3);
        assert_eq!(cis.lookup("dc0"), Some(3));
        assert_eq!(cis.datacenter_ids(), vec![3]);
    }
}
