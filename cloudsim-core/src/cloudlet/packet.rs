//! Packet-scheduler extension point consumed by network-aware cloudlet
//! scheduling (`spec.md` §6).

use super::cloudlet::CloudletId;

pub trait PacketScheduler: Send {
    /// Called with the instructions (MI) a cloudlet executed in the step
    /// that just completed, so a network-aware scheduler can account for
    /// the associated packet tasks.
    fn process_cloudlet_tasks(&mut self, cloudlet_id: CloudletId, executed_mi: u64);
}

/// NULL-object: no network accounting at all (`spec.md` §6, "Sentinel
/// values").
pub struct NullPacketScheduler;

impl PacketScheduler for NullPacketScheduler {
    fn process_cloudlet_tasks(&mut self, _cloudlet_id: CloudletId, _executed_mi: u64) {}
}
