//! VM-to-host allocation policy extension point (`spec.md` §6). Datacenter
//! placement, power models, and network topology are non-goals of this
//! core — this trait and its NULL object are the only contract the core
//! itself consumes.

use std::collections::HashMap;

pub type VmId = u64;
pub type HostId = u64;

pub trait VmAllocationPolicy: Send {
    fn allocate_host_for_vm(&mut self, vm: VmId, host: Option<HostId>) -> bool;
    fn deallocate_host_for_vm(&mut self, vm: VmId);
    fn optimize_allocation(&mut self, vms: &[VmId]) -> HashMap<VmId, HostId>;
}

/// NULL-object: never allocates, never migrates (`spec.md` §6, "Sentinel
/// values").
pub struct NullVmAllocationPolicy;

impl VmAllocationPolicy for NullVmAllocationPolicy {
    fn allocate_host_for_vm(&mut self, _vm: VmId, _host: Option<HostId>) -> bool {
        false
    }

    fn deallocate_host_for_vm(&mut self, _vm: VmId) {}

    fn optimize_allocation(&mut self, _vms: &[VmId]) -> HashMap<VmId, HostId> {
        HashMap::new()
    }
}
