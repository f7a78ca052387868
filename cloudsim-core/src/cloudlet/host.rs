//! Minimal host data holder (`spec.md` §6): the physical capacity VMs are
//! carved out of. Power models, network topology, and placement heuristics
//! beyond the [`super::allocation::VmAllocationPolicy`] extension point are
//! non-goals of this core.

use super::allocation::HostId;
use super::vm::{Vm, VmId};

/// A physical host: total PE/MIPS/RAM/BW capacity and the VMs currently
/// placed on it.
pub struct Host {
    pub id: HostId,
    pub pe_count: u32,
    pub mips_per_pe: f64,
    pub ram: u64,
    pub bw: u64,
    vms: Vec<Vm>,
}

impl Host {
    pub fn new(id: HostId, pe_count: u32, mips_per_pe: f64, ram: u64, bw: u64) -> Self {
        Self {
            id,
            pe_count,
            mips_per_pe,
            ram,
            bw,
            vms: Vec::new(),
        }
    }

    pub fn total_mips(&self) -> f64 {
        self.pe_count as f64 * self.mips_per_pe
    }

    pub fn allocated_mips(&self) -> f64 {
        self.vms
            .iter()
            .map(|vm| vm.pe_count as f64 * vm.mips_per_pe)
            .sum()
    }

    pub fn available_mips(&self) -> f64 {
        (self.total_mips() - self.allocated_mips()).max(0.0)
    }

    pub fn vms(&self) -> &[Vm] {
        &self.vms
    }

    pub fn vms_mut(&mut self) -> &mut [Vm] {
        &mut self.vms
    }

    pub fn find_vm(&self, id: VmId) -> Option<&Vm> {
        self.vms.iter().find(|vm| vm.id == id)
    }

    /// Places a VM on this host if enough MIPS remain, per the "admission"
    /// shape every resource list in this core follows (`spec.md` §4.3).
    pub fn place_vm(&mut self, vm: Vm) -> Result<(), Vm> {
        if vm.pe_count as f64 * vm.mips_per_pe <= self.available_mips() {
            self.vms.push(vm);
            Ok(())
        } else {
            Err(vm)
        }
    }

    pub fn remove_vm(&mut self, id: VmId) -> Option<Vm> {
        let pos = self.vms.iter().position(|vm| vm.id == id)?;
        Some(self.vms.remove(pos))
    }
}
