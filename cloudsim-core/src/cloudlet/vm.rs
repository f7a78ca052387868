//! Minimal VM data holder (`spec.md` §3, component C4): the PE/MIPS
//! capacity a cloudlet scheduler is handed each tick, plus the scheduler
//! instance itself. Datacenter/host placement is out of scope for this
//! core (`spec.md` §6 Non-goals) — a `Vm` only knows its own capacity and
//! its scheduler, not which host it runs on.

use super::scheduler::CloudletScheduler;

pub type VmId = super::allocation::VmId;

/// A virtual machine: a fixed number of PEs at a fixed per-PE MIPS rating,
/// fronted by a [`CloudletScheduler`] that decides how cloudlets share that
/// capacity.
pub struct Vm {
    pub id: VmId,
    pub pe_count: u32,
    pub mips_per_pe: f64,
    pub ram: u64,
    pub bw: u64,
    pub scheduler: Box<dyn CloudletScheduler>,
}

impl Vm {
    pub fn new(
        id: VmId,
        pe_count: u32,
        mips_per_pe: f64,
        ram: u64,
        bw: u64,
        scheduler: Box<dyn CloudletScheduler>,
    ) -> Self {
        Self {
            id,
            pe_count,
            mips_per_pe,
            ram,
            bw,
            scheduler,
        }
    }

    /// The MIPS share handed to the scheduler on an unconstrained VM: every
    /// PE at full rating. Hosts with contention would scale this down
    /// before calling `update_vm_processing`, but that scaling is a
    /// datacenter concern this core does not model.
    pub fn full_mips_share(&self) -> Vec<f64> {
        vec![self.mips_per_pe; self.pe_count as usize]
    }
}
