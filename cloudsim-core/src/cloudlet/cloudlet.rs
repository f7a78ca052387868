//! The immutable job descriptor a [`CloudletExecutionInfo`](super::execution::CloudletExecutionInfo)
//! wraps with mutable per-VM execution state.

use std::cell::Cell;

use super::utilization::UtilizationModel;

/// Unique identifier for a [`Cloudlet`].
pub type CloudletId = u64;

/// A unit of compute work: an instruction length, a PE/RAM/BW requirement,
/// and the utilization models that scale how much of its requested
/// resources it actually consumes over time.
///
/// Immutable once submitted — `spec.md` §3 calls this out explicitly as the
/// thing [`CloudletExecutionInfo`](super::execution::CloudletExecutionInfo)
/// wraps rather than mutates — with one exception: `cloudletFinish` (§4.3)
/// truncates `length` down to whatever was actually executed, and the
/// record is reached only through a shared `Arc<Cloudlet>`, so `length`
/// needs interior mutability to shrink in place.
pub struct Cloudlet {
    pub id: CloudletId,
    /// Length in millions of instructions (MI).
    pub length: Cell<u64>,
    pub pes_required: u32,
    pub ram_required: u64,
    pub bw_required: u64,
    pub submission_time: f64,
    pub cpu_utilization: Box<dyn UtilizationModel>,
    pub ram_utilization: Box<dyn UtilizationModel>,
    pub bw_utilization: Box<dyn UtilizationModel>,
}

impl Cloudlet {
    pub fn new(
        id: CloudletId,
        length: u64,
        pes_required: u32,
        submission_time: f64,
        cpu_utilization: Box<dyn UtilizationModel>,
        ram_utilization: Box<dyn UtilizationModel>,
        bw_utilization: Box<dyn UtilizationModel>,
    ) -> Self {
        Self {
            id,
            length: Cell::new(length),
            pes_required,
            ram_required: 0,
            bw_required: 0,
            submission_time,
            cpu_utilization,
            ram_utilization,
            bw_utilization,
        }
    }

    pub fn with_ram_bw(mut self, ram_required: u64, bw_required: u64) -> Self {
        self.ram_required = ram_required;
        self.bw_required = bw_required;
        self
    }
}

impl std::fmt::Debug for Cloudlet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cloudlet")
            .field("id", &self.id)
            .field("length", &self.length.get())
            .field("pes_required", &self.pes_required)
            .finish_non_exhaustive()
    }
}
