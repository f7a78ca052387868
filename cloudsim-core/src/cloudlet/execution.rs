//! Per-VM execution record for a single cloudlet (`spec.md` §3, component
//! C5).

use std::sync::Arc;

use super::cloudlet::Cloudlet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudletStatus {
    Created,
    Ready,
    Queued,
    Inexec,
    Paused,
    Resumed,
    Success,
    Failed,
    Canceled,
}

/// The mutable state a [`crate::cloudlet::CloudletScheduler`] tracks for one
/// admitted cloudlet, alongside a shared reference to its immutable
/// descriptor.
pub struct CloudletExecutionInfo {
    pub cloudlet: Arc<Cloudlet>,
    pub status: CloudletStatus,
    pub file_transfer_time: f64,
    pub instructions_finished_so_far: u64,
    pub last_processing_time: f64,
    pub allocated_mips: f64,
    pub used_pes: u32,
    /// Time at which this record last entered EXEC (used as the lower bound
    /// for Δt alongside `previousTime`, `spec.md` §4.3).
    pub arrival_time: f64,
    pub finish_time: Option<f64>,
}

impl CloudletExecutionInfo {
    pub fn new(cloudlet: Arc<Cloudlet>, file_transfer_time: f64) -> Self {
        let submission_time = cloudlet.submission_time;
        Self {
            cloudlet,
            status: CloudletStatus::Created,
            file_transfer_time,
            instructions_finished_so_far: 0,
            last_processing_time: submission_time,
            allocated_mips: 0.0,
            used_pes: 0,
            arrival_time: submission_time,
            finish_time: None,
        }
    }

    pub fn id(&self) -> super::cloudlet::CloudletId {
        self.cloudlet.id
    }

    pub fn remaining_instructions(&self) -> u64 {
        self.cloudlet
            .length
            .get()
            .saturating_sub(self.instructions_finished_so_far)
    }

    pub fn is_finished(&self) -> bool {
        self.instructions_finished_so_far >= self.cloudlet.length.get()
    }
}
