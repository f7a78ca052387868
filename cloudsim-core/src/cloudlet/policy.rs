//! The allocation-policy hook that distinguishes scheduling disciplines
//! (`spec.md` §4.3 "Allocation policy (time-shared default)", §9 "Dynamic
//! dispatch across scheduler disciplines").
//!
//! `CloudletScheduler` shares essentially all of its bookkeeping across
//! disciplines; only the MIPS-allocation formula differs. Rather than
//! duplicate the whole scheduler per discipline, [`super::scheduler::CloudletSchedulerCore`]
//! is generic over one small trait.

use super::execution::CloudletExecutionInfo;
use super::processor::Processor;

/// Computes how many MIPS an EXEC cloudlet is allocated at the current
/// tick, given the processor snapshot and the total PEs currently in use
/// across EXEC.
pub trait AllocationPolicy: Send {
    fn allocated_mips_for_cloudlet(
        &self,
        rcl: &CloudletExecutionInfo,
        processor: &Processor,
        total_used_pes: u32,
    ) -> f64;
}

/// Cloudlets receive proportional time-slices of the VM's MIPS, capped at
/// what they could use if the whole VM were theirs.
pub struct TimeSharedPolicy;

impl AllocationPolicy for TimeSharedPolicy {
    fn allocated_mips_for_cloudlet(
        &self,
        rcl: &CloudletExecutionInfo,
        processor: &Processor,
        total_used_pes: u32,
    ) -> f64 {
        if total_used_pes == 0 {
            return 0.0;
        }
        let total_mips = processor.total_mips();
        let share = total_mips * rcl.cloudlet.pes_required as f64 / total_used_pes as f64;
        let cap = rcl.cloudlet.pes_required as f64 * processor.max_mips_per_pe();
        share.min(cap)
    }
}

/// Cloudlets receive exclusive PEs until completion: allocation is the sum
/// of the first `pes_required` PE capacities, fixed at admission time.
pub struct SpaceSharedPolicy;

impl AllocationPolicy for SpaceSharedPolicy {
    fn allocated_mips_for_cloudlet(
        &self,
        rcl: &CloudletExecutionInfo,
        processor: &Processor,
        _total_used_pes: u32,
    ) -> f64 {
        processor
            .mips_share
            .iter()
            .take(rcl.cloudlet.pes_required as usize)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudlet::cloudlet::Cloudlet;
    use crate::cloudlet::utilization::UtilizationModelFull;
    use std::sync::Arc;

    fn rcl(pes: u32) -> CloudletExecutionInfo {
        let cloudlet = Arc::new(Cloudlet::new(
            1,
            1000,
            pes,
            0.0,
            Box::new(UtilizationModelFull),
            Box::new(UtilizationModelFull),
            Box::new(UtilizationModelFull),
        ));
        CloudletExecutionInfo::new(cloudlet, 0.0)
    }

    #[test]
    fn time_shared_splits_proportionally_and_caps() {
        let processor = Processor::from_mips_share(&[1000.0, 1000.0]);
        let policy = TimeSharedPolicy;
        // Two 1-PE cloudlets sharing two PEs worth of total_used_pes=2: each
        // gets its fair share, capped at 1 PE's worth.
        let allocated = policy.allocated_mips_for_cloudlet(&rcl(1), &processor, 2);
        assert_eq!(allocated, 1000.0);
    }

    #[test]
    fn space_shared_sums_first_n_pes() {
        let processor = Processor::from_mips_share(&[500.0, 700.0, 900.0]);
        let policy = SpaceSharedPolicy;
        let allocated = policy.allocated_mips_for_cloudlet(&rcl(2), &processor, 2);
        assert_eq!(allocated, 1200.0);
    }
}
