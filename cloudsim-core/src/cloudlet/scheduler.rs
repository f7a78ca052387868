//! The per-VM cloudlet scheduler: admission, time-sharing, progress
//! tracking, and utilization reporting (`spec.md` §4.3, component C6).

use std::sync::Arc;

use crate::error::SchedulerError;

use super::cloudlet::{Cloudlet, CloudletId};
use super::execution::{CloudletExecutionInfo, CloudletStatus};
use super::packet::{NullPacketScheduler, PacketScheduler};
use super::policy::{AllocationPolicy, SpaceSharedPolicy, TimeSharedPolicy};
use super::processor::Processor;

#[cfg(feature = "tracing")]
use tracing::trace;

/// Drift below this magnitude is treated as zero elapsed time
/// (`spec.md` §4.3: "corrected for double-precision drift").
const EPSILON: f64 = 1e-6;

/// Sentinel meaning "no cloudlet left in EXEC, no next event to predict"
/// (`spec.md` §4.3 step 6, §6 "Sentinel values").
pub const NO_NEXT_EVENT: f64 = f64::MAX;

/// Public operations every concrete scheduling discipline exposes
/// (`spec.md` §6, "Public cloudlet-scheduler operations").
pub trait CloudletScheduler {
    fn submit(&mut self, cloudlet: Arc<Cloudlet>, file_transfer_time: f64) -> f64;
    fn update_vm_processing(&mut self, current_time: f64, mips_share: &[f64]) -> f64;
    fn cloudlet_cancel(&mut self, id: CloudletId) -> Option<Arc<Cloudlet>>;
    fn cloudlet_pause(&mut self, id: CloudletId) -> bool;
    fn cloudlet_resume(&mut self, id: CloudletId) -> bool;
    fn cloudlet_finish(&mut self, id: CloudletId) -> Result<(), SchedulerError>;
    fn get_cloudlet_to_migrate(&mut self) -> Option<Arc<Cloudlet>>;

    fn exec_list(&self) -> &[CloudletExecutionInfo];
    fn waiting_list(&self) -> &[CloudletExecutionInfo];
    fn paused_list(&self) -> &[CloudletExecutionInfo];
    fn finished_list(&self) -> &[CloudletExecutionInfo];

    fn set_packet_scheduler(&mut self, packet_scheduler: Box<dyn PacketScheduler>);

    fn current_requested_ram_percent_utilization(&self, time: f64) -> f64;
    fn current_requested_bw_percent_utilization(&self, time: f64) -> f64;
    fn requested_cpu_percent_utilization(&self, time: f64) -> f64;
}

/// Shared bookkeeping behind every concrete discipline: the four lists, the
/// clock the scheduler last saw, the current MIPS share, and an optional
/// packet scheduler. Generic over the one thing that actually differs
/// between disciplines — [`AllocationPolicy`].
pub struct CloudletSchedulerCore<P: AllocationPolicy> {
    policy: P,
    vm_pes: u32,
    exec: Vec<CloudletExecutionInfo>,
    waiting: Vec<CloudletExecutionInfo>,
    paused: Vec<CloudletExecutionInfo>,
    finished: Vec<CloudletExecutionInfo>,
    previous_time: f64,
    current_mips_share: Vec<f64>,
    packet_scheduler: Box<dyn PacketScheduler>,
}

impl<P: AllocationPolicy> CloudletSchedulerCore<P> {
    pub fn new(policy: P, vm_pes: u32) -> Self {
        Self {
            policy,
            vm_pes,
            exec: Vec::new(),
            waiting: Vec::new(),
            paused: Vec::new(),
            finished: Vec::new(),
            previous_time: 0.0,
            current_mips_share: Vec::new(),
            packet_scheduler: Box::new(NullPacketScheduler),
        }
    }

    fn used_pes(&self) -> u32 {
        self.exec.iter().map(|c| c.used_pes).sum()
    }

    fn free_pes(&self) -> u32 {
        self.vm_pes.saturating_sub(self.used_pes())
    }

    /// Sanity-checks the per-tick processor snapshot against this VM's PE
    /// count (`spec.md` §4.3 step 1: "compute a Processor snapshot (PE
    /// count, per-PE capacity)"). A caller handing in a `mips_share` sized
    /// to a different VM is a caller bug, not a recoverable scheduler state.
    fn assert_processor_matches_vm(&self, processor: &Processor) {
        debug_assert_eq!(
            processor.pe_count(),
            self.vm_pes as usize,
            "mips_share length must equal the VM's PE count"
        );
    }

    /// Moves one step's worth of progress onto every EXEC cloudlet. Returns
    /// the instructions executed this step, keyed by cloudlet id, for
    /// callers (e.g. a network-aware wrapper) that need to react to it.
    fn update_cloudlet_processing(
        &mut self,
        current_time: f64,
        processor: &Processor,
    ) -> Vec<(CloudletId, u64)> {
        let total_used_pes = self.used_pes();
        let mut executed_per_cloudlet = Vec::with_capacity(self.exec.len());

        for rcl in &mut self.exec {
            let lower_bound = self.previous_time.max(rcl.arrival_time);
            let mut dt = (current_time - lower_bound).max(0.0);
            if dt.abs() < EPSILON {
                dt = 0.0;
            }

            let mut executed = 0u64;
            if rcl.file_transfer_time > 0.0 {
                rcl.file_transfer_time = (rcl.file_transfer_time - dt).max(0.0);
            } else {
                let allocated = self
                    .policy
                    .allocated_mips_for_cloudlet(rcl, processor, total_used_pes);
                rcl.allocated_mips = allocated;
                // MIPS (millions of instructions/sec) * seconds = MI, the unit
                // `Cloudlet::length` is expressed in — no extra scaling needed.
                executed = (allocated * dt).floor().max(0.0) as u64;
                let remaining = rcl.remaining_instructions();
                executed = executed.min(remaining);
                rcl.instructions_finished_so_far += executed;
            }
            rcl.last_processing_time = current_time;
            executed_per_cloudlet.push((rcl.id(), executed));
        }

        executed_per_cloudlet
    }

    fn move_finished_to_finished_list(&mut self, current_time: f64) {
        let mut i = 0;
        while i < self.exec.len() {
            if self.exec[i].is_finished() {
                let mut rcl = self.exec.remove(i);
                rcl.status = CloudletStatus::Success;
                rcl.finish_time = Some(current_time);
                #[cfg(feature = "tracing")]
                trace!(cloudlet = rcl.id(), time = current_time, "cloudlet finished");
                self.finished.push(rcl);
            } else {
                i += 1;
            }
        }
    }

    /// FIFO admission of WAITING cloudlets while free PEs remain
    /// (`spec.md` §4.3 step 4).
    fn move_next_cloudlets_from_waiting_to_exec_list(&mut self, current_time: f64) {
        loop {
            let free = self.free_pes();
            if free == 0 || self.waiting.is_empty() {
                break;
            }
            let pos = self
                .waiting
                .iter()
                .position(|c| c.cloudlet.pes_required <= free);
            match pos {
                Some(i) => {
                    let mut rcl = self.waiting.remove(i);
                    rcl.status = CloudletStatus::Inexec;
                    rcl.used_pes = rcl.cloudlet.pes_required;
                    rcl.arrival_time = current_time;
                    #[cfg(feature = "tracing")]
                    trace!(cloudlet = rcl.id(), time = current_time, "cloudlet admitted");
                    self.exec.push(rcl);
                }
                None => break,
            }
        }
    }

    /// Recomputes allocation fresh from the current MIPS share rather than
    /// trusting each `CloudletExecutionInfo::allocated_mips`, which is only
    /// refreshed for cloudlets that were already in EXEC at the start of the
    /// tick — a cloudlet FIFO-admitted this same tick hasn't had it set yet.
    fn estimate_next_completion(&self) -> f64 {
        if self.exec.is_empty() || self.current_mips_share.is_empty() {
            return NO_NEXT_EVENT;
        }
        let processor = Processor::from_mips_share(&self.current_mips_share);
        let total_used_pes = self.used_pes();
        self.exec
            .iter()
            .map(|rcl| {
                let allocated =
                    self.policy
                        .allocated_mips_for_cloudlet(rcl, &processor, total_used_pes);
                if allocated <= 0.0 {
                    NO_NEXT_EVENT
                } else {
                    self.previous_time + rcl.remaining_instructions() as f64 / allocated
                }
            })
            .fold(NO_NEXT_EVENT, f64::min)
    }

    fn predicted_finish_time(&self, rcl: &CloudletExecutionInfo, total_used_pes: u32) -> f64 {
        if self.current_mips_share.is_empty() {
            return 0.0;
        }
        let processor = Processor::from_mips_share(&self.current_mips_share);
        let allocated = self
            .policy
            .allocated_mips_for_cloudlet(rcl, &processor, total_used_pes);
        if allocated <= 0.0 {
            0.0
        } else {
            rcl.arrival_time + rcl.remaining_instructions() as f64 / allocated
        }
    }
}

impl<P: AllocationPolicy> CloudletScheduler for CloudletSchedulerCore<P> {
    fn submit(&mut self, cloudlet: Arc<Cloudlet>, file_transfer_time: f64) -> f64 {
        let mut rcl = CloudletExecutionInfo::new(cloudlet.clone(), file_transfer_time);
        let free = self.free_pes();
        if cloudlet.pes_required <= free {
            rcl.status = CloudletStatus::Inexec;
            rcl.used_pes = cloudlet.pes_required;
            // Predict against the PE count this cloudlet will itself occupy.
            let total_used_pes = self.used_pes() + rcl.used_pes;
            let finish = self.predicted_finish_time(&rcl, total_used_pes);
            #[cfg(feature = "tracing")]
            trace!(cloudlet = cloudlet.id, "cloudlet admitted to exec");
            self.exec.push(rcl);
            finish
        } else {
            rcl.status = CloudletStatus::Queued;
            #[cfg(feature = "tracing")]
            trace!(cloudlet = cloudlet.id, "cloudlet queued");
            self.waiting.push(rcl);
            0.0
        }
    }

    fn update_vm_processing(&mut self, current_time: f64, mips_share: &[f64]) -> f64 {
        self.current_mips_share = mips_share.to_vec();
        let processor = Processor::from_mips_share(mips_share);
        self.assert_processor_matches_vm(&processor);

        self.update_cloudlet_processing(current_time, &processor);
        self.move_finished_to_finished_list(current_time);
        self.move_next_cloudlets_from_waiting_to_exec_list(current_time);
        self.previous_time = current_time;

        self.estimate_next_completion()
    }

    fn cloudlet_cancel(&mut self, id: CloudletId) -> Option<Arc<Cloudlet>> {
        for list in [
            &mut self.exec,
            &mut self.waiting,
            &mut self.paused,
            &mut self.finished,
        ] {
            if let Some(pos) = list.iter().position(|c| c.id() == id) {
                let mut rcl = list.remove(pos);
                rcl.status = CloudletStatus::Canceled;
                return Some(rcl.cloudlet);
            }
        }
        None
    }

    fn cloudlet_pause(&mut self, id: CloudletId) -> bool {
        for list in [&mut self.exec, &mut self.waiting] {
            if let Some(pos) = list.iter().position(|c| c.id() == id) {
                let mut rcl = list.remove(pos);
                rcl.status = CloudletStatus::Paused;
                self.paused.push(rcl);
                return true;
            }
        }
        false
    }

    fn cloudlet_resume(&mut self, id: CloudletId) -> bool {
        let pos = match self.paused.iter().position(|c| c.id() == id) {
            Some(p) => p,
            None => return false,
        };
        let mut rcl = self.paused.remove(pos);
        rcl.status = CloudletStatus::Resumed;
        if rcl.cloudlet.pes_required <= self.free_pes() {
            rcl.status = CloudletStatus::Inexec;
            rcl.used_pes = rcl.cloudlet.pes_required;
            self.exec.push(rcl);
        } else {
            rcl.status = CloudletStatus::Queued;
            self.waiting.push(rcl);
        }
        true
    }

    fn cloudlet_finish(&mut self, id: CloudletId) -> Result<(), SchedulerError> {
        let pos = self
            .exec
            .iter()
            .position(|c| c.id() == id)
            .ok_or(SchedulerError::UnknownCloudlet)?;
        let mut rcl = self.exec.remove(pos);
        rcl.cloudlet.length.set(rcl.instructions_finished_so_far);
        rcl.status = CloudletStatus::Success;
        rcl.finish_time = Some(rcl.last_processing_time);
        self.finished.push(rcl);
        Ok(())
    }

    fn get_cloudlet_to_migrate(&mut self) -> Option<Arc<Cloudlet>> {
        if self.exec.is_empty() {
            None
        } else {
            Some(self.exec.remove(0).cloudlet)
        }
    }

    fn exec_list(&self) -> &[CloudletExecutionInfo] {
        &self.exec
    }

    fn waiting_list(&self) -> &[CloudletExecutionInfo] {
        &self.waiting
    }

    fn paused_list(&self) -> &[CloudletExecutionInfo] {
        &self.paused
    }

    fn finished_list(&self) -> &[CloudletExecutionInfo] {
        &self.finished
    }

    fn set_packet_scheduler(&mut self, packet_scheduler: Box<dyn PacketScheduler>) {
        self.packet_scheduler = packet_scheduler;
    }

    fn current_requested_ram_percent_utilization(&self, time: f64) -> f64 {
        self.exec
            .iter()
            .map(|c| c.cloudlet.cpu_utilization.utilization(time))
            .sum::<f64>()
            .min(1.0)
    }

    fn current_requested_bw_percent_utilization(&self, time: f64) -> f64 {
        self.exec
            .iter()
            .map(|c| c.cloudlet.cpu_utilization.utilization(time))
            .sum::<f64>()
            .min(1.0)
    }

    fn requested_cpu_percent_utilization(&self, time: f64) -> f64 {
        let total_vm_mips: f64 = self.current_mips_share.iter().sum();
        if total_vm_mips <= 0.0 {
            return 0.0;
        }
        let requested: f64 = self
            .exec
            .iter()
            .map(|c| c.cloudlet.cpu_utilization.utilization(time) * c.allocated_mips)
            .sum();
        requested / total_vm_mips
    }
}

/// Cloudlets receive proportional time-slices of the VM's MIPS.
pub type CloudletSchedulerTimeShared = CloudletSchedulerCore<TimeSharedPolicy>;

impl CloudletSchedulerTimeShared {
    pub fn time_shared(vm_pes: u32) -> Self {
        Self::new(TimeSharedPolicy, vm_pes)
    }
}

/// Cloudlets receive exclusive PEs until completion.
pub type CloudletSchedulerSpaceShared = CloudletSchedulerCore<SpaceSharedPolicy>;

impl CloudletSchedulerSpaceShared {
    pub fn space_shared(vm_pes: u32) -> Self {
        Self::new(SpaceSharedPolicy, vm_pes)
    }
}

/// A time-shared scheduler that additionally routes each step's executed
/// instructions through a [`PacketScheduler`] — the "network-aware"
/// discipline named alongside space-shared/time-shared in `spec.md` §2's
/// component table. Composes the time-shared base rather than
/// reimplementing the admission/progress algorithm (mirrors how the
/// original system layers network awareness over an existing discipline
/// instead of duplicating it).
pub struct CloudletSchedulerNetworkShared {
    inner: CloudletSchedulerTimeShared,
}

impl CloudletSchedulerNetworkShared {
    pub fn new(vm_pes: u32) -> Self {
        Self {
            inner: CloudletSchedulerTimeShared::time_shared(vm_pes),
        }
    }
}

impl CloudletScheduler for CloudletSchedulerNetworkShared {
    fn submit(&mut self, cloudlet: Arc<Cloudlet>, file_transfer_time: f64) -> f64 {
        self.inner.submit(cloudlet, file_transfer_time)
    }

    fn update_vm_processing(&mut self, current_time: f64, mips_share: &[f64]) -> f64 {
        self.inner.current_mips_share = mips_share.to_vec();
        let processor = Processor::from_mips_share(mips_share);
        self.inner.assert_processor_matches_vm(&processor);

        let executed = self.inner.update_cloudlet_processing(current_time, &processor);
        for (cloudlet_id, executed_mi) in executed {
            if executed_mi > 0 {
                self.inner
                    .packet_scheduler
                    .process_cloudlet_tasks(cloudlet_id, executed_mi);
            }
        }
        self.inner.move_finished_to_finished_list(current_time);
        self.inner
            .move_next_cloudlets_from_waiting_to_exec_list(current_time);
        self.inner.previous_time = current_time;

        self.inner.estimate_next_completion()
    }

    fn cloudlet_cancel(&mut self, id: CloudletId) -> Option<Arc<Cloudlet>> {
        self.inner.cloudlet_cancel(id)
    }

    fn cloudlet_pause(&mut self, id: CloudletId) -> bool {
        self.inner.cloudlet_pause(id)
    }

    fn cloudlet_resume(&mut self, id: CloudletId) -> bool {
        self.inner.cloudlet_resume(id)
    }

    fn cloudlet_finish(&mut self, id: CloudletId) -> Result<(), SchedulerError> {
        self.inner.cloudlet_finish(id)
    }

    fn get_cloudlet_to_migrate(&mut self) -> Option<Arc<Cloudlet>> {
        self.inner.get_cloudlet_to_migrate()
    }

    fn exec_list(&self) -> &[CloudletExecutionInfo] {
        self.inner.exec_list()
    }

    fn waiting_list(&self) -> &[CloudletExecutionInfo] {
        self.inner.waiting_list()
    }

    fn paused_list(&self) -> &[CloudletExecutionInfo] {
        self.inner.paused_list()
    }

    fn finished_list(&self) -> &[CloudletExecutionInfo] {
        self.inner.finished_list()
    }

    fn set_packet_scheduler(&mut self, packet_scheduler: Box<dyn PacketScheduler>) {
        self.inner.set_packet_scheduler(packet_scheduler);
    }

    fn current_requested_ram_percent_utilization(&self, time: f64) -> f64 {
        self.inner.current_requested_ram_percent_utilization(time)
    }

    fn current_requested_bw_percent_utilization(&self, time: f64) -> f64 {
        self.inner.current_requested_bw_percent_utilization(time)
    }

    fn requested_cpu_percent_utilization(&self, time: f64) -> f64 {
        self.inner.requested_cpu_percent_utilization(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudlet::utilization::UtilizationModelFull;

    fn cloudlet(id: CloudletId, length: u64, pes: u32) -> Arc<Cloudlet> {
        Arc::new(Cloudlet::new(
            id,
            length,
            pes,
            0.0,
            Box::new(UtilizationModelFull),
            Box::new(UtilizationModelFull),
            Box::new(UtilizationModelFull),
        ))
    }

    #[test]
    fn admission_scenario_from_spec() {
        // spec.md §8 scenario 4.
        let mut sched = CloudletSchedulerTimeShared::time_shared(2);
        sched.submit(cloudlet(1, 1000, 2), 0.0);
        sched.submit(cloudlet(2, 500, 1), 0.0);

        assert_eq!(sched.exec_list().len(), 1);
        assert_eq!(sched.waiting_list().len(), 1);
        assert_eq!(sched.exec_list()[0].id(), 1);

        let next = sched.update_vm_processing(1.0, &[1000.0, 1000.0]);

        assert_eq!(sched.finished_list().len(), 1);
        assert_eq!(sched.finished_list()[0].id(), 1);
        assert_eq!(sched.exec_list().len(), 1);
        assert_eq!(sched.exec_list()[0].id(), 2);
        assert!((next - 1.5).abs() < 1e-9, "expected 1.5, got {next}");
    }

    #[test]
    fn no_next_event_sentinel_when_exec_empty() {
        let mut sched = CloudletSchedulerTimeShared::time_shared(2);
        let next = sched.update_vm_processing(0.0, &[1000.0, 1000.0]);
        assert_eq!(next, NO_NEXT_EVENT);
    }

    #[test]
    fn cancel_removes_from_every_list_and_returns_same_identity() {
        let mut sched = CloudletSchedulerTimeShared::time_shared(1);
        sched.submit(cloudlet(1, 1000, 1), 0.0);
        let canceled = sched.cloudlet_cancel(1);
        assert!(canceled.is_some());
        assert_eq!(canceled.unwrap().id, 1);
        assert!(sched.exec_list().is_empty());
        assert!(sched.waiting_list().is_empty());
        assert!(sched.paused_list().is_empty());
        assert!(sched.finished_list().is_empty());
    }

    #[test]
    fn pause_then_resume_round_trips_through_paused_list() {
        let mut sched = CloudletSchedulerTimeShared::time_shared(1);
        sched.submit(cloudlet(1, 1000, 1), 0.0);
        assert!(sched.cloudlet_pause(1));
        assert_eq!(sched.paused_list().len(), 1);
        assert!(sched.cloudlet_resume(1));
        assert_eq!(sched.exec_list().len(), 1);
        assert!(sched.paused_list().is_empty());
    }

    #[test]
    fn space_shared_allocates_fixed_pes_per_admission() {
        let mut sched = CloudletSchedulerSpaceShared::space_shared(2);
        sched.submit(cloudlet(1, 2000, 2), 0.0);
        let next = sched.update_vm_processing(1.0, &[1000.0, 1000.0]);
        assert_eq!(sched.finished_list().len(), 1);
        assert_eq!(next, NO_NEXT_EVENT);
    }

    #[test]
    fn force_finish_truncates_length_to_instructions_already_executed() {
        let mut sched = CloudletSchedulerTimeShared::time_shared(1);
        sched.submit(cloudlet(1, 1000, 1), 0.0);
        // Run far enough that partial progress is made but not completion.
        sched.update_vm_processing(0.3, &[1000.0]);
        let progress = sched.exec_list()[0].instructions_finished_so_far;
        assert!(progress > 0 && progress < 1000);

        sched.cloudlet_finish(1).unwrap();

        assert!(sched.exec_list().is_empty());
        assert_eq!(sched.finished_list().len(), 1);
        let finished = &sched.finished_list()[0];
        assert_eq!(finished.status, CloudletStatus::Success);
        assert_eq!(finished.instructions_finished_so_far, progress);
        // length must shrink to match, not the other way around, so the
        // "executed == length iff SUCCESS" invariant still holds.
        assert_eq!(finished.cloudlet.length.get(), progress);
    }

    #[test]
    fn cloudlet_finish_on_unknown_id_returns_not_found_error() {
        let mut sched = CloudletSchedulerTimeShared::time_shared(1);
        let err = sched.cloudlet_finish(999).unwrap_err();
        assert_eq!(err, SchedulerError::UnknownCloudlet);
    }

    #[test]
    fn ram_and_bw_utilization_are_driven_by_the_cpu_model() {
        use crate::cloudlet::utilization::UtilizationModelFixed;

        let mut sched = CloudletSchedulerTimeShared::time_shared(2);
        let rcl = Arc::new(Cloudlet::new(
            1,
            1000,
            1,
            0.0,
            Box::new(UtilizationModelFixed(0.4)),
            Box::new(UtilizationModelFixed(0.9)),
            Box::new(UtilizationModelFixed(0.9)),
        ));
        sched.submit(rcl, 0.0);

        // spec.md §4.3: both getters sum the CPU utilization model, not
        // each resource's own model.
        assert!((sched.current_requested_ram_percent_utilization(0.0) - 0.4).abs() < 1e-9);
        assert!((sched.current_requested_bw_percent_utilization(0.0) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn idempotent_update_with_same_time_and_no_new_events() {
        let mut sched = CloudletSchedulerTimeShared::time_shared(2);
        sched.submit(cloudlet(1, 10_000_000, 1), 0.0);
        sched.update_vm_processing(1.0, &[1000.0, 1000.0]);
        let finished_before = sched.finished_list().len();
        let progress_before = sched.exec_list()[0].instructions_finished_so_far;
        sched.update_vm_processing(1.0, &[1000.0, 1000.0]);
        assert_eq!(sched.finished_list().len(), finished_before);
        assert_eq!(sched.exec_list()[0].instructions_finished_so_far, progress_before);
    }
}
