//! Cloudlet scheduling: the per-VM admission and MIPS-sharing algorithm
//! described in `spec.md` §4.3, plus the minimal VM/host/extension-point
//! scaffolding it needs to be exercised (`spec.md` §6).

pub mod allocation;
pub mod cloudlet;
pub mod execution;
pub mod host;
pub mod packet;
pub mod policy;
pub mod processor;
pub mod scheduler;
pub mod utilization;
pub mod vm;

pub use allocation::{HostId, NullVmAllocationPolicy, VmAllocationPolicy, VmId};
pub use cloudlet::{Cloudlet, CloudletId};
pub use execution::{CloudletExecutionInfo, CloudletStatus};
pub use host::Host;
pub use packet::{NullPacketScheduler, PacketScheduler};
pub use policy::{AllocationPolicy, SpaceSharedPolicy, TimeSharedPolicy};
pub use processor::Processor;
pub use scheduler::{
    CloudletScheduler, CloudletSchedulerCore, CloudletSchedulerNetworkShared,
    CloudletSchedulerSpaceShared, CloudletSchedulerTimeShared, NO_NEXT_EVENT,
};
pub use utilization::{UtilizationModel, UtilizationModelFixed, UtilizationModelFull};
pub use vm::Vm;
