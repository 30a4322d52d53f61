//! Conservative-default `OsProbe` for every non-Linux target. Real
//! WMI/PDH (Windows) and libproc (macOS/BSD) bindings are out of scope;
//! this exists so the crate builds and the sampler lifecycle (including
//! the "first `sample()` returns zeros, not an error" rule for Windows
//! CPU accounting) is still exercisable off-Linux.

use anyhow::Result;

use super::{
    DiskStats, LoadAverage, OsProbe, ProcessIoCounters, ProcessMemory, ProcessStatus,
    ProcessTimes, SwapMemory, SystemTimes, VirtualMemory,
};

#[derive(Default)]
pub struct StubProbe;

impl StubProbe {
    pub fn new() -> Self {
        Self
    }
}

impl OsProbe for StubProbe {
    fn list_pids(&self) -> Result<Vec<u32>> {
        Ok(Vec::new())
    }

    fn process_times(&self, _pid: u32) -> Result<ProcessTimes> {
        Ok(ProcessTimes::default())
    }

    fn process_memory(&self, _pid: u32) -> Result<ProcessMemory> {
        Ok(ProcessMemory::default())
    }

    fn process_status(&self, _pid: u32) -> Result<ProcessStatus> {
        Ok(ProcessStatus::Unknown)
    }

    fn process_user(&self, _pid: u32) -> Result<String> {
        Ok(String::new())
    }

    fn process_cmdline(&self, _pid: u32) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn process_io_counters(&self, _pid: u32) -> Result<ProcessIoCounters> {
        Ok(ProcessIoCounters::default())
    }

    fn process_fd_count(&self, _pid: u32) -> Result<u32> {
        Ok(0)
    }

    fn process_threads(&self, _pid: u32) -> Result<u32> {
        Ok(0)
    }

    fn process_parent(&self, _pid: u32) -> Result<u32> {
        Ok(0)
    }

    fn process_creation_time(&self, _pid: u32) -> Result<i64> {
        Ok(0)
    }

    fn process_command_name(&self, _pid: u32) -> Result<String> {
        Ok(String::new())
    }

    fn system_times(&self) -> Result<SystemTimes> {
        Ok(SystemTimes::default())
    }

    fn virtual_memory(&self) -> Result<VirtualMemory> {
        Ok(VirtualMemory::default())
    }

    fn swap_memory(&self) -> Result<SwapMemory> {
        Ok(SwapMemory::default())
    }

    fn load_average(&self) -> Result<LoadAverage> {
        Ok(LoadAverage::default())
    }

    fn disk_stats(&self) -> Result<Vec<DiskStats>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_probe_never_errors() {
        let probe = StubProbe::new();
        assert!(probe.list_pids().unwrap().is_empty());
        assert_eq!(probe.process_times(1).unwrap(), ProcessTimes::default());
        assert_eq!(probe.system_times().unwrap(), SystemTimes::default());
    }
}
