//! Memory Probes
//!
//! The checkpoint timeline evicts old snapshots while the host reports low
//! memory. The probe is a trait so tests and embedders can decide what "low"
//! means.

use std::sync::Mutex;
use sysinfo::System;

/// Default threshold below which available memory counts as low (256 MiB)
pub const DEFAULT_LOW_MEMORY_BYTES: u64 = 256 * 1024 * 1024;

/// Reports whether the process is short on memory
pub trait MemoryProbe: Send + Sync {
    fn is_low(&self) -> bool;
}

/// Never reports low memory
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverLow;

impl MemoryProbe for NeverLow {
    fn is_low(&self) -> bool {
        false
    }
}

/// Reads available system memory through `sysinfo`
pub struct SystemMemoryProbe {
    system: Mutex<System>,
    threshold_bytes: u64,
}

impl SystemMemoryProbe {
    pub fn new(threshold_bytes: u64) -> Self {
        Self {
            system: Mutex::new(System::new()),
            threshold_bytes,
        }
    }

    pub fn threshold_bytes(&self) -> u64 {
        self.threshold_bytes
    }

    /// Currently available memory in bytes
    pub fn available_bytes(&self) -> u64 {
        let mut system = self
            .system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        system.refresh_memory();
        system.available_memory()
    }
}

impl Default for SystemMemoryProbe {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_MEMORY_BYTES)
    }
}

impl MemoryProbe for SystemMemoryProbe {
    fn is_low(&self) -> bool {
        let available = self.available_bytes();
        // sysinfo reports 0 on platforms it cannot read; treat that as unknown
        available != 0 && available < self.threshold_bytes
    }
}

impl std::fmt::Debug for SystemMemoryProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemMemoryProbe")
            .field("threshold_bytes", &self.threshold_bytes)
            .finish()
    }
}
