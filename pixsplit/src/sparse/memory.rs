use sysinfo::System;

/// Available memory in bytes: the override if set, otherwise queried from the OS.
pub(crate) fn available_memory(override_bytes: Option<u64>) -> u64 {
    override_bytes.unwrap_or_else(|| {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.available_memory()
    })
}
