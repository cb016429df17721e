//! Constants shared between the launcher and plan tooling.

/// Scratch filesystem mounted before any boot step runs.
pub mod mount {
    /// Mount source for the scratch filesystem
    pub const SOURCE: &str = "tmpfs";

    /// Mount point for the scratch filesystem
    pub const TARGET: &str = "/run";

    /// Filesystem type for the scratch filesystem
    pub const FSTYPE: &str = "tmpfs";

    /// Default mount options
    pub const OPTIONS: &[&str] = &["rw", "nosuid", "nodev", "mode=755"];

    /// Mode used when creating the mount point
    pub const TARGET_MODE: u32 = 0o755;
}

/// Background step IO capture.
pub mod capture {
    /// Base directory holding one subdirectory per background step
    pub const DEFAULT_DIR: &str = "/tmp/io";

    /// Owner-only permission mask for capture directories and files
    pub const MODE: u32 = 0o700;
}

/// Kernel command line.
pub mod cmdline {
    /// Where the kernel exposes its command line
    pub const PATH: &str = "/proc/cmdline";

    /// Key selecting a boot plan file
    pub const PLAN_KEY: &str = "uinit.plan";

    /// Key selecting a tracing filter
    pub const LOG_KEY: &str = "uinit.log";
}

/// Child process defaults.
pub mod process {
    /// Working directory for every spawned step
    pub const WORKDIR: &str = "/";
}
