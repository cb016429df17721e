//! Entry point for uinit.

use std::path::PathBuf;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::Parser;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;
use uinit::capture::IoCaptureManager;
use uinit::cmdline::KernelCmdline;
use uinit::{
    Environment, InitConfig, ProcessLauncher, Sequencer, SequencerOptions, SharedSink,
    TracingSink,
};
use uinit_shared::layout::IoCaptureLayout;
use uinit_shared::plan::BootPlan;

/// uinit - runs the netboot plan as PID 1 and hands over to the real init
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "uinit - netboot PID 1 launcher")]
struct InitArgs {
    /// Boot plan file (JSON)
    ///
    /// Takes precedence over `uinit.plan=` on the kernel command line.
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Base directory for background step IO capture
    #[arg(long)]
    io_dir: Option<PathBuf>,

    /// Do not mount the scratch filesystems
    #[arg(long)]
    skip_mounts: bool,

    /// Boot parameters the kernel passed through to init
    #[arg(value_name = "PARAM")]
    params: Vec<String>,
}

/// `RUST_LOG`, then `uinit.log=` from the kernel command line, then `info`.
fn log_filter(cmdline: &KernelCmdline) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    cmdline
        .log_filter()
        .and_then(|filter| EnvFilter::try_new(filter).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set panic hook to ensure panics reach the console
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("[PANIC] uinit panicked: {}", panic_info);
        std::process::exit(1);
    }));

    let (cmdline, cmdline_err) = match KernelCmdline::read() {
        Ok(cmdline) => (cmdline, None),
        Err(e) => (KernelCmdline::default(), Some(e)),
    };

    if let Err(e) = tracing_subscriber::fmt()
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(&cmdline))
        .try_init()
    {
        eprintln!("[ERROR] Failed to initialize tracing: {}", e);
        // Continue anyway - logging failure must not stop the boot
    }

    if let Some(e) = cmdline_err {
        warn!(error = %e, "kernel command line unavailable");
    }

    // The kernel hands unknown boot parameters to init; never fail on them
    let args = match InitArgs::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            warn!(error = %e, "ignoring unrecognised arguments");
            InitArgs::default()
        }
    };

    if !args.params.is_empty() {
        debug!(params = ?args.params, "ignoring kernel parameters passed to init");
    }

    let (mut config, config_err) = InitConfig::resolve(args.plan.as_deref(), &cmdline);
    if let Some(e) = config_err {
        error!(error = %e, "boot plan rejected, using built-in plan");
    }
    if let Some(io_dir) = args.io_dir {
        config.io_dir = io_dir;
    }
    if args.skip_mounts {
        config.mounts.clear();
    }

    let plan = config.plan().unwrap_or_else(|e| {
        error!(error = %e, "built-in plan rejected");
        BootPlan::default()
    });
    debug!(steps = plan.len(), io_dir = %config.io_dir.display(), "boot plan loaded");

    let sink: SharedSink = Arc::new(TracingSink);
    let capture = IoCaptureManager::new(IoCaptureLayout::new(&config.io_dir));
    let launcher = ProcessLauncher::new(&config.workdir, capture, sink.clone());
    let options = SequencerOptions {
        mounts: config.mounts,
        reap_background_before_exec: config.reap_background_before_exec,
    };

    Sequencer::new(plan, launcher, Environment::capture(), sink, options)
        .run()
        .await;
}
