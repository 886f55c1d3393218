//! Date search worker process.
//!
//! Launched by a host with requests on fd 3 and responses on fd 4 (see
//! `datesift::config` for overrides). Runs until the first fatal error and
//! always exits non-zero; the host restarts it.

use std::process::ExitCode;

use anyhow::anyhow;
use datesift::bridge::transport::adopt_inherited_fds;
use datesift::logging::init_tracing;
use datesift::stderr_filter::StderrFilter;
use datesift::{WorkerConfig, run_worker};
use datesift_search::DateSearcher;
use tracing::{debug, info};

fn main() -> ExitCode {
    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let filter = match StderrFilter::install(&config.suppressed_lines) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("error: failed to install stderr filter: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log);
    info!("datesift-worker {}", env!("CARGO_PKG_VERSION"));

    let err = match run(&config) {
        Ok(never) => match never {},
        Err(e) => e,
    };

    // drain the filter so nothing queued behind the error line is lost
    if let Some(filter) = filter {
        match filter.restore() {
            Ok(dropped) => debug!(dropped, "Diagnostic filter restored"),
            Err(e) => eprintln!("warning: failed to restore stderr: {e}"),
        }
    }
    eprintln!("error: {err}");
    ExitCode::FAILURE
}

fn run(config: &WorkerConfig) -> anyhow::Result<std::convert::Infallible> {
    let channels = adopt_inherited_fds(config.input_fd, config.output_fd)
        .map_err(|e| anyhow!("failed to adopt inherited descriptors: {e}"))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to start runtime: {e}"))?;

    let mut searcher = DateSearcher::default();
    let never = runtime.block_on(run_worker(
        channels.input,
        channels.output,
        &mut searcher,
        config.loop_options(),
    ))?;
    Ok(never)
}
