use std::process::ExitCode;

use dotenvy::dotenv;
use tracing::{error, info};

fn main() -> ExitCode {
    // .env 先于日志初始化，RUST_LOG / LOG_FORMAT 才能生效
    dotenv().ok();
    common::utils::logging::init_logging_from_env();

    let cfg = match server::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = "emoji", event = "config_invalid", error = %e, "refusing to start");
            return ExitCode::FAILURE;
        }
    };

    std::panic::set_hook(Box::new(|info| {
        error!(service = "emoji", event = "panic", message = %info, "unhandled panic occurred");
    }));

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = cfg.server.worker_threads {
        builder.worker_threads(w);
    }
    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "emoji", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = "emoji",
        event = "start",
        pid = std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
        threads = cfg.server.worker_threads.unwrap_or_default(),
        database = cfg.database.backend().map(|b| b.as_str()).unwrap_or("unknown"),
        "emoji service starting"
    );

    match rt.block_on(server::run(cfg)) {
        Ok(()) => {
            info!(service = "emoji", event = "stop", "service stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = "emoji", event = "run_failed", error = %format!("{e:#}"), "service exited with error");
            ExitCode::FAILURE
        }
    }
}
