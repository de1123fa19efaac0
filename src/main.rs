// src/main.rs

use std::process::ExitCode;
use std::time::Duration;

use jobrunner::{cli, logging, run};

/// Exit status for configuration, discovery and validation failures.
const SETUP_FAILURE: u8 = 2;

/// How long to wait for task bodies still running after the job returns.
/// Bodies that cannot be cancelled are abandoned after this.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

fn main() -> ExitCode {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("jobrunner error: {err:?}");
        return ExitCode::from(SETUP_FAILURE);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("jobrunner error: failed to start runtime: {err}");
            return ExitCode::from(SETUP_FAILURE);
        }
    };

    let code = runtime.block_on(async {
        match run(args).await {
            Ok(Some(report)) => {
                print!("{}", report.render_status());
                ExitCode::SUCCESS
            }
            Ok(None) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("jobrunner error: {err}");
                ExitCode::from(SETUP_FAILURE)
            }
        }
    });

    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    code
}
