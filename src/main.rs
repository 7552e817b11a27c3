use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Dropping `run()` on a signal tears the attempt down: the countdown
    // stops and nothing is submitted.
    let result = tokio::select! {
        result = lms_quiz::cli::run() => result,
        _ = shutdown_signal() => {
            eprintln!("\nInterrupted, leaving without submitting.");
            return ExitCode::from(130);
        }
    };

    match result {
        Ok(_) => ExitCode::from(lms_quiz::errors::EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(lms_quiz::errors::get_exit_code(&e))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(_) => {
                ctrl_c.await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
}
