use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

mod app;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = match app::Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(app::ParseError::Help) => {
            print!("{}", app::USAGE);
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("error: {err}\n\n{}", app::USAGE);
            return ExitCode::from(2);
        }
    };

    match app::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
