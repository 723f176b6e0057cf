use std::{env, io, process::ExitCode};

use log::{error, info};
use spjql::{
    cli::CliApp,
    sql::{
        session::context::{Config, QueryContext},
        Session,
    },
    util::SimpleLogger,
};

static LOGGER: SimpleLogger = SimpleLogger;

pub fn main() -> ExitCode {
    let config = Config::from_env(env::args());

    if let Err(e) = log::set_logger(&LOGGER).map(|()| log::set_max_level(config.log_level)) {
        eprintln!("cannot install logger: {}", e);
    }

    // Initialize database
    let query_ctx = match QueryContext::open(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let session = Session::new(query_ctx);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut app = CliApp::new(session, stdin.lock(), stdout.lock());
    let outcome = app.run();

    let closed = app.into_session().into_context().close();
    if let Err(e) = &closed {
        error!("Failed to close storage: {}", e);
    }

    match (outcome, closed) {
        (Ok(()), Ok(())) => {
            info!("Bye");
            ExitCode::SUCCESS
        }
        _ => ExitCode::FAILURE,
    }
}
