//! Binary entry point: load configuration, start logging, open the store and
//! hand control to the terminal UI until the user quits.
use anyhow::Context;
use log::{error, info};
use smart_student_records::logging::init_logging;
use smart_student_records::{run_app, App, AppConfig, Session};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.log_file, config.log_level)?;

    let session = Session::open(&config.store)?;
    info!("store ready at {:?}", session.target());

    let mut app = App::new(session, config.export_dir.clone())?;
    let outcome = run_app(&mut app);
    if let Err(err) = &outcome {
        error!("terminal session ended with an error: {err:#}");
    }

    app.into_session()
        .close()
        .context("failed to close the database cleanly")?;
    info!("shut down");
    outcome
}
