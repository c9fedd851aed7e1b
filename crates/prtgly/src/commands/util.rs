//! Shared command helpers.

use tracing::debug;

use prtgly_core::{ContentSelector, ContentType, Controller, EngineConfig, Session, Source};

use crate::cli::{ContentArg, GlobalOpts, SourceArgs};
use crate::config::{self, Config};
use crate::error::CliError;

pub fn selector(content: ContentArg) -> ContentSelector {
    match content {
        ContentArg::Groups => ContentType::Group.into(),
        ContentArg::Devices => ContentType::Device.into(),
        ContentArg::Sensors => ContentType::Sensor.into(),
        ContentArg::All => ContentSelector::All,
    }
}

/// Build a controller from profile + flags.
pub fn connect(
    global: &GlobalOpts,
    cfg: &Config,
    engine: &EngineConfig,
) -> Result<Controller, CliError> {
    let controller_config = config::resolve_controller(global, cfg)?;
    debug!(url = %controller_config.url, "connecting");
    Ok(Controller::new(&controller_config, engine.schema.clone())?)
}

/// Start a session and load the selected content from the chosen source.
///
/// Returns the controller too when the content came from PRTG, so the
/// caller can keep talking to the same server.
pub async fn open_session(
    source: &SourceArgs,
    global: &GlobalOpts,
    cfg: &Config,
    engine: EngineConfig,
    with_ancestors: bool,
) -> Result<(Session, Option<Controller>), CliError> {
    let selector = selector(source.content);

    if let Some(path) = &source.source_file {
        let mut session = Session::new(engine, Source::Import(path.clone()));
        session.load_import()?;
        return Ok((session, None));
    }

    let controller = connect(global, cfg, &engine)?;
    let mut session = Session::new(engine, Source::Remote);
    session
        .load_remote(&controller, selector, with_ancestors)
        .await?;
    Ok((session, Some(controller)))
}
