//! `status`: server status passthrough.

use prtgly_core::{Session, Source};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let engine = config::resolve_engine(global, &cfg)?;
    let controller = util::connect(global, &cfg, &engine)?;

    let session = Session::new(engine, Source::Remote);
    let status = session.status(&controller).await?;
    let out = output::render_status(global.format, &status)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
