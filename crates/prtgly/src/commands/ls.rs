//! `ls`: objects as loaded, before any rule runs.

use crate::cli::{GlobalOpts, SourceArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(args: &SourceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let engine = config::resolve_engine(global, &cfg)?;
    let selector = util::selector(args.content);

    let (session, _) = util::open_session(args, global, &cfg, engine, false).await?;

    let entities = session.store().get_selected(selector);
    let out = output::render_entities(global.format, &entities, global.sort_by.as_deref())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
