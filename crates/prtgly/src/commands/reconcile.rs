//! `preview`, `preview-changed-only` and `apply`.

use tracing::info;

use prtgly_core::{Rule, load_rules};

use crate::cli::{ApplyArgs, GlobalOpts, RunArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

fn rules(args: &RunArgs) -> Result<Vec<Rule>, CliError> {
    let rules = load_rules(&args.rules)?;
    info!(path = %args.rules.display(), count = rules.len(), "rules loaded");
    Ok(rules)
}

/// Reconcile without sending anything and print the resulting objects.
pub async fn preview(args: &RunArgs, changed_only: bool, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let engine = config::resolve_engine(global, &cfg)?;
    let rules = rules(args)?;
    let selector = util::selector(args.source.content);

    let (mut session, _) = util::open_session(&args.source, global, &cfg, engine, true).await?;
    let change_set = session.preview(selector, &rules);

    if args.show_queries {
        output::print_output(&output::render_queries(&change_set), global.quiet);
    }

    let store = session.store();
    let entities = if changed_only {
        store.get_changed_selected(selector)
    } else {
        store.get_selected(selector)
    };
    let out = output::render_entities(global.format, &entities, global.sort_by.as_deref())?;
    output::print_output(&out, global.quiet);

    if !global.quiet {
        eprintln!("{}", output::render_summary(&change_set));
    }
    Ok(())
}

/// Reconcile, then push every change to PRTG one query at a time.
pub async fn apply(args: &ApplyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let run = &args.run;
    if run.source.source_file.is_some() {
        return Err(CliError::ApplyFromImport);
    }

    let cfg = config::load_config_or_default();
    let mut engine = config::resolve_engine(global, &cfg)?;
    engine.abort_on_error |= args.abort_on_error;
    let rules = rules(run)?;
    let selector = util::selector(run.source.content);

    let (mut session, controller) =
        util::open_session(&run.source, global, &cfg, engine, true).await?;
    let controller = controller.ok_or_else(|| {
        CliError::Internal("remote session opened without a controller".into())
    })?;

    let change_set = session.reconcile(selector, &rules);
    if run.show_queries {
        output::print_output(&output::render_queries(&change_set), global.quiet);
    }
    if change_set.is_empty() {
        if !global.quiet {
            eprintln!("Nothing to apply: every selected object already matches the rules");
        }
        return Ok(());
    }

    let report = session.apply(&controller, &change_set).await?;
    info!(state = %session.state(), "apply finished");

    let changed = session.store().get_changed_selected(selector);
    let out = output::render_entities(global.format, &changed, global.sort_by.as_deref())?;
    output::print_output(&out, global.quiet);
    if !global.quiet {
        eprintln!(
            "{}",
            output::render_apply_report(&report, output::should_color())
        );
    }

    if report.is_complete() {
        Ok(())
    } else {
        Err(CliError::PartialApply {
            failed: report.failures.len(),
            attempted: report.attempted.len(),
        })
    }
}
