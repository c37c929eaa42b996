use anyhow::Result;

use paramsync_core::envfile::load_stage_snapshot;
use paramsync_core::sync::{SyncEngine, SyncPlan};

use super::RunContext;
use crate::reporter::ProgressReporter;

pub async fn run(ctx: &RunContext, dry_run: bool, assume_yes: bool) -> Result<()> {
    let reporter = ProgressReporter::new(&ctx.stage_file_label(), assume_yes);

    // Local file first: a missing stage file must fail before any remote call
    let local = load_stage_snapshot(&ctx.env_dir, ctx.path.stage(), ctx.chunk_limit, &reporter)?;

    let store = ctx.open_store().await?;
    let engine = SyncEngine::new(store.as_ref(), ctx.path.clone(), ctx.options.clone());

    if dry_run {
        let plan = engine.plan(&local).await?;
        print_plan(ctx, &plan);
        return Ok(());
    }

    let report = engine.push(&local, &reporter).await?;

    println!("\nPush completed:");
    println!("  Prefix:    {}", ctx.path.prefix());
    println!("  Store:     {}", store.name());
    println!("  Deleted:   {}", report.deleted);
    println!("  Written:   {}", report.written);
    if report.retried > 0 {
        println!("  Retried:   {}", report.retried);
    }

    Ok(())
}

fn print_plan(ctx: &RunContext, plan: &SyncPlan) {
    println!("Dry run for {}:", ctx.path.prefix());

    if !plan.stale.is_empty() {
        println!("\n  Would delete {} keys:", plan.stale.len());
        for key in &plan.stale {
            println!("    - {key}");
        }
    }
    if !plan.created.is_empty() {
        println!("\n  Would create {} keys:", plan.created.len());
        for key in &plan.created {
            println!("    + {key}");
        }
    }
    if !plan.updated.is_empty() {
        println!("\n  Would update {} keys:", plan.updated.len());
        for key in &plan.updated {
            println!("    ~ {key}");
        }
    }

    println!(
        "\n  {} writes in total ({} unchanged values rewritten)",
        plan.writes(),
        plan.unchanged.len()
    );
}
