//! apply command - Version the root project and all of its modules

use std::path::Path;

use anyhow::{Context as _, Result};

use super::root_pom;
use crate::engine::{Context, ProcessStatus, Processed, Session};
use crate::ui::output::{self, Verbosity};

/// Process the root descriptor and every module reachable from it.
///
/// Prints one line per project: the coordinate followed by the derived
/// descriptor, or the reason it was left alone.
pub fn apply(ctx: &Context, file: Option<&Path>, verbosity: Verbosity) -> Result<()> {
    let pom = root_pom(ctx, file);

    let mut session = Session::start(ctx, &pom)
        .with_context(|| format!("failed to start versioning for '{}'", pom.display()))?;
    let results = session
        .process_all(&pom)
        .context("failed to version project descriptors")?;

    for processed in &results {
        output::print(describe(processed), verbosity);
    }

    Ok(())
}

fn describe(processed: &Processed) -> String {
    let coordinate = processed.model.coordinate();
    match processed.status {
        ProcessStatus::Versioned | ProcessStatus::Cached => {
            let target = processed
                .model
                .versioned_pom
                .as_deref()
                .map(|path| path.display().to_string())
                .unwrap_or_default();
            format!("{} -> {}", coordinate, target)
        }
        ProcessStatus::Skipped(reason) => format!("{} skipped: {}", coordinate, reason),
    }
}
