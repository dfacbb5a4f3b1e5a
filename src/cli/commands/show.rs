//! show command - Display the git situation and the resolved version
//!
//! Read-only: no descriptor is written and the build graph is not walked.

use std::path::Path;

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::root_pom;
use crate::core::resolve::ResolvedVersion;
use crate::core::types::RefSituation;
use crate::engine::{Context, Session};
use crate::pom::ProjectModel;

/// Everything `show` reports, in the shape printed with `--json`.
#[derive(Debug, Serialize)]
struct Report<'a> {
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    disabled_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    situation: Option<&'a RefSituation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<&'a ResolvedVersion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_format: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    prefer_tags: bool,
    update_pom: bool,
}

/// Show the git situation and the version the project would receive.
pub fn show(ctx: &Context, json: bool, file: Option<&Path>) -> Result<()> {
    let session = Session::resolve(ctx).context("failed to resolve version")?;

    let active = match &session {
        Session::Disabled(reason) => {
            let report = Report {
                enabled: false,
                disabled_reason: Some(reason.to_string()),
                config: None,
                situation: None,
                resolved: None,
                version_format: None,
                project: None,
                version: None,
                prefer_tags: false,
                update_pom: false,
            };
            return print_report(&report, json);
        }
        Session::Active(active) => active,
    };

    let pom = root_pom(ctx, file);
    let (project, version) = if pom.is_file() {
        let model = ProjectModel::read(&pom)
            .with_context(|| format!("failed to read '{}'", pom.display()))?;
        let coordinate = model.coordinate();
        let version = match &coordinate.version {
            Some(original) => Some(active.version_for(original)?),
            None => None,
        };
        (Some(coordinate.project_id()), version)
    } else {
        (None, None)
    };

    let report = Report {
        enabled: true,
        disabled_reason: None,
        config: Some(active.config().path.display().to_string()),
        situation: Some(active.situation()),
        resolved: Some(active.resolved()),
        version_format: Some(active.resolved().version_format()),
        project,
        version,
        prefer_tags: active.prefer_tags(),
        update_pom: active.update_pom(),
    };
    print_report(&report, json)
}

fn print_report(report: &Report<'_>, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(report).context("failed to serialize report")?;
        println!("{}", out);
        return Ok(());
    }

    if let Some(reason) = &report.disabled_reason {
        println!("disabled: {}", reason);
        return Ok(());
    }

    if let Some(config) = &report.config {
        println!("config:    {}", config);
    }
    if let Some(situation) = report.situation {
        println!("commit:    {}", situation.head_commit);
        match &situation.branch {
            Some(branch) => println!("branch:    {}", branch),
            None => println!("branch:    (detached)"),
        }
        if situation.tags.is_empty() {
            println!("tags:      (none)");
        } else {
            println!("tags:      {}", situation.tags.join(", "));
        }
        println!("clean:     {}", situation.clean);
    }
    if let Some(resolved) = report.resolved {
        println!("ref:       {} ({})", resolved.ref_name, resolved.ref_type);
    }
    if let Some(format) = report.version_format {
        println!("format:    {}", format);
    }
    if let (Some(project), Some(version)) = (&report.project, &report.version) {
        println!("project:   {}", project);
        println!("version:   {}", version);
    }
    println!("prefer tags: {}", report.prefer_tags);
    println!("update pom:  {}", report.update_pom);

    Ok(())
}
