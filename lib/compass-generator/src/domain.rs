//! Keeps the configured domain at the requested version, preserving older versions.

use eventcatalog::{Catalog, Domain, ResourcePointer, WriteOptions};
use markup::MarkupFormat;
use tracing::{debug, info};

use crate::errors::GeneratorResult;
use crate::settings::DomainSettings;

pub const DOMAIN_MARKDOWN: &str = "## Architecture diagram\n  <NodeGraph />";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomainState {
    NoDomain,
    CurrentMatches,
    CurrentStale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DomainPlan {
    pub state: DomainState,
    /// Move the current version aside first.
    pub version_previous: bool,
    /// Bring the requested version back from the versioned domains.
    pub restore: bool,
    pub write: bool,
}

/// Decides what to do given the domain stored at the requested version and the current one.
pub fn plan(requested: &str, at_version: Option<&Domain>, latest: Option<&Domain>) -> DomainPlan {
    let state = match latest {
        None => DomainState::NoDomain,
        Some(latest) if latest.version == requested => DomainState::CurrentMatches,
        Some(_) => DomainState::CurrentStale,
    };

    let version_previous = state == DomainState::CurrentStale;
    let stored = matches!(at_version, Some(d) if d.version == requested);

    DomainPlan {
        state,
        version_previous,
        // a stored version that is not current only exists among the versioned domains
        restore: stored && version_previous,
        write: !stored,
    }
}

/// Applies [`plan`] for the configured domain. Returns the plan that was (or, on dry runs, would
/// have been) carried out.
pub async fn reconcile(
    catalog: &dyn Catalog,
    settings: &DomainSettings,
    format: MarkupFormat,
    dry_run: bool,
) -> GeneratorResult<DomainPlan> {
    let at_version = catalog
        .get_domain(&settings.id, Some(&settings.version))
        .await?;
    let latest = catalog.get_domain(&settings.id, None).await?;
    let plan = plan(&settings.version, at_version.as_ref(), latest.as_ref());
    debug!("domain {} plan: {:?}", settings.id, plan);

    if plan.version_previous {
        let previous = latest.as_ref().map(|d| d.version.as_str()).unwrap_or_default();
        if dry_run {
            info!("[dry run] would version domain {} ({previous})", settings.id);
        } else {
            info!("Versioning domain {} ({previous})", settings.id);
            catalog.version_domain(&settings.id).await?;
        }
    }

    if plan.restore {
        if dry_run {
            info!(
                "[dry run] would restore domain {} ({})",
                settings.id, settings.version
            );
        } else {
            info!("Restoring domain {} ({})", settings.id, settings.version);
            catalog
                .restore_domain(&settings.id, &settings.version)
                .await?;
        }
    }

    if plan.write {
        if dry_run {
            info!(
                "[dry run] would write domain {} ({})",
                settings.id, settings.version
            );
        } else {
            info!("Creating domain {} ({})", settings.id, settings.version);
            let domain = Domain {
                id: settings.id.clone(),
                name: settings.name.clone(),
                version: settings.version.clone(),
                markdown: DOMAIN_MARKDOWN.to_string(),
                services: vec![],
            };
            catalog
                .write_domain(&domain, WriteOptions::new(true, format))
                .await?;
        }
    }

    Ok(plan)
}

pub async fn add_service(
    catalog: &dyn Catalog,
    settings: &DomainSettings,
    service: &ResourcePointer,
    dry_run: bool,
) -> GeneratorResult<()> {
    if dry_run {
        info!(
            "[dry run] would add service {} to domain {}",
            service.id, settings.id
        );
        return Ok(());
    }

    catalog
        .add_service_to_domain(&settings.id, service, &settings.version)
        .await?;
    Ok(())
}
