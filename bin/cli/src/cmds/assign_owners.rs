use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use compass_client::{Api, Client, Credentials};
use compass_generator::owners::{parse_mappings, parse_team_names};
use compass_generator::{AssignmentSummary, OwnerAssignment};
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Create Atlassian teams from a tfvars file and assign them as Compass component owners")]
pub(crate) struct AssignOwnersCommand {
    #[arg(long, help = "Terraform tfvars file declaring the teams in its `groups` block")]
    pub tfvars: PathBuf,

    #[arg(long, help = "JSON file mapping team names to component names")]
    pub mappings: PathBuf,

    #[arg(long, help = "Log the updates without creating teams or changing owners")]
    pub dry_run: bool,

    #[arg(long, env = "COMPASS_API_TOKEN", hide_env_values = true)]
    pub compass_token: String,

    #[arg(long, env = "ATLASSIAN_TEAMS_TOKEN", hide_env_values = true)]
    pub teams_token: String,

    #[arg(long, env = "COMPASS_EMAIL")]
    pub email: String,

    #[arg(long, env = "COMPASS_CLOUD_ID")]
    pub cloud_id: String,

    #[arg(long, env = "ATLASSIAN_ORG_ID")]
    pub org_id: String,

    #[arg(long, env = "COMPASS_BASE_URL")]
    pub base_url: String,
}

pub(crate) async fn invoke(cmd: AssignOwnersCommand) -> Result<AssignmentSummary> {
    let tfvars = fs::read_to_string(&cmd.tfvars)
        .with_context(|| format!("failed to read {}", cmd.tfvars.display()))?;
    let team_names = parse_team_names(&tfvars);
    info!("Found {} teams in {}", team_names.len(), cmd.tfvars.display());

    let mappings = fs::read_to_string(&cmd.mappings)
        .with_context(|| format!("failed to read {}", cmd.mappings.display()))?;
    let mappings = parse_mappings(&mappings)
        .with_context(|| format!("invalid mappings in {}", cmd.mappings.display()))?;

    let compass = Client::new(
        Api::Compass,
        &cmd.base_url,
        Credentials::new(cmd.email.as_str(), cmd.compass_token.as_str()),
    )?;
    let teams = Client::new(
        Api::Teams,
        &cmd.base_url,
        Credentials::new(cmd.email.as_str(), cmd.teams_token.as_str()),
    )?;

    let summary = OwnerAssignment {
        teams: &teams,
        compass: &compass,
        org_id: &cmd.org_id,
        cloud_id: &cmd.cloud_id,
        dry_run: cmd.dry_run,
    }
    .assign(&team_names, &mappings)
    .await?;

    Ok(summary)
}
