use std::collections::HashSet;

use compass_client::{team_to_ari, Client, TeamDetails};
use eventcatalog::{Catalog, Team, User, WriteOptions};
use tracing::{debug, info, warn};

use crate::component::last_segment;
use crate::errors::GeneratorResult;
use crate::sanitize::sanitize_id;

/// Compass access used to resolve team names and members.
pub struct TeamLookup<'a> {
    pub client: &'a Client,
    pub cloud_id: &'a str,
}

/// Writes one catalog team per distinct owner seen during a run.
pub struct TeamEnricher<'a> {
    catalog: &'a dyn Catalog,
    lookup: Option<TeamLookup<'a>>,
    options: WriteOptions,
    dry_run: bool,
    attempted: HashSet<String>,
    users: HashSet<String>,
}

impl<'a> TeamEnricher<'a> {
    pub fn new(
        catalog: &'a dyn Catalog,
        lookup: Option<TeamLookup<'a>>,
        options: WriteOptions,
        dry_run: bool,
    ) -> Self {
        Self {
            catalog,
            lookup,
            options,
            dry_run,
            attempted: HashSet::new(),
            users: HashSet::new(),
        }
    }

    /// Ensures the owning team exists in the catalog. Lookup failures only skip the team.
    pub async fn enrich(&mut self, owner_id: &str) -> GeneratorResult<()> {
        let raw_id = last_segment(owner_id);
        let team_id = sanitize_id(raw_id);
        if team_id.is_empty() || !self.attempted.insert(team_id.clone()) {
            return Ok(());
        }

        let (name, members) = match &self.lookup {
            Some(lookup) => match self.fetch(lookup, owner_id).await {
                Some(details) => (details.display_name, details.members),
                None => return Ok(()),
            },
            None => (raw_id.to_string(), vec![]),
        };

        let mut member_ids = Vec::new();
        for member in members {
            let user_id = sanitize_id(member.name.trim());
            if user_id.is_empty() {
                continue;
            }
            if self.users.insert(user_id.clone()) {
                let user = User {
                    id: user_id.clone(),
                    name: member.name.trim().to_string(),
                    avatar_url: member.picture,
                    email: member.email,
                    markdown: String::new(),
                };
                self.write_user(&user).await?;
            }
            member_ids.push(user_id);
        }

        let team = Team {
            id: team_id,
            name,
            markdown: String::new(),
            members: member_ids,
        };
        self.write_team(&team).await
    }

    async fn fetch(&self, lookup: &TeamLookup<'_>, owner_id: &str) -> Option<TeamDetails> {
        match lookup
            .client
            .fetch_team_by_id(&team_to_ari(owner_id), lookup.cloud_id)
            .await
        {
            Ok(Some(details)) => Some(details),
            Ok(None) => {
                warn!("Team {owner_id} not found in Compass, skipping team creation");
                None
            }
            Err(e) => {
                warn!("Unable to fetch team {owner_id}: {e}, skipping team creation");
                None
            }
        }
    }

    async fn write_team(&self, team: &Team) -> GeneratorResult<()> {
        if !self.options.override_existing && self.catalog.get_team(&team.id).await?.is_some() {
            debug!("team {} already exists, skipping", team.id);
            return Ok(());
        }

        if self.dry_run {
            info!("[dry run] would write team {} ({})", team.id, team.name);
            return Ok(());
        }

        info!("Writing team {} ({})", team.id, team.name);
        self.catalog.write_team(team, self.options).await?;
        Ok(())
    }

    async fn write_user(&self, user: &User) -> GeneratorResult<()> {
        if !self.options.override_existing && self.catalog.get_user(&user.id).await?.is_some() {
            debug!("user {} already exists, skipping", user.id);
            return Ok(());
        }

        if self.dry_run {
            info!("[dry run] would write user {}", user.id);
            return Ok(());
        }

        debug!("writing user {}", user.id);
        self.catalog.write_user(user, self.options).await?;
        Ok(())
    }
}
