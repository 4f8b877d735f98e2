use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use eventcatalog::{
    is_latest, Catalog, CatalogError, CatalogResult, Domain, ResourcePointer, Service, Team, User,
    WriteOptions,
};

#[derive(Debug)]
struct Versions<T> {
    current: Option<T>,
    previous: BTreeMap<String, T>,
}

impl<T> Default for Versions<T> {
    fn default() -> Self {
        Self {
            current: None,
            previous: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    domains: HashMap<String, Versions<Domain>>,
    services: HashMap<String, Versions<Service>>,
    teams: HashMap<String, Team>,
    users: HashMap<String, User>,
    domain_writes: usize,
    domain_versions: usize,
    domain_restores: usize,
    service_writes: usize,
    team_writes: usize,
    user_writes: usize,
}

/// In-memory [`Catalog`] mirroring the versioning rules of the filesystem catalog.
///
/// Seeding through the `insert_*` helpers does not count as a write.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: Mutex<State>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("memory catalog lock poisoned")
    }

    pub fn insert_domain(&self, domain: Domain) {
        let id = domain.id.clone();
        self.state()
            .domains
            .entry(id)
            .or_default()
            .current = Some(domain);
    }

    /// Stores `domain` as a previous version, as if it had been versioned earlier.
    pub fn insert_previous_domain(&self, domain: Domain) {
        self.state()
            .domains
            .entry(domain.id.clone())
            .or_default()
            .previous
            .insert(domain.version.clone(), domain);
    }

    pub fn insert_service(&self, service: Service) {
        let id = service.id.clone();
        self.state()
            .services
            .entry(id)
            .or_default()
            .current = Some(service);
    }

    pub fn insert_team(&self, team: Team) {
        self.state().teams.insert(team.id.clone(), team);
    }

    pub fn services(&self) -> Vec<Service> {
        let mut services: Vec<Service> = self
            .state()
            .services
            .values()
            .filter_map(|v| v.current.clone())
            .collect();
        services.sort_by(|a, b| a.id.cmp(&b.id));
        services
    }

    pub fn service(&self, id: &str) -> Option<Service> {
        self.state()
            .services
            .get(id)
            .and_then(|v| v.current.clone())
    }

    pub fn domain(&self, id: &str) -> Option<Domain> {
        self.state().domains.get(id).and_then(|v| v.current.clone())
    }

    pub fn previous_domain_versions(&self, id: &str) -> Vec<String> {
        self.state()
            .domains
            .get(id)
            .map(|v| v.previous.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn team(&self, id: &str) -> Option<Team> {
        self.state().teams.get(id).cloned()
    }

    pub fn user(&self, id: &str) -> Option<User> {
        self.state().users.get(id).cloned()
    }

    pub fn domain_writes(&self) -> usize {
        self.state().domain_writes
    }

    pub fn domain_versions(&self) -> usize {
        self.state().domain_versions
    }

    pub fn domain_restores(&self) -> usize {
        self.state().domain_restores
    }

    pub fn service_writes(&self) -> usize {
        self.state().service_writes
    }

    pub fn team_writes(&self) -> usize {
        self.state().team_writes
    }

    pub fn user_writes(&self) -> usize {
        self.state().user_writes
    }

    /// Total number of mutating calls, including domain versioning and restores.
    pub fn total_writes(&self) -> usize {
        let state = self.state();
        state.domain_writes
            + state.domain_versions
            + state.domain_restores
            + state.service_writes
            + state.team_writes
            + state.user_writes
    }
}

fn locate<'a, T: Clone + HasVersion>(
    versions: Option<&'a mut Versions<T>>,
    version: Option<&str>,
) -> Option<&'a mut T> {
    let versions = versions?;
    let current_matches = versions
        .current
        .as_ref()
        .is_some_and(|c| is_latest(version) || Some(c.version()) == version);
    if current_matches {
        return versions.current.as_mut();
    }

    version.and_then(|v| versions.previous.get_mut(v))
}

trait HasVersion {
    fn version(&self) -> &str;
}

impl HasVersion for Domain {
    fn version(&self) -> &str {
        &self.version
    }
}

impl HasVersion for Service {
    fn version(&self) -> &str {
        &self.version
    }
}

fn check_override(
    exists: bool,
    options: WriteOptions,
    kind: &'static str,
    id: &str,
) -> CatalogResult<()> {
    if exists && !options.override_existing {
        return Err(CatalogError::AlreadyExists {
            kind,
            id: id.to_string(),
        });
    }
    Ok(())
}

#[async_trait::async_trait]
impl Catalog for MemoryCatalog {
    async fn get_domain(&self, id: &str, version: Option<&str>) -> CatalogResult<Option<Domain>> {
        let mut state = self.state();
        Ok(locate(state.domains.get_mut(id), version).map(|d| d.clone()))
    }

    async fn write_domain(&self, domain: &Domain, options: WriteOptions) -> CatalogResult<()> {
        let mut state = self.state();
        let entry = state.domains.entry(domain.id.clone()).or_default();
        check_override(entry.current.is_some(), options, "domain", &domain.id)?;
        entry.current = Some(domain.clone());
        state.domain_writes += 1;
        Ok(())
    }

    async fn version_domain(&self, id: &str) -> CatalogResult<()> {
        let mut state = self.state();
        let current = state
            .domains
            .get_mut(id)
            .and_then(|v| v.current.take().map(|c| (v, c)));
        let Some((versions, current)) = current else {
            return Err(CatalogError::NotFound {
                kind: "domain",
                id: id.to_string(),
            });
        };
        versions.previous.insert(current.version.clone(), current);
        state.domain_versions += 1;
        Ok(())
    }

    async fn restore_domain(&self, id: &str, version: &str) -> CatalogResult<()> {
        let mut state = self.state();
        let versions = state.domains.entry(id.to_string()).or_default();
        if versions.current.is_some() {
            return Err(CatalogError::AlreadyExists {
                kind: "domain",
                id: id.to_string(),
            });
        }
        let Some(restored) = versions.previous.remove(version) else {
            return Err(CatalogError::NotFound {
                kind: "domain",
                id: format!("{id}@{version}"),
            });
        };
        versions.current = Some(restored);
        state.domain_restores += 1;
        Ok(())
    }

    async fn add_service_to_domain(
        &self,
        domain_id: &str,
        service: &ResourcePointer,
        domain_version: &str,
    ) -> CatalogResult<()> {
        let mut state = self.state();
        let Some(domain) = locate(state.domains.get_mut(domain_id), Some(domain_version)) else {
            return Err(CatalogError::NotFound {
                kind: "domain",
                id: format!("{domain_id}@{domain_version}"),
            });
        };

        if !domain.services.contains(service) {
            domain.services.push(service.clone());
        }
        Ok(())
    }

    async fn get_service(&self, id: &str, version: Option<&str>) -> CatalogResult<Option<Service>> {
        let mut state = self.state();
        Ok(locate(state.services.get_mut(id), version).map(|s| s.clone()))
    }

    async fn write_service(&self, service: &Service, options: WriteOptions) -> CatalogResult<()> {
        let mut state = self.state();
        let entry = state.services.entry(service.id.clone()).or_default();
        check_override(entry.current.is_some(), options, "service", &service.id)?;
        entry.current = Some(service.clone());
        state.service_writes += 1;
        Ok(())
    }

    async fn get_team(&self, id: &str) -> CatalogResult<Option<Team>> {
        Ok(self.state().teams.get(id).cloned())
    }

    async fn write_team(&self, team: &Team, options: WriteOptions) -> CatalogResult<()> {
        let mut state = self.state();
        check_override(state.teams.contains_key(&team.id), options, "team", &team.id)?;
        state.teams.insert(team.id.clone(), team.clone());
        state.team_writes += 1;
        Ok(())
    }

    async fn get_user(&self, id: &str) -> CatalogResult<Option<User>> {
        Ok(self.state().users.get(id).cloned())
    }

    async fn write_user(&self, user: &User, options: WriteOptions) -> CatalogResult<()> {
        let mut state = self.state();
        check_override(state.users.contains_key(&user.id), options, "user", &user.id)?;
        state.users.insert(user.id.clone(), user.clone());
        state.user_writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use eventcatalog::{Catalog, Domain, ResourcePointer, WriteOptions};

    use crate::MemoryCatalog;

    fn domain(version: &str) -> Domain {
        Domain {
            id: "orders".to_string(),
            name: "Orders".to_string(),
            version: version.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn versioned_domain_stays_addressable() {
        let catalog = MemoryCatalog::new();
        catalog.insert_domain(domain("0.0.1"));

        catalog.version_domain("orders").await.unwrap();
        catalog
            .write_domain(&domain("0.0.2"), WriteOptions::default())
            .await
            .unwrap();

        let latest = catalog.get_domain("orders", None).await.unwrap().unwrap();
        assert_eq!("0.0.2", latest.version);
        let previous = catalog
            .get_domain("orders", Some("0.0.1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!("0.0.1", previous.version);
        assert_eq!(vec!["0.0.1".to_string()], catalog.previous_domain_versions("orders"));
    }

    #[tokio::test]
    async fn restore_moves_the_previous_version_back() {
        let catalog = MemoryCatalog::new();
        catalog.insert_previous_domain(domain("0.0.1"));
        catalog.insert_domain(domain("0.0.2"));

        assert!(catalog.restore_domain("orders", "0.0.1").await.is_err());
        catalog.version_domain("orders").await.unwrap();
        catalog.restore_domain("orders", "0.0.1").await.unwrap();

        assert_eq!("0.0.1", catalog.domain("orders").unwrap().version);
        assert_eq!(vec!["0.0.2".to_string()], catalog.previous_domain_versions("orders"));
        assert_eq!(1, catalog.domain_restores());
    }

    #[tokio::test]
    async fn adding_service_twice_keeps_one_pointer() {
        let catalog = MemoryCatalog::new();
        catalog.insert_domain(domain("0.0.1"));
        let pointer = ResourcePointer::new("orders-api", "0.0.0");

        catalog
            .add_service_to_domain("orders", &pointer, "0.0.1")
            .await
            .unwrap();
        catalog
            .add_service_to_domain("orders", &pointer, "0.0.1")
            .await
            .unwrap();

        assert_eq!(vec![pointer], catalog.domain("orders").unwrap().services);
    }
}
