//! Dependency scheduling
//!
//! Services are grouped into tranches: every member of a tranche only depends
//! on services of strictly earlier tranches, so a tranche can be started
//! concurrently once its predecessors are up.

use crate::error::{CoreError, Result};
use crate::model::ServiceSpec;
use std::collections::{BTreeMap, HashSet};

/// A batch of services that can start together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tranche {
    services: Vec<ServiceSpec>,
}

impl Tranche {
    pub fn new(services: Vec<ServiceSpec>) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &[ServiceSpec] {
        &self.services
    }

    pub fn names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceSpec> {
        self.services.iter()
    }
}

/// Peel the depends_on graph into ordered tranches.
///
/// Each round takes every remaining service whose dependencies are already
/// scheduled. A round that takes nothing means a cycle (self-dependencies
/// included). Members of a tranche are ordered by name.
pub fn make_tranches(services: &[ServiceSpec]) -> Result<Vec<Tranche>> {
    let mut known = HashSet::new();
    for service in services {
        if !known.insert(service.name.as_str()) {
            return Err(CoreError::DuplicateService(service.name.clone()));
        }
    }

    for service in services {
        if let Some(dep) = service
            .depends_on
            .iter()
            .find(|d| !known.contains(d.as_str()))
        {
            return Err(CoreError::UnresolvedDependency {
                service: service.name.clone(),
                dependency: dep.clone(),
            });
        }
    }

    let mut remaining: BTreeMap<&str, &ServiceSpec> =
        services.iter().map(|s| (s.name.as_str(), s)).collect();
    let mut tranches = Vec::new();

    while !remaining.is_empty() {
        let ready: Vec<&str> = remaining
            .iter()
            .filter(|(_, service)| {
                service
                    .depends_on
                    .iter()
                    .all(|dep| !remaining.contains_key(dep.as_str()))
            })
            .map(|(name, _)| *name)
            .collect();

        if ready.is_empty() {
            return Err(CoreError::ImpossibleDependencyTree {
                remaining: remaining.keys().map(|k| k.to_string()).collect(),
            });
        }

        let members = ready
            .into_iter()
            .filter_map(|name| remaining.remove(name))
            .cloned()
            .collect();

        let tranche = Tranche::new(members);
        tracing::debug!("Tranche {}: {:?}", tranches.len(), tranche.names());
        tranches.push(tranche);
    }

    Ok(tranches)
}
