// src/resolve/resolver.rs
// =============================================================================
// Expands a seed list into its full transitive dependency closure.
//
// How it works (breadth-first, one round per dependency "level"):
// 1. Take the whole frontier as this round's work and commit it to `visited`
// 2. Fetch the dependencies of every work item concurrently
// 3. Wait for ALL of them (round barrier)
// 4. Anything discovered that is not yet visited becomes the next frontier
// 5. Repeat until the frontier is empty
//
// The fetches of a round never touch the sets themselves; each one returns
// what it found and the merge happens after the join. A name can only enter
// the frontier if it is absent from `visited`, and `visited` only grows, so
// every name is queried at most once and cycles terminate.
//
// A failed metadata fetch is logged and contributes nothing. It never stops
// the resolution.
// =============================================================================

use super::metadata::MetadataClient;
use crate::package::PackageName;
use futures::future::join_all;
use log::{debug, info, warn};
use std::collections::BTreeSet;

pub struct DependencyResolver {
    metadata: MetadataClient,
}

impl DependencyResolver {
    pub fn new(metadata: MetadataClient) -> Self {
        DependencyResolver { metadata }
    }

    /// Returns every package reachable from `seed`, seed included.
    pub async fn resolve<I>(&self, seed: I) -> BTreeSet<PackageName>
    where
        I: IntoIterator<Item = PackageName>,
    {
        let mut frontier: BTreeSet<PackageName> = seed.into_iter().collect();
        let mut visited: BTreeSet<PackageName> = BTreeSet::new();
        let mut round = 0;

        while !frontier.is_empty() {
            round += 1;
            let work = std::mem::take(&mut frontier);
            visited.extend(work.iter().cloned());
            info!("Resolving round {}: {} package(s)", round, work.len());

            let fetches = work.iter().map(|package| async move {
                match self.metadata.dependencies(package).await {
                    Ok(deps) => {
                        debug!("{} requires {} package(s)", package, deps.len());
                        deps
                    }
                    Err(e) => {
                        warn!("Metadata: skipping dependencies of {}: {}", package, e);
                        Default::default()
                    }
                }
            });

            for discovered in join_all(fetches).await {
                frontier.extend(discovered.into_iter().filter(|name| !visited.contains(name)));
            }
        }

        info!("Resolved {} package(s) in {} round(s)", visited.len(), round);
        visited
    }
}
