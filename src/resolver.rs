// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::config::ResolverOptions;
use crate::document::{Document, NodeId};
use crate::handlers::Enrichment;
use crate::registry::{instances::BUILTIN_REGISTRY, HandlerRegistry};
use crate::store::RecordStore;

use core::ops::AddAssign;

use log::{debug, info};
use serde::Serialize;

/// Counters for one or more resolution passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    pub passes: usize,
    pub visited: usize,
    pub attempted: usize,
    pub spliced: usize,
    pub already_spliced: usize,
    pub unresolved: usize,
}

impl AddAssign for PassStats {
    fn add_assign(&mut self, other: Self) {
        self.passes += other.passes;
        self.visited += other.visited;
        self.attempted += other.attempted;
        self.spliced += other.spliced;
        self.already_spliced += other.already_spliced;
        self.unresolved += other.unresolved;
    }
}

/// Walks a document and lets registered handlers splice in referenced
/// records.
pub struct Resolver<'s> {
    store: &'s dyn RecordStore,
    registry: &'s HandlerRegistry,
    options: ResolverOptions,
}

impl<'s> Resolver<'s> {
    /// Resolver using the builtin handlers.
    pub fn new(store: &'s dyn RecordStore) -> Self {
        Self::with_registry(store, &BUILTIN_REGISTRY)
    }

    pub fn with_registry(store: &'s dyn RecordStore, registry: &'s HandlerRegistry) -> Self {
        Self {
            store,
            registry,
            options: ResolverOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// One pre-order pass over every element of `doc`.
    ///
    /// Each node whose tag has a handler gets exactly one enrichment attempt.
    /// The children list of a node is captured before its handler runs, so
    /// subtrees spliced during this pass are not walked by it.
    pub fn resolve(&self, doc: &mut Document) -> PassStats {
        let mut stats = PassStats {
            passes: 1,
            ..PassStats::default()
        };

        let mut stack: Vec<NodeId> = vec![doc.root()];
        while let Some(node) = stack.pop() {
            stats.visited += 1;
            let children = doc.children(node).to_vec();

            let prefix = doc.parent(node).map(|p| doc.tag(p));
            if let Some(handler) = self.registry.lookup(doc.tag(node), prefix) {
                let handler = *handler;
                stats.attempted += 1;
                match handler.enrich(doc, node, self.store) {
                    Enrichment::Spliced(_) => stats.spliced += 1,
                    Enrichment::AlreadySpliced => stats.already_spliced += 1,
                    Enrichment::Unresolved => stats.unresolved += 1,
                    Enrichment::NoReference => (),
                }
            }

            stack.extend(children.into_iter().rev());
        }

        debug!(
            "resolution pass over `{}`: visited {}, attempted {}, spliced {}",
            doc.root_record().name(),
            stats.visited,
            stats.attempted,
            stats.spliced
        );
        stats
    }

    /// Repeat passes until one splices nothing, so that references inside
    /// spliced records are followed too. Stops after `max_passes`.
    pub fn resolve_fully(&self, doc: &mut Document) -> PassStats {
        let mut total = PassStats::default();
        for _ in 0..self.options.max_passes.max(1) {
            let stats = self.resolve(doc);
            total += stats;
            if stats.spliced == 0 {
                return total;
            }
        }
        info!(
            "`{}` still splicing after {} passes; stopping",
            doc.root_record().name(),
            total.passes
        );
        total
    }
}
