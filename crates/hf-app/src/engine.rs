//! Analysis engine: schematic registry, result cache and public operations.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use hf_analysis::{
    AnalysisSettings, ComparisonResult, FlowPathResult, OperatingPoint, PathComparison,
    RestrictionDetector, RestrictionReport, SchematicInfo, SchematicSummary, analyze_path,
    compare_paths, compare_schematics, flow_from_lpm, summarize,
};
use hf_graph::{
    Component, Diagnostic, FlowTracer, Impact, Relationship, SchematicBuilder, SchematicGraph,
    suggest,
};
use hf_results::{
    CacheKey, CacheStats, CachedResult, Operation, ResultCache, ResultStore, ResultsResult,
    params_digest,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::compile::EngineConfig;
use crate::error::{AppError, AppResult};
use crate::metrics::{EngineMetrics, MetricsSnapshot};

const SUGGESTION_LIMIT: usize = 3;

/// What a caller gets back from loading a schematic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchematicHandle {
    pub schematic_id: String,
    pub version: u64,
    pub component_count: usize,
    pub relationship_count: usize,
    pub diagnostics: Vec<Diagnostic>,
}

struct Registered {
    graph: Arc<SchematicGraph>,
    /// Digest of the schematic's content; keeps persisted results from
    /// another process apart when versions restart at 1.
    fingerprint: String,
}

/// Front door of the analysis core.
///
/// Holds the current version of every loaded schematic. Each operation grabs
/// an `Arc` snapshot of the graph it needs and works on it without holding
/// any lock, so a concurrent reload never affects an analysis in flight.
/// Results are memoised per `(schematic, version, operation, parameters)`.
pub struct AnalysisEngine {
    settings: AnalysisSettings,
    settings_digest: String,
    schematics: RwLock<HashMap<String, Registered>>,
    cache: ResultCache,
    store: Option<Arc<dyn ResultStore>>,
    metrics: EngineMetrics,
}

impl AnalysisEngine {
    pub fn new(config: EngineConfig) -> AppResult<Self> {
        config.settings.validate()?;
        Ok(Self {
            settings_digest: digest_or_empty(&config.settings),
            settings: config.settings,
            schematics: RwLock::new(HashMap::new()),
            cache: ResultCache::new(config.cache_ttl, config.cache_capacity),
            store: None,
            metrics: EngineMetrics::default(),
        })
    }

    /// Plug in a persistence collaborator.
    pub fn with_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.cache.stats())
    }

    fn registry(&self) -> RwLockReadGuard<'_, HashMap<String, Registered>> {
        self.schematics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn registry_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, Registered>> {
        self.schematics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Build and register a new version of a schematic.
    ///
    /// The first load is version 1; each reload of the same id gets the next
    /// version. The graph is built outside the registry lock and swapped in
    /// only if no other reload won the race in between; otherwise it is
    /// rebuilt on top of the winner's version.
    pub fn load_schematic(
        &self,
        schematic_id: &str,
        machine_name: &str,
        components: Vec<Component>,
        relationships: Vec<Relationship>,
    ) -> AppResult<SchematicHandle> {
        let fingerprint = digest_or_empty(&(machine_name, &components, &relationships));
        loop {
            let previous = self.registry().get(schematic_id).map(|r| r.graph.version());

            let mut builder = SchematicBuilder::new(schematic_id, machine_name);
            builder
                .version(previous.map_or(1, |v| v + 1))
                .extend_components(components.iter().cloned())
                .extend_relationships(relationships.iter().cloned());
            let graph = Arc::new(builder.build()?);

            let mut registry = self.registry_mut();
            if registry.get(schematic_id).map(|r| r.graph.version()) != previous {
                debug!(schematic = schematic_id, "concurrent reload, rebuilding");
                continue;
            }
            registry.insert(
                schematic_id.to_string(),
                Registered {
                    graph: Arc::clone(&graph),
                    fingerprint: fingerprint.clone(),
                },
            );
            drop(registry);

            if previous.is_some() {
                self.metrics.version_bumped();
                self.cache.purge_schematic(schematic_id, graph.version());
            }
            info!(
                schematic = schematic_id,
                version = graph.version(),
                components = graph.components().len(),
                relationships = graph.relationships().len(),
                "schematic loaded"
            );

            return Ok(SchematicHandle {
                schematic_id: schematic_id.to_string(),
                version: graph.version(),
                component_count: graph.components().len(),
                relationship_count: graph.relationships().len(),
                diagnostics: graph.diagnostics().to_vec(),
            });
        }
    }

    /// Current snapshot of a schematic.
    pub fn schematic(&self, schematic_id: &str) -> AppResult<Arc<SchematicGraph>> {
        self.entry(schematic_id).map(|(graph, _)| graph)
    }

    fn entry(&self, schematic_id: &str) -> AppResult<(Arc<SchematicGraph>, String)> {
        let registry = self.registry();
        match registry.get(schematic_id) {
            Some(r) => Ok((Arc::clone(&r.graph), r.fingerprint.clone())),
            None => Err(AppError::NotFound {
                what: "Schematic",
                id: schematic_id.to_string(),
                suggestions: suggest(
                    registry.keys().map(String::as_str),
                    schematic_id,
                    SUGGESTION_LIMIT,
                ),
            }),
        }
    }

    /// Every registered schematic, ordered by id.
    pub fn list_schematics(&self) -> Vec<SchematicInfo> {
        let mut out: Vec<SchematicInfo> = self
            .registry()
            .values()
            .map(|r| SchematicInfo::of(&r.graph))
            .collect();
        out.sort_by(|a, b| a.schematic_id.cmp(&b.schematic_id));
        out
    }

    pub fn analyze_schematic(&self, schematic_id: &str) -> AppResult<SchematicSummary> {
        let (graph, fingerprint) = self.entry(schematic_id)?;
        let key = self.key(&graph, &fingerprint, Operation::AnalyzeSchematic, &());
        let result = self.cached(key, || Ok(CachedResult::Summary(summarize(&graph))))?;
        match &*result {
            CachedResult::Summary(s) => Ok(s.clone()),
            other => Err(unexpected(Operation::AnalyzeSchematic, other)),
        }
    }

    /// Trace `start → end` and analyse it at the given flow (LPM) and system
    /// pressure (bar).
    pub fn find_flow_path(
        &self,
        schematic_id: &str,
        start: &str,
        end: &str,
        flow_lpm: f64,
        pressure_bar: f64,
    ) -> AppResult<FlowPathResult> {
        let op = OperatingPoint::new(flow_lpm, pressure_bar)?;
        self.find_flow_path_at(schematic_id, start, end, &op)
    }

    pub fn find_flow_path_at(
        &self,
        schematic_id: &str,
        start: &str,
        end: &str,
        op: &OperatingPoint,
    ) -> AppResult<FlowPathResult> {
        let (graph, fingerprint) = self.entry(schematic_id)?;
        let params = PathParams {
            start,
            end,
            flow_lpm: op.flow_lpm(),
            pressure_bar: op.pressure_bar(),
        };
        let key = self.key(&graph, &fingerprint, Operation::FindFlowPath, &params);
        let result = self.cached(key, || {
            let r = analyze_path(&graph, &self.settings, start, end, op)?;
            self.metrics.calculator_called();
            self.metrics.detector_called();
            Ok(CachedResult::FlowPath(r))
        })?;
        match &*result {
            CachedResult::FlowPath(r) => Ok(r.clone()),
            other => Err(unexpected(Operation::FindFlowPath, other)),
        }
    }

    /// Restrictions across the whole schematic at `flow_lpm`.
    pub fn analyze_restrictions(
        &self,
        schematic_id: &str,
        flow_lpm: f64,
    ) -> AppResult<RestrictionReport> {
        let flow = flow_from_lpm(flow_lpm)?;
        let (graph, fingerprint) = self.entry(schematic_id)?;
        let key = self.key(
            &graph,
            &fingerprint,
            Operation::AnalyzeRestrictions,
            &FlowParams { flow_lpm },
        );
        let result = self.cached(key, || {
            let report = RestrictionDetector::new(&self.settings).detect_schematic(&graph, flow)?;
            self.metrics.calculator_called();
            self.metrics.detector_called();
            Ok(CachedResult::Restrictions(report))
        })?;
        match &*result {
            CachedResult::Restrictions(r) => Ok(r.clone()),
            other => Err(unexpected(Operation::AnalyzeRestrictions, other)),
        }
    }

    /// Everything upstream and downstream of one component.
    pub fn get_component_impact(&self, schematic_id: &str, component_id: &str) -> AppResult<Impact> {
        let (graph, fingerprint) = self.entry(schematic_id)?;
        let key = self.key(
            &graph,
            &fingerprint,
            Operation::ComponentImpact,
            &ImpactParams { component_id },
        );
        let result = self.cached(key, || {
            let impact = FlowTracer::new(&graph, self.settings.trace_options()).impact(component_id)?;
            Ok(CachedResult::Impact(impact))
        })?;
        match &*result {
            CachedResult::Impact(i) => Ok(i.clone()),
            other => Err(unexpected(Operation::ComponentImpact, other)),
        }
    }

    /// Compare two schematics at the same flow rate.
    ///
    /// The result is cached under the first schematic; the second one's id,
    /// version and content go into the parameters, so reloading either side
    /// makes the entry unreachable.
    pub fn compare_machines(
        &self,
        first_id: &str,
        second_id: &str,
        flow_lpm: f64,
    ) -> AppResult<ComparisonResult> {
        let flow = flow_from_lpm(flow_lpm)?;
        let (first, first_fp) = self.entry(first_id)?;
        let (second, second_fp) = self.entry(second_id)?;
        let params = CompareParams {
            other_id: second_id,
            other_version: second.version(),
            other_content: &second_fp,
            flow_lpm,
        };
        let key = self.key(&first, &first_fp, Operation::CompareMachines, &params);
        let result = self.cached(key, || {
            let cmp = compare_schematics(&first, &second, &self.settings, flow)?;
            for _ in [&first, &second] {
                self.metrics.calculator_called();
                self.metrics.detector_called();
            }
            Ok(CachedResult::Comparison(cmp))
        })?;
        match &*result {
            CachedResult::Comparison(c) => Ok(c.clone()),
            other => Err(unexpected(Operation::CompareMachines, other)),
        }
    }

    /// Side-by-side comparison of two analysed paths.
    pub fn compare_flow_paths(&self, first: &FlowPathResult, second: &FlowPathResult) -> PathComparison {
        compare_paths(first, second)
    }

    fn key<P: Serialize>(
        &self,
        graph: &SchematicGraph,
        fingerprint: &str,
        operation: Operation,
        params: &P,
    ) -> ResultsResult<CacheKey> {
        CacheKey::new(
            graph.schematic_id(),
            graph.version(),
            operation,
            &(fingerprint, &self.settings_digest, params),
        )
    }

    /// Memory cache, then the store hook, then `compute`.
    ///
    /// Stored results older than the cache TTL are ignored, so an entry
    /// that expired in memory is recomputed rather than reloaded.
    ///
    /// Nothing here turns into a user-visible error except `compute`'s own:
    /// key or store failures are logged and the result is computed directly.
    fn cached(
        &self,
        key: ResultsResult<CacheKey>,
        compute: impl FnOnce() -> AppResult<CachedResult>,
    ) -> AppResult<Arc<CachedResult>> {
        let key = match key {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "cache key unavailable, computing uncached");
                return compute().map(Arc::new);
            }
        };
        self.cache.get_or_try_compute(key.clone(), || {
            if let Some(stored) = self.load_stored(&key) {
                return Ok(stored);
            }
            let result = compute()?;
            self.save_stored(&key, &result);
            Ok(result)
        })
    }

    fn load_stored(&self, key: &CacheKey) -> Option<CachedResult> {
        let store = self.store.as_ref()?;
        match store.load_cached(key, self.cache.ttl()) {
            Ok(Some(result)) if result.operation() == key.operation => {
                self.metrics.store_hit();
                debug!(key = %key, "result loaded from store");
                Some(result)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "result store lookup failed");
                None
            }
        }
    }

    fn save_stored(&self, key: &CacheKey, result: &CachedResult) {
        if let Some(store) = &self.store
            && let Err(e) = store.save(key, result)
        {
            warn!(key = %key, error = %e, "result store save failed");
        }
    }
}

#[derive(Serialize)]
struct PathParams<'a> {
    start: &'a str,
    end: &'a str,
    flow_lpm: f64,
    pressure_bar: f64,
}

#[derive(Serialize)]
struct FlowParams {
    flow_lpm: f64,
}

#[derive(Serialize)]
struct ImpactParams<'a> {
    component_id: &'a str,
}

#[derive(Serialize)]
struct CompareParams<'a> {
    other_id: &'a str,
    other_version: u64,
    other_content: &'a str,
    flow_lpm: f64,
}

fn digest_or_empty<T: Serialize + ?Sized>(value: &T) -> String {
    params_digest(value).unwrap_or_else(|e| {
        warn!(error = %e, "content digest unavailable");
        String::new()
    })
}

fn unexpected(expected: Operation, got: &CachedResult) -> AppError {
    AppError::Results(format!(
        "{} result found under a {expected} key",
        got.operation()
    ))
}
