use crate::analysis::{
    mark_clusters, BagOption, CentroidPicker, FingerprintOptions, KMostFrequentPicker,
    RepresentativeStrategy, RepresentativesPicker, SolutionMarksHolder,
};
use crate::ast::{CachedTreeBuilder, JsonTreeBuilder, TreeBuilder};
use crate::changes::{BasicChangeGenerator, ChangeGenerator, ChangesExtractor};
use crate::clustering::{Cluster, Clusterer, Clusters, MarkedClusters, SizeLimitedHac};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::hasher::Fingerprint;
use crate::metrics::{
    EditDistance, EditScale, FeatureDistance, FeaturedSolution, FingerprintDistance,
};
use crate::model::{Dataset, Identified, Solution};
use crate::progress::ProgressReporter;
use crate::selection::{CachedSelector, ClosestSelector, ReferencePool, ReferenceSelector, Unifier};
use crate::storage::CacheStore;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Threshold for clustering correct solutions, in edit operations.
pub const CORRECT_CLUSTERS_THRESHOLD: f64 = 100.0;

/// A solution left out of clustering, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairFailure {
    pub solution_id: i64,
    pub reason: String,
}

impl PairFailure {
    fn new(solution_id: i64, error: &Error) -> Self {
        Self {
            solution_id: error.solution_id().unwrap_or(solution_id),
            reason: error.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct ClusteringResult<V> {
    pub clusters: Clusters<V>,
    pub failures: Vec<PairFailure>,
    pub extract_duration: Duration,
    pub cluster_duration: Duration,
}

pub struct ClusteringEngine {
    config: AppConfig,
    builder: Arc<dyn TreeBuilder>,
    store: Option<Arc<CacheStore>>,
}

impl ClusteringEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            builder: Arc::new(CachedTreeBuilder::new(JsonTreeBuilder)),
            store: None,
        }
    }

    pub fn with_builder(mut self, builder: Arc<dyn TreeBuilder>) -> Self {
        self.builder = builder;
        self
    }

    /// Remembers selected references in `store` across runs.
    pub fn with_cache(mut self, store: Arc<CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn builder(&self) -> Arc<dyn TreeBuilder> {
        self.builder.clone()
    }

    fn generator(&self) -> Arc<dyn ChangeGenerator> {
        Arc::new(BasicChangeGenerator::new(self.builder.clone()).with_options(self.config.changes))
    }

    fn selector(&self) -> Arc<dyn ReferenceSelector> {
        let closest = ClosestSelector::new(
            EditDistance::new(self.builder.clone()).with_options(self.config.changes),
        );
        match &self.store {
            Some(store) => Arc::new(CachedSelector::with_index(
                closest,
                store.clone(),
                self.config.cache.index.clone(),
            )),
            None => Arc::new(closest),
        }
    }

    /// Deduplicated correct solutions of a dataset, with the correct
    /// solutions that could not be parsed.
    pub fn reference_pool(
        &self,
        dataset: &Dataset,
        reporter: &dyn ProgressReporter,
    ) -> (ReferencePool, Vec<PairFailure>) {
        let correct = dataset.correct();
        let (unified, rejected) = Unifier::new(self.builder.clone()).unify(&correct);
        reporter.on_unify_complete(correct.len(), unified.len());
        let failures = rejected
            .iter()
            .map(|(id, e)| PairFailure::new(*id, e))
            .collect();
        (ReferencePool::new(unified), failures)
    }

    pub fn extractor(
        &self,
        dataset: &Dataset,
        reporter: &dyn ProgressReporter,
    ) -> (ChangesExtractor, Vec<PairFailure>) {
        let (pool, failures) = self.reference_pool(dataset, reporter);
        let extractor = ChangesExtractor::new(self.generator(), self.selector(), pool);
        (extractor, failures)
    }

    /// Featurizes solutions in parallel. Failures are logged and collected,
    /// successes keep input order.
    fn featurize(
        &self,
        extractor: &ChangesExtractor,
        solutions: &[Solution],
        reporter: &dyn ProgressReporter,
    ) -> (Vec<FeaturedSolution>, Vec<PairFailure>) {
        let hasher = self.config.distance.hasher.change_hasher();
        let done = AtomicUsize::new(0);
        let total = solutions.len();

        let outcomes: Vec<Result<FeaturedSolution>> = solutions
            .par_iter()
            .map(|solution| {
                let outcome = extractor.featurize(solution, &hasher);
                reporter.on_extract_progress(done.fetch_add(1, Ordering::Relaxed) + 1, total);
                outcome
            })
            .collect();

        let mut featured = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (solution, outcome) in solutions.iter().zip(outcomes) {
            match outcome {
                Ok(value) => featured.push(value),
                Err(e) => {
                    warn!("Skipping solution {}: {}", solution.solution_id, e);
                    failures.push(PairFailure::new(solution.solution_id, &e));
                }
            }
        }
        (featured, failures)
    }

    fn flush_cache(&self) -> Result<()> {
        if let Some(store) = &self.store {
            store.flush()?;
        }
        Ok(())
    }

    fn cluster_featured(
        &self,
        featured: Vec<FeaturedSolution>,
        reporter: &dyn ProgressReporter,
    ) -> Result<(Clusters<FeaturedSolution>, Duration)> {
        let clustering = &self.config.clustering;
        info!(
            "Clustering {} solutions (threshold={:.2}, max size={}, {:?} linkage)...",
            featured.len(),
            clustering.threshold,
            clustering.max_cluster_size,
            clustering.linkage
        );
        reporter.on_cluster_start(featured.len());
        let start = Instant::now();
        let clusterer = SizeLimitedHac::new(
            clustering.threshold,
            clustering.max_cluster_size,
            FeatureDistance::new(self.config.distance.weights),
        )
        .with_linkage(clustering.linkage);
        let clusters = clusterer.build_clusters(featured)?;
        let duration = start.elapsed();
        reporter.on_cluster_complete(clusters.len(), duration.as_secs_f64());
        Ok((clusters, duration))
    }

    /// Clusters the incorrect solutions of one problem's dataset. A dataset
    /// spanning several problems gets one reference pool per problem.
    pub fn cluster_problem(
        &self,
        dataset: &Dataset,
        reporter: &dyn ProgressReporter,
    ) -> Result<ClusteringResult<FeaturedSolution>> {
        let problems = dataset.problems();
        if problems.len() > 1 {
            warn!(
                "Dataset spans {} problems, selecting references per problem",
                problems.len()
            );
            let datasets: Vec<Dataset> =
                problems.into_iter().map(|p| dataset.for_problem(p)).collect();
            return self.cluster_global(&datasets, reporter);
        }
        self.cluster_global(std::slice::from_ref(dataset), reporter)
    }

    /// Clusters incorrect solutions of several datasets together, each
    /// featurized against the correct solutions of its own dataset.
    pub fn cluster_global(
        &self,
        datasets: &[Dataset],
        reporter: &dyn ProgressReporter,
    ) -> Result<ClusteringResult<FeaturedSolution>> {
        let total: usize = datasets.iter().map(|d| d.incorrect().len()).sum();
        info!(
            "Extracting changes for {} incorrect solutions ({} hasher)...",
            total, self.config.distance.hasher
        );
        reporter.on_extract_start(total);
        let start = Instant::now();

        let mut featured = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for dataset in datasets {
            let (extractor, rejected) = self.extractor(dataset, reporter);
            failures.extend(rejected);
            debug!(
                "Reference pool {} holds {} solutions",
                extractor.pool().key(),
                extractor.pool().len()
            );
            let (values, errors) = self.featurize(&extractor, &dataset.incorrect(), reporter);
            featured.extend(values);
            failures.extend(errors);
        }
        self.flush_cache()?;
        let extract_duration = start.elapsed();
        reporter.on_extract_complete(
            featured.len(),
            failures.len(),
            extract_duration.as_secs_f64(),
        );
        debug!(
            "Extraction completed in {:.2}s: {} featurized, {} failed",
            extract_duration.as_secs_f64(),
            featured.len(),
            failures.len()
        );

        let (clusters, cluster_duration) = self.cluster_featured(featured, reporter)?;
        info!("Built {} clusters", clusters.len());
        Ok(ClusteringResult {
            clusters,
            failures,
            extract_duration,
            cluster_duration,
        })
    }

    /// Clusters a dataset's deduplicated correct solutions by raw edit count,
    /// capping clusters at the square root of the pool size.
    pub fn cluster_correct(
        &self,
        dataset: &Dataset,
        reporter: &dyn ProgressReporter,
    ) -> Result<ClusteringResult<Solution>> {
        let start = Instant::now();
        let (pool, failures) = self.reference_pool(dataset, reporter);
        let extract_duration = start.elapsed();

        let max_cluster_size = (pool.len() as f64).sqrt().round() as usize;
        info!(
            "Clustering {} correct solutions (threshold={}, max size={})...",
            pool.len(),
            CORRECT_CLUSTERS_THRESHOLD,
            max_cluster_size
        );
        reporter.on_cluster_start(pool.len());
        let start = Instant::now();
        let metric = EditDistance::new(self.builder.clone())
            .with_options(self.config.changes)
            .with_scale(EditScale::Count);
        let clusterer = SizeLimitedHac::new(CORRECT_CLUSTERS_THRESHOLD, max_cluster_size, metric)
            .with_linkage(self.config.clustering.linkage);
        let clusters = clusterer.build_clusters(pool.solutions().to_vec())?;
        let cluster_duration = start.elapsed();
        reporter.on_cluster_complete(clusters.len(), cluster_duration.as_secs_f64());

        Ok(ClusteringResult {
            clusters,
            failures,
            extract_duration,
            cluster_duration,
        })
    }

    pub fn mark<V: Identified + Clone>(
        &self,
        clusters: &Clusters<V>,
        marks: &SolutionMarksHolder,
    ) -> MarkedClusters<V, String> {
        mark_clusters(
            clusters,
            marks,
            self.config.marks.agreement,
            self.config.marks.top_clusters,
        )
    }

    /// Representative fingerprints of a cluster under the configured strategy.
    /// The centroid strategy yields the fingerprints of the most central bag.
    pub fn representatives(&self, cluster: &Cluster<FeaturedSolution>) -> Result<Vec<Fingerprint>> {
        match self.config.representatives.strategy {
            RepresentativeStrategy::KMostFrequent => {
                KMostFrequentPicker::new(FingerprintOptions, self.config.representatives.k)
                    .representatives(cluster)
            }
            RepresentativeStrategy::Centroid => {
                let picker = CentroidPicker::new(
                    FingerprintDistance::new(self.config.distance.weights),
                    BagOption,
                );
                Ok(picker
                    .representatives(cluster)?
                    .into_iter()
                    .flat_map(|bag| bag.fingerprints().cloned().collect::<Vec<_>>())
                    .collect())
            }
        }
    }
}
