// src/crawl/traverser.rs
// =============================================================================
// This module implements the crawl itself: a depth-bounded, concurrent walk
// over whatever graph a Fetcher describes.
//
// How it works (one tokio task per identifier):
// 1. If the depth budget is used up, stop.
// 2. Claim the identifier in the VisitedSet. Someone else got it first? Stop.
// 3. Fetch it. On error, record the failure and stop this branch only.
// 4. Record the content, then spawn one task per child with depth - 1.
//
// Knowing when we're done:
// - Every task is registered with the WorkCounter *before* it is spawned,
//   and its WorkGuard drops when it ends.
// - A parent registers its children while its own guard is still alive, so
//   the counter can only reach zero once the whole task tree has finished.
// - `traverse` just waits for that zero.
//
// Each call to `traverse` gets its own VisitedSet and WorkCounter, so one
// Traverser can run several crawls, even at the same time.
// =============================================================================

use super::counter::{WorkCounter, WorkGuard};
use super::options::{CancelHandle, CrawlOptions};
use super::record::{CrawlRecord, CrawlSummary};
use super::visited::VisitedSet;
use crate::fetch::{FetchError, Fetched, Fetcher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

pub type RecordSender<F> =
    mpsc::UnboundedSender<CrawlRecord<<F as Fetcher>::Id, <F as Fetcher>::Content>>;

pub struct Traverser<F: Fetcher> {
    fetcher: Arc<F>,
    records: RecordSender<F>,
    options: CrawlOptions,
}

// State shared by every task of one run
struct Run<F: Fetcher> {
    fetcher: Arc<F>,
    records: RecordSender<F>,
    visited: VisitedSet<F::Id>,
    work: Arc<WorkCounter>,
    permits: Option<Semaphore>,
    fetch_timeout: Option<Duration>,
    cancel: Option<CancelHandle>,
    fetched: AtomicUsize,
    failed: AtomicUsize,
}

impl<F: Fetcher> Traverser<F> {
    /// Every fetch of every run reports to `records`.
    pub fn new(fetcher: F, records: RecordSender<F>) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            records,
            options: CrawlOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CrawlOptions) -> Self {
        self.options = options;
        self
    }

    /// Crawls from `root`, fetching at most `max_depth` levels (the root is
    /// level 1), and returns once every spawned task has finished.
    ///
    /// Never fails: fetch errors go to the record channel.
    pub async fn traverse(&self, root: F::Id, max_depth: usize) -> CrawlSummary {
        if max_depth == 0 {
            debug!(?root, "max depth is 0, nothing to crawl");
            return CrawlSummary::default();
        }

        let permits = match self.options.max_concurrent_fetches {
            Some(limit) if limit > 0 => Some(Semaphore::new(limit)),
            _ => None,
        };
        let run = Arc::new(Run {
            fetcher: Arc::clone(&self.fetcher),
            records: self.records.clone(),
            visited: VisitedSet::new(),
            work: WorkCounter::new(),
            permits,
            fetch_timeout: self.options.fetch_timeout,
            cancel: self.options.cancel.clone(),
            fetched: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        });

        info!(?root, max_depth, "crawl started");
        let guard = run.work.register();
        spawn_visit(Arc::clone(&run), root, max_depth, guard);
        run.work.wait_idle().await;

        let summary = run.summary();
        info!(
            visited = summary.visited,
            fetched = summary.fetched,
            failed = summary.failed,
            "crawl finished"
        );
        summary
    }
}

impl<F: Fetcher> Run<F> {
    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelHandle::is_cancelled)
    }

    // Returns None when the run was cancelled while waiting for a permit
    async fn fetch(&self, id: &F::Id) -> Option<Result<Fetched<F::Id, F::Content>, FetchError>> {
        let _permit = match &self.permits {
            // The semaphore belongs to this run and nothing ever calls close()
            // on it, so acquire() cannot fail.
            Some(permits) => Some(
                permits
                    .acquire()
                    .await
                    .expect("run-local fetch semaphore is never closed"),
            ),
            None => None,
        };
        if self.is_cancelled() {
            return None;
        }

        let result = match self.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetcher.fetch(id))
                .await
                .unwrap_or(Err(FetchError::Timeout)),
            None => self.fetcher.fetch(id).await,
        };
        Some(result)
    }

    fn summary(&self) -> CrawlSummary {
        CrawlSummary {
            visited: self.visited.len(),
            fetched: self.fetched.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
        }
    }
}

// The guard is registered by the caller, before the task exists
fn spawn_visit<F: Fetcher>(run: Arc<Run<F>>, id: F::Id, depth: usize, guard: WorkGuard) {
    tokio::spawn(async move {
        let _guard = guard;
        visit(run, id, depth).await;
    });
}

async fn visit<F: Fetcher>(run: Arc<Run<F>>, id: F::Id, depth: usize) {
    if depth == 0 || run.is_cancelled() {
        return;
    }
    if run.visited.check_and_mark(&id) {
        debug!(?id, "already visited");
        return;
    }

    debug!(?id, depth, "fetching");
    let Some(result) = run.fetch(&id).await else {
        debug!(?id, "cancelled before fetch");
        return;
    };

    match result {
        Ok(Fetched { content, children }) => {
            run.fetched.fetch_add(1, Ordering::AcqRel);
            // A closed channel only means nobody is listening any more
            let _ = run.records.send(CrawlRecord::Fetched { id, content });

            // Children at depth 0 would return immediately, so don't spawn them
            if depth > 1 {
                for child in children {
                    let guard = run.work.register();
                    spawn_visit(Arc::clone(&run), child, depth - 1, guard);
                }
            }
        }
        Err(error) => {
            warn!(?id, %error, "fetch failed");
            run.failed.fetch_add(1, Ordering::AcqRel);
            let _ = run.records.send(CrawlRecord::Failed { id, error });
        }
    }
}

/// Runs one crawl and gathers every record it produced.
///
/// Convenient for callers that want all results at the end rather than a
/// live stream (the CLI, tests).
pub async fn collect<F: Fetcher>(
    fetcher: F,
    root: F::Id,
    max_depth: usize,
    options: CrawlOptions,
) -> (Vec<CrawlRecord<F::Id, F::Content>>, CrawlSummary) {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let traverser = Traverser::new(fetcher, sender).with_options(options);
    let summary = traverser.traverse(root, max_depth).await;
    // Once every sender is gone, recv() returns None
    drop(traverser);

    let mut records = Vec::new();
    while let Some(record) = receiver.recv().await {
        records.push(record);
    }
    (records, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MapFetcher;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // Wraps a MapFetcher, counts calls per id and tracks peak concurrency.
    // Fetch latency varies with the id so sibling tasks finish out of order.
    #[derive(Default)]
    struct CountingFetcher {
        site: MapFetcher,
        calls: Mutex<HashMap<String, usize>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        delay: Option<Duration>,
        delays: HashMap<String, Duration>,
    }

    impl CountingFetcher {
        fn new(site: MapFetcher) -> Self {
            Self {
                site,
                ..Self::default()
            }
        }

        fn slow(site: MapFetcher, delay: Duration) -> Self {
            Self {
                site,
                delay: Some(delay),
                ..Self::default()
            }
        }

        // Overrides the latency of one id
        fn with_delay(mut self, id: &str, delay: Duration) -> Self {
            self.delays.insert(id.to_string(), delay);
            self
        }
    }

    #[async_trait]
    impl Fetcher for Arc<CountingFetcher> {
        type Id = String;
        type Content = String;

        async fn fetch(&self, id: &String) -> Result<Fetched<String, String>, FetchError> {
            *self.calls.lock().unwrap().entry(id.clone()).or_default() += 1;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let delay = self
                .delays
                .get(id)
                .copied()
                .or(self.delay)
                .unwrap_or_else(|| Duration::from_millis((id.len() % 5) as u64));
            tokio::time::sleep(delay).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.site.fetch(id).await
        }
    }

    fn calls(fetcher: &CountingFetcher) -> HashMap<String, usize> {
        fetcher.calls.lock().unwrap().clone()
    }

    fn ids(records: &[CrawlRecord<String, String>]) -> Vec<String> {
        let mut ids: Vec<String> = records.iter().map(|r| r.id().clone()).collect();
        ids.sort();
        ids
    }

    // A->{B, C}, B->{A, C}, C->{}
    fn triangle() -> MapFetcher {
        MapFetcher::new()
            .with_page("A", "a", &["B", "C"])
            .with_page("B", "b", &["A", "C"])
            .with_page("C", "c", &[])
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cycle_each_fetched_once() {
        let fetcher = Arc::new(CountingFetcher::new(triangle()));
        let (records, summary) =
            collect(Arc::clone(&fetcher), "A".to_string(), 3, CrawlOptions::new()).await;

        assert_eq!(ids(&records), vec!["A", "B", "C"]);
        assert!(records.iter().all(CrawlRecord::is_ok));
        assert_eq!(
            calls(&fetcher),
            HashMap::from([
                ("A".to_string(), 1),
                ("B".to_string(), 1),
                ("C".to_string(), 1)
            ])
        );
        assert_eq!(
            summary,
            CrawlSummary {
                visited: 3,
                fetched: 3,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn test_zero_depth_fetches_nothing() {
        let fetcher = Arc::new(CountingFetcher::new(MapFetcher::new().with_page("A", "a", &["B"])));
        let (records, summary) =
            collect(Arc::clone(&fetcher), "A".to_string(), 0, CrawlOptions::new()).await;

        assert!(records.is_empty());
        assert!(calls(&fetcher).is_empty());
        assert_eq!(summary, CrawlSummary::default());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failure_is_isolated() {
        // B is missing from the map, so fetching it fails
        let site = MapFetcher::new()
            .with_page("A", "a", &["B", "C"])
            .with_page("C", "c", &["D"])
            .with_page("D", "d", &[]);
        let (records, summary) = collect(site, "A".to_string(), 5, CrawlOptions::new()).await;

        let mut outcomes: Vec<(String, bool)> = records
            .iter()
            .map(|r| (r.id().clone(), r.is_ok()))
            .collect();
        outcomes.sort();
        assert_eq!(
            outcomes,
            vec![
                ("A".to_string(), true),
                ("B".to_string(), false),
                ("C".to_string(), true),
                ("D".to_string(), true),
            ]
        );
        assert!(records.contains(&CrawlRecord::Failed {
            id: "B".to_string(),
            error: FetchError::NotFound("B".to_string()),
        }));
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.fetched, 3);
    }

    #[tokio::test]
    async fn test_depth_limit() {
        // A chain: A -> B -> C -> D -> E
        let site = MapFetcher::new()
            .with_page("A", "a", &["B"])
            .with_page("B", "b", &["C"])
            .with_page("C", "c", &["D"])
            .with_page("D", "d", &["E"])
            .with_page("E", "e", &[]);

        let fetcher = Arc::new(CountingFetcher::new(site));
        let (records, _) =
            collect(Arc::clone(&fetcher), "A".to_string(), 3, CrawlOptions::new()).await;

        // C is the third level: fetched, but its child D is never tried
        assert_eq!(ids(&records), vec!["A", "B", "C"]);
        assert!(!calls(&fetcher).contains_key("D"));
    }

    #[tokio::test]
    async fn test_depth_one_fetches_root_only() {
        let (records, summary) =
            collect(triangle(), "A".to_string(), 1, CrawlOptions::new()).await;
        assert_eq!(ids(&records), vec!["A"]);
        assert_eq!(summary.visited, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_self_link_and_duplicates() {
        let site = MapFetcher::new()
            .with_page("A", "a", &["A", "B", "B", "A", "B"])
            .with_page("B", "b", &["B"]);
        let fetcher = Arc::new(CountingFetcher::new(site));
        let (records, _) =
            collect(Arc::clone(&fetcher), "A".to_string(), 10, CrawlOptions::new()).await;

        assert_eq!(ids(&records), vec!["A", "B"]);
        assert!(calls(&fetcher).values().all(|&n| n == 1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_dense_graph_dedup() {
        // 40 nodes, each linking to every node: maximum contention on the
        // visited set, every node still fetched exactly once
        let names: Vec<String> = (0..40).map(|n| format!("n{n}")).collect();
        let links: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut site = MapFetcher::new();
        for name in &names {
            site.insert(name.as_str(), "page", &links);
        }

        let fetcher = Arc::new(CountingFetcher::new(site));
        let (records, summary) =
            collect(Arc::clone(&fetcher), "n0".to_string(), 4, CrawlOptions::new()).await;

        assert_eq!(records.len(), 40);
        assert_eq!(summary.visited, 40);
        let calls = calls(&fetcher);
        assert_eq!(calls.len(), 40);
        assert!(calls.values().all(|&n| n == 1));
    }

    #[tokio::test]
    async fn test_sample_site() {
        let (records, summary) = collect(
            MapFetcher::sample_site(),
            "https://golang.org/".to_string(),
            4,
            CrawlOptions::new(),
        )
        .await;

        assert_eq!(
            ids(&records),
            vec![
                "https://golang.org/",
                "https://golang.org/cmd/",
                "https://golang.org/pkg/",
                "https://golang.org/pkg/fmt/",
                "https://golang.org/pkg/os/",
            ]
        );
        assert_eq!(summary.fetched, 4);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_limit() {
        let names: Vec<String> = (0..12).map(|n| format!("leaf{n}")).collect();
        let links: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut site = MapFetcher::new().with_page("root", "root", &links);
        for name in &names {
            site.insert(name.as_str(), "leaf", &["root"]);
        }

        let fetcher = Arc::new(CountingFetcher::slow(site, Duration::from_millis(10)));
        let options = CrawlOptions::new().with_max_concurrent_fetches(2);
        let (records, _) = collect(Arc::clone(&fetcher), "root".to_string(), 3, options).await;

        assert_eq!(records.len(), 13);
        assert!(fetcher.peak.load(Ordering::SeqCst) <= 2);
        assert!(calls(&fetcher).values().all(|&n| n == 1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_fetch_at_a_time() {
        let names: Vec<String> = (0..6).map(|n| format!("leaf{n}")).collect();
        let links: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut site = MapFetcher::new().with_page("root", "root", &links);
        for name in &names {
            site.insert(name.as_str(), "leaf", &["root", "leaf0"]);
        }

        let fetcher = Arc::new(CountingFetcher::slow(site, Duration::from_millis(10)));
        let options = CrawlOptions::new().with_max_concurrent_fetches(1);
        let (records, summary) =
            collect(Arc::clone(&fetcher), "root".to_string(), 3, options).await;

        assert_eq!(records.len(), 7);
        assert_eq!(summary.fetched, 7);
        assert_eq!(fetcher.peak.load(Ordering::SeqCst), 1);
        assert!(calls(&fetcher).values().all(|&n| n == 1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_first_claim_keeps_its_depth_budget() {
        // A->{P, Q}, P->{C}, Q->{R}, R->{C}, C->{E}
        //
        // P is slow, so C is first reached through A->Q->R->C with one level
        // left. It is fetched there and its child E is not explored. The later
        // arrival through P has budget to spare, but C is already claimed, so E
        // is never fetched even though it is only three hops from A.
        let site = MapFetcher::new()
            .with_page("A", "a", &["P", "Q"])
            .with_page("P", "p", &["C"])
            .with_page("Q", "q", &["R"])
            .with_page("R", "r", &["C"])
            .with_page("C", "c", &["E"])
            .with_page("E", "e", &[]);
        let fetcher =
            Arc::new(CountingFetcher::new(site).with_delay("P", Duration::from_millis(100)));

        let (records, summary) =
            collect(Arc::clone(&fetcher), "A".to_string(), 4, CrawlOptions::new()).await;

        assert_eq!(ids(&records), vec!["A", "C", "P", "Q", "R"]);
        assert!(!calls(&fetcher).contains_key("E"));
        assert_eq!(calls(&fetcher).get("C"), Some(&1));
        assert_eq!(summary.visited, 5);
    }

    #[tokio::test]
    async fn test_unbounded_runs_siblings_in_parallel() {
        let names: Vec<String> = (0..8).map(|n| format!("leaf{n}")).collect();
        let links: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut site = MapFetcher::new().with_page("root", "root", &links);
        for name in &names {
            site.insert(name.as_str(), "leaf", &[]);
        }

        let fetcher = Arc::new(CountingFetcher::slow(site, Duration::from_millis(50)));
        collect(Arc::clone(&fetcher), "root".to_string(), 2, CrawlOptions::new()).await;

        assert!(fetcher.peak.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_recorded() {
        let fetcher = Arc::new(CountingFetcher::slow(triangle(), Duration::from_secs(10)));
        let options = CrawlOptions::new().with_fetch_timeout(Duration::from_millis(20));
        let (records, summary) = collect(fetcher, "A".to_string(), 3, options).await;

        assert_eq!(
            records,
            vec![CrawlRecord::Failed {
                id: "A".to_string(),
                error: FetchError::Timeout,
            }]
        );
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancelHandle::new();
        cancel.cancel();

        let fetcher = Arc::new(CountingFetcher::new(triangle()));
        let options = CrawlOptions::new().with_cancel(cancel);
        let (records, _) = collect(Arc::clone(&fetcher), "A".to_string(), 3, options).await;

        assert!(records.is_empty());
        assert!(calls(&fetcher).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cancel_mid_crawl_still_returns() {
        // An endless chain: without cancellation this would run for a long time
        let mut site = MapFetcher::new();
        let names: Vec<String> = (0..10_000).map(|n| format!("p{n}")).collect();
        for pair in names.windows(2) {
            site.insert(pair[0].as_str(), "page", &[pair[1].as_str()]);
        }

        let cancel = CancelHandle::new();
        let fetcher = Arc::new(CountingFetcher::slow(site, Duration::from_millis(5)));
        let options = CrawlOptions::new().with_cancel(cancel.clone());

        let crawl = tokio::spawn(collect(Arc::clone(&fetcher), "p0".to_string(), 10_000, options));
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        let (records, _) = tokio::time::timeout(Duration::from_secs(5), crawl)
            .await
            .expect("cancelled crawl should return")
            .unwrap();
        assert!(!records.is_empty());
        assert!(records.len() < 9_999);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_independent_runs_share_nothing() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let traverser = Traverser::new(triangle(), sender);

        let (first, second) = tokio::join!(
            traverser.traverse("A".to_string(), 3),
            traverser.traverse("A".to_string(), 3)
        );
        drop(traverser);

        assert_eq!(first.fetched, 3);
        assert_eq!(second.fetched, 3);
        let mut count = 0;
        while receiver.recv().await.is_some() {
            count += 1;
        }
        assert_eq!(count, 6);
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_stall() {
        let (sender, receiver) = mpsc::unbounded_channel();
        drop(receiver);

        let traverser = Traverser::new(triangle(), sender);
        let summary = traverser.traverse("A".to_string(), 3).await;
        assert_eq!(summary.fetched, 3);
    }
}
