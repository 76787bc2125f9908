//! Metrics collection and export for resource pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Point-in-time metrics for a pool
///
/// # Examples
///
/// ```
/// use esox_resourcepool::{FnFactory, PoolConfiguration, ResourcePool};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let pool = ResourcePool::new(FnFactory::new(|| 1), PoolConfiguration::new()).unwrap();
///
/// let resource = pool.acquire().await.unwrap();
/// let metrics = pool.metrics();
/// assert_eq!(metrics.total_acquired, 1);
/// assert_eq!(metrics.lended_resources, 1);
/// # pool.release(resource).unwrap();
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolMetrics {
    /// Total resources built by the factory
    pub total_created: usize,

    /// Total successful acquires
    pub total_acquired: usize,

    /// Total resources released back to the pool
    pub total_released: usize,

    /// Total resources destroyed (explicitly, after failed validation or on shutdown)
    pub total_destroyed: usize,

    /// Resources rejected by validation
    pub validation_failures: usize,

    /// Factory `create` failures
    pub factory_failures: usize,

    /// Acquires that timed out
    pub acquire_timeouts: usize,

    /// Acquires that were cancelled
    pub acquire_cancellations: usize,

    /// Acquires refused because too many callers were waiting
    pub backpressure_rejections: usize,

    /// Current number of live resources
    pub size: usize,

    /// Current idle resources
    pub idle_resources: usize,

    /// Current lended resources
    pub lended_resources: usize,

    /// Current waiting callers
    pub waiting_clients: usize,

    /// Pool utilization ratio (0.0 to 1.0)
    pub utilization: f64,

    /// Maximum number of live resources
    pub max_resources: usize,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_created".to_string(), self.total_created.to_string());
        metrics.insert("total_acquired".to_string(), self.total_acquired.to_string());
        metrics.insert("total_released".to_string(), self.total_released.to_string());
        metrics.insert("total_destroyed".to_string(), self.total_destroyed.to_string());
        metrics.insert("validation_failures".to_string(), self.validation_failures.to_string());
        metrics.insert("factory_failures".to_string(), self.factory_failures.to_string());
        metrics.insert("acquire_timeouts".to_string(), self.acquire_timeouts.to_string());
        metrics.insert("acquire_cancellations".to_string(), self.acquire_cancellations.to_string());
        metrics.insert("backpressure_rejections".to_string(), self.backpressure_rejections.to_string());
        metrics.insert("size".to_string(), self.size.to_string());
        metrics.insert("idle_resources".to_string(), self.idle_resources.to_string());
        metrics.insert("lended_resources".to_string(), self.lended_resources.to_string());
        metrics.insert("waiting_clients".to_string(), self.waiting_clients.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics.insert("max_resources".to_string(), self.max_resources.to_string());
        metrics
    }
}

/// Metrics exporter for Prometheus format
pub struct MetricsExporter;

impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_resourcepool::{MetricsExporter, PoolMetrics};
    /// use std::collections::HashMap;
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = MetricsExporter::export_prometheus(&PoolMetrics::default(), "db", Some(&tags));
    /// assert!(output.contains("resourcepool_resources_lended"));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let mut output = String::new();
        let labels = Self::format_labels(pool_name, tags);

        // Gauge metrics
        let gauges: [(&str, &str, String); 5] = [
            ("resourcepool_resources_total", "Current live resources", metrics.size.to_string()),
            ("resourcepool_resources_idle", "Current idle resources", metrics.idle_resources.to_string()),
            ("resourcepool_resources_lended", "Current lended resources", metrics.lended_resources.to_string()),
            ("resourcepool_clients_waiting", "Callers waiting in acquire", metrics.waiting_clients.to_string()),
            ("resourcepool_utilization", "Pool utilization ratio", format!("{:.2}", metrics.utilization)),
        ];
        for (name, help, value) in gauges {
            Self::push_sample(&mut output, name, help, "gauge", &labels, &value);
        }

        // Counter metrics
        let counters = [
            ("resourcepool_created_total", "Resources created by the factory", metrics.total_created),
            ("resourcepool_acquired_total", "Successful acquires", metrics.total_acquired),
            ("resourcepool_released_total", "Resources released", metrics.total_released),
            ("resourcepool_destroyed_total", "Resources destroyed", metrics.total_destroyed),
            ("resourcepool_validation_failures_total", "Validation failures", metrics.validation_failures),
            ("resourcepool_factory_failures_total", "Factory create failures", metrics.factory_failures),
            ("resourcepool_acquire_timeouts_total", "Acquire timeouts", metrics.acquire_timeouts),
            ("resourcepool_acquire_cancellations_total", "Acquire cancellations", metrics.acquire_cancellations),
            ("resourcepool_backpressure_rejections_total", "Acquires rejected by backpressure", metrics.backpressure_rejections),
        ];
        for (name, help, value) in counters {
            Self::push_sample(&mut output, name, help, "counter", &labels, &value.to_string());
        }

        output
    }

    fn push_sample(output: &mut String, name: &str, help: &str, kind: &str, labels: &str, value: &str) {
        output.push_str(&format!("# HELP {} {}\n", name, help));
        output.push_str(&format!("# TYPE {} {}\n", name, kind));
        output.push_str(&format!("{}{{{}}} {}\n", name, labels, value));
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", pool_name)];

        if let Some(tags) = tags {
            let mut tags: Vec<_> = tags.iter().collect();
            tags.sort();
            for (key, value) in tags {
                labels.push(format!("{}=\"{}\"", key, value));
            }
        }

        labels.join(",")
    }
}

/// Current registry gauges, sampled under the pool lock
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Gauges {
    pub size: usize,
    pub idle: usize,
    pub lended: usize,
    pub waiting: usize,
}

/// Internal metrics tracker
#[derive(Default)]
pub(crate) struct MetricsTracker {
    pub total_created: AtomicUsize,
    pub total_acquired: AtomicUsize,
    pub total_released: AtomicUsize,
    pub total_destroyed: AtomicUsize,
    pub validation_failures: AtomicUsize,
    pub factory_failures: AtomicUsize,
    pub acquire_timeouts: AtomicUsize,
    pub acquire_cancellations: AtomicUsize,
    pub backpressure_rejections: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self, gauges: Gauges, max_resources: usize) -> PoolMetrics {
        let utilization = if max_resources > 0 {
            gauges.lended as f64 / max_resources as f64
        } else {
            0.0
        };

        PoolMetrics {
            total_created: self.total_created.load(Ordering::Relaxed),
            total_acquired: self.total_acquired.load(Ordering::Relaxed),
            total_released: self.total_released.load(Ordering::Relaxed),
            total_destroyed: self.total_destroyed.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            factory_failures: self.factory_failures.load(Ordering::Relaxed),
            acquire_timeouts: self.acquire_timeouts.load(Ordering::Relaxed),
            acquire_cancellations: self.acquire_cancellations.load(Ordering::Relaxed),
            backpressure_rejections: self.backpressure_rejections.load(Ordering::Relaxed),
            size: gauges.size,
            idle_resources: gauges.idle,
            lended_resources: gauges.lended,
            waiting_clients: gauges.waiting,
            utilization,
            max_resources,
        }
    }
}
