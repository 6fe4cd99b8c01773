//! Function wrappers that update a declared metric
//!
//! A [`Decorator`] is what `MetricBuilder::build` returns. On an immediate
//! decorator the `wrap*` methods take a function value and hand back a
//! closure with the same signature that times each call and applies the
//! update rule to the elapsed seconds. On a deferred decorator
//! [`defer`](Decorator::defer) adds the function to the exporter's deferred
//! set and the returned closure just forwards.

use std::any::TypeId;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use super::deferred::{CollectorFn, CollectorKey, DeferredSet};
use super::sample::IntoSample;
use crate::errors::{ExporterError, Result};
use crate::metrics::{MetricHandle, UpdateRule};

/// A declared metric plus the rule used to update it.
#[derive(Clone)]
pub struct Decorator {
    id: u64,
    name: String,
    metric: MetricHandle,
    rule: UpdateRule,
    deferred: bool,
    collectors: Arc<DeferredSet>,
}

impl Decorator {
    pub(crate) fn new(
        name: &str,
        metric: MetricHandle,
        rule: UpdateRule,
        deferred: bool,
        collectors: Arc<DeferredSet>,
    ) -> Self {
        Self {
            id: collectors.next_owner(),
            name: name.to_string(),
            metric,
            rule,
            deferred,
            collectors,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The label-bound metric this decorator updates
    pub fn metric(&self) -> &MetricHandle {
        &self.metric
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// Apply the update rule to `value` directly.
    ///
    /// For work that cannot be wrapped as a plain function, such as a
    /// future timed by the caller.
    pub fn record(&self, value: f64) {
        self.rule.apply(&self.metric, value);
    }

    /// Wrap a function taking no arguments. Its return value can be
    /// anything; only the call is measured.
    ///
    /// Each call is timed and the rule receives the elapsed seconds. A panic
    /// in `f` unwinds before the update. Fails with `InvalidConfiguration`
    /// on a deferred decorator, use [`defer`](Self::defer) there.
    pub fn wrap<F, R>(
        &self,
        f: F,
    ) -> Result<impl Fn() -> R + Clone + Send + Sync + 'static + use<F, R>>
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: 'static,
    {
        let (metric, rule) = self.immediate_only("wrap")?;
        let f = Arc::new(f);

        Ok(move || {
            let start = Instant::now();
            let result = f();
            rule.apply(&metric, elapsed_secs(start));
            result
        })
    }

    /// Like [`wrap`](Self::wrap) for fallible functions: an `Err` is passed
    /// back unchanged and the metric is not updated.
    pub fn try_wrap<F, T, E>(
        &self,
        f: F,
    ) -> Result<impl Fn() -> std::result::Result<T, E> + Clone + Send + Sync + 'static + use<F, T, E>>
    where
        F: Fn() -> std::result::Result<T, E> + Send + Sync + 'static,
        T: 'static,
        E: 'static,
    {
        let (metric, rule) = self.immediate_only("try_wrap")?;
        let f = Arc::new(f);

        Ok(move || {
            let start = Instant::now();
            let result = f()?;
            rule.apply(&metric, elapsed_secs(start));
            Ok(result)
        })
    }

    /// Wrap a function taking one argument (a tuple for several).
    ///
    /// Immediate decorators only: deferred functions are called with no
    /// arguments, so a deferred decorator fails with `InvalidConfiguration`.
    pub fn wrap_with<F, A, R>(
        &self,
        f: F,
    ) -> Result<impl Fn(A) -> R + Clone + Send + Sync + 'static + use<F, A, R>>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
        A: 'static,
        R: 'static,
    {
        let (metric, rule) = self.immediate_only("wrap_with")?;
        let f = Arc::new(f);

        Ok(move |arg: A| {
            let start = Instant::now();
            let result = f(arg);
            rule.apply(&metric, elapsed_secs(start));
            result
        })
    }

    /// Fallible counterpart of [`wrap_with`](Self::wrap_with); an `Err`
    /// leaves the metric untouched.
    pub fn try_wrap_with<F, A, T, E>(
        &self,
        f: F,
    ) -> Result<
        impl Fn(A) -> std::result::Result<T, E> + Clone + Send + Sync + 'static + use<F, A, T, E>,
    >
    where
        F: Fn(A) -> std::result::Result<T, E> + Send + Sync + 'static,
        A: 'static,
        T: 'static,
        E: 'static,
    {
        let (metric, rule) = self.immediate_only("try_wrap_with")?;
        let f = Arc::new(f);

        Ok(move |arg: A| {
            let start = Instant::now();
            let result = f(arg)?;
            rule.apply(&metric, elapsed_secs(start));
            Ok(result)
        })
    }

    /// Register a function to be evaluated at snapshot time.
    ///
    /// The result is coerced with [`IntoSample`] on every snapshot; a
    /// `Result` return fails the snapshot with `CollectorFailed` on `Err`.
    /// The returned closure calls `f` without touching the metric.
    ///
    /// Deferring the same function item or non-capturing closure twice on
    /// one decorator registers it once. A capturing closure has no identity
    /// beyond its captures, so each call adds a new entry. Fails with
    /// `InvalidConfiguration` on an immediate decorator.
    pub fn defer<F, R>(
        &self,
        f: F,
    ) -> Result<impl Fn() -> R + Clone + Send + Sync + 'static + use<F, R>>
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoSample + 'static,
    {
        if !self.deferred {
            return Err(ExporterError::invalid_configuration(format!(
                "metric '{}' is not deferred, wrap its functions with `wrap`",
                self.name
            )));
        }

        let f = Arc::new(f);
        let target = Arc::clone(&f);
        let key = (std::mem::size_of::<F>() == 0)
            .then(|| CollectorKey::new(self.id, TypeId::of::<F>()));
        self.register(key, Arc::new(move || target().into_sample()));

        Ok(move || f())
    }

    fn register(&self, key: Option<CollectorKey>, collector: Arc<CollectorFn>) {
        let rule = self.rule.clone();
        let metric = self.metric.clone();
        let id = match key {
            Some(key) => self.collectors.add_once(key, &self.name, collector, rule, metric),
            None => self.collectors.add(&self.name, collector, rule, metric),
        };
        debug!("Deferred collector #{} registered for '{}'", id, self.name);
    }

    fn immediate_only(&self, method: &str) -> Result<(MetricHandle, UpdateRule)> {
        if self.deferred {
            return Err(ExporterError::invalid_configuration(format!(
                "deferred metric '{}' cannot `{}` functions, register them with `defer`",
                self.name, method
            )));
        }
        debug!("Wrapped function with {} metric '{}'", self.metric.kind(), self.name);
        Ok((self.metric.clone(), self.rule.clone()))
    }
}

impl std::fmt::Debug for Decorator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decorator")
            .field("name", &self.name)
            .field("kind", &self.metric.kind())
            .field("deferred", &self.deferred)
            .finish()
    }
}

fn elapsed_secs(start: Instant) -> f64 {
    start.elapsed().as_secs_f64().max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Counter, Gauge, Histogram, HistogramOpts};

    fn decorator(metric: MetricHandle, deferred: bool) -> (Decorator, Arc<DeferredSet>) {
        let set = Arc::new(DeferredSet::new());
        let d = Decorator::new("test", metric, UpdateRule::default(), deferred, Arc::clone(&set));
        (d, set)
    }

    fn sample_depth() -> u32 {
        3
    }

    #[test]
    fn test_immediate_counter_counts_calls() {
        let counter = MetricHandle::Counter(Counter::new("calls", "calls").unwrap());
        let (d, set) = decorator(counter.clone(), false);
        let double = d.wrap(|| 21 * 2).unwrap();

        for _ in 0..5 {
            assert_eq!(double(), 42);
        }
        assert_eq!(counter.as_counter().unwrap().get(), 5.0);
        assert!(set.is_empty());
    }

    #[test]
    fn test_wrap_accepts_any_return_type() {
        struct Report {
            lines: Vec<String>,
        }

        let counter = MetricHandle::Counter(Counter::new("reports", "reports").unwrap());
        let (d, _) = decorator(counter.clone(), false);
        let unit = d.wrap(|| {}).unwrap();
        let report = d
            .wrap(|| Report {
                lines: vec!["a".to_string()],
            })
            .unwrap();

        unit();
        assert_eq!(report().lines.len(), 1);
        assert_eq!(counter.as_counter().unwrap().get(), 2.0);
    }

    #[test]
    fn test_immediate_gauge_gets_elapsed_time() {
        let gauge = MetricHandle::Gauge(Gauge::new("last_seconds", "last").unwrap());
        let (d, _) = decorator(gauge.clone(), false);
        let wrapped = d
            .wrap(|| {
                std::thread::sleep(std::time::Duration::from_millis(5));
                true
            })
            .unwrap();

        assert!(wrapped());
        assert!(gauge.as_gauge().unwrap().get() >= 0.005);
    }

    #[test]
    fn test_try_wrap_error_skips_update() {
        let histogram = MetricHandle::Histogram(
            Histogram::with_opts(HistogramOpts::new("work_seconds", "work")).unwrap(),
        );
        let (d, _) = decorator(histogram.clone(), false);
        let fails = d.try_wrap(|| Err::<(), String>("boom".to_string())).unwrap();
        let works = d.try_wrap(|| Ok::<Vec<u8>, String>(vec![1])).unwrap();

        assert_eq!(fails().unwrap_err(), "boom");
        assert_eq!(histogram.as_histogram().unwrap().get_sample_count(), 0);
        assert_eq!(works().unwrap(), vec![1]);
        assert_eq!(histogram.as_histogram().unwrap().get_sample_count(), 1);
    }

    #[test]
    fn test_defer_registers_and_forwards() {
        let gauge = MetricHandle::Gauge(Gauge::new("queue", "queue").unwrap());
        let (d, set) = decorator(gauge.clone(), true);
        let wrapped = d.defer(|| 7u32).unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(wrapped(), 7);
        assert_eq!(gauge.as_gauge().unwrap().get(), 0.0);

        set.evaluate().unwrap();
        assert_eq!(gauge.as_gauge().unwrap().get(), 7.0);
    }

    #[test]
    fn test_defer_same_function_once() {
        let counter = MetricHandle::Counter(Counter::new("depth_polls", "polls").unwrap());
        let (d, set) = decorator(counter.clone(), true);
        let copy = d.clone();

        d.defer(sample_depth).unwrap();
        d.defer(sample_depth).unwrap();
        copy.defer(sample_depth).unwrap();
        assert_eq!(set.len(), 1);

        set.evaluate().unwrap();
        assert_eq!(counter.as_counter().unwrap().get(), 1.0);
    }

    #[test]
    fn test_defer_capturing_closures_are_distinct() {
        let gauge = MetricHandle::Gauge(Gauge::new("shard", "shard").unwrap());
        let (d, set) = decorator(gauge, true);
        for shard in 0..3u32 {
            d.defer(move || shard).unwrap();
        }
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_defer_same_function_on_other_decorator() {
        let set = Arc::new(DeferredSet::new());
        let first = Decorator::new(
            "first",
            MetricHandle::Gauge(Gauge::new("first", "first").unwrap()),
            UpdateRule::default(),
            true,
            Arc::clone(&set),
        );
        let second = Decorator::new(
            "second",
            MetricHandle::Gauge(Gauge::new("second", "second").unwrap()),
            UpdateRule::default(),
            true,
            Arc::clone(&set),
        );

        first.defer(sample_depth).unwrap();
        second.defer(sample_depth).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_wrap_with_arguments() {
        let counter = MetricHandle::Counter(Counter::new("adds", "adds").unwrap());
        let (d, _) = decorator(counter.clone(), false);
        let add = d.wrap_with(|(a, b): (i32, i32)| a + b).unwrap();

        assert_eq!(add((2, 3)), 5);
        assert_eq!(counter.as_counter().unwrap().get(), 1.0);

        let parse = d
            .try_wrap_with(|s: &'static str| s.parse::<i32>())
            .unwrap();
        assert!(parse("x").is_err());
        assert_eq!(counter.as_counter().unwrap().get(), 1.0);
        assert_eq!(parse("4").unwrap(), 4);
        assert_eq!(counter.as_counter().unwrap().get(), 2.0);
    }

    #[test]
    fn test_mode_mismatch_rejected() {
        let gauge = MetricHandle::Gauge(Gauge::new("g", "g").unwrap());
        let (deferred, set) = decorator(gauge.clone(), true);

        let err = deferred.wrap_with(|x: i32| x).err().unwrap();
        assert!(matches!(err, ExporterError::InvalidConfiguration(_)));
        let err = deferred.wrap(|| ()).err().unwrap();
        assert!(matches!(err, ExporterError::InvalidConfiguration(_)));
        assert!(set.is_empty());

        let (immediate, set) = decorator(gauge, false);
        let err = immediate.defer(|| 1.0).err().unwrap();
        assert!(matches!(err, ExporterError::InvalidConfiguration(_)));
        assert!(set.is_empty());
    }

    #[test]
    fn test_wrappers_compose() {
        let inner = MetricHandle::Counter(Counter::new("inner", "inner").unwrap());
        let outer = MetricHandle::Gauge(Gauge::new("outer", "outer").unwrap());
        let (inner_d, _) = decorator(inner.clone(), false);
        let (outer_d, _) = decorator(outer.clone(), false);

        let wrapped = outer_d.wrap(inner_d.wrap(|| 1.0).unwrap()).unwrap();
        wrapped();
        wrapped();
        assert_eq!(inner.as_counter().unwrap().get(), 2.0);
        assert!(outer.as_gauge().unwrap().get() >= 0.0);
    }
}
