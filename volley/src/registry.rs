//! Process-wide benchmark registry.
//!
//! Benchmarks annotated with [`#[benchmark]`](volley_macros::benchmark) are collected at link
//! time into [`VOLLEY_BENCHMARKS`]. [`Registry::global`] builds the lookup table from them the
//! first time it is used and never changes it afterwards.
use crate::benchmark::Benchmark;
use lazy_static::lazy_static;
#[doc(hidden)]
pub use linkme::distributed_slice;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use volley_core::ConfigError;

pub type BenchmarkCtor = fn() -> Arc<dyn Benchmark>;

/// Constructors of every benchmark linked into the binary.
#[doc(hidden)]
#[distributed_slice]
pub static VOLLEY_BENCHMARKS: [BenchmarkCtor];

lazy_static! {
    static ref GLOBAL: Registry = match Registry::from_ctors(&VOLLEY_BENCHMARKS) {
        Ok(registry) => registry,
        Err(err) => panic!("Invalid benchmark registration: {err}"),
    };
}

#[derive(Default, Clone)]
pub struct Registry {
    benchmarks: BTreeMap<String, Arc<dyn Benchmark>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry of every linked benchmark.
    ///
    /// # Panics
    /// If two linked benchmarks share a name.
    pub fn global() -> &'static Registry {
        &*GLOBAL
    }

    pub fn from_ctors(ctors: &[BenchmarkCtor]) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for ctor in ctors {
            registry.register(ctor())?;
        }
        debug!("Registered benchmarks: {:?}", registry.names().collect::<Vec<_>>());
        Ok(registry)
    }

    pub fn register(&mut self, benchmark: Arc<dyn Benchmark>) -> Result<(), ConfigError> {
        let name = benchmark.name().to_string();
        if self.benchmarks.contains_key(&name) {
            return Err(ConfigError::DuplicateBenchmark(name));
        }
        self.benchmarks.insert(name, benchmark);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Benchmark>> {
        self.benchmarks.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.benchmarks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }

    /// Looks up `names` in order, dropping repeats.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Arc<dyn Benchmark>>, ConfigError> {
        let mut seen = HashSet::new();
        names
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| seen.insert(*name))
            .map(|name| {
                self.get(name)
                    .ok_or_else(|| ConfigError::UnknownBenchmark(name.to_string()))
            })
            .collect()
    }
}
