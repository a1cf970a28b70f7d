//! Runtime library ("lualib") features.
//!
//! Lowered code calls small polyfill functions (`__TS__SparseArrayNew`, ...)
//! for behavior Lua lacks. Which features a file references is recorded on the
//! file; the text of each feature comes from an external [`LuaLibProvider`].
//!
//! # Caching
//!
//! Feature text depends only on the Lua target, so it is loaded once per
//! target into an immutable [`LuaLibBundle`] and shared across all files
//! (including files lowered in parallel) through [`LuaLibCache`].

use crate::options::LuaTarget;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LuaLibFeature {
    ArraySlice,
    ObjectAssign,
    ObjectRest,
    SourceMapTraceBack,
    SparseArrayNew,
    SparseArrayPush,
    SparseArraySpread,
    Unpack,
}

impl LuaLibFeature {
    pub const ALL: [LuaLibFeature; 8] = [
        LuaLibFeature::ArraySlice,
        LuaLibFeature::ObjectAssign,
        LuaLibFeature::ObjectRest,
        LuaLibFeature::SourceMapTraceBack,
        LuaLibFeature::SparseArrayNew,
        LuaLibFeature::SparseArrayPush,
        LuaLibFeature::SparseArraySpread,
        LuaLibFeature::Unpack,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LuaLibFeature::ArraySlice => "ArraySlice",
            LuaLibFeature::ObjectAssign => "ObjectAssign",
            LuaLibFeature::ObjectRest => "ObjectRest",
            LuaLibFeature::SourceMapTraceBack => "SourceMapTraceBack",
            LuaLibFeature::SparseArrayNew => "SparseArrayNew",
            LuaLibFeature::SparseArrayPush => "SparseArrayPush",
            LuaLibFeature::SparseArraySpread => "SparseArraySpread",
            LuaLibFeature::Unpack => "Unpack",
        }
    }

    /// Global name the feature exports, e.g. `__TS__Unpack`.
    pub fn export_name(self) -> String {
        format!("__TS__{}", self.name())
    }

    /// Features this feature calls at runtime.
    pub fn dependencies(self) -> &'static [LuaLibFeature] {
        match self {
            LuaLibFeature::SparseArraySpread => &[LuaLibFeature::Unpack],
            _ => &[],
        }
    }
}

/// Resolve the transitive dependency closure of `features`.
///
/// Dependencies come before their dependents; otherwise features keep
/// their `Ord` order so output is deterministic.
pub fn resolve_features(features: impl IntoIterator<Item = LuaLibFeature>) -> Vec<LuaLibFeature> {
    let mut requested: Vec<LuaLibFeature> = features.into_iter().collect();
    requested.sort();
    requested.dedup();

    let mut seen = FxHashSet::default();
    let mut ordered = Vec::new();
    for feature in requested {
        visit_feature(feature, &mut seen, &mut ordered);
    }
    ordered
}

fn visit_feature(
    feature: LuaLibFeature,
    seen: &mut FxHashSet<LuaLibFeature>,
    ordered: &mut Vec<LuaLibFeature>,
) {
    if !seen.insert(feature) {
        return;
    }
    for &dependency in feature.dependencies() {
        visit_feature(dependency, seen, ordered);
    }
    ordered.push(feature);
}

/// Source of lualib feature text for a given target.
pub trait LuaLibProvider: Send + Sync {
    /// Lua source defining `feature.export_name()`, or `None` if unavailable.
    fn feature_source(&self, feature: LuaLibFeature, target: LuaTarget) -> Option<String>;
}

/// Provider with no feature text. Inline imports emit nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyLuaLibProvider;

impl LuaLibProvider for EmptyLuaLibProvider {
    fn feature_source(&self, _feature: LuaLibFeature, _target: LuaTarget) -> Option<String> {
        None
    }
}

/// All feature text for one target. Immutable once built.
#[derive(Debug, Default)]
pub struct LuaLibBundle {
    target: LuaTarget,
    sources: BTreeMap<LuaLibFeature, Arc<str>>,
}

impl LuaLibBundle {
    pub fn build(target: LuaTarget, provider: &dyn LuaLibProvider) -> Self {
        let mut sources = BTreeMap::new();
        for feature in LuaLibFeature::ALL {
            if let Some(text) = provider.feature_source(feature, target) {
                sources.insert(feature, Arc::from(text));
            }
        }
        tracing::debug!(lua_target = %target, features = sources.len(), "built lualib bundle");
        LuaLibBundle { target, sources }
    }

    pub fn target(&self) -> LuaTarget {
        self.target
    }

    pub fn feature_source(&self, feature: LuaLibFeature) -> Option<&str> {
        self.sources.get(&feature).map(|s| &**s)
    }

    /// Concatenated text of `features` and their dependencies.
    pub fn inline_source(&self, features: impl IntoIterator<Item = LuaLibFeature>) -> String {
        let mut out = String::new();
        for feature in resolve_features(features) {
            if let Some(text) = self.feature_source(feature) {
                out.push_str(text);
                if !text.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
        out
    }
}

/// Per-target cache of built bundles, safe for concurrent readers.
#[derive(Default)]
pub struct LuaLibCache {
    bundles: DashMap<LuaTarget, Arc<LuaLibBundle>>,
}

static GLOBAL_CACHE: Lazy<LuaLibCache> = Lazy::new(LuaLibCache::new);

impl LuaLibCache {
    pub fn new() -> Self {
        LuaLibCache {
            bundles: DashMap::new(),
        }
    }

    /// Process-wide cache.
    pub fn global() -> &'static LuaLibCache {
        &GLOBAL_CACHE
    }

    /// Return the bundle for `target`, building it on first use.
    pub fn get_or_build(&self, target: LuaTarget, provider: &dyn LuaLibProvider) -> Arc<LuaLibBundle> {
        if let Some(bundle) = self.bundles.get(&target) {
            return Arc::clone(bundle.value());
        }
        let entry = self
            .bundles
            .entry(target)
            .or_insert_with(|| Arc::new(LuaLibBundle::build(target, provider)));
        Arc::clone(entry.value())
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

#[cfg(test)]
#[path = "../tests/lualib.rs"]
mod tests;
