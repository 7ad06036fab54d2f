//! Stat resolver module.
//!
//! Provides the `StatResolver` type, the entry point for computing final
//! stat values from a modifier store. It applies the fixed order of
//! operations (BASE, then INC, then MORE, with OVERRIDE short-circuiting),
//! folds in attribute bonuses, resolves the stats that conditions read, and
//! caches results until its owner invalidates them.

use crate::attributes::rules_for;
use crate::context::QueryContext;
use crate::flags::{KeywordFlags, ModFlags};
use crate::modifier::ModKind;
use crate::resolved::ResolvedStat;
use crate::stat_id::StatId;
use crate::store::ModDb;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

type CacheKey = (StatId, ModFlags, KeywordFlags);

/// Resolves stats against one modifier store.
///
/// The cache is keyed by `(stat, flags, keyword flags)` and is never
/// invalidated implicitly: after replacing the store or changing the
/// default context, call [`StatResolver::invalidate_all`].
///
/// # Examples
///
/// ```rust
/// use modcalc::*;
/// use std::sync::Arc;
///
/// let src = ModSource::new(SourceCategory::Item);
/// let mut db = ModDb::new();
/// db.add(Mod::new("Life", ModKind::Base, 100.0, src.clone()));
/// db.add(Mod::new("Life", ModKind::Inc, 0.5, src.clone()));
/// db.add(Mod::new("Life", ModKind::More, 0.1, src));
///
/// let mut resolver = StatResolver::new(Arc::new(db));
/// let life = resolver.resolve(&StatId::new("Life"), None, None);
/// assert!((life.value - 165.0).abs() < 1e-9); // 100 * 1.5 * 1.1
/// ```
pub struct StatResolver {
    store: Arc<ModDb>,

    /// Context used when a call does not override flags.
    defaults: QueryContext,

    /// Cache of resolved stats.
    cache: HashMap<CacheKey, ResolvedStat>,

    /// Keys currently being resolved, outermost first.
    stack: Vec<CacheKey>,

    /// Shallowest stack depth whose key was answered with a placeholder.
    /// Frames at or below it saw a partial value and are not cached.
    cycle_floor: Option<usize>,
}

impl StatResolver {
    /// Create a resolver with an empty default context.
    pub fn new(store: Arc<ModDb>) -> Self {
        Self {
            store,
            defaults: QueryContext::new(),
            cache: HashMap::new(),
            stack: Vec::new(),
            cycle_floor: None,
        }
    }

    /// Replace the default query context.
    pub fn with_context(mut self, context: QueryContext) -> Self {
        self.defaults = context;
        self
    }

    pub fn store(&self) -> &Arc<ModDb> {
        &self.store
    }

    pub fn context(&self) -> &QueryContext {
        &self.defaults
    }

    /// Swap the underlying store. Cached results are kept.
    pub fn replace_store(&mut self, store: Arc<ModDb>) {
        self.store = store;
    }

    /// Change a default condition. Cached results are kept.
    pub fn set_condition(&mut self, name: impl Into<String>, active: bool) {
        self.defaults.set_condition(name, active);
    }

    /// Pin a stat value in the default context. Cached results are kept.
    pub fn set_stat_value(&mut self, stat: impl Into<StatId>, value: f64) {
        self.defaults.set_stat_value(stat, value);
    }

    /// Resolve a stat.
    ///
    /// `flags` and `keyword_flags` override the default context's for this
    /// call. Circular dependencies resolve the repeated stat as zero, and
    /// nothing computed from that zero is cached, so the answer for a stat
    /// in a cycle does not depend on which stat was asked for first.
    ///
    /// # Arguments
    ///
    /// * `stat_id` - The stat to resolve
    /// * `flags` - Mod flags for this call, or `None` for the defaults
    /// * `keyword_flags` - Keyword flags for this call, or `None` for the defaults
    ///
    /// # Examples
    ///
    /// ```rust
    /// use modcalc::*;
    /// use std::sync::Arc;
    ///
    /// let src = ModSource::new(SourceCategory::Passive);
    /// let mut db = ModDb::new();
    /// db.add(Mod::new("Damage", ModKind::Base, 10.0, src.clone()));
    /// db.add(Mod::new("Damage", ModKind::Inc, 0.5, src).with_flags(ModFlags::SPELL));
    ///
    /// let mut resolver = StatResolver::new(Arc::new(db));
    /// let damage = StatId::new("Damage");
    /// assert_eq!(resolver.resolve(&damage, None, None).value, 10.0);
    /// assert_eq!(resolver.resolve(&damage, Some(ModFlags::SPELL), None).value, 15.0);
    /// ```
    pub fn resolve(
        &mut self,
        stat_id: &StatId,
        flags: Option<ModFlags>,
        keyword_flags: Option<KeywordFlags>,
    ) -> ResolvedStat {
        let flags = flags.unwrap_or(self.defaults.flags);
        let keyword_flags = keyword_flags.unwrap_or(self.defaults.keyword_flags);
        let key = (stat_id.clone(), flags, keyword_flags);

        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        if let Some(depth) = self.stack.iter().position(|k| *k == key) {
            debug!(stat = %stat_id, "circular stat dependency; using zero placeholder");
            self.cycle_floor = Some(self.cycle_floor.map_or(depth, |floor| floor.min(depth)));
            return ResolvedStat::new(stat_id.clone());
        }

        let depth = self.stack.len();
        self.stack.push(key.clone());
        let resolved = self.compute(stat_id, flags, keyword_flags);
        self.stack.pop();

        match self.cycle_floor {
            Some(floor) if floor <= depth => {
                if floor == depth {
                    self.cycle_floor = None;
                }
                trace!(stat = %stat_id, value = resolved.value, "resolved inside a cycle; not cached");
            }
            _ => {
                trace!(stat = %stat_id, value = resolved.value, "resolved stat");
                self.cache.insert(key, resolved.clone());
            }
        }
        resolved
    }

    /// Resolve several stats with the default flags.
    pub fn resolve_multiple(&mut self, stat_ids: &[StatId]) -> Vec<ResolvedStat> {
        stat_ids
            .iter()
            .map(|id| self.resolve(id, None, None))
            .collect()
    }

    /// Final value of a stat with the default flags.
    pub fn value(&mut self, stat: &str) -> f64 {
        self.resolve(&StatId::new(stat), None, None).value
    }

    /// Drop every cached result for `stat_id`, whatever the flags.
    pub fn invalidate(&mut self, stat_id: &StatId) {
        self.cache.retain(|(id, _, _), _| id != stat_id);
    }

    /// Drop all cached results.
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    /// The cached result for a key, if it has been resolved.
    pub fn cached(
        &self,
        stat_id: &StatId,
        flags: ModFlags,
        keyword_flags: KeywordFlags,
    ) -> Option<&ResolvedStat> {
        self.cache.get(&(stat_id.clone(), flags, keyword_flags))
    }

    fn compute(
        &mut self,
        stat_id: &StatId,
        flags: ModFlags,
        keyword_flags: KeywordFlags,
    ) -> ResolvedStat {
        let store = Arc::clone(&self.store);
        let mut ctx = self
            .defaults
            .clone()
            .with_flags(flags)
            .with_keyword_flags(keyword_flags);

        // Stats read by conditions on this stat's modifiers
        let mut dependencies: Vec<StatId> = Vec::new();
        for m in store.mods_for(stat_id) {
            if let Some(dep) = m.condition.as_ref().and_then(|c| c.referenced_stat()) {
                if !ctx.has_stat_value(dep) && !dependencies.contains(dep) {
                    dependencies.push(dep.clone());
                }
            }
        }
        for dep in dependencies {
            let value = self.resolve(&dep, None, None).value;
            ctx.set_stat_value(dep, value);
        }

        let mut resolved = ResolvedStat::new(stat_id.clone());

        let overrides = store.matching(ModKind::Override, stat_id, &ctx);
        if let Some((m, value)) = overrides.last() {
            resolved.add_source(m.source.to_string(), ModKind::Override, *value);
            resolved.override_value = Some(*value);
            resolved.value = *value;
            return resolved;
        }

        for (m, value) in store.matching(ModKind::Base, stat_id, &ctx) {
            resolved.add_source(m.source.to_string(), ModKind::Base, value);
            resolved.base += value;
        }
        for (m, value) in store.matching(ModKind::Inc, stat_id, &ctx) {
            resolved.add_source(m.source.to_string(), ModKind::Inc, value);
            resolved.inc += value;
        }

        for rule in rules_for(stat_id.as_str()) {
            if !rule.flags.applies_to(flags) {
                continue;
            }
            let attribute = self.resolve(&StatId::new(rule.source), None, None).value;
            let bonus = rule.contribution(attribute);
            if bonus == 0.0 {
                continue;
            }
            resolved.add_source(rule.source, rule.kind, bonus);
            match rule.kind {
                ModKind::Inc => resolved.inc += bonus,
                _ => resolved.base += bonus,
            }
        }

        for (m, value) in store.matching(ModKind::More, stat_id, &ctx) {
            resolved.add_source(m.source.to_string(), ModKind::More, value);
            resolved.more *= 1.0 + value;
        }

        resolved.value = resolved.base * (1.0 + resolved.inc) * resolved.more;
        resolved
    }
}
