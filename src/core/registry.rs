//! # Listener registry - four ordered groups of listeners.
//!
//! The registry maps keys to ordered listener lists in four independent
//! groups (see [`Group`]). It never invokes listeners; the dispatcher takes
//! snapshots out of it and runs them with the registry lock released.
//!
//! ## Architecture
//! ```text
//! register(spec, l, once)
//!     └─► PatternCompiler::compile(spec)
//!           ├─► literal ─► Exact / ExactOnce        [name  → [l1, l2, ...]]
//!           └─► pattern ─► Pattern / PatternOnce    [/re/  → (matcher, [l1, ...])]
//! ```
//!
//! ## Rules
//! - Insertion order is invocation order, both for keys and for listeners.
//! - An entry whose listener list becomes empty is removed.
//! - Removal and listing route a spec to the groups it registers into:
//!   literal specs to the exact groups, pattern specs (by compiled key) to the
//!   pattern groups.
//! - A literal spec never addresses a pattern key: `remove_listener("/x/", l)`
//!   leaves a listener registered as `"~x"` in place.
//! - `listeners(name)` lists once-pattern entries matching `name` too; these
//!   are the entries dispatch takes out when its pattern-once step starts.
//! - Listeners are compared by identity; duplicates are kept.

use indexmap::IndexMap;
use tracing::trace;

use crate::core::group::Group;
use crate::error::EmitError;
use crate::listeners::Listener;
use crate::patterns::{Matcher, PatternCompiler, is_pattern, pattern_key};

/// One key of one group.
struct Entry<A> {
    /// Present for pattern groups only.
    matcher: Option<Matcher>,
    listeners: Vec<Listener<A>>,
}

impl<A> Entry<A> {
    fn matches(&self, event: &str) -> bool {
        self.matcher.as_ref().is_some_and(|m| m.is_match(event))
    }
}

type GroupMap<A> = IndexMap<String, Entry<A>>;

/// Snapshot of pattern entries: compiled key → listeners.
pub type PatternListeners<A> = IndexMap<String, Vec<Listener<A>>>;

/// Ordered four-group listener store.
pub struct Registry<A> {
    compiler: PatternCompiler,
    exact: GroupMap<A>,
    exact_once: GroupMap<A>,
    pattern: GroupMap<A>,
    pattern_once: GroupMap<A>,
}

impl<A> Registry<A> {
    /// Creates an empty registry.
    pub fn new(compiler: PatternCompiler) -> Self {
        Self {
            compiler,
            exact: IndexMap::new(),
            exact_once: IndexMap::new(),
            pattern: IndexMap::new(),
            pattern_once: IndexMap::new(),
        }
    }

    fn group(&self, group: Group) -> &GroupMap<A> {
        match group {
            Group::Exact => &self.exact,
            Group::ExactOnce => &self.exact_once,
            Group::Pattern => &self.pattern,
            Group::PatternOnce => &self.pattern_once,
        }
    }

    fn group_mut(&mut self, group: Group) -> &mut GroupMap<A> {
        match group {
            Group::Exact => &mut self.exact,
            Group::ExactOnce => &mut self.exact_once,
            Group::Pattern => &mut self.pattern,
            Group::PatternOnce => &mut self.pattern_once,
        }
    }

    /// Groups a spec routes to, with the key to use in them.
    fn route(spec: &str) -> ([Group; 2], String) {
        if is_pattern(spec) {
            ([Group::Pattern, Group::PatternOnce], pattern_key(spec).into_owned())
        } else {
            ([Group::Exact, Group::ExactOnce], spec.to_owned())
        }
    }

    /// Appends `listener` under `spec`.
    pub fn register(&mut self, spec: &str, listener: Listener<A>, once: bool) -> Result<(), EmitError> {
        let op = if once { "once" } else { "on" };
        ensure_name(spec, op)?;

        let (key, matcher) = self.compiler.compile(spec)?.into_parts();
        let group = Group::select(matcher.is_some(), once);

        let entry = self
            .group_mut(group)
            .entry(key)
            .or_insert_with(|| Entry {
                matcher,
                listeners: Vec::new(),
            });
        entry.listeners.push(listener);

        trace!(spec, group = group.as_label(), listeners = entry.listeners.len(), "listener registered");
        Ok(())
    }

    /// Removes the first identity match of `listener` from each group `spec`
    /// routes to. Returns `true` if anything was removed.
    pub fn remove_listener(&mut self, spec: &str, listener: &Listener<A>) -> Result<bool, EmitError> {
        ensure_name(spec, "remove_listener")?;

        let (groups, key) = Self::route(spec);
        let mut removed = false;
        for group in groups {
            let map = self.group_mut(group);
            let Some(entry) = map.get_mut(&key) else {
                continue;
            };
            let Some(pos) = entry.listeners.iter().position(|l| l.same(listener)) else {
                continue;
            };

            entry.listeners.remove(pos);
            if entry.listeners.is_empty() {
                map.shift_remove(&key);
            }
            removed = true;
            trace!(spec, group = group.as_label(), "listener removed");
        }
        Ok(removed)
    }

    /// Drops every entry for `spec`, or clears all groups when `spec` is `None`.
    pub fn remove_all(&mut self, spec: Option<&str>) -> Result<(), EmitError> {
        let Some(spec) = spec else {
            for group in Group::ALL {
                self.group_mut(group).clear();
            }
            trace!("all listeners removed");
            return Ok(());
        };
        ensure_name(spec, "remove_all_listeners")?;

        let (groups, key) = Self::route(spec);
        for group in groups {
            self.group_mut(group).shift_remove(&key);
        }
        trace!(spec, "listeners removed");
        Ok(())
    }

    /// Snapshot of the listeners stored under a literal `key`.
    pub fn snapshot(&self, group: Group, key: &str) -> Vec<Listener<A>> {
        self.group(group)
            .get(key)
            .map(|e| e.listeners.clone())
            .unwrap_or_default()
    }

    /// Takes the entry stored under a literal `key` out of `group`.
    pub fn take(&mut self, group: Group, key: &str) -> Vec<Listener<A>> {
        self.group_mut(group)
            .shift_remove(key)
            .map(|e| e.listeners)
            .unwrap_or_default()
    }

    /// Pattern entries of `group`, in registry order.
    ///
    /// With `None`, every entry is returned; otherwise only entries whose
    /// matcher matches `event`.
    pub fn find_pattern_listeners(&self, event: Option<&str>, group: Group) -> PatternListeners<A> {
        self.group(group)
            .iter()
            .filter(|(_, e)| event.is_none_or(|ev| e.matches(ev)))
            .map(|(k, e)| (k.clone(), e.listeners.clone()))
            .collect()
    }

    /// Takes every entry of `group` whose matcher matches `event` out of
    /// the registry, in registry order.
    pub fn take_matching(&mut self, group: Group, event: &str) -> PatternListeners<A> {
        let map = self.group_mut(group);
        let keys: Vec<String> = map
            .iter()
            .filter(|(_, e)| e.matches(event))
            .map(|(k, _)| k.clone())
            .collect();

        keys.into_iter()
            .filter_map(|k| map.shift_remove(&k).map(|e| (k, e.listeners)))
            .collect()
    }

    /// Listeners that an emission of `event` would reach, in dispatch order.
    pub fn listeners(&self, event: &str) -> Vec<Listener<A>> {
        let mut out = self.snapshot(Group::Exact, event);
        out.extend(self.snapshot(Group::ExactOnce, event));
        for group in [Group::Pattern, Group::PatternOnce] {
            out.extend(self.find_pattern_listeners(Some(event), group).into_values().flatten());
        }
        out
    }

    /// Every key with its listeners.
    ///
    /// Literal names come first (exact listeners before once listeners), then
    /// compiled pattern keys (persistent before once).
    pub fn all_listeners(&self) -> IndexMap<String, Vec<Listener<A>>> {
        let mut out: IndexMap<String, Vec<Listener<A>>> = IndexMap::new();
        for group in Group::ALL {
            for (key, entry) in self.group(group) {
                out.entry(key.clone())
                    .or_default()
                    .extend(entry.listeners.iter().cloned());
            }
        }
        out
    }

    /// Every key present in any group, without duplicates.
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for group in Group::ALL {
            for key in self.group(group).keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }
        names
    }

    /// Total number of registered listeners across all groups.
    pub fn len(&self) -> usize {
        Group::ALL
            .iter()
            .map(|g| self.group(*g).values().map(|e| e.listeners.len()).sum::<usize>())
            .sum()
    }

    /// True if no listener is registered.
    pub fn is_empty(&self) -> bool {
        Group::ALL.iter().all(|g| self.group(*g).is_empty())
    }

    #[cfg(test)]
    fn key_count(&self, group: Group) -> usize {
        self.group(group).len()
    }
}

/// Rejects empty event names and specs.
pub(crate) fn ensure_name(name: &str, op: &'static str) -> Result<(), EmitError> {
    if name.is_empty() {
        return Err(EmitError::EmptyEventName { op });
    }
    Ok(())
}
