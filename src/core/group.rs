//! # Listener groups.
//!
//! The registry keeps four independent groups. A spec lands in exactly one of
//! them at registration time, depending on whether it is a pattern and whether
//! it was registered with `once`.
//!
//! | group          | key                 | removed after dispatch |
//! |----------------|---------------------|------------------------|
//! | `Exact`        | literal event name  | no                     |
//! | `ExactOnce`    | literal event name  | yes                    |
//! | `Pattern`      | delimited regex     | no                     |
//! | `PatternOnce`  | delimited regex     | yes                    |

/// One of the four listener groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    /// Literal name, persistent.
    Exact,
    /// Literal name, removed on first dispatch.
    ExactOnce,
    /// Pattern, persistent.
    Pattern,
    /// Pattern, removed on first matching dispatch.
    PatternOnce,
}

impl Group {
    /// Groups in dispatch order.
    pub const ALL: [Group; 4] = [
        Group::Exact,
        Group::ExactOnce,
        Group::Pattern,
        Group::PatternOnce,
    ];

    /// Selects the group for a spec kind and registration mode.
    #[inline]
    pub fn select(pattern: bool, once: bool) -> Self {
        match (pattern, once) {
            (false, false) => Group::Exact,
            (false, true) => Group::ExactOnce,
            (true, false) => Group::Pattern,
            (true, true) => Group::PatternOnce,
        }
    }

    /// True for groups keyed by compiled patterns.
    #[inline]
    pub fn is_pattern(self) -> bool {
        matches!(self, Group::Pattern | Group::PatternOnce)
    }

    /// True for groups whose entries are consumed by dispatch.
    #[inline]
    pub fn is_once(self) -> bool {
        matches!(self, Group::ExactOnce | Group::PatternOnce)
    }

    /// Returns a short stable label for use in logs.
    pub fn as_label(self) -> &'static str {
        match self {
            Group::Exact => "listeners",
            Group::ExactOnce => "onceListeners",
            Group::Pattern => "listenersWildcard",
            Group::PatternOnce => "onceListenersWildcard",
        }
    }
}
