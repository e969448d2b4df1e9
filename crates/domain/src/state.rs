use std::fmt;

/// Terminal-state origin, persisted as a single letter in the store (§3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Resolved live from a nameserver this run.
    Nameserver,
    /// Synthesized via the recursion fallback.
    Recursed,
    /// Written by `--mergedb`.
    Merged,
}

impl Origin {
    pub fn letter(self) -> char {
        match self {
            Origin::Nameserver => 'N',
            Origin::Recursed => 'R',
            Origin::Merged => 'M',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'N' => Some(Origin::Nameserver),
            'R' => Some(Origin::Recursed),
            'M' => Some(Origin::Merged),
            _ => None,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// State of a host's Pending entry (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostState {
    Pending,
    PendingRecurse,
    Failed,
    FromStore(String),
    FromNs(String),
    FromRecursion(String),
}

impl HostState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, HostState::Pending | HostState::PendingRecurse)
    }

    pub fn resolved_name(&self) -> Option<&str> {
        match self {
            HostState::FromStore(n) | HostState::FromNs(n) | HostState::FromRecursion(n) => {
                Some(n.as_str())
            }
            _ => None,
        }
    }

    /// Origin to persist on write-back, or `None` if this terminal state is
    /// never written to the store (§3 invariant: `from-store` is not
    /// persisted; non-terminal states are never written at all).
    pub fn store_origin(&self) -> Option<Origin> {
        match self {
            HostState::FromNs(_) => Some(Origin::Nameserver),
            HostState::FromRecursion(_) => Some(Origin::Recursed),
            _ => None,
        }
    }
}

/// State of a class's Pending entry — no recursion variant (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassState {
    Pending,
    Failed,
    FromStore(String),
    FromNs(String),
}

impl ClassState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ClassState::Pending)
    }

    pub fn resolved_name(&self) -> Option<&str> {
        match self {
            ClassState::FromStore(n) | ClassState::FromNs(n) => Some(n.as_str()),
            _ => None,
        }
    }

    /// Only `from-ns` is persisted for classes (§4.2 `removeClass`).
    pub fn store_origin(&self) -> Option<Origin> {
        match self {
            ClassState::FromNs(_) => Some(Origin::Nameserver),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_letter_round_trips() {
        for o in [Origin::Nameserver, Origin::Recursed, Origin::Merged] {
            assert_eq!(Origin::from_letter(o.letter()), Some(o));
        }
        assert_eq!(Origin::from_letter('D'), None);
    }

    #[test]
    fn from_store_never_persists() {
        let s = HostState::FromStore("host.example".into());
        assert!(s.is_terminal());
        assert_eq!(s.store_origin(), None);
    }

    #[test]
    fn terminal_states_persist_expected_origin() {
        assert_eq!(
            HostState::FromNs("a".into()).store_origin(),
            Some(Origin::Nameserver)
        );
        assert_eq!(
            HostState::FromRecursion("a".into()).store_origin(),
            Some(Origin::Recursed)
        );
        assert_eq!(ClassState::FromNs("a".into()).store_origin(), Some(Origin::Nameserver));
        assert_eq!(ClassState::FromStore("a".into()).store_origin(), None);
    }
}
