//! The teacher (oracle) interface: spec.md §4.2 / §6.

use std::collections::HashMap;

use crate::alphabet::{CounterValueSource, Symbol, VisiblyAlphabet, Word};
use crate::automaton::Automaton;
use crate::behaviour_graph::BehaviourGraph;

/// Capability set required of every teacher: membership, partial-equivalence
/// (against a behaviour graph) and full equivalence (against a folded
/// automaton). Counter-example words returned by the two equivalence hooks
/// are assumed valid under the contract spelled out in spec.md §4.2: the
/// caller does not re-validate them beyond what
/// [`crate::error::CoreError::TeacherContractViolation`] exists for.
pub trait Teacher {
    fn membership(&mut self, w: &[Symbol]) -> bool;

    fn partial_equivalence(&mut self, bg: &BehaviourGraph, tag: &str) -> Option<Word>;

    fn equivalence(&mut self, automaton: &Automaton, tag: &str) -> Option<Word>;

    /// A short line describing the teacher, surfaced only in diagnostics
    /// (spec.md §11: the original's `sum_up_msg`). The default is silent.
    fn summary(&self) -> String {
        String::new()
    }
}

/// The additional capability an R1CA-mode teacher must provide: a
/// counter-value oracle and the visibly alphabet used to compute effects
/// during behaviour-graph construction (spec.md §6 "Optional (R1CA)").
pub trait CounterCapability: Teacher {
    /// The teacher's counter value for `w`; `-1` signals rejection /
    /// underflow (spec.md §4.2).
    fn counter_query(&mut self, w: &[Symbol]) -> i32;

    fn visibly_alphabet(&self) -> &VisiblyAlphabet;
}

/// Counter-value source backed by a counter-capable teacher's
/// `counter_query`, used when learning an R1CA (see
/// [`crate::alphabet::VisiblyCv`] for the V1CA counterpart).
#[derive(Debug, Default, Clone, Copy)]
pub struct RealtimeCv;

impl<T: CounterCapability> CounterValueSource<T> for RealtimeCv {
    fn counter_value(&mut self, teacher: &mut T, word: &[Symbol]) -> i32 {
        teacher.counter_query(word)
    }
}

/// Wraps a teacher and memoizes membership answers, per spec.md §9: "Cached
/// teacher as a wrapper... intercepts only membership". Every other call is
/// forwarded unconditionally. Never double-asks the inner teacher the same
/// word twice (spec.md:66), which is why [`Learner`](crate::learner::Learner)
/// wraps every teacher it is given in one of these before learning starts.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    inner: T,
    cache: HashMap<Word, bool>,
    hits: usize,
}

impl<T> Cached<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            cache: HashMap::new(),
            hits: 0,
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Number of distinct words answered so far; used by callers wanting to
    /// report query counts without exposing the cache itself.
    pub fn queries_cached(&self) -> usize {
        self.cache.len()
    }

    /// Number of membership queries answered from the cache instead of
    /// reaching the inner teacher.
    pub fn cache_hits(&self) -> usize {
        self.hits
    }
}

impl<T: Teacher> Teacher for Cached<T> {
    fn membership(&mut self, w: &[Symbol]) -> bool {
        if let Some(&answer) = self.cache.get(w) {
            self.hits += 1;
            return answer;
        }
        let answer = self.inner.membership(w);
        self.cache.insert(w.to_vec(), answer);
        answer
    }

    fn partial_equivalence(&mut self, bg: &BehaviourGraph, tag: &str) -> Option<Word> {
        self.inner.partial_equivalence(bg, tag)
    }

    fn equivalence(&mut self, automaton: &Automaton, tag: &str) -> Option<Word> {
        self.inner.equivalence(automaton, tag)
    }

    fn summary(&self) -> String {
        format!(
            "{} ({} distinct queries cached, {} cache hits)",
            self.inner.summary(),
            self.queries_cached(),
            self.cache_hits()
        )
    }
}

impl<T: CounterCapability> CounterCapability for Cached<T> {
    fn counter_query(&mut self, w: &[Symbol]) -> i32 {
        self.inner.counter_query(w)
    }

    fn visibly_alphabet(&self) -> &VisiblyAlphabet {
        self.inner.visibly_alphabet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::word;

    struct CountingTeacher {
        calls: usize,
    }

    impl Teacher for CountingTeacher {
        fn membership(&mut self, w: &[Symbol]) -> bool {
            self.calls += 1;
            w.len() % 2 == 0
        }

        fn partial_equivalence(&mut self, _bg: &BehaviourGraph, _tag: &str) -> Option<Word> {
            None
        }

        fn equivalence(&mut self, _automaton: &Automaton, _tag: &str) -> Option<Word> {
            None
        }

        fn summary(&self) -> String {
            "counting teacher".to_string()
        }
    }

    #[test]
    fn cache_never_double_asks() {
        let mut cached = Cached::new(CountingTeacher { calls: 0 });
        assert!(cached.membership(&word("aa")));
        assert!(cached.membership(&word("aa")));
        assert!(!cached.membership(&word("aaa")));
        assert_eq!(cached.inner().calls, 2);
        assert_eq!(cached.queries_cached(), 2);
        assert_eq!(cached.cache_hits(), 1);
    }

    #[test]
    fn summary_reports_cache_stats() {
        let mut cached = Cached::new(CountingTeacher { calls: 0 });
        cached.membership(&word("aa"));
        cached.membership(&word("aa"));
        let summary = cached.summary();
        assert!(summary.contains("counting teacher"));
        assert!(summary.contains('1'));
    }
}
