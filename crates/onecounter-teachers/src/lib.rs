//! Concrete [`Teacher`] implementations for testing and demos, grounded on
//! the `automatic_teacher` / `automatic_v1ca_teacher` pattern: a teacher
//! backed by a reference language rather than a human at a terminal.
//!
//! [`AutomaticTeacher`] wraps an exact reference [`V1ca`] and answers
//! equivalence queries exactly, via [`V1ca::is_equivalent_to`].
//! [`PredicateTeacher`] wraps a bare membership predicate and a bound on
//! search width, answering equivalence queries by bounded enumeration —
//! the original's `automatic_teacher::find_counter_example` never got past
//! a `// TODO`, so this is this crate's own resolution of that gap rather
//! than a transcription of it.

pub mod languages;

use onecounter_core::alphabet::{Alphabet, BasicAlphabet, Symbol, VisiblyAlphabet, Word};
use onecounter_core::automaton::{Automaton, R1ca, V1ca};
use onecounter_core::behaviour_graph::BehaviourGraph;
use onecounter_core::teacher::{CounterCapability, Teacher};

/// Exact V1CA-mode teacher, backed by a reference automaton (spec.md §6
/// "Optional teacher implementations"). Equivalence is checked exactly via
/// [`V1ca::is_equivalent_to`]; membership via [`V1ca::accepts`].
pub struct AutomaticTeacher {
    reference: V1ca,
}

impl AutomaticTeacher {
    pub fn new(reference: V1ca) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> &V1ca {
        &self.reference
    }
}

impl Teacher for AutomaticTeacher {
    fn membership(&mut self, w: &[Symbol]) -> bool {
        self.reference.accepts(w)
    }

    fn partial_equivalence(&mut self, bg: &BehaviourGraph, _tag: &str) -> Option<Word> {
        let candidate = bg.fold_v1ca_direct(self.reference.alphabet());
        self.reference
            .is_equivalent_to(&candidate)
            .expect("automatic teacher and behaviour graph fold share an alphabet")
    }

    fn equivalence(&mut self, automaton: &Automaton, _tag: &str) -> Option<Word> {
        match automaton {
            Automaton::V1ca(v) => self
                .reference
                .is_equivalent_to(v)
                .expect("automatic teacher only learns V1CA hypotheses"),
            Automaton::R1ca(_) => {
                panic!("AutomaticTeacher was asked to judge an R1CA hypothesis")
            }
        }
    }

    fn summary(&self) -> String {
        format!(
            "automatic teacher over a {}-state reference V1CA",
            self.reference.num_states()
        )
    }
}

/// Bounded-enumeration teacher: membership comes from an arbitrary
/// predicate, equivalence is checked by trying every word up to `max_len`
/// over `alphabet` and returning the first disagreement. Exact only up to
/// `max_len`; past that, a `None` answer means "no counter-example found
/// within the search bound", not a formal proof of equivalence.
pub struct PredicateTeacher<F> {
    predicate: F,
    alphabet: VisiblyAlphabet,
    max_len: usize,
}

impl<F: FnMut(&[Symbol]) -> bool> PredicateTeacher<F> {
    pub fn new(predicate: F, alphabet: VisiblyAlphabet, max_len: usize) -> Self {
        Self { predicate, alphabet, max_len }
    }

    fn find_disagreement(&mut self, mut candidate_accepts: impl FnMut(&[Symbol]) -> bool) -> Option<Word> {
        let symbols = self.alphabet.symbols().to_vec();
        let mut frontier = vec![Vec::new()];
        for _ in 0..=self.max_len {
            let mut next = Vec::new();
            for w in frontier {
                if (self.predicate)(&w) != candidate_accepts(&w) {
                    return Some(w);
                }
                for &s in &symbols {
                    let mut child = w.clone();
                    child.push(s);
                    next.push(child);
                }
            }
            frontier = next;
        }
        None
    }
}

impl<F: FnMut(&[Symbol]) -> bool> Teacher for PredicateTeacher<F> {
    fn membership(&mut self, w: &[Symbol]) -> bool {
        (self.predicate)(w)
    }

    fn partial_equivalence(&mut self, bg: &BehaviourGraph, _tag: &str) -> Option<Word> {
        let candidate = bg.fold_v1ca_direct(&self.alphabet);
        self.find_disagreement(|w| candidate.accepts(w))
    }

    fn equivalence(&mut self, automaton: &Automaton, _tag: &str) -> Option<Word> {
        match automaton {
            Automaton::V1ca(v) => self.find_disagreement(|w| v.accepts(w)),
            Automaton::R1ca(_) => panic!("PredicateTeacher (V1CA mode) was given an R1CA hypothesis"),
        }
    }

    fn summary(&self) -> String {
        format!("predicate teacher, bounded equivalence search up to length {}", self.max_len)
    }
}

/// Bounded-enumeration R1CA-mode teacher: `R1ca` has no exact
/// `is_equivalent_to` (spec.md §4.6 scopes only `evaluate`/`count` as
/// required operations), so equivalence here is the same bounded search as
/// [`PredicateTeacher`], over the basic alphabet.
pub struct PredicateR1caTeacher<F, C> {
    predicate: F,
    counter: C,
    alphabet: BasicAlphabet,
    visibly: VisiblyAlphabet,
    max_len: usize,
}

impl<F: FnMut(&[Symbol]) -> bool, C: FnMut(&[Symbol]) -> i32> PredicateR1caTeacher<F, C> {
    pub fn new(predicate: F, counter: C, alphabet: BasicAlphabet, max_len: usize) -> Self {
        let visibly_pairs: Vec<(Symbol, i32)> = alphabet.symbols().iter().map(|&s| (s, 0)).collect();
        let visibly = VisiblyAlphabet::new(visibly_pairs).expect("at least one symbol");
        Self { predicate, counter, alphabet, visibly, max_len }
    }

    fn find_disagreement(&mut self, mut candidate_accepts: impl FnMut(&[Symbol]) -> bool) -> Option<Word> {
        let symbols = self.alphabet.symbols().to_vec();
        let mut frontier = vec![Vec::new()];
        for _ in 0..=self.max_len {
            let mut next = Vec::new();
            for w in frontier {
                if (self.predicate)(&w) != candidate_accepts(&w) {
                    return Some(w);
                }
                for &s in &symbols {
                    let mut child = w.clone();
                    child.push(s);
                    next.push(child);
                }
            }
            frontier = next;
        }
        None
    }
}

impl<F: FnMut(&[Symbol]) -> bool, C: FnMut(&[Symbol]) -> i32> Teacher for PredicateR1caTeacher<F, C> {
    fn membership(&mut self, w: &[Symbol]) -> bool {
        (self.predicate)(w)
    }

    fn partial_equivalence(&mut self, bg: &BehaviourGraph, _tag: &str) -> Option<Word> {
        let candidate = bg.fold_r1ca_direct(&self.alphabet);
        self.find_disagreement(|w| candidate.evaluate(w))
    }

    fn equivalence(&mut self, automaton: &Automaton, _tag: &str) -> Option<Word> {
        match automaton {
            Automaton::R1ca(r) => self.find_disagreement(|w| r.evaluate(w)),
            Automaton::V1ca(_) => panic!("PredicateR1caTeacher was given a V1CA hypothesis"),
        }
    }

    fn summary(&self) -> String {
        format!(
            "predicate R1CA teacher, bounded equivalence search up to length {}",
            self.max_len
        )
    }
}

impl<F: FnMut(&[Symbol]) -> bool, C: FnMut(&[Symbol]) -> i32> CounterCapability for PredicateR1caTeacher<F, C> {
    fn counter_query(&mut self, w: &[Symbol]) -> i32 {
        (self.counter)(w)
    }

    fn visibly_alphabet(&self) -> &VisiblyAlphabet {
        &self.visibly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onecounter_core::alphabet::word;
    use onecounter_core::Learner;

    #[test]
    fn automatic_teacher_learns_anbn() {
        let reference = languages::anbn_reference();
        let alphabet = languages::anbn_alphabet();
        let teacher = AutomaticTeacher::new(reference.clone());
        let mut learner = Learner::new(teacher);
        let learned = learner.learn_v1ca(&alphabet, false).expect("anbn is V1CA-learnable");
        for w in [word(""), word("ab"), word("aabb"), word("aab"), word("ba")] {
            assert_eq!(reference.accepts(&w), learned.accepts(&w), "mismatch on {w:?}");
        }
    }

    #[test]
    fn predicate_r1ca_teacher_learns_an_b_am() {
        let alphabet = BasicAlphabet::new(['a', 'b']);
        let teacher = PredicateR1caTeacher::new(languages::an_b_am, languages::an_b_am_counter, alphabet, 6);
        let mut learner = Learner::new(teacher);
        let learned = learner
            .learn_r1ca(&BasicAlphabet::new(['a', 'b']), false)
            .expect("a^n b a^m is R1CA-learnable");
        for w in [word("aba"), word("aabaa"), word("aabaaa"), word("b")] {
            assert_eq!(languages::an_b_am(&w), learned.evaluate(&w), "mismatch on {w:?}");
        }
    }
}
