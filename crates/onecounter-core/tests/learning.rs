//! End-to-end scenarios, spec.md §8.

use std::collections::HashSet;

use onecounter_core::alphabet::{word, Alphabet, VisiblyAlphabet, VisiblyCv};
use onecounter_core::automaton::v1ca::TransitionColor;
use onecounter_core::automaton::{Automaton, V1ca};
use onecounter_core::behaviour_graph::BehaviourGraph;
use onecounter_core::teacher::Teacher;
use onecounter_core::{Learner, Rst, Word};

struct AnBn;

impl Teacher for AnBn {
    fn membership(&mut self, w: &[char]) -> bool {
        let n_a = w.iter().take_while(|&&c| c == 'a').count();
        let rest = &w[n_a..];
        n_a == rest.len() && rest.iter().all(|&c| c == 'b')
    }

    fn partial_equivalence(&mut self, bg: &BehaviourGraph, _tag: &str) -> Option<Word> {
        let alphabet = anbn_alphabet();
        let candidate = bg.fold_v1ca_direct(&alphabet);
        brute_force_disagreement(|w| self.membership(w), |w| candidate.accepts(w), &['a', 'b'], 6)
    }

    fn equivalence(&mut self, automaton: &Automaton, _tag: &str) -> Option<Word> {
        let Automaton::V1ca(v) = automaton else {
            panic!("anbn is a V1CA fixture");
        };
        brute_force_disagreement(|w| self.membership(w), |w| v.accepts(w), &['a', 'b'], 6)
    }
}

fn anbn_alphabet() -> VisiblyAlphabet {
    VisiblyAlphabet::new([('a', 1), ('b', -1)]).unwrap()
}

fn brute_force_disagreement(
    mut reference: impl FnMut(&[char]) -> bool,
    mut candidate: impl FnMut(&[char]) -> bool,
    symbols: &[char],
    max_len: usize,
) -> Option<Word> {
    let mut frontier = vec![Vec::new()];
    for _ in 0..=max_len {
        let mut next = Vec::new();
        for w in frontier {
            if reference(&w) != candidate(&w) {
                return Some(w);
            }
            for &s in symbols {
                let mut child = w.clone();
                child.push(s);
                next.push(child);
            }
        }
        frontier = next;
    }
    None
}

/// S1: V1CA learning converges on `{ a^n b^n | n >= 0 }` and the learned
/// automaton agrees with the teacher on the documented samples.
#[test]
fn learns_anbn_v1ca() {
    let alphabet = anbn_alphabet();
    let mut learner = Learner::new(AnBn);
    let automaton = learner.learn_v1ca(&alphabet, false).expect("anbn is V1CA-learnable");

    assert!(automaton.accepts(&word("")));
    assert!(automaton.accepts(&word("aabb")));
    assert!(automaton.accepts(&word("ab")));
    assert!(!automaton.accepts(&word("aab")));
    assert!(!automaton.accepts(&word("ba")));
}

/// S4: emptiness witness.
#[test]
fn emptiness_reports_a_reachable_witness() {
    let alphabet = anbn_alphabet();

    // A single non-accepting state with a self-loop on 'a': no accepting
    // state is reachable at all.
    let mut transitions = std::collections::HashMap::new();
    transitions.insert((0, 0, 'a'), (0, TransitionColor::Initial));
    let unreachable = V1ca::new(alphabet.clone(), 1, 0, HashSet::new(), 0, transitions, vec![0]);
    assert_eq!(unreachable.empty(), None);

    // Add a second, accepting state reachable via "aabb".
    let mut transitions = std::collections::HashMap::new();
    transitions.insert((0, 0, 'a'), (1, TransitionColor::Initial));
    transitions.insert((1, 0, 'b'), (2, TransitionColor::LoopInBottom));
    transitions.insert((1, 1, 'a'), (1, TransitionColor::LoopOut));
    transitions.insert((1, 1, 'b'), (2, TransitionColor::LoopInBottom));
    let mut accepting = HashSet::new();
    accepting.insert(2);
    let reachable = V1ca::new(alphabet, 3, 0, accepting, 1, transitions, vec![0, 1, 0]);
    let witness = reachable.empty().expect("an accepting state is reachable");
    assert!(reachable.accepts(&witness));
}

/// S5: ingesting a counter-example populates the right tables and rows.
#[test]
fn counter_example_populates_expected_rows() {
    let alphabet = anbn_alphabet();
    let mut cv = VisiblyCv(&alphabet);
    let mut teacher = AnBn;
    let mut rst = Rst::new(&mut teacher);

    rst.add_counter_example(&word("aabb"), &mut teacher, &mut cv);

    assert!(rst.size() >= 3);
    assert!(rst.table(0).unwrap().contains_row(&word("")));
    assert!(rst.table(0).unwrap().contains_row(&word("aabb")));
    assert!(rst.table(1).unwrap().contains_row(&word("a")));
    assert!(rst.table(2).unwrap().contains_row(&word("aa")));
}

/// Invariant 7: `is_equivalent_to` is reflexive and symmetric.
#[test]
fn equivalence_is_reflexive_and_symmetric() {
    let alphabet = anbn_alphabet();
    let mut transitions = std::collections::HashMap::new();
    transitions.insert((0, 0, 'a'), (1, TransitionColor::Initial));
    transitions.insert((1, 0, 'b'), (0, TransitionColor::LoopInBottom));
    transitions.insert((1, 1, 'a'), (1, TransitionColor::LoopOut));
    transitions.insert((1, 1, 'b'), (0, TransitionColor::LoopInBottom));
    let mut accepting = HashSet::new();
    accepting.insert(0);
    let a = V1ca::new(alphabet.clone(), 2, 0, accepting.clone(), 1, transitions.clone(), vec![0, 1]);
    let b = V1ca::new(alphabet, 2, 0, accepting, 1, transitions, vec![0, 1]);

    assert_eq!(a.is_equivalent_to(&a).unwrap(), None);
    assert_eq!(a.is_equivalent_to(&b).unwrap().is_none(), b.is_equivalent_to(&a).unwrap().is_none());
}

/// Invariant 5: accepts and complement disagree on every zero-counter word.
#[test]
fn complement_flips_acceptance_on_every_counter_zero_word() {
    let alphabet = anbn_alphabet();
    let mut transitions = std::collections::HashMap::new();
    transitions.insert((0, 0, 'a'), (1, TransitionColor::Initial));
    transitions.insert((1, 0, 'b'), (0, TransitionColor::LoopInBottom));
    transitions.insert((1, 1, 'a'), (1, TransitionColor::LoopOut));
    transitions.insert((1, 1, 'b'), (0, TransitionColor::LoopInBottom));
    let mut accepting = HashSet::new();
    accepting.insert(0);
    let a = V1ca::new(alphabet.clone(), 2, 0, accepting, 1, transitions, vec![0, 1]);
    let complement = a.complement();

    for w in zero_counter_words(&alphabet, 6) {
        assert_ne!(a.accepts(&w), complement.accepts(&w), "disagreement expected on {w:?}");
    }
}

fn zero_counter_words(alphabet: &VisiblyAlphabet, max_len: usize) -> Vec<Word> {
    let mut out = vec![Vec::new()];
    let mut frontier = vec![Vec::new()];
    for _ in 0..max_len {
        let mut next = Vec::new();
        for w in frontier {
            for &s in alphabet.symbols() {
                let mut child = w.clone();
                child.push(s);
                if alphabet.counter_value(&child) == 0 {
                    out.push(child.clone());
                }
                next.push(child);
            }
        }
        frontier = next;
    }
    out
}
