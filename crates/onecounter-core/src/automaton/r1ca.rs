//! Realtime one-counter automaton: spec.md §4.6.

use std::collections::{HashMap, HashSet};

use crate::alphabet::{Alphabet, BasicAlphabet, Symbol, Word};
use crate::automaton::StateId;

/// Which side of a threshold a conditional transition fires on (spec.md §9:
/// "a 'loop-out' polarity fires at `counter ≤ t` and a 'loop-in' at `counter
/// > t`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    LoopOut,
    LoopIn,
}

/// A transition as produced by folding a behaviour graph, before expansion
/// into the concrete per-counter-index map an [`R1ca`] evaluates against.
#[derive(Debug, Clone, Copy)]
pub struct ConditionalTransition {
    pub src: StateId,
    pub dst: StateId,
    pub symbol: Symbol,
    pub effect: i32,
    /// `None` for an unconditional transition, valid at every counter index.
    pub threshold: Option<(usize, Polarity)>,
}

type TransitionKey = (StateId, usize, Symbol);

/// `(states, initial, accepting, basic_alphabet, max_level, transitions)`.
/// The counter is clipped to `max_level` only when indexing the transition
/// map; it evolves without clipping during evaluation.
#[derive(Debug, Clone)]
pub struct R1ca {
    alphabet: BasicAlphabet,
    num_states: usize,
    initial: StateId,
    accepting: HashSet<StateId>,
    max_level: usize,
    transitions: HashMap<TransitionKey, (StateId, i32)>,
}

impl R1ca {
    pub fn new(
        alphabet: BasicAlphabet,
        num_states: usize,
        initial: StateId,
        accepting: HashSet<StateId>,
        max_level: usize,
        transitions: HashMap<TransitionKey, (StateId, i32)>,
    ) -> Self {
        Self {
            alphabet,
            num_states,
            initial,
            accepting,
            max_level,
            transitions,
        }
    }

    /// Expands a list of (possibly conditional) transitions into the
    /// concrete map, per spec.md §4.6: a conditional transition with
    /// threshold `t` and polarity `≤` is expanded over `[0, t]`, `>` over
    /// `(t, max_level]`; an unconditional transition is expanded over the
    /// whole `[0, max_level]`.
    pub fn from_conditional(
        alphabet: BasicAlphabet,
        num_states: usize,
        initial: StateId,
        accepting: HashSet<StateId>,
        max_level: usize,
        conditional: impl IntoIterator<Item = ConditionalTransition>,
    ) -> Self {
        let mut transitions = HashMap::new();
        for ct in conditional {
            let range: Vec<usize> = match ct.threshold {
                None => (0..=max_level).collect(),
                Some((t, Polarity::LoopOut)) => (0..=t.min(max_level)).collect(),
                Some((t, Polarity::LoopIn)) => {
                    if t >= max_level {
                        Vec::new()
                    } else {
                        ((t + 1)..=max_level).collect()
                    }
                }
            };
            for c in range {
                transitions.insert((ct.src, c, ct.symbol), (ct.dst, ct.effect));
            }
        }
        Self::new(alphabet, num_states, initial, accepting, max_level, transitions)
    }

    pub fn alphabet(&self) -> &BasicAlphabet {
        &self.alphabet
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    fn transition(&self, state: StateId, counter: i64, symbol: Symbol) -> Option<(StateId, i32)> {
        let clipped = counter.max(0).min(self.max_level as i64) as usize;
        self.transitions.get(&(state, clipped, symbol)).copied()
    }

    /// Runs `w`, returning the final counter value, or `-1` if a transition
    /// is missing or the counter goes negative at any point.
    pub fn count(&self, w: &[Symbol]) -> i32 {
        let mut state = self.initial;
        let mut counter: i64 = 0;
        for &symbol in w {
            if !self.alphabet.contains(symbol) {
                return -1;
            }
            let Some((next, effect)) = self.transition(state, counter, symbol) else {
                return -1;
            };
            counter += effect as i64;
            if counter < 0 {
                return -1;
            }
            state = next;
        }
        counter as i32
    }

    /// Accepts iff the run completes (every symbol has a transition, the
    /// counter never goes negative) and ends with counter 0 in an accepting
    /// state.
    pub fn evaluate(&self, w: &[Symbol]) -> bool {
        let mut state = self.initial;
        let mut counter: i64 = 0;
        for &symbol in w {
            if !self.alphabet.contains(symbol) {
                return false;
            }
            let Some((next, effect)) = self.transition(state, counter, symbol) else {
                return false;
            };
            counter += effect as i64;
            if counter < 0 {
                return false;
            }
            state = next;
        }
        counter == 0 && self.accepting.contains(&state)
    }
}

#[cfg(feature = "render")]
impl onecounter_render::ToDot for R1ca {
    fn to_dot(&self) -> onecounter_render::DotDocument {
        let mut body = String::new();
        for state in 0..self.num_states {
            let shape = if self.accepting.contains(&state) {
                "doublecircle"
            } else {
                "circle"
            };
            body.push_str(&format!("  {state} [shape=\"{shape}\"];\n"));
        }
        for (&(state, counter, symbol), &(next, effect)) in &self.transitions {
            body.push_str(&format!(
                "  {state} -> {next} [label=\"{symbol}/{effect:+} @{counter}\"];\n"
            ));
        }
        onecounter_render::DotDocument(format!("digraph R1CA {{\n{body}}}\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::word;

    /// S3: L = { a^n b a^m | 0 <= m <= n }, basic alphabet {a, b}.
    fn an_b_am() -> R1ca {
        let alphabet = BasicAlphabet::new(['a', 'b']);
        let conditional = [
            ConditionalTransition {
                src: 0,
                dst: 0,
                symbol: 'a',
                effect: 1,
                threshold: None,
            },
            ConditionalTransition {
                src: 0,
                dst: 1,
                symbol: 'b',
                effect: 0,
                threshold: None,
            },
            ConditionalTransition {
                src: 1,
                dst: 1,
                symbol: 'a',
                effect: -1,
                threshold: None,
            },
        ];
        R1ca::from_conditional(alphabet, 2, 0, HashSet::from([1]), 8, conditional)
    }

    #[test]
    fn evaluates_an_b_am() {
        let r = an_b_am();
        assert!(r.evaluate(&word("aba")));
        assert!(r.evaluate(&word("aabaa")));
        assert!(!r.evaluate(&word("aabaaa")));
        // n=0, m=1 violates m <= n: the counter underflows past the `b`.
        assert!(!r.evaluate(&word("ba")));
    }

    #[test]
    fn count_tracks_counter() {
        let r = an_b_am();
        assert_eq!(r.count(&word("aab")), 2);
        assert_eq!(r.count(&word("aabaa")), 0);
    }
}
