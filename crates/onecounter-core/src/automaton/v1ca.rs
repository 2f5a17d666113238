//! Visibly one-counter automaton: spec.md §4.5.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;

use crate::alphabet::{Alphabet, Symbol, VisiblyAlphabet, Word};
use crate::automaton::StateId;
use crate::error::{CoreError, CoreResult};

/// Distinguishes how a transition at the top counter level came to exist,
/// per spec.md §3 "V1CA": `Initial` edges come straight from the behaviour
/// graph, `LoopOut`/`LoopInBottom`/`LoopInTop` are introduced by period
/// folding (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionColor {
    Initial,
    LoopOut,
    LoopInBottom,
    LoopInTop,
}

type TransitionKey = (StateId, usize, Symbol);
type TransitionValue = (StateId, TransitionColor);

/// A visibly one-counter automaton: `(states, initial, accepting, alphabet,
/// max_level, transitions)`. Counter movement is implicit from the symbol's
/// effect in `alphabet`; the transition map is keyed on `(state, counter
/// clipped to max_level, symbol)`.
#[derive(Debug, Clone)]
pub struct V1ca {
    pub(crate) alphabet: VisiblyAlphabet,
    pub(crate) num_states: usize,
    pub(crate) initial: StateId,
    pub(crate) accepting: HashSet<StateId>,
    pub(crate) max_level: usize,
    pub(crate) transitions: HashMap<TransitionKey, TransitionValue>,
    /// The level at which each state was created during the behaviour-graph
    /// fold (or, for a product state, the counter value at which it was
    /// first discovered). Only states at level 0 are ever accepting, which
    /// is what lets [`V1ca::complement`] restrict its flip to them.
    pub(crate) state_level: Vec<usize>,
}

impl V1ca {
    pub fn new(
        alphabet: VisiblyAlphabet,
        num_states: usize,
        initial: StateId,
        accepting: HashSet<StateId>,
        max_level: usize,
        transitions: HashMap<TransitionKey, TransitionValue>,
        state_level: Vec<usize>,
    ) -> Self {
        debug_assert_eq!(state_level.len(), num_states);
        debug_assert!(accepting.iter().all(|&s| state_level[s] == 0));
        Self {
            alphabet,
            num_states,
            initial,
            accepting,
            max_level,
            transitions,
            state_level,
        }
    }

    pub fn alphabet(&self) -> &VisiblyAlphabet {
        &self.alphabet
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn is_accepting(&self, state: StateId) -> bool {
        self.accepting.contains(&state)
    }

    fn transition(&self, state: StateId, counter: usize, symbol: Symbol) -> Option<TransitionValue> {
        let clipped = counter.min(self.max_level);
        self.transitions.get(&(state, clipped, symbol)).copied()
    }

    /// The destination of `(state, counter, symbol)`, ignoring edge color.
    /// Used by [`crate::format`] to flatten the transition map for writing.
    pub fn successor(&self, state: StateId, counter: usize, symbol: Symbol) -> Option<StateId> {
        self.transition(state, counter, symbol).map(|(dst, _)| dst)
    }

    /// Runs `w` from the initial state with counter 0. Accepts iff every
    /// symbol has a defined transition, the counter never goes negative, and
    /// the run ends with counter 0 in an accepting state.
    pub fn accepts(&self, w: &[Symbol]) -> bool {
        let mut state = self.initial;
        let mut counter: i64 = 0;
        for &symbol in w {
            let Some((next, _)) = self.transition(state, counter as usize, symbol) else {
                return false;
            };
            let Some(effect) = self.alphabet.effect(symbol) else {
                return false;
            };
            counter += effect.value() as i64;
            if counter < 0 {
                return false;
            }
            state = next;
        }
        counter == 0 && self.accepting.contains(&state)
    }

    fn check_same_alphabet(&self, other: &V1ca) -> CoreResult<()> {
        if self.alphabet != other.alphabet {
            return Err(CoreError::AlphabetMismatch(
                "V1CA operands do not share a visibly alphabet".to_string(),
            ));
        }
        Ok(())
    }

    /// Flips acceptance of every level-0 state; transitions are untouched.
    /// Non-level-0 states can never be accepting (an accepting run always
    /// ends with counter 0), so they are left alone.
    pub fn complement(&self) -> V1ca {
        let level_zero: HashSet<StateId> = (0..self.num_states)
            .filter(|&s| self.state_level[s] == 0)
            .collect();
        let accepting = level_zero.difference(&self.accepting).copied().collect();
        V1ca {
            accepting,
            ..self.clone()
        }
    }

    /// Extends this automaton's transition map so it behaves identically up
    /// to `new_max_level`, by replicating the entries that currently sit at
    /// `max_level` (the steady periodic stratum) into every new level. See
    /// spec.md §9: "this specification mandates raising the lower
    /// automaton's max level by state duplication before product" — since
    /// states here are not level-bound, "duplication" takes the form of
    /// replicating the boundary-level transitions across the new levels,
    /// which preserves `accepts` exactly (clipped lookups at the old level
    /// always saw these same entries).
    pub fn raised_to(&self, new_max_level: usize) -> V1ca {
        if new_max_level <= self.max_level {
            return self.clone();
        }
        let boundary: Vec<(TransitionKey, TransitionValue)> = self
            .transitions
            .iter()
            .filter(|((_, c, _), _)| *c == self.max_level)
            .map(|(k, v)| (*k, *v))
            .collect();
        let mut transitions = self.transitions.clone();
        for level in (self.max_level + 1)..=new_max_level {
            for &((state, _, symbol), value) in &boundary {
                transitions.insert((state, level, symbol), value);
            }
        }
        V1ca {
            max_level: new_max_level,
            transitions,
            ..self.clone()
        }
    }

    /// Synchronized product construction (spec.md §4.5). Both operands are
    /// first raised to a common max level.
    pub fn intersection(&self, other: &V1ca) -> CoreResult<V1ca> {
        self.check_same_alphabet(other)?;
        let level = self.max_level.max(other.max_level);
        let a = self.raised_to(level);
        let b = other.raised_to(level);

        let mut ids: IndexMap<(StateId, StateId), StateId> = IndexMap::new();
        ids.insert((a.initial, b.initial), 0);
        let mut levels = vec![0usize];
        let mut transitions = HashMap::new();
        let mut queue = VecDeque::from([(a.initial, b.initial, 0usize)]);

        while let Some((sa, sb, at_level)) = queue.pop_front() {
            let pid = ids[&(sa, sb)];
            for c in 0..=level {
                for &symbol in a.alphabet.symbols() {
                    let Some((na, _)) = a.transition(sa, c, symbol) else {
                        continue;
                    };
                    let Some((nb, _)) = b.transition(sb, c, symbol) else {
                        continue;
                    };
                    let next_id = *ids.entry((na, nb)).or_insert_with(|| {
                        let id = ids.len();
                        let next_level = a
                            .alphabet
                            .effect(symbol)
                            .map(|e| (c as i64 + e.value() as i64).max(0) as usize)
                            .unwrap_or(c);
                        queue.push_back((na, nb, next_level));
                        levels.push(next_level);
                        id
                    });
                    transitions.insert((pid, c, symbol), (next_id, TransitionColor::Initial));
                }
            }
            let _ = at_level;
        }

        let accepting = ids
            .iter()
            .filter(|((sa, sb), _)| a.accepting.contains(sa) && b.accepting.contains(sb))
            .map(|(_, &id)| id)
            .collect();

        Ok(V1ca {
            alphabet: a.alphabet.clone(),
            num_states: ids.len(),
            initial: 0,
            accepting,
            max_level: level,
            transitions,
            state_level: levels,
        })
    }

    /// Reachability search from the initial state for any reachable
    /// accepting configuration (state with counter exactly 0). Returns the
    /// first accepted word found, or `None` if the language is empty.
    ///
    /// The search space `(state, counter)` is explored breadth-first and
    /// bounded at `num_states * (max_level + 1) + max_level + 1` counter
    /// steps beyond which clipped transitions repeat identically for a
    /// given state, so any genuinely new acceptance would already have
    /// appeared within that bound.
    pub fn empty(&self) -> Option<Word> {
        let bound = self.num_states * (self.max_level + 1) + self.max_level + 1;
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back((self.initial, 0usize, Word::new()));
        visited.insert((self.initial, 0usize));

        if self.accepting.contains(&self.initial) {
            return Some(Word::new());
        }

        while let Some((state, counter, word)) = queue.pop_front() {
            if counter > bound {
                continue;
            }
            for &symbol in self.alphabet.symbols() {
                let Some(effect) = self.alphabet.effect(symbol) else {
                    continue;
                };
                let Some((next, _)) = self.transition(state, counter, symbol) else {
                    continue;
                };
                let new_counter = counter as i64 + effect.value() as i64;
                if new_counter < 0 {
                    continue;
                }
                let new_counter = new_counter as usize;
                if !visited.insert((next, new_counter)) {
                    continue;
                }
                let mut new_word = word.clone();
                new_word.push(symbol);
                if new_counter == 0 && self.accepting.contains(&next) {
                    return Some(new_word);
                }
                queue.push_back((next, new_counter, new_word));
            }
        }
        None
    }

    /// `self ⊆ other` tested as `emptiness(self ∩ complement(other))`.
    /// `None` means the subset relation holds; `Some(w)` is a word accepted
    /// by `self` but rejected by `other`.
    pub fn is_subset_of(&self, other: &V1ca) -> CoreResult<Option<Word>> {
        let complement = other.complement();
        let witness_space = self.intersection(&complement)?;
        Ok(witness_space.empty())
    }

    /// `self ≡ other` tested as mutual subset. `None` means equivalent;
    /// `Some(w)` is a counter-example distinguishing the two languages.
    pub fn is_equivalent_to(&self, other: &V1ca) -> CoreResult<Option<Word>> {
        if let Some(w) = self.is_subset_of(other)? {
            return Ok(Some(w));
        }
        other.is_subset_of(self)
    }
}

#[cfg(feature = "render")]
impl onecounter_render::ToDot for V1ca {
    fn to_dot(&self) -> onecounter_render::DotDocument {
        let mut body = String::new();
        for state in 0..self.num_states {
            let shape = if self.accepting.contains(&state) {
                "doublecircle"
            } else {
                "circle"
            };
            body.push_str(&format!(
                "  {state} [label=\"{state}@{}\", shape=\"{shape}\"];\n",
                self.state_level[state]
            ));
        }
        for (&(state, counter, symbol), &(next, color)) in &self.transitions {
            let color_name = match color {
                TransitionColor::Initial => "black",
                TransitionColor::LoopOut => "blue",
                TransitionColor::LoopInTop => "gold4",
                TransitionColor::LoopInBottom => "red",
            };
            body.push_str(&format!(
                "  {state} -> {next} [label=\"{symbol} @{counter}\", color=\"{color_name}\"];\n"
            ));
        }
        onecounter_render::DotDocument(format!("digraph V1CA {{\n{body}}}\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::word;

    fn anbn() -> V1ca {
        // 2 states, period (m=1, k=1): state 0 at level 0 (initial+accepting),
        // state 1 at level 1.
        let alphabet = VisiblyAlphabet::new([('a', 1), ('b', -1)]).unwrap();
        let mut transitions = HashMap::new();
        transitions.insert((0, 0, 'a'), (1, TransitionColor::Initial));
        transitions.insert((1, 0, 'b'), (0, TransitionColor::LoopInBottom));
        transitions.insert((1, 1, 'a'), (1, TransitionColor::LoopOut));
        transitions.insert((1, 1, 'b'), (0, TransitionColor::LoopInBottom));
        V1ca::new(
            alphabet,
            2,
            0,
            HashSet::from([0]),
            1,
            transitions,
            vec![0, 1],
        )
    }

    #[test]
    fn accepts_anbn() {
        let a = anbn();
        assert!(a.accepts(&word("")));
        assert!(a.accepts(&word("ab")));
        assert!(a.accepts(&word("aabb")));
        assert!(!a.accepts(&word("aab")));
        assert!(!a.accepts(&word("ba")));
    }

    #[test]
    fn complement_flips_acceptance() {
        let a = anbn();
        let c = a.complement();
        for w in ["", "ab", "aabb", "aab", "ba", "aaabbb"] {
            assert_ne!(a.accepts(&word(w)), c.accepts(&word(w)), "word {w:?}");
        }
    }

    #[test]
    fn intersection_is_conjunction() {
        let a = anbn();
        let b = anbn();
        let inter = a.intersection(&b).unwrap();
        for w in ["", "ab", "aabb", "aab", "ba"] {
            assert_eq!(inter.accepts(&word(w)), a.accepts(&word(w)) && b.accepts(&word(w)));
        }
    }

    #[test]
    fn equivalence_reflexive() {
        let a = anbn();
        assert_eq!(a.is_equivalent_to(&a).unwrap(), None);
    }

    #[test]
    fn empty_finds_witness() {
        let alphabet = VisiblyAlphabet::new([('a', 1), ('b', -1)]).unwrap();
        let mut transitions = HashMap::new();
        transitions.insert((0, 0, 'a'), (1, TransitionColor::Initial));
        // no accepting state reachable
        let unreachable = V1ca::new(alphabet.clone(), 2, 0, HashSet::new(), 1, transitions.clone(), vec![0, 1]);
        assert_eq!(unreachable.empty(), None);

        let mut accepting = unreachable.clone();
        accepting.accepting.insert(0);
        assert_eq!(accepting.empty(), Some(word("")));
    }
}
