//! Alphabets: finite symbol sets, optionally annotated with a counter effect.

use indexmap::{IndexMap, IndexSet};

use crate::error::{CoreError, CoreResult};

/// A single-character atom. Words are sequences of `Symbol`.
pub type Symbol = char;

/// A finite ordered sequence of symbols. The empty word is `Vec::new()`.
pub type Word = Vec<Symbol>;

/// Builds a [`Word`] from a `&str`, one symbol per `char`.
pub fn word(s: &str) -> Word {
    s.chars().collect()
}

/// Renders a word back to a displayable string (used in error messages and logs).
pub fn word_to_string(w: &[Symbol]) -> String {
    w.iter().collect()
}

/// Common behaviour of both alphabet variants.
pub trait Alphabet {
    /// Whether `symbol` belongs to this alphabet.
    fn contains(&self, symbol: Symbol) -> bool;

    /// All symbols, in a fixed deterministic order.
    fn symbols(&self) -> &[Symbol];

    /// Whether every symbol of `w` belongs to this alphabet.
    fn contains_word(&self, w: &[Symbol]) -> bool {
        w.iter().all(|&s| self.contains(s))
    }
}

/// A counter-effect-free alphabet: just a set of symbols. Used by R1CA, whose
/// transitions carry arbitrary counter effects rather than effects determined
/// by the symbol alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAlphabet {
    symbols: Vec<Symbol>,
    set: IndexSet<Symbol>,
}

impl BasicAlphabet {
    pub fn new(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        let mut set: IndexSet<Symbol> = symbols.into_iter().collect();
        set.sort();
        let symbols = set.iter().copied().collect();
        Self { symbols, set }
    }
}

impl Alphabet for BasicAlphabet {
    fn contains(&self, symbol: Symbol) -> bool {
        self.set.contains(&symbol)
    }

    fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

/// The counter effect of a symbol in a visibly alphabet: `+1` for a call
/// symbol, `-1` for a return symbol, `0` for an internal symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Call,
    Internal,
    Return,
}

impl Effect {
    pub fn value(self) -> i32 {
        match self {
            Effect::Call => 1,
            Effect::Internal => 0,
            Effect::Return => -1,
        }
    }

    pub fn from_value(effect: i32, symbol: Symbol) -> CoreResult<Self> {
        match effect {
            1 => Ok(Effect::Call),
            0 => Ok(Effect::Internal),
            -1 => Ok(Effect::Return),
            _ => Err(CoreError::InvalidEffect { symbol, effect }),
        }
    }
}

/// An alphabet whose symbols are each bound to a fixed counter effect in
/// `{-1, 0, +1}`. The counter value of a word is the sum of the effects of
/// its symbols (spec.md §3 "Word").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisiblyAlphabet {
    symbols: Vec<Symbol>,
    effects: IndexMap<Symbol, Effect>,
}

impl VisiblyAlphabet {
    /// Builds a visibly alphabet from `(symbol, effect)` pairs where effect is
    /// one of `-1`, `0`, `+1`. Returns [`CoreError::InvalidEffect`] otherwise.
    pub fn new(symbols_and_effects: impl IntoIterator<Item = (Symbol, i32)>) -> CoreResult<Self> {
        let mut effects = IndexMap::new();
        for (symbol, effect) in symbols_and_effects {
            effects.insert(symbol, Effect::from_value(effect, symbol)?);
        }
        effects.sort_keys();
        let symbols = effects.keys().copied().collect();
        Ok(Self { symbols, effects })
    }

    pub fn effect(&self, symbol: Symbol) -> Option<Effect> {
        self.effects.get(&symbol).copied()
    }

    /// The counter value of a word: the sum of the effects of its symbols.
    /// Unknown symbols contribute no effect (callers are expected to check
    /// [`Alphabet::contains_word`] first where that matters).
    pub fn counter_value(&self, w: &[Symbol]) -> i32 {
        w.iter()
            .filter_map(|&s| self.effect(s))
            .map(Effect::value)
            .sum()
    }

    /// A word is valid iff no prefix has negative counter value.
    pub fn is_valid(&self, w: &[Symbol]) -> bool {
        let mut cv = 0;
        for &s in w {
            cv += self.effect(s).map(Effect::value).unwrap_or(0);
            if cv < 0 {
                return false;
            }
        }
        true
    }
}

impl Alphabet for VisiblyAlphabet {
    fn contains(&self, symbol: Symbol) -> bool {
        self.effects.contains_key(&symbol)
    }

    fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

/// Source of counter values for a word, abstracting over the visibly case
/// (a pure function of the alphabet) and the realtime case (a query against
/// a counter-capable teacher). See [`crate::teacher::CounterCapability`].
pub trait CounterValueSource<T> {
    fn counter_value(&mut self, teacher: &mut T, word: &[Symbol]) -> i32;
}

/// Counter-value source for V1CA learning: the counter value is determined
/// solely by the symbols of the word, via the visibly alphabet.
#[derive(Debug, Clone, Copy)]
pub struct VisiblyCv<'a>(pub &'a VisiblyAlphabet);

impl<'a, T> CounterValueSource<T> for VisiblyCv<'a> {
    fn counter_value(&mut self, _teacher: &mut T, word: &[Symbol]) -> i32 {
        self.0.counter_value(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibly_alphabet_counter_value() {
        let a = VisiblyAlphabet::new([('a', 1), ('b', -1), ('x', 0)]).unwrap();
        assert_eq!(a.counter_value(&word("aabb")), 0);
        assert_eq!(a.counter_value(&word("aab")), 1);
        assert_eq!(a.counter_value(&word("xyz")), 0);
        assert!(a.is_valid(&word("aabb")));
        assert!(!a.is_valid(&word("ba")));
    }

    #[test]
    fn invalid_effect_rejected() {
        assert_eq!(
            VisiblyAlphabet::new([('a', 2)]),
            Err(CoreError::InvalidEffect {
                symbol: 'a',
                effect: 2
            })
        );
    }

    #[test]
    fn basic_alphabet_contains() {
        let a = BasicAlphabet::new(['a', 'b']);
        assert!(a.contains('a'));
        assert!(!a.contains('c'));
        assert_eq!(a.symbols(), &['a', 'b']);
    }
}
