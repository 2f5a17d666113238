//! Active learning of one-counter automata (V1CA / R1CA) from a
//! membership/equivalence oracle.
//!
//! The five components of spec.md §2, leaves first: [`alphabet`], [`teacher`],
//! [`rst`], [`behaviour_graph`], [`automaton`]; [`learner`] drives them.

pub mod alphabet;
pub mod automaton;
pub mod behaviour_graph;
pub mod error;
pub mod format;
pub mod learner;
pub mod rst;
pub mod teacher;

pub use alphabet::{word, word_to_string, Alphabet, BasicAlphabet, Symbol, VisiblyAlphabet, Word};
pub use automaton::{Automaton, Describe, R1ca, V1ca};
pub use behaviour_graph::BehaviourGraph;
pub use error::{CoreError, CoreResult};
pub use learner::Learner;
pub use rst::Rst;
pub use teacher::{Cached, CounterCapability, Teacher};
