//! The automata families produced by folding a behaviour graph: V1CA
//! (visibly one-counter automaton) and R1CA (realtime one-counter
//! automaton), plus the sum type the learner and the teacher API speak in
//! terms of (see spec.md §9 "Design Notes": "a sum-typed realization").

pub mod r1ca;
pub mod v1ca;

pub use r1ca::R1ca;
pub use v1ca::V1ca;

/// A finite-control-state id. States are not tied one-to-one to a counter
/// level: the same state may be visited at several counter values, which is
/// exactly what lets a folded automaton have a finite state set despite an
/// unbounded counter.
pub type StateId = usize;

/// Either automaton kind the learner can produce, dispatched on by the
/// learner rather than via a shared trait object (see spec.md §9).
#[derive(Debug, Clone)]
pub enum Automaton {
    V1ca(V1ca),
    R1ca(R1ca),
}

impl Automaton {
    pub fn describe(&self, tag: &str) {
        match self {
            Automaton::V1ca(a) => a.describe(tag),
            Automaton::R1ca(a) => a.describe(tag),
        }
    }
}

/// Opaque "describe automaton" side effect (spec.md §6). The default does
/// nothing; enabling the `render` crate feature swaps in an implementation
/// that emits a DOT-format description of the automaton, grounded on
/// `onecounter-render`. Rendering to an actual image is explicitly out of
/// scope (spec.md §1 Non-goals), so even the `render`-feature path only
/// produces text.
pub trait Describe {
    fn describe(&self, tag: &str);
}

#[cfg(not(feature = "render"))]
mod describe_noop {
    use super::Describe;
    use crate::automaton::{R1ca, V1ca};
    use crate::behaviour_graph::BehaviourGraph;

    impl Describe for V1ca {
        fn describe(&self, _tag: &str) {}
    }
    impl Describe for R1ca {
        fn describe(&self, _tag: &str) {}
    }
    impl Describe for BehaviourGraph {
        fn describe(&self, _tag: &str) {}
    }
}

#[cfg(feature = "render")]
mod describe_render {
    use super::Describe;
    use crate::automaton::{R1ca, V1ca};
    use crate::behaviour_graph::BehaviourGraph;

    impl Describe for V1ca {
        fn describe(&self, tag: &str) {
            onecounter_render::emit(self, tag);
        }
    }
    impl Describe for R1ca {
        fn describe(&self, tag: &str) {
            onecounter_render::emit(self, tag);
        }
    }
    impl Describe for BehaviourGraph {
        fn describe(&self, tag: &str) {
            onecounter_render::emit(self, tag);
        }
    }
}
