//! The driving loop: spec.md §4.7.

use tracing::info;

use crate::alphabet::{Alphabet, BasicAlphabet, VisiblyAlphabet, VisiblyCv, Word};
use crate::automaton::{Automaton, R1ca, V1ca};
use crate::behaviour_graph::BehaviourGraph;
use crate::error::{CoreError, CoreResult};
use crate::rst::Rst;
use crate::teacher::{Cached, CounterCapability, RealtimeCv, Teacher};

/// Owns a teacher for the duration of one `learn_*` call (spec.md §5:
/// "the teacher is referenced, not owned, by the learner" — here the
/// learner takes the teacher by value and hands it back via
/// [`Learner::into_teacher`], which is equivalent for a single-threaded,
/// single-run caller and avoids a lifetime parameter threading through
/// every method). The teacher is wrapped in [`Cached`] on construction, so
/// every `learn_*` call never re-asks membership of a word it has already
/// asked (spec.md:66), across closure/consistency passes and across
/// counter-example rounds alike.
pub struct Learner<T> {
    teacher: Cached<T>,
}

fn validate_v1ca_counterexample(ce: &Word, alphabet: &VisiblyAlphabet) -> CoreResult<()> {
    if !alphabet.contains_word(ce) {
        return Err(CoreError::TeacherContractViolation(format!(
            "counter-example {:?} contains a symbol outside the alphabet",
            crate::alphabet::word_to_string(ce)
        )));
    }
    if alphabet.counter_value(ce) != 0 {
        return Err(CoreError::TeacherContractViolation(format!(
            "counter-example {:?} has non-zero counter value",
            crate::alphabet::word_to_string(ce)
        )));
    }
    Ok(())
}

fn validate_r1ca_counterexample(ce: &Word, alphabet: &BasicAlphabet) -> CoreResult<()> {
    if !alphabet.contains_word(ce) {
        return Err(CoreError::TeacherContractViolation(format!(
            "counter-example {:?} contains a symbol outside the alphabet",
            crate::alphabet::word_to_string(ce)
        )));
    }
    Ok(())
}

impl<T> Learner<T> {
    pub fn new(teacher: T) -> Self {
        Self {
            teacher: Cached::new(teacher),
        }
    }

    pub fn teacher(&self) -> &T {
        self.teacher.inner()
    }

    pub fn into_teacher(self) -> T {
        self.teacher.into_inner()
    }
}

impl<T: Teacher> Learner<T> {
    /// `learn_v1ca(verbose) → V1CA` (spec.md §6). Requires a visibly
    /// alphabet.
    pub fn learn_v1ca(&mut self, alphabet: &VisiblyAlphabet, verbose: bool) -> CoreResult<V1ca> {
        let mut cv = VisiblyCv(alphabet);
        let symbols = alphabet.symbols().to_vec();
        let mut rst = Rst::new(&mut self.teacher);
        let mut round = 0usize;

        loop {
            round += 1;
            loop {
                let consistent = rst.make_consistent(&mut self.teacher, &mut cv, &symbols);
                let closed = rst.make_closed(&mut self.teacher, &mut cv, &symbols);
                if consistent && closed {
                    break;
                }
            }
            let deduped = rst.remove_duplicate_rows();
            let bg = BehaviourGraph::build(&deduped, &mut self.teacher, &mut cv, &symbols);
            if verbose {
                info!(round, tables = rst.size(), "built behaviour graph");
                bg.describe("behaviour-graph");
            }

            if let Some(ce) = self.teacher.partial_equivalence(&bg, "partial-equivalence") {
                validate_v1ca_counterexample(&ce, alphabet)?;
                rst.add_counter_example(&ce, &mut self.teacher, &mut cv);
                continue;
            }

            let automaton = match bg.find_period() {
                Some((m, k, pairing)) => bg.fold_v1ca(alphabet, m, k, &pairing)?,
                None => bg.fold_v1ca_direct(alphabet),
            };
            if verbose {
                automaton.describe("v1ca-hypothesis");
            }

            let wrapped = Automaton::V1ca(automaton.clone());
            if let Some(ce) = self.teacher.equivalence(&wrapped, "equivalence") {
                validate_v1ca_counterexample(&ce, alphabet)?;
                rst.add_counter_example(&ce, &mut self.teacher, &mut cv);
                continue;
            }

            if verbose {
                info!(round, "learn_v1ca converged");
            }
            return Ok(automaton);
        }
    }
}

impl<T: CounterCapability> Learner<T> {
    /// `learn_r1ca(verbose) → R1CA` (spec.md §6). Requires a basic alphabet
    /// and a counter-capable teacher.
    pub fn learn_r1ca(&mut self, alphabet: &BasicAlphabet, verbose: bool) -> CoreResult<R1ca> {
        let mut cv = RealtimeCv;
        let symbols = alphabet.symbols().to_vec();
        let mut rst = Rst::new(&mut self.teacher);
        let mut round = 0usize;

        loop {
            round += 1;
            loop {
                let consistent = rst.make_consistent(&mut self.teacher, &mut cv, &symbols);
                let closed = rst.make_closed(&mut self.teacher, &mut cv, &symbols);
                if consistent && closed {
                    break;
                }
            }
            let deduped = rst.remove_duplicate_rows();
            let bg = BehaviourGraph::build(&deduped, &mut self.teacher, &mut cv, &symbols);
            if verbose {
                info!(round, tables = rst.size(), "built behaviour graph");
                bg.describe("behaviour-graph");
            }

            if let Some(ce) = self.teacher.partial_equivalence(&bg, "partial-equivalence") {
                validate_r1ca_counterexample(&ce, alphabet)?;
                rst.add_counter_example(&ce, &mut self.teacher, &mut cv);
                continue;
            }

            let automaton = match bg.find_period() {
                Some((m, k, pairing)) => bg.fold_r1ca(alphabet, m, k, &pairing)?,
                None => bg.fold_r1ca_direct(alphabet),
            };
            if verbose {
                automaton.describe("r1ca-hypothesis");
            }

            let wrapped = Automaton::R1ca(automaton.clone());
            if let Some(ce) = self.teacher.equivalence(&wrapped, "equivalence") {
                validate_r1ca_counterexample(&ce, alphabet)?;
                rst.add_counter_example(&ce, &mut self.teacher, &mut cv);
                continue;
            }

            if verbose {
                info!(round, "learn_r1ca converged");
            }
            return Ok(automaton);
        }
    }
}
