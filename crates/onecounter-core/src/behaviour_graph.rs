//! The behaviour graph: spec.md §3 "Behaviour graph" / §4.4. A flat
//! node/edge arena rather than a graph of owned, cyclically-linked nodes —
//! see spec.md §9 "a replacement implementation should avoid reference
//! cycles by storing nodes in a flat arena and edges as index pairs".

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::trace;

use crate::alphabet::{word_to_string, CounterValueSource, Symbol, VisiblyAlphabet, Word};
use crate::automaton::r1ca::{ConditionalTransition, Polarity};
use crate::automaton::v1ca::TransitionColor;
use crate::automaton::{R1ca, StateId, V1ca};
use crate::error::{CoreError, CoreResult};
use crate::rst::Rst;
use crate::teacher::Teacher;

/// One O-equivalence class: a node name (its shortest witness row label, per
/// construction order) tagged with its level.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: Word,
    pub level: usize,
    pub accepting: bool,
}

/// An edge labeled with the symbol read and its counter effect.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub symbol: Symbol,
    pub effect: i32,
}

/// Directed multigraph over O-equivalence classes (spec.md §3 "Behaviour
/// graph"). Built fresh from a deduplicated RST after every mutation
/// (spec.md §3 "Lifecycle").
#[derive(Debug, Clone)]
pub struct BehaviourGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    initial: usize,
}

impl BehaviourGraph {
    /// Builds the graph from `rst` (spec.md §4.4 "Construction"). `rst` need
    /// not already be deduplicated; callers pass `rst.remove_duplicate_rows()`
    /// per the learner's driving loop.
    pub fn build<T: Teacher, C: CounterValueSource<T>>(
        rst: &Rst,
        teacher: &mut T,
        cv_src: &mut C,
        symbols: &[Symbol],
    ) -> BehaviourGraph {
        let mut scratch = rst.clone();
        let mut index: HashMap<(usize, Word), usize> = HashMap::new();
        let mut nodes = Vec::new();

        for level in 0..scratch.size() {
            let labels: Vec<Word> = scratch.table(level).unwrap().rows().cloned().collect();
            for label in labels {
                let vector = scratch
                    .table(level)
                    .unwrap()
                    .row_vector(&label)
                    .expect("label taken from this table")
                    .to_vec();
                let accepting = level == 0 && vector.first().copied().unwrap_or(false);
                let id = nodes.len();
                index.insert((level, label.clone()), id);
                nodes.push(Node { name: label, level, accepting });
            }
        }

        let initial = *index
            .get(&(0, Word::new()))
            .expect("RST table 0 always has the epsilon row");

        let mut edges = Vec::new();
        let mut worklist: Vec<usize> = (0..nodes.len()).collect();
        let mut cursor = 0;
        while cursor < worklist.len() {
            let from_id = worklist[cursor];
            cursor += 1;
            let level = nodes[from_id].level;
            let label = nodes[from_id].name.clone();

            for &sigma in symbols {
                let mut succ = label.clone();
                succ.push(sigma);
                let cv = cv_src.counter_value(teacher, &succ);
                if cv < 0 || cv as usize >= scratch.size() {
                    continue;
                }
                let target_level = cv as usize;

                let (vector, found) = {
                    let table = scratch.table(target_level).unwrap();
                    let vector = table.compute_vector(&succ, teacher);
                    let found = table.find_equivalent_row(&vector).cloned();
                    (vector, found)
                };

                let to_id = if let Some(match_label) = found {
                    *index
                        .get(&(target_level, match_label))
                        .expect("matched row was indexed when its table was seeded")
                } else {
                    scratch.add_row_if_absent(succ.clone(), target_level, teacher);
                    let accepting = target_level == 0 && vector.first().copied().unwrap_or(false);
                    let id = nodes.len();
                    index.insert((target_level, succ.clone()), id);
                    nodes.push(Node {
                        name: succ.clone(),
                        level: target_level,
                        accepting,
                    });
                    worklist.push(id);
                    id
                };

                let effect = (cv as i64 - level as i64) as i32;
                edges.push(Edge { from: from_id, to: to_id, symbol: sigma, effect });
            }
        }

        trace!(nodes = nodes.len(), edges = edges.len(), "built behaviour graph");
        BehaviourGraph { nodes, edges, initial }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    pub fn initial(&self) -> usize {
        self.initial
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn max_level(&self) -> usize {
        self.nodes.iter().map(|n| n.level).max().unwrap_or(0)
    }

    /// `states-of-level(k)` (spec.md §4.4).
    pub fn level_slice(&self, level: usize) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.level == level)
            .map(|(i, _)| i)
            .collect()
    }

    fn successors(&self, state: usize) -> Vec<(Symbol, usize)> {
        self.edges
            .iter()
            .filter(|e| e.from == state)
            .map(|e| (e.symbol, e.to))
            .collect()
    }

    fn predecessor_symbols(&self, state: usize) -> HashSet<Symbol> {
        self.edges
            .iter()
            .filter(|e| e.to == state)
            .map(|e| e.symbol)
            .collect()
    }

    /// BFS in lockstep from `u` and `v` for `k` rounds, checking
    /// successor-presence, predecessor-presence, accepting/initial agreement
    /// and a consistent labelling map (spec.md §4.4 step 3).
    fn local_state_isomorphic(&self, u: usize, v: usize, k: usize) -> bool {
        let mut tag: HashMap<usize, usize> = HashMap::new();
        let mut next_tag = 0usize;
        tag.insert(u, next_tag);
        tag.insert(v, next_tag);
        next_tag += 1;

        let mut queue = VecDeque::new();
        queue.push_back((u, v, 0usize));

        while let Some((a, b, depth)) = queue.pop_front() {
            if self.nodes[a].accepting != self.nodes[b].accepting {
                return false;
            }
            if (a == self.initial) != (b == self.initial) {
                return false;
            }
            let succ_a = self.successors(a);
            let succ_b = self.successors(b);
            let symbols_a: HashSet<Symbol> = succ_a.iter().map(|(s, _)| *s).collect();
            let symbols_b: HashSet<Symbol> = succ_b.iter().map(|(s, _)| *s).collect();
            if symbols_a != symbols_b {
                return false;
            }
            if self.predecessor_symbols(a) != self.predecessor_symbols(b) {
                return false;
            }
            if depth >= k {
                continue;
            }
            for &symbol in &symbols_a {
                let na = succ_a.iter().find(|(s, _)| *s == symbol).unwrap().1;
                let nb = succ_b.iter().find(|(s, _)| *s == symbol).unwrap().1;
                match (tag.get(&na), tag.get(&nb)) {
                    (Some(&ta), Some(&tb)) => {
                        if ta != tb {
                            return false;
                        }
                    }
                    (None, None) => {
                        tag.insert(na, next_tag);
                        tag.insert(nb, next_tag);
                        next_tag += 1;
                        queue.push_back((na, nb, depth + 1));
                    }
                    _ => return false,
                }
            }
        }
        true
    }

    fn pair_recursive(
        &self,
        low: &[usize],
        high: &[usize],
        used: &mut [bool],
        i: usize,
        k: usize,
        pairing: &mut Vec<(usize, usize)>,
    ) -> bool {
        if i == low.len() {
            return true;
        }
        for (j, &h) in high.iter().enumerate() {
            if used[j] {
                continue;
            }
            if self.local_state_isomorphic(low[i], h, k) {
                used[j] = true;
                pairing.push((low[i], h));
                if self.pair_recursive(low, high, used, i + 1, k, pairing) {
                    return true;
                }
                pairing.pop();
                used[j] = false;
            }
        }
        false
    }

    /// Nondeterministic pairing of the level-`m` and level-`m+k` slices
    /// (spec.md §4.4 steps 1-4).
    fn try_isomorphism(&self, m: usize, k: usize) -> Option<Vec<(usize, usize)>> {
        let low = self.level_slice(m);
        let high = self.level_slice(m + k);
        if low.len() != high.len() {
            return None;
        }
        let mut used = vec![false; high.len()];
        let mut pairing = Vec::new();
        if self.pair_recursive(&low, &high, &mut used, 0, k, &mut pairing) {
            Some(pairing)
        } else {
            None
        }
    }

    /// Searches `(m, k)` in increasing order of `m` then `k`, returning the
    /// first period found (spec.md §4.4 "Period search"; see spec.md §8
    /// scenario S6 for the tie-break rule this ordering implements).
    pub fn find_period(&self) -> Option<(usize, usize, Vec<(usize, usize)>)> {
        let max_level = self.max_level();
        for m in 0..=max_level {
            let mut k = 1;
            while m + 2 * k <= max_level {
                if let Some(pairing) = self.try_isomorphism(m, k) {
                    trace!(m, k, "period detected");
                    return Some((m, k, pairing));
                }
                k += 1;
            }
        }
        None
    }

    fn kept_and_remap(&self, max_level: usize) -> (Vec<usize>, HashMap<usize, usize>) {
        let keep: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| self.nodes[i].level <= max_level)
            .collect();
        let remap: HashMap<usize, usize> = keep
            .iter()
            .enumerate()
            .map(|(new_id, &old_id)| (old_id, new_id))
            .collect();
        (keep, remap)
    }

    /// Folds this graph into a V1CA using the detected period `(m, k)` and
    /// its pairing (spec.md §4.4 "Folding to V1CA"), grounded on the
    /// original `V1CA_builder::link_period` / `color_edges`: a "loop-in-top"
    /// edge mirrors a bottom state's call transitions onto the top state: a
    /// "loop-in-bottom" edge mirrors a top state's return transitions onto
    /// the bottom state, both keyed at the new max level; any original
    /// bottom-state edge sharing a symbol with a loop-in-bottom mirror is
    /// recolored "loop-out".
    pub fn fold_v1ca(&self, alphabet: &VisiblyAlphabet, m: usize, k: usize, pairing: &[(usize, usize)]) -> CoreResult<V1ca> {
        let max_level = m + k;
        let (keep, remap) = self.kept_and_remap(max_level);

        let mut state_level = vec![0usize; keep.len()];
        let mut accepting = HashSet::new();
        for &old_id in &keep {
            let new_id = remap[&old_id];
            state_level[new_id] = self.nodes[old_id].level;
            if self.nodes[old_id].accepting {
                accepting.insert(new_id);
            }
        }
        let initial = remap[&self.initial];

        let mut transitions: HashMap<(StateId, usize, Symbol), (StateId, TransitionColor)> = HashMap::new();
        for e in &self.edges {
            let (Some(&from), Some(&to)) = (remap.get(&e.from), remap.get(&e.to)) else {
                continue;
            };
            let level = self.nodes[e.from].level;
            transitions.insert((from, level, e.symbol), (to, TransitionColor::Initial));
        }

        let mut loop_in_bottom_symbols: HashMap<StateId, HashSet<Symbol>> = HashMap::new();

        for &(u_low_old, u_high_old) in pairing {
            let u_low = remap[&u_low_old];
            let u_high = remap[&u_high_old];

            for e in self.edges.iter().filter(|e| e.from == u_low_old) {
                if alphabet.effect(e.symbol).map(|eff| eff.value()) == Some(1) {
                    let to = *remap.get(&e.to).ok_or_else(|| {
                        CoreError::FoldInvariantBroken(format!(
                            "loop-in-top mirror target for symbol '{}' falls outside the kept period",
                            e.symbol
                        ))
                    })?;
                    transitions.insert((u_high, max_level, e.symbol), (to, TransitionColor::LoopInTop));
                }
            }
            for e in self.edges.iter().filter(|e| e.from == u_high_old) {
                if alphabet.effect(e.symbol).map(|eff| eff.value()) == Some(-1) {
                    let to = *remap.get(&e.to).ok_or_else(|| {
                        CoreError::FoldInvariantBroken(format!(
                            "loop-in-bottom mirror target for symbol '{}' falls outside the kept period",
                            e.symbol
                        ))
                    })?;
                    transitions.insert((u_low, max_level, e.symbol), (to, TransitionColor::LoopInBottom));
                    loop_in_bottom_symbols.entry(u_low).or_default().insert(e.symbol);
                }
            }
        }

        for (u_low, symbols) in &loop_in_bottom_symbols {
            let native_level = state_level[*u_low];
            for &symbol in symbols {
                if let Some(entry) = transitions.get_mut(&(*u_low, native_level, symbol)) {
                    if entry.1 == TransitionColor::Initial {
                        entry.1 = TransitionColor::LoopOut;
                    }
                }
            }
        }

        Ok(V1ca::new(alphabet.clone(), keep.len(), initial, accepting, max_level, transitions, state_level))
    }

    /// Emits the graph directly as a V1CA with no periodic folding, used
    /// when a period cannot (yet) be found.
    pub fn fold_v1ca_direct(&self, alphabet: &VisiblyAlphabet) -> V1ca {
        let max_level = self.max_level();
        let mut state_level = vec![0usize; self.nodes.len()];
        let mut accepting = HashSet::new();
        for (id, node) in self.nodes.iter().enumerate() {
            state_level[id] = node.level;
            if node.accepting {
                accepting.insert(id);
            }
        }
        let mut transitions = HashMap::new();
        for e in &self.edges {
            transitions.insert((e.from, self.nodes[e.from].level, e.symbol), (e.to, TransitionColor::Initial));
        }
        V1ca::new(alphabet.clone(), self.nodes.len(), self.initial, accepting, max_level, transitions, state_level)
    }

    /// Folds this graph into an R1CA: same skeleton as [`Self::fold_v1ca`],
    /// but the mirrored period edges become conditional (threshold `m`)
    /// rather than being attached to a second physical state (spec.md §4.4
    /// "Folding to R1CA").
    pub fn fold_r1ca(&self, alphabet: &crate::alphabet::BasicAlphabet, m: usize, k: usize, pairing: &[(usize, usize)]) -> CoreResult<R1ca> {
        let max_level = m + k;
        let (keep, remap) = self.kept_and_remap(max_level);

        let mut accepting = HashSet::new();
        for &old_id in &keep {
            if self.nodes[old_id].accepting {
                accepting.insert(remap[&old_id]);
            }
        }
        let initial = remap[&self.initial];

        let mut conditional = Vec::new();
        let mut loop_out_keys: HashSet<(StateId, Symbol)> = HashSet::new();

        for &(u_low_old, u_high_old) in pairing {
            let u_low = remap[&u_low_old];
            let u_high = remap[&u_high_old];

            for e in self.edges.iter().filter(|e| e.from == u_low_old && e.effect > 0) {
                let Some(&to) = remap.get(&e.to) else {
                    return Err(CoreError::FoldInvariantBroken(format!(
                        "loop-in mirror target for symbol '{}' falls outside the kept period",
                        e.symbol
                    )));
                };
                conditional.push(ConditionalTransition {
                    src: u_high,
                    dst: to,
                    symbol: e.symbol,
                    effect: e.effect,
                    threshold: Some((m, Polarity::LoopIn)),
                });
            }
            for e in self.edges.iter().filter(|e| e.from == u_high_old && e.effect < 0) {
                let Some(&to) = remap.get(&e.to) else {
                    return Err(CoreError::FoldInvariantBroken(format!(
                        "loop-in mirror target for symbol '{}' falls outside the kept period",
                        e.symbol
                    )));
                };
                conditional.push(ConditionalTransition {
                    src: u_low,
                    dst: to,
                    symbol: e.symbol,
                    effect: e.effect,
                    threshold: Some((m, Polarity::LoopIn)),
                });
                loop_out_keys.insert((u_low, e.symbol));
            }
        }

        for e in &self.edges {
            let (Some(&from), Some(&to)) = (remap.get(&e.from), remap.get(&e.to)) else {
                continue;
            };
            let threshold = if loop_out_keys.contains(&(from, e.symbol)) {
                Some((m, Polarity::LoopOut))
            } else {
                None
            };
            conditional.push(ConditionalTransition { src: from, dst: to, symbol: e.symbol, effect: e.effect, threshold });
        }

        Ok(R1ca::from_conditional(alphabet.clone(), keep.len(), initial, accepting, max_level, conditional))
    }

    /// Emits the graph directly as an R1CA with max level set to the
    /// highest observed level and no conditional gating — the "no period
    /// found" fallback (spec.md §4.4: "emitted directly as a finite
    /// automaton with max level = ∞"; represented here as the largest level
    /// actually reached, since the transition map must stay finite).
    pub fn fold_r1ca_direct(&self, alphabet: &crate::alphabet::BasicAlphabet) -> R1ca {
        let max_level = self.max_level();
        let mut accepting = HashSet::new();
        for (id, node) in self.nodes.iter().enumerate() {
            if node.accepting {
                accepting.insert(id);
            }
        }
        let conditional = self.edges.iter().map(|e| ConditionalTransition {
            src: e.from,
            dst: e.to,
            symbol: e.symbol,
            effect: e.effect,
            threshold: None,
        });
        R1ca::from_conditional(alphabet.clone(), self.nodes.len(), self.initial, accepting, max_level, conditional)
    }
}

#[cfg(feature = "render")]
impl onecounter_render::ToDot for BehaviourGraph {
    fn to_dot(&self) -> onecounter_render::DotDocument {
        let mut body = String::new();
        for (id, node) in self.nodes.iter().enumerate() {
            let shape = if node.accepting { "doublecircle" } else { "circle" };
            body.push_str(&format!(
                "  {id} [label=\"{}@{}\", shape=\"{shape}\"];\n",
                word_to_string(&node.name),
                node.level
            ));
        }
        for edge in &self.edges {
            body.push_str(&format!(
                "  {} -> {} [label=\"{} /{:+}\"];\n",
                edge.from, edge.to, edge.symbol, edge.effect
            ));
        }
        onecounter_render::DotDocument(format!("digraph BehaviourGraph {{\n{body}}}\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::{word, VisiblyCv};

    struct AnBn;
    impl Teacher for AnBn {
        fn membership(&mut self, w: &[Symbol]) -> bool {
            let n_a = w.iter().take_while(|&&c| c == 'a').count();
            let rest = &w[n_a..];
            n_a == rest.len() && rest.iter().all(|&c| c == 'b')
        }
        fn partial_equivalence(&mut self, _bg: &BehaviourGraph, _tag: &str) -> Option<Word> {
            None
        }
        fn equivalence(&mut self, _automaton: &crate::automaton::Automaton, _tag: &str) -> Option<Word> {
            None
        }
    }

    fn build_anbn_graph() -> (BehaviourGraph, VisiblyAlphabet) {
        let alphabet = VisiblyAlphabet::new([('a', 1), ('b', -1)]).unwrap();
        let mut teacher = AnBn;
        let mut cv = VisiblyCv(&alphabet);
        let mut rst = Rst::new(&mut teacher);
        let symbols = {
            use crate::alphabet::Alphabet;
            alphabet.symbols().to_vec()
        };
        loop {
            let consistent = rst.make_consistent(&mut teacher, &mut cv, &symbols);
            let closed = rst.make_closed(&mut teacher, &mut cv, &symbols);
            if consistent && closed {
                break;
            }
        }
        let deduped = rst.remove_duplicate_rows();
        let graph = BehaviourGraph::build(&deduped, &mut teacher, &mut cv, &symbols);
        (graph, alphabet)
    }

    #[test]
    fn builds_anbn_graph_with_period() {
        let (graph, _alphabet) = build_anbn_graph();
        assert!(graph.num_nodes() >= 2);
        let period = graph.find_period();
        assert!(period.is_some());
    }

    #[test]
    fn fold_produces_equivalent_v1ca() {
        let (graph, alphabet) = build_anbn_graph();
        let (m, k, pairing) = graph.find_period().expect("anbn is periodic");
        let v1ca = graph.fold_v1ca(&alphabet, m, k, &pairing).unwrap();
        assert!(v1ca.accepts(&word("")));
        assert!(v1ca.accepts(&word("ab")));
        assert!(v1ca.accepts(&word("aabb")));
        assert!(!v1ca.accepts(&word("aab")));
        assert!(!v1ca.accepts(&word("ba")));
    }
}
