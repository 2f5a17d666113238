//! The textual automaton format: spec.md §6. Two header lines
//! (`<state_count>`, `<max_level>`) followed by one transition per line,
//! `src->dst symbol c1` or `src->dst symbol c1-c2`. Whitespace-significant;
//! blank lines ignored; numbers in decimal.
//!
//! This format only carries structure (states, max level, transitions): the
//! initial state, accepting states and (for V1CA) per-edge coloring are
//! supplied by the caller when converting a [`ParsedAutomaton`] into a
//! concrete automaton, since the grammar spec.md §6 describes has no field
//! for them.

use std::collections::HashSet;

use crate::alphabet::{Alphabet, Symbol, VisiblyAlphabet};
use crate::automaton::{StateId, V1ca};
use crate::error::{CoreError, CoreResult};

/// A single parsed transition line, with its counter range expanded to an
/// inclusive `(low, high)` pair (a bare `c1` parses as `(c1, c1)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTransition {
    pub src: StateId,
    pub dst: StateId,
    pub symbol: Symbol,
    pub range: (usize, usize),
}

/// The structural content of a textual automaton: state count, max level,
/// and the transition lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAutomaton {
    pub state_count: usize,
    pub max_level: usize,
    pub transitions: Vec<ParsedTransition>,
}

fn parse_usize(line: usize, col: usize, s: &str) -> CoreResult<usize> {
    s.parse().map_err(|_| CoreError::Parse {
        line,
        column: col,
        message: format!("expected a decimal number, found '{s}'"),
    })
}

/// Parses the textual automaton format (spec.md §6).
pub fn parse(text: &str) -> CoreResult<ParsedAutomaton> {
    let mut header = Vec::new();
    let mut transitions = Vec::new();
    let mut header_lines_seen = 0;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_end();
        if line.is_empty() {
            continue;
        }
        if header_lines_seen < 2 {
            header.push(parse_usize(line_no, 1, line.trim())?);
            header_lines_seen += 1;
            continue;
        }
        transitions.push(parse_transition_line(line_no, line)?);
    }

    if header.len() < 2 {
        return Err(CoreError::Parse {
            line: header.len() + 1,
            column: 1,
            message: "expected two header lines: state_count then max_level".to_string(),
        });
    }

    Ok(ParsedAutomaton {
        state_count: header[0],
        max_level: header[1],
        transitions,
    })
}

fn parse_transition_line(line_no: usize, line: &str) -> CoreResult<ParsedTransition> {
    let mut parts = line.split_whitespace();
    let arrow = parts.next().ok_or_else(|| CoreError::Parse {
        line: line_no,
        column: 1,
        message: "empty transition line".to_string(),
    })?;
    let (src_str, dst_str) = arrow.split_once("->").ok_or_else(|| CoreError::Parse {
        line: line_no,
        column: 1,
        message: format!("expected 'src->dst', found '{arrow}'"),
    })?;
    let src = parse_usize(line_no, 1, src_str)?;
    let dst = parse_usize(line_no, src_str.len() + 3, dst_str)?;

    let symbol_str = parts.next().ok_or_else(|| CoreError::Parse {
        line: line_no,
        column: arrow.len() + 2,
        message: "missing symbol field".to_string(),
    })?;
    let mut symbol_chars = symbol_str.chars();
    let symbol = symbol_chars.next().ok_or_else(|| CoreError::Parse {
        line: line_no,
        column: arrow.len() + 2,
        message: "empty symbol field".to_string(),
    })?;
    if symbol_chars.next().is_some() {
        return Err(CoreError::Parse {
            line: line_no,
            column: arrow.len() + 2,
            message: format!("symbol field '{symbol_str}' is not a single character"),
        });
    }

    let range_str = parts.next().ok_or_else(|| CoreError::Parse {
        line: line_no,
        column: arrow.len() + symbol_str.len() + 3,
        message: "missing counter field".to_string(),
    })?;
    let range = match range_str.split_once('-') {
        Some((lo, hi)) => {
            let lo = parse_usize(line_no, 0, lo)?;
            let hi = parse_usize(line_no, 0, hi)?;
            (lo, hi)
        }
        None => {
            let c = parse_usize(line_no, 0, range_str)?;
            (c, c)
        }
    };

    if parts.next().is_some() {
        return Err(CoreError::Parse {
            line: line_no,
            column: 1,
            message: "trailing content after counter field".to_string(),
        });
    }

    Ok(ParsedTransition { src, dst, symbol, range })
}

/// Renders a [`ParsedAutomaton`] back to text, one transition per line.
pub fn write(automaton: &ParsedAutomaton) -> String {
    let mut out = format!("{}\n{}\n", automaton.state_count, automaton.max_level);
    for t in &automaton.transitions {
        if t.range.0 == t.range.1 {
            out.push_str(&format!("{}->{} {} {}\n", t.src, t.dst, t.symbol, t.range.0));
        } else {
            out.push_str(&format!("{}->{} {} {}-{}\n", t.src, t.dst, t.symbol, t.range.0, t.range.1));
        }
    }
    out
}

/// Flattens a [`V1ca`]'s transition map into a [`ParsedAutomaton`]. Edge
/// coloring is lost: it is fold bookkeeping, not structure, and the grammar
/// has no column for it.
pub fn v1ca_to_parsed(v1ca: &V1ca) -> ParsedAutomaton {
    let mut transitions = Vec::new();
    for counter in 0..=v1ca.max_level() {
        for state in 0..v1ca.num_states() {
            for &symbol in v1ca.alphabet().symbols() {
                if let Some(dst) = v1ca.successor(state, counter, symbol) {
                    transitions.push(ParsedTransition {
                        src: state,
                        dst,
                        symbol,
                        range: (counter, counter),
                    });
                }
            }
        }
    }
    ParsedAutomaton {
        state_count: v1ca.num_states(),
        max_level: v1ca.max_level(),
        transitions,
    }
}

/// Rebuilds a [`V1ca`] from a [`ParsedAutomaton`]. The format carries no
/// initial state, accepting set or per-state level, so the caller supplies
/// them; every restored transition is colored `Initial`, the same color the
/// behaviour graph itself assigns before folding.
pub fn v1ca_from_parsed(
    parsed: &ParsedAutomaton,
    alphabet: VisiblyAlphabet,
    initial: StateId,
    accepting: HashSet<StateId>,
    state_level: Vec<usize>,
) -> CoreResult<V1ca> {
    use crate::automaton::v1ca::TransitionColor;
    use std::collections::HashMap;

    let mut transitions = HashMap::new();
    for t in &parsed.transitions {
        if t.dst >= parsed.state_count || t.src >= parsed.state_count {
            return Err(CoreError::OutOfRange {
                value: t.dst.max(t.src) as i64,
                size: parsed.state_count,
            });
        }
        for counter in t.range.0..=t.range.1 {
            transitions.insert((t.src, counter, t.symbol), (t.dst, TransitionColor::Initial));
        }
    }
    Ok(V1ca::new(
        alphabet,
        parsed.state_count,
        initial,
        accepting,
        parsed.max_level,
        transitions,
        state_level,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::word;

    #[test]
    fn round_trips_single_and_range_lines() {
        let text = "2\n1\n0->1 a 0\n1->0 b 0-1\n";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed.state_count, 2);
        assert_eq!(parsed.max_level, 1);
        assert_eq!(parsed.transitions.len(), 2);
        assert_eq!(parsed.transitions[1].range, (0, 1));
        assert_eq!(write(&parsed), text);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let text = "1\n0\n\n0->0 a 0\n\n";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed.transitions.len(), 1);
    }

    #[test]
    fn malformed_counter_field_reports_position() {
        let text = "1\n0\n0->0 a x\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, CoreError::Parse { line: 3, .. }));
    }

    #[test]
    fn v1ca_survives_a_parse_write_round_trip() {
        use crate::automaton::v1ca::TransitionColor;
        use std::collections::HashMap;

        let alphabet = VisiblyAlphabet::new([('a', 1), ('b', -1)]).unwrap();
        let mut transitions = HashMap::new();
        transitions.insert((0, 0, 'a'), (1, TransitionColor::Initial));
        transitions.insert((1, 0, 'b'), (0, TransitionColor::LoopInBottom));
        transitions.insert((1, 1, 'a'), (1, TransitionColor::LoopOut));
        transitions.insert((1, 1, 'b'), (0, TransitionColor::LoopInBottom));
        let mut accepting = HashSet::new();
        accepting.insert(0);
        let original = V1ca::new(alphabet.clone(), 2, 0, accepting.clone(), 1, transitions, vec![0, 1]);

        let parsed = v1ca_to_parsed(&original);
        let text = write(&parsed);
        let reparsed = parse(&text).unwrap();
        let rebuilt = v1ca_from_parsed(&reparsed, alphabet, 0, accepting, vec![0, 1]).unwrap();

        assert_eq!(original.num_states(), rebuilt.num_states());
        for w in [vec![], word("ab"), word("aabb"), word("a"), word("abab")] {
            assert_eq!(original.accepts(&w), rebuilt.accepts(&w), "mismatch on {w:?}");
        }
    }
}
