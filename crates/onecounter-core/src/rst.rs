//! The regular stratified table: spec.md §4.3.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::alphabet::{word_to_string, CounterValueSource, Symbol, Word};
use crate::error::{CoreError, CoreResult};
use crate::teacher::Teacher;

/// One counter-value stratum: a dense row/column matrix of membership
/// answers, keyed on insertion-ordered row and column labels (spec.md §3
/// "RST").
#[derive(Debug, Clone, Default)]
pub struct Table {
    cols: IndexSet<Word>,
    rows: IndexMap<Word, Vec<bool>>,
}

impl Table {
    fn with_epsilon_col() -> Self {
        let mut cols = IndexSet::new();
        cols.insert(Word::new());
        Self {
            cols,
            rows: IndexMap::new(),
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &Word> {
        self.rows.keys()
    }

    pub fn cols(&self) -> impl Iterator<Item = &Word> {
        self.cols.iter()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.cols.len()
    }

    pub fn contains_row(&self, w: &[Symbol]) -> bool {
        self.rows.contains_key(w)
    }

    pub fn contains_col(&self, w: &[Symbol]) -> bool {
        self.cols.contains(w)
    }

    pub fn row_vector(&self, w: &[Symbol]) -> Option<&[bool]> {
        self.rows.get(w).map(Vec::as_slice)
    }

    /// The boolean vector `w` would have against this table's current
    /// columns, without inserting `w` as a row.
    pub(crate) fn compute_vector(&self, w: &[Symbol], teacher: &mut impl Teacher) -> Vec<bool> {
        self.cols
            .iter()
            .map(|c| {
                let mut query = w.to_vec();
                query.extend_from_slice(c);
                teacher.membership(&query)
            })
            .collect()
    }

    /// The row in this table whose vector matches `vector`, if any (an
    /// O-equivalence witness).
    pub(crate) fn find_equivalent_row(&self, vector: &[bool]) -> Option<&Word> {
        self.rows
            .iter()
            .find(|(_, v)| v.as_slice() == vector)
            .map(|(w, _)| w)
    }
}

/// A sequence of [`Table`]s indexed by counter value (spec.md §3 "RST").
#[derive(Debug, Clone, Default)]
pub struct Rst {
    tables: Vec<Table>,
}

impl Rst {
    /// Creates an RST with table 0 containing row ε, column ε, populated by
    /// a membership query on the empty word (spec.md §4.3 `new`).
    pub fn new(teacher: &mut impl Teacher) -> Self {
        let mut table0 = Table::with_epsilon_col();
        let empty_answer = teacher.membership(&[]);
        table0.rows.insert(Word::new(), vec![empty_answer]);
        Self {
            tables: vec![table0],
        }
    }

    pub fn size(&self) -> usize {
        self.tables.len()
    }

    pub fn table(&self, cv: usize) -> Option<&Table> {
        self.tables.get(cv)
    }

    fn ensure_table(&mut self, cv: usize) {
        while self.tables.len() <= cv {
            trace!(level = self.tables.len(), "creating new RST table");
            self.tables.push(Table::with_epsilon_col());
        }
    }

    /// Appends `w` as a row at table `cv`, filling its vector from cached
    /// membership queries. Errors on a duplicate label (spec.md §4.3); see
    /// [`Rst::add_row_if_absent`] for the lenient path.
    pub fn add_row(&mut self, w: Word, cv: usize, teacher: &mut impl Teacher) -> CoreResult<()> {
        self.ensure_table(cv);
        if self.tables[cv].contains_row(&w) {
            return Err(CoreError::DuplicateLabel {
                kind: "row",
                label: word_to_string(&w),
                table: cv,
            });
        }
        let vector = self.tables[cv].compute_vector(&w, teacher);
        trace!(row = %word_to_string(&w), level = cv, "added RST row");
        self.tables[cv].rows.insert(w, vector);
        Ok(())
    }

    pub fn add_row_if_absent(&mut self, w: Word, cv: usize, teacher: &mut impl Teacher) {
        self.ensure_table(cv);
        if !self.tables[cv].contains_row(&w) {
            self.add_row(w, cv, teacher).expect("just checked absence");
        }
    }

    /// Appends `w` as a column at table `cv`, filling every existing row's
    /// vector with a new cell. Errors on a duplicate label; see
    /// [`Rst::add_col_if_absent`].
    pub fn add_col(&mut self, w: Word, cv: usize, teacher: &mut impl Teacher) -> CoreResult<()> {
        self.ensure_table(cv);
        if self.tables[cv].contains_col(&w) {
            return Err(CoreError::DuplicateLabel {
                kind: "column",
                label: word_to_string(&w),
                table: cv,
            });
        }
        let row_labels: Vec<Word> = self.tables[cv].rows.keys().cloned().collect();
        for row in row_labels {
            let mut query = row.clone();
            query.extend_from_slice(&w);
            let answer = teacher.membership(&query);
            self.tables[cv]
                .rows
                .get_mut(&row)
                .expect("row label taken from this table")
                .push(answer);
        }
        trace!(col = %word_to_string(&w), level = cv, "added RST column");
        self.tables[cv].cols.insert(w);
        Ok(())
    }

    pub fn add_col_if_absent(&mut self, w: Word, cv: usize, teacher: &mut impl Teacher) {
        self.ensure_table(cv);
        if !self.tables[cv].contains_col(&w) {
            self.add_col(w, cv, teacher).expect("just checked absence");
        }
    }

    /// Exact boolean-vector equality of two rows sharing table `cv`
    /// (spec.md §4.3 `compare-rows`).
    pub fn compare_rows(&self, u: &[Symbol], v: &[Symbol], cv: usize) -> CoreResult<bool> {
        let table = self
            .tables
            .get(cv)
            .ok_or(CoreError::OutOfRange { value: cv as i64, size: self.tables.len() })?;
        let ru = table
            .row_vector(u)
            .ok_or_else(|| CoreError::MissingColumn { label: word_to_string(u), table: cv })?;
        let rv = table
            .row_vector(v)
            .ok_or_else(|| CoreError::MissingColumn { label: word_to_string(v), table: cv })?;
        Ok(ru == rv)
    }

    /// For every non-empty prefix `p` of `ce` with `cv(p) ≥ 0`, ensures `p`
    /// is a row at table `cv(p)` and that the complementary suffix is a
    /// column there. Per the resolved convention (spec.md §9): the suffix
    /// column's own counter value is `-cv(p)`, consistent with "column cv is
    /// the negation of the table index" — only where it lands matters here,
    /// since the suffix label itself is just the remaining symbols of `ce`.
    pub fn add_counter_example<T: Teacher, C: CounterValueSource<T>>(
        &mut self,
        ce: &[Symbol],
        teacher: &mut T,
        cv_src: &mut C,
    ) {
        debug!(ce = %word_to_string(ce), "ingesting counter-example");
        for i in 1..=ce.len() {
            let prefix = &ce[..i];
            let cv = cv_src.counter_value(teacher, prefix);
            if cv < 0 {
                continue;
            }
            let cv = cv as usize;
            self.add_row_if_absent(prefix.to_vec(), cv, teacher);
            let suffix = ce[i..].to_vec();
            self.add_col_if_absent(suffix, cv, teacher);
        }
    }

    /// A new RST in which, within each table, only the first occurrence of
    /// every distinct row vector survives (spec.md §4.3 `remove-duplicate-rows`).
    pub fn remove_duplicate_rows(&self) -> Rst {
        let tables = self
            .tables
            .iter()
            .map(|table| {
                let mut seen: Vec<&[bool]> = Vec::new();
                let mut rows = IndexMap::new();
                for (label, vector) in &table.rows {
                    if seen.iter().any(|v| *v == vector.as_slice()) {
                        continue;
                    }
                    seen.push(vector.as_slice());
                    rows.insert(label.clone(), vector.clone());
                }
                Table {
                    cols: table.cols.clone(),
                    rows,
                }
            })
            .collect();
        Rst { tables }
    }

    /// Drives one full closure pass. Returns `true` iff the scan found no
    /// violation; on the first violation it adds the missing witness row and
    /// returns `false` so the driver re-runs both normal-form passes
    /// (spec.md §4.3 `make-closed`).
    pub fn make_closed<T: Teacher, C: CounterValueSource<T>>(
        &mut self,
        teacher: &mut T,
        cv_src: &mut C,
        symbols: &[Symbol],
    ) -> bool {
        for i in 0..self.tables.len() {
            let rows: Vec<Word> = self.tables[i].rows.keys().cloned().collect();
            for u in &rows {
                for &sigma in symbols {
                    let mut usigma = u.clone();
                    usigma.push(sigma);
                    let cv = cv_src.counter_value(teacher, &usigma);
                    if cv < 0 || cv as usize >= self.tables.len() {
                        continue;
                    }
                    let target = cv as usize;
                    let vector = self.tables[target].compute_vector(&usigma, teacher);
                    if self.tables[target].find_equivalent_row(&vector).is_some() {
                        continue;
                    }
                    debug!(
                        word = %word_to_string(&usigma),
                        level = target,
                        "closure violation: adding witness row"
                    );
                    self.tables[target].rows.insert(usigma, vector);
                    return false;
                }
            }
        }
        true
    }

    /// Drives one full consistency pass. On a violation at `(u, v, σ)`
    /// witnessed by column `c`, adds `σ·c` as a new row to table `cv(uσ)`
    /// and returns `false` (spec.md §4.3 `make-consistent`; the literal
    /// "new row, not new column" rule is confirmed against the original
    /// `learner.cpp::make_rst_consistent`).
    pub fn make_consistent<T: Teacher, C: CounterValueSource<T>>(
        &mut self,
        teacher: &mut T,
        cv_src: &mut C,
        symbols: &[Symbol],
    ) -> bool {
        for i in 0..self.tables.len() {
            let rows: Vec<Word> = self.tables[i].rows.keys().cloned().collect();
            for a in 0..rows.len() {
                for b in (a + 1)..rows.len() {
                    let (u, v) = (&rows[a], &rows[b]);
                    if self.tables[i].row_vector(u) != self.tables[i].row_vector(v) {
                        continue;
                    }
                    for &sigma in symbols {
                        let mut usigma = u.clone();
                        usigma.push(sigma);
                        let mut vsigma = v.clone();
                        vsigma.push(sigma);
                        let cv_u = cv_src.counter_value(teacher, &usigma);
                        let cv_v = cv_src.counter_value(teacher, &vsigma);
                        if cv_u < 0 || cv_u != cv_v || cv_u as usize >= self.tables.len() {
                            continue;
                        }
                        let target = cv_u as usize;
                        let vec_u = self.tables[target].compute_vector(&usigma, teacher);
                        let vec_v = self.tables[target].compute_vector(&vsigma, teacher);
                        if vec_u == vec_v {
                            continue;
                        }
                        let witness_col = self.tables[target]
                            .cols
                            .iter()
                            .zip(vec_u.iter().zip(vec_v.iter()))
                            .find(|(_, (a, b))| a != b)
                            .map(|(c, _)| c.clone())
                            .expect("vectors differ, so some column witnesses it");
                        let mut new_row = vec![sigma];
                        new_row.extend_from_slice(&witness_col);
                        debug!(
                            row = %word_to_string(&new_row),
                            level = target,
                            "consistency violation: adding witness row"
                        );
                        self.add_row_if_absent(new_row, target, teacher);
                        return false;
                    }
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::{word, Alphabet, VisiblyAlphabet, VisiblyCv};

    struct AnBn;
    impl Teacher for AnBn {
        fn membership(&mut self, w: &[Symbol]) -> bool {
            let n_a = w.iter().take_while(|&&c| c == 'a').count();
            let rest = &w[n_a..];
            n_a == rest.len() && rest.iter().all(|&c| c == 'b')
        }
        fn partial_equivalence(
            &mut self,
            _bg: &crate::behaviour_graph::BehaviourGraph,
            _tag: &str,
        ) -> Option<Word> {
            None
        }
        fn equivalence(&mut self, _automaton: &crate::automaton::Automaton, _tag: &str) -> Option<Word> {
            None
        }
    }

    fn alphabet() -> VisiblyAlphabet {
        VisiblyAlphabet::new([('a', 1), ('b', -1)]).unwrap()
    }

    #[test]
    fn new_populates_epsilon() {
        let mut teacher = AnBn;
        let rst = Rst::new(&mut teacher);
        assert_eq!(rst.size(), 1);
        assert_eq!(rst.table(0).unwrap().row_vector(&[]), Some([true].as_slice()));
    }

    #[test]
    fn closure_adds_missing_witness() {
        let mut teacher = AnBn;
        let alphabet = alphabet();
        let mut cv = VisiblyCv(&alphabet);
        let mut rst = Rst::new(&mut teacher);
        let symbols = alphabet.symbols().to_vec();
        assert!(!rst.make_closed(&mut teacher, &mut cv, &symbols));
        assert!(rst.table(1).unwrap().contains_row(&word("a")));
    }

    #[test]
    fn add_counter_example_populates_prefix_tables() {
        let mut teacher = AnBn;
        let alphabet = alphabet();
        let mut cv = VisiblyCv(&alphabet);
        let mut rst = Rst::new(&mut teacher);
        rst.add_counter_example(&word("aabb"), &mut teacher, &mut cv);
        assert_eq!(rst.size(), 3);
        assert!(rst.table(0).unwrap().contains_row(&word("aabb")));
        assert!(rst.table(1).unwrap().contains_row(&word("a")));
        assert!(rst.table(2).unwrap().contains_row(&word("aa")));
    }

    #[test]
    fn remove_duplicate_rows_keeps_first_occurrence() {
        let mut teacher = AnBn;
        let mut rst = Rst::new(&mut teacher);
        rst.add_row(word("b"), 0, &mut teacher).unwrap();
        let deduped = rst.remove_duplicate_rows();
        assert_eq!(deduped.table(0).unwrap().num_rows(), 1);
    }
}
