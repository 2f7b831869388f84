// In: src/labels/store.rs

//! The field collection of a table.
//!
//! A `LabelStore` owns one `LabelCatalog` per field, in insertion order, and
//! the row count every catalog must agree on. It routes field-scoped work to
//! the catalogs and enforces the cross-field rules:
//!
//! * field names are unique;
//! * every catalog spans `n_rows` rows;
//! * a label string lives in one field only, unless the field was added with
//!   `add_field_shared` (the caller then disambiguates queries by field).
//!
//! Every operation validates fully and returns a new store.

use std::collections::BTreeSet;

use hashbrown::{HashMap, HashSet};

use crate::error::LabelFrameError;
use crate::kernels::assign_true::assign_true;
use crate::kernels::mask::Mask;
use crate::labels::catalog::{LabelCatalog, ReplaceMethod, COLLAPSED_PREFIX};
use crate::labels::query::{QueryEngine, Term};

/// One label combination present in the store, and the rows carrying it.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelGroup {
    /// One label per requested field, in the requested field order.
    pub labels: Vec<String>,
    pub mask: Mask,
}

/// Drops repeated entries, keeping the first occurrence of each.
pub(crate) fn dedup_in_order<T: Eq + std::hash::Hash + Clone>(items: &mut Vec<T>) {
    let mut seen: HashSet<T> = HashSet::with_capacity(items.len());
    items.retain(|item| seen.insert(item.clone()));
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelStore {
    fields: Vec<LabelCatalog>,
    n_rows: usize,
}

impl LabelStore {
    /// An empty store over `n_rows` rows.
    pub fn new(n_rows: usize) -> Self {
        Self {
            fields: Vec::new(),
            n_rows,
        }
    }

    /// Builds a store from `(field, labels)` columns. The row count is taken
    /// from the first column; every column goes through `add_field`.
    pub fn from_columns<F, S>(columns: &[(F, Vec<S>)]) -> Result<Self, LabelFrameError>
    where
        F: AsRef<str>,
        S: AsRef<str>,
    {
        let n_rows = columns.first().map_or(0, |(_, labels)| labels.len());
        columns
            .iter()
            .try_fold(Self::new(n_rows), |store, (name, labels)| {
                store.add_field(name.as_ref(), labels)
            })
    }

    // --- Accessors ---

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn catalogs(&self) -> &[LabelCatalog] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(LabelCatalog::field).collect()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn field(&self, name: &str) -> Result<&LabelCatalog, LabelFrameError> {
        self.position(name)
            .map(|i| &self.fields[i])
            .ok_or_else(|| LabelFrameError::FieldNotFound(name.to_string()))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|c| c.field() == name)
    }

    fn field_set(&self) -> BTreeSet<&str> {
        self.fields.iter().map(LabelCatalog::field).collect()
    }

    /// Names of the fields carrying `label` exactly.
    pub fn fields_with_label(&self, label: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|c| c.contains(label))
            .map(LabelCatalog::field)
            .collect()
    }

    /// One label per field for `row`, in field order.
    pub fn label_row(&self, row: usize) -> Option<Vec<&str>> {
        self.fields.iter().map(|c| c.label_at(row)).collect()
    }

    /// Labels that appear in more than one field.
    pub fn shared_labels(&self) -> HashSet<String> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for catalog in &self.fields {
            for label in catalog.unique_labels() {
                *seen.entry(label.as_str()).or_insert(0) += 1;
            }
        }
        seen.into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(label, _)| label.to_string())
            .collect()
    }

    /// Fails if any of `labels` already lives in a field other than `skip`.
    fn ensure_unclaimed<'l, I>(&self, labels: I, skip: &str) -> Result<(), LabelFrameError>
    where
        I: IntoIterator<Item = &'l String>,
    {
        for label in labels {
            if let Some(other) = self
                .fields
                .iter()
                .find(|c| c.field() != skip && c.contains(label))
            {
                return Err(LabelFrameError::AmbiguousTarget {
                    label: label.clone(),
                    field: other.field().to_string(),
                });
            }
        }
        Ok(())
    }

    fn with_catalog_at(&self, at: usize, catalog: LabelCatalog) -> Self {
        let mut fields = self.fields.clone();
        fields[at] = catalog;
        Self {
            fields,
            n_rows: self.n_rows,
        }
    }

    // --- Field Management ---

    fn push_field<S: AsRef<str>>(
        &self,
        name: &str,
        raw_labels: &[S],
        allow_shared: bool,
    ) -> Result<Self, LabelFrameError> {
        if name.is_empty() {
            return Err(LabelFrameError::InvalidLabelKind {
                field: String::new(),
                reason: "field names must be non-empty".to_string(),
            });
        }
        if self.has_field(name) {
            return Err(LabelFrameError::FieldExists(name.to_string()));
        }
        if raw_labels.len() != self.n_rows {
            return Err(LabelFrameError::DimensionMismatch(format!(
                "field '{}' has {} labels but the store has {} rows",
                name,
                raw_labels.len(),
                self.n_rows
            )));
        }

        let catalog = LabelCatalog::build(name, raw_labels)?;
        if !allow_shared {
            self.ensure_unclaimed(catalog.unique_labels(), name)?;
        }

        let mut fields = self.fields.clone();
        fields.push(catalog);
        Ok(Self {
            fields,
            n_rows: self.n_rows,
        })
    }

    /// Adds a field from one raw label per row.
    ///
    /// # Errors
    /// * `FieldExists` if the name is taken.
    /// * `DimensionMismatch` if the label count differs from the row count.
    /// * `AmbiguousTarget` if one of the labels already lives in another field.
    pub fn add_field<S: AsRef<str>>(&self, name: &str, raw_labels: &[S]) -> Result<Self, LabelFrameError> {
        self.push_field(name, raw_labels, false)
    }

    /// Adds a field whose labels may also occur in other fields. Bare queries
    /// over a shared label fail with `AmbiguousTerm`; use `restrict_fields` or `only`.
    pub fn add_field_shared<S: AsRef<str>>(
        &self,
        name: &str,
        raw_labels: &[S],
    ) -> Result<Self, LabelFrameError> {
        self.push_field(name, raw_labels, true)
    }

    pub fn remove_field(&self, name: &str) -> Result<Self, LabelFrameError> {
        let at = self
            .position(name)
            .ok_or_else(|| LabelFrameError::FieldNotFound(name.to_string()))?;
        let mut fields = self.fields.clone();
        fields.remove(at);
        Ok(Self {
            fields,
            n_rows: self.n_rows,
        })
    }

    pub fn rename_field(&self, from: &str, to: &str) -> Result<Self, LabelFrameError> {
        let at = self
            .position(from)
            .ok_or_else(|| LabelFrameError::FieldNotFound(from.to_string()))?;
        if from != to && self.has_field(to) {
            return Err(LabelFrameError::FieldExists(to.to_string()));
        }
        Ok(self.with_catalog_at(at, self.fields[at].renamed(to)))
    }

    // --- Label Rewrites ---

    /// Relabels every row of `field` to `value`.
    pub fn set_all(&self, field: &str, value: &str) -> Result<Self, LabelFrameError> {
        let at = self
            .position(field)
            .ok_or_else(|| LabelFrameError::FieldNotFound(field.to_string()))?;
        let catalog = self.fields[at].set_all(value)?;
        self.ensure_unclaimed(catalog.unique_labels(), field)?;
        Ok(self.with_catalog_at(at, catalog))
    }

    /// Collapses `field` to the single label `all__<field>`.
    pub fn collapse(&self, field: &str) -> Result<Self, LabelFrameError> {
        self.set_all(field, &format!("{}{}", COLLAPSED_PREFIX, field))
    }

    /// Rewrites `search` to `replacement` in the one field where `search` occurs.
    ///
    /// # Errors
    /// * `LabelNotFound` if no candidate field carries `search`.
    /// * `AmbiguousTerm` if more than one candidate field does.
    /// * `AmbiguousTarget` if a rewritten label already lives in another field.
    /// * `UnsupportedReplace` for non-prefix partial matches.
    pub fn replace(
        &self,
        search: &str,
        replacement: &str,
        method: ReplaceMethod,
        restrict_fields: Option<&[&str]>,
    ) -> Result<Self, LabelFrameError> {
        let mut candidates: Vec<usize> = match restrict_fields {
            Some(names) => names
                .iter()
                .map(|name| {
                    self.position(name)
                        .ok_or_else(|| LabelFrameError::FieldNotFound(name.to_string()))
                })
                .collect::<Result<_, _>>()?,
            None => (0..self.fields.len()).collect(),
        };
        dedup_in_order(&mut candidates);

        let hits: Vec<usize> = candidates
            .into_iter()
            .filter(|&i| {
                let catalog = &self.fields[i];
                match method {
                    ReplaceMethod::Complete => catalog.contains(search),
                    ReplaceMethod::Partial => {
                        catalog.unique_labels().iter().any(|l| l.contains(search))
                    }
                }
            })
            .collect();

        let at = match hits.as_slice() {
            [] => return Err(LabelFrameError::LabelNotFound(search.to_string())),
            [only] => *only,
            _ => {
                return Err(LabelFrameError::AmbiguousTerm {
                    term: search.to_string(),
                    fields: hits
                        .iter()
                        .map(|&i| self.fields[i].field().to_string())
                        .collect(),
                })
            }
        };

        let before = &self.fields[at];
        let after = before.replace(search, replacement, method)?;
        // Only labels the rewrite introduced can collide; shared ones were already allowed.
        let introduced = after.unique_labels().iter().filter(|l| !before.contains(l));
        self.ensure_unclaimed(introduced, before.field())?;

        log::info!(
            "replaced '{}' with '{}' in field '{}' ({} -> {} labels)",
            search,
            replacement,
            before.field(),
            before.n_labels(),
            after.n_labels()
        );
        Ok(self.with_catalog_at(at, after))
    }

    // --- Queries ---

    /// Evaluates raw term strings (see `QueryEngine`).
    pub fn query<T: AsRef<str>>(
        &self,
        terms: &[T],
        restrict_fields: Option<&[&str]>,
    ) -> Result<Mask, LabelFrameError> {
        let parsed: Vec<Term> = terms.iter().map(|t| Term::parse(t.as_ref())).collect();
        self.query_terms(&parsed, restrict_fields)
    }

    pub fn query_terms(
        &self,
        terms: &[Term],
        restrict_fields: Option<&[&str]>,
    ) -> Result<Mask, LabelFrameError> {
        QueryEngine::new(self).evaluate(terms, restrict_fields)
    }

    pub fn only<F, L>(&self, constraints: &[(F, Vec<L>)]) -> Result<Mask, LabelFrameError>
    where
        F: AsRef<str>,
        L: AsRef<str>,
    {
        QueryEngine::new(self).only(constraints)
    }

    /// Every label combination present across `fields`, in order of first
    /// appearance, with the rows carrying it. No fields means one group of all rows.
    pub fn combinations(&self, fields: &[&str]) -> Result<Vec<LabelGroup>, LabelFrameError> {
        let dense = fields
            .iter()
            .map(|name| self.field(name).map(LabelCatalog::decompress))
            .collect::<Result<Vec<_>, _>>()?;
        if self.n_rows == 0 {
            return Ok(Vec::new());
        }

        let mut keys: Vec<Vec<String>> = Vec::new();
        let mut rows: Vec<Vec<u64>> = Vec::new();
        let mut index: HashMap<Vec<&str>, usize> = HashMap::new();

        for row in 0..self.n_rows {
            let key: Vec<&str> = dense.iter().filter_map(|d| d.get(row)).collect();
            let at = match index.get(&key) {
                Some(&at) => at,
                None => {
                    keys.push(key.iter().map(|s| s.to_string()).collect());
                    rows.push(Vec::new());
                    index.insert(key, keys.len() - 1);
                    keys.len() - 1
                }
            };
            rows[at].push(row as u64);
        }

        let masks = assign_true(&rows, self.n_rows)?;
        Ok(keys
            .into_iter()
            .zip(masks)
            .map(|(labels, mask)| LabelGroup { labels, mask })
            .collect())
    }

    // --- Row Operations ---

    /// Keeps the rows set in `rows`.
    pub fn select(&self, rows: &Mask) -> Result<Self, LabelFrameError> {
        if rows.len() != self.n_rows {
            return Err(LabelFrameError::DimensionMismatch(format!(
                "row mask has {} rows but the store has {}",
                rows.len(),
                self.n_rows
            )));
        }
        let fields = self
            .fields
            .iter()
            .map(|c| c.select(rows))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            fields,
            n_rows: rows.count_ones(),
        })
    }

    /// Row-wise concatenation. Both stores must carry the same field set
    /// (in any order); the result keeps `self`'s field order.
    pub fn append(&self, other: &LabelStore) -> Result<Self, LabelFrameError> {
        let mine = self.field_set();
        let theirs = other.field_set();
        if mine != theirs {
            let missing: Vec<_> = mine.symmetric_difference(&theirs).collect();
            return Err(LabelFrameError::FieldSetMismatch(format!(
                "fields {:?} are not present in both stores",
                missing
            )));
        }

        let fields = self
            .fields
            .iter()
            .map(|c| c.append(other.field(c.field())?))
            .collect::<Result<Vec<_>, _>>()?;
        let joined = Self {
            fields,
            n_rows: self.n_rows + other.n_rows,
        };

        // Concatenation must not create a cross-field label neither input had.
        let already: HashSet<String> = self
            .shared_labels()
            .into_iter()
            .chain(other.shared_labels())
            .collect();
        if let Some(label) = joined
            .shared_labels()
            .into_iter()
            .find(|l| !already.contains(l))
        {
            let field = joined
                .fields_with_label(&label)
                .last()
                .map(|f| f.to_string())
                .unwrap_or_default();
            return Err(LabelFrameError::AmbiguousTarget { label, field });
        }

        Ok(joined)
    }

    // --- Consistency & Equality ---

    /// Verifies every catalog spans `n_rows` and satisfies the partition invariant.
    pub fn check_consistency(&self) -> Result<(), LabelFrameError> {
        for catalog in &self.fields {
            if catalog.n_rows() != self.n_rows {
                return Err(LabelFrameError::DimensionMismatch(format!(
                    "field '{}' spans {} rows, expected {}",
                    catalog.field(),
                    catalog.n_rows(),
                    self.n_rows
                )));
            }
            catalog.validate_partition()?;
        }
        Ok(())
    }

    /// True when both stores carry the same field set and, row by row, the
    /// same label in every field.
    pub fn rows_match(&self, other: &LabelStore) -> bool {
        if self.n_rows != other.n_rows || self.field_set() != other.field_set() {
            return false;
        }
        self.fields.iter().all(|mine| match other.field(mine.field()) {
            Ok(theirs) => mine.decompress().iter().eq(theirs.decompress().iter()),
            Err(_) => false,
        })
    }

    /// Set-based equivalence: same field set and, per field, the same set of
    /// unique labels. Row assignment and label order are ignored.
    pub fn equivalent(&self, other: &LabelStore) -> Result<(), String> {
        if self.field_set() != other.field_set() {
            return Err(format!(
                "field sets differ: {:?} vs {:?}",
                self.field_set(),
                other.field_set()
            ));
        }
        for mine in &self.fields {
            let theirs = other.field(mine.field()).map_err(|e| e.to_string())?;
            let a: BTreeSet<&str> = mine.unique_labels().iter().map(String::as_str).collect();
            let b: BTreeSet<&str> = theirs.unique_labels().iter().map(String::as_str).collect();
            if a != b {
                return Err(format!(
                    "labels of field '{}' differ: {:?} vs {:?}",
                    mine.field(),
                    a,
                    b
                ));
            }
        }
        Ok(())
    }

    /// The dense columns of every field, in field order.
    pub fn to_columns(&self) -> Vec<(String, Vec<String>)> {
        self.fields
            .iter()
            .map(|c| (c.field().to_string(), c.decompress().to_vec()))
            .collect()
    }
}
