// In: src/labels/catalog.rs

//! The per-field categorical label index.
//!
//! A `LabelCatalog` stores one field as its ordered set of unique labels plus,
//! for each label, a row mask. This sparse form is the source of truth. The
//! dense `labels[row] -> label` view (`DenseLabels`) is derived from it on
//! demand and cached; any operation that produces a new catalog starts with an
//! empty cache.
//!
//! Invariant (partition): for a well-formed catalog every row is set in exactly
//! one mask, and every unique label owns at least one row.

use std::cell::OnceCell;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::config::MaskStrategy;
use crate::error::LabelFrameError;
use crate::kernels::assign_true::{assign_true, assign_true_one};
use crate::kernels::mask::{self, Mask};

/// Label written by `collapse`, followed by the field name.
pub const COLLAPSED_PREFIX: &str = "all__";

/// How `replace` rewrites a matching label.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceMethod {
    /// The whole label must equal the search string and is swapped out.
    Complete,
    /// The search string must be a prefix of the label; only the prefix is rewritten.
    Partial,
}

fn validate_label(field: &str, label: &str, row: Option<usize>) -> Result<(), LabelFrameError> {
    if label.is_empty() {
        let reason = match row {
            Some(row) => format!("empty label at row {}", row),
            None => "labels must be non-empty strings".to_string(),
        };
        return Err(LabelFrameError::InvalidLabelKind {
            field: field.to_string(),
            reason,
        });
    }
    Ok(())
}

//==================================================================================
// 1. Dense View
//==================================================================================

/// The dense, one-entry-per-row view of a field.
///
/// Rows are stored as codes into a label table, so a field with few unique
/// labels costs four bytes per row rather than one string per row.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLabels {
    field: String,
    table: Vec<String>,
    codes: Vec<u32>,
}

impl DenseLabels {
    /// Builds the dense view from one raw label per row.
    /// The label table is ordered by first appearance.
    pub fn from_raw<S: AsRef<str>>(field: &str, raw: &[S]) -> Result<Self, LabelFrameError> {
        let mut table: Vec<String> = Vec::new();
        let mut lookup: HashMap<String, u32> = HashMap::new();
        let mut codes = Vec::with_capacity(raw.len());

        for (row, label) in raw.iter().enumerate() {
            let label = label.as_ref();
            validate_label(field, label, Some(row))?;
            let code = match lookup.get(label) {
                Some(&code) => code,
                None => {
                    let code = table.len() as u32;
                    table.push(label.to_string());
                    lookup.insert(label.to_string(), code);
                    code
                }
            };
            codes.push(code);
        }

        Ok(Self {
            field: field.to_string(),
            table,
            codes,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// The label carried by `row`.
    pub fn get(&self, row: usize) -> Option<&str> {
        self.codes
            .get(row)
            .map(|&code| self.table[code as usize].as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.codes.iter().map(|&code| self.table[code as usize].as_str())
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_string).collect()
    }

    /// Rebuilds the sparse catalog from this dense view.
    ///
    /// Rows are grouped into one index list per label in a single pass, then
    /// all masks are produced by the accelerator (or one at a time under
    /// `MaskStrategy::PerLabel`). Table entries no row refers to are dropped.
    pub fn compress(&self, strategy: MaskStrategy) -> Result<LabelCatalog, LabelFrameError> {
        let n_rows = self.codes.len();
        let mut lists: Vec<Vec<u64>> = vec![Vec::new(); self.table.len()];
        for (row, &code) in self.codes.iter().enumerate() {
            lists[code as usize].push(row as u64);
        }

        let (labels, lists): (Vec<String>, Vec<Vec<u64>>) = self
            .table
            .iter()
            .cloned()
            .zip(lists)
            .filter(|(_, rows)| !rows.is_empty())
            .unzip();

        // A zero-row field has no labels and therefore nothing to assign.
        let masks = if n_rows == 0 {
            Vec::new()
        } else {
            match strategy {
                MaskStrategy::Batched => assign_true(&lists, n_rows)?,
                MaskStrategy::PerLabel => lists
                    .iter()
                    .map(|rows| assign_true_one(rows, n_rows))
                    .collect::<Result<Vec<_>, _>>()?,
            }
        };

        Ok(LabelCatalog::from_parts(
            self.field.clone(),
            labels,
            masks,
            n_rows,
        ))
    }
}

//==================================================================================
// 2. The Catalog
//==================================================================================

#[derive(Debug, Clone)]
pub struct LabelCatalog {
    field: String,
    labels: Vec<String>,
    masks: Vec<Mask>,
    lookup: HashMap<String, usize>,
    n_rows: usize,
    dense: OnceCell<DenseLabels>,
}

/// Two catalogs are equal when they describe the same field with the same
/// labels, in the same order, over the same rows. The cache is ignored.
impl PartialEq for LabelCatalog {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field
            && self.n_rows == other.n_rows
            && self.labels == other.labels
            && self.masks == other.masks
    }
}

impl LabelCatalog {
    /// Assembles a catalog from parallel label/mask vectors.
    ///
    /// Labels whose mask is empty are dropped. The caller guarantees the
    /// partition invariant and that every mask has `n_rows` bits.
    pub(crate) fn from_parts(
        field: String,
        labels: Vec<String>,
        masks: Vec<Mask>,
        n_rows: usize,
    ) -> Self {
        debug_assert_eq!(labels.len(), masks.len());
        debug_assert!(masks.iter().all(|m| m.len() == n_rows));

        let (labels, masks): (Vec<String>, Vec<Mask>) = labels
            .into_iter()
            .zip(masks)
            .filter(|(_, m)| m.any())
            .unzip();
        let lookup = labels
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), i))
            .collect();

        Self {
            field,
            labels,
            masks,
            lookup,
            n_rows,
            dense: OnceCell::new(),
        }
    }

    /// Builds a catalog from one raw label per row.
    ///
    /// # Errors
    /// `InvalidLabelKind` if any label is empty.
    pub fn build<S: AsRef<str>>(field: &str, raw: &[S]) -> Result<Self, LabelFrameError> {
        Self::build_with(field, raw, MaskStrategy::Batched)
    }

    pub fn build_with<S: AsRef<str>>(
        field: &str,
        raw: &[S],
        strategy: MaskStrategy,
    ) -> Result<Self, LabelFrameError> {
        DenseLabels::from_raw(field, raw)?.compress(strategy)
    }

    // --- Accessors ---

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Unique labels in first-appearance order.
    pub fn unique_labels(&self) -> &[String] {
        &self.labels
    }

    pub fn n_labels(&self) -> usize {
        self.labels.len()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.lookup.contains_key(label)
    }

    /// Unique labels in lexicographic order.
    pub fn sorted_labels(&self) -> Vec<&str> {
        let mut sorted: Vec<&str> = self.labels.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted
    }

    /// `(label, mask)` pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Mask)> + '_ {
        self.labels.iter().map(String::as_str).zip(self.masks.iter())
    }

    pub fn mask_for(&self, label: &str) -> Result<&Mask, LabelFrameError> {
        self.lookup
            .get(label)
            .map(|&i| &self.masks[i])
            .ok_or_else(|| LabelFrameError::LabelNotFound(label.to_string()))
    }

    /// Number of rows carrying each label, in label order.
    pub fn counts(&self) -> Vec<(&str, usize)> {
        self.iter().map(|(label, m)| (label, m.count_ones())).collect()
    }

    pub fn label_at(&self, row: usize) -> Option<&str> {
        self.decompress().get(row)
    }

    // --- Compress / Decompress ---

    /// Returns the dense view, building and caching it on first use.
    pub fn decompress(&self) -> &DenseLabels {
        self.dense.get_or_init(|| self.materialize())
    }

    /// Drops the cached dense view. The catalog itself is untouched.
    pub fn compress(&mut self) {
        self.dense.take();
    }

    pub fn is_decompressed(&self) -> bool {
        self.dense.get().is_some()
    }

    fn materialize(&self) -> DenseLabels {
        let mut codes = vec![0u32; self.n_rows];
        for (code, m) in self.masks.iter().enumerate() {
            for row in m.iter_ones() {
                codes[row] = code as u32;
            }
        }
        DenseLabels {
            field: self.field.clone(),
            table: self.labels.clone(),
            codes,
        }
    }

    /// Checks the partition invariant: every mask spans `n_rows` and every row
    /// is set in exactly one mask.
    pub fn validate_partition(&self) -> Result<(), LabelFrameError> {
        let mut seen = mask::none(self.n_rows);
        for (label, m) in self.iter() {
            if m.len() != self.n_rows {
                return Err(LabelFrameError::DimensionMismatch(format!(
                    "mask for '{}' in field '{}' has {} rows, expected {}",
                    label,
                    self.field,
                    m.len(),
                    self.n_rows
                )));
            }
            for row in m.iter_ones() {
                if seen[row] {
                    return Err(LabelFrameError::BrokenPartition {
                        field: self.field.clone(),
                        row,
                    });
                }
                seen.set(row, true);
            }
        }
        match seen.first_zero() {
            Some(row) => Err(LabelFrameError::BrokenPartition {
                field: self.field.clone(),
                row,
            }),
            None => Ok(()),
        }
    }

    // --- Transformations (each returns a new catalog) ---

    /// Row-wise concatenation: `other`'s rows follow `self`'s.
    ///
    /// Labels are unioned (self's order first, then labels new in `other`);
    /// each mask is zero-extended over the half where its label is absent.
    pub fn append(&self, other: &LabelCatalog) -> Result<LabelCatalog, LabelFrameError> {
        if self.field != other.field {
            return Err(LabelFrameError::FieldMismatch {
                expected: self.field.clone(),
                found: other.field.clone(),
            });
        }

        let head_blank = mask::none(self.n_rows);
        let tail_blank = mask::none(other.n_rows);

        let mut labels = self.labels.clone();
        labels.extend(
            other
                .labels
                .iter()
                .filter(|label| !self.contains(label))
                .cloned(),
        );

        let masks = labels
            .iter()
            .map(|label| {
                let head = self.mask_for(label).unwrap_or(&head_blank);
                let tail = other.mask_for(label).unwrap_or(&tail_blank);
                mask::concat(head, tail)
            })
            .collect();

        Ok(LabelCatalog::from_parts(
            self.field.clone(),
            labels,
            masks,
            self.n_rows + other.n_rows,
        ))
    }

    /// Keeps the rows set in `rows`, in order. Labels left without rows are dropped.
    pub fn select(&self, rows: &Mask) -> Result<LabelCatalog, LabelFrameError> {
        if rows.len() != self.n_rows {
            return Err(LabelFrameError::DimensionMismatch(format!(
                "row mask has {} rows but field '{}' has {}",
                rows.len(),
                self.field,
                self.n_rows
            )));
        }
        let masks = self.masks.iter().map(|m| mask::gather(m, rows)).collect();
        Ok(LabelCatalog::from_parts(
            self.field.clone(),
            self.labels.clone(),
            masks,
            rows.count_ones(),
        ))
    }

    /// The same catalog under a new field name.
    pub fn renamed(&self, field: &str) -> LabelCatalog {
        LabelCatalog::from_parts(
            field.to_string(),
            self.labels.clone(),
            self.masks.clone(),
            self.n_rows,
        )
    }

    /// Every row relabelled to `value`.
    pub fn set_all(&self, value: &str) -> Result<LabelCatalog, LabelFrameError> {
        validate_label(&self.field, value, None)?;
        let (labels, masks) = if self.n_rows == 0 {
            (Vec::new(), Vec::new())
        } else {
            (vec![value.to_string()], vec![mask::all(self.n_rows)])
        };
        Ok(LabelCatalog::from_parts(
            self.field.clone(),
            labels,
            masks,
            self.n_rows,
        ))
    }

    /// The labels `replace` would produce, one per unique label, or an error
    /// if the rewrite is not allowed.
    pub(crate) fn rewritten_labels(
        &self,
        search: &str,
        replacement: &str,
        method: ReplaceMethod,
    ) -> Result<Vec<String>, LabelFrameError> {
        let mut hits = 0usize;
        let mut rewritten = Vec::with_capacity(self.labels.len());

        for label in &self.labels {
            let next = match method {
                ReplaceMethod::Complete if label == search => {
                    hits += 1;
                    replacement.to_string()
                }
                ReplaceMethod::Complete => label.clone(),
                ReplaceMethod::Partial => {
                    if search.is_empty() {
                        return Err(LabelFrameError::UnsupportedReplace(
                            "partial replacement needs a non-empty search string".to_string(),
                        ));
                    }
                    match label.find(search) {
                        Some(0) => {
                            hits += 1;
                            format!("{}{}", replacement, &label[search.len()..])
                        }
                        Some(pos) => {
                            return Err(LabelFrameError::UnsupportedReplace(format!(
                                "'{}' occurs at position {} of '{}'; only prefixes can be replaced",
                                search, pos, label
                            )))
                        }
                        None => label.clone(),
                    }
                }
            };
            validate_label(&self.field, &next, None)?;
            rewritten.push(next);
        }

        if hits == 0 {
            return Err(LabelFrameError::LabelNotFound(search.to_string()));
        }
        Ok(rewritten)
    }

    /// Rewrites matching labels. Labels that collide after the rewrite are
    /// merged into one, keeping the position of the first.
    ///
    /// # Errors
    /// * `LabelNotFound` if nothing matches `search`.
    /// * `UnsupportedReplace` for a partial match that is not a prefix.
    pub fn replace(
        &self,
        search: &str,
        replacement: &str,
        method: ReplaceMethod,
    ) -> Result<LabelCatalog, LabelFrameError> {
        let rewritten = self.rewritten_labels(search, replacement, method)?;

        let mut labels: Vec<String> = Vec::with_capacity(rewritten.len());
        let mut masks: Vec<Mask> = Vec::with_capacity(rewritten.len());
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (label, m) in rewritten.into_iter().zip(self.masks.iter()) {
            match positions.get(&label) {
                Some(&at) => mask::or_assign(&mut masks[at], m),
                None => {
                    positions.insert(label.clone(), labels.len());
                    labels.push(label);
                    masks.push(m.clone());
                }
            }
        }

        Ok(LabelCatalog::from_parts(
            self.field.clone(),
            labels,
            masks,
            self.n_rows,
        ))
    }
}
