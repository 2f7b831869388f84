//! Term evaluation over a `LabelStore`.
//!
//! A query is a list of terms. Each term resolves to exactly one field: exact
//! terms by string equality, wildcard terms (prefixed with `*`) by
//! case-insensitive substring containment. A term whose text matches labels in
//! two or more candidate fields is rejected as ambiguous; the caller must
//! narrow the candidates with `restrict_fields` or use `only`.
//!
//! Rows must satisfy every term (AND across terms). Within a term, all matching
//! labels of the resolved field are OR-ed together.

use std::fmt;

use crate::error::LabelFrameError;
use crate::kernels::mask::{self, Mask};
use crate::labels::catalog::LabelCatalog;
use crate::labels::store::{dedup_in_order, LabelStore};

/// Prefix that turns a term into a case-insensitive substring match.
pub const WILDCARD_MARKER: char = '*';

//==================================================================================
// 1. Terms
//==================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// Matches a label equal to the text.
    Exact(String),
    /// Matches any label containing the text, ignoring case. Stored lowercased.
    Wildcard(String),
}

impl Term {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(WILDCARD_MARKER) {
            Some(needle) => Term::Wildcard(needle.to_lowercase()),
            None => Term::Exact(raw.to_string()),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Term::Wildcard(_))
    }

    fn matches_label(&self, label: &str) -> bool {
        match self {
            Term::Exact(text) => label == text,
            Term::Wildcard(needle) => label.to_lowercase().contains(needle.as_str()),
        }
    }

    /// OR of every matching label's mask in `catalog`, or `None` if no label matched.
    fn match_field(&self, catalog: &LabelCatalog) -> Option<Mask> {
        match self {
            Term::Exact(text) => catalog.mask_for(text).ok().cloned(),
            Term::Wildcard(_) => {
                let mut hits = catalog
                    .iter()
                    .filter(|(label, _)| self.matches_label(label))
                    .map(|(_, m)| m);
                let first = hits.next()?.clone();
                Some(hits.fold(first, |mut acc, m| {
                    mask::or_assign(&mut acc, m);
                    acc
                }))
            }
        }
    }
}

impl From<&str> for Term {
    fn from(raw: &str) -> Self {
        Term::parse(raw)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Exact(text) => write!(f, "{}", text),
            Term::Wildcard(needle) => write!(f, "{}{}", WILDCARD_MARKER, needle),
        }
    }
}

//==================================================================================
// 2. The Engine
//==================================================================================

pub struct QueryEngine<'a> {
    store: &'a LabelStore,
}

impl<'a> QueryEngine<'a> {
    pub fn new(store: &'a LabelStore) -> Self {
        Self { store }
    }

    fn candidates(
        &self,
        restrict_fields: Option<&[&str]>,
    ) -> Result<Vec<&'a LabelCatalog>, LabelFrameError> {
        match restrict_fields {
            Some(names) => {
                let mut names = names.to_vec();
                dedup_in_order(&mut names);
                names.iter().map(|name| self.store.field(name)).collect()
            }
            None => Ok(self.store.catalogs().iter().collect()),
        }
    }

    /// The rows matching one term. All-false if no candidate field matches.
    ///
    /// # Errors
    /// `AmbiguousTerm` if labels in more than one candidate field match.
    pub fn evaluate_term(
        &self,
        term: &Term,
        restrict_fields: Option<&[&str]>,
    ) -> Result<Mask, LabelFrameError> {
        let mut matched: Vec<(&str, Mask)> = Vec::new();
        for catalog in self.candidates(restrict_fields)? {
            if let Some(m) = term.match_field(catalog) {
                matched.push((catalog.field(), m));
            }
        }

        if matched.len() > 1 {
            return Err(LabelFrameError::AmbiguousTerm {
                term: term.to_string(),
                fields: matched.iter().map(|(f, _)| f.to_string()).collect(),
            });
        }

        Ok(matched
            .pop()
            .map(|(_, m)| m)
            .unwrap_or_else(|| mask::none(self.store.n_rows())))
    }

    /// The rows matching every term. An empty term list selects every row.
    pub fn evaluate(
        &self,
        terms: &[Term],
        restrict_fields: Option<&[&str]>,
    ) -> Result<Mask, LabelFrameError> {
        let mut result = mask::all(self.store.n_rows());
        for term in terms {
            let term_mask = self.evaluate_term(term, restrict_fields)?;
            mask::and_assign(&mut result, &term_mask);
        }
        log::debug!(
            "query {:?} matched {} of {} rows",
            terms.iter().map(Term::to_string).collect::<Vec<_>>(),
            result.count_ones(),
            result.len()
        );
        Ok(result)
    }

    /// Field-scoped filter: per field, the OR of the requested labels' masks;
    /// across fields, the AND. Labels absent from a field contribute no rows.
    ///
    /// This bypasses term resolution entirely, so it works for labels that are
    /// shared between fields.
    pub fn only<F, L>(&self, constraints: &[(F, Vec<L>)]) -> Result<Mask, LabelFrameError>
    where
        F: AsRef<str>,
        L: AsRef<str>,
    {
        let n_rows = self.store.n_rows();
        let mut result = mask::all(n_rows);
        for (field, labels) in constraints {
            let catalog = self.store.field(field.as_ref())?;
            let mut field_mask = mask::none(n_rows);
            for label in labels {
                if let Ok(m) = catalog.mask_for(label.as_ref()) {
                    mask::or_assign(&mut field_mask, m);
                }
            }
            mask::and_assign(&mut result, &field_mask);
        }
        Ok(result)
    }
}
