//! Tokens recognised in the layout cells of a form spreadsheet.
//!
//! Canonical tokens (`text`, `check`, `table`, `yes`, ...) are always
//! accepted. A [`Vocabulary`] adds localized aliases, so a spreadsheet
//! written in another language (`texte`, `case`, `tableau`, `oui`) loads to
//! the same schema. Tokens are matched exactly after trimming surrounding
//! whitespace.

use super::FieldKind;
use crate::common::{Error, Result};
use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How the form is presented to visitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewMode {
    /// Visitors see every submitted row as a table
    #[serde(rename = "table")]
    Table,
    /// Visitors only see the entry form
    #[serde(rename = "form")]
    FormSingleEntry,
}

impl ViewMode {
    /// Canonical token of the view mode.
    pub fn token(self) -> &'static str {
        match self {
            ViewMode::Table => "table",
            ViewMode::FormSingleEntry => "form",
        }
    }
}

static KIND_TOKENS: phf::Map<&'static str, FieldKind> = phf_map! {
    "text" => FieldKind::Text,
    "longtext" => FieldKind::LongText,
    "list" => FieldKind::List,
    "check" => FieldKind::Boolean,
    "checked" => FieldKind::BooleanDefaultTrue,
    "date" => FieldKind::Date,
    "number" => FieldKind::Number,
    "static" => FieldKind::Static,
};

static VIEW_MODE_TOKENS: phf::Map<&'static str, ViewMode> = phf_map! {
    "table" => ViewMode::Table,
    "form" => ViewMode::FormSingleEntry,
};

static EDIT_TOKENS: phf::Map<&'static str, bool> = phf_map! {
    "yes" => true,
    "no" => false,
};

/// Canonical field kind for a token.
pub(crate) fn canonical_kind(token: &str) -> Option<FieldKind> {
    KIND_TOKENS.get(token).copied()
}

/// Canonical and localized layout tokens.
///
/// # Examples
///
/// ```
/// use seafform::form::{FieldKind, ViewMode, Vocabulary};
///
/// let vocabulary = Vocabulary::new()
///     .with_kind("case", FieldKind::Boolean)
///     .with_view_mode("tableau", ViewMode::Table)
///     .with_edit("oui", true);
///
/// assert_eq!(vocabulary.kind("case"), Some(FieldKind::Boolean));
/// assert_eq!(vocabulary.kind("check"), Some(FieldKind::Boolean));
/// assert_eq!(vocabulary.view_mode(" tableau "), Some(ViewMode::Table));
/// assert_eq!(vocabulary.edit("no"), Some(false));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    kinds: HashMap<String, FieldKind>,
    view_modes: HashMap<String, ViewMode>,
    edit: HashMap<String, bool>,
}

impl Vocabulary {
    /// A vocabulary with the canonical tokens only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as a localized name of `kind`.
    pub fn with_kind(mut self, token: impl Into<String>, kind: FieldKind) -> Self {
        self.kinds.insert(token.into(), kind);
        self
    }

    /// Accept `token` as a localized name of `mode`.
    pub fn with_view_mode(mut self, token: impl Into<String>, mode: ViewMode) -> Self {
        self.view_modes.insert(token.into(), mode);
        self
    }

    /// Accept `token` as a localized yes (`true`) or no (`false`).
    pub fn with_edit(mut self, token: impl Into<String>, allow: bool) -> Self {
        self.edit.insert(token.into(), allow);
        self
    }

    /// Add an alias given as `localized -> canonical` strings, as found in a
    /// configuration file.
    pub fn alias_kind(self, localized: &str, canonical: &str) -> Result<Self> {
        let kind = canonical_kind(canonical.trim())
            .ok_or_else(|| Error::Config(format!("unknown field kind {:?}", canonical)))?;
        Ok(self.with_kind(localized.trim(), kind))
    }

    /// See [`Vocabulary::alias_kind`].
    pub fn alias_view_mode(self, localized: &str, canonical: &str) -> Result<Self> {
        let mode = VIEW_MODE_TOKENS
            .get(canonical.trim())
            .copied()
            .ok_or_else(|| Error::Config(format!("unknown view mode {:?}", canonical)))?;
        Ok(self.with_view_mode(localized.trim(), mode))
    }

    /// See [`Vocabulary::alias_kind`].
    pub fn alias_edit(self, localized: &str, canonical: &str) -> Result<Self> {
        let allow = EDIT_TOKENS
            .get(canonical.trim())
            .copied()
            .ok_or_else(|| Error::Config(format!("unknown edit token {:?}", canonical)))?;
        Ok(self.with_edit(localized.trim(), allow))
    }

    /// Resolve a field kind token, without any `*` suffix.
    pub fn kind(&self, token: &str) -> Option<FieldKind> {
        let token = token.trim();
        canonical_kind(token).or_else(|| self.kinds.get(token).copied())
    }

    /// Resolve a view mode token.
    pub fn view_mode(&self, token: &str) -> Option<ViewMode> {
        let token = token.trim();
        VIEW_MODE_TOKENS
            .get(token)
            .copied()
            .or_else(|| self.view_modes.get(token).copied())
    }

    /// Resolve an edit token.
    pub fn edit(&self, token: &str) -> Option<bool> {
        let token = token.trim();
        EDIT_TOKENS
            .get(token)
            .copied()
            .or_else(|| self.edit.get(token).copied())
    }
}
