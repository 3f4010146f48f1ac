use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::tree::{NodeId, SheetDoc};

const SKILL_FALLBACK: &str = "Checks with this skill use one of your abilities and may be \
modified by proficiency and circumstances.";
const SPELL_FALLBACK: &str = "No additional description for this spell in this export.";
const ITEM_FALLBACK: &str = "No additional description for this item in this export.";

static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace"));

/// Collapse internal whitespace runs to single spaces and trim the ends.
pub fn collapse_ws(text: &str) -> String {
    WS_RE.replace_all(text, " ").trim().to_string()
}

/// Category-keyed override dictionary. An entry here wins over anything the
/// export embeds; absent entries are not an error.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Descriptions {
    #[serde(default)]
    pub skills: HashMap<String, String>,
    #[serde(default)]
    pub items: HashMap<String, String>,
    #[serde(default)]
    pub spells: HashMap<String, String>,
}

impl Descriptions {
    /// Table shipped with the crate: short skill blurbs, no item or spell
    /// overrides.
    pub fn builtin() -> Self {
        toml::from_str(include_str!("../../data/descriptions.toml")).unwrap_or_default()
    }

    pub fn from_toml_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read descriptions: {}", path.display()))?;
        let d: Descriptions = toml::from_str(&text).context("parse descriptions toml")?;
        Ok(d)
    }
}

/// Skills: dictionary entry, else a generic blurb.
pub fn skill_description(d: &Descriptions, name: &str) -> String {
    match d.skills.get(name) {
        Some(text) => text.clone(),
        None => SKILL_FALLBACK.to_string(),
    }
}

/// Spells and other powers: dictionary entry, else the inline description
/// embedded in the source node, else a canned message.
pub fn spell_description(
    d: &Descriptions,
    name: &str,
    doc: &SheetDoc,
    source: Option<NodeId>,
) -> String {
    if let Some(text) = d.spells.get(name) {
        return text.clone();
    }
    inline_description(doc, source).unwrap_or_else(|| SPELL_FALLBACK.to_string())
}

/// Inventory items: same chain as spells with the item table and message.
pub fn item_description(
    d: &Descriptions,
    name: &str,
    doc: &SheetDoc,
    source: Option<NodeId>,
) -> String {
    if let Some(text) = d.items.get(name) {
        return text.clone();
    }
    inline_description(doc, source).unwrap_or_else(|| ITEM_FALLBACK.to_string())
}

fn inline_description(doc: &SheetDoc, source: Option<NodeId>) -> Option<String> {
    let desc = doc.child(source?, "description")?;
    Some(collapse_ws(&doc.text_content(desc)))
}

#[cfg(test)]
mod tests {
    use super::{
        collapse_ws, item_description, skill_description, spell_description, Descriptions,
    };
    use crate::sheet::tree::parse_document;

    fn power_doc() -> (crate::sheet::tree::SheetDoc, crate::sheet::tree::NodeId) {
        let doc = parse_document(
            "<root><power><name>Fire Bolt</name><description><p>Hurl a mote  of\n fire.</p></description></power></root>",
        )
        .expect("parse");
        let root = doc.root().expect("root");
        let power = doc.child(root, "power").expect("power");
        (doc, power)
    }

    #[test]
    fn override_beats_inline_description() {
        let (doc, power) = power_doc();
        let mut d = Descriptions::default();
        d.spells
            .insert("Fire Bolt".to_string(), "Override text.".to_string());
        assert_eq!(
            spell_description(&d, "Fire Bolt", &doc, Some(power)),
            "Override text."
        );
    }

    #[test]
    fn inline_description_is_whitespace_collapsed() {
        let (doc, power) = power_doc();
        let d = Descriptions::default();
        assert_eq!(
            spell_description(&d, "Fire Bolt", &doc, Some(power)),
            "Hurl a mote of fire."
        );
    }

    #[test]
    fn canned_fallbacks_when_nothing_is_known() {
        let (doc, _) = power_doc();
        let d = Descriptions::default();
        assert_eq!(
            spell_description(&d, "Fire Bolt", &doc, None),
            "No additional description for this spell in this export."
        );
        assert_eq!(
            item_description(&d, "Rope", &doc, None),
            "No additional description for this item in this export."
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let (doc, power) = power_doc();
        let d = Descriptions::default();
        let first = spell_description(&d, "Fire Bolt", &doc, Some(power));
        let second = spell_description(&d, "Fire Bolt", &doc, Some(power));
        assert_eq!(first, second);
    }

    #[test]
    fn builtin_table_has_skill_blurbs() {
        let d = Descriptions::builtin();
        assert!(d.skills.contains_key("Stealth"));
        assert!(d.items.is_empty());
        assert!(d.spells.is_empty());
    }

    #[test]
    fn unknown_skill_gets_generic_blurb() {
        let d = Descriptions::builtin();
        assert!(skill_description(&d, "Zzyx").starts_with("Checks with this skill"));
    }

    #[test]
    fn collapse_ws_flattens_runs() {
        assert_eq!(collapse_ws("  a \n\t b  "), "a b");
    }
}
