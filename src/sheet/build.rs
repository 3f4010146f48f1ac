//! Document-to-view mapping. One extraction routine per display section;
//! each is total and degrades to empty/zero values when its subtree is
//! absent, so a sparse export still builds a complete sheet.

use once_cell::sync::Lazy;
use regex::Regex;

use super::describe::collapse_ws;
use super::fields::{number_of, opt_number_of, text_of};
use super::model::{
    AbilityEntry, ActionGroup, Carried, CharacterSheet, CoinRow, Encumbrance, HitPoints,
    InventoryRow, NamedEntry, PowerRow, PowerSections, SkillRow, SpellGroup, SpellLevel,
    WeaponRow, ABILITY_KEYS, SKILL_ORDER,
};
use super::tree::{NodeId, SheetDoc};

// Unresolved internal record tokens, e.g. `reference.backgrounds.sage@PHB`.
// Prose never matches (spaces break the pattern).
static RECORD_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+(\.[A-Za-z0-9_-]+)+(@.*)?$").expect("record ref"));

pub fn build_sheet(doc: &SheetDoc, character: NodeId) -> CharacterSheet {
    let class_node = doc
        .child(character, "classes")
        .and_then(|c| doc.first_child(c));

    let (class_name, level) = match class_node {
        Some(c) => (text_of(doc, c, "name"), number_of(doc, c, "level", 0.0)),
        None => (String::new(), number_of(doc, character, "level", 0.0)),
    };
    let (hit_dice_die, hit_dice_used) = match class_node {
        Some(c) => (text_of(doc, c, "hddie"), number_of(doc, c, "hdused", 0.0)),
        None => (String::new(), 0.0),
    };

    let race = {
        let r = text_of(doc, character, "racename");
        if r.is_empty() {
            text_of(doc, character, "race")
        } else {
            r
        }
    };

    CharacterSheet {
        name: text_of(doc, character, "name"),
        class_name,
        level,
        race,
        background: normalize_background(&text_of(doc, character, "backgroundlink recordname")),
        prof_bonus: number_of(doc, character, "profbonus", 0.0),
        perception: number_of(doc, character, "perception", 0.0),
        speed: doc
            .child(character, "speed")
            .map(|n| number_of(doc, n, "total", 0.0)),
        initiative: doc
            .child(character, "initiative")
            .map(|n| number_of(doc, n, "total", 0.0)),
        armor_class: doc
            .select(character, "defenses ac")
            .map(|n| number_of(doc, n, "total", 0.0)),
        hit_dice_die,
        hit_dice_used,
        hp: hit_points(doc, character),
        abilities: abilities(doc, character),
        skills: skills(doc, character),
        weapons: weapons(doc, character),
        inventory: inventory(doc, character),
        coins: coins(doc, character),
        encumbrance: encumbrance(doc, character),
        feats: named_list(doc, character, "featlist"),
        features: named_list(doc, character, "featurelist"),
        traits: named_list(doc, character, "traitlist"),
        proficiencies: named_list(doc, character, "proficiencylist"),
        languages: named_list(doc, character, "languagelist"),
        powers: powers(doc, character),
    }
}

/// A background that is an unresolved reference token is blanked rather
/// than shown literally.
fn normalize_background(raw: &str) -> String {
    if RECORD_REF_RE.is_match(raw) {
        String::new()
    } else {
        raw.to_string()
    }
}

fn hit_points(doc: &SheetDoc, character: NodeId) -> HitPoints {
    let Some(hp) = doc.child(character, "hp") else {
        return HitPoints::default();
    };
    let total = opt_number_of(doc, hp, "total");
    let wounds = opt_number_of(doc, hp, "wounds");
    // Absent stays absent: "no data" and "zero" render differently.
    let current = match (total, wounds) {
        (Some(t), Some(w)) => Some(t - w),
        (Some(t), None) => Some(t),
        (None, _) => None,
    };
    HitPoints {
        total,
        wounds,
        temporary: opt_number_of(doc, hp, "temporary"),
        current,
    }
}

fn abilities(doc: &SheetDoc, character: NodeId) -> Vec<AbilityEntry> {
    let table = doc.child(character, "abilities");
    ABILITY_KEYS
        .iter()
        .map(|key| {
            let node = table.and_then(|t| doc.child(t, key));
            AbilityEntry {
                key: key.to_string(),
                score: node.and_then(|n| opt_number_of(doc, n, "score")),
                modifier: node.and_then(|n| opt_number_of(doc, n, "bonus")),
                save: node.and_then(|n| opt_number_of(doc, n, "save")),
            }
        })
        .collect()
}

fn skill_rank(name: &str) -> usize {
    SKILL_ORDER
        .iter()
        .position(|s| *s == name)
        .unwrap_or(SKILL_ORDER.len())
}

fn skills(doc: &SheetDoc, character: NodeId) -> Vec<SkillRow> {
    let Some(list) = doc.child(character, "skilllist") else {
        return Vec::new();
    };
    let mut rows: Vec<SkillRow> = doc
        .children(list)
        .map(|s| SkillRow {
            name: text_of(doc, s, "name"),
            stat: text_of(doc, s, "stat"),
            misc: number_of(doc, s, "misc", 0.0),
            total: number_of(doc, s, "total", 0.0),
            prof: number_of(doc, s, "prof", 0.0),
        })
        .collect();
    rows.sort_by(|a, b| {
        skill_rank(&a.name)
            .cmp(&skill_rank(&b.name))
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}

fn weapons(doc: &SheetDoc, character: NodeId) -> Vec<WeaponRow> {
    let Some(list) = doc.child(character, "weaponlist") else {
        return Vec::new();
    };
    let prof_bonus = number_of(doc, character, "profbonus", 0.0);
    doc.children(list)
        .map(|w| {
            // Damage comes from the first damage entry only.
            let damage = doc.child(w, "damagelist").and_then(|d| doc.first_child(d));
            WeaponRow {
                name: text_of(doc, w, "name"),
                attack_bonus: number_of(doc, w, "attackbonus", 0.0) + prof_bonus,
                damage_dice: damage.map(|d| text_of(doc, d, "dice")).unwrap_or_default(),
                damage_type: damage.map(|d| text_of(doc, d, "type")).unwrap_or_default(),
                properties: text_of(doc, w, "properties"),
            }
        })
        .collect()
}

fn normalize_count(n: Option<f64>) -> f64 {
    match n {
        Some(c) if c >= 1.0 => c,
        _ => 1.0,
    }
}

fn inventory(doc: &SheetDoc, character: NodeId) -> Vec<InventoryRow> {
    let Some(list) = doc.child(character, "inventorylist") else {
        return Vec::new();
    };
    doc.children(list)
        .map(|item| {
            let count = normalize_count(opt_number_of(doc, item, "count"));
            let weight_each = number_of(doc, item, "weight", 0.0);
            InventoryRow {
                name: text_of(doc, item, "name"),
                item_type: text_of(doc, item, "type"),
                count,
                weight_each,
                total_weight: weight_each * count,
                carried: Carried::from_code(number_of(doc, item, "carried", 0.0)),
                source: Some(item),
            }
        })
        .collect()
}

fn coins(doc: &SheetDoc, character: NodeId) -> Vec<CoinRow> {
    let Some(list) = doc.child(character, "coins") else {
        return Vec::new();
    };
    doc.children(list)
        .map(|c| CoinRow {
            name: text_of(doc, c, "name"),
            amount: number_of(doc, c, "amount", 0.0),
        })
        .collect()
}

fn encumbrance(doc: &SheetDoc, character: NodeId) -> Option<Encumbrance> {
    let enc = doc.child(character, "encumbrance")?;
    Some(Encumbrance {
        max: number_of(doc, enc, "max", 0.0),
        load: number_of(doc, enc, "load", 0.0),
        lift_push_drag: number_of(doc, enc, "liftpushdrag", 0.0),
    })
}

fn first_non_empty(candidates: [String; 3]) -> String {
    candidates
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

fn named_list(doc: &SheetDoc, character: NodeId, list_name: &str) -> Vec<NamedEntry> {
    let Some(list) = doc.child(character, list_name) else {
        return Vec::new();
    };
    doc.children(list)
        .map(|item| {
            let name = text_of(doc, item, "name");
            let note = first_non_empty([
                text_of(doc, item, "source"),
                text_of(doc, item, "type"),
                text_of(doc, item, "shortdescription"),
            ]);
            let detail = doc
                .child(item, "text")
                .map(|t| collapse_ws(&doc.text_content(t)))
                .filter(|s| !s.is_empty());
            NamedEntry {
                name: if name.is_empty() {
                    "Unnamed".to_string()
                } else {
                    name
                },
                note,
                detail,
            }
        })
        .collect()
}

fn power_row(doc: &SheetDoc, p: NodeId) -> PowerRow {
    let group = {
        let g = text_of(doc, p, "group");
        if g.is_empty() {
            "Other".to_string()
        } else {
            g
        }
    };
    PowerRow {
        name: text_of(doc, p, "name"),
        group,
        level: number_of(doc, p, "level", 0.0) as i64,
        school: text_of(doc, p, "school"),
        range: text_of(doc, p, "range"),
        casting_time: text_of(doc, p, "castingtime"),
        duration: text_of(doc, p, "duration"),
        components: text_of(doc, p, "components"),
        action_type: text_of(doc, p, "type"),
        recharge: text_of(doc, p, "recharge"),
        source: Some(p),
    }
}

fn spell_group(label: String, rows: Vec<PowerRow>) -> SpellGroup {
    let mut levels: Vec<SpellLevel> = Vec::new();
    for row in rows {
        match levels.iter_mut().find(|l| l.level == row.level) {
            Some(l) => l.spells.push(row),
            None => levels.push(SpellLevel {
                level: row.level,
                spells: vec![row],
            }),
        }
    }
    // Stable, so source order survives within a level.
    levels.sort_by_key(|l| l.level);
    SpellGroup { label, levels }
}

fn powers(doc: &SheetDoc, character: NodeId) -> PowerSections {
    let Some(node) = doc.child(character, "powers") else {
        return PowerSections::default();
    };

    // Groups keep first-appearance source order.
    let mut groups: Vec<(String, Vec<PowerRow>)> = Vec::new();
    for p in doc.children(node) {
        let row = power_row(doc, p);
        match groups.iter_mut().find(|(label, _)| *label == row.group) {
            Some((_, rows)) => rows.push(row),
            None => groups.push((row.group.clone(), vec![row])),
        }
    }

    let mut sections = PowerSections::default();
    for (label, rows) in groups {
        if label.starts_with("Spells") {
            sections.spellbook.push(spell_group(label, rows));
        } else {
            sections.actions.push(ActionGroup {
                label,
                powers: rows,
            });
        }
    }
    sections
}
