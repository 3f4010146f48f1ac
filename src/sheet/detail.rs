//! Expansion detail for interactive rows. Nothing here runs until a row is
//! expanded; cost, subtype, and descriptions are read from the row's source
//! node on demand.

use super::describe::{item_description, skill_description, spell_description, Descriptions};
use super::fields::{format_number, format_signed, text_of};
use super::model::{
    ability_display_name, CharacterSheet, InventoryRow, NamedEntry, PowerRow, SkillRow,
    ABILITY_KEYS,
};
use super::tree::SheetDoc;

pub const DASH: &str = "-";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetailBlock {
    pub title: String,
    pub header: String,
    pub body: String,
}

/// Spellbook sub-heading for one level of a group.
pub fn spell_level_title(group_label: &str, level: i64) -> String {
    if level == 0 {
        format!("{group_label} (Cantrips)")
    } else {
        format!("{group_label} (Level {level})")
    }
}

/// Action-list level column: the level, or a dash when there is none.
pub fn action_level_display(power: &PowerRow) -> String {
    if power.level != 0 {
        power.level.to_string()
    } else {
        DASH.to_string()
    }
}

/// Action-list note: group label, type, and recharge joined, or a dash
/// when all are empty.
pub fn action_note(power: &PowerRow) -> String {
    let mut bits = Vec::new();
    if !power.group.is_empty() {
        bits.push(power.group.clone());
    }
    if !power.action_type.is_empty() {
        bits.push(power.action_type.clone());
    }
    if !power.recharge.is_empty() {
        bits.push(power.recharge.clone());
    }
    if bits.is_empty() {
        DASH.to_string()
    } else {
        bits.join(" | ")
    }
}

/// Breakdown of a skill total: the total itself, the governing ability and
/// its modifier, the proficiency contribution when the multiplier is
/// nonzero, and the misc bonus when nonzero.
pub fn skill_detail(sheet: &CharacterSheet, skill: &SkillRow, d: &Descriptions) -> DetailBlock {
    let mut parts = vec![format!("Total {}", format_signed(skill.total))];

    let ability_name = ability_display_name(&skill.stat);
    if !ability_name.is_empty() {
        // The modifier is only known for the six canonical keys; anything
        // else shows the name pass-through alone.
        let key = skill.stat.to_lowercase();
        if ABILITY_KEYS.contains(&key.as_str()) {
            let modifier = sheet
                .abilities
                .iter()
                .find(|a| a.key == key)
                .and_then(|a| a.modifier)
                .unwrap_or(0.0);
            parts.push(format!("Ability {} {}", ability_name, format_signed(modifier)));
        } else {
            parts.push(format!("Ability {ability_name}"));
        }
    }

    if skill.prof != 0.0 {
        parts.push(format!(
            "Proficiency {}",
            format_signed(sheet.prof_bonus * skill.prof)
        ));
    }
    if skill.misc != 0.0 {
        parts.push(format!("Misc {}", format_signed(skill.misc)));
    }

    DetailBlock {
        title: skill.name.clone(),
        header: parts.join(" | "),
        body: skill_description(d, &skill.name),
    }
}

pub fn inventory_detail(doc: &SheetDoc, row: &InventoryRow, d: &Descriptions) -> DetailBlock {
    let mut bits = Vec::new();
    if !row.item_type.is_empty() {
        bits.push(row.item_type.clone());
    }
    let subtype = row
        .source
        .map(|n| text_of(doc, n, "subtype"))
        .unwrap_or_default();
    if !subtype.is_empty() {
        bits.push(subtype);
    }
    let cost = row
        .source
        .map(|n| text_of(doc, n, "cost"))
        .unwrap_or_default();
    if !cost.is_empty() {
        bits.push(format!("Cost {cost}"));
    }
    bits.push(format!("Weight {}", format_number(row.weight_each)));

    DetailBlock {
        title: row.name.clone(),
        header: bits.join(" | "),
        body: item_description(d, &row.name, doc, row.source),
    }
}

pub fn spell_detail(doc: &SheetDoc, spell: &PowerRow, d: &Descriptions) -> DetailBlock {
    let mut bits = vec![format!("Level {}", spell.level)];
    if !spell.school.is_empty() {
        bits.push(spell.school.clone());
    }
    if !spell.casting_time.is_empty() {
        bits.push(format!("Cast: {}", spell.casting_time));
    }
    if !spell.duration.is_empty() {
        bits.push(format!("Duration: {}", spell.duration));
    }
    if !spell.range.is_empty() {
        bits.push(format!("Range: {}", spell.range));
    }
    if !spell.components.is_empty() {
        bits.push(format!("Components: {}", spell.components));
    }

    DetailBlock {
        title: spell.name.clone(),
        header: bits.join(" | "),
        body: spell_description(d, &spell.name, doc, spell.source),
    }
}

pub fn action_detail(doc: &SheetDoc, power: &PowerRow, d: &Descriptions) -> DetailBlock {
    DetailBlock {
        title: power.name.clone(),
        header: action_note(power),
        body: spell_description(d, &power.name, doc, power.source),
    }
}

/// Named-list rows only expand when they carry detail text.
pub fn named_entry_detail(entry: &NamedEntry) -> Option<DetailBlock> {
    entry.detail.as_ref().map(|text| DetailBlock {
        title: entry.name.clone(),
        header: entry.note.clone(),
        body: text.clone(),
    })
}
