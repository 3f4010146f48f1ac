use serde::Serialize;

use super::tree::NodeId;

/// Canonical ability keys, in display order. The ability table always has
/// exactly one entry per key, whether or not the export carries data.
pub const ABILITY_KEYS: [&str; 6] = [
    "strength",
    "dexterity",
    "constitution",
    "intelligence",
    "wisdom",
    "charisma",
];

/// Fixed ordering used to sort skill rows, independent of source order.
pub const SKILL_ORDER: [&str; 18] = [
    "Acrobatics",
    "Animal Handling",
    "Arcana",
    "Athletics",
    "Deception",
    "History",
    "Insight",
    "Intimidation",
    "Investigation",
    "Medicine",
    "Nature",
    "Perception",
    "Performance",
    "Persuasion",
    "Religion",
    "Sleight of Hand",
    "Stealth",
    "Survival",
];

/// Display name for a skill's governing-ability key. Accepts both full
/// keys and the three-letter short forms; anything else passes through.
pub fn ability_display_name(key: &str) -> String {
    match key.to_lowercase().as_str() {
        "strength" | "str" => "Strength".to_string(),
        "dexterity" | "dex" => "Dexterity".to_string(),
        "constitution" | "con" => "Constitution".to_string(),
        "intelligence" | "int" => "Intelligence".to_string(),
        "wisdom" | "wis" => "Wisdom".to_string(),
        "charisma" | "cha" => "Charisma".to_string(),
        _ => key.to_string(),
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct HitPoints {
    pub total: Option<f64>,
    pub wounds: Option<f64>,
    pub temporary: Option<f64>,
    /// `total - wounds` when both are present, else `total`, else absent.
    pub current: Option<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AbilityEntry {
    pub key: String,
    pub score: Option<f64>,
    pub modifier: Option<f64>,
    pub save: Option<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SkillRow {
    pub name: String,
    /// Governing ability key as the export spells it.
    pub stat: String,
    pub misc: f64,
    pub total: f64,
    /// Proficiency multiplier: 0 none, 1 proficient, 2 expertise.
    pub prof: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct WeaponRow {
    pub name: String,
    /// Weapon's own bonus plus the character proficiency bonus, as the
    /// export pre-bakes it. Not proficiency-gated.
    pub attack_bonus: f64,
    pub damage_dice: String,
    pub damage_type: String,
    pub properties: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Carried {
    Stored,
    Carried,
    Equipped,
}

impl Carried {
    /// Carried-state code from the export: 2 equipped, 1 carried,
    /// everything else stored.
    pub fn from_code(code: f64) -> Self {
        if code == 2.0 {
            Carried::Equipped
        } else if code == 1.0 {
            Carried::Carried
        } else {
            Carried::Stored
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Carried::Stored => "Stored",
            Carried::Carried => "Carried",
            Carried::Equipped => "Equipped",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct InventoryRow {
    pub name: String,
    pub item_type: String,
    pub count: f64,
    pub weight_each: f64,
    pub total_weight: f64,
    pub carried: Carried,
    /// Source node for lazily-resolved detail (cost, subtype, description).
    #[serde(skip)]
    pub source: Option<NodeId>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CoinRow {
    pub name: String,
    pub amount: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Encumbrance {
    pub max: f64,
    pub load: f64,
    pub lift_push_drag: f64,
}

/// Feats, features, traits, proficiencies, languages. Rows without detail
/// text are non-interactive.
#[derive(Clone, Debug, Serialize)]
pub struct NamedEntry {
    pub name: String,
    /// Short annotation: source, else type, else short description.
    pub note: String,
    pub detail: Option<String>,
}

impl NamedEntry {
    pub fn interactive(&self) -> bool {
        self.detail.is_some()
    }
}

/// One spell, action, feature-as-action, or other activatable ability.
/// Routed to the spellbook or the action list by its group label alone.
#[derive(Clone, Debug, Serialize)]
pub struct PowerRow {
    pub name: String,
    pub group: String,
    /// 0 is a cantrip for spells, "no level" for actions.
    pub level: i64,
    pub school: String,
    pub range: String,
    pub casting_time: String,
    pub duration: String,
    pub components: String,
    pub action_type: String,
    pub recharge: String,
    #[serde(skip)]
    pub source: Option<NodeId>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SpellLevel {
    pub level: i64,
    pub spells: Vec<PowerRow>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SpellGroup {
    pub label: String,
    /// Ascending by level; source order within a level.
    pub levels: Vec<SpellLevel>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ActionGroup {
    pub label: String,
    pub powers: Vec<PowerRow>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct PowerSections {
    pub spellbook: Vec<SpellGroup>,
    pub actions: Vec<ActionGroup>,
}

/// Fully-resolved, render-ready projection of one character record.
/// Constructed fresh on every successful load; never mutated afterwards.
#[derive(Clone, Debug, Serialize)]
pub struct CharacterSheet {
    pub name: String,
    pub class_name: String,
    pub level: f64,
    pub race: String,
    /// Blank when the export carries an unresolved reference token.
    pub background: String,
    pub prof_bonus: f64,
    pub perception: f64,
    pub speed: Option<f64>,
    pub initiative: Option<f64>,
    pub armor_class: Option<f64>,
    pub hit_dice_die: String,
    pub hit_dice_used: f64,
    pub hp: HitPoints,
    pub abilities: Vec<AbilityEntry>,
    pub skills: Vec<SkillRow>,
    pub weapons: Vec<WeaponRow>,
    pub inventory: Vec<InventoryRow>,
    pub coins: Vec<CoinRow>,
    pub encumbrance: Option<Encumbrance>,
    pub feats: Vec<NamedEntry>,
    pub features: Vec<NamedEntry>,
    pub traits: Vec<NamedEntry>,
    pub proficiencies: Vec<NamedEntry>,
    pub languages: Vec<NamedEntry>,
    pub powers: PowerSections,
}

impl CharacterSheet {
    /// `die (N used)` when the export names a hit die, else blank.
    pub fn hit_dice_display(&self) -> String {
        if self.hit_dice_die.is_empty() {
            String::new()
        } else {
            format!("{} ({} used)", self.hit_dice_die, self.hit_dice_used)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ability_display_name, Carried};

    #[test]
    fn carried_state_mapping() {
        assert_eq!(Carried::from_code(2.0), Carried::Equipped);
        assert_eq!(Carried::from_code(1.0), Carried::Carried);
        assert_eq!(Carried::from_code(0.0), Carried::Stored);
        assert_eq!(Carried::from_code(7.0), Carried::Stored);
        assert_eq!(Carried::from_code(-1.0), Carried::Stored);
    }

    #[test]
    fn ability_names_cover_short_and_unknown_keys() {
        assert_eq!(ability_display_name("wisdom"), "Wisdom");
        assert_eq!(ability_display_name("DEX"), "Dexterity");
        assert_eq!(ability_display_name("luck"), "luck");
    }
}
