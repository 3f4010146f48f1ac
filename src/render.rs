//! Render-target boundary. The core hands a finished view-model to a
//! target and resolves row detail on demand; the target owns per-row
//! expansion state and calls back with explicit row identifiers. The text
//! renderer here is the bundled implementation used by the binary.

use std::collections::{HashMap, HashSet};
use std::io::Write;

use crate::error::SheetError;
use crate::session::LoadedCharacter;
use crate::sheet::describe::Descriptions;
use crate::sheet::detail::{
    action_detail, action_level_display, action_note, inventory_detail, named_entry_detail,
    skill_detail, spell_detail, spell_level_title, DetailBlock,
};
use crate::sheet::fields::{format_number, format_signed};
use crate::sheet::model::{ability_display_name, CharacterSheet, NamedEntry};

/// Identifier for an interactive row, stable for the lifetime of one
/// loaded character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowId {
    Skill(usize),
    Inventory(usize),
    Spell {
        group: usize,
        level: usize,
        index: usize,
    },
    Action {
        group: usize,
        index: usize,
    },
    Feat(usize),
    Feature(usize),
    Trait(usize),
    Proficiency(usize),
    Language(usize),
}

/// Per-row expansion state plus a memoized detail cache, so the resolver
/// runs once per row no matter how often it is collapsed and re-expanded.
#[derive(Debug, Default)]
pub struct DetailState {
    expanded: HashSet<RowId>,
    cache: HashMap<RowId, DetailBlock>,
}

impl DetailState {
    /// Flip a row's expanded flag; returns the new state.
    pub fn toggle(&mut self, id: RowId) -> bool {
        if self.expanded.remove(&id) {
            false
        } else {
            self.expanded.insert(id);
            true
        }
    }

    pub fn is_expanded(&self, id: RowId) -> bool {
        self.expanded.contains(&id)
    }

    /// Detail for a row, building it on first use.
    pub fn detail(&mut self, id: RowId, build: impl FnOnce() -> DetailBlock) -> &DetailBlock {
        self.cache.entry(id).or_insert_with(build)
    }

    /// Drop all state when a new character replaces the current one.
    pub fn reset(&mut self) {
        self.expanded.clear();
        self.cache.clear();
    }
}

pub trait RenderTarget {
    fn render_sheet(&mut self, view: &LoadedCharacter);
    fn render_error(&mut self, err: &SheetError);
}

/// Writes the sheet as plain text sections, one per tab of the original
/// layout. With `expand_all` every interactive row includes its resolved
/// detail, which exercises the lazy resolution path end to end.
pub struct TextRenderer<W: Write> {
    out: W,
    descriptions: Descriptions,
    expand_all: bool,
    details: DetailState,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W, descriptions: Descriptions, expand_all: bool) -> Self {
        Self {
            out,
            descriptions,
            expand_all,
            details: DetailState::default(),
        }
    }
}

impl<W: Write> RenderTarget for TextRenderer<W> {
    fn render_sheet(&mut self, view: &LoadedCharacter) {
        let Self {
            out,
            descriptions,
            expand_all,
            details,
        } = self;
        details.reset();
        render_text(out, descriptions, details, *expand_all, view);
    }

    fn render_error(&mut self, err: &SheetError) {
        let _ = writeln!(self.out, "load failed: {err}");
    }
}

fn opt_num(n: Option<f64>) -> String {
    n.map(format_number).unwrap_or_default()
}

fn opt_signed(n: Option<f64>) -> String {
    n.map(format_signed).unwrap_or_default()
}

fn write_block<W: Write>(out: &mut W, block: &DetailBlock) {
    let _ = writeln!(out, "      {}", block.header);
    let _ = writeln!(out, "      {}", block.body);
}

fn write_named_list<W: Write>(
    out: &mut W,
    details: &mut DetailState,
    expand_all: bool,
    title: &str,
    entries: &[NamedEntry],
    row_id: fn(usize) -> RowId,
) {
    if entries.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n[{title}]");
    for (i, entry) in entries.iter().enumerate() {
        if entry.note.is_empty() {
            let _ = writeln!(out, "  {}", entry.name);
        } else {
            let _ = writeln!(out, "  {} ({})", entry.name, entry.note);
        }
        if expand_all && entry.interactive() {
            if let Some(block) = named_entry_detail(entry) {
                let cached = details.detail(row_id(i), || block);
                let _ = writeln!(out, "      {}", cached.body);
            }
        }
    }
}

fn render_text<W: Write>(
    out: &mut W,
    descriptions: &Descriptions,
    details: &mut DetailState,
    expand_all: bool,
    view: &LoadedCharacter,
) {
    let doc = &view.doc;
    let sheet: &CharacterSheet = &view.sheet;

    let _ = writeln!(out, "{}", sheet.name);
    let _ = writeln!(
        out,
        "{} {}  {}  {}",
        sheet.class_name,
        format_number(sheet.level),
        sheet.race,
        sheet.background
    );
    let _ = writeln!(
        out,
        "AC {}  Initiative {}  Speed {}  Perception {}  Proficiency {}",
        opt_num(sheet.armor_class),
        opt_signed(sheet.initiative),
        opt_num(sheet.speed),
        format_number(sheet.perception),
        format_signed(sheet.prof_bonus)
    );
    let _ = writeln!(
        out,
        "HP {} / {}  temp {}  hit dice {}",
        opt_num(sheet.hp.current),
        opt_num(sheet.hp.total),
        opt_num(sheet.hp.temporary),
        sheet.hit_dice_display()
    );

    let _ = writeln!(out, "\n[Abilities]");
    for a in &sheet.abilities {
        let _ = writeln!(
            out,
            "  {:<13} {:>3}  {:>3}  save {}",
            ability_display_name(&a.key),
            opt_num(a.score),
            opt_signed(a.modifier),
            opt_signed(a.save)
        );
    }

    if !sheet.skills.is_empty() {
        let _ = writeln!(out, "\n[Skills]");
        for (i, row) in sheet.skills.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {:<18} {:<13} misc {:<4} total {}",
                row.name,
                row.stat,
                format_number(row.misc),
                format_number(row.total)
            );
            if expand_all {
                let block = details.detail(RowId::Skill(i), || {
                    skill_detail(sheet, row, descriptions)
                });
                write_block(out, block);
            }
        }
    }

    if !sheet.weapons.is_empty() {
        let _ = writeln!(out, "\n[Weapons]");
        for w in &sheet.weapons {
            let damage = if w.damage_dice.is_empty() {
                String::new()
            } else {
                format!("{} {}", w.damage_dice, w.damage_type)
            };
            let _ = writeln!(
                out,
                "  {:<18} {:>4}  {:<16} {}",
                w.name,
                format_signed(w.attack_bonus),
                damage,
                w.properties
            );
        }
    }

    if !sheet.inventory.is_empty() {
        let _ = writeln!(out, "\n[Inventory]");
        for (i, row) in sheet.inventory.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {:>3} x {:<18} {:<18} {:<8} {}",
                format_number(row.count),
                row.name,
                row.item_type,
                row.carried.label(),
                format_number(row.total_weight)
            );
            if expand_all {
                let block = details.detail(RowId::Inventory(i), || {
                    inventory_detail(doc, row, descriptions)
                });
                write_block(out, block);
            }
        }
    }

    if !sheet.coins.is_empty() {
        let line = sheet
            .coins
            .iter()
            .map(|c| format!("{} {}", c.name, format_number(c.amount)))
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(out, "\n[Coins]\n  {line}");
    }

    if let Some(enc) = &sheet.encumbrance {
        let _ = writeln!(
            out,
            "\n[Encumbrance]\n  load {} / max {}  lift-push-drag {}",
            format_number(enc.load),
            format_number(enc.max),
            format_number(enc.lift_push_drag)
        );
    }

    write_named_list(out, details, expand_all, "Feats", &sheet.feats, RowId::Feat);
    write_named_list(
        out,
        details,
        expand_all,
        "Features",
        &sheet.features,
        RowId::Feature,
    );
    write_named_list(
        out,
        details,
        expand_all,
        "Traits",
        &sheet.traits,
        RowId::Trait,
    );
    write_named_list(
        out,
        details,
        expand_all,
        "Proficiencies",
        &sheet.proficiencies,
        RowId::Proficiency,
    );
    write_named_list(
        out,
        details,
        expand_all,
        "Languages",
        &sheet.languages,
        RowId::Language,
    );

    for (g, group) in sheet.powers.actions.iter().enumerate() {
        let _ = writeln!(out, "\n[{}]", group.label);
        for (i, power) in group.powers.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {:<20} {:>3}  {}",
                power.name,
                action_level_display(power),
                action_note(power)
            );
            if expand_all {
                let block = details.detail(RowId::Action { group: g, index: i }, || {
                    action_detail(doc, power, descriptions)
                });
                let _ = writeln!(out, "      {}", block.body);
            }
        }
    }

    for (g, group) in sheet.powers.spellbook.iter().enumerate() {
        for (l, level) in group.levels.iter().enumerate() {
            let _ = writeln!(out, "\n[{}]", spell_level_title(&group.label, level.level));
            for (i, spell) in level.spells.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "  {:<20} {:>2}  {:<14} {}",
                    spell.name, spell.level, spell.school, spell.range
                );
                if expand_all {
                    let block = details.detail(
                        RowId::Spell {
                            group: g,
                            level: l,
                            index: i,
                        },
                        || spell_detail(doc, spell, descriptions),
                    );
                    write_block(out, block);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DetailState, RenderTarget, RowId, TextRenderer};
    use crate::session::load_character;
    use crate::sheet::describe::Descriptions;
    use crate::sheet::detail::DetailBlock;

    const SAMPLE: &str = "<root><character>\
        <name>Anna</name>\
        <hp><total>20</total><wounds>5</wounds></hp>\
        <skilllist><id-00001><name>Stealth</name><stat>dexterity</stat><total>2</total></id-00001></skilllist>\
        <powers><id-00001><name>Fire Bolt</name><group>Spells (Wizard)</group><level>0</level></id-00001></powers>\
        </character></root>";

    #[test]
    fn toggle_flips_and_reports_state() {
        let mut state = DetailState::default();
        assert!(!state.is_expanded(RowId::Skill(0)));
        assert!(state.toggle(RowId::Skill(0)));
        assert!(state.is_expanded(RowId::Skill(0)));
        assert!(!state.toggle(RowId::Skill(0)));
        assert!(!state.is_expanded(RowId::Skill(0)));
    }

    #[test]
    fn detail_is_built_once_per_row() {
        let mut state = DetailState::default();
        let mut calls = 0;
        for _ in 0..3 {
            state.detail(RowId::Inventory(1), || {
                calls += 1;
                DetailBlock {
                    title: "t".to_string(),
                    header: "h".to_string(),
                    body: "b".to_string(),
                }
            });
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn text_renderer_writes_sections() {
        let loaded = load_character(SAMPLE).expect("load");
        let mut buf: Vec<u8> = Vec::new();
        {
            let mut renderer = TextRenderer::new(&mut buf, Descriptions::builtin(), true);
            renderer.render_sheet(&loaded);
        }
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("Anna"));
        assert!(text.contains("HP 15 / 20"));
        assert!(text.contains("[Skills]"));
        assert!(text.contains("Stealth"));
        assert!(text.contains("[Spells (Wizard) (Cantrips)]"));
        // Expanded skill rows carry the resolved description.
        assert!(text.contains("Hide and move quietly"));
    }
}
