use crate::error::SheetError;
use crate::sheet::build::build_sheet;
use crate::sheet::model::CharacterSheet;
use crate::sheet::tree::{character_node, parse_document, SheetDoc};

/// One successfully loaded export: the view-model plus the document it was
/// built from, kept so row details can be resolved lazily after the build.
#[derive(Clone, Debug)]
pub struct LoadedCharacter {
    pub doc: SheetDoc,
    pub sheet: CharacterSheet,
}

/// Full load pipeline: text to tree to view-model.
pub fn load_character(text: &str) -> Result<LoadedCharacter, SheetError> {
    let doc = parse_document(text)?;
    let character = character_node(&doc)?;
    let sheet = build_sheet(&doc, character);
    Ok(LoadedCharacter { doc, sheet })
}

/// Ticket for one load attempt. Only the most recently issued ticket may
/// commit; a read that was superseded by a newer selection is discarded
/// even if it completes later.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug)]
pub enum CommitOutcome {
    /// The result replaced the current character wholesale.
    Applied,
    /// A newer load was started after this one; nothing changed.
    Superseded,
    /// The load failed; the previously rendered character is untouched.
    Failed(SheetError),
}

/// Holds at most one current character. The view-model is rebuilt wholesale
/// on each successful load; there is no incremental update path.
#[derive(Debug, Default)]
pub struct ViewState {
    current: Option<LoadedCharacter>,
    issued: u64,
}

impl ViewState {
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        LoadTicket(self.issued)
    }

    pub fn commit(
        &mut self,
        ticket: LoadTicket,
        result: Result<LoadedCharacter, SheetError>,
    ) -> CommitOutcome {
        if ticket.0 != self.issued {
            return CommitOutcome::Superseded;
        }
        match result {
            Ok(loaded) => {
                self.current = Some(loaded);
                CommitOutcome::Applied
            }
            Err(err) => CommitOutcome::Failed(err),
        }
    }

    pub fn current(&self) -> Option<&LoadedCharacter> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::{load_character, CommitOutcome, ViewState};
    use crate::error::SheetError;

    const ANNA: &str = "<root><character><name>Anna</name></character></root>";
    const BRIN: &str = "<root><character><name>Brin</name></character></root>";

    #[test]
    fn load_builds_a_sheet() {
        let loaded = load_character(ANNA).expect("load");
        assert_eq!(loaded.sheet.name, "Anna");
    }

    #[test]
    fn superseded_read_does_not_overwrite_newer_result() {
        let mut state = ViewState::default();
        let first = state.begin_load();
        let second = state.begin_load();

        // The newer selection completes first.
        assert!(matches!(
            state.commit(second, load_character(BRIN)),
            CommitOutcome::Applied
        ));
        // The stale read finishing afterwards is discarded.
        assert!(matches!(
            state.commit(first, load_character(ANNA)),
            CommitOutcome::Superseded
        ));
        assert_eq!(state.current().expect("current").sheet.name, "Brin");
    }

    #[test]
    fn failed_load_keeps_previous_character() {
        let mut state = ViewState::default();
        let ticket = state.begin_load();
        assert!(matches!(
            state.commit(ticket, load_character(ANNA)),
            CommitOutcome::Applied
        ));

        let ticket = state.begin_load();
        let outcome = state.commit(ticket, load_character("<root><npc/></root>"));
        assert!(matches!(
            outcome,
            CommitOutcome::Failed(SheetError::MissingRecord)
        ));
        assert_eq!(state.current().expect("current").sheet.name, "Anna");
    }

    #[test]
    fn parse_failure_keeps_previous_character() {
        let mut state = ViewState::default();
        let ticket = state.begin_load();
        state.commit(ticket, load_character(ANNA));

        let ticket = state.begin_load();
        let outcome = state.commit(ticket, load_character("<root><a></b></root>"));
        assert!(matches!(outcome, CommitOutcome::Failed(SheetError::Parse(_))));
        assert_eq!(state.current().expect("current").sheet.name, "Anna");
    }
}
