//! Modal state of the category screen: at most one dialog, plus the draft
//! being edited in the add/edit form.

use shared::domain::CategoryRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DialogKind {
    #[default]
    None,
    /// `target` is the record being edited, `None` when adding.
    AddOrEdit { target: Option<CategoryRecord> },
    ConfirmDelete(CategoryRecord),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogState {
    kind: DialogKind,
    draft: CategoryRecord,
}

impl DialogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> &DialogKind {
        &self.kind
    }

    pub fn is_open(&self) -> bool {
        self.kind != DialogKind::None
    }

    /// Staged form values. Unassigned id while adding.
    pub fn draft(&self) -> &CategoryRecord {
        &self.draft
    }

    pub fn edit_target(&self) -> Option<&CategoryRecord> {
        match &self.kind {
            DialogKind::AddOrEdit { target } => target.as_ref(),
            _ => None,
        }
    }

    pub fn delete_target(&self) -> Option<&CategoryRecord> {
        match &self.kind {
            DialogKind::ConfirmDelete(record) => Some(record),
            _ => None,
        }
    }

    pub fn open_add(&mut self) {
        self.close();
        self.kind = DialogKind::AddOrEdit { target: None };
    }

    /// The draft is a copy: form edits never reach the cached record.
    pub fn open_edit(&mut self, record: &CategoryRecord) {
        self.close();
        self.kind = DialogKind::AddOrEdit {
            target: Some(record.clone()),
        };
        self.draft = record.clone();
    }

    pub fn open_delete_confirm(&mut self, record: &CategoryRecord) {
        self.close();
        self.kind = DialogKind::ConfirmDelete(record.clone());
    }

    pub fn close(&mut self) {
        self.kind = DialogKind::None;
        self.draft = CategoryRecord::default();
    }

    /// No-op unless the add/edit form is open.
    pub fn set_name(&mut self, name: impl Into<String>) {
        if matches!(self.kind, DialogKind::AddOrEdit { .. }) {
            self.draft.name = name.into();
        }
    }

    /// No-op unless the add/edit form is open.
    pub fn set_description(&mut self, description: impl Into<String>) {
        if matches!(self.kind, DialogKind::AddOrEdit { .. }) {
            self.draft.description = description.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::CategoryId;

    use super::*;

    fn books() -> CategoryRecord {
        CategoryRecord {
            id: CategoryId(5),
            name: "Books".into(),
            description: "Paper".into(),
        }
    }

    #[test]
    fn opening_a_dialog_replaces_the_previous_one() {
        let mut dialog = DialogState::new();
        dialog.open_edit(&books());
        dialog.open_delete_confirm(&books());

        assert_eq!(dialog.delete_target(), Some(&books()));
        assert_eq!(dialog.edit_target(), None);
        assert_eq!(dialog.draft(), &CategoryRecord::default());
    }

    #[test]
    fn close_resets_the_draft_whatever_was_open() {
        let mut dialog = DialogState::new();
        dialog.open_add();
        dialog.set_name("Music");
        dialog.set_description("Vinyl");
        assert_eq!(dialog.draft().name, "Music");
        assert!(dialog.draft().is_draft());

        dialog.close();
        assert!(!dialog.is_open());
        assert_eq!(dialog.draft(), &CategoryRecord::default());

        dialog.open_edit(&books());
        dialog.set_name("Comics");
        dialog.close();
        assert_eq!(dialog.kind(), &DialogKind::None);
        assert_eq!(dialog.draft(), &CategoryRecord::default());
    }

    #[test]
    fn edit_seeds_a_copy_of_the_record() {
        let original = books();
        let mut dialog = DialogState::new();
        dialog.open_edit(&original);
        dialog.set_name("Comics");

        assert_eq!(dialog.draft().name, "Comics");
        assert_eq!(dialog.draft().id, CategoryId(5));
        assert_eq!(dialog.edit_target(), Some(&original));
        assert_eq!(original.name, "Books");
    }

    #[test]
    fn draft_setters_ignore_the_delete_confirmation() {
        let mut dialog = DialogState::new();
        dialog.open_delete_confirm(&books());
        dialog.set_name("ignored");
        assert_eq!(dialog.draft(), &CategoryRecord::default());
    }
}
