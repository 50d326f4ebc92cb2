use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::step_store::StepStore;
use super::steps::WizardStep;
use super::validation::{check_completeness, step_navigable, validate_step, Completeness, FieldError};
use crate::models::{ListingDraft, ListingId};
use crate::notice::Notice;

/// Result of trying to move through the wizard
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    Moved {
        step: WizardStep,
        notices: Vec<Notice>,
    },
    Blocked {
        step: WizardStep,
        errors: Vec<FieldError>,
    },
}

impl Navigation {
    pub fn is_moved(&self) -> bool {
        matches!(self, Navigation::Moved { .. })
    }
}

/// Editing state of one listing draft: the values, the current page and the
/// "save as draft" toggle (stored as `draft.is_draft`).
#[derive(Debug)]
pub struct FormSession {
    draft: ListingDraft,
    step: WizardStep,
    store: Option<StepStore>,
}

impl FormSession {
    pub fn new(draft: ListingDraft) -> Self {
        Self {
            draft,
            step: WizardStep::PropertyDetails,
            store: None,
        }
    }

    /// Attach local step persistence and resume from the last viewed step. Resuming
    /// follows the same rules as moving forward, so it stops at the first step that
    /// blocks.
    pub fn with_step_store(mut self, store: StepStore, today: NaiveDate) -> (Self, Vec<Notice>) {
        let resumed = store.load(&self.draft.local_key());
        self.store = Some(store);

        let notices = match resumed {
            Some(step) if step != self.step => match self.jump_to(step, today) {
                Navigation::Moved { step, notices } => {
                    info!("Resuming draft {} at {}", self.draft.local_key(), step);
                    notices
                }
                Navigation::Blocked { step: blocked, errors } => {
                    info!(
                        "Resuming draft {} at {} instead of {}, {} fields to fix",
                        self.draft.local_key(),
                        blocked,
                        step,
                        errors.len()
                    );
                    self.enter(blocked, today)
                }
            },
            _ => Vec::new(),
        };
        (self, notices)
    }

    pub fn draft(&self) -> &ListingDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ListingDraft {
        &mut self.draft
    }

    pub fn into_draft(self) -> ListingDraft {
        self.draft
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn save_as_draft(&self) -> bool {
        self.draft.is_draft
    }

    pub fn set_save_as_draft(&mut self, on: bool) {
        self.draft.is_draft = on;
    }

    /// Identifier of the draft, assigned here if it has never been saved
    pub fn ensure_id(&mut self) -> ListingId {
        match self.draft.id {
            Some(id) => id,
            None => {
                let old_key = self.draft.local_key();
                let id = ListingId::generate();
                self.draft.id = Some(id);
                self.rekey(&old_key);
                id
            }
        }
    }

    /// Fold the identity assigned by a save back into the session
    pub fn adopt_id(&mut self, id: ListingId) {
        if self.draft.id != Some(id) {
            let old_key = self.draft.local_key();
            self.draft.id = Some(id);
            self.rekey(&old_key);
        }
    }

    /// Take over the identity and timestamps of a background save without touching
    /// edits made while it was in flight
    pub fn absorb_saved(&mut self, saved: &ListingDraft) {
        if let Some(id) = saved.id {
            self.adopt_id(id);
        }
        if self.draft.seller_id.is_none() {
            self.draft.seller_id = saved.seller_id.clone();
        }
        if self.draft.created_at.is_none() {
            self.draft.created_at = saved.created_at;
        }
        self.draft.updated_at = saved.updated_at;
    }

    pub fn current_errors(&self, today: NaiveDate) -> Vec<FieldError> {
        validate_step(&self.draft, self.step, today)
    }

    pub fn completeness(&self, today: NaiveDate) -> Completeness {
        check_completeness(&self.draft, today)
    }

    pub fn next(&mut self, today: NaiveDate) -> Navigation {
        let Some(target) = self.step.next() else {
            return Navigation::Moved {
                step: self.step,
                notices: Vec::new(),
            };
        };
        self.jump_to(target, today)
    }

    pub fn back(&mut self, today: NaiveDate) -> Navigation {
        match self.step.prev() {
            Some(target) => self.jump_to(target, today),
            None => Navigation::Moved {
                step: self.step,
                notices: Vec::new(),
            },
        }
    }

    /// Move to any step. Going back is always allowed; going forward requires every
    /// step being left to be navigable.
    pub fn jump_to(&mut self, target: WizardStep, today: NaiveDate) -> Navigation {
        if target > self.step {
            let save_as_draft = self.save_as_draft();
            for step in WizardStep::ALL
                .into_iter()
                .filter(|s| *s >= self.step && *s < target)
            {
                if !step_navigable(&self.draft, step, save_as_draft, today) {
                    let errors = validate_step(&self.draft, step, today);
                    debug!("Blocked at {} with {} errors", step, errors.len());
                    return Navigation::Blocked { step, errors };
                }
            }
        }

        let notices = self.enter(target, today);
        Navigation::Moved {
            step: target,
            notices,
        }
    }

    fn enter(&mut self, step: WizardStep, today: NaiveDate) -> Vec<Notice> {
        self.step = step;
        self.persist_step();

        if step == WizardStep::Review {
            self.apply_review_policy(today)
        } else {
            Vec::new()
        }
    }

    /// Incomplete listings are forced into draft mode with a warning; complete ones
    /// have draft mode switched off with an info notice
    fn apply_review_policy(&mut self, today: NaiveDate) -> Vec<Notice> {
        let completeness = check_completeness(&self.draft, today);
        if completeness.is_complete() {
            if self.draft.is_draft {
                self.draft.is_draft = false;
                return vec![Notice::info(
                    "Everything required is in place, so this listing will be published. Turn on \"save as draft\" to keep it private.",
                )];
            }
            Vec::new()
        } else {
            let forced = !self.draft.is_draft;
            self.draft.is_draft = true;
            let missing = completeness.missing().join(", ");
            if forced {
                info!("Forcing draft mode for {}: missing {}", self.draft.local_key(), missing);
            }
            vec![Notice::warning(format!(
                "This listing will be saved as a draft until the following are added: {}",
                missing
            ))]
        }
    }

    fn persist_step(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.remember(&self.draft.local_key(), self.step) {
                warn!("Could not remember wizard step: {:#}", e);
            }
        }
    }

    fn rekey(&self, old_key: &str) {
        if let Some(store) = &self.store {
            if let Err(e) = store.forget(old_key) {
                warn!("Could not clear wizard step for {}: {:#}", old_key, e);
            }
        }
        self.persist_step();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccessType, MediaRef};
    use crate::notice::NoticeLevel;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn media_ref(path: &str) -> MediaRef {
        MediaRef {
            path: path.to_string(),
            url: format!("https://cdn.example.com/{}", path),
        }
    }

    fn filled_draft() -> ListingDraft {
        let mut draft = ListingDraft::new();
        draft.address = "4510 Balcones Dr".to_string();
        draft.city = "Austin".to_string();
        draft.state = "TX".to_string();
        draft.zip_code = "78731".to_string();
        draft.property_type = "Single Family".to_string();
        draft.bedrooms = "3".to_string();
        draft.bathrooms = "2".to_string();
        draft.square_footage = "2100".to_string();
        draft.description = "Restored mid-century modern.".to_string();
        draft.primary_image = Some(media_ref("primary.jpg"));
        draft.gallery = vec![media_ref("gallery/01.jpg")];
        draft.set_purchase_price("$700,000");
        draft.set_listing_price("$760,000");
        draft.access_type = Some(AccessType::ScheduledShowing);
        draft.closing_date = NaiveDate::from_ymd_opt(2026, 11, 30);
        draft.purchase_agreement = Some(media_ref("agreement.pdf"));
        draft
    }

    #[test]
    fn test_invalid_step_blocks_unless_saving_as_draft() {
        let mut session = FormSession::new(ListingDraft::new());
        session.set_save_as_draft(false);

        let nav = session.next(today());
        assert!(matches!(nav, Navigation::Blocked { step: WizardStep::PropertyDetails, .. }));
        assert_eq!(session.step(), WizardStep::PropertyDetails);

        session.set_save_as_draft(true);
        assert!(session.next(today()).is_moved());
        assert_eq!(session.step(), WizardStep::Media);
    }

    #[test]
    fn test_logistics_without_agreement_is_navigable_as_draft() {
        let mut draft = filled_draft();
        draft.purchase_agreement = None;
        let mut session = FormSession::new(draft);
        session.set_save_as_draft(true);

        let nav = session.jump_to(WizardStep::Logistics, today());
        assert!(nav.is_moved());
        assert!(!session.current_errors(today()).is_empty());
        assert!(session.next(today()).is_moved());
        assert_eq!(session.step(), WizardStep::Review);
    }

    #[test]
    fn test_review_forces_draft_when_gallery_is_empty() {
        let mut draft = filled_draft();
        draft.gallery.clear();
        draft.is_draft = false;
        let mut session = FormSession::new(draft);
        session.set_save_as_draft(true);
        session.jump_to(WizardStep::Logistics, today());
        session.set_save_as_draft(false);

        match session.next(today()) {
            Navigation::Moved { step, notices } => {
                assert_eq!(step, WizardStep::Review);
                assert_eq!(notices.len(), 1);
                assert_eq!(notices[0].level, NoticeLevel::Warning);
                assert!(notices[0].message.contains("gallery"));
            }
            other => panic!("expected to reach review, got {:?}", other),
        }
        assert!(session.save_as_draft());
    }

    #[test]
    fn test_review_turns_draft_off_when_complete() {
        let mut session = FormSession::new(filled_draft());
        assert!(session.save_as_draft());

        match session.jump_to(WizardStep::Review, today()) {
            Navigation::Moved { notices, .. } => {
                assert_eq!(notices[0].level, NoticeLevel::Info);
            }
            other => panic!("expected to reach review, got {:?}", other),
        }
        assert!(!session.save_as_draft());
    }

    #[test]
    fn test_going_back_is_always_allowed() {
        let mut session = FormSession::new(ListingDraft::new());
        session.jump_to(WizardStep::Financials, today());
        session.set_save_as_draft(false);

        assert!(session.back(today()).is_moved());
        assert_eq!(session.step(), WizardStep::Media);
    }

    #[test]
    fn test_step_is_persisted_and_resumed() {
        let dir = tempfile::tempdir().unwrap();
        let store = StepStore::new(dir.path().join("steps.json"));

        let (mut session, _) = FormSession::new(ListingDraft::new()).with_step_store(store.clone(), today());
        session.next(today());
        session.next(today());
        assert_eq!(store.load("new"), Some(WizardStep::Financials));

        let id = session.ensure_id();
        assert_eq!(store.load("new"), None);
        assert_eq!(store.load(&id.to_string()), Some(WizardStep::Financials));

        let (resumed, notices) = FormSession::new(session.into_draft()).with_step_store(store, today());
        assert_eq!(resumed.step(), WizardStep::Financials);
        assert!(notices.is_empty());
    }

    #[test]
    fn test_resume_stops_at_first_blocking_step() {
        let dir = tempfile::tempdir().unwrap();
        let store = StepStore::new(dir.path().join("steps.json"));
        store.remember("new", WizardStep::Review).unwrap();

        let mut draft = filled_draft();
        draft.purchase_agreement = None;
        draft.is_draft = false;
        let (session, notices) = FormSession::new(draft).with_step_store(store.clone(), today());
        assert_eq!(session.step(), WizardStep::Logistics);
        assert!(notices.is_empty());
        assert_eq!(store.load("new"), Some(WizardStep::Logistics));

        let mut empty = ListingDraft::new();
        empty.is_draft = false;
        store.remember("new", WizardStep::Review).unwrap();
        let (session, _) = FormSession::new(empty).with_step_store(store, today());
        assert_eq!(session.step(), WizardStep::PropertyDetails);
    }
}
