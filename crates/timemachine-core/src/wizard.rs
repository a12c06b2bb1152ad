//! Five-step situation input wizard.
//!
//! Each step has its own validity predicate; moving forward is only possible
//! while the current step is valid, moving back is always allowed. Earlier
//! steps are not re-validated once passed.

use crate::reflection::{Emotion, Situation};

/// Free-text answers must be longer than this many characters (trimmed).
pub const MIN_DESCRIPTION_CHARS: usize = 5;
pub const MIN_INTENSITY: u8 = 1;
pub const MAX_INTENSITY: u8 = 10;

/// Wizard steps in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    WhatHappened = 1,
    Emotion = 2,
    WhatYouDid = 3,
    DesiredOutcome = 4,
    Persona = 5,
}

impl WizardStep {
    pub const COUNT: u8 = 5;

    /// 1-based position.
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Self::WhatHappened => Some(Self::Emotion),
            Self::Emotion => Some(Self::WhatYouDid),
            Self::WhatYouDid => Some(Self::DesiredOutcome),
            Self::DesiredOutcome => Some(Self::Persona),
            Self::Persona => None,
        }
    }

    pub fn previous(self) -> Option<Self> {
        match self {
            Self::WhatHappened => None,
            Self::Emotion => Some(Self::WhatHappened),
            Self::WhatYouDid => Some(Self::Emotion),
            Self::DesiredOutcome => Some(Self::WhatYouDid),
            Self::Persona => Some(Self::DesiredOutcome),
        }
    }

    /// Whether `draft` satisfies this step's predicate.
    pub fn is_satisfied_by(self, draft: &Situation) -> bool {
        match self {
            Self::WhatHappened => is_long_enough(&draft.what_happened),
            Self::Emotion => {
                !draft.emotions.is_empty()
                    && (MIN_INTENSITY..=MAX_INTENSITY).contains(&draft.emotion_intensity)
            }
            Self::WhatYouDid => is_long_enough(&draft.what_you_did),
            Self::DesiredOutcome => is_long_enough(&draft.how_you_wish_it_had_gone),
            Self::Persona => {
                !draft.persona_name.trim().is_empty()
                    && !draft.persona_tone.trim().is_empty()
                    && !draft.persona_personality.trim().is_empty()
            }
        }
    }
}

fn is_long_enough(text: &str) -> bool {
    text.trim().chars().count() > MIN_DESCRIPTION_CHARS
}

/// Result of pressing "back" in the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardBack {
    /// Moved to the given earlier step.
    Previous(WizardStep),
    /// Back from step 1: leave the wizard without creating anything.
    Cancelled,
}

/// Wizard state: the current step and the draft being filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SituationWizard {
    step: WizardStep,
    draft: Situation,
}

impl Default for SituationWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl SituationWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::WhatHappened,
            draft: Situation::default(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &Situation {
        &self.draft
    }

    pub fn set_what_happened(&mut self, text: impl Into<String>) {
        self.draft.what_happened = text.into();
    }

    pub fn set_what_you_did(&mut self, text: impl Into<String>) {
        self.draft.what_you_did = text.into();
    }

    pub fn set_desired_outcome(&mut self, text: impl Into<String>) {
        self.draft.how_you_wish_it_had_gone = text.into();
    }

    pub fn set_persona(
        &mut self,
        name: impl Into<String>,
        tone: impl Into<String>,
        personality: impl Into<String>,
    ) {
        self.draft.persona_name = name.into();
        self.draft.persona_tone = tone.into();
        self.draft.persona_personality = personality.into();
    }

    /// Single-select toggle: picking the selected tag clears the selection,
    /// picking another tag replaces it.
    pub fn toggle_emotion(&mut self, emotion: Emotion) {
        if self.draft.emotions.contains(&emotion) {
            self.draft.emotions.clear();
        } else {
            self.draft.emotions = vec![emotion];
        }
    }

    /// Sets the intensity, clamped to 1-10.
    pub fn set_intensity(&mut self, intensity: u8) {
        self.draft.emotion_intensity = intensity.clamp(MIN_INTENSITY, MAX_INTENSITY);
    }

    pub fn is_step_valid(&self) -> bool {
        self.step.is_satisfied_by(&self.draft)
    }

    /// Moves to the next step if the current one is valid.
    ///
    /// Returns `false` (and stays put) when the step is invalid or already
    /// the last one.
    pub fn advance(&mut self) -> bool {
        if !self.is_step_valid() {
            return false;
        }
        match self.step.next() {
            Some(next) => {
                self.step = next;
                true
            }
            None => false,
        }
    }

    pub fn back(&mut self) -> WizardBack {
        match self.step.previous() {
            Some(previous) => {
                self.step = previous;
                WizardBack::Previous(previous)
            }
            None => WizardBack::Cancelled,
        }
    }

    /// Hands out the finished draft.
    ///
    /// Only possible on the last step with its predicate satisfied; otherwise
    /// a no-op returning `None`.
    pub fn submit(&self) -> Option<Situation> {
        (self.step == WizardStep::Persona && self.is_step_valid()).then(|| self.draft.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_step(wizard: &mut SituationWizard) {
        match wizard.step() {
            WizardStep::WhatHappened => wizard.set_what_happened("친구와 퇴근 후 다퉜다"),
            WizardStep::Emotion => wizard.toggle_emotion(Emotion::Sadness),
            WizardStep::WhatYouDid => wizard.set_what_you_did("그냥 자리를 떠났다"),
            WizardStep::DesiredOutcome => wizard.set_desired_outcome("서로 사과하고 싶었다"),
            WizardStep::Persona => wizard.set_persona("지수", "다정한", "솔직한"),
        }
    }

    #[test]
    fn test_cannot_advance_any_step_while_invalid() {
        let mut wizard = SituationWizard::new();
        for expected in 1..=WizardStep::COUNT {
            assert_eq!(wizard.step().number(), expected);
            assert!(!wizard.is_step_valid());
            if wizard.step() != WizardStep::Persona {
                assert!(!wizard.advance(), "step {} advanced while invalid", expected);
                assert_eq!(wizard.step().number(), expected);
            } else {
                assert!(wizard.submit().is_none());
            }
            fill_step(&mut wizard);
            assert!(wizard.is_step_valid());
            if wizard.step() != WizardStep::Persona {
                assert!(wizard.advance());
            }
        }
        assert_eq!(wizard.step(), WizardStep::Persona);
        assert!(wizard.submit().is_some());
    }

    #[test]
    fn test_description_needs_more_than_five_trimmed_chars() {
        let mut wizard = SituationWizard::new();
        wizard.set_what_happened("  12345  ");
        assert!(!wizard.is_step_valid());
        wizard.set_what_happened("123456");
        assert!(wizard.is_step_valid());
        wizard.set_what_happened("가나다라마바");
        assert!(wizard.is_step_valid());
    }

    #[test]
    fn test_emotion_toggle_is_single_select() {
        let mut wizard = SituationWizard::new();
        wizard.toggle_emotion(Emotion::Anger);
        assert_eq!(wizard.draft().emotions, vec![Emotion::Anger]);
        wizard.toggle_emotion(Emotion::Fear);
        assert_eq!(wizard.draft().emotions, vec![Emotion::Fear]);
        wizard.toggle_emotion(Emotion::Fear);
        assert!(wizard.draft().emotions.is_empty());
    }

    #[test]
    fn test_intensity_defaults_to_five_and_clamps() {
        let mut wizard = SituationWizard::new();
        assert_eq!(wizard.draft().emotion_intensity, 5);
        wizard.set_intensity(0);
        assert_eq!(wizard.draft().emotion_intensity, 1);
        wizard.set_intensity(42);
        assert_eq!(wizard.draft().emotion_intensity, 10);
    }

    #[test]
    fn test_back_is_unguarded_and_cancels_at_first_step() {
        let mut wizard = SituationWizard::new();
        fill_step(&mut wizard);
        assert!(wizard.advance());
        // step 2 is invalid, going back still works
        assert_eq!(wizard.back(), WizardBack::Previous(WizardStep::WhatHappened));
        assert_eq!(wizard.back(), WizardBack::Cancelled);
        assert_eq!(wizard.step(), WizardStep::WhatHappened);
    }

    #[test]
    fn test_no_revalidation_of_earlier_steps() {
        let mut wizard = SituationWizard::new();
        fill_step(&mut wizard);
        assert!(wizard.advance());
        wizard.set_what_happened("");
        fill_step(&mut wizard);
        assert!(wizard.advance());
        assert_eq!(wizard.step(), WizardStep::WhatYouDid);
    }

    #[test]
    fn test_persona_fields_must_all_be_present() {
        let mut draft = Situation::default();
        draft.persona_name = "지수".to_string();
        draft.persona_tone = "다정한".to_string();
        assert!(!WizardStep::Persona.is_satisfied_by(&draft));
        draft.persona_personality = "   ".to_string();
        assert!(!WizardStep::Persona.is_satisfied_by(&draft));
        draft.persona_personality = "솔직한".to_string();
        assert!(WizardStep::Persona.is_satisfied_by(&draft));
    }
}
