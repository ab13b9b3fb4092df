use certify_core::model::{Level, OptionDraft, QuestionDraft, QuestionError};

pub const OPTION_SLOTS: usize = 4;

/// Raw input of the dashboard's new-question form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionFormVm {
    pub level: Level,
    pub prompt: String,
    pub options: [String; OPTION_SLOTS],
    pub correct: usize,
    /// Seconds as typed; blank uses the default limit.
    pub time_limit: String,
}

impl Default for QuestionFormVm {
    fn default() -> Self {
        Self {
            level: Level::A1,
            prompt: String::new(),
            options: Default::default(),
            correct: 0,
            time_limit: String::new(),
        }
    }
}

impl QuestionFormVm {
    /// Build a draft; blank option slots are skipped.
    ///
    /// # Errors
    ///
    /// Returns a message when the time limit is not a whole number or the
    /// marked correct option is blank.
    pub fn to_draft(&self) -> Result<QuestionDraft, &'static str> {
        let time_limit_secs = match self.time_limit.trim() {
            "" => None,
            raw => Some(
                raw.parse::<u32>()
                    .map_err(|_| "Time limit must be a whole number of seconds")?,
            ),
        };
        if self.options[self.correct.min(OPTION_SLOTS - 1)].trim().is_empty() {
            return Err("The correct option must have text");
        }
        let options = self
            .options
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(index, text)| OptionDraft::new(text.clone(), index == self.correct))
            .collect();
        Ok(QuestionDraft {
            competency_id: None,
            level: self.level,
            prompt: self.prompt.clone(),
            options,
            time_limit_secs,
        })
    }
}

#[must_use]
pub fn question_error_message(err: &QuestionError) -> &'static str {
    match err {
        QuestionError::EmptyPrompt => "Question text is required",
        QuestionError::TooFewOptions { .. } => "Add at least two options",
        QuestionError::EmptyOptionText { .. } => "Options cannot be blank",
        QuestionError::CorrectOptionCount { .. } => "Mark exactly one option as correct",
        QuestionError::InvalidTimeLimit { .. } => "Time limit must be between 5 and 600 seconds",
        _ => "Question is invalid",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> QuestionFormVm {
        QuestionFormVm {
            level: Level::B1,
            prompt: "Which shortcut copies?".into(),
            options: ["Ctrl+C".into(), "Ctrl+V".into(), String::new(), String::new()],
            correct: 0,
            time_limit: "45".into(),
        }
    }

    #[test]
    fn blank_slots_are_dropped() {
        let draft = filled().to_draft().unwrap();
        assert_eq!(draft.options.len(), 2);
        assert!(draft.options[0].is_correct);
        assert_eq!(draft.time_limit_secs, Some(45));
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn rejects_bad_limit_and_blank_correct_slot() {
        let mut form = filled();
        form.time_limit = "soon".into();
        assert!(form.to_draft().is_err());

        let mut form = filled();
        form.correct = 3;
        assert_eq!(form.to_draft(), Err("The correct option must have text"));
    }

    #[test]
    fn validation_messages() {
        let mut form = filled();
        form.options[1] = String::new();
        let err = form.to_draft().unwrap().validate().unwrap_err();
        assert_eq!(question_error_message(&err), "Add at least two options");
    }
}
