use std::collections::HashMap;

use crate::model::{OptionId, QuestionId};

/// Selected option per question for a single step.
///
/// Re-selecting overwrites; the ledger never carries over between steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerLedger {
    answers: HashMap<QuestionId, OptionId>,
}

impl AnswerLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, question: QuestionId, option: OptionId) {
        self.answers.insert(question, option);
    }

    #[must_use]
    pub fn lookup(&self, question: &QuestionId) -> Option<&OptionId> {
        self.answers.get(question)
    }

    #[must_use]
    pub fn is_answered(&self, question: &QuestionId) -> bool {
        self.answers.contains_key(question)
    }

    #[must_use]
    pub fn is_selected(&self, question: &QuestionId, option: &OptionId) -> bool {
        self.lookup(question) == Some(option)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_selection_wins() {
        let mut ledger = AnswerLedger::new();
        let q = QuestionId::new("q1");
        ledger.record(q.clone(), OptionId::new("a"));
        ledger.record(q.clone(), OptionId::new("b"));

        assert_eq!(ledger.lookup(&q), Some(&OptionId::new("b")));
        assert!(ledger.is_selected(&q, &OptionId::new("b")));
        assert!(!ledger.is_selected(&q, &OptionId::new("a")));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn unanswered_question_has_no_entry() {
        let ledger = AnswerLedger::new();
        assert!(!ledger.is_answered(&QuestionId::new("q1")));
        assert!(ledger.lookup(&QuestionId::new("q1")).is_none());
    }

    #[test]
    fn clear_empties_ledger() {
        let mut ledger = AnswerLedger::new();
        ledger.record(QuestionId::new("q1"), OptionId::new("a"));
        ledger.clear();
        assert!(ledger.is_empty());
    }
}
