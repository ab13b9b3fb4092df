//! Aggregates shown on the admin dashboard.

use std::collections::HashMap;

use certify_core::model::{CertifiedLevel, Level, SessionRecord, User};
use storage::repository::QuestionRecord;
use tracing::debug;

use crate::error::DashboardError;
use crate::question_service::QuestionService;
use crate::session_service::SessionService;
use crate::user_service::UserService;

/// Bar labels in display order.
pub const CERTIFIED_LABELS: [CertifiedLevel; 7] = [
    CertifiedLevel::Fail,
    CertifiedLevel::Level(Level::A1),
    CertifiedLevel::Level(Level::A2),
    CertifiedLevel::Level(Level::B1),
    CertifiedLevel::Level(Level::B2),
    CertifiedLevel::Level(Level::C1),
    CertifiedLevel::Level(Level::C2),
];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardStats {
    pub total_sessions: usize,
    pub total_questions: usize,
    pub total_users: usize,
    /// One entry per [`CERTIFIED_LABELS`] label, zero counts included.
    pub certified_counts: Vec<(CertifiedLevel, usize)>,
    /// Mean session score in percent, `None` without sessions.
    pub average_score: Option<f64>,
    pub passed: usize,
    pub failed: usize,
    /// Questions per level; questions without a level are not counted.
    pub questions_per_level: Vec<(Level, usize)>,
}

impl DashboardStats {
    #[must_use]
    pub fn compute(sessions: &[SessionRecord], questions: &[QuestionRecord], users: &[User]) -> Self {
        let mut certified: HashMap<CertifiedLevel, usize> = HashMap::new();
        for session in sessions {
            *certified.entry(session.certified()).or_default() += 1;
        }
        let certified_counts = CERTIFIED_LABELS
            .iter()
            .map(|label| (*label, certified.get(label).copied().unwrap_or(0)))
            .collect();

        let failed = sessions.iter().filter(|s| s.certified().is_fail()).count();

        #[allow(clippy::cast_precision_loss)]
        let average_score = (!sessions.is_empty()).then(|| {
            sessions.iter().map(|s| s.score().percent()).sum::<f64>() / sessions.len() as f64
        });

        let questions_per_level = Level::ALL
            .iter()
            .map(|level| {
                let count = questions
                    .iter()
                    .filter(|record| record.level == Some(*level))
                    .count();
                (*level, count)
            })
            .collect();

        Self {
            total_sessions: sessions.len(),
            total_questions: questions.len(),
            total_users: users.len(),
            certified_counts,
            average_score,
            passed: sessions.len() - failed,
            failed,
            questions_per_level,
        }
    }

    #[must_use]
    pub fn count_for(&self, label: CertifiedLevel) -> usize {
        self.certified_counts
            .iter()
            .find(|(l, _)| *l == label)
            .map_or(0, |(_, count)| *count)
    }
}

/// Case-insensitive match on prompt, option text, or level label.
///
/// A blank query returns every record.
#[must_use]
pub fn search_questions<'a>(records: &'a [QuestionRecord], query: &str) -> Vec<&'a QuestionRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|record| {
            record.question.prompt().to_lowercase().contains(&needle)
                || record
                    .question
                    .options()
                    .iter()
                    .any(|option| option.text().to_lowercase().contains(&needle))
                || record
                    .level
                    .is_some_and(|level| level.as_str().eq_ignore_ascii_case(&needle))
        })
        .collect()
}

/// Loads the three listings the dashboard aggregates.
#[derive(Clone)]
pub struct DashboardService {
    sessions: SessionService,
    questions: QuestionService,
    users: UserService,
}

impl DashboardService {
    #[must_use]
    pub fn new(sessions: SessionService, questions: QuestionService, users: UserService) -> Self {
        Self {
            sessions,
            questions,
            users,
        }
    }

    /// # Errors
    ///
    /// Returns `DashboardError` naming the listing that failed.
    pub async fn stats(&self, force: bool) -> Result<DashboardStats, DashboardError> {
        let sessions = self.sessions.list(force).await?;
        let questions = self.questions.list(force).await?;
        let users = self.users.list(force).await?;
        let stats = DashboardStats::compute(&sessions, &questions, &users);
        debug!(
            sessions = stats.total_sessions,
            questions = stats.total_questions,
            users = stats.total_users,
            "dashboard stats computed"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certify_core::Score;
    use certify_core::model::{
        AnswerOption, AssessmentId, AttemptId, OptionId, Question, QuestionId, SessionRecordDraft,
    };
    use certify_core::time::fixed_now;

    fn session(certified: CertifiedLevel, score: f64) -> SessionRecord {
        SessionRecord::new(SessionRecordDraft {
            attempt_id: AttemptId::generate(),
            assessment_id: AssessmentId::new("c1"),
            user_id: None,
            score: Score::from_percent(score).unwrap(),
            certified,
            no_retake: certified.is_fail(),
            steps_completed: 1,
            started_at: fixed_now(),
            completed_at: fixed_now(),
        })
        .unwrap()
    }

    fn question(id: &str, prompt: &str, level: Option<Level>) -> QuestionRecord {
        QuestionRecord {
            question: Question::new(
                QuestionId::new(id),
                prompt,
                vec![
                    AnswerOption::new(OptionId::new(format!("{id}-a")), "Spreadsheet", true),
                    AnswerOption::new(OptionId::new(format!("{id}-b")), "Printer", false),
                ],
                None,
            ),
            level,
            competency_id: None,
        }
    }

    #[test]
    fn counts_average_and_pass_fail() {
        let sessions = vec![
            session(CertifiedLevel::Fail, 10.0),
            session(CertifiedLevel::Level(Level::A2), 80.0),
            session(CertifiedLevel::Level(Level::A2), 90.0),
        ];
        let questions = vec![
            question("q1", "What is a cell?", Some(Level::A1)),
            question("q2", "Define a macro", Some(Level::B2)),
            question("q3", "Orphan", None),
        ];
        let stats = DashboardStats::compute(&sessions, &questions, &[]);

        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.count_for(CertifiedLevel::Fail), 1);
        assert_eq!(stats.count_for(CertifiedLevel::Level(Level::A2)), 2);
        assert_eq!(stats.count_for(CertifiedLevel::Level(Level::C2)), 0);
        assert_eq!(stats.certified_counts.len(), 7);
        assert_eq!((stats.passed, stats.failed), (2, 1));
        assert!((stats.average_score.unwrap() - 60.0).abs() < 1e-9);
        assert_eq!(stats.questions_per_level[0], (Level::A1, 1));
        assert_eq!(stats.questions_per_level[3], (Level::B2, 1));
        assert_eq!(stats.total_questions, 3);
    }

    #[test]
    fn empty_inputs_have_no_average() {
        let stats = DashboardStats::compute(&[], &[], &[]);
        assert_eq!(stats.average_score, None);
        assert_eq!(stats.passed + stats.failed, 0);
    }

    #[test]
    fn search_matches_prompt_option_and_level() {
        let records = vec![
            question("q1", "What is a cell?", Some(Level::A1)),
            question("q2", "Define a macro", Some(Level::B2)),
        ];
        assert_eq!(search_questions(&records, "MACRO").len(), 1);
        assert_eq!(search_questions(&records, "printer").len(), 2);
        assert_eq!(search_questions(&records, "a1")[0].question.id().as_str(), "q1");
        assert_eq!(search_questions(&records, "  ").len(), 2);
        assert!(search_questions(&records, "database").is_empty());
    }
}
