use certify_core::model::{SessionRecord, User};
use services::DashboardStats;
use storage::repository::QuestionRecord;

use crate::vm::time_fmt::format_datetime;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarVm {
    pub label: String,
    pub count: usize,
    /// Bar width relative to the largest count, 0..=100.
    pub width_pct: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DashboardVm {
    pub totals: Vec<(&'static str, String)>,
    pub certified_bars: Vec<BarVm>,
    pub level_bars: Vec<BarVm>,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn bars(entries: impl Iterator<Item = (String, usize)>) -> Vec<BarVm> {
    let entries: Vec<_> = entries.collect();
    let max = entries.iter().map(|(_, count)| *count).max().unwrap_or(0);
    entries
        .into_iter()
        .map(|(label, count)| BarVm {
            width_pct: if max == 0 {
                0
            } else {
                ((count as f64 / max as f64) * 100.0).round() as u32
            },
            label,
            count,
        })
        .collect()
}

impl From<&DashboardStats> for DashboardVm {
    fn from(stats: &DashboardStats) -> Self {
        let average = stats
            .average_score
            .map_or_else(|| "--".to_string(), |avg| format!("{avg:.2}%"));
        Self {
            totals: vec![
                ("Sessions", stats.total_sessions.to_string()),
                ("Questions", stats.total_questions.to_string()),
                ("Users", stats.total_users.to_string()),
                ("Average score", average),
                ("Passed", stats.passed.to_string()),
                ("Failed", stats.failed.to_string()),
            ],
            certified_bars: bars(
                stats
                    .certified_counts
                    .iter()
                    .map(|(label, count)| (label.to_string(), *count)),
            ),
            level_bars: bars(
                stats
                    .questions_per_level
                    .iter()
                    .map(|(level, count)| (level.to_string(), *count)),
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionRowVm {
    pub id: String,
    pub prompt: String,
    pub level: String,
    pub options: String,
    pub correct: String,
}

impl From<&QuestionRecord> for QuestionRowVm {
    fn from(record: &QuestionRecord) -> Self {
        let question = &record.question;
        let correct = question
            .options()
            .iter()
            .filter(|option| option.is_correct())
            .map(|option| option.text())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            id: question.id().to_string(),
            prompt: question.prompt().to_string(),
            level: record
                .level
                .map_or_else(|| "-".to_string(), |level| level.to_string()),
            options: question.options().len().to_string(),
            correct: if correct.is_empty() {
                "-".to_string()
            } else {
                correct
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRowVm {
    /// Server id; rows kept only locally have none and cannot be deleted.
    pub id: Option<String>,
    pub score: String,
    pub certified: String,
    pub steps: u8,
    pub completed_at: String,
}

impl From<&SessionRecord> for SessionRowVm {
    fn from(record: &SessionRecord) -> Self {
        Self {
            id: record.remote_id().map(ToString::to_string),
            score: format!("{:.2}%", record.score().percent()),
            certified: record.certified().to_string(),
            steps: record.steps_completed(),
            completed_at: format_datetime(record.completed_at()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRowVm {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<&User> for UserRowVm {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certify_core::model::{AnswerOption, CertifiedLevel, Level, OptionId, Question, QuestionId};

    #[test]
    fn bars_scale_to_largest_count() {
        let stats = DashboardStats {
            total_sessions: 3,
            certified_counts: vec![
                (CertifiedLevel::Fail, 1),
                (CertifiedLevel::Level(Level::A1), 2),
                (CertifiedLevel::Level(Level::A2), 0),
            ],
            average_score: Some(55.555),
            ..DashboardStats::default()
        };
        let vm = DashboardVm::from(&stats);
        let widths: Vec<_> = vm.certified_bars.iter().map(|bar| bar.width_pct).collect();
        assert_eq!(widths, vec![50, 100, 0]);
        assert_eq!(vm.certified_bars[0].label, "Fail");
        assert!(vm.totals.contains(&("Average score", "55.56%".to_string())));
        assert!(vm.level_bars.is_empty());
    }

    #[test]
    fn question_row_lists_correct_answers() {
        let record = QuestionRecord {
            question: Question::new(
                QuestionId::new("q1"),
                "Which is an input device?",
                vec![
                    AnswerOption::new(OptionId::new("a"), "Keyboard", true),
                    AnswerOption::new(OptionId::new("b"), "Monitor", false),
                ],
                None,
            ),
            level: None,
            competency_id: None,
        };
        let row = QuestionRowVm::from(&record);
        assert_eq!(row.correct, "Keyboard");
        assert_eq!(row.level, "-");
        assert_eq!(row.options, "2");
    }
}
