//! Wire shapes of the assessment API and their mapping to domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use certify_core::model::{
    AnswerOption, Assessment, AssessmentId, AttemptId, CertifiedLevel, Credentials, Level,
    LevelBlock, OptionId, PriorResult, Question, QuestionId, Role, SessionId, SessionRecord,
    SessionRecordDraft, User, UserId, ValidatedQuestion,
};
use certify_core::scoring::Score;

use crate::repository::{NewAssessment, NewUser, QuestionRecord, StorageError};

/// `{ success, message?, data }` wrapper around every response body.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

fn default_success() -> bool {
    true
}

//
// ─── AUTH ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct UserDto {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

impl From<UserDto> for User {
    fn from(dto: UserDto) -> Self {
        Self {
            id: UserId::new(dto.id),
            name: dto.name,
            email: dto.email,
            role: Role::parse(&dto.role),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairDto {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPairDto> for Credentials {
    fn from(dto: TokenPairDto) -> Self {
        Credentials::new(dto.access_token, dto.refresh_token)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginDto {
    pub user: UserDto,
    pub access_token: String,
    pub refresh_token: String,
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDto {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<OptionDto>,
    #[serde(default)]
    pub time_limit_seconds: Option<i64>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub competency_id: Option<String>,
}

impl QuestionDto {
    pub fn into_question(self) -> Question {
        let options = self
            .options
            .into_iter()
            .map(|o| AnswerOption::new(OptionId::new(o.id), o.text, o.is_correct))
            .collect();
        // Non-positive or oversized limits fall back to the default.
        let limit = self
            .time_limit_seconds
            .and_then(|secs| u32::try_from(secs).ok());
        Question::new(QuestionId::new(self.id), self.question_text, options, limit)
    }

    pub fn into_record(self) -> QuestionRecord {
        let level = self.level.as_deref().and_then(|raw| raw.parse().ok());
        let competency_id = self
            .competency_id
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(AssessmentId::new);
        QuestionRecord {
            question: self.into_question(),
            level,
            competency_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionPayload<'a> {
    pub text: &'a str,
    pub is_correct: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competency_id: Option<&'a str>,
    pub level: &'static str,
    pub question_text: &'a str,
    pub options: Vec<OptionPayload<'a>>,
    pub time_limit_seconds: u32,
}

impl<'a> From<&'a ValidatedQuestion> for QuestionPayload<'a> {
    fn from(q: &'a ValidatedQuestion) -> Self {
        Self {
            competency_id: q.competency_id.as_ref().map(AssessmentId::as_str),
            level: q.level.as_str(),
            question_text: &q.prompt,
            options: q
                .options
                .iter()
                .map(|o| OptionPayload {
                    text: &o.text,
                    is_correct: o.is_correct,
                })
                .collect(),
            time_limit_seconds: q.time_limit_secs,
        }
    }
}

//
// ─── COMPETENCIES ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub struct LevelBlockDto {
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub questions: Vec<QuestionDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentDto {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub no_retake: Option<bool>,
    #[serde(default)]
    pub questions_by_level: Vec<LevelBlockDto>,
}

impl AssessmentDto {
    fn prior(&self) -> Option<PriorResult> {
        if self.score.is_none() && self.level.is_none() && self.no_retake.is_none() {
            return None;
        }
        let certified = self
            .level
            .as_deref()
            .and_then(|raw| raw.parse::<CertifiedLevel>().ok())
            .unwrap_or_default();
        Some(PriorResult {
            score: self.score.unwrap_or(0.0),
            certified,
            no_retake: self.no_retake.unwrap_or(false),
        })
    }

    /// The first `questionsByLevel` entry, labelled `requested` if its own
    /// level is missing or unreadable.
    pub fn into_first_block(self, requested: Level) -> Option<LevelBlock> {
        let block = self.questions_by_level.into_iter().next()?;
        let level = block.level.parse().unwrap_or(requested);
        let questions = block
            .questions
            .into_iter()
            .map(QuestionDto::into_question)
            .collect();
        Some(LevelBlock::new(level, questions))
    }

    pub fn into_assessment(self) -> Assessment {
        let prior = self.prior();
        let mut blocks = Vec::with_capacity(self.questions_by_level.len());
        for block in self.questions_by_level {
            match block.level.parse::<Level>() {
                Ok(level) => blocks.push(LevelBlock::new(
                    level,
                    block
                        .questions
                        .into_iter()
                        .map(QuestionDto::into_question)
                        .collect(),
                )),
                Err(err) => tracing::warn!(competency = %self.id, %err, "skipping level block"),
            }
        }
        let assessment =
            Assessment::new(AssessmentId::new(self.id), self.name, self.description)
                .with_blocks(blocks);
        match prior {
            Some(prior) => assessment.with_prior(prior),
            None => assessment,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewAssessmentPayload<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

impl<'a> From<&'a NewAssessment> for NewAssessmentPayload<'a> {
    fn from(draft: &'a NewAssessment) -> Self {
        Self {
            name: &draft.name,
            description: &draft.description,
        }
    }
}

//
// ─── SESSIONS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub attempt_id: Option<String>,
    pub competency_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub score: f64,
    pub level: String,
    #[serde(default)]
    pub no_retake: bool,
    #[serde(default = "default_steps")]
    pub steps_completed: u8,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

fn default_steps() -> u8 {
    1
}

fn bad(err: impl std::fmt::Display) -> StorageError {
    StorageError::Serialization(err.to_string())
}

impl From<&SessionRecord> for SessionDto {
    fn from(record: &SessionRecord) -> Self {
        Self {
            id: record.remote_id().map(|id| id.as_str().to_string()),
            attempt_id: Some(record.attempt_id().to_string()),
            competency_id: record.assessment_id().as_str().to_string(),
            user_id: record.user_id().map(|id| id.as_str().to_string()),
            score: record.score().percent(),
            level: record.certified().as_str().to_string(),
            no_retake: record.no_retake(),
            steps_completed: record.steps_completed(),
            started_at: record.started_at(),
            completed_at: record.completed_at(),
        }
    }
}

impl TryFrom<SessionDto> for SessionRecord {
    type Error = StorageError;

    fn try_from(dto: SessionDto) -> Result<Self, Self::Error> {
        let attempt_id = match dto.attempt_id.as_deref() {
            Some(raw) => raw.parse::<AttemptId>().map_err(bad)?,
            None => AttemptId::generate(),
        };
        let certified = dto.level.parse::<CertifiedLevel>().map_err(bad)?;
        let score = Score::from_percent(dto.score).map_err(bad)?;
        let record = SessionRecord::new(SessionRecordDraft {
            attempt_id,
            assessment_id: AssessmentId::new(dto.competency_id),
            user_id: dto.user_id.map(UserId::new),
            score,
            certified,
            no_retake: dto.no_retake,
            steps_completed: dto.steps_completed,
            started_at: dto.started_at,
            completed_at: dto.completed_at,
        })
        .map_err(bad)?;
        Ok(match dto.id {
            Some(id) => record.with_remote_id(SessionId::new(id)),
            None => record,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatedDto {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
}

//
// ─── USERS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
pub struct NewUserPayload<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: &'a str,
}

impl<'a> From<&'a NewUser> for NewUserPayload<'a> {
    fn from(user: &'a NewUser) -> Self {
        Self {
            name: &user.name,
            email: &user.email,
            password: &user.password,
            role: user.role.as_str(),
        }
    }
}
