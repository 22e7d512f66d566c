// src/services/interview_service.rs
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::seq::SliceRandom;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::interview::{
        keyword_score, question_bank, AnswerResult, Difficulty, InterviewCategory, InterviewSession, Question,
        SessionType,
    },
};

pub type SessionBoard = DashMap<String, InterviewSession>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    #[serde(rename = "type")]
    pub kind: SessionType,
    pub category: Option<InterviewCategory>,
    pub question_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub session_id: String,
    pub question_id: String,
    pub answer: String,
    #[serde(default)]
    pub time_spent: u64,
}

pub fn list_questions(
    category: Option<InterviewCategory>,
    difficulty: Option<Difficulty>,
    limit: usize,
) -> AppResult<Vec<Question>> {
    if !(1..=50).contains(&limit) {
        return Err(AppError::validation("Limit must be between 1 and 50"));
    }
    Ok(question_bank()
        .into_iter()
        .filter(|q| category.is_none_or(|c| q.category == c))
        .filter(|q| difficulty.is_none_or(|d| q.difficulty == d))
        .take(limit)
        .collect())
}

/// Opens a session with a random pick of questions from the bank.
pub fn start_session(
    board: &SessionBoard,
    account_id: &str,
    new: NewSession,
    now: DateTime<Utc>,
) -> AppResult<InterviewSession> {
    let question_count = new.question_count.unwrap_or(5);
    if !(1..=20).contains(&question_count) {
        return Err(AppError::validation("Question count must be between 1 and 20"));
    }

    let mut questions: Vec<Question> = question_bank()
        .into_iter()
        .filter(|q| new.category.is_none_or(|c| q.category == c))
        .collect();
    questions.shuffle(&mut rand::thread_rng());
    questions.truncate(question_count);

    let session = InterviewSession {
        id: Uuid::new_v4().to_string(),
        user_id: account_id.to_string(),
        kind: new.kind,
        category: new.category,
        question_count,
        start_time: now,
        questions,
        answers: Vec::new(),
    };
    board.insert(session.id.clone(), session.clone());
    tracing::info!("Interview session {} started for {}", session.id, account_id);
    Ok(session)
}

/// Scores one answer by keyword match and records it on the caller's session.
pub fn submit_answer(
    board: &SessionBoard,
    account_id: &str,
    submission: AnswerSubmission,
    now: DateTime<Utc>,
) -> AppResult<AnswerResult> {
    let answer = submission.answer.trim();
    if answer.is_empty() {
        return Err(AppError::validation("Answer is required"));
    }

    let mut session = board
        .get_mut(&submission.session_id)
        .filter(|s| s.user_id == account_id)
        .ok_or_else(|| AppError::not_found("Session not found", "SESSION_NOT_FOUND"))?;
    let question = session
        .questions
        .iter()
        .find(|q| q.id == submission.question_id)
        .ok_or_else(|| AppError::not_found("Question not found", "QUESTION_NOT_FOUND"))?;

    let (score, matched) = keyword_score(answer, &question.keywords);
    let result = AnswerResult {
        question_id: submission.question_id,
        answer: answer.to_string(),
        score,
        time_spent: submission.time_spent,
        feedback: format!("Score: {:.1}%. Matched keywords: {}", score, matched.join(", ")),
        submitted_at: now,
    };
    session.answers.push(result.clone());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn practice(category: Option<InterviewCategory>, count: Option<usize>) -> NewSession {
        NewSession { kind: SessionType::Practice, category, question_count: count }
    }

    #[test]
    fn question_filters_and_limit() {
        let dsa = list_questions(Some(InterviewCategory::Dsa), None, 10).unwrap();
        assert!(!dsa.is_empty());
        assert!(dsa.iter().all(|q| q.category == InterviewCategory::Dsa));

        let easy_dsa = list_questions(Some(InterviewCategory::Dsa), Some(Difficulty::Easy), 10).unwrap();
        assert_eq!(easy_dsa.len(), 1);
        assert_eq!(list_questions(None, None, 2).unwrap().len(), 2);
        assert!(list_questions(None, None, 0).is_err());
        assert!(list_questions(None, None, 51).is_err());
    }

    #[test]
    fn sessions_pick_from_the_requested_category() {
        let board = SessionBoard::new();
        let session = start_session(&board, "u1", practice(Some(InterviewCategory::Hr), Some(5)), Utc::now()).unwrap();
        assert_eq!(session.questions.len(), 1);
        assert_eq!(session.questions[0].category, InterviewCategory::Hr);
        assert!(board.contains_key(&session.id));

        let all = start_session(&board, "u1", practice(None, Some(3)), Utc::now()).unwrap();
        assert_eq!(all.questions.len(), 3);
        assert!(start_session(&board, "u1", practice(None, Some(21)), Utc::now()).is_err());
    }

    #[test]
    fn answers_are_scored_and_recorded_for_the_owner_only() {
        let board = SessionBoard::new();
        let session = start_session(&board, "u1", practice(Some(InterviewCategory::Hr), None), Utc::now()).unwrap();
        let submit = |who: &str, answer: &str| {
            submit_answer(
                &board,
                who,
                AnswerSubmission {
                    session_id: session.id.clone(),
                    question_id: "2".to_string(),
                    answer: answer.to_string(),
                    time_spent: 42,
                },
                Utc::now(),
            )
        };

        let result = submit("u1", "My background is in robotics and my goals are research").unwrap();
        assert_eq!(result.score, 50.0);
        assert_eq!(result.feedback, "Score: 50.0%. Matched keywords: background, goals");
        assert_eq!(board.get(&session.id).unwrap().answers.len(), 1);

        let err = submit("u2", "skills").unwrap_err();
        assert!(matches!(err, AppError::NotFound { code: "SESSION_NOT_FOUND", .. }));
        assert!(submit("u1", "   ").is_err());

        let err = submit_answer(
            &board,
            "u1",
            AnswerSubmission {
                session_id: session.id.clone(),
                question_id: "99".to_string(),
                answer: "anything".to_string(),
                time_spent: 0,
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound { code: "QUESTION_NOT_FOUND", .. }));
    }
}
