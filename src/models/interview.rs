// src/models/interview.rs
//
// Mock-interview practice. The question bank is fixed; sessions live in memory
// only and are lost on restart.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewCategory {
    #[serde(rename = "DSA")]
    Dsa,
    #[serde(rename = "HR")]
    Hr,
    Aptitude,
    #[serde(rename = "System Design")]
    SystemDesign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Practice,
    Mock,
    Ai,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: &'static str,
    pub category: InterviewCategory,
    pub subcategory: &'static str,
    pub difficulty: Difficulty,
    pub question: &'static str,
    pub expected_answer: &'static str,
    pub keywords: Vec<&'static str>,
    /// Seconds.
    pub time_limit: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub question_id: String,
    pub answer: String,
    pub score: f64,
    pub time_spent: u64,
    pub feedback: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSession {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: SessionType,
    pub category: Option<InterviewCategory>,
    pub question_count: usize,
    pub start_time: DateTime<Utc>,
    pub questions: Vec<Question>,
    pub answers: Vec<AnswerResult>,
}

pub fn question_bank() -> Vec<Question> {
    vec![
        Question {
            id: "1",
            category: InterviewCategory::Dsa,
            subcategory: "Arrays",
            difficulty: Difficulty::Easy,
            question: "Find the maximum element in an array",
            expected_answer: "Iterate through the array and keep track of the maximum element found so far.",
            keywords: vec!["array", "maximum", "iteration", "comparison"],
            time_limit: 300,
        },
        Question {
            id: "2",
            category: InterviewCategory::Hr,
            subcategory: "General",
            difficulty: Difficulty::Medium,
            question: "Tell me about yourself",
            expected_answer: "Provide a brief professional summary highlighting relevant skills and experience.",
            keywords: vec!["background", "skills", "experience", "goals"],
            time_limit: 180,
        },
        Question {
            id: "3",
            category: InterviewCategory::Dsa,
            subcategory: "Linked Lists",
            difficulty: Difficulty::Medium,
            question: "Detect a cycle in a linked list",
            expected_answer: "Advance a slow and a fast pointer; they meet inside the cycle if one exists.",
            keywords: vec!["pointer", "slow", "fast", "cycle"],
            time_limit: 600,
        },
        Question {
            id: "4",
            category: InterviewCategory::Aptitude,
            subcategory: "Percentages",
            difficulty: Difficulty::Easy,
            question: "A price rises by 20% and then falls by 20%. What is the net change?",
            expected_answer: "A net decrease of 4%, since 1.2 times 0.8 is 0.96.",
            keywords: vec!["decrease", "4%", "0.96"],
            time_limit: 120,
        },
        Question {
            id: "5",
            category: InterviewCategory::SystemDesign,
            subcategory: "Caching",
            difficulty: Difficulty::Hard,
            question: "Design a URL shortener",
            expected_answer: "Generate short keys, store the mapping in a database, cache hot keys and redirect.",
            keywords: vec!["hash", "database", "cache", "redirect"],
            time_limit: 1800,
        },
    ]
}

/// Share of the question's keywords found inside any answer word, as a percentage,
/// plus the keywords that matched.
pub fn keyword_score(answer: &str, keywords: &[&str]) -> (f64, Vec<String>) {
    if keywords.is_empty() {
        return (0.0, Vec::new());
    }
    let answer = answer.to_lowercase();
    let words: Vec<&str> = answer.split(' ').collect();
    let matched: Vec<String> = keywords
        .iter()
        .filter(|keyword| {
            let keyword = keyword.to_lowercase();
            words.iter().any(|word| word.contains(&keyword))
        })
        .map(|keyword| keyword.to_string())
        .collect();
    let score = (matched.len() as f64 / keywords.len() as f64 * 100.0).min(100.0);
    (score, matched)
}
