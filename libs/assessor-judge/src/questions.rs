// Question source
// The persistence layer owns questions; the pipeline only reads them

use anyhow::{bail, Context, Result};
use assessor_common::types::Question;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const DEFAULT_QUESTIONS_PATH: &str = "config/questions.json";

/// Read access to question records
pub trait QuestionSource: Send + Sync {
    fn question(&self, id: &str) -> Option<Question>;
}

#[derive(Debug, Deserialize)]
struct QuestionsFile {
    questions: Vec<Question>,
}

/// In-memory question bank, loaded from questions.json
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: HashMap<String, Question>,
}

impl QuestionBank {
    pub fn from_questions(questions: Vec<Question>) -> Result<Self> {
        let mut bank = HashMap::new();
        for question in questions {
            if question.id.trim().is_empty() {
                bail!("Question with empty id in question bank");
            }
            if bank.contains_key(&question.id) {
                bail!("Duplicate question id '{}'", question.id);
            }
            bank.insert(question.id.clone(), question);
        }
        Ok(Self { questions: bank })
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: QuestionsFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Self::from_questions(file.questions)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.questions.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl QuestionSource for QuestionBank {
    fn question(&self, id: &str) -> Option<Question> {
        self.questions.get(id).cloned()
    }
}
