//! Pattern-based answer extraction from the top-ranked document.

use regex::Regex;

use crate::{Answerer, Document, PipelineError};

/// Reply when nothing was retrieved.
pub const NO_ANSWER: &str = "I don't know.";

const DATE_CUES: &[&str] = &["when", "date", "year", "month"];
const MAX_ANSWER_WORDS: usize = 30;

/// Date questions get the first date-like string in the top document;
/// everything else gets its first sentence.
#[derive(Debug, Clone)]
pub struct HeuristicAnswerer {
    month_year: Regex,
    iso_date: Regex,
    year: Regex,
}

impl HeuristicAnswerer {
    pub fn new() -> Result<Self, PipelineError> {
        Ok(Self {
            month_year: Regex::new(
                r"\b(January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{4}\b",
            )?,
            iso_date: Regex::new(r"\b\d{4}-\d{2}(?:-\d{2})?\b")?,
            year: Regex::new(r"\b\d{4}\b")?,
        })
    }

    /// First match of, in order of preference: `Month YYYY`, an ISO date
    /// (`YYYY-MM` or `YYYY-MM-DD`), a bare four-digit year.
    pub fn extract_date<'t>(&self, text: &'t str) -> Option<&'t str> {
        [&self.month_year, &self.iso_date, &self.year]
            .into_iter()
            .find_map(|re| re.find(text))
            .map(|m| m.as_str())
    }
}

/// Text up to the first `.` or newline, capped at 30 words.
fn first_sentence(text: &str) -> String {
    let end = text.find(['.', '\n']).unwrap_or(text.len());
    text[..end]
        .split_whitespace()
        .take(MAX_ANSWER_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

impl Answerer for HeuristicAnswerer {
    fn answer(&self, query: &str, documents: &[Document]) -> String {
        let Some(top) = documents.first() else {
            return NO_ANSWER.to_string();
        };
        let query = query.to_lowercase();
        // Substring match, so "update" also counts as a date cue.
        if DATE_CUES.iter().any(|cue| query.contains(cue)) {
            if let Some(date) = self.extract_date(&top.text) {
                return date.to_string();
            }
        }
        first_sentence(&top.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answerer() -> HeuristicAnswerer {
        HeuristicAnswerer::new().expect("static patterns compile")
    }

    fn doc(text: &str) -> Vec<Document> {
        vec![Document::new("d1", text)]
    }

    #[test]
    fn no_documents_means_no_answer() {
        assert_eq!(answerer().answer("Who?", &[]), NO_ANSWER);
    }

    #[test]
    fn date_questions_prefer_month_year() {
        let docs = doc("Released 2015-06-01, announced in November 2014 and shipped 2016.");
        assert_eq!(answerer().answer("When was it announced?", &docs), "November 2014");
    }

    #[test]
    fn date_questions_fall_back_through_patterns() {
        assert_eq!(
            answerer().answer("What date?", &doc("Shipped on 2016-03-09 worldwide.")),
            "2016-03-09"
        );
        assert_eq!(
            answerer().answer("Which year?", &doc("It happened in 1969 on the moon.")),
            "1969"
        );
    }

    #[test]
    fn date_question_without_date_uses_first_sentence() {
        assert_eq!(
            answerer().answer("When is lunch?", &doc("Nobody knows. Really.")),
            "Nobody knows"
        );
    }

    #[test]
    fn first_sentence_is_truncated() {
        let long = (0..50).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let answer = answerer().answer("Describe it", &doc(&long));
        assert_eq!(answer.split_whitespace().count(), 30);
        assert!(answer.starts_with("w0 w1"));
    }

    #[test]
    fn only_the_top_document_is_used() {
        let docs = vec![
            Document::new("a", "Paris is the capital of France.\nMore text."),
            Document::new("b", "Berlin is the capital of Germany."),
        ];
        assert_eq!(
            answerer().answer("capital of France", &docs),
            "Paris is the capital of France"
        );
    }
}
