//! Fixed instruction text, response shape, and request rendering.

use crate::batch::Batch;
use crate::domain::RatingLevel;
use serde_json::{Value, json};

/// Rating rubric sent as the system instruction with every request.
pub const SYSTEM_INSTRUCTION: &str = r#"As an expert evaluator for freestyle rap lexicon, rate each word 0, 0.25, 0.75, or 1 for its **Rap Suitability** to a general audience. **Only consider English words.**
0: **HARSHLY EXCLUDE**:
    * Very common/basic words ("the," "a," "is," "it," "and," "but").
    * Nonsense or gibberish.
    * Non-English words.
    * **HARSHLY EXCLUDE**: Extremely specialized, obscure, or advanced medical, scientific, or chemical terms that a general audience would *not* know or understand easily in a rap context.
    * **PUNISH SIMILAR FORMS**: If a word is merely a common inflectional variant (e.g., plural, different verb tense, simple adverb/adjective derived from a noun) of a word that is otherwise suitable, assign it a 0. **Prioritize the most common or base form of the word.** For example, if 'run' gets a 1, then 'running,' 'ran,' and 'runs' should all receive a 0.
0.25: Understandable but less common or more specific to certain contexts; might be slightly awkward to fit into a freestyle.
0.75: Broadly understood and adds significant meaning to a rap lyric; good potential but perhaps not universally frequent or doesn't offer exceptionally versatile rhyming options.
1: Broadly understood, frequently usable in rap, adds significant meaning, possesses strong evocative qualities, and is widely applicable and versatile for rhyming."#;

pub const WORD_DELIMITER: &str = ", ";

/// Renders the batch as the single user turn of the request.
pub fn render_request(batch: &Batch) -> String {
    batch
        .words()
        .iter()
        .map(|word| word.as_str())
        .collect::<Vec<_>>()
        .join(WORD_DELIMITER)
}

/// Response shape handed to the service (OpenAPI subset used by
/// `generationConfig.responseSchema`): an array of `{word, rating}` objects
/// where `rating` is one of the five canonical level strings.
pub fn response_schema() -> Value {
    let levels: Vec<&str> = RatingLevel::ALL.iter().map(|level| level.as_str()).collect();
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "word": { "type": "STRING" },
                "rating": {
                    "type": "STRING",
                    "enum": levels
                }
            },
            "required": ["word", "rating"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Word;

    #[test]
    fn render_request_joins_with_comma_space() {
        let batch = Batch::new(
            0,
            ["the", "magnificent", "running"]
                .into_iter()
                .map(|w| Word::new(w).unwrap())
                .collect(),
        );
        assert_eq!(render_request(&batch), "the, magnificent, running");
    }

    #[test]
    fn response_schema_constrains_rating_to_scale() {
        let schema = response_schema();
        assert_eq!(schema["type"], "ARRAY");
        assert_eq!(
            schema["items"]["properties"]["rating"]["enum"],
            json!(["0", "0.25", "0.5", "0.75", "1"])
        );
    }

    #[test]
    fn rubric_names_the_excluded_categories() {
        assert!(SYSTEM_INSTRUCTION.starts_with("As an expert evaluator for freestyle rap lexicon"));
        assert!(SYSTEM_INSTRUCTION.contains("Non-English words."));
        assert!(SYSTEM_INSTRUCTION.contains("PUNISH SIMILAR FORMS"));
    }
}
