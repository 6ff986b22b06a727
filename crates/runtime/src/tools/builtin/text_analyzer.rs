use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::tools::{TEXT_ANALYZER, Tool, ToolArgs, ToolError, ToolSchema};

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "amazing",
    "wonderful",
    "fantastic",
    "love",
    "like",
    "happy",
    "joy",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "terrible",
    "awful",
    "horrible",
    "hate",
    "dislike",
    "sad",
    "angry",
    "disappointed",
];

/// Text statistics, plus sentiment when requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStats {
    pub word_count: usize,
    pub character_count: usize,
    pub character_count_no_spaces: usize,
    pub sentence_count: usize,
    pub analysis_type: String,
    #[serde(flatten)]
    pub sentiment: Option<Sentiment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentiment {
    pub sentiment: &'static str,
    pub positive_words_found: usize,
    pub negative_words_found: usize,
}

impl TextStats {
    pub fn analyze(text: &str, analysis_type: &str) -> Self {
        Self {
            word_count: text.split_whitespace().count(),
            character_count: text.chars().count(),
            character_count_no_spaces: text.chars().filter(|c| *c != ' ').count(),
            sentence_count: text.split('.').filter(|s| !s.trim().is_empty()).count(),
            analysis_type: analysis_type.to_string(),
            sentiment: (analysis_type == "sentiment").then(|| Sentiment::score(text)),
        }
    }
}

impl Sentiment {
    pub fn score(text: &str) -> Self {
        let lowered = text.to_lowercase();
        let count = |words: &[&str]| words.iter().filter(|w| lowered.contains(*w)).count();
        let positive = count(POSITIVE_WORDS);
        let negative = count(NEGATIVE_WORDS);

        let sentiment = match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => "positive",
            std::cmp::Ordering::Less => "negative",
            std::cmp::Ordering::Equal => "neutral",
        };

        Self {
            sentiment,
            positive_words_found: positive,
            negative_words_found: negative,
        }
    }
}

/// The `text_analyzer` tool.
#[derive(Debug, Default)]
pub struct TextAnalyzer;

#[async_trait]
impl Tool for TextAnalyzer {
    fn schema(&self) -> &ToolSchema {
        &TEXT_ANALYZER
    }

    async fn execute(&self, args: &ToolArgs, _question: &str) -> Result<Value, ToolError> {
        let text = args.str("text")?;
        let analysis_type = args.str("analysis_type").unwrap_or("basic");
        serde_json::to_value(TextStats::analyze(text, analysis_type))
            .map_err(|e| ToolError::Execution(format!("serialize result: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn basic_counts() {
        let stats = TextStats::analyze("The quick brown fox jumps over the lazy dog.", "basic");
        assert_eq!(stats.word_count, 9);
        assert_eq!(stats.character_count, 44);
        assert_eq!(stats.character_count_no_spaces, 36);
        assert_eq!(stats.sentence_count, 1);
        assert!(stats.sentiment.is_none());
    }

    #[test]
    fn sentences_are_non_blank_period_segments() {
        let stats = TextStats::analyze("One. Two.  . Three", "basic");
        assert_eq!(stats.sentence_count, 3);
        assert_eq!(TextStats::analyze("", "basic").sentence_count, 0);
    }

    #[test]
    fn characters_count_scalars_not_bytes() {
        let stats = TextStats::analyze("héllo wörld", "basic");
        assert_eq!(stats.character_count, 11);
        assert_eq!(stats.character_count_no_spaces, 10);
    }

    #[test]
    fn sentiment_labels() {
        let positive = Sentiment::score("I love this amazing day!");
        assert_eq!(positive.sentiment, "positive");
        assert!(positive.positive_words_found > 0);

        let negative = Sentiment::score("What a terrible, awful mess");
        assert_eq!(negative.sentiment, "negative");
        assert_eq!(negative.negative_words_found, 2);

        let tie = Sentiment::score("good and bad");
        assert_eq!(tie.sentiment, "neutral");
        assert_eq!(Sentiment::score("a chair").sentiment, "neutral");
    }

    #[tokio::test]
    async fn tool_output_shape() {
        let args = ToolArgs::new()
            .with("text", "I love this amazing day!")
            .with("analysis_type", "sentiment");
        let value = TextAnalyzer.execute(&args, "").await.unwrap();
        assert_eq!(
            value,
            json!({
                "word_count": 5,
                "character_count": 24,
                "character_count_no_spaces": 20,
                "sentence_count": 1,
                "analysis_type": "sentiment",
                "sentiment": "positive",
                "positive_words_found": 2,
                "negative_words_found": 0
            })
        );
    }

    #[tokio::test]
    async fn unknown_analysis_type_is_basic() {
        let args = ToolArgs::new()
            .with("text", "hello")
            .with("analysis_type", "deep");
        let value = TextAnalyzer.execute(&args, "").await.unwrap();
        assert_eq!(value["analysis_type"], "deep");
        assert!(value.get("sentiment").is_none());
    }
}
