use ollama_chat::ChatMessage;

use crate::domain::ClassificationRequest;

const INSTRUCTIONS: &str = "Determine if a given news article portrays the given person of interest \
in a positive or negative light. If person is not mentioned in the article, classify the sentiment \
as \"unrelated\".";

const OUTPUT_FORMAT: &str = r#"Think through the article step by step before deciding.
Respond with a single JSON object and nothing else, using exactly these keys:
{
  "reasoning": "<why the article portrays the person this way>",
  "sentiment": "unrelated" | "positive" | "negative",
  "confidence": <number between 0 and 1>
}"#;

/// Build the chat turn for one classification
pub fn build_messages(request: &ClassificationRequest) -> Vec<ChatMessage> {
    let system = format!("{}\n\n{}", INSTRUCTIONS, OUTPUT_FORMAT);

    let user = format!(
        "News article:\n{}\n\nPerson of interest: {}",
        if request.article.trim().is_empty() {
            "(no article text was found)"
        } else {
            request.article.as_str()
        },
        request.subject
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}
