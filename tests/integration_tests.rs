//! Integration tests against the live generation API.
//! These tests require GEMINI_API_KEY in the environment to run.

#[cfg(test)]
mod tests {
    use chatrelay::{ChatMessage, Content, GeminiClient, Generator, extract_text};
    use serde_json::json;

    fn live_client() -> Option<GeminiClient> {
        let Ok(api_key) = std::env::var("GEMINI_API_KEY") else {
            eprintln!("Skipping test: GEMINI_API_KEY not set");
            return None;
        };
        Some(
            GeminiClient::new(&api_key, chatrelay::config::DEFAULT_MODEL)
                .expect("Failed to create client"),
        )
    }

    #[tokio::test]
    async fn test_simple_generation() {
        let Some(client) = live_client() else {
            return;
        };

        let contents = vec![Content::from(&ChatMessage::user("Say 'test passed'"))];
        let reply = client.generate(contents).await;
        assert!(reply.is_ok(), "Request should succeed with valid API key");
        assert!(!extract_text(&reply.unwrap()).trim().is_empty());
    }

    #[tokio::test]
    async fn test_relay_with_history() {
        let Some(client) = live_client() else {
            return;
        };

        let body = json!({"messages": [
            {"role": "user", "content": "Remember the word 'walnut'."},
            {"role": "model", "content": "Okay."},
            {"role": "user", "content": "Which word did I ask you to remember?"}
        ]});
        let text = chatrelay::relay(&client, &body)
            .await
            .expect("relay should succeed with valid API key");
        assert!(!text.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_api_key() {
        if std::env::var("GEMINI_API_KEY").is_err() {
            eprintln!("Skipping test: GEMINI_API_KEY not set");
            return;
        }

        let client = GeminiClient::new("invalid-key", chatrelay::config::DEFAULT_MODEL)
            .expect("Failed to create client");
        let contents = vec![Content::from(&ChatMessage::user("Hello"))];
        let result = client.generate(contents).await;
        assert!(result.is_err(), "Request should fail with invalid API key");
    }
}
