//! Snapshot tests for the OpenAI client

#[cfg(test)]
mod snapshot_tests {
    use crate::{Embedder, GenerationConfig, OpenAIClient, OpenAIConfig};
    use insta::assert_yaml_snapshot;

    #[test]
    fn test_config_snapshot() {
        let config = OpenAIConfig::new("test_api_key_redacted".to_string());

        assert_yaml_snapshot!(config, {
            ".temperature" => "[temperature]",
        }, @r###"
        ---
        api_key: test_api_key_redacted
        api_base: "https://api.openai.com/v1"
        chat_model: gpt-4o
        embedding_model: text-embedding-3-small
        ocr_model: gpt-4o-mini
        temperature: "[temperature]"
        "###);
    }

    #[test]
    fn test_chat_request_body() {
        let client = OpenAIClient::new(OpenAIConfig::new("test_key".to_string())).unwrap();
        let config = GenerationConfig {
            model_id: OpenAIClient::GPT_4O.to_string(),
            max_tokens: 512,
            temperature: None,
            stop_sequences: vec!["Question:".to_string()],
            ..Default::default()
        };

        let body = client.chat_request_body("Summarize the paper", &config).unwrap();

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Summarize the paper");
        assert_eq!(body["stop"][0], "Question:");
        assert!(body.get("temperature").is_none());
        assert!(body.get("top_p").is_none());
    }

    #[test]
    fn test_embedding_dimensions() {
        let client = OpenAIClient::new(OpenAIConfig::new("test_key".to_string())).unwrap();
        assert_eq!(client.dimension(), 1536);
        assert_eq!(client.model_name(), "text-embedding-3-small");

        let mut config = OpenAIConfig::new("test_key".to_string());
        config.embedding_model = "text-embedding-3-large".to_string();
        assert_eq!(config.embedding_dimension(), 3072);
    }
}
