//! History validation and settings freezing, checked through the connectors

use kernel_connectors::prelude::*;
use kernel_connectors::providers::anthropic::AnthropicBuilder;
use kernel_connectors::providers::dashscope::DashScopeBuilder;
use kernel_connectors::providers::openai_compatible::OpenAiCompatibleBuilder;

#[test]
fn only_system_messages_are_rejected() {
    let err = validate_history(&[ChatMessage::system("s")], SystemMessagePolicy::Inline)
        .unwrap_err();
    assert!(matches!(err, LlmError::InvalidInput(_)));
}

#[test]
fn two_system_messages_are_rejected() {
    let history = [
        ChatMessage::system("a"),
        ChatMessage::system("b"),
        ChatMessage::user("hi"),
    ];
    for policy in [
        SystemMessagePolicy::Separate,
        SystemMessagePolicy::Inline,
        SystemMessagePolicy::AsUser,
    ] {
        assert!(validate_history(&history, policy).is_err(), "{policy:?}");
    }
}

#[test]
fn separate_policy_moves_system_out_of_messages() {
    let prepared = validate_history(
        &[ChatMessage::user("hi"), ChatMessage::system("be brief")],
        SystemMessagePolicy::Separate,
    )
    .unwrap();
    assert_eq!(prepared.system.as_deref(), Some("be brief"));
    assert_eq!(prepared.messages, vec![ChatMessage::user("hi")]);
}

#[test]
fn to_builder_is_an_independent_copy() {
    let frozen = ExecutionSettings::builder()
        .temperature(0.2)
        .max_tokens(64)
        .build()
        .unwrap();
    let changed = frozen.to_builder().temperature(0.9).build().unwrap();

    assert_eq!(frozen.temperature(), Some(0.2));
    assert_eq!(changed.temperature(), Some(0.9));
    assert_eq!(changed.max_tokens(), Some(64));
}

#[test]
fn out_of_range_settings_fail_at_build() {
    assert!(matches!(
        ExecutionSettings::builder().temperature(3.5).build(),
        Err(LlmError::InvalidParameter(_))
    ));
}

/// Invalid history must fail before any request leaves the process.
#[tokio::test]
async fn connectors_reject_invalid_history_without_network() {
    let mut server = mockito::Server::new_async().await;
    let any = server
        .mock("POST", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let bad = ChatRequest::new(vec![ChatMessage::system("only")]);
    let clients: Vec<Box<dyn ChatCapability>> = vec![
        Box::new(
            OpenAiCompatibleBuilder::openai()
                .api_key("sk")
                .base_url(server.url())
                .build()
                .unwrap(),
        ),
        Box::new(
            AnthropicBuilder::new()
                .api_key("ak")
                .base_url(server.url())
                .build()
                .unwrap(),
        ),
        Box::new(
            DashScopeBuilder::new()
                .api_key("dk")
                .base_url(server.url())
                .build()
                .unwrap(),
        ),
    ];
    for client in &clients {
        assert!(matches!(
            client.chat(bad.clone()).await,
            Err(LlmError::InvalidInput(_))
        ));
        assert!(client.chat_stream(bad.clone()).await.is_err());
    }
    any.assert_async().await;
}
