//! Pipeline behaviour against scripted model doubles

use async_trait::async_trait;
use ecogep_core::error::{GepError, Result, MSG_ADVISOR_OFFLINE};
use ecogep_core::models::{Role, ValuationReport};
use ecogep_core::prompt::NO_REPORT_MARKER;
use ecogep_core::SessionContext;
use ecogep_llm::{
    ChatModel, ChunkStream, EncodedImage, RetryPolicy, ValuationPipeline, VisionModel,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::json;
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

const REPORT_REPLY: &str = r#"```json
{
  "meta": {"ecosystem_name": "亚热带常绿阔叶林", "health_score": 88, "carbon": 12.5},
  "total_value": "1,234,567",
  "breakdown": {"水源涵养": 500000, "固碳释氧": "300000"},
  "simulation": {"scenario": "砍伐", "loss_value": 93815}
}
```"#;

/// Vision double replaying a scripted sequence of outcomes
struct ScriptedVision {
    replies: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<usize>,
}

impl ScriptedVision {
    fn new(replies: Vec<Result<String>>) -> Self {
        Self { replies: Mutex::new(replies.into()), calls: Mutex::new(0) }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl VisionModel for ScriptedVision {
    async fn analyze(&self, image: &EncodedImage, _instruction: &str) -> Result<String> {
        assert!(!image.base64.is_empty());
        *self.calls.lock().unwrap() += 1;
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GepError::Transport { reason: "script exhausted".into() }))
    }

    fn model_name(&self) -> &str {
        "scripted-vision"
    }
}

/// Chat double that streams fixed chunks and records the prompts it saw
struct ScriptedChat {
    chunks: Vec<Result<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedChat {
    fn streaming(chunks: Vec<Result<String>>) -> Self {
        Self { chunks, prompts: Mutex::new(Vec::new()) }
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn stream_reply(&self, prompt: &str) -> Result<ChunkStream> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let chunks: Vec<Result<String>> = self
            .chunks
            .iter()
            .map(|c| match c {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(GepError::Transport { reason: e.to_string() }),
            })
            .collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    fn model_name(&self) -> &str {
        "scripted-chat"
    }
}

fn photo() -> Vec<u8> {
    let img = RgbImage::from_fn(4, 4, |x, y| Rgb([x as u8 * 60, y as u8 * 60, 120]));
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    png
}

fn seeded_session() -> SessionContext {
    let mut session = SessionContext::new();
    session.commit_report(ValuationReport::from_value(json!({"total_value": 1})));
    session.history_mut().push_user("之前的问题");
    session.history_mut().push_assistant("之前的回答");
    session
}

fn quiet_chat() -> ScriptedChat {
    ScriptedChat::streaming(vec![Ok("好".to_string())])
}

#[tokio::test]
async fn test_generate_report_commits_parsed_report() {
    let pipeline = ValuationPipeline::new(
        ScriptedVision::new(vec![Ok(REPORT_REPLY.to_string())]),
        quiet_chat(),
    );
    let mut session = seeded_session();

    let report = pipeline.generate_report(&mut session, &photo()).await.unwrap();
    let headline = report.headline();
    assert_eq!(headline.ecosystem_name, "亚热带常绿阔叶林");
    assert_eq!(headline.health_score, 88);
    assert_eq!(headline.total_value, "¥1,234,567");

    assert!(session.report().is_some());
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn test_malformed_reply_leaves_no_report() {
    let pipeline = ValuationPipeline::new(
        ScriptedVision::new(vec![Ok("抱歉，我无法评估这张图片。".to_string())]),
        quiet_chat(),
    );
    let mut session = seeded_session();

    let err = pipeline.generate_report(&mut session, &photo()).await.unwrap_err();

    assert!(matches!(err, GepError::MalformedResponse { .. }));
    assert!(session.report().is_none());
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn test_transport_failure_still_clears_previous_session() {
    let pipeline = ValuationPipeline::new(
        ScriptedVision::new(vec![Err(GepError::Transport { reason: "connection refused".into() })]),
        quiet_chat(),
    );
    let mut session = seeded_session();

    let err = pipeline.generate_report(&mut session, &photo()).await.unwrap_err();

    assert!(matches!(err, GepError::Transport { .. }));
    assert!(session.report().is_none());
    assert!(session.history().is_empty());
    assert!(session.report_context().is_none());
}

#[tokio::test]
async fn test_invalid_image_leaves_session_untouched() {
    let vision = ScriptedVision::new(vec![Ok(REPORT_REPLY.to_string())]);
    let pipeline = ValuationPipeline::new(vision, quiet_chat());
    let mut session = seeded_session();

    let err = pipeline
        .generate_report(&mut session, b"definitely not a photo")
        .await
        .unwrap_err();

    assert!(matches!(err, GepError::InvalidImage { .. }));
    assert!(session.report().is_some());
    assert_eq!(session.history().len(), 2);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let vision = ScriptedVision::new(vec![
        Err(GepError::Api { status: 503, body: "busy".into() }),
        Ok(REPORT_REPLY.to_string()),
    ]);
    let pipeline = ValuationPipeline::new(vision, quiet_chat()).with_retry_policy(RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(1),
    });
    let mut session = SessionContext::new();

    pipeline.generate_report(&mut session, &photo()).await.unwrap();
    assert!(session.report().is_some());
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let vision = ScriptedVision::new(vec![
        Err(GepError::Api { status: 401, body: "bad key".into() }),
        Ok(REPORT_REPLY.to_string()),
    ]);
    let pipeline = ValuationPipeline::new(vision, quiet_chat())
        .with_retry_policy(RetryPolicy { max_retries: 3, base_delay: Duration::from_millis(1) });
    let mut session = SessionContext::new();

    let err = pipeline.generate_report(&mut session, &photo()).await.unwrap_err();
    assert!(matches!(err, GepError::Api { status: 401, .. }));
    assert_eq!(pipeline_vision_calls(&pipeline), 1);
    assert!(session.report().is_none());
}

fn pipeline_vision_calls(pipeline: &ValuationPipeline<ScriptedVision, ScriptedChat>) -> usize {
    pipeline.vision().calls()
}

#[tokio::test]
async fn test_ask_streams_progressively_and_records_turns() {
    let chat = ScriptedChat::streaming(vec![
        Ok("森林".to_string()),
        Ok(String::new()),
        Ok("价值".to_string()),
        Ok("很高".to_string()),
    ]);
    let pipeline = ValuationPipeline::new(ScriptedVision::new(vec![]), chat);
    let mut session = SessionContext::new();
    session.commit_report(ValuationReport::from_value(json!({"total_value": 42})));

    let mut partials = Vec::new();
    let reply = pipeline
        .ask(&mut session, "为什么这么高？", |partial| partials.push(partial.to_string()))
        .await
        .unwrap();

    assert_eq!(reply, "森林价值很高");
    assert_eq!(partials, vec!["森林", "森林价值", "森林价值很高"]);

    let turns = session.history().turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].content, "为什么这么高？");
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].content, "森林价值很高");

    let prompt = pipeline.chat().last_prompt();
    assert!(prompt.starts_with("用户提问：为什么这么高？"));
    assert!(prompt.contains(r#"{"total_value":42}"#));
}

#[tokio::test]
async fn test_ask_without_report_uses_marker() {
    let pipeline = ValuationPipeline::new(ScriptedVision::new(vec![]), quiet_chat());
    let mut session = SessionContext::new();

    pipeline.ask(&mut session, "这是什么？", |_| {}).await.unwrap();

    assert!(pipeline.chat().last_prompt().contains(NO_REPORT_MARKER));
}

#[tokio::test]
async fn test_interrupted_stream_discards_partial_reply() {
    let chat = ScriptedChat::streaming(vec![
        Ok("部分".to_string()),
        Err(GepError::Transport { reason: "connection reset".into() }),
        Ok("不应出现".to_string()),
    ]);
    let pipeline = ValuationPipeline::new(ScriptedVision::new(vec![]), chat);
    let mut session = SessionContext::new();

    let mut partials = Vec::new();
    let err = pipeline
        .ask(&mut session, "继续说", |partial| partials.push(partial.to_string()))
        .await
        .unwrap_err();

    match &err {
        GepError::StreamInterrupted { received_chars, .. } => assert_eq!(*received_chars, 2),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.user_message(), MSG_ADVISOR_OFFLINE);
    assert_eq!(partials, vec!["部分"]);
    assert_eq!(session.history().count(Role::User), 1);
    assert_eq!(session.history().count(Role::Assistant), 0);
}
