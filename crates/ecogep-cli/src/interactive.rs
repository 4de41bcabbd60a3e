use crate::commands::assess_image;
use crate::errors::{self, CliError};
use crate::output::OutputWriter;
use anyhow::Result;
use console::Term;
use dialoguer::{Input, Password};
use ecogep_core::{ApiKey, SessionContext};
use ecogep_llm::{ChatModel, ValuationPipeline, VisionModel};
use std::path::PathBuf;

/// Take the API key from `ZHIPUAI_API_KEY`, or ask for it on a terminal.
/// The key is held in memory for this process only.
pub fn resolve_api_key(allow_prompt: bool) -> Result<ApiKey> {
    if let Some(key) = ApiKey::from_env() {
        return Ok(key);
    }
    if !allow_prompt || !Term::stderr().is_term() {
        return Err(errors::credential_missing().into());
    }

    let entered: String = Password::new().with_prompt("智谱 API Key").interact()?;
    ApiKey::new(entered).ok_or_else(|| errors::credential_missing().into())
}

/// One line typed into the follow-up prompt
#[derive(Debug, PartialEq, Eq)]
pub enum ChatCommand {
    Empty,
    Exit,
    Clear,
    Assess(PathBuf),
    Ask(String),
    Invalid(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ChatCommand::Empty;
        }

        match line.split_once(char::is_whitespace) {
            _ if line == "/exit" || line == "/quit" => ChatCommand::Exit,
            _ if line == "/clear" => ChatCommand::Clear,
            Some(("/assess", path)) if !path.trim().is_empty() => {
                ChatCommand::Assess(PathBuf::from(path.trim()))
            }
            None if line == "/assess" => {
                ChatCommand::Invalid("用法: /assess <图片路径>".to_string())
            }
            _ if line.starts_with('/') => {
                ChatCommand::Invalid(format!("未知命令: {}", line))
            }
            _ => ChatCommand::Ask(line.to_string()),
        }
    }
}

/// Follow-up question loop over the current session
pub async fn chat_loop<V, C>(
    pipeline: &ValuationPipeline<V, C>,
    session: &mut SessionContext,
    output: &OutputWriter,
) -> Result<()>
where
    V: VisionModel,
    C: ChatModel,
{
    output.section("AI 生态顾问");
    output.info("直接输入问题；/clear 清空对话，/assess <图片> 重新评估，/exit 退出");

    loop {
        let line: String = Input::new().with_prompt("提问").allow_empty(true).interact_text()?;

        match ChatCommand::parse(&line) {
            ChatCommand::Empty => continue,
            ChatCommand::Exit => break,
            ChatCommand::Clear => {
                session.clear_conversation();
                output.success("对话已清空");
            }
            ChatCommand::Assess(path) => {
                if let Err(e) = assess_image(pipeline, session, &path, output).await {
                    match e.downcast_ref::<CliError>() {
                        Some(cli_error) => cli_error.display(),
                        None => output.error(format!("{:#}", e)),
                    }
                }
            }
            ChatCommand::Ask(question) => {
                let mut printed = 0;
                let result = pipeline
                    .ask(session, &question, |partial| {
                        output.stream_fragment(&partial[printed..]);
                        printed = partial.len();
                    })
                    .await;
                if printed > 0 {
                    println!();
                }
                if let Err(e) = result {
                    tracing::debug!(error = %e, "Follow-up failed");
                    output.error(e.user_message());
                }
            }
            ChatCommand::Invalid(message) => output.warning(message),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ChatCommand::parse("  "), ChatCommand::Empty);
        assert_eq!(ChatCommand::parse("/exit"), ChatCommand::Exit);
        assert_eq!(ChatCommand::parse("/clear"), ChatCommand::Clear);
        assert_eq!(
            ChatCommand::parse("/assess  photos/湿地.jpg "),
            ChatCommand::Assess(PathBuf::from("photos/湿地.jpg"))
        );
    }

    #[test]
    fn test_parse_questions_and_mistakes() {
        assert_eq!(
            ChatCommand::parse("为什么水文调节价值最高？"),
            ChatCommand::Ask("为什么水文调节价值最高？".to_string())
        );
        assert!(matches!(ChatCommand::parse("/assess"), ChatCommand::Invalid(_)));
        assert!(matches!(ChatCommand::parse("/help me"), ChatCommand::Invalid(_)));
    }
}
