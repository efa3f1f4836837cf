use anyhow::{Result, bail};
use async_trait::async_trait;
use quill::agent::{Agent, UserInput};
use quill::conversation::{ContentBlock, Conversation, Message, Role};
use quill::gateway::InferenceGateway;
use quill::tools::{ToolContext, ToolDeclaration};
use quill::{Config, ToolRegistry};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

/// Replays canned responses and records every conversation it was sent.
#[derive(Clone, Default)]
struct ScriptedGateway {
    responses: Arc<Mutex<VecDeque<Result<Message>>>>,
    seen: Arc<Mutex<Vec<Conversation>>>,
}

impl ScriptedGateway {
    fn new(responses: Vec<Result<Message>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            seen: Arc::default(),
        }
    }

    fn calls(&self) -> Vec<Conversation> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceGateway for ScriptedGateway {
    async fn infer(&self, conversation: &Conversation, tools: &[ToolDeclaration]) -> Result<Message> {
        assert_eq!(tools.len(), 3);
        self.seen.lock().unwrap().push(conversation.clone());
        match self.responses.lock().unwrap().pop_front() {
            Some(response) => response,
            None => bail!("no scripted response left"),
        }
    }
}

struct SlowGateway;

#[async_trait]
impl InferenceGateway for SlowGateway {
    async fn infer(&self, _: &Conversation, _: &[ToolDeclaration]) -> Result<Message> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Message::model(Vec::new()))
    }
}

struct ScriptedInput(VecDeque<String>);

impl ScriptedInput {
    fn new(lines: &[&str]) -> Self {
        Self(lines.iter().map(|line| line.to_string()).collect())
    }
}

#[async_trait]
impl UserInput for ScriptedInput {
    async fn next_line(&mut self) -> Option<String> {
        self.0.pop_front()
    }
}

fn text(text: &str) -> Message {
    Message::model(vec![ContentBlock::Text {
        text: text.to_string(),
    }])
}

fn tool_use(id: &str, name: &str, input: Value) -> ContentBlock {
    ContentBlock::ToolUse {
        id: id.to_string(),
        name: name.to_string(),
        input: input.to_string(),
    }
}

fn agent(gateway: impl InferenceGateway + 'static, root: &std::path::Path) -> Agent {
    let registry = ToolRegistry::with_default_tools().unwrap();
    Agent::new(
        Box::new(gateway),
        registry,
        ToolContext::new(root),
        &Config::default(),
    )
}

fn results_of(message: &Message) -> Vec<(String, bool)> {
    message
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolResult {
                tool_use_id,
                is_error,
                ..
            } => Some((tool_use_id.clone(), *is_error)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_text_response_returns_to_input() -> Result<()> {
    let dir = tempdir()?;
    let gateway = ScriptedGateway::new(vec![Ok(text("hello")), Ok(text("again"))]);
    let mut agent = agent(gateway.clone(), dir.path());

    agent.run(&mut ScriptedInput::new(&["hi", "", "   ", "more"])).await?;

    // Blank lines never reach the model.
    assert_eq!(gateway.calls().len(), 2);
    let conversation = agent.conversation();
    assert_eq!(conversation.len(), 4);
    assert_eq!(conversation.messages()[0], Message::user_text("hi"));
    assert_eq!(conversation.messages()[2], Message::user_text("more"));
    Ok(())
}

#[tokio::test]
async fn test_tool_results_are_sent_back_in_order_without_new_input() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("a.txt"), "alpha")?;
    fs::write(dir.path().join("b.txt"), "beta")?;

    let gateway = ScriptedGateway::new(vec![
        Ok(Message::model(vec![
            ContentBlock::Text {
                text: "Reading both.".to_string(),
            },
            tool_use("call_1", "read_file", json!({ "path": "a.txt" })),
            tool_use("call_2", "list_files", json!({})),
            tool_use("call_3", "read_file", json!({ "path": "b.txt" })),
        ])),
        Ok(text("Done.")),
    ]);
    let mut agent = agent(gateway.clone(), dir.path());

    agent.run(&mut ScriptedInput::new(&["look around"])).await?;

    let calls = gateway.calls();
    assert_eq!(calls.len(), 2);

    let second = calls[1].messages();
    assert_eq!(second.len(), 3);
    let results = second.last().unwrap();
    assert_eq!(results.role, Role::User);
    assert_eq!(
        results_of(results),
        vec![
            ("call_1".to_string(), false),
            ("call_2".to_string(), false),
            ("call_3".to_string(), false),
        ]
    );
    match &results.content[0] {
        ContentBlock::ToolResult { content, .. } => assert_eq!(content, "alpha"),
        other => panic!("unexpected block {other:?}"),
    }
    match &results.content[1] {
        ContentBlock::ToolResult { content, .. } => {
            let entries: Vec<String> = serde_json::from_str(content)?;
            assert_eq!(entries, vec!["a.txt", "b.txt"]);
        }
        other => panic!("unexpected block {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_failing_tools_do_not_abort_the_run() -> Result<()> {
    let dir = tempdir()?;
    let gateway = ScriptedGateway::new(vec![
        Ok(Message::model(vec![
            tool_use("call_1", "delete_everything", json!({})),
            tool_use("call_2", "read_file", json!({ "path": "../secret" })),
            ContentBlock::ToolUse {
                id: "call_3".to_string(),
                name: "read_file".to_string(),
                input: "{not json".to_string(),
            },
            tool_use("call_4", "read_file", json!({ "path": "missing.txt" })),
        ])),
        Ok(text("Sorry.")),
    ]);
    let mut agent = agent(gateway.clone(), dir.path());

    agent.run(&mut ScriptedInput::new(&["try things"])).await?;

    let calls = gateway.calls();
    assert_eq!(calls.len(), 2);
    let results = calls[1].last().unwrap();
    assert_eq!(
        results_of(results),
        vec![
            ("call_1".to_string(), true),
            ("call_2".to_string(), true),
            ("call_3".to_string(), true),
            ("call_4".to_string(), true),
        ]
    );
    match &results.content[0] {
        ContentBlock::ToolResult { content, .. } => {
            assert_eq!(content, "tool not found: delete_everything")
        }
        other => panic!("unexpected block {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_gateway_error_is_fatal() -> Result<()> {
    let dir = tempdir()?;
    let gateway = ScriptedGateway::new(vec![Err(anyhow::anyhow!("401 unauthorized"))]);
    let mut agent = agent(gateway.clone(), dir.path());

    let err = agent
        .run(&mut ScriptedInput::new(&["hi", "never read"]))
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("401 unauthorized"));
    assert_eq!(gateway.calls().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_end_of_input_exits_cleanly() -> Result<()> {
    let dir = tempdir()?;
    let gateway = ScriptedGateway::new(Vec::new());
    let mut agent = agent(gateway.clone(), dir.path());

    agent.run(&mut ScriptedInput::new(&[])).await?;

    assert!(gateway.calls().is_empty());
    assert!(agent.conversation().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_empty_model_response_waits_for_input() -> Result<()> {
    let dir = tempdir()?;
    let gateway = ScriptedGateway::new(vec![Ok(Message::model(Vec::new())), Ok(text("ok"))]);
    let mut agent = agent(gateway.clone(), dir.path());

    agent.run(&mut ScriptedInput::new(&["one", "two"])).await?;

    assert_eq!(gateway.calls().len(), 2);
    assert_eq!(agent.conversation().len(), 4);
    Ok(())
}

#[tokio::test]
async fn test_inference_deadline_is_fatal() -> Result<()> {
    let dir = tempdir()?;
    let config = Config {
        timeout_seconds: 1,
        ..Config::default()
    };
    let mut agent = Agent::new(
        Box::new(SlowGateway),
        ToolRegistry::with_default_tools()?,
        ToolContext::new(dir.path()),
        &config,
    );

    let err = agent.run(&mut ScriptedInput::new(&["hi"])).await.unwrap_err();

    assert!(err.to_string().contains("timed out"));
    Ok(())
}

#[tokio::test]
async fn test_edit_through_the_loop_changes_the_file() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("notes.txt"), "colour and flavour\n")?;

    let gateway = ScriptedGateway::new(vec![
        Ok(Message::model(vec![tool_use(
            "call_1",
            "edit_file",
            json!({
                "path": "notes.txt",
                "mode": "replace_once",
                "old_str": "colour",
                "new_str": "color",
            }),
        )])),
        Ok(Message::model(vec![tool_use(
            "call_2",
            "edit_file",
            json!({
                "path": "notes.txt",
                "mode": "replace_once",
                "old_str": "colour",
                "new_str": "color",
            }),
        )])),
        Ok(text("Fixed the spelling.")),
    ]);
    let mut agent = agent(gateway.clone(), dir.path());

    agent.run(&mut ScriptedInput::new(&["use US spelling"])).await?;

    assert_eq!(
        fs::read_to_string(dir.path().join("notes.txt"))?,
        "color and flavour\n"
    );

    let calls = gateway.calls();
    assert_eq!(calls.len(), 3);
    let outcome = |conversation: &Conversation| -> Value {
        match &conversation.last().unwrap().content[0] {
            ContentBlock::ToolResult { content, .. } => serde_json::from_str(content).unwrap(),
            other => panic!("unexpected block {other:?}"),
        }
    };
    let first = outcome(&calls[1]);
    assert_eq!(first["changed"], json!(true));
    assert_eq!(first["message"], json!("replaced"));

    // The repeated edit no longer matches and leaves the file alone.
    let second = outcome(&calls[2]);
    assert_eq!(second["changed"], json!(false));
    assert_eq!(second["message"], json!("match_count_mismatch: have=0 expect=1"));
    Ok(())
}
