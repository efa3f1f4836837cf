use crate::agent::UserInput;
use async_trait::async_trait;
use console::style;
use std::io::{self, Write};
use tokio::sync::mpsc;

pub fn print_banner() {
    println!("Chat with the model (use 'ctrl-d' to quit)");
}

pub fn print_user_prompt() -> io::Result<()> {
    print!("{} ", style("You:").blue().bold());
    io::stdout().flush()
}

pub fn print_model_text(text: &str) {
    println!("{} {}", style("Model:").yellow().bold(), text);
}

pub fn print_tool_invocation(name: &str, input: &str) {
    println!("{}", style(format!("tool: {name}({input})")).green());
}

pub fn print_fatal(error: &anyhow::Error) {
    eprintln!("{}", style(format!("Error: {error:#}")).red());
}

/// Reads operator lines from stdin on a blocking task.
pub struct StdinInput {
    receiver: mpsc::Receiver<Option<String>>,
}

impl StdinInput {
    pub fn new() -> Self {
        Self {
            receiver: spawn_stdin_channel(),
        }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserInput for StdinInput {
    async fn next_line(&mut self) -> Option<String> {
        print_user_prompt().ok()?;
        // A closed channel means the reader task is gone, same as EOF.
        self.receiver.recv().await.flatten()
    }
}

fn spawn_stdin_channel() -> mpsc::Receiver<Option<String>> {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        loop {
            let result = tokio::task::spawn_blocking(|| {
                let mut buffer = String::new();
                match io::stdin().read_line(&mut buffer) {
                    Ok(0) => Ok(None), // EOF (Ctrl+D)
                    Ok(_) => Ok(Some(trim_line_ending(buffer))),
                    Err(e) => Err(e),
                }
            })
            .await;

            match result {
                Ok(Ok(Some(line))) => {
                    if tx.send(Some(line)).await.is_err() {
                        break;
                    }
                }
                _ => {
                    tx.send(None).await.ok();
                    break;
                }
            }
        }
    });
    rx
}

fn trim_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}
