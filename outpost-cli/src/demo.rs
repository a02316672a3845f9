use async_trait::async_trait;
use outpost::{Application, ExecutionResult, Tool, callable, entrypoint_fn};
use serde_json::{Value, json};

/// The application served by `outpost serve`.
pub fn demo_application(name: &str) -> Application {
    Application::builder(entrypoint_fn(|input: Option<String>| async move {
        match input {
            Some(text) => ExecutionResult::success(format!("Echo: {text}")),
            None => ExecutionResult::success("No input"),
        }
    }))
    .name(name)
    .description("Echoes its input and offers a few text tools")
    .tool(UppercaseTool)
    .tool(ReverseTool)
    .callable(callable(word_count))
    .build()
}

/// Accept either a JSON string or `{"text": "..."}`.
fn text_input(input: &Value) -> Option<&str> {
    input
        .as_str()
        .or_else(|| input.get("text").and_then(Value::as_str))
}

fn text_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "text": { "type": "string" } },
        "required": ["text"]
    })
}

struct UppercaseTool;

#[async_trait]
impl Tool for UppercaseTool {
    fn name(&self) -> &str {
        "uppercase"
    }

    fn description(&self) -> &str {
        "Convert text to upper case"
    }

    fn input_schema(&self) -> Option<Value> {
        Some(text_schema())
    }

    async fn call(&self, input: Value) -> ExecutionResult {
        match text_input(&input) {
            Some(text) => ExecutionResult::success(text.to_uppercase()),
            None => ExecutionResult::invalid_input("expected a string or {\"text\": ...}"),
        }
    }
}

struct ReverseTool;

#[async_trait]
impl Tool for ReverseTool {
    fn name(&self) -> &str {
        "reverse"
    }

    fn description(&self) -> &str {
        "Reverse the characters of text"
    }

    fn input_schema(&self) -> Option<Value> {
        Some(text_schema())
    }

    async fn call(&self, input: Value) -> ExecutionResult {
        match text_input(&input) {
            Some(text) => ExecutionResult::success(text.chars().rev().collect::<String>()),
            None => ExecutionResult::invalid_input("expected a string or {\"text\": ...}"),
        }
    }
}

async fn word_count(input: Value) -> ExecutionResult {
    match text_input(&input) {
        Some(text) => ExecutionResult::success(json!({ "words": text.split_whitespace().count() })),
        None => ExecutionResult::invalid_input("expected a string or {\"text\": ...}"),
    }
}
