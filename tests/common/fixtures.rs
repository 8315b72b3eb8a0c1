use chainstream::error::ChainError;
use chainstream::runnables::Lambda;
use serde_json::Value;

/// Lambda that reverses a string input and emits it as one chunk.
pub fn reverse(name: &str) -> Lambda {
    Lambda::new(name, |input: Value| {
        let text = input
            .as_str()
            .ok_or_else(|| ChainError::execution("reverse expects a string input"))?;
        Ok(Value::String(text.chars().rev().collect()))
    })
}

/// Lambda that streams a string input back as one chunk.
pub fn identity(name: &str) -> Lambda {
    Lambda::new(name, |input: Value| Ok(input))
}

/// Lambda that always fails.
pub fn failing(name: &str) -> Lambda {
    let name_owned = name.to_string();
    Lambda::new(name, move |_input: Value| {
        Err(ChainError::execution(format!("{name_owned} blew up")))
    })
}
