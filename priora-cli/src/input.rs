use anyhow::{Context, Result};
use priora_core::{validate_batch, Payload, Strategy, Task, Weights};
use std::io::Read;
use std::path::Path;

/// A validated batch plus whatever options the payload envelope carried.
pub struct Batch {
    pub tasks: Vec<Task>,
    pub weights: Option<Weights>,
    pub strategy: Option<Strategy>,
}

/// Read JSON from `path`, or stdin when `path` is `None` or `-`.
pub fn read_source(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => {
            std::fs::read_to_string(p).with_context(|| format!("read {}", p.display()))
        }
        _ => {
            let mut s = String::new();
            std::io::stdin()
                .read_to_string(&mut s)
                .context("read tasks from stdin")?;
            Ok(s)
        }
    }
}

pub fn load_batch(path: Option<&Path>, max_batch_size: usize) -> Result<Batch> {
    let raw = read_source(path)?;
    let payload = Payload::from_json(&raw).context("parse task payload")?;
    let (inputs, weights, strategy) = payload.into_parts();
    let tasks = validate_batch(inputs, max_batch_size)?;
    tracing::debug!(tasks = tasks.len(), "loaded batch");
    Ok(Batch {
        tasks,
        weights,
        strategy,
    })
}
