//! EPICS Channel Access through the `caget`/`caput` command-line tools.
//!
//! Each get or put spawns one tool invocation in terse mode (`-t`) with an
//! explicit wait time (`-w`). Replies are parsed as:
//!
//! - a single numeric token: [`PvValue::Number`]
//! - `<count> v1 v2 ...` with `count` matching the number of values: [`PvValue::Array`]
//! - anything else: [`PvValue::Text`]

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use autocal_core::{ControlVariableStore, PvValue};
use std::time::Duration;
use tokio::process::Command;

/// Channel Access client backed by the EPICS base command-line tools.
#[derive(Debug, Clone)]
pub struct ChannelAccessCli {
    caget: String,
    caput: String,
    wait: Duration,
}

impl ChannelAccessCli {
    /// Use `caget`/`caput` from `PATH` with the given Channel Access wait time.
    pub fn new(wait: Duration) -> Self {
        Self {
            caget: "caget".to_string(),
            caput: "caput".to_string(),
            wait,
        }
    }

    /// Use explicit tool paths.
    pub fn with_tools(mut self, caget: impl Into<String>, caput: impl Into<String>) -> Self {
        self.caget = caget.into();
        self.caput = caput.into();
        self
    }

    fn wait_arg(&self) -> String {
        format!("{}", self.wait.as_secs_f64())
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        tracing::debug!("{} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to spawn {}", program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{} {} exited with {}: {}",
                program,
                args.join(" "),
                output.status,
                stderr.trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Parse terse `caget` output into a value.
pub fn parse_caget_reply(reply: &str) -> PvValue {
    let tokens: Vec<&str> = reply.split_whitespace().collect();
    match tokens.as_slice() {
        [single] => single
            .parse::<f64>()
            .map(PvValue::Number)
            .unwrap_or_else(|_| PvValue::Text(reply.trim().to_string())),
        [count, values @ ..] => {
            let parsed: Option<Vec<f64>> = values.iter().map(|v| v.parse().ok()).collect();
            match (count.parse::<usize>(), parsed) {
                (Ok(n), Some(samples)) if n == samples.len() => PvValue::Array(samples),
                _ => PvValue::Text(reply.trim().to_string()),
            }
        }
        [] => PvValue::Text(String::new()),
    }
}

#[async_trait]
impl ControlVariableStore for ChannelAccessCli {
    async fn get(&self, name: &str) -> Result<PvValue> {
        let wait = self.wait_arg();
        let reply = self.run(&self.caget, &["-t", "-w", &wait, name]).await?;
        Ok(parse_caget_reply(&reply))
    }

    async fn put(&self, name: &str, value: PvValue) -> Result<()> {
        let wait = self.wait_arg();
        let rendered = value.to_string();
        match value {
            PvValue::Array(samples) => {
                let count = samples.len().to_string();
                let mut args = vec!["-t", "-w", wait.as_str(), "-a", name, count.as_str()];
                let items: Vec<String> = samples.iter().map(|v| v.to_string()).collect();
                args.extend(items.iter().map(String::as_str));
                self.run(&self.caput, &args).await?;
            }
            _ => {
                self.run(&self.caput, &["-t", "-w", &wait, name, &rendered])
                    .await?;
            }
        }
        Ok(())
    }
}
