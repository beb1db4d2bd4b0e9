// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use crate::api::{Event, Pipeline, PipelineDescriptor, PipelineStatus};
use crate::waiter::ProgressSink;
use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a warning (suppressed in json mode).
    pub fn warning(&self, message: &str) {
        if self.mode != OutputMode::Json {
            eprintln!("Warning: {message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({elapsed:.1}s)");
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                println!("{message}");
            }
            OutputMode::Json => {
                self.json_line("success", message, None);
            }
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                    status: None,
                    duration_secs: self.start_time.map(|_| self.elapsed_secs()),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Announce a freshly created pipeline with the fields presenters rely
    /// on: id, start time, status, initiator, environment, application.
    pub fn pipeline_created(&self, descriptor: &PipelineDescriptor, console_url: Option<&str>) {
        match self.mode {
            OutputMode::Normal => {
                println!("Pipeline:    {}", descriptor.id);
                println!("Application: {}", descriptor.application);
                println!("Started:     {}", descriptor.started_at.to_rfc3339());
                println!("Status:      {}", descriptor.status);
                if let Some(initiated_by) = &descriptor.initiated_by {
                    println!("Initiator:   {initiated_by}");
                }
                if let Some(environment) = &descriptor.environment {
                    println!(
                        "Environment: {} ({})",
                        environment.account, environment.provider
                    );
                }
                if let Some(url) = console_url {
                    println!("Console:     {url}");
                }
            }
            OutputMode::Quiet => {
                println!("{}", descriptor.id);
            }
            OutputMode::Json => {
                #[derive(Serialize)]
                struct Created<'a> {
                    event: &'a str,
                    id: &'a str,
                    application: &'a str,
                    started_at: String,
                    status: String,
                    #[serde(skip_serializing_if = "Option::is_none")]
                    console_url: Option<&'a str>,
                }
                let line = Created {
                    event: "created",
                    id: descriptor.id.as_str(),
                    application: &descriptor.application,
                    started_at: descriptor.started_at.to_rfc3339(),
                    status: descriptor.status.to_string(),
                    console_url,
                };
                if let Ok(json) = serde_json::to_string(&line) {
                    println!("{json}");
                }
            }
        }
    }

    /// Render a one-shot status lookup.
    pub fn pipeline_status(&self, pipeline: &Pipeline) {
        match self.mode {
            OutputMode::Normal => {
                println!("Pipeline: {}", pipeline.id);
                println!("Status:   {}", pipeline.status);
                if let Some(application) = &pipeline.application {
                    println!("Application: {application}");
                }
                if let Some(blocker) = &pipeline.blocked_by_pipeline {
                    println!("Blocked by: {} ({})", blocker.id, blocker.status);
                }
            }
            OutputMode::Quiet => {
                println!("{}", pipeline.status);
            }
            OutputMode::Json => {
                self.json_line("status", &pipeline.status.to_string(), None);
            }
        }
    }

    fn json_line(&self, event: &str, message: &str, status: Option<&str>) {
        let line = JsonEvent {
            event,
            message,
            status,
            duration_secs: self.start_time.map(|_| self.elapsed_secs()),
        };
        if let Ok(json) = serde_json::to_string(&line) {
            println!("{json}");
        }
    }
}

impl ProgressSink for Output {
    fn pipeline_event(&mut self, event: &Event) {
        match self.mode {
            OutputMode::Normal => {
                println!(
                    "[{}] {} {}",
                    event.occurred_at.to_rfc3339(),
                    event.event_type,
                    event.message
                );
            }
            OutputMode::Quiet => {}
            OutputMode::Json => {
                self.json_line(
                    "pipeline-event",
                    &event.message,
                    event.status.map(|s| s.to_string()).as_deref(),
                );
            }
        }
    }

    fn status_changed(&mut self, status: PipelineStatus) {
        match self.mode {
            OutputMode::Normal => println!("status: {status}"),
            OutputMode::Quiet => {}
            OutputMode::Json => self.json_line("status", &status.to_string(), None),
        }
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}
