// src/agent.rs
// Natural-language questions over a loaded table, answered by Gemini.
//
// The agent only reads the table. Instructions that ask for edits get a
// textual answer; nothing is applied locally or written back to the sheet.

use std::env;
use std::future::Future;
use std::io::{self, Write};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::csv_handler::CSVHandler;
use crate::data_types::Table;
use crate::settings::AgentSettings;

pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The built-in prompt batch run by the CLI when no prompts are given.
pub const TEST_PROMPTS: [&str; 10] = [
    "Show me all employees who work in the HR department.",
    "Find employees in the 'AC' department who were hired before the year 2000.",
    "List all employees, sorted by their hire date from the most recent to the oldest.",
    "How many employees work in Building 1?",
    "What is the total number of employees in each department? List the department and the count.",
    "Find all employees whose last name starts with 'S'.",
    "Who is the most recently hired employee in the entire company?",
    "Sort the entire list by employee identification number in descending order.",
    "Find the employee with Emp ID 1075 and change their Location to 'Building 4'.",
    "Add a new employee: Emp ID 2001, Last Name 'Turing', First Name 'Alan', Dept 'AC', E-mail 'alant', Phone Ext 100, Location 'Building 2', Hire Date '5/15/2024'.",
];

#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    pub answer: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    #[error("GOOGLE_API_KEY environment variable not set.")]
    MissingKey,
    #[error("Network error: {0}")]
    Network(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Answers an instruction about a table.
pub trait TableAgent: Send + Sync {
    fn ask(
        &self,
        table: &Table,
        instruction: &str,
    ) -> impl Future<Output = Result<AgentReply, AgentError>> + Send;
}

// ============================================================================
// Gemini API types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

// ============================================================================
// Agent
// ============================================================================

pub struct GeminiAgent {
    http: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    api_base: String,
}

impl GeminiAgent {
    pub fn new(api_key: impl Into<String>, settings: &AgentSettings) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .user_agent(format!("sheet_agent/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| AgentError::Network(e.to_string()))?;

        Ok(GeminiAgent {
            http,
            api_key: api_key.into(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            api_base: GEMINI_API_BASE.to_string(),
        })
    }

    /// Builds an agent with the key from `GOOGLE_API_KEY`.
    pub fn from_env(settings: &AgentSettings) -> Result<Self, AgentError> {
        let key = env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AgentError::MissingKey)?;
        Self::new(key, settings)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

impl TableAgent for GeminiAgent {
    async fn ask(&self, table: &Table, instruction: &str) -> Result<AgentReply, AgentError> {
        let data = CSVHandler::new()
            .to_csv_string(table)
            .map_err(|e| AgentError::InvalidResponse(format!("could not serialize table: {}", e)))?;

        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: build_system_prompt(),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: build_user_prompt(table, &data, instruction),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        debug!(model = %self.model, rows = table.row_count(), "Sending prompt");

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AgentError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        let answer = parse_answer(&body)?;
        Ok(AgentReply {
            answer,
            model: self.model.clone(),
        })
    }
}

/// Runs each prompt against `table`, writing a framed transcript to `out`.
///
/// A failed prompt is reported in the transcript and the batch moves on.
/// Returns the number of prompts that failed.
pub async fn run_prompts<A, W>(
    agent: &A,
    table: &Table,
    prompts: &[String],
    mut out: W,
) -> io::Result<usize>
where
    A: TableAgent,
    W: Write,
{
    let mut failures = 0;

    for (i, prompt) in prompts.iter().enumerate() {
        writeln!(out, "\n===================[ Test Prompt #{} ]===================", i + 1)?;
        writeln!(out, "User Prompt: {}", prompt)?;
        writeln!(out, "---------------------------------------------------------")?;

        match agent.ask(table, prompt).await {
            Ok(reply) => {
                writeln!(out, "\n--- Agent's Final Answer ---")?;
                writeln!(out, "{}", reply.answer)?;
            }
            Err(e) => {
                failures += 1;
                warn!(prompt = i + 1, error = %e, "Prompt failed");
                writeln!(out, "\n--- An Error Occurred ---")?;
                writeln!(out, "The agent failed on this prompt. Error: {}", e)?;
            }
        }

        writeln!(out, "=========================================================\n")?;
        out.flush()?;
    }

    Ok(failures)
}

fn build_system_prompt() -> String {
    r#"You are a data analyst working with a single table loaded from a spreadsheet.
The table is given to you as CSV; the first line is the header.

RULES:
1. Answer only from the data provided. If the data cannot answer the question, say so.
2. When the answer is a list of rows, present it as a markdown table with the relevant columns.
3. When asked to count, sort, filter or group, do it precisely over every row.
4. You cannot modify the spreadsheet. If asked to change or add rows, show what the affected rows would look like after the change and state that the change was not saved."#
        .to_string()
}

fn build_user_prompt(table: &Table, csv: &str, instruction: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "DATA ({} rows, {} columns):\n",
        table.row_count(),
        table.column_count()
    ));
    prompt.push_str(csv);
    if !csv.ends_with('\n') {
        prompt.push('\n');
    }

    prompt.push_str("\nQUESTION:\n");
    prompt.push_str(instruction.trim());
    prompt.push('\n');

    prompt
}

fn api_error(status: u16, body: &str) -> AgentError {
    let message = serde_json::from_str::<GeminiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());
    AgentError::Api { status, message }
}

fn parse_answer(body: &str) -> Result<String, AgentError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(AgentError::InvalidResponse(format!("prompt blocked: {}", reason)));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AgentError::InvalidResponse("No candidates in response".to_string()))?;

    let text: String = candidate
        .content
        .unwrap_or_default()
        .parts
        .into_iter()
        .map(|p| p.text)
        .collect();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(AgentError::InvalidResponse(format!(
            "empty answer (finish reason: {})",
            reason
        )));
    }

    Ok(text.trim().to_string())
}
