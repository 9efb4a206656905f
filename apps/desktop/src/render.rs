//! Plain-text rendering of orchestrator state.

use std::cell::Cell;

use client_core::InteractionState;
use shared::{
    domain::{AnalysisResult, ChatMessage, Sender},
    protocol::AnalysisRecord,
};

pub const HELP: &str = "\
Type a question to chat with the trading assistant.
  /analyze <path>   upload a candlestick chart for analysis
  /history          reload the chat history of this session
  /analyses         list past chart analyses of this session
  /state            print the current session state as JSON
  /help             show this help
  /quit             leave";

pub fn format_message(message: &ChatMessage) -> String {
    let who = match message.sender {
        Sender::User => "you",
        Sender::Assistant => "assistant",
    };
    format!(
        "[{}] {who}: {}",
        message.timestamp.format("%H:%M"),
        message.text
    )
}

pub fn format_analysis(result: &AnalysisResult) -> String {
    match result {
        AnalysisResult::Failure { message } => format!("Analysis failed: {message}"),
        AnalysisResult::Success(analysis) => {
            let mut out = String::from("== Chart analysis ==\n");
            if analysis.detected_patterns.is_empty() {
                out.push_str("Patterns: none detected\n");
            } else {
                out.push_str(&format!(
                    "Patterns: {}\n",
                    analysis.detected_patterns.join(", ")
                ));
            }
            if !analysis.recommendations.is_empty() {
                out.push_str("Recommendations:\n");
                let mut recommendations: Vec<_> = analysis.recommendations.iter().collect();
                recommendations.sort();
                for (key, value) in recommendations {
                    out.push_str(&format!("  {}: {value}\n", key.replace('_', " ")));
                }
            }
            out.push('\n');
            out.push_str(analysis.narrative.trim());
            out
        }
    }
}

pub fn format_analysis_record(record: &AnalysisRecord) -> String {
    let patterns = if record.patterns_detected.is_empty() {
        "no patterns".to_string()
    } else {
        record.patterns_detected.join(", ")
    };
    format!(
        "{} {} ({patterns})",
        record.timestamp.format("%Y-%m-%d %H:%M"),
        record.filename.as_deref().unwrap_or("chart")
    )
}

/// Prints transcript messages that have not been shown yet.
#[derive(Debug, Default)]
pub struct Presenter {
    rendered: Cell<usize>,
}

impl Presenter {
    pub fn pending_lines(&self, state: &InteractionState) -> Vec<String> {
        let start = self.rendered.get().min(state.transcript.len());
        self.rendered.set(state.transcript.len());
        state.transcript[start..].iter().map(format_message).collect()
    }

    pub fn render_transcript(&self, state: &InteractionState) {
        for line in self.pending_lines(state) {
            println!("{line}");
        }
    }
}
