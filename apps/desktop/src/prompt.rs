//! Prompt loop: one local task per command, drained before exit.

use std::rc::Rc;

use anyhow::Result;
use client_core::{Admission, ChartImage, HttpGateway, InteractionOrchestrator};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::{
    commands::{parse_command, UiCommand},
    render::{format_analysis, format_analysis_record, Presenter, HELP},
};

pub struct App {
    pub orchestrator: InteractionOrchestrator,
    pub gateway: Rc<HttpGateway>,
    pub presenter: Presenter,
}

/// Reads commands until `/quit` or end of input, then waits for every
/// request already issued. Must run inside a `LocalSet`.
pub async fn run_prompt<R>(app: Rc<App>, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut pending: Vec<JoinHandle<()>> = Vec::new();

    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        if command == UiCommand::Quit {
            break;
        }
        debug!(cmd = command.name(), "ui: dispatching command");
        let app = Rc::clone(&app);
        pending.push(tokio::task::spawn_local(async move {
            dispatch(&app, command).await
        }));
        pending.retain(|handle| !handle.is_finished());
    }

    if !pending.is_empty() {
        debug!(in_flight = pending.len(), "ui: waiting for pending requests");
    }
    for handle in pending {
        if let Err(err) = handle.await {
            warn!(error = %err, "ui: command task failed");
        }
    }
    Ok(())
}

pub async fn dispatch(app: &App, command: UiCommand) {
    let orchestrator = &app.orchestrator;
    match command {
        UiCommand::Chat(text) => {
            if orchestrator.is_chat_busy() {
                println!("Still waiting for the previous reply.");
                return;
            }
            orchestrator.set_draft(text.clone());
            match orchestrator.send_message(&text).await {
                Admission::Accepted => app.presenter.render_transcript(&orchestrator.snapshot()),
                Admission::Busy => println!("Still waiting for the previous reply."),
                Admission::EmptyInput => {}
            }
        }
        UiCommand::Analyze(path) => {
            let image = match ChartImage::from_path(&path).await {
                Ok(image) => image,
                Err(err) => {
                    println!("{err:#}");
                    return;
                }
            };
            println!("Analyzing {}...", image.filename);
            match orchestrator.analyze(image).await {
                Admission::Accepted => {
                    if let Some(result) = orchestrator.snapshot().analysis_result {
                        println!("{}", format_analysis(&result));
                    }
                }
                Admission::Busy => println!("An analysis is already running."),
                Admission::EmptyInput => println!("{} is empty.", path.display()),
            }
        }
        UiCommand::History => {
            orchestrator.load_history().await;
            app.presenter.render_transcript(&orchestrator.snapshot());
        }
        UiCommand::Analyses => {
            match app
                .gateway
                .fetch_analysis_history(orchestrator.session_id())
                .await
            {
                Ok(records) if records.is_empty() => println!("No analyses yet."),
                Ok(records) => {
                    for record in &records {
                        println!("{}", format_analysis_record(record));
                    }
                }
                Err(err) => println!("Could not load past analyses: {err}"),
            }
        }
        UiCommand::State => match serde_json::to_string_pretty(&orchestrator.snapshot()) {
            Ok(json) => println!("{json}"),
            Err(err) => warn!(error = %err, "ui: failed to encode state"),
        },
        UiCommand::Help => println!("{HELP}"),
        UiCommand::Quit => {}
    }
}

#[cfg(test)]
#[path = "tests/prompt_tests.rs"]
mod tests;
