/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `chat`  : Interactive legal Q&A session
- `ask`   : Ask a single question and print the answer
- `health`: Probe the answering service

These handlers are intentionally small and use the library components:
the chat session, the renderer and the answering service.
*/

use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
use crate::config::Config;
use crate::error::{LexiError, Result};
use crate::render;
use crate::service::ServiceHealth;
use crate::session::{ChatSession, SessionEvent};
use colored::Colorize;
use tokio::sync::broadcast;

// Special commands parser for the interactive chat
pub mod special_commands;

/// Prints a session event if it has a visible form
fn print_event(event: &SessionEvent, show_timestamps: bool) {
    if let Some(rendered) = render::render_event(event, show_timestamps) {
        println!("{}", rendered);
    }
}

/// Prints every event already queued on the receiver
fn drain_events(events: &mut broadcast::Receiver<SessionEvent>, show_timestamps: bool) {
    loop {
        match events.try_recv() {
            Ok(event) => print_event(&event, show_timestamps),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!("Renderer fell behind, skipped {} session events", skipped);
            }
            Err(_) => break,
        }
    }
}

/// Prints the readiness report of the answering service
fn print_health(endpoint: &str, health: &ServiceHealth) {
    if health.ready {
        println!(
            "Answering service at {}: {}",
            endpoint,
            "ready".green().bold()
        );
    } else {
        println!(
            "Answering service at {}: {}",
            endpoint,
            "not ready".yellow().bold()
        );
    }
    if let Some(detail) = &health.detail {
        println!("Detail:          {}", detail);
    }
    if let Some(resources) = &health.resources {
        println!("Model loaded:    {}", resources.model_loaded);
        println!("Index loaded:    {}", resources.index_loaded);
        println!("Metadata loaded: {}", resources.metadata_loaded);
        println!("Index size:      {}", resources.index_size);
        println!("Metadata count:  {}", resources.metadata_count);
    }
}

// Chat command handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Creates a `ChatSession` and runs a readline-based loop. Questions are
    //! sent through the session; everything shown on screen comes from the
    //! session's events.

    use super::*;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    ///
    /// # Examples
    ///
    /// ```
    /// use lexi::commands::chat;
    /// use lexi::config::Config;
    ///
    /// // In application code:
    /// // chat::run_chat(Config::default()).await?;
    /// ```
    pub async fn run_chat(config: Config) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let session = ChatSession::from_config(&config)?;
        let mut events = session.subscribe();
        let show_timestamps = config.chat.show_timestamps;

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&config);

        loop {
            let input = match read_question(&mut rl)? {
                Some(input) => input,
                None => break,
            };
            let trimmed = input.trim();
            if trimmed.is_empty() {
                continue;
            }

            // Check for special commands first
            match parse_special_command(trimmed) {
                Ok(SpecialCommand::Cite { marker, message_id }) => {
                    let opened = match message_id {
                        Some(id) => session.open_citation(id, marker),
                        None => session.open_latest_citation(marker),
                    };
                    if let Err(e) = opened {
                        eprintln!("{}", format!("Error: {}", e).red());
                    }
                }
                Ok(SpecialCommand::CloseCitation) => session.close_citation(),
                Ok(SpecialCommand::History) => print_history(&session, show_timestamps),
                Ok(SpecialCommand::ShowStatus) => print_status_display(&config, &session),
                Ok(SpecialCommand::Health) => match session.health().await {
                    Ok(health) => print_health(&config.service.endpoint, &health),
                    Err(e) => eprintln!("{}", format!("Error: {:#}", e).red()),
                },
                Ok(SpecialCommand::Help) => print_help(),
                Ok(SpecialCommand::Exit) => break,
                Ok(SpecialCommand::None) => {
                    rl.add_history_entry(trimmed)?;
                    ask_and_render(&session, &mut events, &input, show_timestamps).await;
                }
                Err(e) => eprintln!("{}", e.to_string().red()),
            }

            drain_events(&mut events, show_timestamps);
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Reads one question, following `\` line continuations
    ///
    /// Returns `None` when the user interrupts or closes the input.
    fn read_question(rl: &mut DefaultEditor) -> Result<Option<String>> {
        let mut lines: Vec<String> = Vec::new();
        loop {
            let prompt = if lines.is_empty() {
                format!("{} ", "You>".green().bold())
            } else {
                format!("{} ", "...".dimmed())
            };
            match rl.readline(&prompt) {
                Ok(line) => match line.strip_suffix('\\') {
                    Some(continued) => lines.push(continued.to_string()),
                    None => {
                        lines.push(line);
                        return Ok(Some(lines.join("\n")));
                    }
                },
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    return Ok(None);
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    return Ok(None);
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    return Err(LexiError::Readline(err).into());
                }
            }
        }
    }

    /// Sends a question, printing session events while it is pending
    async fn ask_and_render(
        session: &ChatSession,
        events: &mut broadcast::Receiver<SessionEvent>,
        question: &str,
        show_timestamps: bool,
    ) {
        let ask = session.ask(question);
        tokio::pin!(ask);

        loop {
            tokio::select! {
                _ = &mut ask => break,
                event = events.recv() => match event {
                    Ok(event) => print_event(&event, show_timestamps),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Renderer fell behind, skipped {} session events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        (&mut ask).await;
                        break;
                    }
                },
            }
        }

        drain_events(events, show_timestamps);
    }

    /// Display welcome banner at the start of interactive chat mode
    fn print_welcome_banner(config: &Config) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║          Lexi - Legal AI Assistant - Welcome!                ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Service: {}", config.service.endpoint.cyan());
        println!("Ask a legal question. Sources are listed as [n] under each answer;");
        println!("type '/cite <n>' to read one.\n");
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    /// Display detailed status information about the current session
    ///
    /// This is called when the user types '/status'.
    fn print_status_display(config: &Config, session: &ChatSession) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Lexi Session Status                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Service Endpoint:  {}", config.service.endpoint.cyan());
        println!("Response Delay:    {} ms", config.dispatch.response_delay_ms);
        println!("Concurrency:       {}", session.policy());
        println!("Conversation Size: {} messages", session.len());
        println!("State:             {}", session.state());
        match session.selected_citation() {
            Some(citation) => println!(
                "Open Citation:     {}",
                citation.source.as_deref().unwrap_or("(no source)")
            ),
            None => println!("Open Citation:     none"),
        }
        println!();
    }

    /// Print the conversation with message ids, for use with `/cite <n> <id>`
    fn print_history(session: &ChatSession, show_timestamps: bool) {
        let messages = session.messages();
        if messages.is_empty() {
            println!("{}", "No messages yet.".dimmed());
            return;
        }
        for message in &messages {
            println!(
                "{} {}\n",
                format!("#{}", message.id).dimmed(),
                render::render_message(message, show_timestamps)
            );
        }
    }
}

// One-shot question handler
pub mod ask {
    //! Ask a single question and print the answer.

    use super::*;
    use crate::conversation::Message;
    use crate::dispatch::AnswerOrigin;
    use serde::Serialize;

    /// JSON document printed by `lexi ask --json`
    #[derive(Debug, Serialize)]
    pub struct AskOutput<'a> {
        /// The question and its answer, in log order
        pub messages: &'a [Message],
        /// Which path produced the answer
        pub origin: AnswerOrigin,
    }

    /// Ask `question` and print the answer
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `question` - The question to ask
    /// * `json` - Print the conversation as JSON instead of formatted text
    ///
    /// # Errors
    ///
    /// Returns [`LexiError::EmptyQuestion`] if the question is blank. Service
    /// failures are not errors: the fallback answer is printed instead.
    pub async fn run_ask(config: Config, question: String, json: bool) -> Result<()> {
        tracing::info!("Asking a single question");

        let session = ChatSession::from_config(&config)?;
        let reply = session
            .ask_detailed(&question)
            .await
            .ok_or(LexiError::EmptyQuestion)?;
        tracing::debug!(origin = %reply.origin, "Answer ready");

        if json {
            let messages = session.messages();
            let output = AskOutput {
                messages: &messages,
                origin: reply.origin,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "{}",
                render::render_message(&reply.message, config.chat.show_timestamps)
            );
            if !reply.message.citations.is_empty() {
                println!("\n{}", render::render_citation_list(&reply.message));
            }
        }

        Ok(())
    }
}

// Backend health handler
pub mod health {
    //! Probe the answering service readiness endpoint.

    use super::*;
    use crate::service::{AnsweringService, HttpAnsweringService};

    /// Probe the configured answering service and print its readiness
    ///
    /// # Errors
    ///
    /// Returns error if the service is unreachable or reports that it is not
    /// ready
    pub async fn run_health(config: Config) -> Result<()> {
        let service = HttpAnsweringService::new(&config.service)?;
        let health = service.health().await?;
        print_health(service.base_url(), &health);

        if health.ready {
            Ok(())
        } else {
            Err(LexiError::Service(format!(
                "Answering service at {} is not ready",
                service.base_url()
            ))
            .into())
        }
    }
}
