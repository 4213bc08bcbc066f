//! Terminal chat client for the relay.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a relay on the default origin
//! chatrelay-chat
//!
//! # Another origin, a shorter deadline, no colors
//! chatrelay-chat --origin http://127.0.0.1:8080 --timeout-ms 10000 --no-color
//! ```
//!
//! # Commands
//!
//! - `/help` - Show available commands
//! - `/clear` - Clear the conversation
//! - `/history` - Show the whole conversation again
//! - `/quit` - Exit the application

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use chatrelay::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, HttpTransport, InputController,
    RequestLifecycle, TerminalSurface, help_text, parse_command,
};
use chatrelay::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("chatrelay-chat [OPTIONS]");
    let config = ChatConfig::from(args);
    // Log lines share the terminal with the conversation; only emit them on request.
    if std::env::var_os("RUST_LOG").is_some() {
        init_tracing();
    }

    let transport = HttpTransport::new(&config.origin)?;
    println!("Chat relay at {}", transport.endpoint());
    println!("Type /help for commands, /quit to exit\n");

    let controller = InputController::new(RequestLifecycle::with_timeout(transport, config.timeout));
    let mut session = ChatSession::new();
    let mut surface = TerminalSurface::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("You: ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.trim());

                if let Some(cmd) = parse_command(&line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            session.clear();
                            surface.print_info("Conversation cleared.");
                        }
                        ChatCommand::History => {
                            if session.timeline().is_empty() {
                                surface.print_info("No messages yet.");
                            } else {
                                surface.render_timeline(session.timeline());
                            }
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            surface.print_error(&message);
                        }
                    }
                    continue;
                }

                // The reply, or the fixed text for a failure, lands in the timeline.
                controller.submit(&mut session, &mut surface, &line).await;
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                surface.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}
