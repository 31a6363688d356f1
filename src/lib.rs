pub mod api;
pub mod classify;
pub mod cli;
pub mod config;
pub mod models;
pub mod render;
pub mod session;
pub mod stream;

use api::MiloClient;
use classify::ParsedBlock;
use cli::Args;
use config::ClientConfig;
use log::{ error, info, warn };
use models::stream::StreamEvent;
use session::{ ChatSession, TurnOutcome };
use std::error::Error;
use std::io::Write;
use tokio::io::{ AsyncBufReadExt, BufReader };
use tokio::sync::watch;

const HELP: &str = "Commands: /clear /history /session /sessions /health /analyze <text> /help /quit";

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = ClientConfig::from_args(&args)?;

    info!("--- Core Configuration ---");
    info!("API URL: {}", config.base_url);
    info!("Session ID: {}", config.session_id);
    info!("Request Timeout: {:?}", config.request_timeout);
    info!("Connect Timeout: {:?}", config.connect_timeout);
    match config.stream_idle_timeout {
        Some(idle) => info!("Stream Idle Timeout: {:?}", idle),
        None => info!("Stream Idle Timeout: disabled"),
    }
    info!("Debug: {}", args.debug);
    info!("-------------------------");

    let client = MiloClient::new(&config)?;
    let mut session = ChatSession::new(config.session_id.clone());

    if let Some(input) = args.analyze.as_deref() {
        let resp = client.analyze(input).await;
        print!("{}", render::render_analysis(&resp));
        return Ok(());
    }

    if let Some(message) = args.message.as_deref() {
        return one_shot(&client, &mut session, message, &mut std::io::stdout()).await;
    }

    repl(&client, &mut session).await
}

/// The `--message` mode: one turn written to `out`. A failed reply is an error so the
/// process exits non-zero.
pub async fn one_shot<W: Write>(
    client: &MiloClient,
    session: &mut ChatSession,
    message: &str,
    out: &mut W
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match chat_turn(client, session, message, out).await? {
        TurnOutcome::Failed => Err("chat reply failed".into()),
        TurnOutcome::Completed | TurnOutcome::Cancelled => Ok(()),
    }
}

/// Sends one message, echoing chunks as they arrive. Ctrl-C stops the reply.
pub async fn chat_turn<W: Write>(
    client: &MiloClient,
    session: &mut ChatSession,
    text: &str,
    out: &mut W
) -> Result<TurnOutcome, Box<dyn Error + Send + Sync>> {
    let (cancel_tx, mut cancel_rx) = watch::channel(false);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let mut failure = None;
    let outcome = session.send(client, text, &mut cancel_rx, |_, event| {
        match event {
            StreamEvent::Content(chunk) => {
                let _ = write!(out, "{}", chunk);
                let _ = out.flush();
            }
            StreamEvent::Error(message) => {
                failure = Some(message.clone());
            }
            StreamEvent::Done => {}
        }
    }).await;
    interrupt.abort();
    let outcome = outcome?;
    writeln!(out)?;

    match outcome {
        TurnOutcome::Cancelled => {
            writeln!(out, "[reply stopped]")?;
        }
        TurnOutcome::Failed => {
            if let Some(message) = failure {
                writeln!(out, "{}", crate::session::error_notice(&message))?;
            }
        }
        TurnOutcome::Completed => {
            if let Some((reply, block)) = session.last_block() {
                // Plain replies were already echoed chunk by chunk.
                if !matches!(block, ParsedBlock::Markdown | ParsedBlock::Thinking) {
                    writeln!(out)?;
                    write!(out, "{}", render::render_message(reply, &block))?;
                }
            }
        }
    }
    Ok(outcome)
}

async fn repl(client: &MiloClient, session: &mut ChatSession) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("Milo career advisor. Session: {}", session.session_id());
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "/quit" | "/exit" => {
                break;
            }
            "/help" => println!("{}", HELP),
            "/clear" => {
                match session.reset(client).await {
                    Ok(()) => println!("Session cleared."),
                    Err(e) => {
                        error!("Failed to clear session: {}", e);
                        println!("Could not clear session: {}", e);
                    }
                }
            }
            "/history" => {
                match client.chat_history(session.session_id()).await {
                    Ok(messages) => {
                        session.load_history(messages)?;
                        for message in session.messages() {
                            let block = classify::classify(message);
                            println!("[{}] {}", message.role.as_str(), message.timestamp.format("%H:%M"));
                            print!("{}", render::render_message(message, &block));
                        }
                    }
                    Err(e) => {
                        warn!("History unavailable: {}", e);
                        println!("Could not load history: {}", e);
                    }
                }
            }
            "/session" => {
                match client.session_info(session.session_id()).await {
                    Ok(info) => {
                        println!(
                            "{} · step {} · {} messages · interests: {}",
                            info.session_id,
                            info.current_step,
                            info.message_count,
                            info.student_interests.join(", ")
                        );
                    }
                    Err(e) => println!("Could not load session: {}", e),
                }
            }
            "/sessions" => {
                match client.list_sessions().await {
                    Ok(sessions) => {
                        let mut ids: Vec<_> = sessions.keys().collect();
                        ids.sort();
                        for id in ids {
                            println!("  {}", id);
                        }
                    }
                    Err(e) => println!("Could not list sessions: {}", e),
                }
            }
            "/health" => {
                match client.health().await {
                    Ok(status) => println!("{}", status),
                    Err(e) => println!("Backend unhealthy: {}", e),
                }
            }
            "/analyze" if !rest.trim().is_empty() => {
                let resp = client.analyze(rest.trim()).await;
                print!("{}", render::render_analysis(&resp));
            }
            _ if command.starts_with('/') => println!("{}", HELP),
            _ => {
                if let Err(e) = chat_turn(client, session, line, &mut std::io::stdout()).await {
                    error!("Chat turn failed: {}", e);
                    println!("{}", e);
                }
            }
        }
    }
    info!("Goodbye");
    Ok(())
}
