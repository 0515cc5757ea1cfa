use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tower_http::cors::CorsLayer;

use loan_assist::config::IntakeConfig;
use loan_assist::intake::strings::{Phrase, format_inr, phrase};
use loan_assist::intake::{BotMessage, Input, IntakeAgent, Language, MessageKind, Session};
use loan_assist::reply::{AnthropicReplyGenerator, ReplyGenerator, StaticReplyGenerator};
use loan_assist::routes::{IntakeRouteState, SessionStatus, intake_routes};
use loan_assist::telemetry;
use loan_assist::verification::{
    IdentityVerifier, KycSubmission, MockLatency, MockVerificationBackend,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = IntakeConfig::from_env()?;
    telemetry::init(&config.log_level)?;

    let verifier: Arc<dyn IdentityVerifier> = Arc::new(MockVerificationBackend::new(
        if config.simulate_latency {
            MockLatency::default()
        } else {
            MockLatency::none()
        },
    ));

    let replies: Arc<dyn ReplyGenerator> = match &config.anthropic_api_key {
        Some(key) => Arc::new(AnthropicReplyGenerator::new(
            key.clone(),
            config.reply_model.clone(),
        )?),
        None => Arc::new(StaticReplyGenerator::default()),
    };

    eprintln!("🏦 Loan Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Replies: {}", replies.name());
    eprintln!("   Max KYC attempts: {}", config.max_kyc_attempts);
    if let Some(port) = config.http_port {
        eprintln!("   Intake API: http://0.0.0.0:{}/api/intake/status", port);
    }
    eprintln!("   Commands: /select <id>, /kyc <pan> <aadhaar> [nodoc], /otp <code>,");
    eprintln!("             /lang en|hi, /restart, /letter, /status, /quit\n");

    let http_port = config.http_port;
    let agent = Arc::new(IntakeAgent::new(config, verifier, replies));

    if let Some(port) = http_port {
        // The web front end is served from another origin.
        let app = intake_routes(IntakeRouteState {
            agent: Arc::clone(&agent),
        })
        .layer(CorsLayer::permissive());
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
        tracing::info!(port, "Intake HTTP server started");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Intake HTTP server stopped: {}", e);
            }
        });
    }

    print_messages(&agent.start().await, &agent.snapshot().await);
    eprint!("> ");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }

        match parse_command(line) {
            Command::Quit => break,
            Command::Status => {
                let status = SessionStatus::from(agent.snapshot().await);
                println!("{}", serde_json::to_string_pretty(&status)?);
            }
            Command::Letter => match agent.sanction_letter().await {
                Ok(letter) => println!("\n{}", letter.to_markdown()),
                Err(e) => eprintln!("{}", e),
            },
            Command::Invalid(usage) => eprintln!("Usage: {}", usage),
            Command::Input(input) => {
                if matches!(
                    input,
                    Input::KycSubmitted(_) | Input::OtpSubmitted { .. }
                ) {
                    eprintln!("⏳ Verifying...");
                }
                let messages = agent.handle(input).await;
                print_messages(&messages, &agent.snapshot().await);
            }
        }
        eprint!("> ");
    }

    Ok(())
}

enum Command {
    Input(Input),
    Status,
    Letter,
    Quit,
    Invalid(&'static str),
}

fn parse_command(line: &str) -> Command {
    let is_restart_button = [Language::En, Language::Hi]
        .into_iter()
        .any(|language| line == phrase(language, Phrase::ButtonRestart));
    if is_restart_button {
        return Command::Input(Input::Restart);
    }
    let Some(command) = line.strip_prefix('/') else {
        return Command::Input(Input::text(line));
    };
    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or_default() {
        "quit" | "exit" => Command::Quit,
        "status" => Command::Status,
        "letter" => Command::Letter,
        "restart" => Command::Input(Input::Restart),
        "select" => match parts.next() {
            Some(id) => Command::Input(Input::choose(id)),
            None => Command::Invalid("/select <offer id>"),
        },
        "otp" => match parts.next() {
            Some(code) => Command::Input(Input::otp(code)),
            None => Command::Invalid("/otp <code>"),
        },
        "lang" => match parts.next().map(str::parse::<Language>) {
            Some(Ok(language)) => Command::Input(Input::SetLanguage { language }),
            _ => Command::Invalid("/lang en|hi"),
        },
        "kyc" => match (parts.next(), parts.next()) {
            (Some(tax_id), Some(national_id)) => {
                Command::Input(Input::KycSubmitted(KycSubmission {
                    tax_id: tax_id.to_string(),
                    national_id: national_id.to_string(),
                    document_present: parts.next() != Some("nodoc"),
                }))
            }
            _ => Command::Invalid("/kyc <pan> <aadhaar> [nodoc]"),
        },
        _ => Command::Invalid("/select, /kyc, /otp, /lang, /restart, /letter, /status, /quit"),
    }
}

fn print_messages(messages: &[BotMessage], session: &Session) {
    for message in messages {
        println!("\n{}", message.text);
        match message.kind {
            MessageKind::OfferCards => {
                for offer in &session.offers {
                    println!(
                        "  [{}] {} at {}% for {} months, EMI {}, fee {}",
                        offer.id(),
                        format_inr(offer.amount()),
                        offer.annual_rate_percent(),
                        offer.tenure_months(),
                        format_inr(offer.installment()),
                        format_inr(offer.origination_fee()),
                    );
                }
                eprintln!("   (use /select <id> to choose)");
            }
            MessageKind::Upload => eprintln!("   (use /kyc <pan> <aadhaar> [nodoc])"),
            MessageKind::Sanction => eprintln!("   (use /letter to view the sanction letter)"),
            _ => {}
        }
        for (i, option) in message.options.iter().enumerate() {
            println!("  [{}] {}", i + 1, option);
        }
    }
    println!();
}
