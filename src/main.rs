//! Terminal shell: drives the lead form and the coaching chat from stdin.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncBufReadExt, BufReader};

use fitplan::lead::{FitnessGoal, LeadFormData};
use fitplan::llm::CompletionClient;
use fitplan::notify::{HttpNotifier, NotifyConfig};
use fitplan::services::conversation::{ConversationStore, TurnRole};
use fitplan::services::dispatch::{NotificationDispatcher, TokioDelay};
use fitplan::services::submission::FormSubmissionFlow;
use fitplan::state::{ShellState, ShellTimings};

const HELP: &str = "commands:
  <text>                              chat with the coach
  /lead <name>|<email>|<goal>|<days>  request a personalized plan
  /goals                              list fitness goals
  /clear                              dismiss the chat error
  /dismiss                            dismiss the plan banner
  /reset                              start a new chat
  /dark                               toggle dark mode
  /probe                              check the notification endpoint
  /quit                               exit";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "no .env loaded");
    }

    // Missing credentials are fatal: refuse to start rather than fail on first use.
    let chat_client = match CompletionClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "completion client initialized");
            client
        }
        Err(e) => {
            tracing::error!(error = %e, "completion client not configured");
            return ExitCode::FAILURE;
        }
    };
    let notify_config = match NotifyConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "notification endpoint not configured");
            return ExitCode::FAILURE;
        }
    };
    let notifier = match HttpNotifier::new(&notify_config) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            tracing::error!(error = %e, "notification client build failed");
            return ExitCode::FAILURE;
        }
    };

    let dispatcher = NotificationDispatcher::new(notifier.clone(), Arc::new(TokioDelay), notify_config.retry);
    let form = FormSubmissionFlow::new(dispatcher);
    let chat = ConversationStore::new(Arc::new(chat_client));
    let mut shell = ShellState::new(ShellTimings::from_env());

    tracing::info!(url = notifier.url(), "fitplan shell ready");
    println!("{HELP}\n");
    print_last_turn(&chat);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let deadline = shell.banner().map(|b| b.expires_at);
        let next = tokio::select! {
            next = lines.next_line() => next,
            () = banner_deadline(deadline) => {
                if shell.expire(Instant::now()).is_none() {
                    println!("[banner cleared]");
                }
                continue;
            }
        };
        let line = match next {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                return ExitCode::FAILURE;
            }
        };
        let line = line.trim();

        match line.split_once(' ').map_or((line, ""), |(cmd, rest)| (cmd, rest.trim())) {
            ("", _) => {}
            ("/quit", _) => break,
            ("/help", _) => println!("{HELP}"),
            ("/goals", _) => {
                for goal in FitnessGoal::ALL {
                    println!("  {:<18} {}", goal.as_str(), goal.label());
                }
            }
            ("/clear", _) => chat.clear_error(),
            ("/dismiss", _) => shell.dismiss(),
            ("/reset", _) => {
                chat.reset();
                print_last_turn(&chat);
            }
            ("/dark", _) => {
                let on = shell.toggle_dark_mode();
                println!("dark mode {}", if on { "on" } else { "off" });
            }
            ("/probe", _) => match notifier.probe().await {
                Ok(()) => println!("notification endpoint is up"),
                Err(e) => println!("notification endpoint unavailable: {e}"),
            },
            ("/lead", args) => submit_lead(&form, &mut shell, args).await,
            _ => {
                if !chat.append(line).await {
                    continue;
                }
                match chat.last_error() {
                    Some(error) => println!("[error] {error}  (/clear to dismiss)"),
                    None => print_last_turn(&chat),
                }
            }
        }
    }
    ExitCode::SUCCESS
}

async fn submit_lead(form: &FormSubmissionFlow, shell: &mut ShellState, args: &str) {
    let mut parts = args.split('|').map(str::trim);
    form.fill(LeadFormData {
        full_name: parts.next().unwrap_or_default().to_string(),
        email: parts.next().unwrap_or_default().to_string(),
        fitness_goal: parts.next().unwrap_or_default().to_string(),
        days_per_week: parts.next().unwrap_or_default().to_string(),
    });

    println!("generating your plan...");
    let (outcome, ()) = tokio::join!(
        form.submit(|fields, outcome| {
            tracing::info!(goal = %fields.fitness_goal, success = outcome.success, "lead submitted");
        }),
        tokio::time::sleep(shell.timings.generating_delay),
    );
    if let Some(outcome) = outcome {
        let banner = shell.show(&outcome, Instant::now());
        println!("[banner] {}", banner.message);
    }
}

/// Resolves when the live banner is due to expire; never without one.
async fn banner_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

fn print_last_turn(chat: &ConversationStore) {
    if let Some(turn) = chat.turns().last() {
        let who = match turn.role {
            TurnRole::User => "you",
            TurnRole::Assistant => "coach",
        };
        println!("{who}: {}", turn.text);
    }
}
