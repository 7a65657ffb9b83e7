use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use serde_json::Value;

use guestbook_service::guestbook::types::Message;
use guestbook_service::guestbook::MessageForm;

#[derive(Parser)]
#[command(name = "guestbook-cli")]
#[command(about = "Client CLI for the On-chain Guestbook Service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service and session status
    Status,
    /// List messages, newest first
    List {
        /// Case-insensitive filter over title and text
        #[arg(short, long)]
        search: Option<String>,

        /// Only messages written by the service wallet
        #[arg(short, long)]
        mine: bool,
    },
    /// Show the message the contract reports as latest
    Latest,
    /// Write a new message
    Post {
        #[arg(short, long)]
        title: String,

        #[arg(short = 'x', long)]
        text: String,
    },
    /// Edit a message in place; prompts for fields when flags are omitted
    Edit {
        id: u64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short = 'x', long)]
        text: Option<String>,
    },
    /// Delete one or more messages
    Delete {
        /// Slot ids to delete
        #[arg(required_unless_present = "mine")]
        ids: Vec<u64>,

        /// Delete every message written by the service wallet
        #[arg(long)]
        mine: bool,
    },
    /// Reload the collection from the contract
    Reload,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Status => {
            let res = client
                .get(format!("{}/api/v1/session", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::List { search, mine } => {
            let mut params: Vec<(&str, String)> = Vec::new();
            if let Some(q) = search {
                params.push(("q", q));
            }
            if mine {
                params.push(("mine", "true".to_string()));
            }
            let res = client
                .get(format!("{}/api/v1/messages", cli.url))
                .query(&params)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Latest => {
            let res = client
                .get(format!("{}/api/v1/messages/latest", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Post { title, text } => {
            let res = client
                .post(format!("{}/api/v1/messages", cli.url))
                .json(&serde_json::json!({ "title": title, "text": text }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Edit { id, title, text } => {
            edit_message(&client, &cli.url, id, title, text).await?;
        }
        Commands::Delete { ids, mine } => {
            let ids = if mine {
                fetch_own_ids(&client, &cli.url).await?
            } else {
                ids
            };
            if ids.is_empty() {
                println!("Nothing to delete.");
            } else if ids.len() == 1 {
                let res = client
                    .delete(format!("{}/api/v1/messages/{}", cli.url, ids[0]))
                    .send()
                    .await?;
                print_response(res).await?;
            } else {
                let res = client
                    .post(format!("{}/api/v1/messages/batch-delete", cli.url))
                    .json(&serde_json::json!({ "ids": ids }))
                    .send()
                    .await?;
                print_response(res).await?;
            }
        }
        Commands::Reload => {
            let res = client
                .post(format!("{}/api/v1/reload", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

/// Interactive edit: the draft starts from the on-chain fields, keeps any
/// typed input when the submission fails.
async fn edit_message(
    client: &reqwest::Client,
    base: &str,
    id: u64,
    title: Option<String>,
    text: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(current) = fetch_message(client, base, id).await? else {
        eprintln!("Error: no message with id {} in the current collection", id);
        return Ok(());
    };

    let mut form = MessageForm::new();
    form.set_target(Some(&current));

    match title {
        Some(t) => form.set_title(t),
        None => {
            if let Some(t) = prompt("Title", form.title())? {
                form.set_title(t);
            }
        }
    }
    match text {
        Some(x) => form.set_text(x),
        None => {
            if let Some(x) = prompt("Text", form.text())? {
                form.set_text(x);
            }
        }
    }

    let (new_title, new_text) = form.begin_submit();
    let res = client
        .put(format!("{}/api/v1/messages/{}", base, id))
        .json(&serde_json::json!({ "title": new_title, "text": new_text }))
        .send()
        .await?;

    let ok = res.status().is_success();
    if ok {
        form.finish_submit(true);
        print_response(res).await?;
    } else {
        let status = res.status();
        form.finish_submit(false);
        eprintln!("Error: API returned status {}", status);
        if let Ok(body) = res.text().await {
            eprintln!("Response: {}", body);
        }
        eprintln!(
            "Draft kept: title={:?} text={:?}",
            form.title(),
            form.text()
        );
    }
    Ok(())
}

async fn fetch_message(
    client: &reqwest::Client,
    base: &str,
    id: u64,
) -> Result<Option<Message>, Box<dyn std::error::Error>> {
    let res = client
        .get(format!("{}/api/v1/messages", base))
        .send()
        .await?;
    if !res.status().is_success() {
        return Err(format!("message list returned status {}", res.status()).into());
    }

    let list: Value = res.json().await?;
    let Some(items) = list.get("messages").and_then(Value::as_array) else {
        return Ok(None);
    };
    for item in items {
        if item.get("id").and_then(Value::as_u64) == Some(id) {
            let author = item
                .get("author")
                .and_then(Value::as_str)
                .unwrap_or_default();
            return Ok(Some(Message {
                id,
                author: author.parse().unwrap_or(Address::ZERO),
                title: field(item, "title"),
                text: field(item, "text"),
            }));
        }
    }
    Ok(None)
}

async fn fetch_own_ids(
    client: &reqwest::Client,
    base: &str,
) -> Result<Vec<u64>, Box<dyn std::error::Error>> {
    let res = client
        .get(format!("{}/api/v1/messages", base))
        .query(&[("mine", "true")])
        .send()
        .await?;
    if !res.status().is_success() {
        return Err(format!("message list returned status {}", res.status()).into());
    }

    let list: Value = res.json().await?;
    Ok(list
        .get("messages")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|m| m.get("id").and_then(Value::as_u64))
                .collect()
        })
        .unwrap_or_default())
}

fn field(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn prompt(label: &str, current: &str) -> std::io::Result<Option<String>> {
    use std::io::Write;

    print!("{} [{}]: ", label, current);
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let trimmed = input.trim();
    Ok(if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    })
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
