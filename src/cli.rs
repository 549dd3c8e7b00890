use clap::{Parser, Subcommand};

use crate::config::DEFAULT_MODEL;

/// Model choices surfaced by `models`. Any OpenRouter model id is accepted
/// through `--model`; these are the ones known to follow the classifier's
/// JSON instructions reliably.
pub const AVAILABLE_MODELS: &[(&str, &str)] = &[
    ("google/gemma-2-9b-it", "Google Gemma 2 9B"),
    ("openai/gpt-4o-mini", "OpenAI GPT-4o Mini"),
    ("anthropic/claude-3-haiku", "Anthropic Claude 3 Haiku"),
    ("meta-llama/llama-3-8b-instruct", "Meta Llama 3 8B"),
    ("mistralai/mistral-7b-instruct", "Mistral 7B Instruct"),
];

#[derive(Parser)]
#[command(
    name = "hateblock",
    version,
    about = "Scan a conversation's replies for hate speech and block flagged authors"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scan the reply thread of one conversation
    Scan {
        /// Conversation URL on x.com or twitter.com
        url: String,
        /// Stop collecting after this many replies
        #[arg(long)]
        max_replies: Option<usize>,
        /// Minimum confidence (0-100) before a flagged reply is acted on
        #[arg(long)]
        threshold: Option<u8>,
        /// OpenRouter model id to classify with
        #[arg(long)]
        model: Option<String>,
        /// Classify only the replies already visible, never scroll
        #[arg(long)]
        no_scroll: bool,
    },
    /// Manage the authors that are never blocked
    Allowlist {
        #[command(subcommand)]
        action: AllowlistAction,
    },
    /// List the classifier models known to work well
    Models,
}

#[derive(Subcommand)]
pub enum AllowlistAction {
    /// Exempt an author from block automation
    Add {
        username: String,
        /// Why this author is exempt
        #[arg(long)]
        note: Option<String>,
    },
    /// Remove an author's exemption
    Remove { username: String },
    /// Show all exempt authors
    List,
}

pub fn print_models() {
    for (id, label) in AVAILABLE_MODELS {
        if *id == DEFAULT_MODEL {
            println!("{id:<32}  {label} (default)");
        } else {
            println!("{id:<32}  {label}");
        }
    }
}
