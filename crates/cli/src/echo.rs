use owo_colors::OwoColorize;
use sitelift_core::{ChatReply, ExtractionResult};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "Sitelift".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Structured records from web pages\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print an indented `label value` detail line
pub fn print_detail(label: &str, value: &str) {
    eprintln!("  {} {}", format!("{}:", label).dimmed(), value.bright_white());
}

/// Print timing information with color coding
pub fn print_timing(label: &str, duration: std::time::Duration) {
    let secs = duration.as_secs_f64();
    let label = format!("{}:", label);
    if secs < 5.0 {
        eprintln!("  {} {:>8.2}s ({})", label.dimmed(), secs, "fast".dimmed());
    } else if secs < 20.0 {
        eprintln!("  {} {:>8.2}s ({})", label.dimmed(), secs, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>8.2}s ({})", label.dimmed(), secs, "slow".bright_red());
    }
}

/// Print a summary of an extraction result
pub fn print_extraction_summary(result: &ExtractionResult) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Extraction Summary".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    print_detail("Records", &result.data.len().to_string());
    print_detail("Input tokens", &result.input_tokens.to_string());
    print_detail("Output tokens", &result.output_tokens.to_string());
    print_detail("Cost", &format!("${:.6}", result.cost));

    match &result.error {
        Some(error) => print_error(error),
        None => print_success("Extraction complete"),
    }
    eprintln!();
}

/// Print the outcome of a chat request
pub fn print_chat_summary(reply: &ChatReply) {
    match &reply.error {
        Some(error) => print_error(error),
        None => print_success(&format!("Answered in {} characters", reply.response.chars().count())),
    }
}
