//! Terminal output helpers for command results.
//!
//! Results go to stdout; logging goes to stderr. Styling is applied through
//! `console`, which drops colors when stdout is not a terminal.

use console::style;
use ffguard_core::logging::format_command;
use std::fmt::Display;

/// Print a heading with clear separation
pub fn print_heading(text: &str) {
    let line = "=".repeat(50);
    println!("{}", style(&line).blue());
    println!("{}", style(format!(" {text} ")).bold());
    println!("{}", style(&line).blue());
}

/// Print a section heading (smaller than main heading)
pub fn print_section(text: &str) {
    println!();
    println!("{}", style(format!("--- {text} ---")).bold());
}

/// Print an info line with label and value, with the label colored
pub fn print_info<T: Display>(label: &str, value: T) {
    println!("{}: {}", style(label).cyan(), value);
}

pub fn print_success(message: &str) {
    println!("{} {}", style("[OK]").green().bold(), message);
}

/// Print a list of names on one line, or a placeholder when empty
pub fn print_list<I, S>(label: &str, items: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = join_names(items);
    if joined.is_empty() {
        print_info(label, style("none").dim());
    } else {
        print_info(label, joined);
    }
}

/// Print a command line that would have been run
pub fn print_command(argv: &[String]) {
    println!("{}", format_command(argv));
}

fn join_names<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
