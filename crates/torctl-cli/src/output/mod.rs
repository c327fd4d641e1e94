//! Output formatting utilities for the CLI
//!
//! Formats negotiated capabilities for the terminal and prints colored
//! status messages.

use tabled::{settings::Style, Table, Tabled};

use torctl_core::NegotiatedCapabilities;

/// Format negotiated capabilities as a two-column table
pub fn format_capabilities(address: &str, caps: &NegotiatedCapabilities) -> String {
    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "FIELD")]
        field: &'static str,
        #[tabled(rename = "VALUE")]
        value: String,
    }

    let methods = if caps.auth_methods().is_empty() {
        "-".to_string()
    } else {
        caps.auth_methods()
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };

    let rows = vec![
        Row {
            field: "Control port",
            value: address.to_string(),
        },
        Row {
            field: "Protocol version",
            value: caps.protocol_version().to_string(),
        },
        Row {
            field: "Auth methods",
            value: methods,
        },
        Row {
            field: "Cookie file",
            value: caps
                .auth_cookie_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string()),
        },
    ];

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
///
/// Outputs to stderr so it never mixes with JSON on stdout.
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan with an info symbol prefix
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}
