//! Redaction of secrets from protocol traffic before it is logged.
//!
//! Wire lines are echoed at trace level for diagnostics. Commands that carry
//! credentials have their arguments replaced so the secret never reaches a
//! log sink or an error message.

use std::borrow::Cow;

/// Commands whose arguments are secret.
const SENSITIVE_COMMANDS: &[&str] = &["password"];

const REDACTED: &str = "[REDACTED]";

/// Redact the arguments of credential-carrying commands.
///
/// Input may hold several newline-terminated lines; each is inspected on its
/// own and line terminators are preserved.
///
/// # Examples
/// ```
/// use mpdstat_core::redact::redact_secrets;
///
/// let output = redact_secrets("password \"my_secret\"\n");
/// assert!(!output.contains("my_secret"));
/// assert_eq!(output, "password [REDACTED]\n");
/// ```
pub fn redact_secrets(input: &str) -> Cow<'_, str> {
    if !contains_sensitive(input) {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len());
    for line in input.split_inclusive('\n') {
        let body = line.trim_end_matches(['\r', '\n']);
        let terminator = &line[body.len()..];
        match sensitive_command(body) {
            Some(command) => {
                result.push_str(command);
                result.push(' ');
                result.push_str(REDACTED);
            }
            None => result.push_str(body),
        }
        result.push_str(terminator);
    }
    Cow::Owned(result)
}

/// Check whether any line of `input` carries a secret argument.
pub fn contains_sensitive(input: &str) -> bool {
    input
        .split('\n')
        .any(|line| sensitive_command(line).is_some())
}

fn sensitive_command(line: &str) -> Option<&'static str> {
    let line = line.trim_start();
    let (command, rest) = line.split_once(|c: char| c == ' ' || c == '\t')?;
    if rest.trim().is_empty() {
        return None;
    }
    SENSITIVE_COMMANDS
        .iter()
        .copied()
        .find(|candidate| command.eq_ignore_ascii_case(candidate))
}
