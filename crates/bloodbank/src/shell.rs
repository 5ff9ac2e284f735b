//! Interactive shell.
//!
//! Each line is parsed with the same command definitions as the one-shot CLI.
//! The desk keeps its patient view between lines, so `patient check` followed
//! by `patient submit` walks the availability gate the way the forms do.
//! Toasts are printed as they appear and expire on the runtime's timers.

use std::io::Write;

use clap::Parser;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::cli::{print_toasts, Command, DonorCommand, Session, ShellLine, RESET_PROMPT};
use crate::desk::REMOVE_DONOR_PROMPT;
use crate::error::Result;
use crate::storage::KeyValueStore;

const PROMPT: &str = "bloodbank> ";
const BANNER: &str = "bloodbank shell. Type `help` for commands, `exit` to leave.";

/// A line that could not be split into words.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// A quote was opened and never closed.
    #[error("unterminated {0} quote")]
    UnterminatedQuote(char),
    /// The line ended with a lone backslash.
    #[error("trailing backslash")]
    TrailingEscape,
}

/// Split a line into words.
///
/// Whitespace separates words. Single quotes keep their content literally,
/// double quotes allow `\"` and `\\`, and a backslash outside quotes escapes
/// the next character.
///
/// # Errors
///
/// Returns an error for an unbalanced quote or a trailing backslash.
pub fn tokenize(line: &str) -> std::result::Result<Vec<String>, TokenizeError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(TokenizeError::UnterminatedQuote('\'')),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(TokenizeError::UnterminatedQuote('"')),
                        },
                        Some(c) => current.push(c),
                        None => return Err(TokenizeError::UnterminatedQuote('"')),
                    }
                }
            }
            '\\' => {
                in_word = true;
                current.push(chars.next().ok_or(TokenizeError::TrailingEscape)?);
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// A destructive command waiting for a yes/no answer on the next line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    RemoveDonor(u64),
    Reset,
}

impl Pending {
    fn prompt(self) -> &'static str {
        match self {
            Self::RemoveDonor(_) => REMOVE_DONOR_PROMPT,
            Self::Reset => RESET_PROMPT,
        }
    }

    fn into_command(self) -> Command {
        match self {
            Self::RemoveDonor(id) => Command::Donor(DonorCommand::Remove { id, yes: false }),
            Self::Reset => Command::Reset { yes: false },
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Run the shell on stdin and stdout until `exit` or end of input.
///
/// # Errors
///
/// Returns an error if the runtime cannot start, the store fails, or the
/// terminal cannot be read or written.
pub fn run<S: KeyValueStore>(session: &mut Session<S>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .enable_io()
        .build()?;

    runtime.block_on(async {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        run_lines(session, stdin, &mut stdout, true).await
    })
}

/// Drive a session from `input`, writing everything to `out`.
///
/// # Errors
///
/// Returns an error if the store fails or `input`/`out` fail.
pub async fn run_lines<S, R>(
    session: &mut Session<S>,
    input: R,
    out: &mut dyn Write,
    interactive: bool,
) -> Result<()>
where
    S: KeyValueStore,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut pending: Option<Pending> = None;
    let mut last_toast = 0;

    if interactive {
        writeln!(out, "{BANNER}")?;
    }

    loop {
        if interactive {
            write!(out, "{PROMPT}")?;
            out.flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };

        if let Some(waiting) = pending.take() {
            let answer = is_yes(&line);
            debug!(?waiting, answer, "Confirmation answered");
            session.execute(waiting.into_command(), out, &mut |_: &str| answer)?;
        } else {
            match step(session, &line, out)? {
                Step::Continue => {}
                Step::Ask(waiting) => {
                    writeln!(out, "{} [y/N]", waiting.prompt())?;
                    pending = Some(waiting);
                }
                Step::Exit => break,
            }
        }

        let fresh: Vec<_> = session
            .desk()
            .notifier()
            .active()
            .into_iter()
            .filter(|t| t.id > last_toast)
            .collect();
        if let Some(newest) = fresh.last() {
            last_toast = newest.id;
        }
        print_toasts(&fresh, out)?;
    }
    Ok(())
}

enum Step {
    Continue,
    Ask(Pending),
    Exit,
}

fn step<S: KeyValueStore>(
    session: &mut Session<S>,
    line: &str,
    out: &mut dyn Write,
) -> Result<Step> {
    let words = match tokenize(line) {
        Ok(words) => words,
        Err(e) => {
            writeln!(out, "error: {e}")?;
            return Ok(Step::Continue);
        }
    };
    match words.first().map(String::as_str) {
        None => return Ok(Step::Continue),
        Some("exit" | "quit") => return Ok(Step::Exit),
        Some(_) => {}
    }

    let command = match ShellLine::try_parse_from(&words) {
        Ok(parsed) => parsed.command,
        Err(e) => {
            write!(out, "{}", e.render())?;
            return Ok(Step::Continue);
        }
    };

    match command {
        Command::Donor(DonorCommand::Remove { id, yes: false }) => {
            Ok(Step::Ask(Pending::RemoveDonor(id)))
        }
        Command::Reset { yes: false } => Ok(Step::Ask(Pending::Reset)),
        command => {
            let mut refuse = |_: &str| false;
            match session.execute(command, out, &mut refuse) {
                Ok(()) => Ok(Step::Continue),
                Err(e) if e.is_storage_error() => Err(e),
                Err(e) => {
                    writeln!(out, "error: {e}")?;
                    Ok(Step::Continue)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::desk::FrontDesk;
    use crate::notify::Notifier;
    use crate::storage::MemoryStore;

    fn session() -> Session<MemoryStore> {
        Session::new(
            Config::default(),
            FrontDesk::new(MemoryStore::new(), Notifier::default()),
        )
    }

    async fn feed(session: &mut Session<MemoryStore>, script: &str) -> String {
        let mut out = Vec::new();
        run_lines(session, script.as_bytes(), &mut out, false)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_tokenize_plain_words() {
        assert_eq!(
            tokenize("  donor   add -n Ada ").unwrap(),
            ["donor", "add", "-n", "Ada"]
        );
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(
            tokenize(r#"-n "Ada Lovelace" -H 'St. Mary'"#).unwrap(),
            ["-n", "Ada Lovelace", "-H", "St. Mary"]
        );
        assert_eq!(tokenize(r#"say "a \"b\" c""#).unwrap(), ["say", r#"a "b" c"#]);
        assert_eq!(tokenize("-n ''").unwrap(), ["-n", ""]);
        assert_eq!(tokenize(r"O\ Neg").unwrap(), ["O Neg"]);
    }

    #[test]
    fn test_tokenize_errors() {
        assert_eq!(
            tokenize("-n \"Ada").unwrap_err(),
            TokenizeError::UnterminatedQuote('"')
        );
        assert_eq!(
            tokenize("-n 'Ada").unwrap_err(),
            TokenizeError::UnterminatedQuote('\'')
        );
        assert_eq!(tokenize("abc\\").unwrap_err(), TokenizeError::TrailingEscape);
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("nope"));
    }

    #[tokio::test]
    async fn test_check_then_submit_walks_the_gate() {
        let mut session = session();
        let text = feed(
            &mut session,
            "donor add -n Ada -b A+ -u 5\n\
             patient submit -n Pat -H General -b A+ -u 1\n\
             patient check -b A+ -u 3\n\
             patient submit -n \"Pat Doe\" -H General\n",
        )
        .await;

        assert!(text.contains("[success] Donor added successfully!"));
        assert!(text.contains("[error] Check availability first."));
        assert!(text.contains("[success] Blood available!"));
        assert!(text.contains("[success] Patient added successfully!"));

        let patients = session.desk().store().patients().unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].name, "Pat Doe");
        assert_eq!(patients[0].units, 3);
    }

    #[tokio::test]
    async fn test_failed_recheck_blocks_stale_intake() {
        let mut session = session();
        let text = feed(
            &mut session,
            "donor add -n Ada -b A+ -u 5\n\
             patient check -b A+ -u 1\n\
             patient check -b B+ -u 9\n\
             patient submit -n Pat -H General\n",
        )
        .await;

        assert!(text.contains("Required blood not available."));
        assert!(text.contains("[error] Check availability first."));
        assert!(!text.contains("Patient Pat recorded"));
        assert!(session.desk().store().patients().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toasts_print_once() {
        let mut session = session();
        let text = feed(&mut session, "donor add -n Ada -b O- -u 1\ndashboard\n").await;
        assert_eq!(text.matches("Donor added successfully!").count(), 1);
    }

    #[tokio::test]
    async fn test_remove_waits_for_answer() {
        let mut session = session();
        feed(&mut session, "donor add -n Ada -b A+ -u 5\n").await;
        let id = session.desk().store().donors().unwrap()[0].id;

        let text = feed(&mut session, &format!("donor remove {id}\nn\n")).await;
        assert!(text.contains("Are you sure to remove donor? [y/N]"));
        assert!(text.contains(&format!("Kept donor {id}.")));
        assert_eq!(session.desk().store().donors().unwrap().len(), 1);

        let text = feed(&mut session, &format!("donor remove {id}\ny\n")).await;
        assert!(text.contains("[warn] Donor removed."));
        assert!(session.desk().store().donors().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_waits_for_answer() {
        let mut session = session();
        let text = feed(
            &mut session,
            "donor add -n Ada -b A+ -u 5\nreset\nyes\n",
        )
        .await;
        assert!(text.contains("All records removed."));
        assert!(session.desk().store().donors().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_lines_do_not_end_the_session() {
        let mut session = session();
        let text = feed(
            &mut session,
            "frobnicate\n-n \"open\nshell\ndonor add -n Ada -b B+ -u 2\n",
        )
        .await;
        assert!(text.contains("error: unterminated \" quote"));
        assert!(text.contains("Already in a shell."));
        assert_eq!(session.desk().store().donors().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exit_stops_reading() {
        let mut session = session();
        feed(&mut session, "exit\ndonor add -n Ada -b A+ -u 5\n").await;
        assert!(session.desk().store().donors().unwrap().is_empty());
    }
}
