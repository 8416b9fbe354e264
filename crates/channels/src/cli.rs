//! CLI channel: interactive terminal input.
//!
//! Reads one line at a time from stdin (or any buffered reader) and
//! classifies it. Lines are pulled on demand, so the next query is only read
//! after the caller has finished with the previous one.

use thiserror::Error;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

/// Words that end the session, compared case-insensitively after trimming.
pub const EXIT_WORDS: [&str; 3] = ["exit", "quit", "q"];

/// One classified line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    /// A query to hand to the agent, already trimmed.
    Query(String),
    /// A blank line. The caller warns and prompts again.
    Empty,
    /// An exit word.
    Exit,
}

impl InputLine {
    pub fn classify(raw: &str) -> Self {
        let line = raw.trim();
        if line.is_empty() {
            InputLine::Empty
        } else if EXIT_WORDS.iter().any(|w| line.eq_ignore_ascii_case(w)) {
            InputLine::Exit
        } else {
            InputLine::Query(line.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Input stream lost: {0}")]
    ConnectionLost(String),
}

/// Interactive CLI channel for terminal-based chat.
pub struct CliChannel<R = BufReader<Stdin>> {
    lines: Lines<R>,
}

impl CliChannel {
    /// A channel reading from the process's stdin.
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> CliChannel<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// Read and classify the next line. End of input (Ctrl+D) is reported
    /// as [`InputLine::Exit`].
    pub async fn next_input(&mut self) -> Result<InputLine, ChannelError> {
        match self.lines.next_line().await {
            Ok(Some(line)) => Ok(InputLine::classify(&line)),
            Ok(None) => {
                debug!("Input closed");
                Ok(InputLine::Exit)
            }
            Err(e) => Err(ChannelError::ConnectionLost(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_words_are_case_insensitive() {
        for word in ["exit", "QUIT", "Q", "  Exit  "] {
            assert_eq!(InputLine::classify(word), InputLine::Exit, "{word}");
        }
        assert_eq!(
            InputLine::classify("quit now"),
            InputLine::Query("quit now".into())
        );
    }

    #[test]
    fn blank_lines_are_empty() {
        assert_eq!(InputLine::classify(""), InputLine::Empty);
        assert_eq!(InputLine::classify(" \t "), InputLine::Empty);
    }

    #[tokio::test]
    async fn reads_lines_in_order_then_exits_on_eof() {
        let input: &[u8] = b"what is weather of Patiala?\n\n  list files  \n";
        let mut channel = CliChannel::from_reader(input);

        assert_eq!(
            channel.next_input().await.unwrap(),
            InputLine::Query("what is weather of Patiala?".into())
        );
        assert_eq!(channel.next_input().await.unwrap(), InputLine::Empty);
        assert_eq!(
            channel.next_input().await.unwrap(),
            InputLine::Query("list files".into())
        );
        assert_eq!(channel.next_input().await.unwrap(), InputLine::Exit);
    }
}
