//! The match log: an optional append-only text record of notable rounds.
//!
//! Nothing is written for a quiet round. The first entry of a round is
//! preceded by a `[R<n>]` header. Every entry is mirrored as a `tracing`
//! debug event whether or not a sink is attached.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Forfeit, MatchError};

/// Append-only match log.
pub struct MatchLog {
    sink: Option<Box<dyn Write + Send>>,
    round: u32,
    header_written: bool,
}

impl MatchLog {
    /// A log without a sink. Entries only reach `tracing`.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            sink: None,
            round: 0,
            header_written: false,
        }
    }

    /// A log writing to `sink`.
    #[must_use]
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Some(Box::new(sink)),
            ..Self::disabled()
        }
    }

    /// A log writing to a freshly created file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Io`] if the file cannot be created.
    pub fn to_file(path: &Path) -> Result<Self, MatchError> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }

    /// Whether a sink is attached.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Start a new round. The header is only written if an entry follows.
    pub fn begin_round(&mut self, round: u32) {
        self.round = round;
        self.header_written = false;
    }

    /// Append one entry made of several lines.
    pub fn entry<I>(&mut self, lines: I)
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        let lines: Vec<String> = lines.into_iter().map(|l| l.to_string()).collect();
        debug!(round = self.round, "{}", lines.join(" | "));

        let Some(sink) = self.sink.as_mut() else {
            return;
        };

        let mut block = String::new();
        if !self.header_written {
            block.push_str(&format!("[R{}]\n", self.round));
            self.header_written = true;
        }
        for line in &lines {
            block.push_str(line);
            block.push('\n');
        }

        if let Err(e) = sink.write_all(block.as_bytes()).and_then(|()| sink.flush()) {
            warn!(error = %e, "match log write failed, detaching sink");
            self.sink = None;
        }
    }

    /// Record the start of the match.
    pub fn game_start(&mut self, names: &[&str]) {
        self.entry(["[GAME START]".to_string(), format!("BOTS: {}", names.join(", "))]);
    }

    /// Record a forfeited move.
    pub fn forfeit(&mut self, name: &str, forfeit: &Forfeit) {
        const FORFEIT_NOTICE: &str = "Your bot will forfeit its turn.";
        match forfeit {
            Forfeit::Timeout {
                elapsed,
                late_reply,
            } => {
                let mut lines = vec![
                    format!("{name} is taking too long."),
                    FORFEIT_NOTICE.to_string(),
                    format!("time: {:.3} ms", elapsed.as_secs_f64() * 1000.0),
                ];
                if let Some(reply) = late_reply {
                    lines.push(format!("move: {reply:?}"));
                }
                self.entry(lines);
            }
            Forfeit::Fault { message } => {
                self.entry([
                    format!("{name} has thrown an error."),
                    FORFEIT_NOTICE.to_string(),
                    message.clone(),
                ]);
            }
            Forfeit::Illegal { attempted } => {
                self.entry([
                    format!("{name} has made an illegal move."),
                    format!("move: {attempted:?}"),
                ]);
            }
        }
    }

    /// Record text an agent wrote to its console.
    pub fn printed(&mut self, name: &str, text: &str) {
        if text.is_empty() {
            return;
        }
        self.entry([format!("{name} has printed:"), text.trim_end().to_string()]);
    }

    /// Record an elimination.
    pub fn eliminated(&mut self, name: &str) {
        self.entry([format!("{name} ELIMINATED")]);
    }

    /// Record the final scores.
    pub fn game_over(&mut self, results: &[(&str, u32)]) {
        let lines = ["[GAME OVER]".to_string(), "SCORES:".to_string()]
            .into_iter()
            .chain(results.iter().map(|(name, score)| format!("{name}: {score}")));
        self.entry(lines);
    }
}

impl Default for MatchLog {
    fn default() -> Self {
        Self::disabled()
    }
}

impl fmt::Debug for MatchLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchLog")
            .field("enabled", &self.is_enabled())
            .field("round", &self.round)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// In-memory sink that can be read back after the log took ownership.
    #[derive(Clone, Default)]
    pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_header_only_on_first_entry() {
        let buffer = SharedBuffer::default();
        let mut log = MatchLog::new(buffer.clone());

        log.begin_round(0);
        log.begin_round(1);
        log.eliminated("Pass Perth");
        log.eliminated("Random Rizhao");
        log.begin_round(2);

        assert_eq!(
            buffer.contents(),
            "[R1]\nPass Perth ELIMINATED\nRandom Rizhao ELIMINATED\n"
        );
    }

    #[test]
    fn test_forfeit_wording() {
        let buffer = SharedBuffer::default();
        let mut log = MatchLog::new(buffer.clone());
        log.begin_round(4);
        log.forfeit(
            "Sleepy",
            &Forfeit::Timeout {
                elapsed: Duration::from_millis(120),
                late_reply: None,
            },
        );
        log.forfeit(
            "Crashy",
            &Forfeit::Fault {
                message: "boom".to_string(),
            },
        );
        log.forfeit(
            "Lost",
            &Forfeit::Illegal {
                attempted: [[-1, 4], [4, 3]],
            },
        );
        let text = buffer.contents();
        assert!(text.starts_with("[R4]\n"));
        assert!(text.contains("Lost has made an illegal move.\nmove: [[-1, 4], [4, 3]]\n"));
        assert!(text.contains("Sleepy is taking too long."));
        assert!(text.contains("time: 120.000 ms"));
        assert!(text.contains("Crashy has thrown an error."));
        assert!(text.contains("boom"));
    }

    #[test]
    fn test_game_over_block() {
        let buffer = SharedBuffer::default();
        let mut log = MatchLog::new(buffer.clone());
        log.begin_round(12);
        log.game_over(&[("A", 800), ("B", 3)]);
        assert_eq!(buffer.contents(), "[R12]\n[GAME OVER]\nSCORES:\nA: 800\nB: 3\n");
    }

    #[test]
    fn test_printed_skips_empty() {
        let buffer = SharedBuffer::default();
        let mut log = MatchLog::new(buffer.clone());
        log.printed("Quiet", "");
        assert!(buffer.contents().is_empty());
        log.printed("Chatty", "hi\nthere\n");
        assert_eq!(buffer.contents(), "[R0]\nChatty has printed:\nhi\nthere\n");
    }

    #[test]
    fn test_broken_sink_detaches() {
        let mut log = MatchLog::new(BrokenSink);
        assert!(log.is_enabled());
        log.eliminated("X");
        assert!(!log.is_enabled());
    }
}
