/// Voice intent provider.
///
/// The game asks for a direction only when the record action fires, and the
/// call blocks until the external classifier answers. Any failure along the
/// way is logged and reads as `DirectionIntent::None`.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, warn};

use crate::config::VoiceConfig;
use crate::domain::entity::DirectionIntent;

/// How often a running classifier is checked for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub trait DirectionClassifier {
    fn classify(&mut self) -> DirectionIntent;

    /// Shown on the HUD next to the last answer.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Voice input turned off: every request answers None.
pub struct Disabled;

impl DirectionClassifier for Disabled {
    fn classify(&mut self) -> DirectionIntent {
        DirectionIntent::None
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Runs `program args..` and reads the transcript from its stdout.
/// A run that outlasts `timeout` is killed.
pub struct CommandClassifier {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandClassifier {
    pub fn new(program: String, args: Vec<String>, timeout: Duration) -> Self {
        CommandClassifier { program, args, timeout }
    }

    fn transcript(&self) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to run {}", self.program))?;

        // Stdout is read concurrently: a full pipe would block the child.
        let mut stdout = child.stdout.take().ok_or_else(|| anyhow!("classifier stdout not captured"))?;
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });

        let status = self.wait_with_deadline(&mut child)?;
        if !status.success() {
            bail!("{} exited with {}", self.program, status);
        }
        let bytes = reader
            .join()
            .map_err(|_| anyhow!("classifier output reader panicked"))?
            .context("reading classifier output")?;
        String::from_utf8(bytes).context("classifier output is not UTF-8")
    }

    fn wait_with_deadline(&self, child: &mut Child) -> Result<std::process::ExitStatus> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait().context("waiting for classifier")? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                bail!("{} gave no answer within {:?}", self.program, self.timeout);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl DirectionClassifier for CommandClassifier {
    fn classify(&mut self) -> DirectionIntent {
        match self.transcript() {
            Ok(text) => {
                let intent = parse_transcript(&text);
                if intent == DirectionIntent::None {
                    warn!(transcript = %text.trim(), "no direction in transcript");
                } else {
                    debug!(transcript = %text.trim(), intent = intent.label(), "classified");
                }
                intent
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "voice classifier failed");
                DirectionIntent::None
            }
        }
    }
}

const KEYWORDS: &[(&str, DirectionIntent)] = &[
    ("up", DirectionIntent::Up),
    ("jump", DirectionIntent::Up),
    ("上", DirectionIntent::Up),
    ("left", DirectionIntent::Left),
    ("左", DirectionIntent::Left),
    ("right", DirectionIntent::Right),
    ("右", DirectionIntent::Right),
];

/// Map a transcript to a direction; the keyword that appears first wins.
/// ASCII keywords only count as whole words.
pub fn parse_transcript(text: &str) -> DirectionIntent {
    let lower = text.to_lowercase();
    KEYWORDS
        .iter()
        .filter_map(|&(word, intent)| find_keyword(&lower, word).map(|pos| (pos, intent)))
        .min_by_key(|&(pos, _)| pos)
        .map(|(_, intent)| intent)
        .unwrap_or(DirectionIntent::None)
}

/// Byte offset of the first occurrence of `word` in `text`. An ASCII
/// word must not touch other letters or digits on either side.
fn find_keyword(text: &str, word: &str) -> Option<usize> {
    if !word.is_ascii() {
        return text.find(word);
    }
    let is_word_char = |c: char| c.is_ascii_alphanumeric();
    text.match_indices(word).map(|(pos, _)| pos).find(|&pos| {
        let before = text[..pos].chars().next_back();
        let after = text[pos + word.len()..].chars().next();
        !before.map_or(false, is_word_char) && !after.map_or(false, is_word_char)
    })
}

pub fn from_config(cfg: &VoiceConfig) -> Box<dyn DirectionClassifier> {
    match cfg.command.split_first() {
        Some((program, args)) if !program.is_empty() => Box::new(CommandClassifier::new(
            program.clone(),
            args.to_vec(),
            Duration::from_secs(cfg.timeout_secs),
        )),
        _ => Box::new(Disabled),
    }
}
