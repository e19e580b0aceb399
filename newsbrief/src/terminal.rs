//! Console presentation: the timestamped "node" log, the typewriter reveal and the
//! interactive prompt. Nothing here affects what the pipeline returns.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveTime};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::pipeline::{NewsOutcome, NewsPipeline, NewsResult};
use crate::topics::{default_topic, preset, strip_emoji, PRESET_TOPICS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ViewMode {
    /// Green-screen log with typewriter output
    #[default]
    Terminal,
    /// Plain Markdown and a numbered source list
    Modern,
}

impl ViewMode {
    pub fn toggle(self) -> Self {
        match self {
            ViewMode::Terminal => ViewMode::Modern,
            ViewMode::Modern => ViewMode::Terminal,
        }
    }

    /// Parse the `display.mode` config value.
    pub fn from_config(value: Option<&str>) -> Result<Self> {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("terminal") | Some("hacker") => Ok(ViewMode::Terminal),
            Some("modern") | Some("normal") => Ok(ViewMode::Modern),
            Some(other) => anyhow::bail!("Unknown display mode: {}", other),
        }
    }
}

/// Pace of the typewriter reveal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Typing {
    pub chars_per_tick: usize,
    pub tick: Duration,
}

impl Default for Typing {
    fn default() -> Self {
        Self {
            chars_per_tick: 3,
            tick: Duration::from_millis(5),
        }
    }
}

impl Typing {
    pub fn from_config(display: &common::DisplayConfig) -> Self {
        Self {
            chars_per_tick: display.typing_chars_per_tick(),
            tick: display.typing_tick(),
        }
    }
}

/// Split `text` into pieces of at most `chars_per_tick` characters, never inside a character.
pub fn typewriter_chunks(text: &str, chars_per_tick: usize) -> impl Iterator<Item = &str> + '_ {
    let step = chars_per_tick.max(1);
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let end = rest
            .char_indices()
            .nth(step)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}

/// Timestamped session log, `[HH:MM:SS] > message`
#[derive(Debug, Default)]
pub struct SessionLog {
    lines: Vec<String>,
}

impl SessionLog {
    pub fn push(&mut self, message: &str) -> &str {
        self.push_at(Local::now().time(), message)
    }

    pub fn push_at(&mut self, time: NaiveTime, message: &str) -> &str {
        self.lines
            .push(format!("[{}] > {}", time.format("%H:%M:%S"), message));
        self.lines.last().map(String::as_str).unwrap_or_default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// A line typed at the interactive prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    ToggleMode,
    Retry,
    Help,
    Topics,
    Search(String),
}

impl Command {
    /// `None` for blank input.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        let command = match trimmed.to_lowercase().as_str() {
            "exit" | "quit" | "logout" => Command::Exit,
            "gui" | "mode" => Command::ToggleMode,
            "retry" => Command::Retry,
            "help" => Command::Help,
            "topics" => Command::Topics,
            _ => match trimmed.parse::<usize>().ok().and_then(preset) {
                Some(topic) => Command::Search(topic.to_string()),
                None => Command::Search(trimmed.to_string()),
            },
        };
        Some(command)
    }
}

const HELP: &str = "\
COMMANDS:
  <text>       search news about <text>
  1-8          run a preset topic (see `topics`)
  topics       list preset topics
  retry        repeat the last search
  gui | mode   switch between terminal and modern view
  help         show this list
  exit | quit  end the session
";

/// Writes pipeline output in the selected view mode
pub struct Console<W> {
    out: W,
    mode: ViewMode,
    typing: Typing,
    log: SessionLog,
}

impl<W: AsyncWrite + Unpin> Console<W> {
    pub fn new(out: W, mode: ViewMode, typing: Typing) -> Self {
        Self {
            out,
            mode,
            typing,
            log: SessionLog::default(),
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.out
            .write_all(text.as_bytes())
            .await
            .context("Failed to write to console")?;
        self.out.flush().await.context("Failed to flush console")?;
        Ok(())
    }

    /// Record a log line; it is only echoed in terminal mode.
    pub async fn note(&mut self, message: &str) -> Result<()> {
        let line = self.log.push(message).to_string();
        if self.mode == ViewMode::Terminal {
            self.write(&format!("{}\n", line)).await?;
        }
        Ok(())
    }

    pub async fn boot(&mut self, topic: &str) -> Result<()> {
        self.note("INITIALIZING SYSTEM... OK").await?;
        self.note("CONNECTING TO TAIWAN NEWS NODE... ESTABLISHED").await?;
        self.note(&format!("LOADING PROTOCOL: {}", topic)).await
    }

    pub async fn searching(&mut self, topic: &str) -> Result<()> {
        match self.mode {
            ViewMode::Terminal => {
                self.note(&format!("[EXECUTING SEARCH QUERY]: {}...", topic))
                    .await
            }
            ViewMode::Modern => self.write(&format!("Searching \"{}\"...\n", topic)).await,
        }
    }

    pub async fn prompt(&mut self) -> Result<()> {
        match self.mode {
            ViewMode::Terminal => self.write("> ").await,
            ViewMode::Modern => self.write("topic> ").await,
        }
    }

    pub async fn help(&mut self) -> Result<()> {
        self.write(HELP).await
    }

    pub async fn topics(&mut self) -> Result<()> {
        let mut listing = String::new();
        for (i, topic) in PRESET_TOPICS.iter().enumerate() {
            match self.mode {
                ViewMode::Terminal => {
                    listing.push_str(&format!("  {}. RUN: {}\n", i + 1, strip_emoji(topic)))
                }
                ViewMode::Modern => listing.push_str(&format!("  {}. {}\n", i + 1, topic)),
            }
        }
        self.write(&listing).await
    }

    /// Render one pipeline outcome. Failures skip the typewriter effect.
    pub async fn show(&mut self, topic: &str, outcome: &NewsOutcome) -> Result<()> {
        match (self.mode, outcome) {
            (ViewMode::Terminal, NewsOutcome::Failure(kind)) => {
                self.note("[ERROR]: DATA STREAM INTERRUPTED.").await?;
                self.write(&format!("{}\n", kind.message())).await
            }
            (ViewMode::Terminal, NewsOutcome::Success(result)) => {
                self.note(&format!(
                    "[DATA RECEIVED]: {} - {} SOURCES FOUND.",
                    topic,
                    result.sources.len()
                ))
                .await?;
                self.note("[DECODING STREAM]...").await?;
                self.write(&format!(
                    "\nTOPIC: {}\nDATA_INTEGRITY: 100% | REGION: TW-ZH\n\n",
                    topic
                ))
                .await?;
                self.type_out(&result.summary).await?;
                self.write("\n").await?;
                self.note("[STREAM COMPLETE]").await?;
                self.terminal_sources(result).await
            }
            (ViewMode::Modern, outcome) => {
                let result = outcome.clone().into_result();
                self.write(&render_modern(topic, &result)).await
            }
        }
    }

    async fn type_out(&mut self, text: &str) -> Result<()> {
        let typing = self.typing;
        for chunk in typewriter_chunks(text, typing.chars_per_tick) {
            self.write(chunk).await?;
            if !typing.tick.is_zero() {
                tokio::time::sleep(typing.tick).await;
            }
        }
        Ok(())
    }

    async fn terminal_sources(&mut self, result: &NewsResult) -> Result<()> {
        if result.sources.is_empty() {
            return Ok(());
        }
        let mut block = String::from("\nVERIFIED LINKS\n");
        for (i, source) in result.sources.iter().enumerate() {
            block.push_str(&format!("[{:02}] {}\n     {}\n", i + 1, source.title, source.uri));
        }
        self.write(&block).await
    }
}

/// Modern view as a Markdown document.
pub fn render_modern(topic: &str, result: &NewsResult) -> String {
    let mut doc = format!("## {}\n\n{}\n", topic, result.summary.trim_end());
    if !result.sources.is_empty() {
        doc.push_str("\n### Sources\n\n");
        for (i, source) in result.sources.iter().enumerate() {
            doc.push_str(&format!("{}. [{}]({})\n", i + 1, source.title, source.uri));
        }
    }
    doc
}

/// Run one search and render it.
pub async fn search_and_show<W: AsyncWrite + Unpin>(
    pipeline: &NewsPipeline,
    console: &mut Console<W>,
    topic: &str,
) -> Result<NewsOutcome> {
    console.searching(topic).await?;
    let outcome = pipeline.fetch_outcome(topic).await;
    console.show(topic, &outcome).await?;
    Ok(outcome)
}

/// Interactive session: loads the default topic, then reads commands until `exit` or EOF.
pub async fn run_shell<R, W>(pipeline: &NewsPipeline, input: R, console: &mut Console<W>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut topic = default_topic().to_string();
    console.boot(&topic).await?;
    search_and_show(pipeline, console, &topic).await?;

    let mut lines = input.lines();
    loop {
        console.prompt().await?;
        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let Some(command) = Command::parse(&line) else {
            continue;
        };
        debug!(?command, "shell command");

        match command {
            Command::Exit => {
                console.note("TERMINATING SESSION...").await?;
                break;
            }
            Command::ToggleMode => {
                let mode = console.mode().toggle();
                console.set_mode(mode);
                console.note(&format!("VIEW MODE: {:?}", mode)).await?;
            }
            Command::Help => console.help().await?,
            Command::Topics => console.topics().await?,
            Command::Retry => {
                search_and_show(pipeline, console, &topic).await?;
            }
            Command::Search(next) => {
                topic = next;
                search_and_show(pipeline, console, &topic).await?;
            }
        }
    }
    Ok(())
}
