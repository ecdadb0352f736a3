//! Line-based terminal prompts.
//!
//! End of input (Ctrl-D) dismisses a prompt.

use ezupload_transfer::{InputRequest, OverwriteChoice, PromptFuture, Prompter};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

/// [`Prompter`] reading answers line by line.
pub struct TerminalPrompter<R, W> {
    io: Mutex<(R, W)>,
}

impl TerminalPrompter<BufReader<tokio::io::Stdin>, tokio::io::Stderr> {
    /// Prompts on stderr and reads stdin.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stderr())
    }
}

impl<R, W> TerminalPrompter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
        }
    }

    /// Writes `text` and reads one line. `None` on end of input.
    async fn ask(&self, text: &str) -> Option<String> {
        let mut io = self.io.lock().await;
        let (reader, writer) = &mut *io;
        if let Err(e) = writer.write_all(text.as_bytes()).await {
            tracing::warn!("prompt write failed: {e}");
            return None;
        }
        let _ = writer.flush().await;

        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                tracing::warn!("prompt read failed: {e}");
                None
            }
        }
    }

    #[cfg(test)]
    async fn into_output(self) -> W {
        self.io.into_inner().1
    }
}

fn parse_overwrite(answer: &str) -> Option<OverwriteChoice> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "o" | "overwrite" => Some(OverwriteChoice::Overwrite),
        "s" | "skip" => Some(OverwriteChoice::Skip),
        _ => None,
    }
}

impl<R, W> Prompter for TerminalPrompter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn confirm_overwrite<'a>(&'a self, name: &'a str) -> PromptFuture<'a, Option<OverwriteChoice>> {
        Box::pin(async move {
            let text = format!("\"{name}\" already exists. Overwrite? [o]verwrite / [s]kip: ");
            self.ask(&text).await.as_deref().and_then(parse_overwrite)
        })
    }

    fn input<'a>(&'a self, request: InputRequest<'a>) -> PromptFuture<'a, Option<String>> {
        Box::pin(async move {
            let mut text = format!("{}\n{}\n", request.title, request.prompt);
            if let Some(error) = request.error {
                text.push_str(&format!("  ! {error}\n"));
            }
            text.push_str(&format!("[{}] > ", request.value));

            let answer = self.ask(&text).await?;
            if answer.is_empty() {
                // Enter alone keeps the pre-filled value.
                Some(request.value.to_string())
            } else {
                Some(answer)
            }
        })
    }
}
