use std::io::Write;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::ai::chat::{Session, chat_stream};
use crate::api::init_tracing;
use crate::core::AppConfig;
use crate::openai::OpenAiClient;

/// Interactive chat in the terminal. Replies are printed as they
/// stream in.
pub async fn run(config: AppConfig) -> Result<()> {
    init_tracing();

    let mut rl = DefaultEditor::new()?;
    let client = OpenAiClient::new(&config);
    let mut session = Session::new(&config.system_message, config.max_turns);

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                rl.add_history_entry(line.as_str())?;

                let (tx, mut rx) = mpsc::unbounded_channel::<String>();
                let printer = tokio::spawn(async move {
                    let mut stdout = std::io::stdout();
                    while let Some(fragment) = rx.recv().await {
                        let _ = write!(stdout, "{}", fragment);
                        let _ = stdout.flush();
                    }
                    let _ = writeln!(stdout);
                });

                let result =
                    chat_stream(&client, &mut session, &line, &tx, &CancellationToken::new())
                        .await;
                drop(tx);
                printer.await?;

                if let Err(e) = result {
                    println!("Error: {}", e);
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
