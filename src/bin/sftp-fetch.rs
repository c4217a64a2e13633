// Copyright 2025 Lablup Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use sftp_fetch::logging::init_logging;
use sftp_fetch::{Config, FileLoader, FuzzyMatchLoader};

#[derive(Parser, Debug)]
#[command(
    name = "sftp-fetch",
    version,
    about = "Fetch a remote file over SFTP by filename prefix",
    long_about = "sftp-fetch resolves a filename prefix against a remote SFTP directory listing\nand downloads the matching file. When several files share the prefix, the\nlexicographically greatest name wins, which picks the newest date-suffixed export."
)]
struct Cli {
    /// Filename prefix to resolve on the remote server
    prefix: String,

    #[arg(
        short = 'c',
        long,
        default_value = "sftp-fetch.yaml",
        help = "Configuration file path"
    )]
    config: PathBuf,

    #[arg(
        short = 'o',
        long,
        help = "Write the file here instead of stdout (named after the resolved file when a directory)"
    )]
    output: Option<PathBuf>,

    #[arg(long, help = "Decode the file as UTF-8 and fail on invalid content")]
    text: bool,

    #[arg(short = 'v', long, action = clap::ArgAction::Count, help = "Increase verbosity (-v, -vv, -vvv)")]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = Config::load(&cli.config).await?;
    let manager = Arc::new(config.connection_manager()?);
    let loader = FuzzyMatchLoader::with_options(manager, config.loader_options());

    let (bytes, file_name) = if cli.text {
        let content = loader.load_file_as_text(&cli.prefix).await?;
        let (text, file_name) = content.into_parts();
        (text.into_bytes(), file_name)
    } else {
        let content = loader.load_file_as_stream(&cli.prefix).await?;
        let (mut stream, file_name) = content.into_parts();

        let mut bytes = Vec::new();
        stream
            .read_to_end(&mut bytes)
            .await
            .with_context(|| format!("Failed to read remote file '{file_name}'"))?;
        (bytes, file_name)
    };

    tracing::info!("Resolved '{}' to remote file '{}'", cli.prefix, file_name);

    match cli.output {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(&file_name)
            } else {
                path
            };
            tokio::fs::write(&path, &bytes)
                .await
                .with_context(|| format!("Failed to write {path:?}"))?;
            eprintln!("{} -> {}", file_name, path.display());
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&bytes).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}
