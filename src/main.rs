use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use file_sync::{
    config::Config, filter_by_group, format_relative_time, format_size, FileClient, FileRecord,
    HttpTransport, Permission, SessionToken, UploadSource,
};

#[derive(Debug, Parser)]
#[command(
    name = "file-sync",
    version,
    about = "Transfer and share files against a files + groups backend"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List files owned by the caller
    List,
    /// List group-shared files, optionally a single group's
    Groups { group_id: Option<i64> },
    /// Upload one or more files, optionally sharing them into a group
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Share each uploaded file into this group at READ permission
        #[arg(long)]
        group: Option<i64>,
    },
    /// Download a file's contents
    Get { file_id: String, output: PathBuf },
    /// Delete an owned file
    Delete { file_id: String },
    /// Share an existing file into a group
    Share { file_id: String, group_id: i64 },
    /// Remove a group association, keeping the file
    Unshare { file_id: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let config = Config::load()?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.base_url,
        "file-sync starting"
    );

    let tokens = Arc::new(SessionToken::new());
    if let Some(ref token) = config.token {
        tokens.set(token.clone());
    }

    let transport = HttpTransport::new(
        &config.base_url,
        tokens,
        config.request_timeout,
        config.upload_chunk_size,
    )
    .map_err(|e| anyhow::anyhow!("failed to build transport: {e}"))?;
    let client = FileClient::new(Arc::new(transport));

    match cli.command.unwrap_or(Command::List) {
        Command::List => {
            let files = client.list_personal_files().await?;
            print_files(&files);
        }
        Command::Groups { group_id } => {
            let files = client.list_group_files().await?;
            match group_id {
                Some(group_id) => print_files(&filter_by_group(&files, group_id)),
                None => print_files(&files),
            }
        }
        Command::Upload { paths, group } => {
            let mut sources = Vec::with_capacity(paths.len());
            for path in &paths {
                let data = tokio::fs::read(path).await?;
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| path.display().to_string());
                sources.push(UploadSource::new(name, data));
            }

            let progress: file_sync::BatchProgressFn = Box::new(|name: &str, pct: u32| {
                eprintln!("{name}: {pct}%");
            });
            let uploaded = client.upload_many(sources, Some(progress), group).await?;
            print_files(&uploaded);
        }
        Command::Get { file_id, output } => {
            let data = client.download(&file_id).await?;
            tokio::fs::write(&output, &data).await?;
            println!("{} ({})", output.display(), format_size(data.len() as u64));
        }
        Command::Delete { file_id } => {
            client.delete_personal(&file_id).await?;
            println!("deleted {file_id}");
        }
        Command::Share { file_id, group_id } => {
            client
                .share_existing(&file_id, group_id, Permission::Read)
                .await?;
            println!("shared {file_id} to group {group_id}");
        }
        Command::Unshare { file_id } => {
            client.unshare(&file_id).await?;
            println!("unshared {file_id}");
        }
    }

    Ok(())
}

fn print_files(files: &[FileRecord]) {
    let now = Utc::now();
    for file in files {
        let group = file
            .group_id
            .map(|g| format!("  group {g}"))
            .unwrap_or_default();
        println!(
            "{}  {:?}  {}  {}{}",
            file.id,
            file.kind,
            format_size(file.size_bytes),
            format_relative_time(file.uploaded_at, now),
            group
        );
        println!("    {}", file.name);
    }
    println!("{} file(s)", files.len());
}
