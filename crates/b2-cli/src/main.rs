//! b2 - command-line client for Backblaze B2 cloud storage

use anyhow::{bail, Context};
use b2_client::{Bucket, BucketType, Config, ListFileNamesRequest, Session, DEFAULT_AUTH_URL};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "b2")]
#[command(about = "Command-line client for Backblaze B2 cloud storage")]
#[command(version)]
struct Args {
    /// Account id (or application key id)
    #[arg(long, env = "B2_ACCOUNT_ID")]
    account_id: String,

    /// Application key
    #[arg(long, env = "B2_APPLICATION_KEY", hide_env_values = true)]
    application_key: String,

    /// Authorization host
    #[arg(long, default_value = DEFAULT_AUTH_URL, env = "B2_AUTH_URL")]
    auth_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "30", env = "B2_TIMEOUT_SECS")]
    timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long, env = "B2_DEBUG")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and print the account's base URLs
    Authorize,

    /// List every bucket on the account
    ListBuckets,

    /// Create a bucket
    CreateBucket {
        name: String,
        /// allPublic, allPrivate, share or snapshot
        #[arg(long = "type", default_value = "allPrivate")]
        bucket_type: BucketType,
    },

    /// Change a bucket's access level
    SetType {
        bucket: String,
        bucket_type: BucketType,
    },

    /// List one page of file names
    ListFiles {
        bucket: String,
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        delimiter: Option<String>,
        /// Continue from this file name
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        max: Option<u32>,
    },

    /// Upload a local file
    Upload {
        bucket: String,
        path: PathBuf,
        /// Name to store the file under; defaults to the local file name
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Download a file by id
    Download { file_id: String, output: PathBuf },

    /// Hide a file from name listings
    Hide { bucket: String, file_name: String },

    /// Show metadata for one file version
    FileInfo { file_id: String },

    /// Permanently delete one file version
    DeleteVersion { file_name: String, file_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logs go to stderr so stdout stays parseable
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("b2_client={},b2={}", log_level, log_level).into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::new(&args.auth_url).with_timeout(Duration::from_secs(args.timeout_secs));
    let session = Session::with_config(&args.account_id, &args.application_key, config)?;
    session.authorize().await.context("authorization failed")?;
    tracing::debug!(api_url = ?session.api_url(), "Session ready");

    run(&session, args.command).await
}

async fn run(session: &Session, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Authorize => {
            print_json(&serde_json::json!({
                "accountId": session.account_id(),
                "apiUrl": session.api_url(),
                "downloadUrl": session.download_url(),
                "recommendedPartSize": session.recommended_part_size(),
                "absoluteMinimumPartSize": session.absolute_minimum_part_size(),
                "allowed": session.allowed(),
            }))?;
        }
        Command::ListBuckets => {
            for bucket in session.list_buckets().await? {
                println!("{}", bucket);
            }
        }
        Command::CreateBucket { name, bucket_type } => {
            let bucket = session.create_bucket_with_type(&name, bucket_type).await?;
            println!("{}", bucket);
        }
        Command::SetType { bucket, bucket_type } => {
            let mut bucket = find_bucket(session, &bucket).await?;
            bucket.set_type(bucket_type).await?;
            println!("{}", bucket);
        }
        Command::ListFiles {
            bucket,
            prefix,
            delimiter,
            start,
            max,
        } => {
            let bucket = find_bucket(session, &bucket).await?;
            let request = ListFileNamesRequest {
                start_file_name: start,
                max_file_count: max,
                prefix,
                delimiter,
            };
            print_json(&bucket.list_file_names(&request).await?)?;
        }
        Command::Upload {
            bucket,
            path,
            name,
            content_type,
        } => {
            let bucket = find_bucket(session, &bucket).await?;
            let uploaded = match content_type {
                Some(content_type) => {
                    let name = match name {
                        Some(name) => name,
                        None => local_file_name(&path)?,
                    };
                    let data = tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("reading {}", path.display()))?;
                    bucket.upload(data, &name, Some(&content_type), None).await?
                }
                None => bucket.upload_file(&path, name.as_deref()).await?,
            };
            print_json(&uploaded)?;
        }
        Command::Download { file_id, output } => {
            let file = session.download_file_by_id(&file_id).await?;
            tokio::fs::write(&output, &file.data)
                .await
                .with_context(|| format!("writing {}", output.display()))?;
            eprintln!("{} bytes written to {}", file.content_length, output.display());
        }
        Command::Hide { bucket, file_name } => {
            let bucket = find_bucket(session, &bucket).await?;
            print_json(&bucket.hide_file(&file_name).await?)?;
        }
        Command::FileInfo { file_id } => {
            print_json(&session.get_file_info(&file_id).await?)?;
        }
        Command::DeleteVersion { file_name, file_id } => {
            print_json(&session.delete_file_version(&file_name, &file_id).await?)?;
        }
    }

    Ok(())
}

async fn find_bucket(session: &Session, name: &str) -> anyhow::Result<Bucket> {
    match session.bucket_named(name).await? {
        Some(bucket) => Ok(bucket),
        None => bail!("no bucket named {}", name),
    }
}

fn local_file_name(path: &std::path::Path) -> anyhow::Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .with_context(|| format!("no usable file name in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const CREDENTIALS: [&str; 5] = ["b2", "--account-id", "a", "--application-key", "k"];

    fn parse(rest: &[&str]) -> Args {
        let argv: Vec<&str> = CREDENTIALS.iter().chain(rest.iter()).copied().collect();
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_create_bucket_defaults_to_private() {
        let args = parse(&["create-bucket", "photos"]);
        match args.command {
            Command::CreateBucket { name, bucket_type } => {
                assert_eq!(name, "photos");
                assert_eq!(bucket_type, BucketType::AllPrivate);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(args.auth_url, DEFAULT_AUTH_URL);
    }

    #[test]
    fn test_set_type_rejects_unknown_type() {
        let argv: Vec<&str> = CREDENTIALS
            .iter()
            .chain(["set-type", "photos", "public"].iter())
            .copied()
            .collect();
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_create_bucket_rejects_misspelt_type() {
        let argv: Vec<&str> = CREDENTIALS
            .iter()
            .chain(["create-bucket", "photos", "--type", "allPrivat"].iter())
            .copied()
            .collect();
        assert!(Args::try_parse_from(argv).is_err());

        let args = parse(&["create-bucket", "photos", "--type", "share"]);
        match args.command {
            Command::CreateBucket { bucket_type, .. } => assert_eq!(bucket_type, BucketType::Share),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_list_files_options() {
        let args = parse(&["list-files", "photos", "--prefix", "2024/", "--max", "50"]);
        match args.command {
            Command::ListFiles { bucket, prefix, max, delimiter, start } => {
                assert_eq!(bucket, "photos");
                assert_eq!(prefix.as_deref(), Some("2024/"));
                assert_eq!(max, Some(50));
                assert!(delimiter.is_none());
                assert!(start.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_local_file_name() {
        assert_eq!(local_file_name(std::path::Path::new("/tmp/report.csv")).unwrap(), "report.csv");
        assert!(local_file_name(std::path::Path::new("/")).is_err());
    }
}
