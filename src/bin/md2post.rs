//! CLI binary for md2post.
//!
//! A thin shim over the library crate that maps subcommands and flags to
//! pipeline invocations and talks to the local post store.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use md2post::pipeline::{extract, pandoc};
use md2post::{
    ast, markdown_to_post, scaffold, standard_filters, BionicClient, BucketStore, ContentStore,
    DirStore, ImageStore, ImgbbClient, ImgurClient, PostStore, Settings, StoreClient,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start a new post (front matter with a fresh id, title heading)
  md2post create drafts/editors.md "On Editors"

  # Upload a draft; images go to the local content store
  md2post upload drafts/editors.md

  # Upload and publish, with link embeds and imgur-hosted images
  md2post upload --publish --embeds --store imgur drafts/editors.md

  # Flip a post live / back to draft without touching images
  md2post publish drafts/editors.md
  md2post publish --unpublish drafts/editors.md

  # Remove the post and its uploaded images
  md2post delete drafts/editors.md

ENVIRONMENT VARIABLES:
  MD2POST_DATA_DIR    Post store directory          (default: posts)
  MD2POST_MEDIA_DIR   Content-store root directory  (default: media)
  MD2POST_MEDIA_URL   Public prefix for content-store references
  IMGUR_CLIENT_ID     Credential for --store imgur
  IMGBB_API_KEY       Credential for --store imgbb
  BUCKET_ENDPOINT     Gateway URL for --store bucket
  BUCKET_NAME         Bucket name for --store bucket
  BUCKET_TOKEN        Bearer token for --store bucket
  BIONIC_API_KEY      Credential for --bionic

  A .env file in the working directory is honored; real environment wins.

SETUP:
  pandoc must be installed and on PATH — both directions of the document
  conversion run it as a subprocess.
"#;

/// Publish Markdown documents as normalized blog posts.
#[derive(Parser, Debug)]
#[command(
    name = "md2post",
    version,
    about = "Publish Markdown documents as normalized blog posts",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    action: Action,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MD2POST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MD2POST_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Scaffold a new post file with generated front matter.
    Create {
        /// File to create; refuses to overwrite.
        file: PathBuf,
        /// Post title, written as the opening heading.
        title: String,
    },

    /// Convert a document and upsert the resulting post.
    Upload {
        file: PathBuf,

        /// Mark the post published.
        #[arg(short, long)]
        publish: bool,

        /// Image upload backend.
        #[arg(long, value_enum, default_value = "content", env = "MD2POST_STORE")]
        store: StoreArg,

        /// Rewrite recognized links into embedded widgets.
        #[arg(long)]
        embeds: bool,

        /// Re-flow prose through the text-emphasis service.
        #[arg(long)]
        bionic: bool,

        /// Print the stored record as JSON on stdout.
        #[arg(long)]
        json: bool,
    },

    /// Flip the published flag without re-running any rewrites.
    Publish {
        file: PathBuf,

        /// Take the post back to draft.
        #[arg(short, long)]
        unpublish: bool,
    },

    /// Delete the post and remove its uploaded images.
    Delete {
        file: PathBuf,

        /// Backend the images were uploaded to.
        #[arg(long, value_enum, default_value = "content", env = "MD2POST_STORE")]
        store: StoreArg,
    },
}

#[derive(ValueEnum, Clone, Debug)]
enum StoreArg {
    /// Local content-addressed store (deduplicating).
    Content,
    /// Multipart image host.
    Imgur,
    /// Base64 form image host.
    Imgbb,
    /// Verified bucket behind an HTTP gateway.
    Bucket,
}

fn build_store(which: &StoreArg, settings: &Settings) -> Result<StoreClient> {
    Ok(match which {
        StoreArg::Content => StoreClient::Content(ContentStore::new(
            settings.media_dir.clone(),
            settings.media_base_url.clone(),
        )),
        StoreArg::Imgur => {
            let id = settings
                .imgur_client_id
                .as_deref()
                .context("IMGUR_CLIENT_ID is not set")?;
            StoreClient::Imgur(ImgurClient::new(id))
        }
        StoreArg::Imgbb => {
            let key = settings
                .imgbb_api_key
                .as_deref()
                .context("IMGBB_API_KEY is not set")?;
            StoreClient::Imgbb(ImgbbClient::new(key))
        }
        StoreArg::Bucket => {
            let endpoint = settings
                .bucket_endpoint
                .as_deref()
                .context("BUCKET_ENDPOINT is not set")?;
            let endpoint = reqwest::Url::parse(endpoint)
                .with_context(|| format!("invalid BUCKET_ENDPOINT '{endpoint}'"))?;
            let name = settings
                .bucket_name
                .as_deref()
                .context("BUCKET_NAME is not set")?;
            let token = settings
                .bucket_token
                .as_deref()
                .context("BUCKET_TOKEN is not set")?;
            StoreClient::Bucket(BucketStore::new(endpoint, name, token))
        }
    })
}

fn base_dir(file: &Path) -> &Path {
    match file.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => Path::new("."),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let settings = Settings::from_env();

    match cli.action {
        Action::Create { file, title } => {
            let mut f = std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&file)
                .with_context(|| format!("cannot create '{}'", file.display()))?;
            f.write_all(scaffold(&title).as_bytes())
                .with_context(|| format!("cannot write '{}'", file.display()))?;
            if !cli.quiet {
                eprintln!("{} {}", green("✔"), bold(&file.display().to_string()));
            }
        }

        Action::Upload {
            file,
            publish,
            store,
            embeds,
            bionic,
            json,
        } => {
            let store = build_store(&store, &settings)?;
            let emphasis = if bionic {
                let key = settings
                    .bionic_api_key
                    .as_deref()
                    .context("BIONIC_API_KEY is not set")?;
                Some(BionicClient::new(key))
            } else {
                None
            };

            let mut filters = standard_filters(store, base_dir(&file), embeds, emphasis);
            let mut post = markdown_to_post(&file, &mut filters)
                .with_context(|| format!("failed to process '{}'", file.display()))?;
            post.published = publish;

            let mut db = DirStore::open(settings.data_dir.clone())
                .context("cannot open the post store")?;
            db.replace(&post).context("cannot store the post")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&post)?);
            }
            if !cli.quiet {
                eprintln!(
                    "{} {}  {}",
                    green("✔"),
                    bold(&post.title),
                    dim(&format!(
                        "id {}  {} bytes{}",
                        post.id,
                        post.body.len(),
                        if post.published { "  published" } else { "" }
                    )),
                );
            }
        }

        Action::Publish { file, unpublish } => {
            let post = markdown_to_post(&file, &mut [])
                .with_context(|| format!("failed to process '{}'", file.display()))?;
            let mut db = DirStore::open(settings.data_dir.clone())
                .context("cannot open the post store")?;
            db.set_published(&post.id, !unpublish)
                .with_context(|| format!("cannot update post '{}'", post.id))?;
            if !cli.quiet {
                eprintln!(
                    "{} {}  {}",
                    green("✔"),
                    bold(&post.title),
                    dim(if unpublish { "unpublished" } else { "published" }),
                );
            }
        }

        Action::Delete { file, store } => {
            let mut store = build_store(&store, &settings)?;

            // The unfiltered tree still holds the local image paths.
            let doc = pandoc::markdown_to_ast(&file)?;
            let meta = extract::metadata(&doc.meta)?;

            let dir = base_dir(&file);
            for target in ast::image_targets(&doc) {
                if target.starts_with("http://") || target.starts_with("https://") {
                    continue;
                }
                store
                    .remove(&dir.join(&target))
                    .with_context(|| format!("cannot remove image '{target}'"))?;
            }

            let mut db = DirStore::open(settings.data_dir.clone())
                .context("cannot open the post store")?;
            db.delete(&meta.id)
                .with_context(|| format!("cannot delete post '{}'", meta.id))?;
            if !cli.quiet {
                eprintln!("{} deleted {}", green("✔"), bold(&meta.id));
            }
        }
    }

    Ok(())
}
