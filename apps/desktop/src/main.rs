use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    gallery::Interaction,
    profile::{MyArtwork, PublicProfile},
    upload::{SelectedFile, UploadDraft},
    FileSessionStore, GalleryApi, GalleryView, HttpGalleryApi, LikeOutcome, SessionHandle,
};
use shared::{
    domain::{Category, ImageId},
    protocol::ImageSummary,
};

#[derive(Parser, Debug)]
#[command(name = "artshowcase", about = "Browse, like and publish artwork")]
struct Cli {
    /// Settings file to use instead of `artshowcase.toml` in the working
    /// directory.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured backend URL.
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    /// Featured images from the landing page.
    Featured,
    /// An artist's public profile and gallery.
    Profile { username: String },
    /// Toggles the like on an image from the featured listing.
    Like {
        image_id: String,
        /// Look the image up in this artist's gallery instead.
        #[arg(long)]
        artist: Option<String>,
    },
    /// Replays two taps on a tile `gap_ms` apart and reports what they did.
    Tap {
        image_id: String,
        #[arg(long, default_value_t = 250)]
        gap_ms: u64,
    },
    /// Lists the logged-in user's own artwork.
    Mine,
    Upload {
        file: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Comma separated.
        #[arg(long, default_value = "")]
        tags: String,
        #[arg(long, default_value = "other")]
        category: String,
    },
    Delete { image_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => client_core::config::load_settings_from(path)?,
        None => client_core::load_settings(),
    };
    if let Some(api_url) = cli.api_url {
        settings.api_base_url = api_url;
    }

    let api: Arc<dyn GalleryApi> = Arc::new(HttpGalleryApi::from_settings(&settings)?);
    let store = Arc::new(FileSessionStore::new(&settings.session_path));
    let session = SessionHandle::new(Arc::clone(&api), store);
    session
        .restore()
        .await
        .context("failed to restore saved session")?;

    match cli.command {
        Command::Login { email, password } => {
            let user = session.login(&email, &password).await?;
            println!("logged in as {}", user.username);
        }
        Command::Signup {
            username,
            email,
            password,
        } => {
            let user = session.signup(&username, &email, &password).await?;
            println!("welcome, {}", user.username);
        }
        Command::Logout => {
            session.logout().await?;
            println!("logged out");
        }
        Command::Whoami => match session.current_user().await {
            Some(user) => println!("{}", user.username),
            None => println!("not logged in"),
        },
        Command::Featured => {
            let view = GalleryView::new(api, session, &settings);
            view.load_featured().await?;
            for item in view.items().await {
                print_image(&item.image, item.liked_by_current_user);
            }
        }
        Command::Profile { username } => {
            let page = PublicProfile::load(&*api, &username).await?;
            println!("@{}", page.profile.username);
            if let Some(bio) = &page.profile.bio {
                println!("{bio}");
            }
            println!(
                "{} artworks, {} likes",
                page.images.len(),
                page.total_likes()
            );
            for image in &page.images {
                print_image(image, false);
            }
        }
        Command::Like { image_id, artist } => {
            let view = GalleryView::new(api, session, &settings);
            match &artist {
                Some(artist) => view.load_artist(artist).await?,
                None => view.load_featured().await?,
            };
            let outcome = view.toggle_like(&ImageId::new(image_id)).await?;
            print_like(&outcome);
        }
        Command::Tap { image_id, gap_ms } => {
            let view = GalleryView::new(api, session, &settings);
            view.load_featured().await?;
            let image_id = ImageId::new(image_id);
            let start = now_ms();

            view.interact(&image_id, start).await;
            tokio::time::sleep(Duration::from_millis(gap_ms)).await;
            match view.interact(&image_id, start + gap_ms).await {
                Interaction::Liked(outcome) => print_like(&outcome?),
                Interaction::PendingOpen => {
                    tokio::time::sleep(settings.double_tap_window).await;
                    let lightbox = view.lightbox();
                    match lightbox.counter() {
                        Some(counter) => println!("lightbox open at {counter}"),
                        None => println!("no image opened"),
                    }
                }
            }
        }
        Command::Mine => {
            let artwork = MyArtwork::new(api, session);
            artwork.refresh().await?;
            for image in artwork.images().await {
                print_image(&image, false);
            }
        }
        Command::Upload {
            file,
            title,
            description,
            tags,
            category,
        } => {
            let category = Category::parse(&category)
                .ok_or_else(|| anyhow!("unknown category '{category}'"))?;
            let file = SelectedFile::read(&file).await?;
            println!("uploading {}", file.describe());

            let artwork = MyArtwork::new(api, session);
            artwork
                .upload(UploadDraft {
                    file: Some(file),
                    title,
                    description,
                    tags,
                    category,
                })
                .await?;
            println!("uploaded; you now have {} artworks", artwork.images().await.len());
        }
        Command::Delete { image_id } => {
            let artwork = MyArtwork::new(api, session);
            artwork.delete(&ImageId::new(image_id)).await?;
            println!("deleted");
        }
    }

    Ok(())
}

fn print_image(image: &ImageSummary, liked: bool) {
    let heart = if liked { "♥" } else { "♡" };
    println!(
        "{}  {heart} {:>4}  {} by {} [{}]",
        image.id,
        image.likes_count,
        image.title,
        image.artist_username,
        image.category.label()
    );
}

fn print_like(outcome: &LikeOutcome) {
    match outcome {
        LikeOutcome::Liked { likes_count } => println!("liked ({likes_count} likes)"),
        LikeOutcome::Unliked { likes_count } => println!("unliked ({likes_count} likes)"),
        LikeOutcome::InFlight => println!("a like request is already in flight"),
    }
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

