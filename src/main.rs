mod comic;
mod config;
mod error;
mod render;
mod selector;
mod state;
mod xkcd;

use chrono::Utc;
use comic::{rfc822, Comic};
use config::{Config, Mode};
use error::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use render::{Renderer, Templates};
use selector::{pick_batch, Policy};
use state::SeenSet;
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use xkcd::XkcdClient;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = std::env::var("CONFIG").unwrap_or_else(|_| "config.json".to_string());
    let result = match Config::load(Path::new(&config_path)) {
        Ok(config) => run(&config).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(config: &Config) -> Result<()> {
    let templates = match &config.templates_dir {
        Some(dir) => Templates::from_dir(dir)?,
        None => Templates::embedded(),
    };
    let renderer = Renderer::new(templates, config.self_link.clone());
    let client = XkcdClient::new(&config.api_base, config.http_timeout())?;
    let mut rng = StdRng::from_entropy();

    let latest = client.fetch_latest().await?;
    tracing::info!("Latest comic is #{}: {}", latest.num, latest.title);

    let comics = match config.mode {
        Mode::Latest => vec![pick_one(config, Policy::Latest, &client, latest, &mut rng).await?],
        Mode::RandomUnseen => {
            vec![pick_one(config, Policy::RandomUnseen, &client, latest, &mut rng).await?]
        }
        Mode::Batch => {
            let ids = pick_batch(latest.num, config.batch_size, &mut rng)?;
            tracing::debug!("Fetching {} older comics: {:?}", ids.len(), ids);
            let mut comics = client.fetch_many(&ids).await?;
            comics.push(latest);
            comics
        }
    };

    let feed = renderer.render(&comics, &rfc822(&Utc::now()))?;
    write_feed(&config.feed_file, &feed)?;

    for comic in &comics {
        println!("RSS feed written for XKCD#{}: {}", comic.num, comic.title);
    }
    Ok(())
}

async fn pick_one(
    config: &Config,
    policy: Policy,
    client: &XkcdClient,
    latest: Comic,
    rng: &mut StdRng,
) -> Result<Comic> {
    let selector = config.selector(policy);
    let state_path = config.state_file.as_path();
    let track = policy == Policy::RandomUnseen;

    let mut seen = if track {
        SeenSet::load(state_path)
    } else {
        SeenSet::default()
    };
    tracing::debug!("{} comics seen so far", seen.len());

    let id = selector.pick(latest.num, &mut seen, state_path, rng).await?;
    let comic = if id == latest.num {
        latest
    } else {
        client.fetch_by_id(id).await?
    };

    if track {
        seen.mark_seen(comic.num);
        seen.save(state_path)?;
    }
    Ok(comic)
}

fn write_feed(path: &Path, feed: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, feed)?;
    tracing::debug!("Wrote {} bytes to {}", feed.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use std::path::PathBuf;
    use std::time::Duration;

    const UNREACHABLE: &str = "http://127.0.0.1:9";

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("xkcd-rss-{}-{}", std::process::id(), name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn offline_config(dir: &Path, mode: Mode) -> Config {
        Config {
            mode,
            api_base: UNREACHABLE.to_string(),
            http_timeout_secs: 1,
            retry_backoff_ms: 0,
            state_file: dir.join("seen.json"),
            feed_file: dir.join("feed.xml"),
            ..Config::default()
        }
    }

    fn offline_client() -> XkcdClient {
        XkcdClient::new(UNREACHABLE, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_write_feed_creates_dirs_and_overwrites() {
        let dir = scratch("feed");
        let path = dir.join("rss/xkcd/feed.xml");

        write_feed(&path, "<rss>old</rss>").unwrap();
        write_feed(&path, "<rss>new</rss>").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<rss>new</rss>");
    }

    #[tokio::test]
    async fn test_failed_run_leaves_files_untouched() {
        for mode in [Mode::Latest, Mode::RandomUnseen, Mode::Batch] {
            let dir = scratch(&format!("run-{:?}", mode));
            let config = offline_config(&dir, mode);
            std::fs::write(&config.feed_file, "OLD").unwrap();
            std::fs::write(&config.state_file, "[1]").unwrap();

            assert!(matches!(run(&config).await, Err(FeedError::Network(_))));
            assert_eq!(std::fs::read_to_string(&config.feed_file).unwrap(), "OLD");
            assert_eq!(std::fs::read_to_string(&config.state_file).unwrap(), "[1]");
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_does_not_mark_seen() {
        let dir = scratch("pick-fetch-fails");
        let config = Config {
            include_latest: false,
            max_attempts: 1000,
            ..offline_config(&dir, Mode::RandomUnseen)
        };
        std::fs::write(&config.state_file, "[1]").unwrap();
        let mut rng = StdRng::seed_from_u64(9);

        // Only #2 is left to pick, and fetching it fails.
        let latest = comic::sample(3, "Latest");
        let client = offline_client();
        let result = pick_one(&config, Policy::RandomUnseen, &client, latest, &mut rng).await;
        assert!(matches!(result, Err(FeedError::Network(_))));
        assert_eq!(std::fs::read_to_string(&config.state_file).unwrap(), "[1]");
    }

    #[tokio::test]
    async fn test_pick_of_latest_is_marked_seen() {
        let dir = scratch("pick-latest-unseen");
        let config = offline_config(&dir, Mode::RandomUnseen);
        let mut rng = StdRng::seed_from_u64(9);

        let latest = comic::sample(1, "Only");
        let comic = pick_one(&config, Policy::RandomUnseen, &offline_client(), latest, &mut rng)
            .await
            .unwrap();
        assert_eq!(comic.num, 1);
        assert_eq!(std::fs::read_to_string(&config.state_file).unwrap(), "[1]");
    }

    #[tokio::test]
    async fn test_latest_mode_leaves_seen_file_alone() {
        let dir = scratch("pick-latest-mode");
        let config = offline_config(&dir, Mode::Latest);
        std::fs::write(&config.state_file, "[3, 4]").unwrap();
        let mut rng = StdRng::seed_from_u64(9);

        let latest = comic::sample(4, "Newest");
        let comic = pick_one(&config, Policy::Latest, &offline_client(), latest, &mut rng)
            .await
            .unwrap();
        assert_eq!(comic.num, 4);
        assert_eq!(std::fs::read_to_string(&config.state_file).unwrap(), "[3, 4]");
        assert!(!config.feed_file.exists());
    }
}
