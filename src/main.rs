use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use url::Url;

use vaderprat::clipboard::{self, Clipboard};
use vaderprat::location_resolver::{coordinate_from_query, share_url};
use vaderprat::models::Coordinate;
use vaderprat::{Event, Services, Session, VaderpratConfig, logging, render, web};

#[derive(Parser, Debug)]
#[command(name = "vaderprat")]
#[command(version, about = "Weather receipt and icebreakers for right now")]
struct Cli {
    /// Config file (defaults to the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the receipt and cards once. Without a coordinate, locate this device.
    Show(Target),
    /// Keep the page open: [l]ocate, [r]egenerate, [c]opy link, [q]uit
    Interactive(Target),
    /// Serve the page and JSON endpoints over HTTP
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print (and optionally copy) the share link for a coordinate
    Share {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, default_value_t = false)]
        copy: bool,
    },
}

#[derive(Args, Debug)]
struct Target {
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,
    /// A shared page link carrying `lat` and `lon`
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    url: Option<Url>,
}

impl Target {
    /// The page this run stands in for, carrying the coordinate if one was given
    fn page_url(&self, base: &Url) -> Result<Url> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }
        Ok(match self.coordinate()? {
            Some(coordinate) => share_url(base, coordinate),
            None => base.clone(),
        })
    }

    fn coordinate(&self) -> Result<Option<Coordinate>> {
        if let Some(url) = &self.url {
            return Ok(coordinate_from_query(url));
        }
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Ok(Some(Coordinate::new(lat, lon)?)),
            _ => Ok(None),
        }
    }
}

fn new_session(services: Services) -> Session<StdRng> {
    Session::new(services, StdRng::from_rng(&mut rand::rng()))
}

async fn show(config: &VaderpratConfig, target: &Target) -> Result<()> {
    let services = Services::from_config(config, Arc::new(clipboard::detect()))?;
    let page_url = target.page_url(&services.share_base)?;
    let resolved = services.resolve_location(Some(&page_url)).await;

    let mut session = new_session(services);
    session.run(Event::LocationResolved(resolved)).await;

    print!("{}", render::page(session.state()));
    Ok(())
}

async fn interactive(config: &VaderpratConfig, target: &Target) -> Result<()> {
    let services = Services::from_config(config, Arc::new(clipboard::detect()))?;
    let mut session = new_session(services);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let effects = session.handle(Event::Started {
        page_coordinate: target.coordinate()?,
    });
    session.spawn_effects(effects, &tx);
    print!("{}", render::page(session.state()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let event = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match line.trim() {
                    "l" => Event::UseMyLocation,
                    "r" => Event::Regenerate,
                    "c" => Event::CopyShareLink,
                    "q" => break,
                    "" => continue,
                    other => {
                        println!("Unknown command '{other}'. Use l, r, c or q.");
                        continue;
                    }
                }
            }
            Some(event) = rx.recv() => event,
        };

        let before = session.state().clone();
        // the same link copied twice leaves the state as it was
        let copied = matches!(event, Event::LinkCopied(_));
        let effects = session.handle(event);
        session.spawn_effects(effects, &tx);
        if copied || *session.state() != before {
            println!();
            print!("{}", render::page(session.state()));
        }
    }

    debug!("Interactive session closed");
    Ok(())
}

async fn share(config: &VaderpratConfig, lat: f64, lon: f64, copy: bool) -> Result<()> {
    let coordinate = Coordinate::new(lat, lon)?;
    let base = Url::parse(&config.share.base_url).context("Invalid share base URL")?;
    let link = share_url(&base, coordinate).to_string();

    if copy {
        let clipboard = clipboard::detect();
        clipboard.write_text(&link).await?;
        info!("Share link handed to {}", clipboard.name());
    }
    println!("{link}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = VaderpratConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose)?;

    match cli.command {
        Command::Show(target) => show(&config, &target).await,
        Command::Interactive(target) => interactive(&config, &target).await,
        Command::Serve { port } => {
            if let Some(port) = port {
                if port == 0 {
                    bail!("Port must be greater than 0");
                }
                config.server.port = port;
            }
            web::run(&config).await
        }
        Command::Share { lat, lon, copy } => share(&config, lat, lon, copy).await,
    }
}
