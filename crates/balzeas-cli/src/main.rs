use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::thread;

use balzeas::output;
use balzeas::scraper::{REQUEST_DELAY, WebScraper};
use balzeas::types::Roster;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "balzeas")]
#[command(about = "A saezlab.org website scraper", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the paginated publication list, de-duplicated by title
    Publications {
        #[arg(long, default_value = "publications.json", help = "Output file")]
        output: PathBuf,
    },
    /// Scrape the alumni table from the home page
    Alumni {
        #[arg(long, default_value = "alumni.json", help = "Output file")]
        output: PathBuf,
    },
    /// Scrape a profile page for every current member of the roster
    Team {
        #[arg(
            long,
            default_value = "team.json",
            help = "Roster file listing current members"
        )]
        roster: PathBuf,

        #[arg(long, default_value = "team_details.json", help = "Output file")]
        output: PathBuf,

        #[arg(
            long,
            default_value = "team_images",
            help = "Directory for downloaded portraits"
        )]
        image_dir: PathBuf,
    },
    /// Scrape the tool and database listing from the home page
    Tools {
        #[arg(long, default_value = "tools_details.json", help = "Output file")]
        output: PathBuf,

        #[arg(
            long,
            default_value = "tool_images",
            help = "Directory for downloaded icons"
        )]
        image_dir: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let scraper = WebScraper::new().unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    });

    match cli.command {
        Commands::Publications { output } => run_publications(&scraper, &output),
        Commands::Alumni { output } => run_alumni(&scraper, &output),
        Commands::Team {
            roster,
            output,
            image_dir,
        } => run_team(&scraper, &roster, &output, &image_dir),
        Commands::Tools { output, image_dir } => run_tools(&scraper, &output, &image_dir),
    }
}

fn run_publications(scraper: &WebScraper, output: &Path) {
    let publications = scraper.fetch_publications().unwrap_or_else(|e| {
        log::error!("Error fetching publications: {}", e);
        process::exit(1);
    });

    write_or_exit(&publications, output);
    println!(
        "Saved {} unique publications to {}",
        publications.len(),
        output.display()
    );
}

fn run_alumni(scraper: &WebScraper, output: &Path) {
    let (alumni, dropped) = scraper.fetch_alumni().unwrap_or_else(|e| {
        log::error!("Error fetching alumni: {}", e);
        process::exit(1);
    });

    if dropped > 0 {
        log::warn!("Dropped {} malformed alumni row(s)", dropped);
    }

    write_or_exit(&alumni, output);
    println!(
        "Scraped information for {} alumni members into {}",
        alumni.len(),
        output.display()
    );
}

fn run_team(scraper: &WebScraper, roster_path: &Path, output: &Path, image_dir: &Path) {
    let roster = load_roster(roster_path).unwrap_or_else(|e| {
        log::error!("Error reading roster {}: {}", roster_path.display(), e);
        process::exit(1);
    });

    fs::create_dir_all(image_dir).unwrap_or_else(|e| {
        log::error!(
            "Error creating image directory {}: {}",
            image_dir.display(),
            e
        );
        process::exit(1);
    });

    let mut members = Vec::new();
    let mut skipped = 0usize;

    for (i, entry) in roster.current.iter().enumerate() {
        if i > 0 {
            thread::sleep(REQUEST_DELAY);
        }
        println!("Scraping information for {}...", entry.name);

        let mut page = match scraper.fetch_member_profile(&entry.name) {
            Ok(page) => page,
            Err(e) => {
                log::warn!("Skipping {}: {}", entry.name, e);
                skipped += 1;
                continue;
            }
        };

        if let Some(image_url) = page.image_url.take() {
            match download_image(scraper, image_dir, &entry.name, &image_url, ".jpg") {
                Ok(filename) => page.member.image = filename,
                Err(e) => log::warn!("Error downloading image for {}: {}", entry.name, e),
            }
        }

        members.push(page.member);
    }

    write_or_exit(&members, output);
    if skipped > 0 {
        log::warn!("Skipped {} member(s) with unreachable profile pages", skipped);
    }
    println!(
        "Scraped information for {} current team members",
        members.len()
    );
}

fn run_tools(scraper: &WebScraper, output: &Path, image_dir: &Path) {
    let (pages, dropped) = scraper.fetch_tools().unwrap_or_else(|e| {
        log::error!("Error fetching tool listing: {}", e);
        process::exit(1);
    });

    fs::create_dir_all(image_dir).unwrap_or_else(|e| {
        log::error!(
            "Error creating image directory {}: {}",
            image_dir.display(),
            e
        );
        process::exit(1);
    });

    if dropped > 0 {
        log::warn!("Dropped {} nameless resource entries", dropped);
    }

    let mut tools = Vec::new();

    for (i, mut page) in pages.into_iter().enumerate() {
        if i > 0 {
            thread::sleep(REQUEST_DELAY);
        }
        println!("Scraping information for {}...", page.tool.name);

        if let Some(image_url) = page.image_url.take() {
            match download_image(scraper, image_dir, &page.tool.name, &image_url, ".png") {
                Ok(filename) => page.tool.image = filename,
                Err(e) => log::warn!("Error downloading image for {}: {}", page.tool.name, e),
            }
        }

        tools.push(page.tool);
    }

    write_or_exit(&tools, output);
    println!("Scraped information for {} tools", tools.len());
}

fn load_roster(path: &Path) -> Result<Roster, Box<dyn Error>> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn download_image(
    scraper: &WebScraper,
    dir: &Path,
    name: &str,
    url: &str,
    default_ext: &str,
) -> Result<String, Box<dyn Error>> {
    let absolute = scraper.absolute_url(url);
    let bytes = scraper.fetch_image(&absolute)?;
    let filename = output::save_image(dir, name, &absolute, &bytes, default_ext)?;
    Ok(filename)
}

fn write_or_exit<T: serde::Serialize>(records: &T, path: &Path) {
    output::write_json(records, path).unwrap_or_else(|e| {
        log::error!("Error writing {}: {}", path.display(), e);
        process::exit(1);
    });
}
