use std::path::PathBuf;

use eyre::{Result, bail};
use log::{debug, error, info};

mod cli;

use cli::{Cli, Commands, OutputFormat};
use ytscrape::api::CaptionApi;
use ytscrape::batch::{self, BatchOptions};
use ytscrape::config::Config;
use ytscrape::timedtext::{self, EntityMode, TimedText};
use ytscrape::{ScrapeError, VideoRef, captions, extract, fetch, output};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytscrape.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytscrape")
        .join("logs")
}

fn build_after_help() -> String {
    format!(
        "\nConfig is read from: {}\nLogs are written to: {}",
        ytscrape::config::config_path().display(),
        log_dir().join("ytscrape.log").display()
    )
}

fn video_ref(input: &str) -> Result<VideoRef> {
    Ok(VideoRef::parse(input).ok_or_else(|| ScrapeError::InvalidUrl(input.to_string()))?)
}

fn entity_mode(raw_entities: bool, config: &Config) -> EntityMode {
    if raw_entities || config.raw_entities.unwrap_or(false) {
        EntityMode::Raw
    } else {
        EntityMode::Decode
    }
}

fn render_texts(format: OutputFormat, texts: &[TimedText]) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => output::render_text(texts),
        OutputFormat::Timed => output::render_timed(texts),
        OutputFormat::Json => output::render_json(texts)?,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Ignoring config {}: {e}", ytscrape::config::config_path().display());
        Config::default()
    });

    // Failures are reported, never turned into a failing exit status.
    if let Err(e) = run(cli, &config).await {
        error!("{e:#}");
        eprintln!("Error: {e:#}");
    }

    Ok(())
}

async fn run(cli: Cli, config: &Config) -> Result<()> {
    let client = fetch::client(config.user_agent.as_deref())?;

    match cli.command {
        Commands::Info {
            url,
            related,
            comments,
            json,
        } => {
            let video = video_ref(&url)?;
            let page = fetch::fetch_page(&client, &video.watch_url()).await?;

            let mut report = extract::inspect_page(&page);
            if !comments {
                report.comment_token = None;
            }
            let limit = related.unwrap_or_else(|| config.related_limit());

            if json {
                report.related.truncate(limit);
                println!("{}", output::render_json(&report)?);
            } else {
                println!("{}", output::render_report(&report, limit));
            }
        }

        Commands::Langs { url } => {
            let video = video_ref(&url)?;
            let tracks = captions::fetch_tracks(&client, &video).await?;
            if tracks.is_empty() {
                println!("No caption tracks available for {video}");
            } else {
                println!("{}", output::render_languages(&captions::language_map(&tracks)));
            }
        }

        Commands::Transcript {
            url,
            lang,
            format,
            output: out_path,
            raw_entities,
            generated,
            api,
        } => {
            let video = video_ref(&url)?;
            let lang = lang.unwrap_or_else(|| config.lang().to_string());
            let entities = entity_mode(raw_entities, config);

            let rendered = if generated || api {
                let caption_api = CaptionApi::new(client).with_entities(entities);
                let list = caption_api.list_transcripts(video.id()).await?;
                let track = if generated {
                    list.find_generated(&[lang.as_str()])?
                } else {
                    list.find(&[lang.as_str()])?
                };
                let transcript = caption_api.fetch(&list, track).await?;

                if cli.verbose {
                    eprintln!(
                        "Video: {video}\nTitle: {}\nLanguage: {} ({})\nSegments: {}",
                        transcript.title,
                        transcript.language,
                        if transcript.generated { "generated" } else { "manual" },
                        transcript.segments.len()
                    );
                }

                match format {
                    OutputFormat::Json => output::render_json(&transcript)?,
                    _ => {
                        let texts: Vec<TimedText> = transcript.segments.iter().map(TimedText::from).collect();
                        render_texts(format, &texts)?
                    }
                }
            } else {
                let tracks = captions::fetch_tracks(&client, &video).await?;
                let languages = captions::language_map(&tracks);
                let Some(track_url) = languages.get(&lang) else {
                    let available: Vec<&str> = languages.keys().map(String::as_str).collect();
                    bail!("no '{lang}' captions for {video}; available: [{}]", available.join(", "));
                };
                debug!("Track URL for {lang}: {track_url}");

                let xml = captions::fetch_track(&client, track_url).await?;
                if !captions::looks_like_transcript(&xml) {
                    bail!("could not retrieve transcript for {video} ({lang})");
                }
                let texts = timedtext::parse_timed_text(&xml, entities);

                if cli.verbose {
                    eprintln!("Video: {video}\nLanguage: {lang}\nSegments: {}", texts.len());
                }
                render_texts(format, &texts)?
            };

            if let Some(ref path) = out_path {
                std::fs::write(path, &rendered)?;
                if cli.verbose {
                    eprintln!("Output written to: {}", path.display());
                }
            } else {
                println!("{rendered}");
            }
        }

        Commands::Batch {
            table,
            out_dir,
            lang,
            id_rule,
        } => {
            let rows = batch::read_rows(&table)?;
            let opts = BatchOptions {
                out_dir: out_dir.unwrap_or_else(|| config.output_dir()),
                langs: vec![lang.unwrap_or_else(|| config.batch_lang().to_string())],
                id_rule: id_rule.map(Into::into).or(config.id_rule).unwrap_or_default(),
            };
            if cli.verbose {
                eprintln!("Processing {} row(s) into {}", rows.len(), opts.out_dir.display());
            }

            let api = CaptionApi::new(client).with_entities(entity_mode(false, config));
            let report = batch::run_batch(&api, &rows, &opts).await?;

            for (title, path) in report.saved() {
                println!("Transcript for '{title}' saved to: {}", path.display());
            }
            for (title, err) in report.failed() {
                println!("Error processing video '{title}': {err}");
            }
            println!(
                "{} saved, {} failed",
                report.saved().count(),
                report.failed().count()
            );
        }
    }

    Ok(())
}
