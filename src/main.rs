use anyhow::{anyhow, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tilawah::config::{Config, API_KEY_VAR};
use tilawah::fetch::HttpFetcher;
use tilawah::pipeline::Pipeline;
use tilawah::render::{Layout, Renderer, HADITH_TEMPLATE, INDEX_TEMPLATE, VERSES_TEMPLATE};
use tilawah::util::template_source;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn app() -> App<'static, 'static> {
    let output = || {
        Arg::with_name("output")
            .long("output")
            .short("o")
            .takes_value(true)
            .value_name("FILE")
            .help("Writes the page to FILE instead of stdout")
    };
    let continuous = || {
        Arg::with_name("continuous")
            .long("continuous")
            .help("Renders one continuous reading flow instead of verse cards")
    };
    let search = || {
        Arg::with_name("search")
            .long("search")
            .takes_value(true)
            .value_name("TERM")
            .help("Shows only the entries matching TERM")
    };

    App::new("tilawah")
        .about("Renders Quran and hadith reading pages")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .global_setting(AppSettings::AllowNegativeNumbers)
        .arg(
            Arg::with_name("config")
                .long("config")
                .takes_value(true)
                .value_name("FILE")
                .help("Reads settings from FILE instead of searching for tilawah.yaml"),
        )
        .subcommand(
            SubCommand::with_name("surah")
                .about("Renders a surah (1-114)")
                .arg(Arg::with_name("number").required(true))
                .arg(continuous())
                .arg(output()),
        )
        .subcommand(
            SubCommand::with_name("juz")
                .about("Renders a juz (1-30)")
                .arg(Arg::with_name("number").required(true))
                .arg(continuous())
                .arg(output()),
        )
        .subcommand(
            SubCommand::with_name("hadith")
                .about("Renders one page of a hadith chapter")
                .arg(Arg::with_name("collection").required(true))
                .arg(Arg::with_name("chapter").required(true))
                .arg(
                    Arg::with_name("page")
                        .long("page")
                        .takes_value(true)
                        .default_value("1"),
                )
                .arg(Arg::with_name("page-size").long("page-size").takes_value(true))
                .arg(search())
                .arg(output()),
        )
        .subcommand(
            SubCommand::with_name("surahs")
                .about("Lists the surahs")
                .arg(search())
                .arg(output()),
        )
        .subcommand(
            SubCommand::with_name("juzs")
                .about("Lists the thirty juz")
                .arg(output()),
        )
        .subcommand(
            SubCommand::with_name("collections")
                .about("Lists the hadith collections")
                .arg(output()),
        )
        .subcommand(
            SubCommand::with_name("chapters")
                .about("Lists the chapters of a hadith collection")
                .arg(Arg::with_name("collection").required(true))
                .arg(search())
                .arg(output()),
        )
}

/// Parses a required numeric argument.
fn number<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> Result<T> {
    let raw = matches
        .value_of(name)
        .ok_or_else(|| anyhow!("Missing `{}`", name))?;
    raw.parse()
        .map_err(|_| anyhow!("`{}` must be a number; found `{}`", name, raw))
}

fn output(matches: &ArgMatches) -> Result<Box<dyn Write>> {
    match matches.value_of("output") {
        Some(path) => Ok(Box::new(File::create(path).map_err(|e| {
            anyhow!("Creating output file `{}`: {}", path, e)
        })?)),
        None => Ok(Box::new(io::stdout())),
    }
}

fn layout(matches: &ArgMatches) -> Layout {
    match matches.is_present("continuous") {
        true => Layout::Continuous,
        false => Layout::Cards,
    }
}

/// Logs a failed operation. The page itself shows the unavailable state.
fn report<T>(outcome: &tilawah::pipeline::Result<T>) {
    if let Err(err) = outcome {
        warn!("{}", err);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let matches = app().get_matches();
    let api_key = std::env::var(API_KEY_VAR).ok();
    let config = match matches.value_of("config") {
        Some(path) => Config::from_project_file(Path::new(path), api_key)?,
        None => Config::from_directory(&std::env::current_dir()?, api_key)?,
    };
    let renderer = Renderer::new(
        &template_source(config.verses_template.as_deref(), VERSES_TEMPLATE)?,
        &template_source(config.hadith_template.as_deref(), HADITH_TEMPLATE)?,
        INDEX_TEMPLATE,
        config.site_root.clone(),
    )?;
    let pipeline = Pipeline::new(HttpFetcher::default(), config.endpoints.clone());

    match matches.subcommand() {
        ("surah", Some(m)) => {
            let n: i32 = number(m, "number")?;
            let outcome = pipeline.surah(n).await;
            report(&outcome);
            renderer.verses(&mut output(m)?, &format!("Surah {}", n), &outcome, layout(m))?;
        }
        ("juz", Some(m)) => {
            let n: i32 = number(m, "number")?;
            let outcome = pipeline.juz(n).await;
            report(&outcome);
            renderer.verses(&mut output(m)?, &format!("Juz {}", n), &outcome, layout(m))?;
        }
        ("hadith", Some(m)) => {
            let slug = m.value_of("collection").unwrap_or_default();
            let chapter: u32 = number(m, "chapter")?;
            let page: u32 = number(m, "page")?;
            let page_size: u32 = match m.is_present("page-size") {
                true => number(m, "page-size")?,
                false => config.hadith_page_size,
            };
            let outcome = pipeline.hadith_chapter(slug, chapter, page, page_size).await;
            report(&outcome);
            renderer.hadith(
                &mut output(m)?,
                &format!("{}, chapter {}", slug, chapter),
                &outcome,
                m.value_of("search").unwrap_or_default(),
            )?;
        }
        ("surahs", Some(m)) => {
            let outcome = pipeline.surah_index().await;
            report(&outcome);
            renderer.surah_index(
                &mut output(m)?,
                &outcome,
                m.value_of("search").unwrap_or_default(),
            )?;
        }
        ("juzs", Some(m)) => renderer.juz_index(&mut output(m)?)?,
        ("collections", Some(m)) => renderer.collections(&mut output(m)?)?,
        ("chapters", Some(m)) => {
            let slug = m.value_of("collection").unwrap_or_default();
            let outcome = pipeline.hadith_chapters(slug).await;
            report(&outcome);
            renderer.chapters(
                &mut output(m)?,
                slug,
                &outcome,
                m.value_of("search").unwrap_or_default(),
            )?;
        }
        (name, _) => return Err(anyhow!("Unknown subcommand `{}`", name)),
    }
    Ok(())
}
