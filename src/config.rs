use crate::pipeline::Endpoints;
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "tilawah.yaml";

/// The environment variable that overrides `hadith_api_key`.
pub const API_KEY_VAR: &str = "TILAWAH_HADITH_API_KEY";

const QURAN_API: &str = "https://api.alquran.cloud/v1/";
const HADITH_API: &str = "https://hadithapi.com/api/";
const SITE_ROOT: &str = "file:///tmp/tilawah/";

#[derive(Deserialize)]
struct PageSize(u32);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(50)
    }
}

#[derive(Deserialize, Default)]
struct Project {
    #[serde(default)]
    quran_api: Option<Url>,

    #[serde(default)]
    arabic_edition: Option<String>,

    #[serde(default)]
    translation_edition: Option<String>,

    #[serde(default)]
    hadith_api: Option<Url>,

    #[serde(default)]
    hadith_api_key: Option<String>,

    #[serde(default)]
    hadith_page_size: PageSize,

    #[serde(default)]
    site_root: Option<Url>,

    #[serde(default)]
    verses_template: Option<PathBuf>,

    #[serde(default)]
    hadith_template: Option<PathBuf>,
}

pub struct Config {
    pub endpoints: Endpoints,
    pub hadith_page_size: u32,

    /// The base URL for prev/next links between pages.
    pub site_root: Url,

    /// Overrides the embedded verses template.
    pub verses_template: Option<PathBuf>,

    /// Overrides the embedded hadith template.
    pub hadith_template: Option<PathBuf>,
}

impl Config {
    /// Looks for [`PROJECT_FILE`] in `dir` and then in each of its parents.
    /// Falls back to [`Config::defaults`] if there is none. `api_key`, when
    /// set, takes precedence over the file's `hadith_api_key`.
    pub fn from_directory(dir: &Path, api_key: Option<String>) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, api_key)
                .map_err(|e| anyhow!("Loading configuration: {:?}", e))
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, api_key),
                None => {
                    tracing::debug!("no `{}` found; using defaults", PROJECT_FILE);
                    Config::defaults(api_key)
                }
            }
        }
    }

    pub fn from_project_file(path: &Path, api_key: Option<String>) -> Result<Config> {
        use crate::util::open;
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => {
                Config::from_project(project, project_root, api_key)
            }
        }
    }

    /// The configuration used when no project file exists.
    pub fn defaults(api_key: Option<String>) -> Result<Config> {
        Config::from_project(Project::default(), Path::new("."), api_key)
    }

    fn from_project(project: Project, project_root: &Path, api_key: Option<String>) -> Result<Config> {
        let endpoints = Endpoints {
            quran_api: with_trailing_slash(match project.quran_api {
                Some(url) => url,
                None => Url::parse(QURAN_API)?,
            }),
            arabic_edition: project
                .arabic_edition
                .unwrap_or_else(|| String::from("quran-tajweed")),
            translation_edition: project
                .translation_edition
                .unwrap_or_else(|| String::from("en.asad")),
            hadith_api: with_trailing_slash(match project.hadith_api {
                Some(url) => url,
                None => Url::parse(HADITH_API)?,
            }),
            hadith_api_key: api_key
                .filter(|key| !key.is_empty())
                .or(project.hadith_api_key),
        };
        if project.hadith_page_size.0 < 1 {
            return Err(anyhow!("`hadith_page_size` must be at least 1"));
        }
        Ok(Config {
            endpoints,
            hadith_page_size: project.hadith_page_size.0,
            site_root: with_trailing_slash(match project.site_root {
                Some(url) => url,
                None => Url::parse(SITE_ROOT)?,
            }),
            verses_template: project
                .verses_template
                .map(|relpath| project_root.join(relpath)),
            hadith_template: project
                .hadith_template
                .map(|relpath| project_root.join(relpath)),
        })
    }
}

/// `Url::join` drops the last path segment of a base without a trailing
/// slash, so bases always get one.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
