use anyhow::{anyhow, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub fn open(path: &Path, kind: &str) -> Result<File> {
    match File::open(path) {
        Err(e) => Err(anyhow!("Opening {} file `{}`: {}", kind, path.display(), e)),
        Ok(file) => Ok(file),
    }
}

/// Reads the template at `path`, or returns `embedded` if there is no path.
pub fn template_source(path: Option<&Path>, embedded: &str) -> Result<String> {
    match path {
        None => Ok(embedded.to_owned()),
        Some(path) => {
            let mut source = String::new();
            open(path, "template")?.read_to_string(&mut source)?;
            Ok(source)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_embedded_template() -> Result<()> {
        assert_eq!("{{.title}}", template_source(None, "{{.title}}")?);
        Ok(())
    }

    #[test]
    fn test_template_file() -> Result<()> {
        let path = std::env::temp_dir().join("tilawah-util-test-template.html");
        std::fs::write(&path, "<h1>{{.title}}</h1>")?;
        assert_eq!("<h1>{{.title}}</h1>", template_source(Some(&path), "unused")?);
        Ok(())
    }

    #[test]
    fn test_missing_template_names_path() {
        let path = Path::new("/nonexistent/tilawah/verses.html");
        match template_source(Some(path), "unused") {
            Ok(_) => panic!("wanted an error"),
            Err(e) => assert!(e.to_string().contains("/nonexistent/tilawah/verses.html")),
        }
    }
}
