use crate::config::HomeMapConfig;
use crate::session::{Session, Source, SourceLoader};
use anyhow::{anyhow, Result};
use homemap_manifest::SourceLocation;
use homemap_protocol::{serialize_json_pretty, Response};
use serde::Serialize;
use std::sync::Arc;

pub mod assets;
pub mod browse;
pub mod reason;

/// Name under which the configured source is registered in the session.
pub const PRIMARY_SOURCE: &str = "primary";

pub struct Context {
    pub config: HomeMapConfig,
    location: Option<SourceLocation>,
    use_cache: bool,
    session: Session,
}

impl Context {
    pub fn new(config: HomeMapConfig, location: Option<SourceLocation>, use_cache: bool) -> Self {
        Self {
            config,
            location,
            use_cache,
            session: Session::new(),
        }
    }

    pub fn location(&self) -> Result<&SourceLocation> {
        self.location.as_ref().ok_or_else(|| {
            anyhow!("No source configured: pass --source or set `source` in homemap.toml")
        })
    }

    pub fn loader(&self, location: SourceLocation) -> Result<SourceLoader> {
        SourceLoader::new(location, &self.config, self.use_cache)
    }

    /// The configured source, loaded on first use.
    pub async fn primary(&mut self) -> Result<Arc<Source>> {
        if let Some(source) = self.session.get(PRIMARY_SOURCE) {
            return Ok(source);
        }
        let location = self.location()?.clone();
        let source = self.loader(location)?.load(PRIMARY_SOURCE).await?;
        Ok(self.session.insert(source))
    }

    /// Load another source into the session under `name`.
    pub async fn load_named(&mut self, name: &str, raw_location: &str) -> Result<Arc<Source>> {
        let location: SourceLocation = raw_location.parse()?;
        let source = self.loader(location)?.load(name).await?;
        Ok(self.session.insert(source))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

pub fn print_json<T: Serialize>(data: T) -> Result<()> {
    println!("{}", serialize_json_pretty(&Response::ok(data))?);
    Ok(())
}
