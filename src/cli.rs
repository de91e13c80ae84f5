//! Helpers for the accompanying binary: argument parsing,
//! logging setup and loading with a progress bar.
//!
//! APIs here shouldn't be considered stable / used as a
//! library.

use anyhow::{anyhow, bail, Context, Result};
pub use clap::{App, Arg};
use indicatif::{ProgressBar, ProgressStyle};
pub use inflector::Inflector;
use tracing_subscriber::EnvFilter;

use crate::{config::AnalysisConfig, mask::Coord, session::Session, source::CsvFrameSource};

#[macro_export]
macro_rules! args_parser {
    ($name:expr) => {{
        $crate::cli::App::new($name)
            .version(clap::crate_version!())
            .author(clap::crate_authors!())
    }};
}

#[macro_export]
macro_rules! arg {
    ($name:expr) => {{
        use $crate::cli::Inflector;
        $crate::cli::Arg::with_name($name).value_name(&$name.to_screaming_snake_case())
    }};
}

#[macro_export]
macro_rules! opt {
    ($name:expr) => {{
        use $crate::cli::Inflector;
        $crate::cli::Arg::with_name($name)
            .long(&$name.to_kebab_case())
            .value_name(&$name.to_screaming_snake_case())
    }};
}

/// Log to stderr, at `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load CSV frames into a session, showing progress.
pub fn load_session(paths: Vec<String>, config: &AnalysisConfig) -> Result<Session<CsvFrameSource>> {
    let bar = ProgressBar::new(paths.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {wide_bar:cyan/blue} {pos:>7}/{len:7}"),
    );

    let session = Session::load_with_progress(CsvFrameSource, paths, config, || bar.inc(1));
    bar.finish_and_clear();
    Ok(session?)
}

/// Parse `X,Y` into a coordinate.
pub fn parse_coord(s: &str) -> Result<Coord> {
    let mut parts = s.split(',').map(str::trim);
    let (x, y) = match (parts.next(), parts.next(), parts.next()) {
        (Some(x), Some(y), None) => (x, y),
        _ => bail!("expected `X,Y`, got `{}`", s),
    };
    let parse = |v: &str| -> Result<f64> {
        let c = v
            .parse::<f64>()
            .with_context(|| format!("invalid coordinate `{}` in `{}`", v, s))?;
        if !c.is_finite() {
            bail!("coordinate `{}` in `{}` is not finite", v, s);
        }
        Ok(c)
    };
    Ok(Coord::new(parse(x)?, parse(y)?))
}

/// Parse whitespace separated `X,Y` vertices.
pub fn parse_polygon(s: &str) -> Result<Vec<Coord>> {
    let vertices = s
        .split_whitespace()
        .map(parse_coord)
        .collect::<Result<Vec<_>>>()?;
    if vertices.is_empty() {
        return Err(anyhow!("empty polygon"));
    }
    Ok(vertices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coords() {
        assert_eq!(parse_coord("1.5, 2").unwrap(), Coord::new(1.5, 2.));
        assert!(parse_coord("1").is_err());
        assert!(parse_coord("1,2,3").is_err());
        assert!(parse_coord("a,2").is_err());
        assert!(parse_coord("NaN,NaN").is_err());
        assert!(parse_coord("1,inf").is_err());
    }

    #[test]
    fn polygons() {
        let p = parse_polygon("0,0 10,0  10,5").unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p[2], Coord::new(10., 5.));
        assert!(parse_polygon("  ").is_err());
    }
}
