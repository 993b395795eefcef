use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use marquee_model::MediaKind;

#[derive(Debug, Parser)]
#[command(
    name = "marqueectl",
    version,
    about = "Browse a Marquee catalog from the terminal"
)]
pub struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Session cookie in Set-Cookie syntax, e.g. "session=abc123"
    #[arg(long, global = true, env = "MARQUEE_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Probe the session and print the authentication state
    Status,
    /// Search titles, with keyword suggestions and recommendations
    Search {
        query: String,
        /// Number of result pages to fetch
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// List titles matching the saved facets, optionally changing them first
    Discover(DiscoverArgs),
    /// Keyword suggestions that yield at least one title
    Keywords { query: String },
    /// Weekly trending titles
    Trending {
        #[arg(long, value_enum, default_value_t = KindArg::Movie)]
        kind: KindArg,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// End the session server-side
    SignOut,
}

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,
    /// Streaming provider id; repeat to select several
    #[arg(long = "provider")]
    pub providers: Vec<u32>,
    /// Genre id; repeat to select several
    #[arg(long = "genre")]
    pub genres: Vec<u32>,
    /// Keyword name, resolved through keyword search; repeat to add several
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,
    /// Drop saved providers, genres and keywords before applying the flags
    #[arg(long)]
    pub reset: bool,
    #[arg(long, default_value_t = 1)]
    pub pages: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Movie,
    Tv,
}

impl From<KindArg> for MediaKind {
    fn from(val: KindArg) -> Self {
        match val {
            KindArg::Movie => MediaKind::Movie,
            KindArg::Tv => MediaKind::Tv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn discover_collects_repeated_facets() {
        let cli = Cli::try_parse_from([
            "marqueectl",
            "discover",
            "--kind",
            "tv",
            "--provider",
            "8",
            "--provider",
            "337",
            "--genre",
            "18",
            "--keyword",
            "heist",
        ])
        .expect("parses");

        let Command::Discover(args) = cli.command else {
            panic!("expected discover");
        };
        assert_eq!(args.kind, Some(KindArg::Tv));
        assert_eq!(args.providers, vec![8, 337]);
        assert_eq!(args.genres, vec![18]);
        assert_eq!(args.keywords, vec!["heist".to_string()]);
        assert!(!args.reset);
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from([
            "marqueectl",
            "trending",
            "--config",
            "custom.toml",
        ])
        .expect("parses");
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(
            cli.command,
            Command::Trending {
                kind: KindArg::Movie,
                pages: 1
            }
        ));
    }
}
