use diagram_forge::config::{ClientConfig, ProxyConfig, API_SECRET_ENV, BACKEND_URL_ENV, DEFAULT_BIND};
use diagram_forge::settings::{MemorySession, SettingsStore, API_KEY_KEY, PROVIDER_KEY};
use diagram_forge::{extract, generate, init_logging, proxy, save_image, templates, GenerateOptions, ProxyClient};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "diagram-forge", version, about = "Generate diagrams from documents with AI")]
struct Cli {
    /// Base URL of the diagram proxy
    #[arg(long, env = "DIAGRAM_FORGE_PROXY_URL", global = true)]
    proxy_url: Option<String>,
    /// AI provider: auto, gemini, openai, replicate
    #[arg(long, default_value = "auto", global = true)]
    provider: String,
    /// Provider API key, kept for this session only
    #[arg(long, env = "DIAGRAM_FORGE_API_KEY", hide_env_values = true, default_value = "", global = true)]
    api_key: String,
    /// Where downloaded diagrams are written
    #[arg(long, default_value = "diagram.png", global = true)]
    out: PathBuf,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the proxy in front of the diagram backend
    Serve {
        /// Address to listen on
        #[arg(long, env = "DIAGRAM_FORGE_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,
        /// Backend base URL
        #[arg(long, env = BACKEND_URL_ENV)]
        backend_url: Option<String>,
        /// Shared secret sent to the backend
        #[arg(long, env = API_SECRET_ENV, hide_env_values = true)]
        api_secret: Option<String>,
    },
    /// List the available templates
    Templates,
    /// Extract text from a PDF, DOCX or Markdown file
    Extract {
        file: PathBuf,
    },
    /// Generate a diagram and save it as PNG
    Generate {
        /// Template id; defaults to the first template
        #[arg(long)]
        template: Option<String>,
        /// Content to diagram
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,
        /// Document to extract the content from
        #[arg(long)]
        file: Option<PathBuf>,
        /// Model override passed to the backend
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = ProxyClient::new(&ClientConfig::new(cli.proxy_url.clone()));

    let Some(command) = cli.command else {
        let session = MemorySession::with_values([
            (PROVIDER_KEY, cli.provider.as_str()),
            (API_KEY_KEY, cli.api_key.as_str()),
        ]);
        let settings = SettingsStore::load(Box::new(session));
        return diagram_forge::tui::run(Arc::new(client), settings, cli.out).await;
    };

    init_logging();
    match command {
        Commands::Serve { bind, backend_url, api_secret } => {
            proxy::serve(ProxyConfig::new(backend_url, api_secret, bind)).await
        }
        Commands::Templates => {
            for t in templates(&client).await? {
                let recommended = t.recommended_provider.as_deref().unwrap_or("-");
                println!("{:<24} {:<28} {:<10} {}", t.id, t.name, recommended, t.description);
            }
            Ok(())
        }
        Commands::Extract { file } => {
            println!("{}", extract(&client, &file).await?);
            Ok(())
        }
        Commands::Generate { template, content, file, model } => {
            let result = generate(
                &client,
                GenerateOptions {
                    template,
                    content,
                    file,
                    provider: cli.provider,
                    api_key: cli.api_key,
                    model,
                },
            )
            .await?;
            save_image(&result, &cli.out)?;
            println!("{}", result.summary());
            println!("Saved {}", cli.out.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn proxy_url_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["diagram-forge", "templates", "--proxy-url", "http://proxy:9000"]).unwrap();
        assert_eq!(cli.proxy_url.as_deref(), Some("http://proxy:9000"));
        assert!(matches!(cli.command, Some(Commands::Templates)));
    }

    #[test]
    fn global_flags_reach_generate() {
        let cli = Cli::try_parse_from([
            "diagram-forge",
            "generate",
            "--content",
            "A calls B",
            "--provider",
            "openai",
            "--proxy-url",
            "http://proxy:9000",
        ])
        .unwrap();
        assert_eq!(cli.provider, "openai");
        assert_eq!(cli.proxy_url.as_deref(), Some("http://proxy:9000"));
    }
}
