use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

use gatekeeper::auth::credentials::hash_password;
use gatekeeper::auth::{Role, TokenCodec};
use gatekeeper::config::TokenConfig;

#[derive(Parser)]
#[command(name = "gatekeeper-cli")]
#[command(about = "Client and operator tool for the request gatekeeper", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    /// Bearer token for authenticated commands.
    #[arg(short, long, env = "GATEKEEPER_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print the issued token
    Login { username: String, password: String },
    /// Check that the token is still accepted
    Verify,
    /// GET a protected path with the token
    Get { path: String },
    /// Issue a token offline with the shared secret
    IssueToken {
        #[arg(long, env = "GATEKEEPER_TOKEN_SECRET")]
        secret: String,
        #[arg(long, default_value = "HS256")]
        algorithm: String,
        #[arg(long, default_value_t = 24)]
        ttl_hours: u64,
        #[arg(long)]
        id: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        role: Role,
    },
    /// Print the Argon2id hash to put in the users table
    HashPassword { password: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
    }

    match cli.command {
        Commands::Login { username, password } => {
            let res = client
                .post(format!("{}/api/auth/login", cli.url))
                .json(&json!({ "username": username, "password": password }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Verify => {
            let res = client
                .get(format!("{}/api/auth/verify", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Get { path } => {
            let res = client
                .get(format!("{}{}", cli.url, path))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::IssueToken {
            secret,
            algorithm,
            ttl_hours,
            id,
            username,
            role,
        } => {
            let codec = TokenCodec::from_config(&TokenConfig {
                secret,
                algorithm,
                ttl_hours,
            })?;
            println!("{}", codec.issue(&id, &username, role)?);
        }
        Commands::HashPassword { password } => {
            println!("{}", hash_password(&password)?);
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let body = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", body);
    } else {
        eprintln!("Error: gatekeeper returned status {}", status);
        eprintln!("Response: {}", body);
    }
    Ok(())
}
