use anyhow::{Context, Result};
use chrono::Duration as ChronoDuration;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use printshop_api::{
    auth::{ActorRole, AuthConfig, AuthService},
    config,
    models::Dimensions,
    services::pricing::{self, Material, PriceBreakdown},
};
use strum::IntoEnumIterator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Quote(args) => handle_quote(args, cli.json)?,
        Commands::Materials => handle_materials(cli.json)?,
        Commands::IssueToken(args) => handle_issue_token(args, cli.json)?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "printshop", about = "Printshop developer tooling: pricing and tokens", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a job without creating an order
    Quote(QuoteArgs),
    /// List materials and their price per square centimetre
    Materials,
    /// Sign a bearer token with the configured secret
    IssueToken(IssueTokenArgs),
}

#[derive(Args)]
struct QuoteArgs {
    #[arg(long)]
    material: String,
    #[arg(long)]
    width: f64,
    #[arg(long)]
    height: f64,
    #[arg(long)]
    depth: f64,
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=i64::from(pricing::MAX_QUANTITY)))]
    quantity: u32,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Client,
    Admin,
}

impl From<RoleArg> for ActorRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Client => ActorRole::Client,
            RoleArg::Admin => ActorRole::Admin,
        }
    }
}

#[derive(Args)]
struct IssueTokenArgs {
    #[arg(long)]
    user: String,
    #[arg(long, value_enum, default_value_t = RoleArg::Client)]
    role: RoleArg,
    /// Lifetime in seconds; defaults to the configured jwt_expiration
    #[arg(long)]
    ttl_secs: Option<i64>,
}

fn handle_quote(args: QuoteArgs, json: bool) -> Result<()> {
    let dimensions = Dimensions::new(args.width, args.height, args.depth)?;
    let breakdown = pricing::quote(&dimensions, args.quantity, &args.material)?;

    if json {
        print_json(&breakdown)?;
    } else {
        render_quote(&args.material, args.quantity, &breakdown);
    }
    Ok(())
}

fn handle_materials(json: bool) -> Result<()> {
    let rows: Vec<(String, String)> = Material::iter()
        .map(|material| (material.to_string(), material.unit_price().to_string()))
        .collect();

    if json {
        let value: serde_json::Map<String, serde_json::Value> = rows
            .into_iter()
            .map(|(name, price)| (name, serde_json::Value::String(price)))
            .collect();
        print_json(&value)?;
    } else {
        for (name, price) in rows {
            println!("- {:<10} {} per cm²", name, price);
        }
        println!(
            "- {:<10} {} per cm²",
            "(other)",
            pricing::DEFAULT_UNIT_PRICE
        );
    }
    Ok(())
}

fn handle_issue_token(args: IssueTokenArgs, json: bool) -> Result<()> {
    let cfg = config::load_config().context("failed to load configuration")?;
    let auth = AuthService::new(AuthConfig::from(&cfg));
    let role = ActorRole::from(args.role);

    let token = match args.ttl_secs {
        Some(secs) => auth.issue_token_with_lifetime(&args.user, role, ChronoDuration::seconds(secs)),
        None => auth.issue_token(&args.user, role),
    }
    .context("failed to sign token")?;

    if json {
        print_json(&serde_json::json!({
            "user_id": args.user,
            "role": role,
            "token": token,
        }))?;
    } else {
        println!("{}", token);
    }
    Ok(())
}

fn render_quote(material: &str, quantity: u32, breakdown: &PriceBreakdown) {
    println!("Quote for {} x {}", quantity, material);
    println!("  base price    {}", breakdown.base_price);
    println!("  discount      {}", breakdown.discount_rate);
    println!("  total price   {}", breakdown.total_price);
    println!("  tax           {}", breakdown.tax_amount);
    println!("  shipping      {}", breakdown.shipping_cost);
    println!("  grand total   {}", breakdown.grand_total);
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
