use std::env;
use std::net::SocketAddr;

use contracts::PortalConfig;
use portal_api::{serve, PortalApi};

fn print_usage() {
    println!("portal-cli <command>");
    println!("commands:");
    println!("  serve [addr]");
    println!("    default addr: 127.0.0.1:8780");
    println!("  stats [sqlite_path]");
    println!("    prints the persisted career record");
    println!("  drill <verdicts> [sqlite_path]");
    println!("    applies a comma-separated accept/reject/need-more sequence offline");
    println!("    example: drill accept,accept,reject");
}

fn parse_socket_addr(value: Option<&String>) -> Result<SocketAddr, String> {
    let raw = value.map(String::as_str).unwrap_or("127.0.0.1:8780");
    raw.parse::<SocketAddr>()
        .map_err(|_| format!("invalid addr: {raw}"))
}

fn default_sqlite_path() -> String {
    env::var("PORTAL_SQLITE_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "portal_stats.sqlite".to_string())
}

fn parse_sqlite_path(value: Option<&String>) -> String {
    value
        .map(String::to_string)
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(default_sqlite_path)
}

fn portal_config() -> PortalConfig {
    let mut config = PortalConfig::default();
    if let Some(gateway_url) = env::var("PORTAL_GATEWAY_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
    {
        config.gateway_base_url = gateway_url;
    }
    config
}

fn parse_verdict_token(token: &str) -> Result<&'static str, String> {
    match token.trim().to_lowercase().as_str() {
        "accept" | "a" => Ok("DECISION: ACCEPT"),
        "reject" | "r" => Ok("DECISION: REJECT"),
        "need-more" | "need_more" | "n" => Ok("DECISION: NEED MORE"),
        other => Err(format!("invalid verdict token: {other}")),
    }
}

fn run_drill(args: &[String]) -> Result<(), String> {
    let sequence = args
        .get(2)
        .ok_or_else(|| "missing verdict sequence".to_string())?;
    let sqlite_path = parse_sqlite_path(args.get(3));

    let verdicts = sequence
        .split(',')
        .filter(|token| !token.trim().is_empty())
        .map(parse_verdict_token)
        .collect::<Result<Vec<_>, _>>()?;
    if verdicts.is_empty() {
        return Err("empty verdict sequence".to_string());
    }

    let mut api = PortalApi::from_config(portal_config());
    api.attach_sqlite_store(&sqlite_path)
        .map_err(|err| format!("failed to attach sqlite store: {err}"))?;

    for raw in verdicts {
        let (decision, promotion) = api.apply_verdict_text(raw);
        match promotion {
            Some(promotion) => {
                println!("decision={decision} promoted_to={}", promotion.rank_name)
            }
            None => println!("decision={decision}"),
        }
    }

    if let Some(error) = api.last_persistence_error() {
        return Err(format!("persistence error after drill: {error}"));
    }

    println!("{} sqlite={}", api.progression(), sqlite_path);
    Ok(())
}

fn run_stats(args: &[String]) -> Result<(), String> {
    let sqlite_path = parse_sqlite_path(args.get(2));

    let mut api = PortalApi::from_config(portal_config());
    api.attach_sqlite_store(&sqlite_path)
        .map_err(|err| format!("failed to attach sqlite store: {err}"))?;

    println!("{} sqlite={}", api.progression(), sqlite_path);
    Ok(())
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    match command {
        Some("serve") => match parse_socket_addr(args.get(2)) {
            Ok(addr) => {
                let mut portal = PortalApi::from_config(portal_config());
                if let Err(err) = portal.attach_sqlite_store(default_sqlite_path()) {
                    eprintln!("failed to attach sqlite store: {err}");
                    std::process::exit(1);
                }
                println!("serving portal api on http://{addr}");
                if let Err(err) = serve(addr, portal).await {
                    eprintln!("server error: {err}");
                    std::process::exit(1);
                }
            }
            Err(err) => {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        },
        Some("stats") => {
            if let Err(err) = run_stats(&args) {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        }
        Some("drill") => {
            if let Err(err) = run_drill(&args) {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        }
        _ => {
            print_usage();
        }
    }
}
