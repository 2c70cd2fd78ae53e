//! CLI for gust
//!
//! Subcommands:
//! - `broker`: run the UDP broker (bind address from config or environment)
//! - `publish`: send one payload to a broker and exit
//! - `subscribe`: hex-dump every payload the broker fans out for a pattern

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use gust::broker::Broker;
use gust::broker::topic::Topic;
use gust::client::{Publisher, Subscriber};
use gust::config::{Settings, load_config};
use gust::utils::error::{Error, Result};
use gust::utils::{hex, logging};

#[derive(Parser)]
#[command(name = "gust")]
enum Command {
    /// Start the broker
    Broker,
    /// Send one payload to a broker
    Publish {
        /// Broker endpoint as <ipv4>:<port>
        endpoint: String,
        /// Topic to tag the payload with
        topic: String,
        /// Payload, sent verbatim as bytes
        data: String,
    },
    /// Print every payload published under a matching topic
    Subscribe {
        /// Broker endpoint as <ipv4>:<port>
        endpoint: String,
        /// Topic pattern to subscribe with
        topic: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cmd = Command::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::from(1);
        }
    };
    logging::init(&config.log.level);

    let outcome = match cmd {
        Command::Broker => run_broker(&config).await,
        Command::Publish {
            endpoint,
            topic,
            data,
        } => run_publish(&endpoint, &topic, &data).await,
        Command::Subscribe { endpoint, topic } => run_subscribe(&endpoint, &topic).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err @ (Error::InvalidEndpoint(_) | Error::InvalidTopic { .. })) => {
            eprintln!("{}", err);
            ExitCode::from(2)
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::from(1)
        }
    }
}

/// The clients only accept a literal `<ipv4>:<port>`; no names, no v6.
fn parse_endpoint(s: &str) -> Result<SocketAddr> {
    let addr: SocketAddr = s
        .parse()
        .map_err(|_| Error::InvalidEndpoint(s.to_string()))?;
    if !addr.is_ipv4() {
        return Err(Error::InvalidEndpoint(s.to_string()));
    }
    Ok(addr)
}

async fn run_broker(config: &Settings) -> Result<()> {
    let addr = format!("{}:{}", config.broker.host, config.broker.port);
    let addr: SocketAddr = addr
        .parse()
        .map_err(|_| Error::InvalidEndpoint(addr.clone()))?;
    let mut broker = Broker::bind(addr).await?;

    tokio::select! {
        served = broker.run() => served,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
            Ok(())
        }
    }
}

async fn run_publish(endpoint: &str, pattern: &str, data: &str) -> Result<()> {
    let broker = parse_endpoint(endpoint)?;
    let topic: Topic = pattern.parse()?;

    let publisher = Publisher::new(broker).await?;
    publisher.publish(topic, data.as_bytes()).await?;

    println!(
        "published {} bytes to {} topic={}",
        data.len(),
        endpoint,
        pattern
    );
    Ok(())
}

async fn run_subscribe(endpoint: &str, pattern: &str) -> Result<()> {
    let broker = parse_endpoint(endpoint)?;
    let topic: Topic = pattern.parse()?;
    let mut subscriber = Subscriber::new(broker, topic).await?;

    println!("subscribed to {} topic={} (Ctrl-C to exit)", endpoint, pattern);

    tokio::select! {
        polled = poll_loop(&mut subscriber) => polled,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
            Ok(())
        }
    }
}

async fn poll_loop(subscriber: &mut Subscriber) -> Result<()> {
    loop {
        if let Some(payload) = subscriber.poll().await? {
            println!("---- message ({} bytes) ----", payload.len());
            print!("{}", hex::dump(&payload));
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}
