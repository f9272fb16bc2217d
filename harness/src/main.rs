use std::collections::HashMap as Map;
use std::sync::Arc;
use std::time::Duration;

use structopt::StructOpt;

mod command;
mod server;

use crate::command::{Command, Execution};
use crate::server::{Server, HOST};

#[derive(StructOpt)]
#[structopt(name = "harness")]
struct Opt {
    /// Path to the kvstore-server binary
    #[structopt(short = "s", long = "server")]
    server: std::path::PathBuf,

    /// Path to the kvstore-coordinator binary
    #[structopt(short = "c", long = "coordinator")]
    coordinator: std::path::PathBuf,

    /// JSON test script
    #[structopt(short = "f", long = "file")]
    file: std::path::PathBuf,

    /// Time to wait for a spawned process to start listening (in milliseconds)
    #[structopt(short = "w", long = "wait", default_value = "500")]
    wait: u64,

    /// Verbosity passed through to spawned processes
    #[structopt(short = "v", parse(from_occurrences))]
    verbose: u8,
}

fn client(port: u16) -> kvpaxos::StoreClient {
    kvpaxos::StoreClient::new(
        kvpaxos::Address::new(HOST, port),
        Arc::new(kvpaxos::transport::TcpNetwork),
        Duration::from_secs(30),
    )
}

/// Runs every command in order. Returns the number of failed expectations.
async fn run(opt: Opt) -> usize {

    // Test execution
    let execution: Execution = std::fs::File::open(&opt.file)
        .map(serde_json::from_reader)
        .expect("[INTERNAL ERROR]: could not find file")
        .expect("[INTERNAL ERROR]: could not parse test");

    // Running processes
    let mut servers: Map<u16, Server> = Map::default();

    // Port of the running coordinator
    let mut coordinator = None;

    let mut failures = 0;
    let wait = Duration::from_millis(opt.wait);

    for command in execution.0 {
        println!("Executing command {:?}", command);
        match command {
        | Command::Coordinator { port } => {
            let child = Server::coordinator(&opt.coordinator, port, opt.verbose)
                .expect("[INTERNAL ERROR]: could not spawn coordinator");
            servers.insert(port, child);
            coordinator = Some(port);
            tokio::time::sleep(wait).await;
        }
        | Command::Start { port, recover, faults } => {
            let coordinator = coordinator.expect("[INTERNAL ERROR]: start a coordinator first");
            let child = Server::node(&opt.server, port, coordinator, recover, faults, opt.verbose)
                .expect("[INTERNAL ERROR]: could not spawn server");
            servers.insert(port, child);
            tokio::time::sleep(wait).await;
        }
        | Command::Put { port, key, value } => {
            match client(port).put(key.clone(), value).await {
            | Ok(true) => println!("Server {} stored {}", port, key),
            | Ok(false) => println!("Server {} failed to store {}", port, key),
            | Err(error) => println!("Server {} unreachable: {}", port, error),
            }
        }
        | Command::Get { port, key, expect, absent } => {
            let checked = expect.is_some() || absent;
            match client(port).get(key.clone()).await {
            | Ok(value) => {
                println!("Server {} returned {:?} for {}", port, value, key);
                if checked && value != expect {
                    println!("[FAILURE]: expected {:?}", expect);
                    failures += 1;
                }
            }
            | Err(error) => {
                println!("Server {} unreachable: {}", port, error);
                if checked {
                    failures += 1;
                }
            }
            }
        }
        | Command::Delete { port, key, expect } => {
            match client(port).delete(key.clone()).await {
            | Ok(status) => {
                println!("Server {} returned {} for {}", port, status.code(), key);
                if expect.is_some() && Some(status.code()) != expect {
                    println!("[FAILURE]: expected {:?}", expect);
                    failures += 1;
                }
            }
            | Err(error) => {
                println!("Server {} unreachable: {}", port, error);
                if expect.is_some() {
                    failures += 1;
                }
            }
            }
        }
        | Command::Crash { port } => {
            servers.remove(&port);
        }
        | Command::Sleep { ms } => {
            tokio::time::sleep(Duration::from_millis(ms)).await
        }
        }
    }
    failures
}

#[tokio::main]
async fn main() {
    let failures = run(Opt::from_args()).await;
    if failures > 0 {
        println!("{} expectation(s) failed", failures);
        std::process::exit(1);
    }
}
