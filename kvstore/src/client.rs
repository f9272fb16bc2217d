use std::sync::Arc;
use std::time::Duration;

use structopt::StructOpt;

#[derive(StructOpt)]
enum Command {
    /// Store <VALUE> under <KEY> on every replica
    Put { key: String, value: String },

    /// Read <KEY> from the connected replica only
    Get { key: String },

    /// Remove <KEY> from every replica
    Delete { key: String },
}

#[derive(StructOpt)]
#[structopt(name = "kvstore-client")]
struct Opt {
    /// Address of the server to send the request to
    #[structopt(short = "a", long = "addr")]
    addr: kvpaxos::Address,

    /// Timeout for the whole request (in milliseconds)
    #[structopt(short = "t", long = "timeout", default_value = "30000", parse(try_from_str = kvstore::parse_millis))]
    timeout: Duration,

    /// Logging verbosity (repeat for more)
    #[structopt(short = "v", parse(from_occurrences))]
    verbose: u8,

    #[structopt(subcommand)]
    command: Command,
}

async fn run(opt: Opt) -> kvpaxos::Result<()> {
    let client = kvpaxos::StoreClient::new(opt.addr.clone(), Arc::new(kvpaxos::transport::TcpNetwork), opt.timeout);
    match opt.command {
    | Command::Put { key, value } => {
        if client.put(key.clone(), value).await? {
            println!("[RESPONSE]: put {} succeeded", key);
        } else {
            println!("[RESPONSE]: something went wrong while storing {}", key);
        }
    }
    | Command::Get { key } => match client.get(key.clone()).await? {
        | Some(value) => println!("[RESPONSE]: {} => {}", key, value),
        | None => println!("[RESPONSE]: 404 {} not found", key),
    },
    | Command::Delete { key } => {
        let status = client.delete(key.clone()).await?;
        println!("[RESPONSE]: {} {:?} {}", status.code(), status, key);
    }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let opt = Opt::from_args();
    kvstore::init_logger(opt.verbose).expect("[INTERNAL ERROR]: logger already set");
    let addr = opt.addr.clone();
    if let Err(error) = run(opt).await {
        println!("[ERROR]: request to {} failed: {}", addr, error);
        std::process::exit(1);
    }
}
