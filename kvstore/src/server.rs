use std::time::Duration;

use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "kvstore-server")]
struct Opt {
    /// Address to listen on and register under
    #[structopt(short = "a", long = "addr")]
    addr: kvpaxos::Address,

    /// Address of the coordinator
    #[structopt(short = "c", long = "coordinator", default_value = "localhost:1111")]
    coordinator: kvpaxos::Address,

    /// Live peer to copy the data store from before serving
    #[structopt(short = "r", long = "recover")]
    recover: Option<kvpaxos::Address>,

    /// Timeout for calls to other processes (in milliseconds)
    #[structopt(short = "t", long = "timeout", default_value = "2000", parse(try_from_str = kvstore::parse_millis))]
    timeout: Duration,

    /// Deadline for each acceptor decision (in milliseconds)
    #[structopt(short = "d", long = "deadline", default_value = "2000", parse(try_from_str = kvstore::parse_millis))]
    deadline: Duration,

    /// Probability that the acceptor ignores a request
    #[structopt(short = "f", long = "faults", default_value = "0.1")]
    faults: f64,

    /// Logging verbosity (repeat for more)
    #[structopt(short = "v", parse(from_occurrences))]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let opt = Opt::from_args();
    kvstore::init_logger(opt.verbose).expect("[INTERNAL ERROR]: logger already set");

    let config = kvpaxos::Config::new(opt.addr, opt.coordinator)
        .with_timeout(opt.timeout)
        .with_deadline(opt.deadline)
        .with_fault_probability(opt.faults);

    let config = match (config, opt.recover) {
    | (Ok(config), Some(peer)) => config.with_recovery(peer),
    | (Ok(config), None) => config,
    | (Err(error), _) => {
        log::error!("{}", error);
        std::process::exit(2);
    }
    };

    if let Err(error) = config.run().await {
        log::error!("server stopped: {}", error);
        std::process::exit(1);
    }
}
