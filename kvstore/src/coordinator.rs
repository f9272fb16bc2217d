use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "kvstore-coordinator")]
struct Opt {
    /// Address to serve the membership directory on
    #[structopt(short = "a", long = "addr", default_value = "localhost:1111")]
    addr: kvpaxos::Address,

    /// Logging verbosity (repeat for more)
    #[structopt(short = "v", parse(from_occurrences))]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let opt = Opt::from_args();
    kvstore::init_logger(opt.verbose).expect("[INTERNAL ERROR]: logger already set");

    if let Err(error) = kvpaxos::run_coordinator(opt.addr).await {
        log::error!("coordinator stopped: {}", error);
        std::process::exit(1);
    }
}
