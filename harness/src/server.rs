/// Child process that is killed when dropped.
pub struct Server(std::process::Child);

impl Server {
    pub fn coordinator(path: &std::path::Path, port: u16, verbose: u8) -> std::io::Result<Self> {
        let mut command = std::process::Command::new(path);
        Self::verbosity(&mut command, verbose);
        command.args(&["-a", &format!("{}:{}", HOST, port)])
            .spawn()
            .map(Server)
    }

    pub fn node(
        path: &std::path::Path,
        port: u16,
        coordinator: u16,
        recover: Option<u16>,
        faults: f64,
        verbose: u8,
    ) -> std::io::Result<Self> {
        let mut command = std::process::Command::new(path);
        Self::verbosity(&mut command, verbose);
        command.args(&["-a", &format!("{}:{}", HOST, port)])
            .args(&["-c", &format!("{}:{}", HOST, coordinator)])
            .args(&["-f", &faults.to_string()]);
        if let Some(peer) = recover {
            command.args(&["-r", &format!("{}:{}", HOST, peer)]);
        }
        command.spawn().map(Server)
    }

    fn verbosity(command: &mut std::process::Command, verbose: u8) {
        if verbose > 0 {
            let verbosity = "-".to_string() + &"v".repeat(verbose as usize);
            command.arg(&verbosity);
        }
    }
}

pub const HOST: &str = "127.0.0.1";

impl Drop for Server {
    fn drop(&mut self) {
        self.0.kill().ok();
        self.0.wait().ok();
    }
}
