use serde_derive::{Serialize, Deserialize};

#[derive(Serialize, Deserialize)]
pub struct Execution(pub Vec<Command>);

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Start the coordinator on the given port
    Coordinator {
        port: u16,
    },

    /// Start a server, optionally recovering from the server on port `recover`
    Start {
        port: u16,
        #[serde(default)]
        recover: Option<u16>,
        #[serde(default)]
        faults: f64,
    },

    /// Send a PUT request to the specified server
    Put {
        port: u16,
        key: String,
        value: String,
    },

    /// Send a GET request to the specified server, optionally checking the
    /// value returned, or with `absent` that the key is missing
    Get {
        port: u16,
        key: String,
        #[serde(default)]
        expect: Option<String>,
        #[serde(default)]
        absent: bool,
    },

    /// Send a DELETE request to the specified server, optionally
    /// checking the returned status code (200, 404 or 500)
    Delete {
        port: u16,
        key: String,
        #[serde(default)]
        expect: Option<u16>,
    },

    /// Crash the specified server
    Crash {
        port: u16,
    },

    /// Sleep the test harness for `ms` milliseconds
    Sleep {
        ms: u64,
    }
}
