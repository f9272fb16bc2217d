use std::fmt;

use serde_derive::{Deserialize, Serialize};

use crate::error::Error;

/// Full copy of a node's dictionary.
pub type Snapshot = hashbrown::HashMap<String, String>;

/// Location of a node or of the directory service.
#[derive(Serialize, Deserialize)]
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    pub host: String,
    pub port: u16,
}

impl Address {
    pub fn new<H: Into<String>>(host: H, port: u16) -> Self {
        Address { host: host.into(), port }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}:{}", self.host, self.port)
    }
}

/// Parses `host:port`.
impl std::str::FromStr for Address {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::Config(format!("expected <HOST>:<PORT>, got {:?}", s));
        let (host, port) = s.trim().rsplit_once(':').ok_or_else(invalid)?;
        if host.is_empty() {
            return Err(invalid())
        }
        let port = port.parse().map_err(|_| invalid())?;
        Ok(Address::new(host, port))
    }
}

/// Orders competing consensus rounds. Compared by `round` first,
/// with the proposing node's address breaking ties.
#[derive(Serialize, Deserialize)]
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProposalId {
    pub round: u64,
    pub node: Address,
}

impl ProposalId {
    pub fn new(round: u64, node: Address) -> Self {
        ProposalId { round, node }
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}@{}", self.round, self.node)
    }
}

/// Payload carried through consensus and applied by learners.
#[derive(Serialize, Deserialize)]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Put { key: String, value: String },
    Delete { key: String },
}

/// Acceptor answer to a promise or accept request.
#[derive(Serialize, Deserialize)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Vote {
    Granted,
    Rejected,

    /// Injected fault, expired deadline, or unreachable acceptor
    Abstained,
}

impl Vote {
    pub fn is_granted(self) -> bool {
        self == Vote::Granted
    }
}

/// Outcome of a client delete.
#[derive(Serialize, Deserialize)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeleteStatus {
    FoundDeleted = 200,
    NotFound = 404,
    ConsensusFailed = 500,
}

impl DeleteStatus {
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// Every call that can cross a process boundary.
#[derive(Serialize, Deserialize)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    Promise(ProposalId),
    Accept(ProposalId),
    Learn(Operation),
    CopyDataStore,
    GetPortNum,
    GetCoordinator,
    Put { key: String, value: String },
    Get { key: String },
    Delete { key: String },
    AddServer(Address),
    GetServer,
}

#[derive(Serialize, Deserialize)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Vote(Vote),
    Learned(bool),
    DataStore(Snapshot),
    PortNum(u16),
    Coordinator(Address),
    Put(bool),
    Get(Option<String>),
    Delete(DeleteStatus),
    Added,
    Servers(Vec<Address>),

    /// Returned when a request reaches a process hosting a different service
    Unsupported,
}

impl Response {
    /// Short name for log and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
        | Response::Vote(_) => "vote",
        | Response::Learned(_) => "learned",
        | Response::DataStore(_) => "data store",
        | Response::PortNum(_) => "port number",
        | Response::Coordinator(_) => "coordinator",
        | Response::Put(_) => "put",
        | Response::Get(_) => "get",
        | Response::Delete(_) => "delete",
        | Response::Added => "added",
        | Response::Servers(_) => "servers",
        | Response::Unsupported => "unsupported",
        }
    }
}
