//! # Modulo de respuesta del tracker
//! Interpreta el diccionario bencodeado que devuelve el tracker y obtiene la lista de peers.
//! Se soportan tanto la lista compacta (6 bytes por peer) como la lista de diccionarios.

use shared::parsers::bencoding::values::{DicValues, ValuesBencoding};
use std::{
    error::Error,
    fmt,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    str::FromStr,
};

const FAILURE_REASON: &str = "failure reason";
const INTERVAL: &str = "interval";
const PEERS: &str = "peers";
const IP: &str = "ip";
const PORT: &str = "port";

const COMPACT_PEER_LENGTH: usize = 6;

#[derive(PartialEq, Eq, Debug, Clone)]
///Enumerado que representa los errores posibles al interpretar la respuesta del tracker
pub enum ResponseError {
    FailureReason(String),
    NotFound(String),
    Format(String),
    MalformedPeerList(String),
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for ResponseError {}

#[derive(PartialEq, Eq, Debug, Clone)]
/// Direccion de un peer obtenido del tracker
pub struct PeerEndpoint {
    pub ip: IpAddr,
    pub port: u16,
}

impl PeerEndpoint {
    pub fn get_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for PeerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.get_socket_addr())
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct TrackerResponseData {
    pub interval: u32,
    pub peers: Vec<PeerEndpoint>,
}

fn key(name: &str) -> Vec<u8> {
    name.as_bytes().to_vec()
}

/// Decodifica una lista compacta de peers: 4 bytes de IPv4 seguidos de 2 bytes de puerto
/// (big endian) por cada peer. Un largo que no sea multiplo de 6 es un error.
pub fn decode_compact_peers(peers_bytes: &[u8]) -> Result<Vec<PeerEndpoint>, ResponseError> {
    if peers_bytes.len() % COMPACT_PEER_LENGTH != 0 {
        return Err(ResponseError::MalformedPeerList(format!(
            "[ResponseError] Compact peer list of {} bytes is not a multiple of {}",
            peers_bytes.len(),
            COMPACT_PEER_LENGTH
        )));
    }

    Ok(peers_bytes
        .chunks_exact(COMPACT_PEER_LENGTH)
        .map(|peer| PeerEndpoint {
            ip: IpAddr::V4(Ipv4Addr::new(peer[0], peer[1], peer[2], peer[3])),
            port: u16::from_be_bytes([peer[4], peer[5]]),
        })
        .collect())
}

fn decode_peer_from_dic(dic_peer: &DicValues) -> Result<PeerEndpoint, ResponseError> {
    let ip = match dic_peer.get(&key(IP)) {
        Some(ValuesBencoding::String(ip)) => IpAddr::from_str(&String::from_utf8_lossy(ip))
            .map_err(|err| ResponseError::MalformedPeerList(format!("{}", err)))?,
        _ => {
            return Err(ResponseError::MalformedPeerList(
                "[ResponseError] Peer without ip".to_string(),
            ))
        }
    };
    let port = match dic_peer.get(&key(PORT)) {
        Some(ValuesBencoding::Integer(port)) => u16::try_from(*port)
            .map_err(|err| ResponseError::MalformedPeerList(format!("{}", err)))?,
        _ => {
            return Err(ResponseError::MalformedPeerList(
                "[ResponseError] Peer without port".to_string(),
            ))
        }
    };
    Ok(PeerEndpoint { ip, port })
}

fn init_peers(dic_response: &DicValues) -> Result<Vec<PeerEndpoint>, ResponseError> {
    match dic_response.get(&key(PEERS)) {
        Some(ValuesBencoding::String(compact_peers)) => decode_compact_peers(compact_peers),
        Some(ValuesBencoding::List(list_peers)) => list_peers
            .iter()
            .map(|peer| match peer {
                ValuesBencoding::Dic(dic_peer) => decode_peer_from_dic(dic_peer),
                _ => Err(ResponseError::MalformedPeerList(
                    "[ResponseError] Peer entry is not a dictionary".to_string(),
                )),
            })
            .collect(),
        Some(_) => Err(ResponseError::Format(
            "[ResponseError] Invalid peers field".to_string(),
        )),
        None => Err(ResponseError::NotFound(
            "[ResponseError] Missing peers field".to_string(),
        )),
    }
}

fn init_interval(dic_response: &DicValues) -> Result<u32, ResponseError> {
    match dic_response.get(&key(INTERVAL)) {
        Some(ValuesBencoding::Integer(interval)) => u32::try_from(*interval)
            .map_err(|err| ResponseError::Format(format!("{}", err))),
        Some(_) => Err(ResponseError::Format(
            "[ResponseError] Invalid interval field".to_string(),
        )),
        None => Ok(0),
    }
}

impl TrackerResponseData {
    ///Crea la estructura a partir del diccionario de respuesta del tracker.
    /// Si el tracker informa un `failure reason`, se devuelve como error.
    pub fn new(dic_response: DicValues) -> Result<Self, ResponseError> {
        if let Some(ValuesBencoding::String(reason)) = dic_response.get(&key(FAILURE_REASON)) {
            return Err(ResponseError::FailureReason(
                String::from_utf8_lossy(reason).to_string(),
            ));
        }

        Ok(TrackerResponseData {
            interval: init_interval(&dic_response)?,
            peers: init_peers(&dic_response)?,
        })
    }

    pub fn get_total_amount_peers(&self) -> usize {
        self.peers.len()
    }
}
