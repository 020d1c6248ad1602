use std::{error::Error, fmt};

/// SHA1 del diccionario info de un .torrent
pub type InfoHash = [u8; 20];
pub type PeerId = [u8; 20];

#[derive(PartialEq, Eq, Debug, Clone)]
/// Representa el handshake inicial entre dos peers. No forma parte de [P2PMessage] ya que
/// no posee length prefix.
pub struct Handshake {
    pub protocol_str: String,
    pub info_hash: InfoHash,
    pub peer_id: PeerId,
}

#[derive(PartialEq, Eq, Debug, Clone)]
/// Representa un mensaje en general de comunicación P2P, donde cada variante es un mensaje distinto con
/// información asociada.
pub enum P2PMessage {
    KeepAlive,
    Choke,
    Unchoke,
    Interested,
    NotInterested,
    Have {
        piece_index: u32,
    },
    /// Bytes crudos del bitfield (el bit mas significativo de cada byte es la pieza de menor indice).
    Bitfield {
        bitfield: Vec<u8>,
    },
    Request {
        piece_index: u32,
        beginning_byte_index: u32,
        amount_of_bytes: u32,
    },
    Piece {
        piece_index: u32,
        beginning_byte_index: u32,
        block: Vec<u8>,
    },
    Cancel {
        piece_index: u32,
        beginning_byte_index: u32,
        amount_of_bytes: u32,
    },
    /// Mensaje con un ID no contemplado. Se conserva el payload sin interpretar.
    Unknown {
        id: u8,
        payload: Vec<u8>,
    },
}

#[derive(PartialEq, Eq, Debug, Clone)]
/// Representa un tipo de error en la DECODIFICACION de mensajes P2P
pub enum P2PMessageDecodingError {
    ByteAmount(String),
    FromUsizeToU32(String),
    FromBytesToString(String),
    ProtocolError(String),
    MalformedMessage(String),
    MessageTooLong(String),
    IndexMismatch(String),
    OffsetOutOfRange(String),
    DataOverflow(String),
}

impl fmt::Display for P2PMessageDecodingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for P2PMessageDecodingError {}

#[derive(PartialEq, Eq, Debug)]
/// Representa un tipo de error en la ENCODIFICACION de mensajes P2P
pub enum P2PMessageEncodingError {
    FromUsizeToU32(String),
    InvalidProtocolStr(String),
}

impl fmt::Display for P2PMessageEncodingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for P2PMessageEncodingError {}
