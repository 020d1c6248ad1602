//! # Modulo de envio de mensajes P2P
//! Este modulo contiene las funciones encargadas de enviar mensajes P2P en sockets, los cuales deben enviarse en bytes correspondientes al protocolo BitTorrent para comunicación entre peers
//!

use log::trace;

use shared::parsers::{
    p2p,
    p2p::constants::PSTR_STRING_HANDSHAKE,
    p2p::message::{Handshake, InfoHash, P2PMessage, PeerId},
};

use core::fmt;
use std::{error::Error, io::Write};

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum MsgSenderError {
    EncondingMessageIntoBytes(String),
    WriteToTcpStream(String),
    ZeroAmountOfBytes(String),
    AmountOfBytesLimitExceeded(String),
}

impl fmt::Display for MsgSenderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for MsgSenderError {}

pub const MAX_BLOCK_BYTES: u32 = 131072; //2^17 bytes

fn write_bytes<W: Write>(stream: &mut W, bytes: &[u8]) -> Result<(), MsgSenderError> {
    stream
        .write_all(bytes)
        .map_err(|error| MsgSenderError::WriteToTcpStream(format!("{}", error)))
}

/// Funcion encargada de codificar y enviar el Handshake con el info hash del torrent y el
/// peer id propio.
///
pub fn send_handshake<W: Write>(
    stream: &mut W,
    info_hash: InfoHash,
    peer_id: PeerId,
) -> Result<(), MsgSenderError> {
    let handshake_bytes = p2p::encoder::handshake_to_bytes(&Handshake {
        protocol_str: PSTR_STRING_HANDSHAKE.to_string(),
        info_hash,
        peer_id,
    })
    .map_err(|error| MsgSenderError::EncondingMessageIntoBytes(format!("{}", error)))?;

    write_bytes(stream, &handshake_bytes)
}

fn send_msg<W: Write>(stream: &mut W, msg_variant: P2PMessage) -> Result<(), MsgSenderError> {
    let msg_bytes = p2p::encoder::to_bytes(msg_variant)
        .map_err(|error| MsgSenderError::EncondingMessageIntoBytes(format!("{}", error)))?;

    write_bytes(stream, &msg_bytes)
}

/// Funcion encargada de codificar y enviar un mensaje P2P de tipo Keep Alive
///
pub fn send_keep_alive<W: Write>(stream: &mut W) -> Result<(), MsgSenderError> {
    send_msg(stream, P2PMessage::KeepAlive)
}

/// Funcion encargada de codificar y enviar un mensaje P2P de tipo Choke
///
pub fn send_choke<W: Write>(stream: &mut W) -> Result<(), MsgSenderError> {
    send_msg(stream, P2PMessage::Choke)
}

/// Funcion encargada de codificar y enviar un mensaje P2P de tipo Unchoke
///
pub fn send_unchoke<W: Write>(stream: &mut W) -> Result<(), MsgSenderError> {
    send_msg(stream, P2PMessage::Unchoke)
}

/// Funcion encargada de codificar y enviar un mensaje P2P de tipo Interested
///
pub fn send_interested<W: Write>(stream: &mut W) -> Result<(), MsgSenderError> {
    send_msg(stream, P2PMessage::Interested)
}

/// Funcion encargada de codificar y enviar un mensaje P2P de tipo Not Interested
///
pub fn send_not_interested<W: Write>(stream: &mut W) -> Result<(), MsgSenderError> {
    send_msg(stream, P2PMessage::NotInterested)
}

/// Funcion encargada de codificar y enviar un mensaje P2P de tipo Have
///
pub fn send_have<W: Write>(stream: &mut W, completed_piece_index: u32) -> Result<(), MsgSenderError> {
    send_msg(
        stream,
        P2PMessage::Have {
            piece_index: completed_piece_index,
        },
    )
}

fn check_request_fields(amount_of_bytes: u32) -> Result<(), MsgSenderError> {
    if amount_of_bytes == 0 {
        return Err(MsgSenderError::ZeroAmountOfBytes(
            "[MsgSenderError] The amount of bytes cannot be equal zero.".to_string(),
        ));
    }

    if amount_of_bytes > MAX_BLOCK_BYTES {
        return Err(MsgSenderError::AmountOfBytesLimitExceeded(
            "[MsgSenderError] The amount of bytes must be smaller than 2^17.".to_string(),
        ));
    }
    Ok(())
}

/// Funcion encargada de codificar y enviar un mensaje P2P de tipo Request por un bloque
/// de la pieza indicada.
///
pub fn send_request<W: Write>(
    stream: &mut W,
    piece_index: u32,
    beginning_byte_index: u32,
    amount_of_bytes: u32,
) -> Result<(), MsgSenderError> {
    check_request_fields(amount_of_bytes)?;
    send_msg(
        stream,
        P2PMessage::Request {
            piece_index,
            beginning_byte_index,
            amount_of_bytes,
        },
    )?;
    trace!(
        "Mensaje enviado: Request[piece_index: {}, beginning_byte_index: {}. amount_of_bytes: {}]",
        piece_index,
        beginning_byte_index,
        amount_of_bytes
    );
    Ok(())
}
