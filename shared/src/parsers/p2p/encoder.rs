//! # Modulo de codificacion P2P
//! Este modulo contiene las funciones encargadas de pasar mensajes P2P a su representacion en bytes,
//! lista para ser escrita en un socket.

use super::{constants::*, message::*};

///
/// Devuelve un vec de bytes de tipo:
/// <len=0>; tal que mide:
/// <4bytes>
fn encode_keep_alive() -> Vec<u8> {
    vec![0; NUM_OF_BYTES_LENGHT_PREFIX]
}

///
/// Devuelve un vec de bytes de tipo:
/// <len=1><id>; tal que cada uno mide:
/// <4bytes><1byte>
fn encode_without_payload(id: u8) -> Vec<u8> {
    vec![0, 0, 0, 1, id]
}

///
/// Logica de encodificacion común para todos los mensajes con payload.
/// Si no hubo fallas de conversión, el Ok value es un vec de bytes de tipo:
/// <len=0001+X><id><payload>; tal que cada uno mide:
/// <4bytes><1byte><Xbytes>
fn encode_with_payload(id: u8, payload: &[u8]) -> Result<Vec<u8>, P2PMessageEncodingError> {
    let length_prefix = u32::try_from(NEEDED_NUM_OF_BYTES_FOR_ID + payload.len()).map_err(|err| {
        P2PMessageEncodingError::FromUsizeToU32(format!("[P2PMessageEncodingError] {:?}", err))
    })?;

    let mut encoded_msg =
        Vec::with_capacity(NUM_OF_BYTES_LENGHT_PREFIX + NEEDED_NUM_OF_BYTES_FOR_ID + payload.len());
    encoded_msg.extend_from_slice(&length_prefix.to_be_bytes());
    encoded_msg.push(id);
    encoded_msg.extend_from_slice(payload);
    Ok(encoded_msg)
}

///
/// Devuelve un vec de bytes de tipo:
/// <len=5><id=4><piece index>; tal que cada uno mide:
/// <4bytes><1byte><4bytes>
fn encode_have(piece_index: u32) -> Vec<u8> {
    let mut encoded_have: Vec<u8> = vec![0, 0, 0, 5, ID_HAVE];
    encoded_have.extend_from_slice(&piece_index.to_be_bytes());
    encoded_have
}

///
/// Logica de encodificacion común para request y cancel.
/// <len=13><id><index><begin><length>; tal que cada uno mide:
/// <4bytes><1byte><4bytes><4bytes><4bytes>
fn encode_request_or_cancel(
    piece_index: u32,
    beginning_byte_index: u32,
    amount_of_bytes: u32,
    id: u8,
) -> Vec<u8> {
    let mut encoded_msg = vec![0, 0, 0, 13, id];
    encoded_msg.extend_from_slice(&piece_index.to_be_bytes());
    encoded_msg.extend_from_slice(&beginning_byte_index.to_be_bytes());
    encoded_msg.extend_from_slice(&amount_of_bytes.to_be_bytes());
    encoded_msg
}

///
/// Si no hubo fallas de conversión, el Ok value es un vec de bytes de tipo:
/// <len=9+X><id=7><index><begin><block>; tal que cada uno mide:
/// <4bytes><1byte><4bytes><4bytes><Xbytes>
fn encode_piece(
    piece_index: u32,
    beginning_byte_index: u32,
    block: &[u8],
) -> Result<Vec<u8>, P2PMessageEncodingError> {
    let mut payload = Vec::with_capacity(NUM_OF_BYTES_PIECE_HEADER + block.len());
    payload.extend_from_slice(&piece_index.to_be_bytes());
    payload.extend_from_slice(&beginning_byte_index.to_be_bytes());
    payload.extend_from_slice(block);
    encode_with_payload(ID_PIECE, &payload)
}

/// Codifica un P2PMessage a su correspondiente representación en bytes para su envío.
///
/// A partir de dicho P2PMessage, devuelve un Result tal que:
///
/// - El Ok value es un vector de bytes correspondientes al mensaje para ser enviado a otro peer.
/// - El Err value es un P2PMessageEncodingError según sea el caso.
///
/// ### Puede presentarse variante Err cuando:
///
/// - ***Bitfield, Piece, Unknown*** : El length prefix se calcula como 1 + la longitud del payload, la cual
///   es un usize. La conversion a u32 puede fallar.
///
/// # Ejemplo de uso básico:
///
/// ```
/// # use shared::parsers::p2p;
/// # use shared::parsers::p2p::message::*;
/// let msg = P2PMessage::Request {
///     piece_index: 10,
///     beginning_byte_index: 5,
///     amount_of_bytes: 3,
/// };
/// assert_eq!(
///     Ok(vec![0, 0, 0, 13, 6, 0, 0, 0, 10, 0, 0, 0, 5, 0, 0, 0, 3]),
///     p2p::encoder::to_bytes(msg)
/// );
/// ```
pub fn to_bytes(msg: P2PMessage) -> Result<Vec<u8>, P2PMessageEncodingError> {
    match msg {
        P2PMessage::KeepAlive => Ok(encode_keep_alive()),
        P2PMessage::Choke => Ok(encode_without_payload(ID_CHOKE)),
        P2PMessage::Unchoke => Ok(encode_without_payload(ID_UNCHOKE)),
        P2PMessage::Interested => Ok(encode_without_payload(ID_INTERESTED)),
        P2PMessage::NotInterested => Ok(encode_without_payload(ID_NOT_INTERESTED)),
        P2PMessage::Have { piece_index } => Ok(encode_have(piece_index)),
        P2PMessage::Bitfield { bitfield } => encode_with_payload(ID_BITFIELD, &bitfield),
        P2PMessage::Request {
            piece_index,
            beginning_byte_index,
            amount_of_bytes,
        } => Ok(encode_request_or_cancel(
            piece_index,
            beginning_byte_index,
            amount_of_bytes,
            ID_REQUEST,
        )),
        P2PMessage::Piece {
            piece_index,
            beginning_byte_index,
            block,
        } => encode_piece(piece_index, beginning_byte_index, &block),
        P2PMessage::Cancel {
            piece_index,
            beginning_byte_index,
            amount_of_bytes,
        } => Ok(encode_request_or_cancel(
            piece_index,
            beginning_byte_index,
            amount_of_bytes,
            ID_CANCEL,
        )),
        P2PMessage::Unknown { id, payload } => encode_with_payload(id, &payload),
    }
}

/// Codifica un handshake. El Ok value es un vec de bytes de tipo:
/// <pstrlen><pstr><reserved><info_hash><peer_id>;  tal que cada uno mide:
/// <1byte><pstrlen bytes><8bytes><20bytes><20bytes>
///
/// Falla si el protocol_str es vacio o no entra en un byte de longitud.
pub fn handshake_to_bytes(handshake: &Handshake) -> Result<Vec<u8>, P2PMessageEncodingError> {
    let protocol_str_len = match u8::try_from(handshake.protocol_str.len()) {
        Ok(0) | Err(_) => {
            return Err(P2PMessageEncodingError::InvalidProtocolStr(
                "[P2PMessageEncodingError] The protocol string length must be between 1 and 255"
                    .to_string(),
            ))
        }
        Ok(len) => len,
    };

    let mut encoded_handshake = Vec::with_capacity(
        1 + handshake.protocol_str.len() + NUM_OF_FIXED_BYTES_HANDSHAKE,
    );
    encoded_handshake.push(protocol_str_len);
    encoded_handshake.extend_from_slice(handshake.protocol_str.as_bytes());
    encoded_handshake.extend_from_slice(&[0u8; NUM_OF_RESERVED_BYTES_HANDSHAKE]);
    encoded_handshake.extend_from_slice(&handshake.info_hash);
    encoded_handshake.extend_from_slice(&handshake.peer_id);
    Ok(encoded_handshake)
}
