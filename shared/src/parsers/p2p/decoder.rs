//! # Modulo de decodificacion P2P
//! Este modulo contiene las funciones encargadas de decodificar mensajes P2P provenientes de sockets, los cuales llegan en bytes
//! y deben ser interpretados para realizar la logica necesaria de recepcion de mensajes.

use super::constants::*;
use super::message::*;

///
/// A partir de 4 bytes (u8) recibidos en un slice, devuelve la "concatenacion" de dichos bytes para formar un u32 completo.
/// Tener en cuenta que el slice de bytes esperado debe estar ordenado a modo big endian.
///
/// Devuelve un Result donde la variante Ok es el u32, y la variante Err es un P2PMessageDecodingError
///
pub fn concatenate_bytes_into_u32(bytes: &[u8]) -> Result<u32, P2PMessageDecodingError> {
    let four_bytes: [u8; NEEDED_NUM_OF_BYTES_TO_CONCATENATE] = bytes.try_into().map_err(|_| {
        P2PMessageDecodingError::ByteAmount(
            "[P2PMessageDecodingError] Invalid amount of bytes to concatenate into an u32 (4 are required)".to_string()
        )
    })?;
    Ok(u32::from_be_bytes(four_bytes))
}

/// Interpreta el length prefix de un mensaje (sus primeros 4 bytes) y verifica que no supere
/// el maximo aceptado. Se usa antes de reservar memoria para leer el resto del mensaje.
pub fn decode_length_prefix(bytes: &[u8]) -> Result<u32, P2PMessageDecodingError> {
    let length_prefix = concatenate_bytes_into_u32(bytes)?;
    if length_prefix > MAX_P2P_MSG_LENGTH {
        return Err(P2PMessageDecodingError::MessageTooLong(format!(
            "[P2PMessageDecodingError] Length prefix {} exceeds the maximum of {} bytes",
            length_prefix, MAX_P2P_MSG_LENGTH
        )));
    }
    Ok(length_prefix)
}

/// Decodifica un handshake a partir de su primer byte (pstrlen) y de los bytes restantes.
///
/// - Un pstrlen igual a cero no es valido y devuelve `ProtocolError`.
/// - `rest` debe medir exactamente `pstrlen + 48` bytes.
///
pub fn decode_handshake(pstrlen: u8, rest: &[u8]) -> Result<Handshake, P2PMessageDecodingError> {
    if pstrlen == 0 {
        return Err(P2PMessageDecodingError::ProtocolError(
            "[P2PMessageDecodingError] The handshake pstrlen cannot be zero".to_string(),
        ));
    }
    let pstrlen = usize::from(pstrlen);
    if rest.len() != pstrlen + NUM_OF_FIXED_BYTES_HANDSHAKE {
        return Err(P2PMessageDecodingError::ByteAmount(
            "[P2PMessageDecodingError] The handshake does not have the expected amount of bytes"
                .to_string(),
        ));
    }

    let protocol_str = String::from_utf8(rest[..pstrlen].to_vec()).map_err(|err| {
        P2PMessageDecodingError::FromBytesToString(format!("[P2PMessageDecodingError] {:?}", err))
    })?;

    let info_hash_start = pstrlen + NUM_OF_RESERVED_BYTES_HANDSHAKE;
    let peer_id_start = info_hash_start + NUM_OF_BYTES_SHA1;

    let mut info_hash = [0u8; NUM_OF_BYTES_SHA1];
    info_hash.copy_from_slice(&rest[info_hash_start..peer_id_start]);
    let mut peer_id = [0u8; NUM_OF_BYTES_PEER_ID];
    peer_id.copy_from_slice(&rest[peer_id_start..peer_id_start + NUM_OF_BYTES_PEER_ID]);

    Ok(Handshake {
        protocol_str,
        info_hash,
        peer_id,
    })
}

fn check_empty_payload(payload: &[u8], id: u8) -> Result<(), P2PMessageDecodingError> {
    if !payload.is_empty() {
        return Err(P2PMessageDecodingError::MalformedMessage(format!(
            "[P2PMessageDecodingError] Message with id {} must not have a payload",
            id
        )));
    }
    Ok(())
}

fn check_payload_length(
    payload: &[u8],
    expected_length: usize,
    id: u8,
) -> Result<(), P2PMessageDecodingError> {
    if payload.len() != expected_length {
        return Err(P2PMessageDecodingError::MalformedMessage(format!(
            "[P2PMessageDecodingError] Message with id {} must have a payload of {} bytes, got {}",
            id,
            expected_length,
            payload.len()
        )));
    }
    Ok(())
}

///
/// A partir del payload de un have (4 bytes, big endian), intenta generar un mensaje p2p del tipo "have".
///
fn try_decode_have_p2p_message(payload: &[u8]) -> Result<P2PMessage, P2PMessageDecodingError> {
    check_payload_length(payload, NUM_OF_BYTES_HAVE_PAYLOAD, ID_HAVE)?;
    let piece_index = concatenate_bytes_into_u32(payload)?;
    Ok(P2PMessage::Have { piece_index })
}

///
/// A partir del payload de un request o un cancel (12 bytes, big endian) devuelve sus tres campos.
///
fn try_decode_request_fields(
    payload: &[u8],
    id: u8,
) -> Result<(u32, u32, u32), P2PMessageDecodingError> {
    check_payload_length(payload, NUM_OF_BYTES_REQUEST_PAYLOAD, id)?;
    let piece_index = concatenate_bytes_into_u32(&payload[0..4])?;
    let beginning_byte_index = concatenate_bytes_into_u32(&payload[4..8])?;
    let amount_of_bytes = concatenate_bytes_into_u32(&payload[8..12])?;
    Ok((piece_index, beginning_byte_index, amount_of_bytes))
}

///
/// A partir del payload de un piece (minimo 8 bytes: index + begin + block), intenta generar un mensaje p2p del tipo "piece".
///
fn try_decode_piece_p2p_message(payload: &[u8]) -> Result<P2PMessage, P2PMessageDecodingError> {
    if payload.len() < NUM_OF_BYTES_PIECE_HEADER {
        return Err(P2PMessageDecodingError::MalformedMessage(
            "[P2PMessageDecodingError] A piece message needs at least 8 bytes of payload"
                .to_string(),
        ));
    }
    let piece_index = concatenate_bytes_into_u32(&payload[0..4])?;
    let beginning_byte_index = concatenate_bytes_into_u32(&payload[4..8])?;
    let block = payload[NUM_OF_BYTES_PIECE_HEADER..].to_vec();
    Ok(P2PMessage::Piece {
        piece_index,
        beginning_byte_index,
        block,
    })
}

// Matchea la id del mensaje p2p con su representacion correspondiente.
// Los IDs desconocidos no se interpretan: se devuelven como P2PMessage::Unknown.
fn match_p2p_msg_according_to_id(
    id_byte: u8,
    payload: &[u8],
) -> Result<P2PMessage, P2PMessageDecodingError> {
    match id_byte {
        ID_CHOKE => check_empty_payload(payload, id_byte).map(|_| P2PMessage::Choke),
        ID_UNCHOKE => check_empty_payload(payload, id_byte).map(|_| P2PMessage::Unchoke),
        ID_INTERESTED => check_empty_payload(payload, id_byte).map(|_| P2PMessage::Interested),
        ID_NOT_INTERESTED => {
            check_empty_payload(payload, id_byte).map(|_| P2PMessage::NotInterested)
        }
        ID_HAVE => try_decode_have_p2p_message(payload),
        ID_BITFIELD => Ok(P2PMessage::Bitfield {
            bitfield: payload.to_vec(),
        }),
        ID_REQUEST => {
            let (piece_index, beginning_byte_index, amount_of_bytes) =
                try_decode_request_fields(payload, id_byte)?;
            Ok(P2PMessage::Request {
                piece_index,
                beginning_byte_index,
                amount_of_bytes,
            })
        }
        ID_PIECE => try_decode_piece_p2p_message(payload),
        ID_CANCEL => {
            let (piece_index, beginning_byte_index, amount_of_bytes) =
                try_decode_request_fields(payload, id_byte)?;
            Ok(P2PMessage::Cancel {
                piece_index,
                beginning_byte_index,
                amount_of_bytes,
            })
        }
        id => Ok(P2PMessage::Unknown {
            id,
            payload: payload.to_vec(),
        }),
    }
}

/// Recibe un slice con todos los bytes correspondientes a un mensaje P2P a interpretar (incluyendo
/// el length prefix).
/// Devuelve un Result tal que:
/// - El Ok value es una variante de P2PMessage segun sea adecuado tras interpretar los bytes.
/// - El Err value es una variante de P2PMessageDecodingError si no se pudo interpretar el mensaje.
///
/// # Ejemplo de uso básico:
///
/// ```
/// # use shared::parsers::p2p;
/// # use shared::parsers::p2p::message::*;
/// let p2p_msg_bytes = [0, 0, 0, 13, 6, 0, 0, 0, 10, 0, 0, 0, 5, 0, 0, 0, 3];
/// assert_eq!(
///     Ok(P2PMessage::Request {
///         piece_index: 10,
///         beginning_byte_index: 5,
///         amount_of_bytes: 3
///     }),
///     p2p::decoder::from_bytes(&p2p_msg_bytes)
/// );
/// ```
///
pub fn from_bytes(bytes: &[u8]) -> Result<P2PMessage, P2PMessageDecodingError> {
    if bytes.len() < NUM_OF_BYTES_LENGHT_PREFIX {
        return Err(P2PMessageDecodingError::ByteAmount(
            "[P2PMessageDecodingError] The P2P msg to decode does not have enough bytes (min. 4 required)".to_string()
        ));
    }

    let lenght_prefix = decode_length_prefix(&bytes[0..NUM_OF_BYTES_LENGHT_PREFIX])?;
    let body = &bytes[NUM_OF_BYTES_LENGHT_PREFIX..];
    let body_length = u32::try_from(body.len()).map_err(|err| {
        P2PMessageDecodingError::FromUsizeToU32(format!("[P2PMessageDecodingError] {:?}", err))
    })?;

    if body_length != lenght_prefix {
        return Err(P2PMessageDecodingError::ByteAmount(
            "[P2PMessageDecodingError] The true length of the P2P msg does not match the one given in the length prefix".to_string()
        ));
    }

    match body.split_first() {
        None => Ok(P2PMessage::KeepAlive),
        Some((id_byte, payload)) => match_p2p_msg_according_to_id(*id_byte, payload),
    }
}

/// Copia el bloque de un mensaje Piece dentro del buffer de la pieza que se esta descargando.
///
/// Verifica, en este orden:
/// - que el mensaje sea de tipo Piece (`MalformedMessage` en caso contrario),
/// - que su indice sea el esperado (`IndexMismatch`),
/// - que el offset de comienzo caiga dentro del buffer (`OffsetOutOfRange`),
/// - que el bloque entre completo en el buffer (`DataOverflow`).
///
/// Devuelve la cantidad de bytes copiados.
pub fn copy_piece_block(
    msg: &P2PMessage,
    expected_piece_index: u32,
    buffer: &mut [u8],
) -> Result<usize, P2PMessageDecodingError> {
    let (piece_index, beginning_byte_index, block) = match msg {
        P2PMessage::Piece {
            piece_index,
            beginning_byte_index,
            block,
        } => (*piece_index, *beginning_byte_index, block),
        _ => {
            return Err(P2PMessageDecodingError::MalformedMessage(
                "[P2PMessageDecodingError] Expected a piece message".to_string(),
            ))
        }
    };

    if piece_index != expected_piece_index {
        return Err(P2PMessageDecodingError::IndexMismatch(format!(
            "[P2PMessageDecodingError] Expected piece index {}, got {}",
            expected_piece_index, piece_index
        )));
    }

    let begin = beginning_byte_index as usize;
    if begin >= buffer.len() {
        return Err(P2PMessageDecodingError::OffsetOutOfRange(format!(
            "[P2PMessageDecodingError] Begin offset {} is out of a buffer of {} bytes",
            begin,
            buffer.len()
        )));
    }

    if begin + block.len() > buffer.len() {
        return Err(P2PMessageDecodingError::DataOverflow(format!(
            "[P2PMessageDecodingError] Block of {} bytes at offset {} overflows a buffer of {} bytes",
            block.len(),
            begin,
            buffer.len()
        )));
    }

    buffer[begin..begin + block.len()].copy_from_slice(block);
    Ok(block.len())
}
