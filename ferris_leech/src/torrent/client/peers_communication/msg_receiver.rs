//! # Modulo de recepcion de mensajes P2P
//! Lectura de mensajes completos desde un socket: primero el length prefix y luego
//! exactamente la cantidad de bytes que este indica.

use shared::parsers::{
    p2p,
    p2p::constants::{NUM_OF_BYTES_LENGHT_PREFIX, NUM_OF_FIXED_BYTES_HANDSHAKE},
    p2p::message::{Handshake, P2PMessage, P2PMessageDecodingError},
};
use std::{
    error::Error,
    fmt,
    io::{self, ErrorKind, Read},
};

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum MsgReceiverError {
    TimedOut(String),
    ReadingStream(String),
    Decoding(P2PMessageDecodingError),
}

impl fmt::Display for MsgReceiverError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for MsgReceiverError {}

fn map_io_error(error: io::Error) -> MsgReceiverError {
    match error.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => {
            MsgReceiverError::TimedOut(format!("[MsgReceiverError] {}", error))
        }
        _ => MsgReceiverError::ReadingStream(format!("[MsgReceiverError] {}", error)),
    }
}

fn read_exact_bytes<R: Read>(stream: &mut R, amount: usize) -> Result<Vec<u8>, MsgReceiverError> {
    let mut buffer = vec![0; amount];
    stream.read_exact(&mut buffer).map_err(map_io_error)?;
    Ok(buffer)
}

/// Recibe un handshake: lee el pstrlen y luego `pstrlen + 48` bytes.
/// Un pstrlen igual a cero se rechaza sin leer nada mas.
///
pub fn receive_handshake<R: Read>(stream: &mut R) -> Result<Handshake, MsgReceiverError> {
    let pstrlen = read_exact_bytes(stream, 1)?[0];
    if pstrlen == 0 {
        return Err(MsgReceiverError::Decoding(
            P2PMessageDecodingError::ProtocolError(
                "[MsgReceiverError] The handshake pstrlen cannot be zero".to_string(),
            ),
        ));
    }
    let rest = read_exact_bytes(stream, usize::from(pstrlen) + NUM_OF_FIXED_BYTES_HANDSHAKE)?;

    p2p::decoder::decode_handshake(pstrlen, &rest).map_err(MsgReceiverError::Decoding)
}

/// Recibe un mensaje P2P completo. Un length prefix mayor al maximo aceptado se rechaza
/// antes de reservar memoria para el cuerpo.
///
pub fn receive_message<R: Read>(stream: &mut R) -> Result<P2PMessage, MsgReceiverError> {
    let mut bytes = read_exact_bytes(stream, NUM_OF_BYTES_LENGHT_PREFIX)?;
    let lenght_prefix_value =
        p2p::decoder::decode_length_prefix(&bytes).map_err(MsgReceiverError::Decoding)?;

    let mut body = read_exact_bytes(stream, lenght_prefix_value as usize)?;
    bytes.append(&mut body);

    p2p::decoder::from_bytes(&bytes).map_err(MsgReceiverError::Decoding)
}

#[cfg(test)]
mod test_msg_receiver {
    use super::*;
    use shared::parsers::p2p::constants::PSTR_STRING_HANDSHAKE;
    use std::{
        io::{Cursor, Write},
        net::{TcpListener, TcpStream},
        time::Duration,
    };

    fn default_handshake() -> Handshake {
        Handshake {
            protocol_str: PSTR_STRING_HANDSHAKE.to_string(),
            info_hash: [1; 20],
            peer_id: *b"-FL0001-000000000000",
        }
    }

    mod test_receive_handshake {
        use super::*;

        #[test]
        fn receive_handshake_ok() -> Result<(), Box<dyn Error>> {
            let bytes = p2p::encoder::handshake_to_bytes(&default_handshake())?;
            assert_eq!(
                default_handshake(),
                receive_handshake(&mut Cursor::new(bytes))?
            );
            Ok(())
        }

        #[test]
        fn receive_handshake_with_less_bytes_error() -> Result<(), Box<dyn Error>> {
            let mut bytes = p2p::encoder::handshake_to_bytes(&default_handshake())?;
            bytes.pop();
            assert!(matches!(
                receive_handshake(&mut Cursor::new(bytes)),
                Err(MsgReceiverError::ReadingStream(_))
            ));
            Ok(())
        }

        #[test]
        fn receive_handshake_with_zero_pstrlen_error() -> Result<(), Box<dyn Error>> {
            let mut bytes = vec![0];
            bytes.extend_from_slice(&[0; NUM_OF_FIXED_BYTES_HANDSHAKE]);
            assert!(matches!(
                receive_handshake(&mut Cursor::new(bytes)),
                Err(MsgReceiverError::Decoding(
                    P2PMessageDecodingError::ProtocolError(_)
                ))
            ));
            Ok(())
        }

        #[test]
        fn receive_handshake_with_only_zero_pstrlen_error() {
            let mut stream = Cursor::new(vec![0u8]);
            assert!(matches!(
                receive_handshake(&mut stream),
                Err(MsgReceiverError::Decoding(
                    P2PMessageDecodingError::ProtocolError(_)
                ))
            ));
            assert_eq!(1, stream.position());
        }

        #[test]
        fn decoding_errors_can_be_cloned() {
            let error = MsgReceiverError::Decoding(P2PMessageDecodingError::ProtocolError(
                "pstrlen".to_string(),
            ));
            assert_eq!(error, error.clone());
        }
    }

    mod test_receive_message {
        use super::*;

        #[test]
        fn receive_keep_alive_ok() -> Result<(), Box<dyn Error>> {
            let mut stream = Cursor::new(vec![0, 0, 0, 0]);
            assert_eq!(P2PMessage::KeepAlive, receive_message(&mut stream)?);
            Ok(())
        }

        #[test]
        fn receive_two_consecutive_messages_ok() -> Result<(), Box<dyn Error>> {
            let mut bytes = p2p::encoder::to_bytes(P2PMessage::Unchoke)?;
            bytes.append(&mut p2p::encoder::to_bytes(P2PMessage::Piece {
                piece_index: 2,
                beginning_byte_index: 0,
                block: vec![9, 9, 9],
            })?);
            let mut stream = Cursor::new(bytes);

            assert_eq!(P2PMessage::Unchoke, receive_message(&mut stream)?);
            assert_eq!(
                P2PMessage::Piece {
                    piece_index: 2,
                    beginning_byte_index: 0,
                    block: vec![9, 9, 9],
                },
                receive_message(&mut stream)?
            );
            Ok(())
        }

        #[test]
        fn receive_message_too_long_error() {
            let mut stream = Cursor::new(vec![0xff, 0xff, 0xff, 0xff]);
            assert!(matches!(
                receive_message(&mut stream),
                Err(MsgReceiverError::Decoding(
                    P2PMessageDecodingError::MessageTooLong(_)
                ))
            ));
        }

        #[test]
        fn receive_truncated_message_error() {
            let mut stream = Cursor::new(vec![0, 0, 0, 5, 4, 0]);
            assert!(matches!(
                receive_message(&mut stream),
                Err(MsgReceiverError::ReadingStream(_))
            ));
        }

        #[test]
        fn receive_message_from_silent_peer_times_out() -> Result<(), Box<dyn Error>> {
            let listener = TcpListener::bind("127.0.0.1:0")?;
            let mut sender_stream = TcpStream::connect(listener.local_addr()?)?;
            let (mut receptor_stream, _addr) = listener.accept()?;
            receptor_stream.set_read_timeout(Some(Duration::from_millis(50)))?;

            sender_stream.write_all(&[0, 0])?;

            assert!(matches!(
                receive_message(&mut receptor_stream),
                Err(MsgReceiverError::TimedOut(_))
            ));
            Ok(())
        }
    }
}
