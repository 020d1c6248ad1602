//! # Modulo de conexion con un peer
//! Este modulo contiene la estructura que representa la conexion del cliente con un unico peer externo:
//! el socket, los flags de choke/interes de ambas partes y el bitfield anunciado por el peer.

use crate::torrent::{
    client::peers_communication::{
        msg_receiver::{self, MsgReceiverError},
        msg_sender,
    },
    data::bitfield::{Bitfield, BitfieldError},
};
use log::{debug, trace};
use rand::{distributions::Alphanumeric, Rng};
use shared::parsers::p2p::message::{InfoHash, P2PMessage, PeerId};
use std::{
    error::Error,
    fmt,
    net::{SocketAddr, TcpStream},
    time::Duration,
};

//========================================================

const SIZE_PEER_ID: usize = 12;
const INIT_PEER_ID: &str = "-FL0001-";

pub const SECS_CONNECT_TIMEOUT: u64 = 10;
pub const SECS_BITFIELD_TIMEOUT: u64 = 5;

//========================================================

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum InteractionHandlerErrorKind {
    Recoverable(InteractionHandlerError),
    Unrecoverable(InteractionHandlerError),
}

impl fmt::Display for InteractionHandlerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for InteractionHandlerErrorKind {}

#[derive(PartialEq, Eq, Debug, Clone)]
/// Representa un tipo de error en la comunicación general P2P con un peer individual.
pub enum InteractionHandlerError {
    ConectingWithPeer(String),
    SendingHandshake(String),
    ReceivingHanshake(String),
    HandshakeMismatch(String),
    ProtocolViolation(String),
    SendingMessage(String),
    ReceivingMessage(String),
    Timeout(String),
    UpdatingBitfield(String),
    SettingDeadline(String),
    ReadingShutDownField(String),
    WritingShutDownField(String),
    LogError(String),
    WorkQueue(String),
}

impl fmt::Display for InteractionHandlerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for InteractionHandlerError {}

fn recoverable(error: InteractionHandlerError) -> InteractionHandlerErrorKind {
    InteractionHandlerErrorKind::Recoverable(error)
}

//========================================================

#[derive(Debug)]
/// Conexion abierta con un peer externo. Es propiedad exclusiva del worker que la creó.
pub struct LocalPeerCommunicator {
    pub peer_id: PeerId,
    pub stream: TcpStream,
    pub peer_address: SocketAddr,
    pub external_peer_id: PeerId,
    pub bitfield: Bitfield,
    pub am_choking: bool,
    pub am_interested: bool,
    pub peer_choking: bool,
    pub peer_interested: bool,
}

/// Funcion que crea un peer id unico para este cliente como peer
///
pub fn generate_peer_id() -> PeerId {
    let rand_alphanumeric: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SIZE_PEER_ID)
        .map(char::from)
        .collect();
    let str_peer = format!("{}{}", INIT_PEER_ID, rand_alphanumeric);
    debug!("Peer_id: {}", str_peer);

    let mut peer_id = [0; 20];
    peer_id.copy_from_slice(str_peer.as_bytes());
    peer_id
}

fn open_connection_with_peer(
    peer_address: &SocketAddr,
) -> Result<TcpStream, InteractionHandlerErrorKind> {
    TcpStream::connect_timeout(peer_address, Duration::from_secs(SECS_CONNECT_TIMEOUT)).map_err(
        |error| {
            recoverable(InteractionHandlerError::ConectingWithPeer(format!(
                "[InteractionHandlerError] {}: {}",
                peer_address, error
            )))
        },
    )
}

fn set_read_timeout(
    stream: &TcpStream,
    timeout: Option<Duration>,
) -> Result<(), InteractionHandlerErrorKind> {
    stream.set_read_timeout(timeout).map_err(|err| {
        recoverable(InteractionHandlerError::SettingDeadline(format!(
            "[InteractionHandlerError] {}",
            err
        )))
    })
}

fn map_receiver_error(
    error: MsgReceiverError,
    context: fn(String) -> InteractionHandlerError,
) -> InteractionHandlerErrorKind {
    match error {
        MsgReceiverError::TimedOut(msg) => recoverable(InteractionHandlerError::Timeout(msg)),
        other => recoverable(context(format!("{}", other))),
    }
}

/// Realiza el intercambio de handshakes. El peer debe responder con el mismo info hash.
fn exchange_handshakes(
    stream: &mut TcpStream,
    info_hash: InfoHash,
    peer_id: PeerId,
) -> Result<PeerId, InteractionHandlerErrorKind> {
    msg_sender::send_handshake(stream, info_hash, peer_id).map_err(|err| {
        recoverable(InteractionHandlerError::SendingHandshake(format!("{}", err)))
    })?;

    let handshake = msg_receiver::receive_handshake(stream)
        .map_err(|err| map_receiver_error(err, InteractionHandlerError::ReceivingHanshake))?;

    if handshake.info_hash != info_hash {
        return Err(recoverable(InteractionHandlerError::HandshakeMismatch(
            "[InteractionHandlerError] The received handshake has a different info hash."
                .to_string(),
        )));
    }
    Ok(handshake.peer_id)
}

/// El primer mensaje luego del handshake debe ser el bitfield del peer.
fn receive_bitfield(stream: &mut TcpStream) -> Result<Bitfield, InteractionHandlerErrorKind> {
    match msg_receiver::receive_message(stream)
        .map_err(|err| map_receiver_error(err, InteractionHandlerError::ReceivingMessage))?
    {
        P2PMessage::Bitfield { bitfield } => Ok(Bitfield::from_bytes(bitfield)),
        other => Err(recoverable(InteractionHandlerError::ProtocolViolation(
            format!(
                "[InteractionHandlerError] Expected a bitfield message, received {:?}",
                other
            ),
        ))),
    }
}

impl LocalPeerCommunicator {
    /// Abre la conexion con el peer, realiza el handshake y recibe su bitfield.
    /// El handshake y el bitfield tienen un timeout de lectura que se quita al finalizar.
    ///
    pub fn start_communication(
        peer_address: SocketAddr,
        info_hash: InfoHash,
        peer_id: PeerId,
    ) -> Result<Self, InteractionHandlerErrorKind> {
        let mut stream = open_connection_with_peer(&peer_address)?;
        set_read_timeout(&stream, Some(Duration::from_secs(SECS_BITFIELD_TIMEOUT)))?;

        let external_peer_id = exchange_handshakes(&mut stream, info_hash, peer_id)?;
        let bitfield = receive_bitfield(&mut stream)?;

        set_read_timeout(&stream, None)?;
        debug!(
            "Conexion establecida con el peer {} ({})",
            peer_address,
            String::from_utf8_lossy(&external_peer_id)
        );

        Ok(LocalPeerCommunicator {
            peer_id,
            stream,
            peer_address,
            external_peer_id,
            bitfield,
            am_choking: true,
            am_interested: false,
            peer_choking: true,
            peer_interested: false,
        })
    }

    fn map_sending_error(err: msg_sender::MsgSenderError) -> InteractionHandlerErrorKind {
        recoverable(InteractionHandlerError::SendingMessage(format!("{}", err)))
    }

    pub fn send_keep_alive(&mut self) -> Result<(), InteractionHandlerErrorKind> {
        msg_sender::send_keep_alive(&mut self.stream).map_err(Self::map_sending_error)
    }

    pub fn send_choke(&mut self) -> Result<(), InteractionHandlerErrorKind> {
        msg_sender::send_choke(&mut self.stream).map_err(Self::map_sending_error)?;
        self.am_choking = true;
        Ok(())
    }

    pub fn send_unchoke(&mut self) -> Result<(), InteractionHandlerErrorKind> {
        msg_sender::send_unchoke(&mut self.stream).map_err(Self::map_sending_error)?;
        self.am_choking = false;
        Ok(())
    }

    pub fn send_interested(&mut self) -> Result<(), InteractionHandlerErrorKind> {
        msg_sender::send_interested(&mut self.stream).map_err(Self::map_sending_error)?;
        self.am_interested = true;
        Ok(())
    }

    pub fn send_not_interested(&mut self) -> Result<(), InteractionHandlerErrorKind> {
        msg_sender::send_not_interested(&mut self.stream).map_err(Self::map_sending_error)?;
        self.am_interested = false;
        Ok(())
    }

    pub fn send_have(&mut self, piece_index: u32) -> Result<(), InteractionHandlerErrorKind> {
        msg_sender::send_have(&mut self.stream, piece_index).map_err(Self::map_sending_error)
    }

    pub fn send_request(
        &mut self,
        piece_index: u32,
        beginning_byte_index: u32,
        amount_of_bytes: u32,
    ) -> Result<(), InteractionHandlerErrorKind> {
        msg_sender::send_request(
            &mut self.stream,
            piece_index,
            beginning_byte_index,
            amount_of_bytes,
        )
        .map_err(Self::map_sending_error)
    }

    /// Lee un mensaje del peer. Un vencimiento del timeout de lectura se informa como `Timeout`.
    pub fn receive_message(&mut self) -> Result<P2PMessage, InteractionHandlerErrorKind> {
        let message = msg_receiver::receive_message(&mut self.stream)
            .map_err(|err| map_receiver_error(err, InteractionHandlerError::ReceivingMessage))?;
        trace!("Mensaje recibido de {}: {:?}", self.peer_address, message);
        Ok(message)
    }

    pub fn has_piece(&self, piece_index: u32) -> bool {
        self.bitfield.has_piece(piece_index as usize)
    }

    /// Registra que el peer anunció (via `have`) una nueva pieza.
    pub fn update_bitfield(&mut self, piece_index: u32) -> Result<(), InteractionHandlerErrorKind> {
        self.bitfield
            .set_piece(piece_index as usize)
            .map_err(|err: BitfieldError| {
                recoverable(InteractionHandlerError::UpdatingBitfield(format!("{}", err)))
            })
    }

    /// Configura los timeouts de lectura y escritura del socket. `None` los quita.
    pub fn set_stream_deadline(
        &self,
        timeout: Option<Duration>,
    ) -> Result<(), InteractionHandlerErrorKind> {
        set_read_timeout(&self.stream, timeout)?;
        self.stream.set_write_timeout(timeout).map_err(|err| {
            recoverable(InteractionHandlerError::SettingDeadline(format!(
                "[InteractionHandlerError] {}",
                err
            )))
        })
    }
}
