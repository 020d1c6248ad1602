//! # Modulo de descarga de una pieza
//! Maquina de estados que descarga una pieza completa de un peer: mantiene hasta `MAX_BACKLOG`
//! requests en vuelo, procesa los mensajes recibidos y valida el resultado contra su SHA1.

use crate::torrent::{
    client::peers_communication::local_peer_communicator::{
        InteractionHandlerError, InteractionHandlerErrorKind, LocalPeerCommunicator,
    },
    data::piece_work::PieceWork,
};
use log::trace;
use sha1::{Digest, Sha1};
use shared::parsers::p2p::{self, message::P2PMessage};
use std::{
    error::Error,
    fmt,
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};

pub const MAX_BACKLOG: usize = 5;
pub const BLOCK_BYTES: usize = 16384;
pub const SECS_PIECE_DEADLINE: u64 = 30;

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum PieceDownloadError {
    Timeout(String),
    ShutDown(String),
    HashMismatch(String),
    InvalidBlock(String),
    Communication(InteractionHandlerErrorKind),
}

impl fmt::Display for PieceDownloadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for PieceDownloadError {}

fn from_communication_error(error: InteractionHandlerErrorKind) -> PieceDownloadError {
    match error {
        InteractionHandlerErrorKind::Recoverable(InteractionHandlerError::Timeout(msg))
        | InteractionHandlerErrorKind::Unrecoverable(InteractionHandlerError::Timeout(msg)) => {
            PieceDownloadError::Timeout(msg)
        }
        other => PieceDownloadError::Communication(other),
    }
}

/// Estado transitorio de un intento de descarga de una pieza.
#[derive(Debug)]
struct PieceProgress {
    index: u32,
    buf: Vec<u8>,
    downloaded: usize,
    requested: usize,
    backlog: usize,
}

impl PieceProgress {
    fn new(piece_work: &PieceWork) -> Self {
        PieceProgress {
            index: piece_work.index,
            buf: vec![0; piece_work.length],
            downloaded: 0,
            requested: 0,
            backlog: 0,
        }
    }

    fn is_complete(&self) -> bool {
        self.downloaded >= self.buf.len()
    }

    /// Envia requests hasta completar el backlog o haber pedido toda la pieza.
    fn fill_backlog(
        &mut self,
        peer: &mut LocalPeerCommunicator,
    ) -> Result<(), PieceDownloadError> {
        while self.backlog < MAX_BACKLOG && self.requested < self.buf.len() {
            let block_size = BLOCK_BYTES.min(self.buf.len() - self.requested);
            peer.send_request(self.index, self.requested as u32, block_size as u32)
                .map_err(from_communication_error)?;
            self.backlog += 1;
            self.requested += block_size;
        }
        Ok(())
    }

    /// Procesa un mensaje recibido durante la descarga.
    fn read_message(
        &mut self,
        peer: &mut LocalPeerCommunicator,
    ) -> Result<(), PieceDownloadError> {
        let message = peer.receive_message().map_err(from_communication_error)?;
        match message {
            P2PMessage::Unchoke => peer.peer_choking = false,
            P2PMessage::Choke => peer.peer_choking = true,
            P2PMessage::Interested => peer.peer_interested = true,
            P2PMessage::NotInterested => peer.peer_interested = false,
            P2PMessage::Have { piece_index } => peer
                .update_bitfield(piece_index)
                .map_err(PieceDownloadError::Communication)?,
            P2PMessage::Piece { .. } => {
                let amount = p2p::decoder::copy_piece_block(&message, self.index, &mut self.buf)
                    .map_err(|err| PieceDownloadError::InvalidBlock(format!("{}", err)))?;
                self.downloaded += amount;
                self.backlog = self.backlog.saturating_sub(1);
            }
            other => trace!("Mensaje ignorado durante la descarga: {:?}", other),
        }
        Ok(())
    }
}

fn is_shut_down_set(shut_down: &Arc<RwLock<bool>>) -> Result<bool, PieceDownloadError> {
    let flag = shut_down
        .read()
        .map_err(|err| PieceDownloadError::ShutDown(format!("{}", err)))?;
    Ok(*flag)
}

/// Descarga la pieza con el deadline por defecto de `SECS_PIECE_DEADLINE` segundos.
pub fn download_piece(
    peer: &mut LocalPeerCommunicator,
    piece_work: &PieceWork,
    shut_down: &Arc<RwLock<bool>>,
) -> Result<Vec<u8>, PieceDownloadError> {
    download_piece_with_deadline(
        peer,
        piece_work,
        Duration::from_secs(SECS_PIECE_DEADLINE),
        shut_down,
    )
}

/// Descarga la pieza indicada. El intento completo tiene un deadline absoluto: antes de cada
/// envio de requests y lectura se configura en el socket el tiempo restante (lectura y
/// escritura), y al terminar (bien o mal) se quita.
pub fn download_piece_with_deadline(
    peer: &mut LocalPeerCommunicator,
    piece_work: &PieceWork,
    deadline: Duration,
    shut_down: &Arc<RwLock<bool>>,
) -> Result<Vec<u8>, PieceDownloadError> {
    let result = run_download(peer, piece_work, Instant::now() + deadline, shut_down);
    let reset = peer
        .set_stream_deadline(None)
        .map_err(PieceDownloadError::Communication);
    let buf = result?;
    reset?;
    Ok(buf)
}

fn run_download(
    peer: &mut LocalPeerCommunicator,
    piece_work: &PieceWork,
    deadline: Instant,
    shut_down: &Arc<RwLock<bool>>,
) -> Result<Vec<u8>, PieceDownloadError> {
    let mut progress = PieceProgress::new(piece_work);

    while !progress.is_complete() {
        if is_shut_down_set(shut_down)? {
            return Err(PieceDownloadError::ShutDown(
                "[PieceDownloadError] Download interrupted by shut down".to_string(),
            ));
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(PieceDownloadError::Timeout(format!(
                "[PieceDownloadError] Deadline exceeded for piece {}",
                piece_work.index
            )));
        }
        peer.set_stream_deadline(Some(remaining))
            .map_err(PieceDownloadError::Communication)?;

        if !peer.peer_choking {
            progress.fill_backlog(peer)?;
        }
        progress.read_message(peer)?;
    }

    Ok(progress.buf)
}

/// Compara el SHA1 de la pieza descargada con el esperado.
pub fn validate_piece(piece_work: &PieceWork, buf: &[u8]) -> Result<(), PieceDownloadError> {
    let mut hasher = Sha1::new();
    hasher.update(buf);
    if hasher.finalize().as_slice() != piece_work.hash {
        return Err(PieceDownloadError::HashMismatch(format!(
            "[PieceDownloadError] Piece {} failed the integrity check",
            piece_work.index
        )));
    }
    Ok(())
}
