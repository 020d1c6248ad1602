//! # Modulo de manejo de comunicación con peers
//! Este modulo contiene las funciones encargadas de controlar la logica de conexion e interaccion con cada peer:
//! un worker (thread) por peer, que toma piezas de la cola de trabajo compartida y devuelve las piezas validadas.
//!

use crate::torrent::{
    client::peers_communication::{
        local_peer_communicator::{
            InteractionHandlerError, InteractionHandlerErrorKind, LocalPeerCommunicator,
        },
        piece_downloader::{self, PieceDownloadError},
    },
    data::piece_work::{PieceResult, PieceWork},
};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use shared::parsers::p2p::message::{InfoHash, PeerId};
use std::{
    net::SocketAddr,
    sync::{mpsc::Sender as LoggerSender, Arc, RwLock},
    thread::{self, JoinHandle},
    time::Duration,
};

type ResultInteraction<T> = Result<T, InteractionHandlerError>;
type JoinHandleInteraction<T> = JoinHandle<ResultInteraction<T>>;

pub const MILLIS_WORK_POLL: u64 = 100;
pub const REQUEUE_BACKOFF_MILLIS: u64 = 50;

#[derive(Debug, Clone)]
/// Todo lo que comparte un worker con el coordinador de la descarga.
pub struct PeerWorkerContext {
    pub info_hash: InfoHash,
    pub peer_id: PeerId,
    pub work_sender: Sender<PieceWork>,
    pub work_receiver: Receiver<PieceWork>,
    pub result_sender: Sender<PieceResult>,
    pub logger_sender: LoggerSender<String>,
    pub shut_down: Arc<RwLock<bool>>,
    pub queue_capacity: usize,
}

pub fn is_shut_down_set(shut_down: &Arc<RwLock<bool>>) -> ResultInteraction<bool> {
    let global_shut_down = shut_down
        .read()
        .map_err(|error| InteractionHandlerError::ReadingShutDownField(format!("{:?}", error)))?;
    Ok(*global_shut_down)
}

pub fn set_shut_down(shut_down: &Arc<RwLock<bool>>) -> ResultInteraction<()> {
    let mut shut_down = shut_down
        .write()
        .map_err(|error| InteractionHandlerError::WritingShutDownField(format!("{:?}", error)))?;
    *shut_down = true;
    Ok(())
}

fn requeue(
    context: &PeerWorkerContext,
    piece_work: PieceWork,
) -> Result<(), InteractionHandlerErrorKind> {
    context.work_sender.send(piece_work).map_err(|err| {
        InteractionHandlerErrorKind::Unrecoverable(InteractionHandlerError::WorkQueue(format!(
            "[InteractionHandlerError] {}",
            err
        )))
    })
}

fn log_in_file(
    context: &PeerWorkerContext,
    content: String,
) -> Result<(), InteractionHandlerErrorKind> {
    context.logger_sender.send(content).map_err(|err| {
        InteractionHandlerErrorKind::Recoverable(InteractionHandlerError::LogError(format!(
            "{}",
            err
        )))
    })
}

/// Descarga y valida una pieza; ante cualquier falla la pieza vuelve a la cola.
fn download_and_deliver(
    peer: &mut LocalPeerCommunicator,
    piece_work: PieceWork,
    context: &PeerWorkerContext,
) -> Result<(), InteractionHandlerErrorKind> {
    let downloaded = piece_downloader::download_piece(peer, &piece_work, &context.shut_down)
        .and_then(|buf| piece_downloader::validate_piece(&piece_work, &buf).map(|_| buf));

    let buf = match downloaded {
        Ok(buf) => buf,
        Err(err) => {
            let index = piece_work.index;
            requeue(context, piece_work)?;
            return Err(match err {
                PieceDownloadError::Communication(kind) => kind,
                other => InteractionHandlerErrorKind::Recoverable(
                    InteractionHandlerError::ReceivingMessage(format!(
                        "[InteractionHandlerError] Piece {} failed: {}",
                        index, other
                    )),
                ),
            });
        }
    };

    let index = piece_work.index;
    context
        .result_sender
        .send(PieceResult { index, buf })
        .map_err(|err| {
            InteractionHandlerErrorKind::Unrecoverable(InteractionHandlerError::WorkQueue(
                format!("[InteractionHandlerError] {}", err),
            ))
        })?;
    log_in_file(
        context,
        format!("[PIECE] Pieza {} descargada del peer {}", index, peer.peer_address),
    )?;
    peer.send_have(index)
}

/// Loop principal del worker: toma piezas de la cola hasta que se activa el shutdown,
/// se cierra la cola o falla la comunicacion con el peer.
fn interact_with_peer(
    peer: &mut LocalPeerCommunicator,
    context: &PeerWorkerContext,
) -> Result<(), InteractionHandlerErrorKind> {
    peer.send_unchoke()?;
    peer.send_interested()?;

    let mut consecutive_requeues = 0;
    loop {
        if is_shut_down_set(&context.shut_down)
            .map_err(InteractionHandlerErrorKind::Unrecoverable)?
        {
            return Ok(());
        }

        let piece_work = match context
            .work_receiver
            .recv_timeout(Duration::from_millis(MILLIS_WORK_POLL))
        {
            Ok(piece_work) => piece_work,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        };

        if !peer.has_piece(piece_work.index) {
            requeue(context, piece_work)?;
            consecutive_requeues += 1;
            if consecutive_requeues >= context.queue_capacity {
                thread::sleep(Duration::from_millis(REQUEUE_BACKOFF_MILLIS));
                consecutive_requeues = 0;
            }
            continue;
        }
        consecutive_requeues = 0;

        download_and_deliver(peer, piece_work, context)?;
    }
}

///
/// Funcion encargada de realizar la interaccion con un unico peer dentro de un thread.
/// Los errores recuperables (conexion, handshake, descarga de una pieza) solo terminan este worker;
/// los irrecuperables (colas o shutdown inaccesibles) se devuelven en el join.
///
pub fn spawn_peer_worker(
    peer_address: SocketAddr,
    context: PeerWorkerContext,
) -> JoinHandleInteraction<()> {
    thread::spawn(move || {
        let mut peer = match LocalPeerCommunicator::start_communication(
            peer_address,
            context.info_hash,
            context.peer_id,
        ) {
            Ok(peer) => peer,
            Err(InteractionHandlerErrorKind::Recoverable(err)) => {
                debug!("No se pudo conectar con el peer {}: {}", peer_address, err);
                return Ok(());
            }
            Err(InteractionHandlerErrorKind::Unrecoverable(err)) => return Err(err),
        };
        info!("Comienza la interaccion con el peer {}", peer_address);

        match interact_with_peer(&mut peer, &context) {
            Ok(()) => Ok(()),
            Err(InteractionHandlerErrorKind::Recoverable(err)) => {
                warn!(
                    "Se termina la interaccion con el peer {}: {}",
                    peer_address, err
                );
                Ok(())
            }
            Err(InteractionHandlerErrorKind::Unrecoverable(err)) => Err(err),
        }
    })
}
