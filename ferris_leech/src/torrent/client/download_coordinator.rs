//! # Modulo de coordinacion de la descarga
//! Arma la cola de trabajo con las piezas pendientes, lanza un worker por peer y escribe en el
//! archivo destino cada pieza validada que estos devuelven.
//!

use crate::torrent::{
    client::{
        peers_communication::{
            handler_communication::{self, PeerWorkerContext},
            local_peer_communicator::InteractionHandlerError,
            piece_downloader,
        },
        pieces_assembling_handler::{PiecesAssemblerError, TargetFile},
    },
    data::{
        piece_work::{PieceResult, PieceWork},
        tracker_response_data::PeerEndpoint,
    },
};
use crossbeam_channel::Receiver;
use log::{info, warn};
use shared::{parsers::p2p::message::PeerId, torrent_file_data::TorrentFileData};
use std::{
    error::Error,
    fmt,
    sync::{mpsc::Sender as LoggerSender, Arc, RwLock},
    thread::JoinHandle,
};

type ResultDownload<T> = Result<T, DownloadError>;

#[derive(Debug, PartialEq, Eq)]
pub enum DownloadError {
    AlreadyComplete(String),
    NoPeersLeft(String),
    PieceWork(String),
    Storage(PiecesAssemblerError),
    Queue(String),
    ShutDown(String),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for DownloadError {}

#[derive(Debug, PartialEq, Eq, Clone)]
/// Forma de iniciar la descarga: desde cero en un directorio, o retomando un archivo parcial.
pub enum DownloadMode {
    Fresh { output_dir: String },
    Resume { partial_file: String },
}

/// Una unidad de trabajo por cada pieza del torrent.
pub fn collect_fresh_piece_works(torrent: &TorrentFileData) -> ResultDownload<Vec<PieceWork>> {
    (0..torrent.get_total_amount_pieces())
        .map(|index| {
            PieceWork::new(torrent, index)
                .map_err(|err| DownloadError::PieceWork(format!("{}", err)))
        })
        .collect()
}

/// Una unidad de trabajo solo por cada pieza cuyo contenido en disco no pasa la validacion.
/// Si no queda ninguna se devuelve `AlreadyComplete`.
pub fn collect_resume_piece_works(
    torrent: &TorrentFileData,
    target: &mut TargetFile,
) -> ResultDownload<Vec<PieceWork>> {
    let mut piece_works = vec![];
    for piece_work in collect_fresh_piece_works(torrent)? {
        let (begin, end) = torrent
            .calc_piece_bounds(piece_work.index as usize)
            .map_err(|err| DownloadError::PieceWork(format!("{}", err)))?;
        let on_disk = target.read_at(begin, end).map_err(DownloadError::Storage)?;
        if piece_downloader::validate_piece(&piece_work, &on_disk).is_err() {
            piece_works.push(piece_work);
        }
    }

    if piece_works.is_empty() {
        return Err(DownloadError::AlreadyComplete(format!(
            "[DownloadError] {} is already complete",
            target.get_path().display()
        )));
    }
    info!("Quedan {} piezas por descargar", piece_works.len());
    Ok(piece_works)
}

fn prepare_target(
    torrent: &TorrentFileData,
    mode: &DownloadMode,
) -> ResultDownload<(TargetFile, Vec<PieceWork>)> {
    match mode {
        DownloadMode::Fresh { output_dir } => {
            let target =
                TargetFile::allocate(output_dir, &torrent.get_name(), torrent.get_total_length())
                    .map_err(DownloadError::Storage)?;
            Ok((target, collect_fresh_piece_works(torrent)?))
        }
        DownloadMode::Resume { partial_file } => {
            let mut target = TargetFile::open(partial_file, torrent.get_total_length())
                .map_err(DownloadError::Storage)?;
            let piece_works = collect_resume_piece_works(torrent, &mut target)?;
            Ok((target, piece_works))
        }
    }
}

/// Recibe exactamente `amount_of_pieces` resultados y los escribe en su offset.
/// Si todos los workers terminaron antes, el canal se desconecta y se devuelve `NoPeersLeft`.
fn collect_results(
    torrent: &TorrentFileData,
    target: &mut TargetFile,
    result_receiver: &Receiver<PieceResult>,
    amount_of_pieces: usize,
    logger_sender: &LoggerSender<String>,
) -> ResultDownload<usize> {
    for done in 1..=amount_of_pieces {
        let piece_result = result_receiver.recv().map_err(|_| {
            DownloadError::NoPeersLeft(format!(
                "[DownloadError] All peers are gone with {} pieces left",
                amount_of_pieces - done + 1
            ))
        })?;

        let (begin, _end) = torrent
            .calc_piece_bounds(piece_result.index as usize)
            .map_err(|err| DownloadError::PieceWork(format!("{}", err)))?;
        target
            .write_at(&piece_result.buf, begin)
            .map_err(DownloadError::Storage)?;

        let percent = done as f64 / amount_of_pieces as f64 * 100.0;
        info!(
            "({:.2}%) Pieza #{} descargada ({}/{})",
            percent, piece_result.index, done, amount_of_pieces
        );
        if logger_sender
            .send(format!(
                "[PROGRESS] {}/{} piezas ({:.2}%)",
                done, amount_of_pieces, percent
            ))
            .is_err()
        {
            warn!("No se pudo enviar el progreso al archivo de logs");
        }
    }
    Ok(amount_of_pieces)
}

fn shut_down_workers(
    shut_down: &Arc<RwLock<bool>>,
    workers: Vec<JoinHandle<Result<(), InteractionHandlerError>>>,
) -> ResultDownload<()> {
    handler_communication::set_shut_down(shut_down)
        .map_err(|err| DownloadError::ShutDown(format!("{}", err)))?;
    for worker in workers {
        match worker.join() {
            Ok(Ok(())) => (),
            Ok(Err(err)) => warn!("Un worker termino con error: {}", err),
            Err(_) => warn!("Un worker termino abruptamente"),
        }
    }
    Ok(())
}

///
/// Funcion principal de la descarga de un torrent. Devuelve la cantidad de piezas escritas
/// en esta ejecucion. Los errores de un peer solo terminan su worker; los errores de
/// almacenamiento, o quedarse sin peers con piezas pendientes, abortan la descarga.
///
pub fn download_torrent(
    torrent: &TorrentFileData,
    peers: &[PeerEndpoint],
    peer_id: PeerId,
    mode: DownloadMode,
    logger_sender: LoggerSender<String>,
) -> ResultDownload<usize> {
    let (mut target, piece_works) = prepare_target(torrent, &mode)?;
    let amount_of_pieces = piece_works.len();
    info!(
        "Comenzando la descarga de {} piezas de {} con {} peers",
        amount_of_pieces,
        torrent.get_name(),
        peers.len()
    );

    let (work_sender, work_receiver) = crossbeam_channel::bounded(amount_of_pieces);
    let (result_sender, result_receiver) = crossbeam_channel::bounded(amount_of_pieces);
    for piece_work in piece_works {
        work_sender
            .send(piece_work)
            .map_err(|err| DownloadError::Queue(format!("{}", err)))?;
    }

    let shut_down = Arc::new(RwLock::new(false));
    let context = PeerWorkerContext {
        info_hash: torrent.get_info_hash(),
        peer_id,
        work_sender,
        work_receiver,
        result_sender,
        logger_sender: logger_sender.clone(),
        shut_down: shut_down.clone(),
        queue_capacity: amount_of_pieces,
    };
    let workers: Vec<_> = peers
        .iter()
        .map(|peer| {
            handler_communication::spawn_peer_worker(peer.get_socket_addr(), context.clone())
        })
        .collect();
    // Solo los workers deben conservar senders de resultados.
    drop(context);

    let result = collect_results(
        torrent,
        &mut target,
        &result_receiver,
        amount_of_pieces,
        &logger_sender,
    );

    shut_down_workers(&shut_down, workers)?;
    target.close().map_err(DownloadError::Storage)?;
    result
}
