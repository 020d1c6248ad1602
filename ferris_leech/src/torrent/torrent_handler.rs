//! # Modulo de manejo general del archivo .torrent a ser descargado.
//! Este modulo contiene la funcion que recorre todo el proceso de la descarga: lectura de la
//! metadata, comunicacion con el tracker, descarga de las piezas y registro en el archivo de logs.

use crate::torrent::{
    client::{
        download_coordinator::{self, DownloadError, DownloadMode},
        entry_files_management::EntryArgs,
        peers_communication::local_peer_communicator::generate_peer_id,
        tracker_communication::http_handler::{self, ErrorMsgHttp},
    },
    data::config_file_data::ConfigFileData,
    logger::{self, LogError, Logger},
};
use core::fmt;
use log::{error, info, trace};
use shared::{
    metadata_analyzer::{self, MetadataError},
    torrent_file_data::{TorrentFileData, TorrentFileDataError},
};
use std::{error::Error, sync::mpsc::Sender as LoggerSender};

/// Representa un tipo de error en el manejo del archivo .torrent
#[derive(PartialEq, Eq, Debug)]
pub enum TorrentHandlerError {
    ReadingTorrent(MetadataError),
    CreatingTorrent(TorrentFileDataError),
    CreatingLogger(LogError),
    CommunicationWithTracker(ErrorMsgHttp),
    Download(DownloadError),
}

impl fmt::Display for TorrentHandlerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for TorrentHandlerError {}

type ResultTorrent<T> = Result<T, TorrentHandlerError>;

/// Lee el .torrent y arma su metadata.
pub fn read_torrent(torrent_path: &str) -> ResultTorrent<TorrentFileData> {
    let dic_torrent = metadata_analyzer::read_torrent_file_to_dic(torrent_path)
        .map_err(TorrentHandlerError::ReadingTorrent)?;
    TorrentFileData::new(dic_torrent).map_err(TorrentHandlerError::CreatingTorrent)
}

fn download_mode(entry_args: &EntryArgs, config_data: &ConfigFileData) -> DownloadMode {
    match &entry_args.resume_file {
        Some(partial_file) => DownloadMode::Resume {
            partial_file: partial_file.clone(),
        },
        None => DownloadMode::Fresh {
            output_dir: entry_args
                .output_dir
                .clone()
                .unwrap_or_else(|| config_data.get_download_path()),
        },
    }
}

fn send_to_logger(logger_sender: &LoggerSender<String>, content: String) {
    if logger_sender.send(content).is_err() {
        error!("No se pudo enviar el mensaje al archivo de logs");
    }
}

///
/// A partir de la metadata del .torrent se contacta al tracker y se descargan las piezas
/// pendientes de los peers obtenidos. Devuelve la cantidad de piezas descargadas.
///
fn handle_torrent(
    torrent_file: &TorrentFileData,
    entry_args: &EntryArgs,
    config_data: &ConfigFileData,
    logger_sender: &LoggerSender<String>,
) -> ResultTorrent<usize> {
    let peer_id = generate_peer_id();

    info!("Iniciando comunicacion con tracker");
    let tracker_response = http_handler::communicate_with_tracker(torrent_file, config_data, peer_id)
        .map_err(TorrentHandlerError::CommunicationWithTracker)?;
    info!(
        "Comunicacion con el tracker exitosa: {} peers",
        tracker_response.get_total_amount_peers()
    );

    download_coordinator::download_torrent(
        torrent_file,
        &tracker_response.peers,
        peer_id,
        download_mode(entry_args, config_data),
        logger_sender.clone(),
    )
    .map_err(TorrentHandlerError::Download)
}

///
/// Funcion principal del manejo de un archivo .torrent. El inicio, el fin y los errores de la
/// descarga quedan registrados en el archivo de logs del torrent.
///
pub fn handle_torrent_from_args(
    entry_args: &EntryArgs,
    config_data: &ConfigFileData,
) -> ResultTorrent<usize> {
    let torrent_file = read_torrent(&entry_args.torrent_path)?;
    trace!("Metadata del torrent leida correctamente");

    let logger = Logger::new(&config_data.get_log_path(), &torrent_file.get_name())
        .map_err(TorrentHandlerError::CreatingLogger)?;
    let (logger_sender, logger_handle) = logger
        .init_logger()
        .map_err(TorrentHandlerError::CreatingLogger)?;

    send_to_logger(
        &logger_sender,
        format!("[START] Descarga de {}", torrent_file.get_name()),
    );
    let result = handle_torrent(&torrent_file, entry_args, config_data, &logger_sender);
    match &result {
        Ok(amount) => send_to_logger(
            &logger_sender,
            format!("[END] Descarga completa: {} piezas", amount),
        ),
        Err(err) => send_to_logger(&logger_sender, format!("[ERROR] {}", err)),
    }

    logger::close_logger(logger_sender, logger_handle)
        .map_err(TorrentHandlerError::CreatingLogger)?;
    result
}
