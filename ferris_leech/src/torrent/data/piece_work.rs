//! # Modulo de unidades de trabajo
//! Contiene las estructuras que circulan por las colas de trabajo y de resultados
//! compartidas entre el coordinador de la descarga y los workers de cada peer.

use shared::torrent_file_data::{TorrentFileData, TorrentFileDataError};

#[derive(PartialEq, Eq, Debug, Clone)]
/// Pieza pendiente de descarga. Se crea una unica vez y se reencola tal cual ante cualquier falla.
pub struct PieceWork {
    pub index: u32,
    pub hash: [u8; 20],
    pub length: usize,
}

#[derive(PartialEq, Eq, Debug, Clone)]
/// Pieza descargada y validada, lista para ser escrita en el archivo final.
pub struct PieceResult {
    pub index: u32,
    pub buf: Vec<u8>,
}

impl PieceWork {
    /// Genera la unidad de trabajo de la pieza de indice dado a partir de la metadata del torrent.
    pub fn new(
        torrent_file_data: &TorrentFileData,
        piece_index: usize,
    ) -> Result<Self, TorrentFileDataError> {
        let hash = torrent_file_data.get_piece_sha1(piece_index)?;
        let length = torrent_file_data.calculate_piece_lenght(piece_index)? as usize;
        Ok(PieceWork {
            index: piece_index as u32,
            hash,
            length,
        })
    }
}
