//! # Ferris Leech
//! ### Objetivo del Proyecto
//!
//! Cliente de BitTorrent que solo descarga (no comparte piezas con otros peers).
//!
//! - Recibe por linea de comandos la ruta de un archivo .torrent, y opcionalmente el directorio
//!   destino y un archivo parcial a retomar.
//! - El .torrent es leído y decodificado según el estándar y su información almacenada.
//! - Se comunica con el Tracker del .torrent y obtiene una lista de peers.
//! - Descarga las piezas concurrentemente, un worker por peer, validando cada una por su SHA-1.
//! - Cada pieza validada se escribe directamente en su posicion dentro del archivo destino.
//! - Cuenta con un logger en archivos que indica el inicio, el progreso y el fin de la descarga.
//! - Se pueden customizar el puerto anunciado, el directorio de descargas y de logs mediante un
//!   archivo config.txt
//!

pub mod torrent;

use crate::torrent::{
    client::entry_files_management, data::config_file_data::ConfigFileData, torrent_handler,
};
use log::info;
use std::error::Error;

const CONFIG_PATH: &str = "config.txt";

///
///  FUNCION PRINCIPAL PARA LA EJECUCION DEL PROGRAMA
/// A partir de la ruta de un .torrent enviada por consola se descarga el archivo correspondiente
/// en el directorio indicado (o en el de descargas del archivo de configuración).
/// Devuelve un Error si hubo algún problema durante todo el proceso.
///
pub fn run() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();
    info!("Iniciando el programa");

    let config_data = ConfigFileData::new_or_default(CONFIG_PATH)?;
    let entry_args = entry_files_management::read_entry_args()?;

    let amount = torrent_handler::handle_torrent_from_args(&entry_args, &config_data)?;
    info!("Descarga finalizada: {} piezas nuevas", amount);
    Ok(())
}
