//! # Modulo general de manejo de datos
//! Este modulo contiene todos los submodulos usados para representar los datos importantes durante la descarga:
//! configuracion, respuesta del tracker, bitfields de peers y unidades de trabajo por pieza.
//!

pub mod bitfield;
pub mod config_file_data;
pub mod piece_work;
pub mod tracker_response_data;
