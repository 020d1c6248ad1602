//! # Modulo de Values
//! Este modulo contiene el enumerado con los valores utilizados en el Bencoding

use std::{collections::HashMap, error::Error, fmt};

pub type DicValues = HashMap<Vec<u8>, ValuesBencoding>;

///Enumerado de los distintos tipos que puede haber en el bencoding
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum ValuesBencoding {
    String(Vec<u8>),
    Integer(i64),
    List(Vec<ValuesBencoding>),
    Dic(DicValues),
}

///Enumerado del tipo de valor en el que surgio un error de decodificacion
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum ErrorBencoding {
    String(ErrorType),
    Integer(ErrorType),
    List(ErrorType),
    Dic(ErrorType),
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum ErrorType {
    Format,
    Long,
    Number,
}

impl fmt::Display for ErrorBencoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for ErrorBencoding {}
