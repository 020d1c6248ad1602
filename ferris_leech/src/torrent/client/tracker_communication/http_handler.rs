//! # Modulo de manejo de comunicacion con Tracker
//! Este modulo contiene las funciones encargadas de envio, recepcion,
//! interpretación y almacenamiento de información obtenida de comunicación
//! con un tracker correspondiente a un .torrent
//!

use native_tls::TlsConnector;

use super::constants::*;
use crate::torrent::data::{
    config_file_data::ConfigFileData,
    tracker_response_data::{ResponseError, TrackerResponseData},
};

use shared::{
    parsers::{bencoding, bencoding::values::DicValues, p2p::message::PeerId, url_encoder},
    torrent_file_data::TorrentFileData,
};

use log::{debug, error, trace};
use std::{
    error::Error,
    fmt,
    io::{Read, Write},
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

type ResultMsg<T> = Result<T, ErrorMsgHttp>;

pub trait ReadAndWrite: Read + Write {}

impl<T: Read + Write> ReadAndWrite for T {}

///Enumerado que representa los tipos de error que pueden surgir en comunicación con tracker
#[derive(Debug, PartialEq, Eq)]
pub enum ErrorMsgHttp {
    NoAnnounce(String),
    ToDicError(String),
    FormatResponseError,
    CreateTls,
    ResolvingAddress(String),
    ConnectTcp(String),
    ConnectTls(String),
    HttpDescription(String),
    SendingGetMessage,
    ReadingResponse,
    SpecificResponseError(ResponseError),
}

impl fmt::Display for ErrorMsgHttp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for ErrorMsgHttp {}

#[derive(Debug, PartialEq, Eq)]
/// Partes de la url del tracker necesarias para armar el request.
struct TrackerUrl {
    is_https: bool,
    host: String,
    port: u16,
    path: String,
}

fn vec_u8_to_string(vec: &[u8]) -> String {
    String::from_utf8_lossy(vec).into_owned()
}

fn find_index_msg(response: &[u8], size: usize, end_line: &[u8]) -> Option<usize> {
    response.windows(size).position(|arr| arr == end_line)
}

fn url_encode(bytes: &[u8]) -> String {
    vec_u8_to_string(&url_encoder::from_string_bytes(bytes.to_vec()))
}

//Separa la url del tracker en protocolo, host, puerto y path.
//Ej: http://torrent.ubuntu.com:6969/announce -> (false, torrent.ubuntu.com, 6969, /announce)
fn init_tracker_url(tracker: &str) -> ResultMsg<TrackerUrl> {
    let u8_tracker = tracker.as_bytes();
    let pos = find_index_msg(u8_tracker, THREE, HTTP_END)
        .ok_or_else(|| ErrorMsgHttp::NoAnnounce(tracker.to_string()))?;
    let is_https = vec_u8_to_string(&u8_tracker[..pos]).eq_ignore_ascii_case(HTTPS_PROTOCOL);

    let rest = &u8_tracker[pos + THREE..];
    let (authority, path) = match rest.iter().position(|byte| *byte == LAST_SLASH) {
        Some(pos_slash) => (&rest[..pos_slash], vec_u8_to_string(&rest[pos_slash..])),
        None => (rest, DEFAULT_PATH.to_string()),
    };

    let (host, port) = match authority.iter().position(|byte| *byte == TWO_POINTS) {
        Some(pos_port) => {
            let port = vec_u8_to_string(&authority[pos_port + 1..])
                .parse::<u16>()
                .map_err(|_| ErrorMsgHttp::NoAnnounce(tracker.to_string()))?;
            (vec_u8_to_string(&authority[..pos_port]), port)
        }
        None if is_https => (vec_u8_to_string(authority), PORT_HTTPS),
        None => (vec_u8_to_string(authority), PORT_HTTP),
    };
    if host.is_empty() {
        return Err(ErrorMsgHttp::NoAnnounce(tracker.to_string()));
    }

    Ok(TrackerUrl {
        is_https,
        host,
        port,
        path,
    })
}

#[derive(Debug)]
struct MsgDescriptor {
    info_hash: String,
    peer_id: String,
    port: u32,
    uploaded: u64,
    downloaded: u64,
    left: u64,
    compact: u8,
    event: String,
    url: TrackerUrl,
}

fn add_description_msg(msg: &mut String, type_msg: &str, value: &str) {
    msg.push_str(type_msg);
    msg.push_str(value);
}

impl MsgDescriptor {
    ///Crea el descriptor del announce a partir de la metadata del torrent, el peer id propio
    /// y el puerto configurado.
    ///
    pub fn new(torrent: &TorrentFileData, peer_id: PeerId, port: u32) -> ResultMsg<Self> {
        Ok(MsgDescriptor {
            info_hash: url_encode(&torrent.get_info_hash()),
            peer_id: url_encode(&peer_id),
            port,
            uploaded: 0,
            downloaded: 0,
            left: torrent.get_total_length(),
            compact: COMPACT_VALUE,
            event: String::from(STARTED),
            url: init_tracker_url(&torrent.get_tracker_main())?,
        })
    }

    ///Funcion que devuelve el mensaje que debera ser enviado al tracker
    pub fn get_send_msg(&self) -> String {
        let separator = if self.url.path.contains(QUESTION_MARK) {
            AMPERSAND
        } else {
            QUESTION_MARK
        };

        let mut result = String::new();
        add_description_msg(&mut result, INIT_MSG, &self.url.path);
        result.push(separator);
        add_description_msg(&mut result, INFO_HASH, &self.info_hash);
        add_description_msg(&mut result, PEER_ID, &self.peer_id);
        add_description_msg(&mut result, PORT, &self.port.to_string());
        add_description_msg(&mut result, UPLOADED, &self.uploaded.to_string());
        add_description_msg(&mut result, DOWNLOADED, &self.downloaded.to_string());
        add_description_msg(&mut result, LEFT, &self.left.to_string());
        add_description_msg(&mut result, COMPACT, &self.compact.to_string());
        add_description_msg(&mut result, EVENT, &self.event);
        add_description_msg(&mut result, HTTP, "");
        add_description_msg(&mut result, HOST, &self.url.host);
        add_description_msg(&mut result, MSG_ENDING, "");
        result
    }
}

//=================================================================

// Struct que representa un manejador general de comunicacion Http con un tracker especifico
pub struct HttpHandler {
    msg_get: MsgDescriptor,
}

fn check_http_code(response: &[u8]) -> ResultMsg<()> {
    let string_response = vec_u8_to_string(response);
    let mut iter_string = string_response.split(' ');
    match iter_string.next() {
        Some(version) if HTTP_VERSIONS.contains(&version) => (),
        _ => return Err(ErrorMsgHttp::FormatResponseError),
    }
    let str_code = match iter_string.next() {
        Some(code) => code.to_owned(),
        _ => return Err(ErrorMsgHttp::FormatResponseError),
    };

    let description: Vec<&str> = iter_string.collect();
    match str_code.parse::<u32>() {
        Ok(200..=299) => Ok(()),
        Ok(_) => Err(ErrorMsgHttp::HttpDescription(format!(
            "{}: {}",
            str_code,
            description.join(" ")
        ))),
        Err(_) => Err(ErrorMsgHttp::FormatResponseError),
    }
}

fn tracker_response_to_dic(response: Vec<u8>) -> ResultMsg<DicValues> {
    //Reviso que la primer linea de la respuesta me de una respuesta y codigo valido.
    match find_index_msg(&response, TWO, END_LINE) {
        Some(pos) => check_http_code(&response[..pos])?,
        None => return Err(ErrorMsgHttp::FormatResponseError),
    }
    //Tomo el diccionario en bencoding del cuerpo de la respuesta
    match find_index_msg(&response, FOUR, DOUBLE_END_LINE) {
        Some(pos) => {
            let bencode_response = response[(pos + FOUR)..].to_vec();
            bencoding::decoder::from_torrent_to_dic(bencode_response)
                .map_err(|err| ErrorMsgHttp::ToDicError(format!("{}", err)))
        }
        None => Err(ErrorMsgHttp::FormatResponseError),
    }
}

impl HttpHandler {
    fn new(torrent: &TorrentFileData, peer_id: PeerId, port: u32) -> ResultMsg<Self> {
        Ok(HttpHandler {
            msg_get: MsgDescriptor::new(torrent, peer_id, port)?,
        })
    }

    fn resolve_address(&self) -> ResultMsg<SocketAddr> {
        let addr = (self.msg_get.url.host.as_str(), self.msg_get.url.port);
        addr.to_socket_addrs()
            .map_err(|err| ErrorMsgHttp::ResolvingAddress(format!("{}", err)))?
            .next()
            .ok_or_else(|| ErrorMsgHttp::ResolvingAddress(self.msg_get.url.host.clone()))
    }

    fn connect_tcp(&self) -> ResultMsg<TcpStream> {
        let addr = self.resolve_address()?;
        debug!("Conectando TCP con addr: {}", addr);
        let timeout = Duration::from_secs(SECS_TRACKER_TIMEOUT);

        let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|err| {
            error!("Error al comunicarse con Tcp");
            ErrorMsgHttp::ConnectTcp(format!("{}", err))
        })?;
        stream
            .set_read_timeout(Some(timeout))
            .and_then(|_| stream.set_write_timeout(Some(timeout)))
            .map_err(|err| ErrorMsgHttp::ConnectTcp(format!("{}", err)))?;
        Ok(stream)
    }

    ///Conexion con el tracker: TLS sobre TCP si la url es https, TCP plano en otro caso.
    fn connect(&self) -> ResultMsg<Box<dyn ReadAndWrite>> {
        let stream = self.connect_tcp()?;
        if !self.msg_get.url.is_https {
            return Ok(Box::new(stream));
        }

        let connector = TlsConnector::new().map_err(|_| ErrorMsgHttp::CreateTls)?;
        let domain = &self.msg_get.url.host;
        debug!("Conectando TLS con domain: {}", domain);
        let connection = connector.connect(domain, stream).map_err(|err| {
            error!("Error al comunicarse con Tls");
            ErrorMsgHttp::ConnectTls(format!("{}", err))
        })?;
        Ok(Box::new(connection))
    }

    ///Funcion en la que le pedimos al HttpHandler que se conecte con el tracker, le envie el request
    /// correspondiente y luego nos devuelva la respuesta como diccionario.
    ///
    /// Posibles errores que puede devolver:
    ///
    /// -En caso de que la respuesta nos de un codigo de error se devolvera el mismo junto con su descripcion
    ///
    /// -En caso de que no pueda conectarse en TCP o TLS se devolvera el error correspondiente
    ///
    /// -En caso de que haya un error en el envio del request o recepcion de la respuesta se devolvera el error
    ///  correspondiente
    fn tracker_get_response(&self) -> ResultMsg<DicValues> {
        let mut connector = self.connect()?;

        let get_msg = self.msg_get.get_send_msg();
        trace!("Enviando request al tracker");
        debug!("Request: [{:?}]", get_msg);
        if connector.write_all(get_msg.as_bytes()).is_err() {
            error!("Error al escribir request al Tracker");
            return Err(ErrorMsgHttp::SendingGetMessage);
        };

        let mut response_tracker = vec![];
        trace!("Recibiendo respuesta del tracker");
        if connector.read_to_end(&mut response_tracker).is_err() {
            error!("Error al leer la respuesta del Tracker");
            return Err(ErrorMsgHttp::ReadingResponse);
        }
        tracker_response_to_dic(response_tracker)
    }
}

/// Funcion que realiza toda la comunicación con el tracker, interpreta su
/// respuesta y devuelve la info importante de la misma
///
pub fn communicate_with_tracker(
    torrent: &TorrentFileData,
    config_data: &ConfigFileData,
    peer_id: PeerId,
) -> Result<TrackerResponseData, ErrorMsgHttp> {
    trace!("Creando httpHandler");
    let http_handler = HttpHandler::new(torrent, peer_id, config_data.get_port())?;

    trace!("Comunicacion con el Tracker mediante httpHandler");
    let response_tracker = http_handler.tracker_get_response().map_err(|error| {
        error!("Error del cliente al conectarse con el Tracker");
        error
    })?;

    TrackerResponseData::new(response_tracker).map_err(|error| {
        error!("Error del cliente al recibir respuesta del Tracker");
        ErrorMsgHttp::SpecificResponseError(error)
    })
}
